//! A cutting job as entered by an operator: stock length, blade width and
//! the lengths and quantities to cut.
//!
//! Every cut consumes its length plus one blade width, so kerf is added to
//! each cut before solving and taken off again afterwards. Whichever backend
//! runs, the caller gets back the same [`CutPlan`].

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use crate::alns::{self, AlnsConfig};
use crate::error::InputError;
use crate::lp::LpSolver;
use crate::lp_backend::MicroLp;
use crate::solver::{Model, Solver};
use crate::types::{
    Demand, EPSILON, Solution, SolveStatus, StockUnit, deserialize_u32_from_number,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub length: f64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
}

impl Cut {
    pub fn new(length: f64, qty: u32) -> Self {
        Self { length, qty }
    }
}

/// How a job is solved: one of the LP-based models through [`Solver`], or
/// the seeded heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Backend {
    Lp(Model),
    Alns { iterations: usize, seed: u64 },
}

impl Default for Backend {
    fn default() -> Self {
        Self::Lp(Model::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutJob {
    pub stock_length: f64,
    #[serde(default)]
    pub blade_width: f64,
    pub cuts: Vec<Cut>,
    #[serde(default)]
    pub backend: Backend,
}

/// One stock unit with kerf removed from its cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stick {
    pub cuts: Vec<f64>,
    /// Material left after every cut and its kerf.
    pub remaining: f64,
}

impl Stick {
    pub fn usage_percent(&self, stock_length: f64) -> f64 {
        self.cuts.iter().sum::<f64>() / stock_length * 100.0
    }
}

/// Serializes with `stick_count` and `waste_percent` alongside the fields;
/// both are ignored when reading a plan back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CutPlan {
    pub status: SolveStatus,
    pub stock_length: f64,
    pub blade_width: f64,
    pub sticks: Vec<Stick>,
}

impl Serialize for CutPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CutPlan", 6)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("stock_length", &self.stock_length)?;
        state.serialize_field("blade_width", &self.blade_width)?;
        state.serialize_field("stick_count", &self.stick_count())?;
        state.serialize_field("waste_percent", &self.waste_percent())?;
        state.serialize_field("sticks", &self.sticks)?;
        state.end()
    }
}

impl CutPlan {
    pub fn stick_count(&self) -> usize {
        self.sticks.len()
    }

    /// Share of the consumed stock not ending up in a cut piece, kerf included.
    pub fn waste_percent(&self) -> f64 {
        let total = self.stock_length * self.sticks.len() as f64;
        if total <= 0.0 {
            return 0.0;
        }
        let used: f64 = self.sticks.iter().flat_map(|s| &s.cuts).sum();
        (total - used) / total * 100.0
    }
}

impl CutJob {
    pub fn new(stock_length: f64, blade_width: f64, cuts: Vec<Cut>) -> Self {
        Self {
            stock_length,
            blade_width,
            cuts,
            backend: Backend::default(),
        }
    }

    /// Builds a job from parallel length and quantity lists.
    pub fn from_lists(
        stock_length: f64,
        blade_width: f64,
        lengths: &[f64],
        quantities: &[u32],
    ) -> Result<Self, InputError> {
        if lengths.len() != quantities.len() {
            return Err(InputError::LengthQuantityMismatch {
                lengths: lengths.len(),
                quantities: quantities.len(),
            });
        }
        let cuts = lengths
            .iter()
            .zip(quantities)
            .map(|(&length, &qty)| Cut::new(length, qty))
            .collect();
        Ok(Self::new(stock_length, blade_width, cuts))
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !self.stock_length.is_finite() || self.stock_length <= 0.0 {
            return Err(InputError::NonPositiveStock(self.stock_length));
        }
        if !self.blade_width.is_finite() || self.blade_width < 0.0 {
            return Err(InputError::NegativeBladeWidth(self.blade_width));
        }
        for (index, cut) in self.cuts.iter().enumerate() {
            if !cut.length.is_finite() || cut.length <= 0.0 {
                return Err(InputError::NonPositiveCut {
                    index,
                    length: cut.length,
                });
            }
            if cut.qty == 0 {
                return Err(InputError::ZeroQuantity { index });
            }
        }
        Ok(())
    }

    /// Demand with kerf added, longest cuts first.
    fn kerfed_demand(&self) -> Vec<Demand> {
        let mut demands: Vec<Demand> = self
            .cuts
            .iter()
            .map(|c| Demand::new(c.qty, c.length + self.blade_width))
            .collect();
        demands.sort_by(|a, b| b.width.total_cmp(&a.width));
        demands
    }

    pub fn plan(&self) -> Result<CutPlan, InputError> {
        self.plan_with(MicroLp)
    }

    pub fn plan_with<S: LpSolver>(&self, lp: S) -> Result<CutPlan, InputError> {
        self.validate()?;
        let demands = self.kerfed_demand();
        info!(
            stock_length = self.stock_length,
            blade_width = self.blade_width,
            cuts = demands.len(),
            backend = ?self.backend,
            "planning job"
        );

        let solution = match self.backend {
            Backend::Lp(model) => Solver::new(self.stock_length, demands)
                .model(model)
                .with_lp(lp)
                .solve(),
            Backend::Alns { iterations, seed } => self.run_alns(&demands, iterations, seed),
        };
        Ok(self.finish(solution))
    }

    fn run_alns(&self, demands: &[Demand], iterations: usize, seed: u64) -> Solution {
        if demands
            .iter()
            .any(|d| d.width > self.stock_length + EPSILON)
        {
            return Solution::empty(SolveStatus::Infeasible, self.stock_length);
        }
        let pieces: Vec<f64> = demands
            .iter()
            .flat_map(|d| std::iter::repeat_n(d.width, d.qty as usize))
            .collect();
        let units = alns::solve(
            self.stock_length,
            &pieces,
            &AlnsConfig::new(iterations, seed),
        );
        Solution {
            status: SolveStatus::Feasible,
            stock_length: self.stock_length,
            units: units
                .into_iter()
                .map(|pieces| StockUnit::from_pieces(self.stock_length, pieces))
                .collect(),
        }
    }

    fn finish(&self, solution: Solution) -> CutPlan {
        let sticks = solution
            .units
            .into_iter()
            .map(|unit| Stick {
                cuts: unit.pieces.iter().map(|p| p - self.blade_width).collect(),
                remaining: unit.leftover,
            })
            .collect();
        CutPlan {
            status: solution.status,
            stock_length: self.stock_length,
            blade_width: self.blade_width,
            sticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(plan: &CutPlan, length: f64) -> usize {
        plan.sticks
            .iter()
            .flat_map(|s| &s.cuts)
            .filter(|&&c| (c - length).abs() < 1e-9)
            .count()
    }

    fn assert_plan_valid(plan: &CutPlan, cuts: &[Cut]) {
        assert!(plan.status.is_success(), "status {}", plan.status);
        for stick in &plan.sticks {
            let consumed: f64 = stick.cuts.iter().map(|c| c + plan.blade_width).sum();
            assert!((consumed + stick.remaining - plan.stock_length).abs() < 1e-9);
            assert!(stick.remaining >= -1e-9);
        }
        for cut in cuts {
            assert_eq!(count(plan, cut.length), cut.qty as usize);
        }
    }

    #[test]
    fn test_from_lists_checks_lengths() {
        let err = CutJob::from_lists(100.0, 0.0, &[10.0, 20.0], &[1]).unwrap_err();
        assert_eq!(
            err,
            InputError::LengthQuantityMismatch {
                lengths: 2,
                quantities: 1
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let job = CutJob::new(0.0, 0.0, vec![Cut::new(10.0, 1)]);
        assert_eq!(job.validate(), Err(InputError::NonPositiveStock(0.0)));

        let job = CutJob::new(100.0, -1.0, vec![Cut::new(10.0, 1)]);
        assert_eq!(job.validate(), Err(InputError::NegativeBladeWidth(-1.0)));

        let job = CutJob::new(100.0, 0.0, vec![Cut::new(10.0, 1), Cut::new(10.0, 0)]);
        assert_eq!(job.validate(), Err(InputError::ZeroQuantity { index: 1 }));

        let job = CutJob::new(100.0, 0.0, vec![Cut::new(-5.0, 1)]);
        assert!(matches!(
            job.validate(),
            Err(InputError::NonPositiveCut { index: 0, .. })
        ));
    }

    #[test]
    fn test_kerf_reduces_capacity() {
        // 50 + 50 fits exactly without kerf; one blade width pushes it over.
        let cuts = vec![Cut::new(50.0, 2)];
        let plan = CutJob::new(100.0, 0.0, cuts.clone()).plan().unwrap();
        assert_plan_valid(&plan, &cuts);
        assert_eq!(plan.stick_count(), 1);

        let plan = CutJob::new(100.0, 5.0, cuts.clone()).plan().unwrap();
        assert_plan_valid(&plan, &cuts);
        assert_eq!(plan.stick_count(), 2);
        assert_eq!(plan.sticks[0].remaining, 45.0);
    }

    #[test]
    fn test_cut_longer_than_stock_is_infeasible() {
        let plan = CutJob::new(10.0, 0.0, vec![Cut::new(15.0, 1)]).plan().unwrap();
        assert_eq!(plan.status, SolveStatus::Infeasible);
        assert_eq!(plan.stick_count(), 0);

        let plan = CutJob::new(10.0, 0.0, vec![Cut::new(15.0, 1)])
            .backend(Backend::Alns {
                iterations: 10,
                seed: 1,
            })
            .plan()
            .unwrap();
        assert_eq!(plan.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_every_backend_covers_demand() {
        let cuts = vec![Cut::new(12.5, 4), Cut::new(30.0, 3), Cut::new(7.25, 6)];
        let backends = [
            Backend::Lp(Model::Exact),
            Backend::Lp(Model::ColumnGeneration { iterations: 15 }),
            Backend::Lp(Model::Auto {
                iterations: 15,
                max_exact_units: 6,
            }),
            Backend::Alns {
                iterations: 200,
                seed: 1234,
            },
        ];
        for backend in backends {
            let plan = CutJob::new(60.0, 0.125, cuts.clone())
                .backend(backend)
                .plan()
                .unwrap();
            assert_plan_valid(&plan, &cuts);
        }
    }

    #[test]
    fn test_usage_and_waste() {
        let plan = CutPlan {
            status: SolveStatus::Optimal,
            stock_length: 100.0,
            blade_width: 0.0,
            sticks: vec![
                Stick {
                    cuts: vec![40.0, 40.0],
                    remaining: 20.0,
                },
                Stick {
                    cuts: vec![40.0],
                    remaining: 60.0,
                },
            ],
        };
        assert_eq!(plan.sticks[0].usage_percent(100.0), 80.0);
        assert!((plan.waste_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_job_deserializes_with_defaults() {
        let job: CutJob = serde_json::from_str(
            r#"{"stock_length": 100, "cuts": [{"length": 40, "qty": 3}]}"#,
        )
        .unwrap();
        assert_eq!(job.blade_width, 0.0);
        assert_eq!(job.backend, Backend::default());

        let job: CutJob = serde_json::from_str(
            r#"{"stock_length": 100, "cuts": [], "backend": {"backend": "alns", "iterations": 50, "seed": 9}}"#,
        )
        .unwrap();
        assert_eq!(
            job.backend,
            Backend::Alns {
                iterations: 50,
                seed: 9
            }
        );
    }

    #[test]
    fn test_lp_backend_carries_model() {
        let job: CutJob = serde_json::from_str(
            r#"{"stock_length": 100, "cuts": [], "backend": {"backend": "lp", "model": "auto", "iterations": 10, "max_exact_units": 4}}"#,
        )
        .unwrap();
        assert_eq!(
            job.backend,
            Backend::Lp(Model::Auto {
                iterations: 10,
                max_exact_units: 4
            })
        );

        let json = serde_json::to_value(Backend::Lp(Model::Exact)).unwrap();
        assert_eq!(json, serde_json::json!({"backend": "lp", "model": "exact"}));
        let back: Backend = serde_json::from_value(json).unwrap();
        assert_eq!(back, Backend::Lp(Model::Exact));
    }

    #[test]
    fn test_full_cut_list_on_default_backend() {
        let cuts = vec![
            Cut::new(81.0, 44),
            Cut::new(70.0, 3),
            Cut::new(68.0, 48),
            Cut::new(45.5, 20),
            Cut::new(37.25, 31),
            Cut::new(21.0, 17),
            Cut::new(12.0, 60),
            Cut::new(99.0, 9),
        ];
        let plan = CutJob::new(220.0, 0.0, cuts.clone()).plan().unwrap();
        assert_plan_valid(&plan, &cuts);
        assert!(plan.stick_count() >= 51);
    }

    #[test]
    fn test_plan_json_carries_stick_count() {
        let plan = CutJob::new(100.0, 0.0, vec![Cut::new(40.0, 3)]).plan().unwrap();
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["stick_count"], 2);
        assert!((value["waste_percent"].as_f64().unwrap() - 40.0).abs() < 1e-9);

        let back: CutPlan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }
}
