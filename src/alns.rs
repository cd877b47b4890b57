//! Adaptive large neighborhood search for one-dimensional bin packing.
//!
//! A cheap alternative to the LP-based models for large piece counts. It
//! works on a flat list of piece lengths and returns the pieces assigned to
//! each stock unit; it never proves optimality.
//!
//! Each iteration removes a few units (destroy), reinserts their pieces
//! (repair) and accepts the candidate with a simulated-annealing rule.
//! Operators are picked by roulette over weights that are refreshed every
//! segment from the scores they earned.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::types::EPSILON;

pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_SEED: u64 = 1234;

#[derive(Debug, Clone)]
pub struct AlnsConfig {
    pub iterations: usize,
    pub seed: u64,
    /// Iterations between weight updates.
    pub segment_size: usize,
    pub score_best: f64,
    pub score_better: f64,
    pub score_accepted: f64,
    /// How fast weights follow recent scores, in `[0, 1]`.
    pub reaction_factor: f64,
    pub min_weight: f64,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
}

impl Default for AlnsConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            segment_size: 50,
            score_best: 33.0,
            score_better: 9.0,
            score_accepted: 3.0,
            reaction_factor: 0.1,
            min_weight: 0.1,
            initial_temperature: 0.05,
            cooling_rate: 0.995,
        }
    }
}

impl AlnsConfig {
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self {
            iterations,
            seed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destroy {
    RandomUnits,
    EmptiestUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
    FirstFit,
    BestFit,
}

const DESTROY: [Destroy; 2] = [Destroy::RandomUnits, Destroy::EmptiestUnits];
const REPAIR: [Repair; 2] = [Repair::FirstFit, Repair::BestFit];

#[derive(Debug, Clone)]
struct Weights {
    weights: Vec<f64>,
    scores: Vec<f64>,
    uses: Vec<usize>,
}

impl Weights {
    fn new(n: usize) -> Self {
        Self {
            weights: vec![1.0; n],
            scores: vec![0.0; n],
            uses: vec![0; n],
        }
    }

    fn pick(&mut self, rng: &mut ChaCha8Rng) -> usize {
        let total: f64 = self.weights.iter().sum();
        let mut r = rng.random::<f64>() * total;
        let mut chosen = self.weights.len() - 1;
        for (i, w) in self.weights.iter().enumerate() {
            if r < *w {
                chosen = i;
                break;
            }
            r -= w;
        }
        self.uses[chosen] += 1;
        chosen
    }

    fn reward(&mut self, op: usize, score: f64) {
        self.scores[op] += score;
    }

    fn end_segment(&mut self, reaction: f64, min_weight: f64) {
        for i in 0..self.weights.len() {
            if self.uses[i] > 0 {
                let average = self.scores[i] / self.uses[i] as f64;
                self.weights[i] =
                    ((1.0 - reaction) * self.weights[i] + reaction * average).max(min_weight);
            }
            self.scores[i] = 0.0;
            self.uses[i] = 0;
        }
    }
}

#[derive(Debug, Clone)]
struct Packing {
    units: Vec<Vec<f64>>,
    loads: Vec<f64>,
}

impl Packing {
    fn empty() -> Self {
        Self {
            units: Vec::new(),
            loads: Vec::new(),
        }
    }

    /// Unit count dominates; the squared fill ratio (always below one unit's
    /// worth) rewards packings that concentrate free space.
    fn cost(&self, stock_length: f64) -> f64 {
        let n = self.units.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let fill: f64 = self
            .loads
            .iter()
            .map(|l| (l / stock_length).powi(2))
            .sum();
        n - fill / (n + 1.0)
    }

    fn remove_units(&mut self, mut indices: Vec<usize>) -> Vec<f64> {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        let mut pieces = Vec::new();
        for i in indices {
            pieces.extend(self.units.swap_remove(i));
            self.loads.swap_remove(i);
        }
        pieces
    }

    fn insert(&mut self, mut pieces: Vec<f64>, stock_length: f64, repair: Repair) {
        pieces.sort_by(|a, b| b.total_cmp(a));
        for piece in pieces {
            let fits = |load: &f64| *load + piece <= stock_length + EPSILON;
            let slot = match repair {
                Repair::FirstFit => self.loads.iter().position(fits),
                Repair::BestFit => self
                    .loads
                    .iter()
                    .enumerate()
                    .filter(|&(_, l)| fits(l))
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i),
            };
            match slot {
                Some(i) => {
                    self.units[i].push(piece);
                    self.loads[i] += piece;
                }
                None => {
                    self.units.push(vec![piece]);
                    self.loads.push(piece);
                }
            }
        }
    }
}

fn destroy(packing: &mut Packing, op: Destroy, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let n = packing.units.len();
    if n == 0 {
        return Vec::new();
    }
    let k = rng.random_range(1..=n.min(3));
    let indices = match op {
        Destroy::RandomUnits => (0..k).map(|_| rng.random_range(0..n)).collect(),
        Destroy::EmptiestUnits => {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| packing.loads[a].total_cmp(&packing.loads[b]));
            order.truncate(k);
            order
        }
    };
    packing.remove_units(indices)
}

/// Packs `pieces` into units of `stock_length`. Every piece must already be
/// known to fit a unit on its own.
pub fn solve(stock_length: f64, pieces: &[f64], config: &AlnsConfig) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut current = Packing::empty();
    current.insert(pieces.to_vec(), stock_length, Repair::FirstFit);
    let mut current_cost = current.cost(stock_length);
    let mut best = current.clone();
    let mut best_cost = current_cost;

    let mut destroy_weights = Weights::new(DESTROY.len());
    let mut repair_weights = Weights::new(REPAIR.len());
    let mut temperature = config.initial_temperature;

    for iteration in 0..config.iterations {
        let d = destroy_weights.pick(&mut rng);
        let r = repair_weights.pick(&mut rng);

        let mut candidate = current.clone();
        let removed = destroy(&mut candidate, DESTROY[d], &mut rng);
        candidate.insert(removed, stock_length, REPAIR[r]);
        let cost = candidate.cost(stock_length);

        let delta = cost - current_cost;
        let accepted = delta <= 0.0
            || (temperature > 0.0 && rng.random::<f64>() < (-delta / temperature).exp());

        let score = if cost < best_cost - EPSILON {
            config.score_best
        } else if cost < current_cost - EPSILON {
            config.score_better
        } else if accepted {
            config.score_accepted
        } else {
            0.0
        };
        destroy_weights.reward(d, score);
        repair_weights.reward(r, score);

        if accepted {
            current = candidate;
            current_cost = cost;
            if current_cost < best_cost - EPSILON {
                best = current.clone();
                best_cost = current_cost;
                debug!(iteration, units = best.units.len(), "alns improved");
            }
        }

        temperature *= config.cooling_rate;
        if (iteration + 1) % config.segment_size.max(1) == 0 {
            destroy_weights.end_segment(config.reaction_factor, config.min_weight);
            repair_weights.end_segment(config.reaction_factor, config.min_weight);
        }
    }

    best.units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_packing_valid(units: &[Vec<f64>], stock_length: f64, pieces: &[f64]) {
        for unit in units {
            assert!(!unit.is_empty());
            assert!(unit.iter().sum::<f64>() <= stock_length + 1e-9);
        }
        let mut packed: Vec<f64> = units.iter().flatten().copied().collect();
        let mut expected = pieces.to_vec();
        packed.sort_by(f64::total_cmp);
        expected.sort_by(f64::total_cmp);
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_scenario_a() {
        let pieces = [40.0, 40.0, 40.0];
        let units = solve(100.0, &pieces, &AlnsConfig::new(100, 7));
        assert_packing_valid(&units, 100.0, &pieces);
        assert_eq!(units.len(), 2);
    }

    #[test]
    fn test_pairs_complementary_pieces() {
        let pieces = [60.0, 60.0, 60.0, 40.0, 40.0, 40.0];
        let units = solve(100.0, &pieces, &AlnsConfig::new(300, 1));
        assert_packing_valid(&units, 100.0, &pieces);
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn test_same_seed_same_packing() {
        let pieces: Vec<f64> = (1..=30).map(|i| (i * 7 % 45 + 5) as f64).collect();
        let config = AlnsConfig::new(200, 42);
        let a = solve(100.0, &pieces, &config);
        let b = solve(100.0, &pieces, &config);
        assert_eq!(a, b);
        assert_packing_valid(&a, 100.0, &pieces);
    }

    #[test]
    fn test_empty_input() {
        let units = solve(100.0, &[], &AlnsConfig::default());
        assert!(units.is_empty());
    }

    #[test]
    fn test_never_below_lower_bound() {
        let pieces: Vec<f64> = (0..40).map(|i| 20.0 + (i % 5) as f64 * 9.0).collect();
        let units = solve(100.0, &pieces, &AlnsConfig::new(500, 3));
        assert_packing_valid(&units, 100.0, &pieces);
        let total: f64 = pieces.iter().sum();
        assert!(units.len() >= (total / 100.0).ceil() as usize);
    }
}
