use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tolerance used when comparing accumulated lengths against the stock length.
pub const EPSILON: f64 = 1e-9;

/// A required piece width together with how many copies are needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
    pub width: f64,
}

impl Demand {
    pub fn new(qty: u32, width: f64) -> Self {
        Self { qty, width }
    }

    pub fn total_length(&self) -> f64 {
        self.qty as f64 * self.width
    }
}

impl std::fmt::Display for Demand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.qty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    #[default]
    Error,
}

impl SolveStatus {
    /// Whether a result with this status carries a usable cut list.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "OPTIMAL"),
            Self::Feasible => write!(f, "FEASIBLE"),
            Self::Infeasible => write!(f, "INFEASIBLE"),
            Self::Unbounded => write!(f, "UNBOUNDED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One stock unit after cutting: the pieces taken from it and what remains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUnit {
    pub leftover: f64,
    pub pieces: Vec<f64>,
}

impl StockUnit {
    pub fn from_pieces(stock_length: f64, pieces: Vec<f64>) -> Self {
        let used: f64 = pieces.iter().sum();
        Self {
            leftover: stock_length - used,
            pieces,
        }
    }

    pub fn used_length(&self) -> f64 {
        self.pieces.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Solution {
    pub status: SolveStatus,
    pub stock_length: f64,
    pub units: Vec<StockUnit>,
}

impl Serialize for Solution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Solution", 4)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("stock_length", &self.stock_length)?;
        state.serialize_field("unit_count", &self.unit_count())?;
        state.serialize_field("units", &self.units)?;
        state.end()
    }
}

impl Solution {
    /// A result with no cut list, used for every failure path.
    pub fn empty(status: SolveStatus, stock_length: f64) -> Self {
        Self {
            status,
            stock_length,
            units: vec![],
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of pieces of exactly `width` across all units.
    pub fn copies_of(&self, width: f64) -> usize {
        self.units
            .iter()
            .flat_map(|u| &u.pieces)
            .filter(|&&p| (p - width).abs() < EPSILON)
            .count()
    }

    pub fn total_waste_percent(&self) -> f64 {
        let total_stock = self.stock_length * self.units.len() as f64;
        if total_stock <= 0.0 {
            return 0.0;
        }
        let total_used: f64 = self.units.iter().map(StockUnit::used_length).sum();
        (total_stock - total_used) / total_stock * 100.0
    }
}

/// Accepts quantities sent as `3` or `3.0`, rejecting fractions and negatives.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_from_pieces_leftover() {
        let unit = StockUnit::from_pieces(100.0, vec![40.0, 40.0]);
        assert_eq!(unit.leftover, 20.0);
        assert_eq!(unit.used_length(), 80.0);
    }

    #[test]
    fn test_waste_percent() {
        let solution = Solution {
            status: SolveStatus::Optimal,
            stock_length: 100.0,
            units: vec![
                StockUnit::from_pieces(100.0, vec![40.0, 40.0]),
                StockUnit::from_pieces(100.0, vec![40.0]),
            ],
        };
        assert_eq!(solution.unit_count(), 2);
        assert_eq!(solution.copies_of(40.0), 3);
        assert!((solution.total_waste_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_solution_has_no_waste() {
        let solution = Solution::empty(SolveStatus::Infeasible, 10.0);
        assert_eq!(solution.unit_count(), 0);
        assert_eq!(solution.total_waste_percent(), 0.0);
        assert!(!solution.status.is_success());
    }

    #[test]
    fn test_demand_qty_accepts_whole_floats() {
        let demand: Demand = serde_json::from_str(r#"{"qty": 3.0, "width": 40}"#).unwrap();
        assert_eq!(demand, Demand::new(3, 40.0));

        let err = serde_json::from_str::<Demand>(r#"{"qty": 2.5, "width": 40}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&SolveStatus::Optimal).unwrap();
        assert_eq!(json, "\"OPTIMAL\"");
    }

    #[test]
    fn test_solution_json_carries_unit_count() {
        let solution = Solution {
            status: SolveStatus::Feasible,
            stock_length: 100.0,
            units: vec![StockUnit::from_pieces(100.0, vec![40.0, 40.0])],
        };
        let value = serde_json::to_value(&solution).unwrap();
        assert_eq!(value["unit_count"], 1);
        assert_eq!(value["status"], "FEASIBLE");

        let back: Solution = serde_json::from_value(value).unwrap();
        assert_eq!(back, solution);
    }
}
