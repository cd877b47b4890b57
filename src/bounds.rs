use crate::types::{Demand, EPSILON};

/// Advisory sizes derived from raw demand. They size solver variables and
/// never certify optimality on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds {
    /// `ceil(total demanded length / stock length)`.
    pub min_units: usize,
    /// Units consumed by a greedy next-fit pass in the given order.
    pub max_units: usize,
    /// Per item, the most copies that can go on one unit.
    pub copies: Vec<u32>,
}

pub fn estimate(demands: &[Demand], stock_length: f64) -> Bounds {
    let copies = demands
        .iter()
        .map(|d| {
            let fit = ((stock_length + EPSILON) / d.width).floor();
            if fit >= d.qty as f64 { d.qty } else { fit.max(0.0) as u32 }
        })
        .collect();

    let mut total = 0.0;
    let mut units = 0usize;
    let mut fill = 0.0;
    for d in demands.iter().filter(|d| d.qty > 0) {
        if units == 0 {
            units = 1;
        }
        let length = d.total_length();
        total += length;
        if fill + length <= stock_length + EPSILON {
            fill += length;
            continue;
        }
        for _ in 0..d.qty {
            if fill + d.width > stock_length + EPSILON {
                units += 1;
                fill = 0.0;
            }
            fill += d.width;
        }
    }

    let min_units = if total > 0.0 {
        (total / stock_length - EPSILON).ceil().max(1.0) as usize
    } else {
        0
    };

    Bounds {
        min_units,
        max_units: units.max(min_units),
        copies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_item_bounds() {
        let bounds = estimate(&[Demand::new(3, 40.0)], 100.0);
        assert_eq!(bounds.copies, vec![2]);
        assert_eq!(bounds.min_units, 2);
        assert_eq!(bounds.max_units, 2);
    }

    #[test]
    fn test_copies_capped_by_quantity() {
        let bounds = estimate(&[Demand::new(1, 5.0), Demand::new(6, 20.0)], 50.0);
        assert_eq!(bounds.copies, vec![1, 2]);
    }

    #[test]
    fn test_greedy_follows_given_order() {
        let demands = [
            Demand::new(1, 5.0),
            Demand::new(1, 10.0),
            Demand::new(1, 15.0),
            Demand::new(6, 20.0),
        ];
        let bounds = estimate(&demands, 50.0);
        // 5+10+15+20 | 20+20 | 20+20 | 20
        assert_eq!(bounds.max_units, 4);
        assert_eq!(bounds.min_units, 3);
    }

    #[test]
    fn test_exact_multiple_lower_bound() {
        let bounds = estimate(&[Demand::new(4, 25.0)], 50.0);
        assert_eq!(bounds.min_units, 2);
        assert_eq!(bounds.max_units, 2);
    }

    #[test]
    fn test_empty_demand() {
        let bounds = estimate(&[], 50.0);
        assert_eq!(bounds.min_units, 0);
        assert_eq!(bounds.max_units, 0);
        assert!(bounds.copies.is_empty());
    }

    #[test]
    fn test_upper_never_below_lower() {
        let demands = [Demand::new(2, 30.0), Demand::new(3, 45.0), Demand::new(5, 12.5)];
        let bounds = estimate(&demands, 100.0);
        assert!(bounds.max_units >= bounds.min_units);
    }
}
