//! Turns model output into concrete per-unit cut lists.
//!
//! Both models cover demand with `>=` rows, so an optimal answer may cut
//! more copies than were asked for. Surplus copies are dropped from the
//! last units backwards before the lists are built; a unit emptied this way
//! disappears, so the unit count can only go down.

use crate::pattern::PatternPool;
use crate::types::{Demand, StockUnit};

/// Expands integer pattern usage into one count vector per stock unit,
/// keeping all units of a pattern together in pool order.
pub fn expand_usage(pool: &PatternPool, usage: &[u32]) -> Vec<Vec<u32>> {
    pool.iter()
        .filter_map(|(id, pattern)| {
            let times = usage.get(id.index()).copied().unwrap_or(0);
            (times > 0).then(|| std::iter::repeat_n(pattern.counts().to_vec(), times as usize))
        })
        .flatten()
        .collect()
}

fn trim_surplus(demands: &[Demand], units: &mut Vec<Vec<u32>>) {
    for (item, demand) in demands.iter().enumerate() {
        let produced: u32 = units.iter().map(|u| u[item]).sum();
        let mut surplus = produced.saturating_sub(demand.qty);
        for unit in units.iter_mut().rev() {
            if surplus == 0 {
                break;
            }
            let cut = unit[item].min(surplus);
            unit[item] -= cut;
            surplus -= cut;
        }
    }
    units.retain(|u| u.iter().any(|&c| c > 0));
}

/// Shared exit point of both models.
pub fn assemble(demands: &[Demand], stock_length: f64, mut units: Vec<Vec<u32>>) -> Vec<StockUnit> {
    trim_surplus(demands, &mut units);
    units
        .into_iter()
        .map(|counts| {
            let pieces = counts
                .iter()
                .zip(demands)
                .flat_map(|(&c, d)| std::iter::repeat_n(d.width, c as usize))
                .collect();
            StockUnit::from_pieces(stock_length, pieces)
        })
        .collect()
}
