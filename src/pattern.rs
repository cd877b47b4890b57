use std::collections::HashMap;

use crate::types::{Demand, EPSILON};

/// Copies of each demand item cut from one stock unit, indexed like the demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    counts: Vec<u32>,
}

impl Pattern {
    pub fn new(counts: Vec<u32>) -> Self {
        Self { counts }
    }

    /// One copy of `item` alone.
    pub fn single(item: usize, items: usize) -> Self {
        let mut counts = vec![0; items];
        counts[item] = 1;
        Self { counts }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn count(&self, item: usize) -> u32 {
        self.counts[item]
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn used_length(&self, demands: &[Demand]) -> f64 {
        self.counts
            .iter()
            .zip(demands)
            .map(|(&c, d)| c as f64 * d.width)
            .sum()
    }

    pub fn fits(&self, demands: &[Demand], stock_length: f64) -> bool {
        self.used_length(demands) <= stock_length + EPSILON
    }
}

/// Index of a pattern inside its [`PatternPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(usize);

impl PatternId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Append-only arena of distinct patterns. Ids stay valid for the life of
/// the pool since nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct PatternPool {
    patterns: Vec<Pattern>,
    ids: HashMap<Pattern, PatternId>,
}

impl PatternPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// One single-copy pattern per demand item.
    pub fn seeded(items: usize) -> Self {
        let mut pool = Self::new();
        for item in 0..items {
            pool.push(Pattern::single(item, items));
        }
        pool
    }

    /// Adds `pattern` unless an equal one is already present. Returns its id
    /// and whether it was new.
    pub fn push(&mut self, pattern: Pattern) -> (PatternId, bool) {
        if let Some(&id) = self.ids.get(&pattern) {
            return (id, false);
        }
        let id = PatternId(self.patterns.len());
        self.ids.insert(pattern.clone(), id);
        self.patterns.push(pattern);
        (id, true)
    }

    pub fn get(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.0]
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &Pattern)> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (PatternId(i), p))
    }
}
