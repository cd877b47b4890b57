use thiserror::Error;

use crate::types::SolveStatus;

/// The solver call that produced a non-optimal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MasterRelaxation,
    Pricing,
    ExactModel,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MasterRelaxation => write!(f, "master relaxation"),
            Self::Pricing => write!(f, "pricing knapsack"),
            Self::ExactModel => write!(f, "exact model"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{stage} ended with status {status}")]
pub struct StageError {
    pub stage: Stage,
    pub status: SolveStatus,
}

impl StageError {
    pub fn new(stage: Stage, status: SolveStatus) -> Self {
        Self { stage, status }
    }
}

/// Rejected job parameters, reported before any solving starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("stock length must be positive, got {0}")]
    NonPositiveStock(f64),

    #[error("blade width must be non-negative, got {0}")]
    NegativeBladeWidth(f64),

    #[error("cut {index} has non-positive length {length}")]
    NonPositiveCut { index: usize, length: f64 },

    #[error("cut {index} has zero quantity")]
    ZeroQuantity { index: usize },

    #[error("{lengths} cut lengths given but {quantities} quantities")]
    LengthQuantityMismatch { lengths: usize, quantities: usize },
}
