use thiserror::Error;

/// Shape errors found while building a Butcher tableau.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableauError {
    #[error("tableau has no stages")]
    Empty,
    #[error("expected {expected} stage nodes, got {found}")]
    NodeCount { expected: usize, found: usize },
    #[error("coefficient row {row} must have {expected} entries, got {found}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} output weights, got {found}")]
    WeightCount { expected: usize, found: usize },
    #[error("first stage node must be 0, got {0}")]
    FirstNode(f64),
}

/// Problems with a time grid handed to the reference driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid needs at least two points, got {0}")]
    TooShort(usize),
    #[error("grid point {index} is not finite")]
    NonFinite { index: usize },
    #[error("grid is not strictly monotonic at index {index}")]
    NotMonotonic { index: usize },
    #[error("step size must be finite and point from start to end")]
    BadStepSize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("unknown method \"{0}\" (expected euler, midpoint, heun2, heun3 or rk4)")]
    UnknownMethod(String),
}
