//! Failure modes reported by the collapse entry points.

/// Reasons why a collapse call may be rejected or abort.
///
/// Every variant is detected before the offending mutation, so a failed call
/// never leaves partially merged data behind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollapseError {
    /// An input length disagrees with the declared component count.
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// The requested center-mass threshold lies outside [0, 1].
    InvalidThreshold { value: f64 },
    /// Both merge candidates carry (near-)zero mixing proportion, leaving the
    /// pooled moments undefined.
    DegenerateMass { survivor: usize, removed: usize },
}

impl std::fmt::Display for CollapseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollapseError::DimensionMismatch {
                field,
                expected,
                found,
            } => {
                write!(f, "dimension mismatch: {field}={found}, expected {expected}")
            }
            CollapseError::InvalidThreshold { value } => {
                write!(f, "min_center must lie in [0, 1], got {value}")
            }
            CollapseError::DegenerateMass { survivor, removed } => write!(
                f,
                "components {survivor} and {removed} carry no mass; pooled moments are undefined"
            ),
        }
    }
}

impl std::error::Error for CollapseError {}
