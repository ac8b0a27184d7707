use crate::graph::ParseError;
use thiserror::Error;

/// Errors reported by the Steiner tree pipeline.
#[derive(Debug, Error)]
pub enum SteinerTreeError {
    /// The input file is not valid PACE format.
    #[error("graph parse error: {0}")]
    Parse(#[from] ParseError),

    /// The instance has no terminals.
    #[error("the graph has no terminals")]
    NoTerminals,

    /// The terminals are not all in one connected component.
    #[error("the terminals do not all lie in one connected component")]
    Disconnected,

    /// The LP relaxation is infeasible and no 2-approximation fallback was
    /// requested. Enable `use_2approx` to make this recoverable.
    #[error("LP relaxation infeasible and no 2-approximation fallback available")]
    LpInfeasible,
}
