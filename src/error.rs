use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Errors produced by tensor, layer and loss operations.
///
/// Every condition here is local and deterministic: the operation that
/// detects it fails immediately and the caller decides what to do. Nothing
/// is retried and nothing is logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NnError {
    /// Operand shapes are incompatible for the requested operation:
    /// unbroadcastable element-wise operands, a matrix product with
    /// mismatched inner dimensions, a layer fed the wrong trailing
    /// dimension, or a loss given predicted/actual of different shapes.
    #[error("shape mismatch in {op}: {detail}")]
    ShapeMismatch { op: &'static str, detail: String },

    /// An operation received the wrong kind of operand, e.g. `dot` given a
    /// tensor that is not a matrix.
    #[error("type conflict in {op}: expected {expected}, got {got}")]
    TypeConflict {
        op: &'static str,
        expected: &'static str,
        got: String,
    },

    /// A stateful call sequence was violated, e.g. `backward` invoked on a
    /// layer with no cached forward input.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl NnError {
    pub(crate) fn shape(op: &'static str, detail: impl Into<String>) -> NnError {
        NnError::ShapeMismatch {
            op,
            detail: detail.into(),
        }
    }
}
