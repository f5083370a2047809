//! Engine error kinds (§7). Kernels themselves are infallible — a
//! `NumericalDegenerate` result is handled by local substitution, not by
//! propagating an `Err`; only engine-level operations return `Result`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("precision required ({required_bits} bits) exceeds supported backend capacity")]
    PrecisionUnsupported { required_bits: usize },

    #[error("job was cancelled")]
    Cancelled,

    #[error("worker failed: {0}")]
    WorkerError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = EngineError::PrecisionUnsupported { required_bits: 8192 };
        assert!(err.to_string().contains("8192"));
    }

    #[test]
    fn invalid_params_carries_message() {
        let err = EngineError::InvalidParams("bailout must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid parameters: bailout must be positive"
        );
    }
}
