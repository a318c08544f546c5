//! Errors raised by the value model
//!
//! Provider-level failures are reported as [`Diagnostic`](crate::Diagnostic)s;
//! `TfplugError` only covers walking and (de)serializing `DynamicValue`s.

#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),

    #[error("Invalid attribute path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, TfplugError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_part() {
        let err = TfplugError::TypeMismatch {
            expected: "string".to_string(),
            actual: "number".to_string(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected string, got number");
        assert_eq!(
            TfplugError::AttributeNotFound("unit_amount".into()).to_string(),
            "attribute 'unit_amount' not found"
        );
    }
}
