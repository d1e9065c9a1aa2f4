use thiserror::Error;

/// Awareness pipeline error types
#[derive(Error, Debug)]
pub enum AwarenessError {
    #[error("awareness engine unavailable: {0}")]
    NotSupported(String),

    #[error("Sensor session failed: {0}")]
    SessionFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for awareness operations
pub type AwarenessResult<T> = Result<T, AwarenessError>;

impl AwarenessError {
    /// True for failures that mean the device cannot run the engine at all,
    /// as opposed to a session that could be retried.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AwarenessError::NotSupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = AwarenessError::NotSupported("scene reconstruction missing".to_string());
        assert!(err.is_unsupported());
        assert_eq!(
            err.to_string(),
            "awareness engine unavailable: scene reconstruction missing"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AwarenessError = parse.unwrap_err().into();
        assert!(!err.is_unsupported());
        assert!(err.to_string().starts_with("JSON error"));
    }
}
