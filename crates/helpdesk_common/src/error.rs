//! Error types for the helpdesk assistant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelpdeskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Ticket directory error: {0}")]
    TicketDir(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: HelpdeskError = std::io::Error::other("disk full").into();
        assert!(matches!(err, HelpdeskError::Io(_)));
        assert_eq!(err.to_string(), "IO error: disk full");
    }

    #[test]
    fn test_display() {
        let err = HelpdeskError::Config("missing model".to_string());
        assert_eq!(err.to_string(), "Config error: missing model");
    }
}
