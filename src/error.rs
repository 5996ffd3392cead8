//! Error types for daily-word

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Day offset fell outside the word list
    #[error("Words list out of indices (day {days}, {len} words)")]
    ExhaustedWordList { days: i64, len: usize },

    #[error("SMS provider rejected message ({status}): {message}")]
    Provider {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ExhaustedWordList { days: 2, len: 2 };
        assert!(err.to_string().contains("out of indices"));
        assert!(err.to_string().contains("day 2"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = Error::Provider {
            status: 400,
            code: Some(21211),
            message: "Invalid 'To' Phone Number".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Invalid 'To'"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
