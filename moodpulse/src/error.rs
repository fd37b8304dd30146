//! Error types for MoodPulse
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to event consumers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid mood value for {field}: {value} (expected {min}-{max})")]
    InvalidMood {
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Dispatcher has been disposed")]
    Disposed,
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_serialize_as_display_text() {
        let json = serde_json::to_string(&AppError::Disposed).unwrap();
        assert_eq!(json, "\"Dispatcher has been disposed\"");

        let err = AppError::InvalidMood {
            field: "start_of_work",
            value: 11,
            min: 1,
            max: 10,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!("Invalid mood value for start_of_work: 11 (expected 1-10)")
        );
    }
}
