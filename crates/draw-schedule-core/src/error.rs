use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Formula error at {cell}: {reason}")]
    Formula { cell: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ScheduleError {
    fn from(e: serde_json::Error) -> Self {
        ScheduleError::SerializationError(e.to_string())
    }
}
