use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradingError {
    #[error("Invalid vote direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid grade tier code: {0}")]
    InvalidTierCode(String),

    #[error("Grade tier {grade}:{level} does not exist")]
    UnknownTier { grade: String, level: i32 },

    #[error("Invalid rating policy: {0}")]
    InvalidPolicy(String),

    #[error("Inactivity window of {0} days is out of range")]
    InvalidInactivityWindow(i64)
}
