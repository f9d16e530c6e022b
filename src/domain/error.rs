use thiserror::Error;

/// Errors raised while turning raw stored data into domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("element tree rejected: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
