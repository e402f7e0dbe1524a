//! Core error types for the Stromer client.

use thiserror::Error;

use crate::models::FieldCategory;

/// Core error type for payload and model validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing from a vendor payload.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A vendor payload does not have the expected shape.
    #[error("Invalid {category:?} payload: {reason}")]
    InvalidPayload {
        /// Payload the problem was found in.
        category: FieldCategory,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl CoreError {
    /// Returns the payload this error refers to.
    ///
    /// A missing bike id belongs to the base payload; errors that are not
    /// tied to a poll payload return `None`.
    pub fn category(&self) -> Option<FieldCategory> {
        match self {
            Self::MissingField(_) => Some(FieldCategory::Base),
            Self::InvalidPayload { category, .. } => Some(*category),
            Self::InvalidData(_) => None,
        }
    }
}
