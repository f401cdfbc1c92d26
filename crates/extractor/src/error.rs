use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while extracting sections from a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Expected section or table is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// A section selector could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ExtractError {
    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
