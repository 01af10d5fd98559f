//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A type the schema vocabulary cannot express.
    #[from(ignore)]
    #[display("Unsupported type {type_name}: {reason}")]
    Unsupported {
        /// Rendering of the offending type.
        type_name: String,
        /// Why the type was rejected.
        reason: String,
    },

    /// The requested root type does not exist in the loaded sources.
    #[from(ignore)]
    #[display("Type not found: {_0}")]
    NotFound(String),

    /// A bare type name matched more than one declaration.
    #[from(ignore)]
    #[display("Ambiguous type '{name}', candidates: {}", candidates.join(", "))]
    Ambiguous {
        /// The queried short name.
        name: String,
        /// Qualified names of every matching declaration.
        candidates: Vec<String>,
    },

    /// JSON/YAML output failures.
    #[from(ignore)]
    #[display("Serialization Error: {_0}")]
    Serialization(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Shorthand for an [`AppError::Unsupported`] value.
    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Unsupported {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
