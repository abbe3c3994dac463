//! Error types for the layout engine.
//!
//! Layout is all-or-nothing: every error is reported before any output
//! exists, so callers never see a partially positioned tree.

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors produced by layout computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// A spacing or angle parameter was outside its valid range.
    #[error("invalid argument: {name} must be {expected}, got {value}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },

    /// The input is not a finite rooted tree (cycle, a node wired under two
    /// parents, or an arena slot unreachable from the given root).
    #[error("malformed tree: {message}")]
    MalformedTree { message: String },
}

impl LayoutError {
    pub(crate) fn non_positive(name: &'static str, value: f32) -> Self {
        Self::InvalidArgument {
            name,
            expected: "strictly positive",
            value,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTree {
            message: message.into(),
        }
    }
}
