//! Error types

use thiserror::Error;

/// Failure of the text-measurement primitive during pagination
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("text measurement failed at offset {offset}: {reason}")]
    Measurement { offset: usize, reason: String },
}

/// Failure converting to or from the RTF interchange format
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("input is empty")]
    Empty,
    #[error("missing {{\\rtf header")]
    MissingHeader,
    #[error("unbalanced group braces at byte {0}")]
    Unbalanced(usize),
    #[error("cannot represent {0} in RTF")]
    Unrepresentable(String),
}

/// Failure of the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(uuid::Uuid),
    #[error("document {0} already exists")]
    Duplicate(uuid::Uuid),
}

/// Failure of a stylesheet mutation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("\"{0}\" is a system style and cannot be deleted")]
    SystemStyle(String),
    #[error("style \"{name}\" is used by {documents} document(s); supply a replacement")]
    InUse { name: String, documents: usize },
    #[error("style \"{0}\" is not defined in the project stylesheet")]
    NotFound(String),
    #[error("style \"{0}\" cannot replace itself")]
    SelfReplacement(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
