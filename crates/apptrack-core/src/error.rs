//! Typed errors for the state layer.
//!
//! Plumbing errors (I/O, serialization) travel as `anyhow::Error`; the
//! variants here are the ones callers are expected to match on.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A view or router was built without one of its containers.
    #[error("{container} must be provided before views can be built")]
    MissingProvider { container: &'static str },

    /// A required form field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Uploads only accept a fixed set of document extensions.
    #[error("unsupported file type for {name}: expected one of pdf, doc, docx, txt")]
    UnsupportedFileType { name: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}
