use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by reflective field access and attribute modification.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("unknown field '{field}' on type {type_name}")]
    UnknownField {
        type_name: &'static str,
        field: String,
    },

    #[error("unknown object type '{0}'")]
    UnknownType(String),

    #[error("an object named '{name}' of type {type_name} is already registered")]
    DuplicateName {
        type_name: &'static str,
        name: String,
    },

    /// An intermediate value along a dotted attribute path exists but is not
    /// a dictionary.
    #[error("value along '{path}' must be a dictionary")]
    NotADictionary { path: String },

    #[error("field '{field}' expects a {expected} value")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' references unknown {ref_type} '{name}'")]
    DanglingReference {
        field: &'static str,
        ref_type: &'static str,
        name: String,
    },

    #[error("malformed full name '{name}' for type {type_name}")]
    MalformedName {
        type_name: &'static str,
        name: String,
    },
}

/// Errors raised by the state snapshot reader and writer.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{call} failed for '{}': {source}", .path.display())]
    Io {
        call: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encoding state record: {0}")]
    Encode(#[from] serde_json::Error),
}
