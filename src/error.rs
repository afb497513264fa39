//! Error taxonomy of the catalog. Validation problems never leave the process;
//! transport problems describe a failed gateway round trip. Both are plain
//! values so the engine can hand them to the front end without panicking.

use std::fmt;

use thiserror::Error;

use crate::models::DraftField;

/// Remote operation a failure belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A single field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: DraftField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: DraftField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field of a draft that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", summarize(.fields))]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    pub fn single(field: DraftField, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Message attached to one field, if that field failed.
    pub fn for_field(&self, field: DraftField) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Failure of a remote call. Non-success statuses are not distinguished beyond
/// the code carried for display.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("{operation} failed: {message}")]
    Network { operation: Operation, message: String },
    #[error("{operation} failed: HTTP {status}")]
    Status { operation: Operation, status: u16 },
    #[error("{operation} failed: malformed response ({message})")]
    Decode { operation: Operation, message: String },
}

impl TransportError {
    pub fn operation(&self) -> Operation {
        match self {
            TransportError::Network { operation, .. }
            | TransportError::Status { operation, .. }
            | TransportError::Decode { operation, .. } => *operation,
        }
    }
}

/// Everything the engine can refuse or report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("track {0} is not in the catalog")]
    UnknownTrack(i64),
    #[error("the catalog is not loaded yet")]
    NotReady,
}
