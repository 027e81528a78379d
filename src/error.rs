use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Error produced by a caller-supplied request producer.
///
/// Kept behind an `Arc` so the same failure can be handed to `on_error` and
/// returned from the operation future.
pub type RequestError = Arc<dyn std::error::Error + Send + Sync>;

/// Where a duplicate was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOrigin {
    /// The incoming batch contains two items with the same identity.
    Batch,
    /// An incoming item collides with an item the collection already holds.
    Existing,
    /// The held list already contains two items with the same identity.
    List,
}

impl fmt::Display for DuplicateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateOrigin::Batch => write!(f, "within incoming batch"),
            DuplicateOrigin::Existing => write!(f, "against existing item"),
            DuplicateOrigin::List => write!(f, "within held list"),
        }
    }
}

/// Failure of a single collection operation.
#[derive(Debug, Clone, Error)]
pub enum CollectionError {
    /// Rejected because of a duplicate; `payload` is the configured
    /// duplicate error value.
    #[error("duplicate item rejected ({origin})")]
    Duplicate {
        origin: DuplicateOrigin,
        payload: Value,
    },
    /// Rejected because of a duplicate while "throw on duplicates" is set.
    /// `on_error` is not invoked for this variant.
    #[error("{message} ({origin})")]
    DuplicateFatal {
        origin: DuplicateOrigin,
        message: String,
    },
    #[error("request failed: {0}")]
    Request(RequestError),
}

impl CollectionError {
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            CollectionError::Duplicate { .. } | CollectionError::DuplicateFatal { .. }
        )
    }

    pub fn duplicate_origin(&self) -> Option<DuplicateOrigin> {
        match self {
            CollectionError::Duplicate { origin, .. }
            | CollectionError::DuplicateFatal { origin, .. } => Some(*origin),
            CollectionError::Request(_) => None,
        }
    }
}

/// Internal faults that are reported but never returned to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{operation} callback panicked: {message}")]
    CallbackPanicked {
        operation: &'static str,
        message: String,
    },
    #[error("{channel} listener panicked: {message}")]
    ListenerPanicked {
        channel: &'static str,
        message: String,
    },
    #[error("total count left unchanged: {0}")]
    InvalidTotalCount(String),
    #[error("fetched items contain duplicates: {0}")]
    FetchedDuplicates(String),
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
