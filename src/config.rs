use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::comparator::{default_id_fields, Comparator, FieldGroup};
use crate::report::{ErrorReporter, TracingReporter};

fn default_allow_fetched_duplicates() -> bool {
    true
}

fn default_duplicate_error_payload() -> Value {
    json!({ "status": 409 })
}

/// Plain collection settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    /// Identity field groups, evaluated in order.
    pub id_fields: Vec<FieldGroup>,
    /// When set, duplicates fail the operation with this message instead of
    /// going through `on_error`.
    pub throw_on_duplicates: Option<String>,
    /// Keep fetched batches that contain duplicates (the fault is still
    /// reported).
    #[serde(default = "default_allow_fetched_duplicates")]
    pub allow_fetched_duplicates: bool,
    /// Value handed to `on_error` when a duplicate is rejected.
    #[serde(default = "default_duplicate_error_payload")]
    pub duplicate_error_payload: Value,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        CollectionOptions {
            id_fields: default_id_fields(),
            throw_on_duplicates: None,
            allow_fetched_duplicates: default_allow_fetched_duplicates(),
            duplicate_error_payload: default_duplicate_error_payload(),
        }
    }
}

impl CollectionOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Options plus the live collaborators of a collection.
pub struct CollectionConfig<T> {
    pub comparator: Comparator<T>,
    pub throw_on_duplicates: Option<String>,
    pub allow_fetched_duplicates: bool,
    pub duplicate_error_payload: Value,
    pub error_reporter: Arc<dyn ErrorReporter>,
}

impl<T> Clone for CollectionConfig<T> {
    fn clone(&self) -> Self {
        CollectionConfig {
            comparator: self.comparator.clone(),
            throw_on_duplicates: self.throw_on_duplicates.clone(),
            allow_fetched_duplicates: self.allow_fetched_duplicates,
            duplicate_error_payload: self.duplicate_error_payload.clone(),
            error_reporter: Arc::clone(&self.error_reporter),
        }
    }
}

impl<T> fmt::Debug for CollectionConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("comparator", &self.comparator)
            .field("throw_on_duplicates", &self.throw_on_duplicates)
            .field("allow_fetched_duplicates", &self.allow_fetched_duplicates)
            .field("duplicate_error_payload", &self.duplicate_error_payload)
            .finish_non_exhaustive()
    }
}

impl<T> Default for CollectionConfig<T> {
    fn default() -> Self {
        CollectionConfig::from(CollectionOptions::default())
    }
}

impl<T> From<CollectionOptions> for CollectionConfig<T> {
    fn from(options: CollectionOptions) -> Self {
        CollectionConfig {
            comparator: Comparator::Fields(options.id_fields),
            throw_on_duplicates: options.throw_on_duplicates,
            allow_fetched_duplicates: options.allow_fetched_duplicates,
            duplicate_error_payload: options.duplicate_error_payload,
            error_reporter: Arc::new(TracingReporter),
        }
    }
}

impl<T> CollectionConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comparator(mut self, comparator: Comparator<T>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_id_fields<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FieldGroup>,
    {
        self.comparator = Comparator::fields(groups);
        self
    }

    pub fn with_throw_on_duplicates(mut self, message: impl Into<String>) -> Self {
        self.throw_on_duplicates = Some(message.into());
        self
    }

    pub fn with_allow_fetched_duplicates(mut self, allow: bool) -> Self {
        self.allow_fetched_duplicates = allow;
        self
    }

    pub fn with_duplicate_error_payload(mut self, payload: Value) -> Self {
        self.duplicate_error_payload = payload;
        self
    }

    pub fn with_error_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.error_reporter = Arc::new(reporter);
        self
    }
}
