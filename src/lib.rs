mod collection;
mod comparator;
mod config;
mod error;
mod events;
mod ledger;
mod lifecycle;
pub mod merge;
mod report;
pub mod request;
mod state;
mod view;

pub use collection::{
    Collection, CreateManyParams, CreateParams, DeleteManyParams, DeleteParams, Item,
    ReadManyParams, ReadOneParams, ReadParams, RefreshManyParams, RefreshParams,
    UpdateManyParams, UpdateParams,
};
pub use comparator::{
    default_id_fields, equal_values, is_empty_value, Comparator, FieldGroup, Prepared,
};
pub use config::{CollectionConfig, CollectionOptions};
pub use error::{CollectionError, DuplicateOrigin, RequestError, RuntimeError};
pub use events::{EventChannel, EventNotifier, ListenerId};
pub use ledger::TotalCountDirective;
pub use lifecycle::{Lifecycle, Operation};
pub use merge::{Conflict, DuplicateReport};
pub use report::{BufferReporter, ErrorReporter, NoopReporter, TracingReporter};
pub use request::{BatchRequest, Fetched, Request};
pub use view::{CollectionSnapshot, ViewFlags};
