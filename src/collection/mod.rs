//! The collection engine.
//!
//! A [`Collection`] owns one ordered list of items plus its busy markers,
//! statuses and total count. All mutation goes through the operation methods
//! (create, read, update, delete, refresh and their batch variants) and the
//! status setters. Each operation method marks busy state synchronously and
//! returns a future that performs the request, merges the result and
//! releases the markers.
//!
//! ```ignore
//! use reactive_collection::{request, Collection, CreateParams};
//!
//! let todos = Collection::<Todo>::new();
//! todos
//!     .create(CreateParams::new(request::from_future(api.create(draft))))
//!     .await?;
//! assert_eq!(todos.snapshot().len(), 1);
//! ```

mod create;
mod delete;
mod guard;
mod params;
mod read;
mod refresh;
mod status;
mod update;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::comparator::{Comparator, FieldGroup};
use crate::config::{CollectionConfig, CollectionOptions};
use crate::error::{panic_message, CollectionError, RequestError, RuntimeError};
use crate::events::{EventChannel, EventNotifier, ListenerId};
use crate::ledger::TotalCountDirective;
use crate::lifecycle::Operation;
use crate::merge::{self, Conflict};
use crate::report::ErrorReporter;
use crate::state::CollectionState;
use crate::view::CollectionSnapshot;

use guard::BusyGuard;
use params::Callbacks;

pub use params::{
    CreateManyParams, CreateParams, DeleteManyParams, DeleteParams, ReadManyParams, ReadOneParams,
    ReadParams, RefreshManyParams, RefreshParams, UpdateManyParams, UpdateParams,
};

/// Types a collection can hold.
pub trait Item: Serialize + Clone + Send + Sync + 'static {}

impl<T> Item for T where T: Serialize + Clone + Send + Sync + 'static {}

/// In-memory collection with tracked operations. Clones share state.
pub struct Collection<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct Inner<T> {
    state: RwLock<CollectionState<T>>,
    config: RwLock<CollectionConfig<T>>,
    events: EventNotifier<T>,
    watchers: Mutex<Vec<UnboundedSender<CollectionSnapshot<T>>>>,
}

impl<T: Item> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Item> Collection<T> {
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    pub fn with_config(config: CollectionConfig<T>) -> Self {
        Collection {
            inner: Arc::new(Inner {
                state: RwLock::new(CollectionState::default()),
                config: RwLock::new(config),
                events: EventNotifier::new(),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn from_options(options: CollectionOptions) -> Self {
        Self::with_config(CollectionConfig::from(options))
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> CollectionSnapshot<T> {
        self.inner.snapshot()
    }

    /// Stream of snapshots: the current one first, then one per state change.
    pub fn changes(&self) -> UnboundedReceiver<CollectionSnapshot<T>> {
        let (sender, receiver) = mpsc::unbounded();
        let comparator = self.inner.comparator();
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut watchers = self.inner.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if sender
            .unbounded_send(CollectionSnapshot::new(state.clone(), comparator))
            .is_ok()
        {
            watchers.push(sender);
        }
        receiver
    }

    pub fn items(&self) -> Vec<T> {
        self.snapshot().items().to_vec()
    }

    pub fn total_count_fetched(&self) -> Option<u64> {
        self.inner.read_state(|state| state.total_count_fetched)
    }

    pub fn is_creating(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_creating())
    }

    pub fn is_reading(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_reading())
    }

    pub fn is_updating(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_updating())
    }

    pub fn is_deleting(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_deleting())
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_refreshing())
    }

    pub fn is_saving(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_saving())
    }

    pub fn is_mutating(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_mutating())
    }

    pub fn is_processing(&self) -> bool {
        self.inner.read_state(|state| state.lifecycle.is_processing())
    }

    pub fn is_item_updating(&self, item: &T) -> bool {
        self.snapshot().is_item_updating(item)
    }

    pub fn is_item_deleting(&self, item: &T) -> bool {
        self.snapshot().is_item_deleting(item)
    }

    pub fn is_item_refreshing(&self, item: &T) -> bool {
        self.snapshot().is_item_refreshing(item)
    }

    pub fn is_item_mutating(&self, item: &T) -> bool {
        self.snapshot().is_item_mutating(item)
    }

    pub fn is_item_processing(&self, item: &T) -> bool {
        self.snapshot().is_item_processing(item)
    }

    pub fn get_item(&self, descriptor: &T) -> Option<T> {
        self.snapshot().get_item(descriptor).cloned()
    }

    pub fn get_item_by_field(&self, field: &str, value: &Value) -> Option<T> {
        self.snapshot().get_item_by_field(field, value).cloned()
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn comparator(&self) -> Comparator<T> {
        self.inner.comparator()
    }

    /// Replaces the comparator and publishes a snapshot that uses it.
    pub fn set_comparator(&self, comparator: Comparator<T>) {
        self.inner.configure(|config| config.comparator = comparator);
        self.inner.publish(|_, _| ());
    }

    pub fn set_id_fields<I, G>(&self, groups: I)
    where
        I: IntoIterator<Item = G>,
        G: Into<FieldGroup>,
    {
        self.set_comparator(Comparator::fields(groups));
    }

    pub fn set_throw_on_duplicates(&self, message: Option<String>) {
        self.inner.configure(|config| config.throw_on_duplicates = message);
    }

    pub fn set_allow_fetched_duplicates(&self, allow: bool) {
        self.inner.configure(|config| config.allow_fetched_duplicates = allow);
    }

    pub fn set_duplicate_error_payload(&self, payload: Value) {
        self.inner.configure(|config| config.duplicate_error_payload = payload);
    }

    pub fn set_error_reporter(&self, reporter: impl ErrorReporter + 'static) {
        let reporter: Arc<dyn ErrorReporter> = Arc::new(reporter);
        self.inner.configure(|config| config.error_reporter = reporter);
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn events(&self) -> &EventNotifier<T> {
        &self.inner.events
    }

    pub fn on<F>(&self, channel: EventChannel, listener: F) -> ListenerId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.inner.events.on(channel, listener)
    }

    /// Listens for updates of items matching any of `descriptors`.
    pub fn on_items_updated<F>(&self, descriptors: Vec<T>, listener: F) -> ListenerId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.on_matching(EventChannel::Updated, descriptors, listener)
    }

    /// Listens for deletion of items matching any of `descriptors`.
    pub fn on_items_deleted<F>(&self, descriptors: Vec<T>, listener: F) -> ListenerId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.on_matching(EventChannel::Deleted, descriptors, listener)
    }

    fn on_matching<F>(&self, channel: EventChannel, descriptors: Vec<T>, listener: F) -> ListenerId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        let comparator = self.comparator();
        self.inner.events.on(channel, move |items: &[T]| {
            let matching = comparator.matching(items, &descriptors);
            if !matching.is_empty() {
                listener(&matching);
            }
        })
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.events.remove_listener(id)
    }
}

impl<T: Item> Inner<T> {
    fn read_state<R>(&self, read: impl FnOnce(&CollectionState<T>) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        read(&state)
    }

    fn config(&self) -> CollectionConfig<T> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn comparator(&self) -> Comparator<T> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .comparator
            .clone()
    }

    fn configure(&self, change: impl FnOnce(&mut CollectionConfig<T>)) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut config);
    }

    fn snapshot(&self) -> CollectionSnapshot<T> {
        let comparator = self.comparator();
        self.read_state(|state| CollectionSnapshot::new(state.clone(), comparator))
    }

    /// Applies `change` and publishes the resulting state to watchers.
    ///
    /// Watchers are notified while the state lock is held so they observe
    /// publications in order.
    fn publish<R>(&self, change: impl FnOnce(&mut CollectionState<T>, &Comparator<T>) -> R) -> R {
        let comparator = self.comparator();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let result = change(&mut state, &comparator);

        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if !watchers.is_empty() {
            let snapshot = CollectionSnapshot::new(state.clone(), comparator);
            watchers.retain(|watcher| watcher.unbounded_send(snapshot.clone()).is_ok());
        }
        result
    }

    /// Marks busy state and returns the guard that releases it.
    fn acquire(self: &Arc<Self>, operation: Operation, items: Vec<T>) -> BusyGuard<T> {
        debug!(%operation, items = items.len(), "operation started");
        self.publish(|state, comparator| state.lifecycle.mark(operation, &items, comparator));
        BusyGuard::new(Arc::clone(self), operation, items)
    }

    fn report(&self, error: RuntimeError) {
        let reporter = Arc::clone(
            &self
                .config
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .error_reporter,
        );
        reporter.report(&error);
    }

    /// Runs a merge step atomically and publishes the result. Steps return a
    /// conflict before touching the list.
    fn merge<R>(
        &self,
        operation: Operation,
        step: impl FnOnce(&mut CollectionState<T>, &Comparator<T>) -> Result<R, Conflict<T>>,
    ) -> Result<R, CollectionError> {
        self.publish(step)
            .map_err(|conflict| self.reject(operation, conflict))
    }

    fn reject(&self, operation: Operation, conflict: Conflict<T>) -> CollectionError {
        let config = self.config();
        warn!(%operation, origin = %conflict.origin, "duplicate rejected");
        match config.throw_on_duplicates {
            Some(message) => CollectionError::DuplicateFatal {
                origin: conflict.origin,
                message,
            },
            None => CollectionError::Duplicate {
                origin: conflict.origin,
                payload: config.duplicate_error_payload,
            },
        }
    }

    fn request_failed(&self, operation: Operation, error: RequestError) -> CollectionError {
        debug!(%operation, %error, "request failed");
        CollectionError::Request(error)
    }

    /// Removes every held item matching `descriptors` and applies the total
    /// count directive.
    fn remove(
        &self,
        descriptors: &[T],
        directive: Option<&TotalCountDirective>,
        response: Option<Value>,
    ) {
        let rejected = self.publish(|state, comparator| {
            let remaining = comparator.without(&state.items, descriptors);
            state.set_items(remaining);

            let directive = directive?;
            match directive.apply(state.total_count_fetched, response.as_ref(), descriptors.len()) {
                Ok(total) => {
                    state.total_count_fetched = total;
                    None
                }
                Err(reason) => Some(reason),
            }
        });
        if let Some(reason) = rejected {
            self.report(RuntimeError::InvalidTotalCount(reason));
        }
    }

    /// Reports fetched duplicates that were kept.
    fn report_fetched_duplicates(&self, items: &[T]) {
        let comparator = self.comparator();
        if let Some(report) = merge::get_duplicates(items, &comparator) {
            let count: usize = report.values().map(|group| group.len()).sum();
            self.report(RuntimeError::FetchedDuplicates(format!(
                "{} duplicate(s) of {} item(s) among {} fetched",
                count,
                report.len(),
                items.len()
            )));
        }
    }

    fn guarded(&self, operation: Operation, callback: impl FnOnce()) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(callback)) {
            self.report(RuntimeError::CallbackPanicked {
                operation: operation.name(),
                message: panic_message(payload.as_ref()),
            });
        }
    }

    /// Invokes the callback matching `outcome`. A fatal duplicate skips
    /// `on_error`.
    fn finish<V>(
        &self,
        operation: Operation,
        outcome: Result<Option<V>, CollectionError>,
        callbacks: Callbacks<V>,
    ) -> Result<Option<V>, CollectionError> {
        match &outcome {
            Ok(Some(value)) => {
                debug!(%operation, "operation succeeded");
                if let Some(on_success) = callbacks.on_success {
                    self.guarded(operation, || on_success(value));
                }
            }
            Ok(None) => debug!(%operation, "request returned nothing"),
            Err(CollectionError::DuplicateFatal { .. }) => {}
            Err(error) => {
                if let Some(on_error) = callbacks.on_error {
                    self.guarded(operation, || on_error(error));
                }
            }
        }
        outcome
    }

    fn emit(&self, channel: EventChannel, items: &[T]) {
        if !self.events.has_listeners(channel) {
            return;
        }
        let reporter = Arc::clone(
            &self
                .config
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .error_reporter,
        );
        self.events.emit(channel, items, reporter.as_ref());
    }
}
