use std::future::Future;
use std::sync::Arc;

use super::{Collection, CreateManyParams, CreateParams, Item};
use crate::error::CollectionError;
use crate::events::EventChannel;
use crate::lifecycle::Operation;
use crate::merge;
use crate::request::first_value;

impl<T: Item> Collection<T> {
    /// Appends the item returned by the request, rejecting it when it
    /// matches an item already held.
    pub fn create(
        &self,
        params: CreateParams<T>,
    ) -> impl Future<Output = Result<Option<T>, CollectionError>> + Send + 'static {
        let guard = self.inner.acquire(Operation::Create, Vec::new());
        let inner = Arc::clone(&self.inner);

        async move {
            let CreateParams { request, callbacks } = params;

            let outcome = match first_value(request).await {
                Ok(Some(item)) => inner
                    .merge(Operation::Create, |state, comparator| {
                        let merged = merge::append_new(vec![item.clone()], &state.items, comparator)?;
                        state.set_items(merged);
                        Ok(())
                    })
                    .map(|()| Some(item)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Create, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Create, outcome, callbacks);
            if let Ok(Some(item)) = &outcome {
                inner.emit(EventChannel::Created, std::slice::from_ref(item));
            }
            outcome
        }
    }

    /// Appends every returned item; the whole batch is rejected when any
    /// item is a duplicate.
    pub fn create_many(
        &self,
        params: CreateManyParams<T>,
    ) -> impl Future<Output = Result<Vec<T>, CollectionError>> + Send + 'static {
        let guard = self.inner.acquire(Operation::Create, Vec::new());
        let inner = Arc::clone(&self.inner);

        async move {
            let CreateManyParams { request, callbacks } = params;

            let outcome = match request.resolve().await {
                Ok(Some(fetched)) => inner
                    .merge(Operation::Create, |state, comparator| {
                        let merged = merge::append_new(fetched.items.clone(), &state.items, comparator)?;
                        state.set_items(merged);
                        if let Some(total) = fetched.total_count {
                            state.total_count_fetched = Some(total);
                        }
                        Ok(())
                    })
                    .map(|()| Some(fetched.items)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Create, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Create, outcome, callbacks);
            if let Ok(Some(items)) = &outcome {
                inner.emit(EventChannel::Created, items);
            }
            outcome.map(Option::unwrap_or_default)
        }
    }
}
