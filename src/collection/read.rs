use std::future::Future;
use std::sync::Arc;

use super::{Collection, Inner, Item, ReadManyParams, ReadOneParams, ReadParams};
use crate::error::{CollectionError, DuplicateOrigin};
use crate::events::EventChannel;
use crate::lifecycle::Operation;
use crate::merge::{self, Conflict};
use crate::request::{first_value, Fetched};

impl<T: Item> Collection<T> {
    /// Replaces the whole list (and the total count, when reported) with the
    /// fetched items.
    ///
    /// On failure or duplicate rejection the list and total count are
    /// cleared unless `keep_existing_on_error` is set.
    pub fn read(
        &self,
        params: ReadParams<T>,
    ) -> impl Future<Output = Result<Option<Fetched<T>>, CollectionError>> + Send + 'static {
        let guard = self.inner.acquire(Operation::Read, Vec::new());
        let inner = Arc::clone(&self.inner);

        async move {
            let ReadParams {
                request,
                keep_existing_on_error,
                callbacks,
            } = params;

            let outcome = match first_value(request).await {
                Ok(Some(fetched)) => inner
                    .replace_fetched(&fetched, keep_existing_on_error)
                    .map(|()| Some(fetched)),
                Ok(None) => Ok(None),
                Err(error) => {
                    if !keep_existing_on_error {
                        inner.publish(|state, _| state.reset());
                    }
                    Err(inner.request_failed(Operation::Read, error))
                }
            };
            drop(guard);

            let outcome = inner.finish(Operation::Read, outcome, callbacks);
            if let Ok(Some(fetched)) = &outcome {
                inner.emit(EventChannel::Read, &fetched.items);
            }
            outcome
        }
    }

    /// Upserts a single fetched item.
    pub fn read_one(
        &self,
        params: ReadOneParams<T>,
    ) -> impl Future<Output = Result<Option<T>, CollectionError>> + Send + 'static {
        let ReadOneParams {
            request,
            item,
            callbacks,
        } = params;
        let reading = self.inner.acquire(Operation::Read, Vec::new());
        let refreshing = item.map(|item| self.inner.acquire(Operation::Refresh, vec![item]));
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = match first_value(request).await {
                Ok(Some(fetched)) => inner
                    .merge(Operation::Read, |state, comparator| {
                        let mut items = state.items.to_vec();
                        merge::upsert_one(fetched.clone(), &mut items, comparator)?;
                        state.set_items(items);
                        Ok(())
                    })
                    .map(|()| Some(fetched)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Read, error)),
            };
            drop(refreshing);
            drop(reading);

            let outcome = inner.finish(Operation::Read, outcome, callbacks);
            if let Ok(Some(item)) = &outcome {
                inner.emit(EventChannel::Read, std::slice::from_ref(item));
            }
            outcome
        }
    }

    /// Upserts fetched items into the list without dropping the others.
    pub fn read_many(
        &self,
        params: ReadManyParams<T>,
    ) -> impl Future<Output = Result<Vec<T>, CollectionError>> + Send + 'static {
        let ReadManyParams {
            request,
            items,
            callbacks,
        } = params;
        let reading = self.inner.acquire(Operation::Read, Vec::new());
        let refreshing =
            (!items.is_empty()).then(|| self.inner.acquire(Operation::Refresh, items));
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = match request.resolve().await {
                Ok(Some(fetched)) => inner
                    .upsert_fetched(Operation::Read, &fetched)
                    .map(|()| Some(fetched.items)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Read, error)),
            };
            drop(refreshing);
            drop(reading);

            let outcome = inner.finish(Operation::Read, outcome, callbacks);
            if let Ok(Some(items)) = &outcome {
                inner.emit(EventChannel::Read, items);
            }
            outcome.map(Option::unwrap_or_default)
        }
    }
}

impl<T: Item> Inner<T> {
    fn replace_fetched(&self, fetched: &Fetched<T>, keep_existing_on_error: bool) -> Result<(), CollectionError> {
        let allow_duplicates = self.config().allow_fetched_duplicates;

        let kept_duplicates = self.merge(Operation::Read, |state, comparator| {
            let duplicate = merge::has_duplicates(&fetched.items, comparator).cloned();
            if let Some(item) = &duplicate {
                if !allow_duplicates {
                    if !keep_existing_on_error {
                        state.reset();
                    }
                    return Err(Conflict {
                        origin: DuplicateOrigin::Batch,
                        item: item.clone(),
                    });
                }
            }

            state.set_items(fetched.items.clone());
            if let Some(total) = fetched.total_count {
                state.total_count_fetched = Some(total);
            }
            Ok(duplicate.is_some())
        })?;

        if kept_duplicates {
            self.report_fetched_duplicates(&fetched.items);
        }
        Ok(())
    }

    /// Upserts a fetched batch, taking over its total count when reported.
    pub(super) fn upsert_fetched(&self, operation: Operation, fetched: &Fetched<T>) -> Result<(), CollectionError> {
        self.merge(operation, |state, comparator| {
            let merged = merge::upsert_many(fetched.items.clone(), &state.items, comparator)?;
            state.set_items(merged);
            if let Some(total) = fetched.total_count {
                state.total_count_fetched = Some(total);
            }
            Ok(())
        })
    }
}
