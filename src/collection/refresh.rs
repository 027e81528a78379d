use std::future::Future;
use std::sync::Arc;

use super::{Collection, Item, RefreshManyParams, RefreshParams};
use crate::error::CollectionError;
use crate::events::EventChannel;
use crate::lifecycle::Operation;
use crate::merge;
use crate::request::first_value;

impl<T: Item> Collection<T> {
    /// Refetches one item and upserts it. Only the item's refreshing marker
    /// is set; the collection-wide reading flag is left alone.
    pub fn refresh(
        &self,
        params: RefreshParams<T>,
    ) -> impl Future<Output = Result<Option<T>, CollectionError>> + Send + 'static {
        let refreshed = self.refresh_silently(params);
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = refreshed.await;
            if let Ok(Some(item)) = &outcome {
                inner.emit(EventChannel::Read, std::slice::from_ref(item));
            }
            outcome
        }
    }

    /// [`Collection::refresh`] without the read event, for operations that
    /// announce the refetched item on their own channel.
    pub(super) fn refresh_silently(
        &self,
        params: RefreshParams<T>,
    ) -> impl Future<Output = Result<Option<T>, CollectionError>> + Send + 'static {
        let RefreshParams {
            request,
            item,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Refresh, vec![item]);
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = match first_value(request).await {
                Ok(Some(fetched)) => inner
                    .merge(Operation::Refresh, |state, comparator| {
                        let mut items = state.items.to_vec();
                        merge::upsert_one(fetched.clone(), &mut items, comparator)?;
                        state.set_items(items);
                        Ok(())
                    })
                    .map(|()| Some(fetched)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Refresh, error)),
            };
            drop(guard);

            inner.finish(Operation::Refresh, outcome, callbacks)
        }
    }

    pub fn refresh_many(
        &self,
        params: RefreshManyParams<T>,
    ) -> impl Future<Output = Result<Vec<T>, CollectionError>> + Send + 'static {
        let refreshed = self.refresh_many_silently(params);
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = refreshed.await;
            if let Ok(Some(items)) = &outcome {
                inner.emit(EventChannel::Read, items);
            }
            outcome.map(Option::unwrap_or_default)
        }
    }

    pub(super) fn refresh_many_silently(
        &self,
        params: RefreshManyParams<T>,
    ) -> impl Future<Output = Result<Option<Vec<T>>, CollectionError>> + Send + 'static {
        let RefreshManyParams {
            request,
            items,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Refresh, items);
        let inner = Arc::clone(&self.inner);

        async move {
            let outcome = match request.resolve().await {
                Ok(Some(fetched)) => inner
                    .upsert_fetched(Operation::Refresh, &fetched)
                    .map(|()| Some(fetched.items)),
                Ok(None) => Ok(None),
                Err(error) => Err(inner.request_failed(Operation::Refresh, error)),
            };
            drop(guard);

            inner.finish(Operation::Refresh, outcome, callbacks)
        }
    }
}
