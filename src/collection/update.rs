use std::future::Future;
use std::sync::Arc;

use super::{Collection, Item, RefreshManyParams, RefreshParams, UpdateManyParams, UpdateParams};
use crate::error::CollectionError;
use crate::events::EventChannel;
use crate::lifecycle::Operation;
use crate::merge;
use crate::request::first_value;

impl<T: Item> Collection<T> {
    /// Upserts the item returned by the update request.
    ///
    /// With a refresh request the response payload is ignored and the item
    /// is refetched instead; the updating marker stays set until the refresh
    /// completes. The refetched item is announced once, as updated.
    pub fn update(
        &self,
        params: UpdateParams<T>,
    ) -> impl Future<Output = Result<Option<T>, CollectionError>> + Send + 'static {
        let UpdateParams {
            request,
            item,
            refresh_request,
            refresh_item,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Update, vec![item.clone()]);
        let collection = self.clone();

        async move {
            let inner = Arc::clone(&collection.inner);
            let outcome = match (first_value(request).await, refresh_request) {
                (Ok(_), Some(refresh_request)) => {
                    let descriptor = refresh_item.unwrap_or(item);
                    collection
                        .refresh_silently(RefreshParams::new(refresh_request, descriptor))
                        .await
                }
                (Ok(Some(updated)), None) => inner
                    .merge(Operation::Update, |state, comparator| {
                        let mut items = state.items.to_vec();
                        merge::upsert_one(updated.clone(), &mut items, comparator)?;
                        state.set_items(items);
                        Ok(())
                    })
                    .map(|()| Some(updated)),
                (Ok(None), None) => Ok(None),
                (Err(error), _) => Err(inner.request_failed(Operation::Update, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Update, outcome, callbacks);
            if let Ok(Some(updated)) = &outcome {
                inner.emit(EventChannel::Updated, std::slice::from_ref(updated));
            }
            outcome
        }
    }

    /// Batch update; the merge is all or nothing.
    pub fn update_many(
        &self,
        params: UpdateManyParams<T>,
    ) -> impl Future<Output = Result<Vec<T>, CollectionError>> + Send + 'static {
        let UpdateManyParams {
            request,
            items,
            refresh_request,
            refresh_items,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Update, items.clone());
        let collection = self.clone();

        async move {
            let inner = Arc::clone(&collection.inner);
            let outcome = match (request.resolve().await, refresh_request) {
                (Ok(_), Some(refresh_request)) => {
                    let descriptors = refresh_items.unwrap_or(items);
                    collection
                        .refresh_many_silently(RefreshManyParams::new(refresh_request, descriptors))
                        .await
                }
                (Ok(Some(fetched)), None) => inner
                    .upsert_fetched(Operation::Update, &fetched)
                    .map(|()| Some(fetched.items)),
                (Ok(None), None) => Ok(None),
                (Err(error), _) => Err(inner.request_failed(Operation::Update, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Update, outcome, callbacks);
            if let Ok(Some(updated)) = &outcome {
                inner.emit(EventChannel::Updated, updated);
            }
            outcome.map(Option::unwrap_or_default)
        }
    }
}
