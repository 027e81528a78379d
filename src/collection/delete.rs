use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{Collection, DeleteManyParams, DeleteParams, Item, ReadParams};
use crate::error::CollectionError;
use crate::events::EventChannel;
use crate::lifecycle::Operation;
use crate::request::first_value;

impl<T: Item> Collection<T> {
    /// Removes every held item matching the descriptor once the request
    /// succeeds. Without a request the removal is local only.
    ///
    /// A `read_request` replaces the local removal with a full re-read. The
    /// deleting marker stays set until that read completes.
    pub fn delete<R>(
        &self,
        params: DeleteParams<T, R>,
    ) -> impl Future<Output = Result<Option<R>, CollectionError>> + Send + 'static
    where
        R: Serialize + Send + 'static,
    {
        let DeleteParams {
            request,
            item,
            decrement_total_count,
            read_request,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Delete, vec![item.clone()]);
        let collection = self.clone();

        async move {
            let inner = Arc::clone(&collection.inner);
            let response = match request {
                Some(request) => first_value(request).await,
                None => Ok(None),
            };

            let outcome = match (response, read_request) {
                (Ok(response), Some(read_request)) => collection
                    .read(ReadParams::new(read_request))
                    .await
                    .map(|_| Some(response)),
                (Ok(response), None) => {
                    let payload = response.as_ref().and_then(to_payload);
                    inner.remove(
                        std::slice::from_ref(&item),
                        decrement_total_count.as_ref(),
                        payload,
                    );
                    Ok(Some(response))
                }
                (Err(error), _) => Err(inner.request_failed(Operation::Delete, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Delete, outcome, callbacks);
            if outcome.is_ok() {
                inner.emit(EventChannel::Deleted, std::slice::from_ref(&item));
            }
            outcome.map(Option::flatten)
        }
    }

    /// Batch delete. A `Field` total count directive reads the first
    /// response of the batch.
    pub fn delete_many<R>(
        &self,
        params: DeleteManyParams<T, R>,
    ) -> impl Future<Output = Result<Vec<R>, CollectionError>> + Send + 'static
    where
        R: Serialize + Send + 'static,
    {
        let DeleteManyParams {
            request,
            items,
            decrement_total_count,
            read_request,
            callbacks,
        } = params;
        let guard = self.inner.acquire(Operation::Delete, items.clone());
        let collection = self.clone();

        async move {
            let inner = Arc::clone(&collection.inner);
            let responses = match request {
                Some(request) => request
                    .resolve()
                    .await
                    .map(|fetched| fetched.map(|fetched| fetched.items).unwrap_or_default()),
                None => Ok(Vec::new()),
            };

            let outcome = match (responses, read_request) {
                (Ok(responses), Some(read_request)) => collection
                    .read(ReadParams::new(read_request))
                    .await
                    .map(|_| Some(responses)),
                (Ok(responses), None) => {
                    let payload = responses.first().and_then(to_payload);
                    inner.remove(&items, decrement_total_count.as_ref(), payload);
                    Ok(Some(responses))
                }
                (Err(error), _) => Err(inner.request_failed(Operation::Delete, error)),
            };
            drop(guard);

            let outcome = inner.finish(Operation::Delete, outcome, callbacks);
            if outcome.is_ok() {
                inner.emit(EventChannel::Deleted, &items);
            }
            outcome.map(Option::unwrap_or_default)
        }
    }
}

fn to_payload<R: Serialize>(response: &R) -> Option<Value> {
    serde_json::to_value(response).ok()
}
