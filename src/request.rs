//! Request producers consumed by collection operations.
//!
//! A request is any stream of results; operations only ever take its first
//! item. A stream that ends without yielding means "nothing returned".

use std::future::Future;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RequestError;

pub type Request<V> = BoxStream<'static, Result<V, RequestError>>;

/// Items returned by a batch request, with the server-reported total when
/// the backend paginates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> Fetched<T> {
    pub fn new(items: Vec<T>) -> Self {
        Fetched {
            items,
            total_count: None,
        }
    }

    pub fn with_total_count(items: Vec<T>, total_count: u64) -> Self {
        Fetched {
            items,
            total_count: Some(total_count),
        }
    }
}

impl<T> From<Vec<T>> for Fetched<T> {
    fn from(items: Vec<T>) -> Self {
        Fetched::new(items)
    }
}

/// Request that yields `value` immediately.
pub fn ok<V: Send + 'static>(value: V) -> Request<V> {
    stream::once(future::ready(Ok(value))).boxed()
}

/// Request that fails immediately.
pub fn err<V, E>(error: E) -> Request<V>
where
    V: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let error: RequestError = Arc::new(error);
    stream::once(future::ready(Err(error))).boxed()
}

/// Request that completes without yielding anything.
pub fn empty<V: Send + 'static>() -> Request<V> {
    stream::empty().boxed()
}

/// Request that never yields.
pub fn pending<V: Send + 'static>() -> Request<V> {
    stream::pending().boxed()
}

pub fn from_future<V, E, F>(future: F) -> Request<V>
where
    V: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    F: Future<Output = Result<V, E>> + Send + 'static,
{
    stream::once(future)
        .map(|result| result.map_err(|error| Arc::new(error) as RequestError))
        .boxed()
}

pub fn from_stream<V, S>(stream: S) -> Request<V>
where
    V: Send + 'static,
    S: Stream<Item = Result<V, RequestError>> + Send + 'static,
{
    stream.boxed()
}

/// Adapts a request yielding a plain list into one yielding [`Fetched`].
pub fn items<V: Send + 'static>(request: Request<Vec<V>>) -> Request<Fetched<V>> {
    request.map(|result| result.map(Fetched::new)).boxed()
}

/// Producer for batch operations: one request for the whole batch, or
/// independent per-item requests joined concurrently.
pub enum BatchRequest<V> {
    Single(Request<Fetched<V>>),
    Joined(Vec<Request<V>>),
}

impl<V> From<Request<Fetched<V>>> for BatchRequest<V> {
    fn from(request: Request<Fetched<V>>) -> Self {
        BatchRequest::Single(request)
    }
}

impl<V> From<Vec<Request<V>>> for BatchRequest<V> {
    fn from(requests: Vec<Request<V>>) -> Self {
        BatchRequest::Joined(requests)
    }
}

impl<V: Send + 'static> BatchRequest<V> {
    /// Batch from a request yielding a plain list.
    pub fn items(request: Request<Vec<V>>) -> Self {
        BatchRequest::Single(items(request))
    }

    /// Resolves the batch. Joined members that fail or yield nothing are
    /// dropped; the join itself never fails.
    pub(crate) async fn resolve(self) -> Result<Option<Fetched<V>>, RequestError> {
        match self {
            BatchRequest::Single(request) => first_value(request).await,
            BatchRequest::Joined(requests) => {
                let total = requests.len();
                let results = future::join_all(requests.into_iter().map(first_value)).await;
                let items: Vec<V> = results
                    .into_iter()
                    .filter_map(|result| match result {
                        Ok(value) => value,
                        Err(error) => {
                            debug!(%error, "dropping failed batch member");
                            None
                        }
                    })
                    .collect();
                if items.len() < total {
                    debug!(kept = items.len(), total, "batch resolved partially");
                }
                Ok(Some(Fetched::new(items)))
            }
        }
    }
}

/// First value of `request`, or `None` when it ends without one.
pub(crate) async fn first_value<V>(mut request: Request<V>) -> Result<Option<V>, RequestError> {
    request.next().await.transpose()
}
