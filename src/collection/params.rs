use serde_json::Value;

use crate::error::CollectionError;
use crate::ledger::TotalCountDirective;
use crate::request::{BatchRequest, Fetched, Request};

type SuccessCallback<V> = Box<dyn FnOnce(&V) + Send>;
type ErrorCallback = Box<dyn FnOnce(&CollectionError) + Send>;

/// Optional per-call callbacks, each invoked at most once.
pub(crate) struct Callbacks<V> {
    pub(crate) on_success: Option<SuccessCallback<V>>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl<V> Default for Callbacks<V> {
    fn default() -> Self {
        Callbacks {
            on_success: None,
            on_error: None,
        }
    }
}

macro_rules! callback_builders {
    ($params:ident<$($generic:ident),*> => $value:ty) => {
        impl<$($generic),*> $params<$($generic),*> {
            pub fn on_success<F>(mut self, callback: F) -> Self
            where
                F: FnOnce(&$value) + Send + 'static,
            {
                self.callbacks.on_success = Some(Box::new(callback));
                self
            }

            pub fn on_error<F>(mut self, callback: F) -> Self
            where
                F: FnOnce(&CollectionError) + Send + 'static,
            {
                self.callbacks.on_error = Some(Box::new(callback));
                self
            }
        }
    };
}

pub struct CreateParams<T> {
    pub(crate) request: Request<T>,
    pub(crate) callbacks: Callbacks<T>,
}

impl<T> CreateParams<T> {
    pub fn new(request: Request<T>) -> Self {
        CreateParams {
            request,
            callbacks: Callbacks::default(),
        }
    }
}

callback_builders!(CreateParams<T> => T);

pub struct CreateManyParams<T> {
    pub(crate) request: BatchRequest<T>,
    pub(crate) callbacks: Callbacks<Vec<T>>,
}

impl<T> CreateManyParams<T> {
    pub fn new(request: impl Into<BatchRequest<T>>) -> Self {
        CreateManyParams {
            request: request.into(),
            callbacks: Callbacks::default(),
        }
    }
}

callback_builders!(CreateManyParams<T> => Vec<T>);

pub struct ReadParams<T> {
    pub(crate) request: Request<Fetched<T>>,
    pub(crate) keep_existing_on_error: bool,
    pub(crate) callbacks: Callbacks<Fetched<T>>,
}

impl<T> ReadParams<T> {
    pub fn new(request: Request<Fetched<T>>) -> Self {
        ReadParams {
            request,
            keep_existing_on_error: false,
            callbacks: Callbacks::default(),
        }
    }

    /// Leave items and total count untouched when the read fails or is
    /// rejected; by default both are cleared.
    pub fn keep_existing_on_error(mut self, keep: bool) -> Self {
        self.keep_existing_on_error = keep;
        self
    }
}

callback_builders!(ReadParams<T> => Fetched<T>);

pub struct ReadOneParams<T> {
    pub(crate) request: Request<T>,
    pub(crate) item: Option<T>,
    pub(crate) callbacks: Callbacks<T>,
}

impl<T> ReadOneParams<T> {
    pub fn new(request: Request<T>) -> Self {
        ReadOneParams {
            request,
            item: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Marks `item` as refreshing while the read runs.
    pub fn item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }
}

callback_builders!(ReadOneParams<T> => T);

pub struct ReadManyParams<T> {
    pub(crate) request: BatchRequest<T>,
    pub(crate) items: Vec<T>,
    pub(crate) callbacks: Callbacks<Vec<T>>,
}

impl<T> ReadManyParams<T> {
    pub fn new(request: impl Into<BatchRequest<T>>) -> Self {
        ReadManyParams {
            request: request.into(),
            items: Vec::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// Marks `items` as refreshing while the read runs.
    pub fn items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }
}

callback_builders!(ReadManyParams<T> => Vec<T>);

pub struct UpdateParams<T> {
    pub(crate) request: Request<T>,
    pub(crate) item: T,
    pub(crate) refresh_request: Option<Request<T>>,
    pub(crate) refresh_item: Option<T>,
    pub(crate) callbacks: Callbacks<T>,
}

impl<T> UpdateParams<T> {
    pub fn new(request: Request<T>, item: T) -> Self {
        UpdateParams {
            request,
            item,
            refresh_request: None,
            refresh_item: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Refetch the item with `request` once the update succeeds instead of
    /// trusting the update response.
    pub fn refresh(mut self, request: Request<T>) -> Self {
        self.refresh_request = Some(request);
        self
    }

    /// Descriptor for the refresh, when it differs from the updated item.
    pub fn refresh_item(mut self, item: T) -> Self {
        self.refresh_item = Some(item);
        self
    }
}

callback_builders!(UpdateParams<T> => T);

pub struct UpdateManyParams<T> {
    pub(crate) request: BatchRequest<T>,
    pub(crate) items: Vec<T>,
    pub(crate) refresh_request: Option<BatchRequest<T>>,
    pub(crate) refresh_items: Option<Vec<T>>,
    pub(crate) callbacks: Callbacks<Vec<T>>,
}

impl<T> UpdateManyParams<T> {
    pub fn new(request: impl Into<BatchRequest<T>>, items: Vec<T>) -> Self {
        UpdateManyParams {
            request: request.into(),
            items,
            refresh_request: None,
            refresh_items: None,
            callbacks: Callbacks::default(),
        }
    }

    pub fn refresh(mut self, request: impl Into<BatchRequest<T>>) -> Self {
        self.refresh_request = Some(request.into());
        self
    }

    pub fn refresh_items(mut self, items: Vec<T>) -> Self {
        self.refresh_items = Some(items);
        self
    }
}

callback_builders!(UpdateManyParams<T> => Vec<T>);

pub struct DeleteParams<T, R = Value> {
    pub(crate) request: Option<Request<R>>,
    pub(crate) item: T,
    pub(crate) decrement_total_count: Option<TotalCountDirective>,
    pub(crate) read_request: Option<Request<Fetched<T>>>,
    pub(crate) callbacks: Callbacks<Option<R>>,
}

impl<T> DeleteParams<T> {
    /// Local delete with no remote call.
    pub fn new(item: T) -> Self {
        DeleteParams::with_request_opt(None, item)
    }
}

impl<T, R> DeleteParams<T, R> {
    pub fn with_request(request: Request<R>, item: T) -> Self {
        DeleteParams::with_request_opt(Some(request), item)
    }

    fn with_request_opt(request: Option<Request<R>>, item: T) -> Self {
        DeleteParams {
            request,
            item,
            decrement_total_count: None,
            read_request: None,
            callbacks: Callbacks::default(),
        }
    }

    pub fn decrement_total_count(mut self, directive: impl Into<TotalCountDirective>) -> Self {
        self.decrement_total_count = Some(directive.into());
        self
    }

    /// Re-read the whole list with `request` instead of removing locally.
    pub fn read_request(mut self, request: Request<Fetched<T>>) -> Self {
        self.read_request = Some(request);
        self
    }
}

callback_builders!(DeleteParams<T, R> => Option<R>);

pub struct DeleteManyParams<T, R = Value> {
    pub(crate) request: Option<BatchRequest<R>>,
    pub(crate) items: Vec<T>,
    pub(crate) decrement_total_count: Option<TotalCountDirective>,
    pub(crate) read_request: Option<Request<Fetched<T>>>,
    pub(crate) callbacks: Callbacks<Vec<R>>,
}

impl<T> DeleteManyParams<T> {
    /// Local delete with no remote call.
    pub fn new(items: Vec<T>) -> Self {
        DeleteManyParams::with_request_opt(None, items)
    }
}

impl<T, R> DeleteManyParams<T, R> {
    pub fn with_request(request: impl Into<BatchRequest<R>>, items: Vec<T>) -> Self {
        DeleteManyParams::with_request_opt(Some(request.into()), items)
    }

    fn with_request_opt(request: Option<BatchRequest<R>>, items: Vec<T>) -> Self {
        DeleteManyParams {
            request,
            items,
            decrement_total_count: None,
            read_request: None,
            callbacks: Callbacks::default(),
        }
    }

    pub fn decrement_total_count(mut self, directive: impl Into<TotalCountDirective>) -> Self {
        self.decrement_total_count = Some(directive.into());
        self
    }

    pub fn read_request(mut self, request: Request<Fetched<T>>) -> Self {
        self.read_request = Some(request);
        self
    }
}

callback_builders!(DeleteManyParams<T, R> => Vec<R>);

pub struct RefreshParams<T> {
    pub(crate) request: Request<T>,
    pub(crate) item: T,
    pub(crate) callbacks: Callbacks<T>,
}

impl<T> RefreshParams<T> {
    pub fn new(request: Request<T>, item: T) -> Self {
        RefreshParams {
            request,
            item,
            callbacks: Callbacks::default(),
        }
    }
}

callback_builders!(RefreshParams<T> => T);

pub struct RefreshManyParams<T> {
    pub(crate) request: BatchRequest<T>,
    pub(crate) items: Vec<T>,
    pub(crate) callbacks: Callbacks<Vec<T>>,
}

impl<T> RefreshManyParams<T> {
    pub fn new(request: impl Into<BatchRequest<T>>, items: Vec<T>) -> Self {
        RefreshManyParams {
            request: request.into(),
            items,
            callbacks: Callbacks::default(),
        }
    }
}

callback_builders!(RefreshManyParams<T> => Vec<T>);
