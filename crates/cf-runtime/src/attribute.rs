use std::future::Future;
use std::sync::Arc;

use cf_core::FlowResult;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::params::Params;

type SyncFn<T> = dyn Fn(&Params) -> FlowResult<Option<T>> + Send + Sync;
type AsyncFn<T> = dyn Fn(Params) -> BoxFuture<'static, FlowResult<Option<T>>> + Send + Sync;

/// A user function producing an attribute value, or `None` for "nothing".
pub enum Callback<T> {
    Sync(Arc<SyncFn<T>>),
    Async(Arc<AsyncFn<T>>),
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(function) => Self::Sync(Arc::clone(function)),
            Self::Async(function) => Self::Async(Arc::clone(function)),
        }
    }
}

impl<T> std::fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Callback::Sync"),
            Self::Async(_) => f.write_str("Callback::Async"),
        }
    }
}

impl<T: 'static> Callback<T> {
    pub fn sync<F>(function: F) -> Self
    where
        F: Fn(&Params) -> FlowResult<Option<T>> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(function))
    }

    pub fn asynchronous<F, Fut>(function: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FlowResult<Option<T>>> + Send + 'static,
    {
        Self::Async(Arc::new(move |params| function(params).boxed()))
    }

    /// Invokes the function; async callbacks get their own copy of the context.
    pub async fn call(&self, params: &Params) -> FlowResult<Option<T>> {
        match self {
            Self::Sync(function) => function(params),
            Self::Async(function) => function(params.clone()).await,
        }
    }
}

/// A block attribute: a literal or a function of the pass context.
pub enum Attribute<T> {
    Value(T),
    Dynamic(Callback<T>),
}

impl<T: Clone> Clone for Attribute<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Dynamic(callback) => Self::Dynamic(callback.clone()),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Dynamic(callback) => f.debug_tuple("Dynamic").field(callback).finish(),
        }
    }
}

impl<T: 'static> Attribute<T> {
    pub fn from_fn<F>(function: F) -> Self
    where
        F: Fn(&Params) -> FlowResult<Option<T>> + Send + Sync + 'static,
    {
        Self::Dynamic(Callback::sync(function))
    }

    pub fn from_async<F, Fut>(function: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FlowResult<Option<T>>> + Send + 'static,
    {
        Self::Dynamic(Callback::asynchronous(function))
    }
}

impl<T> From<T> for Attribute<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Attribute<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Resolves an attribute to its concrete value.
///
/// Absent attributes and functions returning `None` both resolve to `Ok(None)`.
/// Function errors are returned unchanged.
pub async fn resolve_attribute<T: Clone + 'static>(
    attribute: Option<&Attribute<T>>,
    params: &Params,
) -> FlowResult<Option<T>> {
    match attribute {
        None => Ok(None),
        Some(Attribute::Value(value)) => Ok(Some(value.clone())),
        Some(Attribute::Dynamic(callback)) => callback.call(params).await,
    }
}
