//! Handler trait for application callbacks and a closure adapter.

use std::future::Future;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::types::Update;

/// Application callback invoked for an update selected by dispatch. Runs in its own task, so it
/// receives an owned copy of the update.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, update: Update) -> Result<(), HandlerError>;
}

/// Wraps an async closure as an [`UpdateHandler`].
pub struct FnHandler<F> {
    f: F,
}

/// Builds a handler from `Fn(Update) -> impl Future<Output = Result<(), HandlerError>>`.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Update) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> UpdateHandler for FnHandler<F>
where
    F: Fn(Update) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, update: Update) -> Result<(), HandlerError> {
        (self.f)(update).await
    }
}
