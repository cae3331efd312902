//! # Futures implementation using Tokio runtime
//!
//! This module contains [`RuntimeTokio`] type.
//!
//! It requires the [`tokio` feature] to be enabled.
//!
//! [`tokio` feature]: ../index.html#features

use crate::core::Runtime;
use std::time::Duration;

/// Tokio-based `async` tasks spawner.
#[derive(Copy, Clone, Debug, Default)]
pub struct RuntimeTokio;

#[async_trait::async_trait]
impl Runtime for RuntimeTokio {
    fn spawn<R>(&self, future: impl futures::Future<Output = R> + Send + 'static)
    where
        R: Send + 'static,
    {
        tokio::spawn(future);
    }

    async fn sleep(self, delay: Duration) {
        tokio::time::sleep(delay).await
    }
}
