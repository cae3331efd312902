//! # Runtime module
//!
//! This module contains the task spawning and delay trait used by the
//! subscribe, retry and heartbeat loops and by the non-subscribe worker pool.

use std::{fmt::Debug, future::Future, pin::Pin, sync::Arc, time::Duration};

/// PubNub runtime trait.
///
/// This trait is used to spawn async tasks in work of the PubNub client and
/// to pause them between retries and heartbeats.
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::Runtime;
/// use std::{future::Future, time::Duration};
///
/// #[derive(Clone)]
/// struct MyRuntime;
///
/// #[async_trait::async_trait]
/// impl Runtime for MyRuntime {
///     fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
///     where
///         R: Send + 'static,
///     {
///         // spawn the Future
///         // e.g. tokio::spawn(future);
///     }
///
///     async fn sleep(self, _delay: Duration) {
///         // e.g. tokio::time::sleep(delay).await
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Spawn a task.
    ///
    /// This method is used to spawn a task.
    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
    where
        R: Send + 'static;

    /// Put current task to "sleep".
    ///
    /// Sleep current task for specified amount of time.
    async fn sleep(self, delay: Duration);
}

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send>>;
type Spawner = Arc<dyn Fn(BoxedTask) + Send + Sync>;
type Sleeper = Arc<dyn Fn(Duration) -> BoxedTask + Send + Sync>;

/// Type-erased [`Runtime`].
///
/// Lets the client hold any runtime without carrying one more generic
/// parameter through every type.
#[derive(Clone)]
pub(crate) struct RuntimeSupport {
    spawner: Spawner,
    sleeper: Sleeper,
}

impl RuntimeSupport {
    pub fn new<R>(runtime: R) -> Self
    where
        R: Runtime,
    {
        let spawn_runtime = runtime.clone();
        let spawner: Spawner = Arc::new(move |task: BoxedTask| spawn_runtime.spawn(task));
        let sleeper: Sleeper = Arc::new(move |delay: Duration| -> BoxedTask {
            let runtime = runtime.clone();
            Box::pin(async move { runtime.sleep(delay).await })
        });

        Self { spawner, sleeper }
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        (self.spawner)(Box::pin(future))
    }

    pub async fn sleep(&self, delay: Duration) {
        (self.sleeper)(delay).await
    }
}

impl Debug for RuntimeSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuntimeSupport {{}}")
    }
}
