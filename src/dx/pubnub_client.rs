//! PubNub client module
//!
//! This module contains the [`PubNubClient`] struct.
//! It's used to send requests to [`PubNub API`].
//! It's intended to be used by the [`pubnub_longpoll`] crate.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs
//! [`pubnub_longpoll`]: ../index.html

use derive_builder::Builder;
use log::{debug, info};
use spin::{Mutex, RwLock};
use std::{
    cmp::max,
    collections::HashMap,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use uuid::Uuid;

#[cfg(feature = "crypto")]
use crate::providers::crypto_aescbc::AesCbcCryptor;
#[cfg(feature = "tokio")]
use crate::providers::futures_tokio::RuntimeTokio;
#[cfg(feature = "reqwest")]
use crate::transport::TransportReqwest;

use crate::{
    core::{
        retry_policy::RetryCounter, Cryptor, PubNubError, RetryConfiguration,
        Runtime, RuntimeSupport, Transport,
    },
    dx::{
        subscribe::{registry::Subscriptions, SubscribeConnection, SubscribeCursor},
        worker_pool::{NonSubscribeJob, WorkerPool},
    },
    transport::middleware::{PubNubMiddleware, SignatureKeySet},
};

/// SDK identifier sent with every request in `pnsdk` query parameter.
pub const SDK_ID: &str = "PubNub-Rust-LongPoll";

/// Crate version sent with every request in `pnsdk` query parameter.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// PubNub client
///
/// Client for PubNub API with support for all [`selected`] transport layers.
/// This is a generic client that can be used with any transport layer that
/// implements the [`Transport`] trait.
///
/// Results of every operation are delivered as JSON envelopes into the
/// [`ResponseSink`]s which the caller passes with the call. See
/// [`Envelope`] for the shapes.
///
/// # Examples
/// ```no_run
/// use pubnub_longpoll::{Keyset, PubNubClientBuilder};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pubnub = PubNubClientBuilder::with_reqwest_transport()
///     .with_keyset(Keyset {
///         publish_key: Some("pub-c-abc123"),
///         subscribe_key: "sub-c-abc123",
///         secret_key: None,
///     })
///     .with_user_id("my-user-id")
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// [`selected`]: ../index.html#features
/// [`Transport`]: ../core/trait.Transport.html
/// [`Envelope`]: ../core/enum.Envelope.html
/// [`ResponseSink`]: ../core/struct.ResponseSink.html
pub type PubNubGenericClient<T> = PubNubClientInstance<PubNubMiddleware<T>>;

/// PubNub client with [`reqwest`] transport.
///
/// It requires the [`reqwest` feature] to be enabled.
///
/// [`reqwest`]: https://docs.rs/reqwest
/// [`reqwest` feature]: ../index.html#features
#[cfg(feature = "reqwest")]
pub type PubNubClient = PubNubGenericClient<TransportReqwest>;

/// PubNub client raw instance.
///
/// This struct contains the actual client state.
/// It shouldn't be used directly. Use [`PubNubGenericClient`] or
/// [`PubNubClient`] instead.
#[derive(Debug)]
pub struct PubNubClientInstance<T> {
    pub(crate) inner: Arc<PubNubClientRef<T>>,
}

impl<T> Deref for PubNubClientInstance<T> {
    type Target = PubNubClientRef<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Clone for PubNubClientInstance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Client reference
///
/// This struct contains the actual client state.
/// It's wrapped in `Arc` by [`PubNubClient`] and uses interior mutability for
/// its internal state.
///
/// Not intended to be used directly. Use [`PubNubClient`] instead.
#[derive(Builder, Debug)]
#[builder(
    pattern = "owned",
    name = "PubNubClientConfigBuilder",
    build_fn(private, name = "build_internal"),
    setter(prefix = "with")
)]
pub struct PubNubClientRef<T> {
    /// Transport layer
    #[builder(setter(custom))]
    pub(crate) transport: Arc<T>,

    /// Configuration
    #[builder(setter(custom))]
    pub(crate) config: PubNubConfig,

    /// Data cryptor / decryptor
    #[builder(
        setter(custom, strip_option),
        field(vis = "pub(crate)"),
        default = "None"
    )]
    pub(crate) cryptor: Option<Arc<dyn Cryptor + Send + Sync>>,

    /// Runtime environment
    #[builder(setter(custom), field(vis = "pub(crate)"))]
    pub(crate) runtime: RuntimeSupport,

    /// Instance ID
    #[builder(setter(skip))]
    pub(crate) instance_id: Arc<String>,

    /// Sequence number for the publish requests
    #[builder(setter(skip), default = "Mutex::new(1)")]
    pub(crate) next_seqn: Mutex<u16>,

    /// Subscribed channels and channel groups.
    #[builder(setter(skip))]
    pub(crate) subscriptions: Subscriptions,

    /// Subscription continuation token.
    #[builder(setter(skip))]
    pub(crate) cursor: RwLock<SubscribeCursor>,

    /// Consecutive connectivity failures.
    #[builder(setter(skip))]
    pub(crate) retry: RetryCounter,

    /// A state that should be associated with the `user_id`.
    ///
    /// Map of channel names to state objects, sent with subscribe and
    /// heartbeat requests.
    #[builder(setter(skip))]
    pub(crate) state: RwLock<HashMap<String, serde_json::Map<String, serde_json::Value>>>,

    /// In-flight subscribe request cancellation.
    #[builder(setter(skip))]
    pub(crate) connection: SubscribeConnection,

    /// Running background loops.
    #[builder(setter(skip))]
    pub(crate) loops: LoopFlags,

    /// Subscribe loop exit notifications.
    #[builder(setter(skip))]
    pub(crate) loop_exit: LoopExitSignal,

    /// Non-subscribe worker pool.
    #[builder(setter(skip))]
    pub(crate) workers: WorkerPool,

    /// Whether client has been aborted.
    #[builder(setter(skip))]
    pub(crate) terminated: AtomicBool,
}

/// Flags of background tasks which should run at most once per client.
#[derive(Debug, Default)]
pub(crate) struct LoopFlags {
    pub subscribe: AtomicBool,
    pub retry: AtomicBool,
    pub heartbeat: AtomicBool,
}

impl LoopFlags {
    /// Try to mark loop as running.
    ///
    /// Returns `true` if caller is the one who should spawn it.
    pub fn acquire(flag: &AtomicBool) -> bool {
        !flag.swap(true, Ordering::AcqRel)
    }

    /// Mark loop as stopped.
    pub fn release(flag: &AtomicBool) {
        flag.store(false, Ordering::Release)
    }
}

/// Subscribe loop exit notification channel.
#[derive(Debug)]
pub(crate) struct LoopExitSignal {
    sender: async_channel::Sender<()>,
    receiver: async_channel::Receiver<()>,
}

impl Default for LoopExitSignal {
    fn default() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }
}

impl LoopExitSignal {
    pub fn notify(&self) {
        self.sender.try_send(()).ok();
    }
}

impl<T> PubNubClientInstance<T> {
    /// User id which is used by this client.
    pub fn user_id(&self) -> &str {
        self.config.user_id.as_str()
    }

    /// Subscribe loop exit notifications.
    ///
    /// Receiver gets one `()` every time the subscribe loop task stops, which
    /// happens when there are no subscriptions left (after unsubscribe,
    /// [`abort`] or retries exhaustion).
    ///
    /// [`abort`]: PubNubClientInstance::abort
    pub fn subscribe_loop_exits(&self) -> async_channel::Receiver<()> {
        self.loop_exit.receiver.clone()
    }

    /// Whether [`abort`] has been called.
    ///
    /// [`abort`]: PubNubClientInstance::abort
    pub fn is_aborted(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Stop client.
    ///
    /// Marks every subscription for removal, cancels in-flight long-poll,
    /// stops presence heartbeats and shuts the worker pool down. Client
    /// can't be used after this call.
    pub fn abort(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Aborting client {}", self.instance_id);

        self.subscriptions.abort();
        self.connection.close();
        self.workers.shutdown();
    }

    /// Next publish sequence number.
    pub(crate) fn next_seqn(&self) -> u16 {
        let mut locked_value = self.next_seqn.lock();
        let value = *locked_value;
        *locked_value = if value == u16::MAX { 1 } else { value + 1 };
        value
    }

    /// Configured cryptor.
    pub(crate) fn cryptor(&self) -> Option<&(dyn Cryptor + Send + Sync)> {
        self.cryptor.as_deref()
    }
}

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Queue non-subscribe request.
    ///
    /// Worker pool is started with the first job.
    pub(crate) fn enqueue(&self, job: NonSubscribeJob) {
        if self.is_aborted() {
            job.fail(&PubNubError::ClientAborted);
            return;
        }

        self.workers
            .start(&self.runtime, self.transport.clone(), self.config.max_workers)
            .enqueue(job);
    }
}

impl<T> PubNubClientConfigBuilder<T> {
    /// Set client authentication key.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_auth_key<S>(mut self, auth_key: S) -> Self
    where
        S: Into<String>,
    {
        if let Some(configuration) = self.config.as_mut() {
            configuration.auth_key = Some(Arc::new(auth_key.into()));
        }

        self
    }

    /// `user_id` presence heartbeat.
    ///
    /// Used to set the presence timeout period (seconds). Values below 20 are
    /// raised to 20. Heartbeat announcement interval is set to
    /// `heartbeat_value / 2 - 1`.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_heartbeat_value(mut self, value: u64) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            let value = max(20, value);
            configuration.presence.heartbeat_value = value;
            configuration.presence.heartbeat_interval = value / 2 - 1;
        }
        self
    }

    /// `user_id` presence announcement interval.
    ///
    /// Intervals (seconds) at which `user_id` presence should be announced.
    /// `0` disables presence heartbeat loop.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_heartbeat_interval(mut self, interval: u64) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.presence.heartbeat_interval = interval;
        }
        self
    }

    /// Whether `user_id` leave should be announced or not.
    ///
    /// When set to `true` and `user_id` will unsubscribe, the client wouldn't
    /// announce `leave`, and as a result, there will be no `leave` presence
    /// event generated.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_suppress_leave_events(mut self, suppress_leave_events: bool) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.presence.suppress_leave_events = suppress_leave_events;
        }
        self
    }

    /// Subscribe retry configuration.
    ///
    /// Regulates delay between failed long-poll attempts and the number of
    /// consecutive failures after which subscriptions are aborted.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_retry_configuration(mut self, retry_configuration: RetryConfiguration) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.retry = retry_configuration;
        }

        self
    }

    /// Maximum number of concurrent non-subscribe requests.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        if let Some(configuration) = self.config.as_mut() {
            configuration.max_workers = max(1, max_workers);
        }

        self
    }

    /// Data encryption / decryption with cipher key.
    ///
    /// Messages are encrypted with AES-CBC cryptor compatible with other
    /// PubNub SDKs. Empty key makes [`build`] fail.
    ///
    /// It requires the [`crypto` feature] to be enabled.
    ///
    /// [`build`]: PubNubClientConfigBuilder::build
    /// [`crypto` feature]: ../index.html#features
    #[cfg(feature = "crypto")]
    pub fn with_cipher_key<S>(mut self, cipher_key: S) -> Self
    where
        S: Into<String>,
    {
        if let Some(configuration) = self.config.as_mut() {
            configuration.cipher_key = Some(cipher_key.into());
        }

        self
    }

    /// Data encryption / decryption
    ///
    /// Cryptor used by client when publish messages and receive them as
    /// real-time updates or from history. Takes precedence over
    /// [`with_cipher_key`].
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use to set the
    /// configuration for the client. This is a part of the
    /// [`PubNubClientConfigBuilder`].
    ///
    /// [`with_cipher_key`]: PubNubClientConfigBuilder::with_cipher_key
    pub fn with_cryptor<C>(mut self, cryptor: C) -> Self
    where
        C: Cryptor + Send + Sync + 'static,
    {
        self.cryptor = Some(Some(Arc::new(cryptor)));

        self
    }

    /// Build a [`PubNubClient`] from the builder
    pub fn build(self) -> Result<PubNubClientInstance<PubNubMiddleware<T>>, PubNubError> {
        self.build_internal()
            .map_err(|err| PubNubError::ClientInitialization {
                details: err.to_string(),
            })
            .and_then(|pre_build| {
                let cryptor = match pre_build.cryptor {
                    Some(cryptor) => Some(cryptor),
                    None => pre_build.config.cryptor_from_cipher_key()?,
                };
                let instance_id = Arc::new(Uuid::new_v4().to_string());

                info!(
                    "Client Configuration: \n publish_key: {:?}\n subscribe_key: {}\n user_id: {}\n instance_id: {}",
                    pre_build.config.publish_key,
                    pre_build.config.subscribe_key,
                    pre_build.config.user_id,
                    instance_id
                );

                Ok(PubNubClientRef {
                    transport: Arc::new(PubNubMiddleware {
                        signature_keys: pre_build.config.signature_key_set()?,
                        auth_key: pre_build.config.auth_key.clone(),
                        instance_id: Some(instance_id.clone()),
                        user_id: pre_build.config.user_id.clone(),
                        transport: pre_build.transport,
                    }),
                    config: pre_build.config,
                    cryptor,
                    runtime: pre_build.runtime,
                    instance_id,
                    next_seqn: pre_build.next_seqn,
                    subscriptions: pre_build.subscriptions,
                    cursor: pre_build.cursor,
                    retry: pre_build.retry,
                    state: pre_build.state,
                    connection: pre_build.connection,
                    loops: pre_build.loops,
                    loop_exit: pre_build.loop_exit,
                    workers: pre_build.workers,
                    terminated: pre_build.terminated,
                })
            })
            .map(|client| PubNubClientInstance {
                inner: Arc::new(client),
            })
    }
}

/// `user_id` presence behaviour configuration.
///
/// The configuration contains parameters to control when the timeout may occur
/// or whether any updates should be sent when leaving.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PresenceConfiguration {
    /// `user_id` presence heartbeat.
    ///
    /// Presence timeout period (seconds) sent with subscribe and heartbeat
    /// requests. `0` lets the service use its default.
    pub heartbeat_value: u64,

    /// `user_id` presence announcement interval.
    ///
    /// Heartbeat loop period (seconds). `0` disables the loop.
    pub heartbeat_interval: u64,

    /// Whether `user_id` leave should be announced or not.
    ///
    /// **Default:** `false`
    pub suppress_leave_events: bool,
}

/// PubNub configuration
///
/// Configuration for [`PubNubClient`].
/// This struct separates the configuration from the actual client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubNubConfig {
    /// Subscribe key
    pub(crate) subscribe_key: String,

    /// Publish key
    pub(crate) publish_key: Option<String>,

    /// Secret key
    pub(crate) secret_key: Option<String>,

    /// User ID
    pub(crate) user_id: Arc<String>,

    /// Authorization key
    pub(crate) auth_key: Option<Arc<String>>,

    /// Cipher key for the default cryptor.
    pub(crate) cipher_key: Option<String>,

    /// Presence configuration.
    pub presence: PresenceConfiguration,

    /// Subscribe retry configuration.
    pub retry: RetryConfiguration,

    /// Maximum number of concurrent non-subscribe requests.
    pub max_workers: usize,
}

impl PubNubConfig {
    fn signature_key_set(&self) -> Result<Option<SignatureKeySet>, PubNubError> {
        let Some(secret_key) = self.secret_key.clone() else {
            return Ok(None);
        };

        let publish_key = self
            .publish_key
            .clone()
            .ok_or(PubNubError::ClientInitialization {
                details: "You must also provide the publish key if you use the secret key."
                    .to_string(),
            })?;

        Ok(Some(SignatureKeySet {
            secret_key,
            publish_key,
            subscribe_key: self.subscribe_key.clone(),
        }))
    }

    #[cfg(feature = "crypto")]
    fn cryptor_from_cipher_key(
        &self,
    ) -> Result<Option<Arc<dyn Cryptor + Send + Sync>>, PubNubError> {
        self.cipher_key
            .as_ref()
            .map(|key| {
                AesCbcCryptor::new(key.as_str(), false)
                    .map(|cryptor| Arc::new(cryptor) as Arc<dyn Cryptor + Send + Sync>)
            })
            .transpose()
            .map_err(|err| PubNubError::ClientInitialization {
                details: err.to_string(),
            })
    }

    #[cfg(not(feature = "crypto"))]
    fn cryptor_from_cipher_key(
        &self,
    ) -> Result<Option<Arc<dyn Cryptor + Send + Sync>>, PubNubError> {
        Ok(None)
    }

    /// Presence heartbeat value if it has been configured.
    pub(crate) fn heartbeat_value(&self) -> Option<u64> {
        (self.presence.heartbeat_value > 0).then_some(self.presence.heartbeat_value)
    }
}

/// PubNub builder for [`PubNubClient`]
///
/// Builder for [`PubNubClient`] that is a first step to create a client.
/// The client is transport-layer-agnostic, so you can use any transport layer
/// that implements the [`Transport`] trait.
///
/// The builder provides methods to set the transport layer and returns the next
/// step of the builder with the remaining parameters.
///
/// See [`PubNubClient`] for more information.
#[derive(Debug, Clone)]
pub struct PubNubClientBuilder;

impl PubNubClientBuilder {
    /// Set the transport layer for the client.
    ///
    /// Returns [`PubNubClientRuntimeBuilder`] where runtime environment and
    /// API key set can be set.
    ///
    /// # Examples
    /// ```
    /// # use pubnub_longpoll::core::{Transport, TransportRequest, TransportResponse, PubNubError};
    /// use pubnub_longpoll::{Keyset, PubNubClientBuilder};
    /// #
    /// # struct MyTransport;
    /// # #[async_trait::async_trait]
    /// # impl Transport for MyTransport {
    /// #     async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, PubNubError> {
    /// #         unimplemented!()
    /// #     }
    /// # }
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// // note that MyTransport must implement the `Transport` trait
    /// let pubnub = PubNubClientBuilder::with_transport(MyTransport)
    ///     .with_keyset(Keyset {
    ///         publish_key: Some("pub-c-abc123"),
    ///         subscribe_key: "sub-c-abc123",
    ///         secret_key: None,
    ///     })
    ///     .with_user_id("my-user-id")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_transport<T>(transport: T) -> PubNubClientRuntimeBuilder<T>
    where
        T: Transport,
    {
        PubNubClientRuntimeBuilder { transport }
    }

    /// Use [`reqwest`] transport with default [`TransportConfiguration`].
    ///
    /// It requires the [`reqwest` feature] to be enabled.
    ///
    /// [`reqwest`]: https://docs.rs/reqwest
    /// [`TransportConfiguration`]: crate::core::TransportConfiguration
    /// [`reqwest` feature]: ../index.html#features
    #[cfg(feature = "reqwest")]
    pub fn with_reqwest_transport() -> PubNubClientRuntimeBuilder<TransportReqwest> {
        PubNubClientRuntimeBuilder {
            transport: TransportReqwest::new(),
        }
    }
}

/// PubNub builder for [`PubNubClient`] used to set runtime environment.
///
/// Runtime will be used for detached tasks spawning and delayed task execution.
/// With [`tokio` feature] enabled [`with_keyset`] can be called right away
/// to use tokio runtime.
///
/// [`tokio` feature]: ../index.html#features
/// [`with_keyset`]: PubNubClientRuntimeBuilder::with_keyset
pub struct PubNubClientRuntimeBuilder<T> {
    /// Transport layer.
    pub(crate) transport: T,
}

impl<T> PubNubClientRuntimeBuilder<T> {
    /// Set runtime environment.
    ///
    /// It returns [`PubNubClientKeySetBuilder`] builder that you can use
    /// to set API key set to access [`PubNub API`].
    ///
    /// See [`Runtime`] trait for more information.
    ///
    /// [`PubNub API`]: https://www.pubnub.com/docs
    pub fn with_runtime<R>(self, runtime: R) -> PubNubClientKeySetBuilder<T>
    where
        R: Runtime,
    {
        PubNubClientKeySetBuilder {
            transport: self.transport,
            runtime: RuntimeSupport::new(runtime),
        }
    }

    /// Set the keyset for the client and use tokio runtime.
    ///
    /// It returns [`PubNubClientUserIdBuilder`] builder that you can use
    /// to set User ID for the client.
    ///
    /// See [`Keyset`] for more information.
    #[cfg(feature = "tokio")]
    pub fn with_keyset<S>(self, keyset: Keyset<S>) -> PubNubClientUserIdBuilder<T, S>
    where
        S: Into<String>,
    {
        PubNubClientUserIdBuilder {
            transport: self.transport,
            keyset,
            runtime: RuntimeSupport::new(RuntimeTokio),
        }
    }
}

/// PubNub builder for [`PubNubClient`] to set API keys.
///
/// The builder provides methods to set the [`PubNub API`] keys set and returns
/// the next step of the builder with the remaining parameters.
///
/// [`PubNub API`]: https://www.pubnub.com/docs
#[derive(Debug, Clone)]
pub struct PubNubClientKeySetBuilder<T> {
    /// Transport layer.
    pub(crate) transport: T,

    /// Runtime environment
    pub(crate) runtime: RuntimeSupport,
}

impl<T> PubNubClientKeySetBuilder<T> {
    /// Set the keyset for the client
    ///
    /// It returns [`PubNubClientUserIdBuilder`] builder that you can use
    /// to set the User ID for the client.
    ///
    /// See [`Keyset`] for more information.
    pub fn with_keyset<S>(self, keyset: Keyset<S>) -> PubNubClientUserIdBuilder<T, S>
    where
        S: Into<String>,
    {
        PubNubClientUserIdBuilder {
            transport: self.transport,
            keyset,
            runtime: self.runtime,
        }
    }
}

/// PubNub builder for [`PubNubClient`]
///
/// Builder that is used to set the User ID for the client.
#[derive(Debug, Clone)]
pub struct PubNubClientUserIdBuilder<T, S>
where
    S: Into<String>,
{
    transport: T,
    keyset: Keyset<S>,
    runtime: RuntimeSupport,
}

impl<T, S> PubNubClientUserIdBuilder<T, S>
where
    S: Into<String>,
{
    /// Set user id for the client.
    ///
    /// Empty user id is replaced with random UUID.
    ///
    /// It returns [`PubNubClientConfigBuilder`] that you can use
    /// to set the configuration for the client.
    pub fn with_user_id<U>(self, user_id: U) -> PubNubClientConfigBuilder<T>
    where
        U: Into<String>,
    {
        let publish_key = self.keyset.publish_key.map(|k| k.into());
        let secret_key = self.keyset.secret_key.map(|k| k.into());
        let user_id = user_id.into();
        let user_id = if user_id.is_empty() {
            let generated = Uuid::new_v4().to_string();
            debug!("Empty user id replaced with {generated}");
            generated
        } else {
            user_id
        };

        PubNubClientConfigBuilder {
            transport: Some(Arc::new(self.transport)),
            config: Some(PubNubConfig {
                publish_key,
                subscribe_key: self.keyset.subscribe_key.into(),
                secret_key,
                user_id: Arc::new(user_id),
                auth_key: None,
                cipher_key: None,
                presence: Default::default(),
                retry: Default::default(),
                max_workers: 20,
            }),
            runtime: Some(self.runtime),
            ..Default::default()
        }
    }
}

/// Keyset for the PubNub client
///
/// # Examples
/// ```
/// use pubnub_longpoll::Keyset;
///
/// Keyset {
///    subscribe_key: "sub-c-abc123",
///    publish_key: Some("pub-c-abc123"),
///    secret_key: Some("sec-c-abc123"),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Keyset<S>
where
    S: Into<String>,
{
    /// Subscribe key
    pub subscribe_key: S,

    /// Publish key
    pub publish_key: Option<S>,

    /// Secret key
    pub secret_key: Option<S>,
}
