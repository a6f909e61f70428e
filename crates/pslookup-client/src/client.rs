//! Main directory client implementation.

use crate::api::*;
use crate::cache::ResolutionCache;
use crate::channel::MessageChannel;
use crate::config::ResolverConfig;
use crate::hints::fetch_global_hints;
use crate::lookup::LookupClient;
use crate::transport::{HttpTransport, Transport};
use parking_lot::RwLock;
use pslookup_core::{Element, LookupError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-hop timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a federation of lookup services
#[derive(Clone)]
pub struct DirectoryClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    channel: MessageChannel,
    config: RwLock<Arc<ResolverConfig>>,
    topologies: ResolutionCache<Element>,
    hosts: ResolutionCache<String>,
    discoveries: ResolutionCache<Vec<String>>,
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("config", &self.config())
            .field("topologies", &self.inner.topologies)
            .field("hosts", &self.inner.hosts)
            .field("discoveries", &self.inner.discoveries)
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Create a client over HTTP with the given configuration
    pub fn new(config: ResolverConfig) -> Result<Self> {
        DirectoryClientBuilder::new().config(config).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> DirectoryClientBuilder {
        DirectoryClientBuilder::new()
    }

    /// Resolve domain topologies
    #[must_use]
    pub fn topology(&self) -> TopologyApi<'_> {
        TopologyApi::new(self)
    }

    /// Resolve host names and nodes
    #[must_use]
    pub fn hosts(&self) -> HostApi<'_> {
        HostApi::new(self)
    }

    /// Find services by their relations
    #[must_use]
    pub fn services(&self) -> ServiceApi<'_> {
        ServiceApi::new(self)
    }

    /// Register, refresh and withdraw subjects
    #[must_use]
    pub fn registration(&self) -> RegistrationApi<'_> {
        RegistrationApi::new(self)
    }

    /// Discover home services through the global services
    #[must_use]
    pub fn discovery(&self) -> DiscoveryApi<'_> {
        DiscoveryApi::new(self)
    }

    /// Talk to one topology service directly
    #[must_use]
    pub fn topology_service(&self, endpoint: impl Into<String>) -> TopologyServiceApi<'_> {
        TopologyServiceApi::new(self, endpoint.into())
    }

    /// A raw client for one lookup service
    #[must_use]
    pub fn lookup(&self, endpoint: impl Into<String>) -> LookupClient {
        LookupClient::new(endpoint, self.inner.channel.clone())
    }

    /// The current configuration snapshot
    #[must_use]
    pub fn config(&self) -> Arc<ResolverConfig> {
        Arc::clone(&self.inner.config.read())
    }

    /// Replace the configuration; operations already running keep the
    /// snapshot they started with
    pub fn set_config(&self, config: ResolverConfig) {
        let mut guard = self.inner.config.write();
        self.inner.apply_cache_settings(&config);
        *guard = Arc::new(config);
    }

    /// Modify a copy of the configuration and install it
    pub fn update_config(&self, update: impl FnOnce(&mut ResolverConfig)) {
        let mut guard = self.inner.config.write();
        let mut config = ResolverConfig::clone(&guard);
        update(&mut config);
        self.inner.apply_cache_settings(&config);
        *guard = Arc::new(config);
    }

    /// Fetch the global hints at `url` and install them as the global
    /// services.
    ///
    /// The fetch is bounded by the hop timeout and the operation deadline.
    pub async fn bootstrap_global_hints(&self, url: &str, shuffle: bool) -> Result<Vec<String>> {
        let config = self.config();
        let fetch = fetch_global_hints(self.inner.channel.transport().as_ref(), url, shuffle);
        let hints = within_deadline(
            config.deadline_duration(),
            within_deadline(self.inner.channel.hop_timeout(), fetch),
        )
        .await?;
        if hints.is_empty() {
            return Err(LookupError::Config(format!("no global services listed at {url}")));
        }
        let installed = hints.clone();
        self.update_config(|config| config.global_endpoints = installed);
        Ok(hints)
    }

    pub(crate) fn channel(&self) -> &MessageChannel {
        &self.inner.channel
    }

    /// Resolved topologies, keyed by domain id and namespace
    #[must_use]
    pub fn topology_cache(&self) -> &ResolutionCache<Element> {
        &self.inner.topologies
    }

    /// Host name to identifier mappings
    #[must_use]
    pub fn host_cache(&self) -> &ResolutionCache<String> {
        &self.inner.hosts
    }

    /// Home services found through the global services
    #[must_use]
    pub fn discovery_cache(&self) -> &ResolutionCache<Vec<String>> {
        &self.inner.discoveries
    }
}

impl ClientInner {
    fn apply_cache_settings(&self, config: &ResolverConfig) {
        let max_lifetime = config.ttl.max_lifetime();
        self.topologies.set_disabled(config.disable_caching);
        self.topologies.set_max_lifetime(max_lifetime);
        self.hosts.set_disabled(config.disable_caching);
        self.hosts.set_max_lifetime(max_lifetime);
        self.discoveries.set_disabled(config.disable_caching);
        self.discoveries.set_max_lifetime(max_lifetime);
    }
}

/// Run `operation`, failing with [`LookupError::Timeout`] past `deadline`
pub(crate) async fn within_deadline<T, F>(deadline: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation).await.map_err(|_| {
            debug!(deadline = ?limit, "operation deadline exceeded");
            LookupError::Timeout(limit)
        })?,
        None => operation.await,
    }
}

/// Builder for configuring a [`DirectoryClient`]
pub struct DirectoryClientBuilder {
    timeout: Duration,
    user_agent: String,
    config: ResolverConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for DirectoryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryClientBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("pslookup-rust/{}", env!("CARGO_PKG_VERSION")),
            config: ResolverConfig::default(),
            transport: None,
        }
    }

    /// Set the per-hop timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the resolver configuration
    #[must_use]
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Post over a custom transport instead of HTTP
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<DirectoryClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.timeout, &self.user_agent)?),
        };
        let channel = MessageChannel::new(transport).with_hop_timeout(self.timeout);

        let max_lifetime = self.config.ttl.max_lifetime();
        let inner = ClientInner {
            channel,
            config: RwLock::new(Arc::new(ResolverConfig::default())),
            topologies: ResolutionCache::new(max_lifetime),
            hosts: ResolutionCache::new(max_lifetime),
            discoveries: ResolutionCache::new(max_lifetime),
        };
        let client = DirectoryClient {
            inner: Arc::new(inner),
        };
        client.set_config(self.config);
        Ok(client)
    }
}
