//! Resolver configuration types.

use crate::cache::CachePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache lifetimes, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    /// Lifetime of a resolved topology
    pub topology_secs: u64,
    /// Lifetime of a failed topology resolution
    pub failed_topology_secs: u64,
    /// Lifetime of discovered home services, and of a domain binding
    pub domain_secs: u64,
    /// Lifetime of a failed discovery
    pub failed_domain_secs: u64,
    /// Lifetime of a resolved host name
    pub host_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheTtls {
    /// Default lifetimes: one hour for topologies, one day for discoveries
    /// and hosts, five minutes for failures
    #[must_use]
    pub const fn new() -> Self {
        Self {
            topology_secs: 3600,
            failed_topology_secs: 300,
            domain_secs: 86_400,
            failed_domain_secs: 300,
            host_secs: 86_400,
        }
    }

    /// Set the topology lifetime
    #[must_use]
    pub const fn topology(mut self, ttl: Duration) -> Self {
        self.topology_secs = ttl.as_secs();
        self
    }

    /// Set the failed topology lifetime
    #[must_use]
    pub const fn failed_topology(mut self, ttl: Duration) -> Self {
        self.failed_topology_secs = ttl.as_secs();
        self
    }

    /// Set the discovery lifetime
    #[must_use]
    pub const fn domain(mut self, ttl: Duration) -> Self {
        self.domain_secs = ttl.as_secs();
        self
    }

    /// Set the failed discovery lifetime
    #[must_use]
    pub const fn failed_domain(mut self, ttl: Duration) -> Self {
        self.failed_domain_secs = ttl.as_secs();
        self
    }

    /// Set the host lifetime
    #[must_use]
    pub const fn host(mut self, ttl: Duration) -> Self {
        self.host_secs = ttl.as_secs();
        self
    }

    /// Policy for cached topologies
    #[must_use]
    pub const fn topology_policy(&self) -> CachePolicy {
        CachePolicy::new(
            Duration::from_secs(self.topology_secs),
            Duration::from_secs(self.failed_topology_secs),
        )
    }

    /// Policy for cached discoveries
    #[must_use]
    pub const fn domain_policy(&self) -> CachePolicy {
        CachePolicy::new(
            Duration::from_secs(self.domain_secs),
            Duration::from_secs(self.failed_domain_secs),
        )
    }

    /// Policy for cached host names; failures are never cached
    #[must_use]
    pub const fn host_policy(&self) -> CachePolicy {
        CachePolicy::new(Duration::from_secs(self.host_secs), Duration::ZERO)
    }

    /// How long a topology's serving endpoint stays bound to it
    #[must_use]
    pub const fn binding(&self) -> Duration {
        Duration::from_secs(self.domain_secs)
    }

    /// The longest lifetime; entries older than this are evicted
    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        let secs = [
            self.topology_secs,
            self.failed_topology_secs,
            self.domain_secs,
            self.failed_domain_secs,
            self.host_secs,
        ]
        .into_iter()
        .max()
        .unwrap_or_default();
        Duration::from_secs(secs)
    }
}

/// Where and how the resolver looks things up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Global lookup services, in the order they are tried
    pub global_endpoints: Vec<String>,
    /// Home lookup services, used for registration and as discovery backup
    pub home_endpoints: Vec<String>,
    /// Topology services; when set, domain discovery is skipped
    pub topology_endpoints: Vec<String>,
    /// Query every global service instead of stopping at the first answer
    pub try_all_global: bool,
    /// Discover home services through the global services
    pub use_global_discovery: bool,
    /// Bypass every cache
    pub disable_caching: bool,
    /// Cache failed topology resolutions
    pub cache_failures: bool,
    /// Re-register without the key when a service forgot it
    pub retry_on_key_not_found: bool,
    /// Cache lifetimes
    pub ttl: CacheTtls,
    /// Upper bound on any single public operation
    pub deadline_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverConfig {
    /// Create a configuration with no endpoints
    #[must_use]
    pub const fn new() -> Self {
        Self {
            global_endpoints: Vec::new(),
            home_endpoints: Vec::new(),
            topology_endpoints: Vec::new(),
            try_all_global: false,
            use_global_discovery: true,
            disable_caching: false,
            cache_failures: true,
            retry_on_key_not_found: false,
            ttl: CacheTtls::new(),
            deadline_secs: None,
        }
    }

    /// Set the global lookup services
    #[must_use]
    pub fn global_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the home lookup services
    #[must_use]
    pub fn home_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.home_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the topology services
    #[must_use]
    pub fn topology_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topology_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Query every global service during discovery
    #[must_use]
    pub const fn try_all_global(mut self, enabled: bool) -> Self {
        self.try_all_global = enabled;
        self
    }

    /// Enable or disable discovery through global services
    #[must_use]
    pub const fn use_global_discovery(mut self, enabled: bool) -> Self {
        self.use_global_discovery = enabled;
        self
    }

    /// Bypass every cache
    #[must_use]
    pub const fn disable_caching(mut self, disabled: bool) -> Self {
        self.disable_caching = disabled;
        self
    }

    /// Cache failed topology resolutions
    #[must_use]
    pub const fn cache_failures(mut self, enabled: bool) -> Self {
        self.cache_failures = enabled;
        self
    }

    /// Retry registration without the key on `key_not_found`
    #[must_use]
    pub const fn retry_on_key_not_found(mut self, enabled: bool) -> Self {
        self.retry_on_key_not_found = enabled;
        self
    }

    /// Set cache lifetimes
    #[must_use]
    pub const fn ttl(mut self, ttl: CacheTtls) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bound every public operation by `deadline`
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline_secs = Some(deadline.as_secs());
        self
    }

    /// The operation deadline, if any
    #[must_use]
    pub const fn deadline_duration(&self) -> Option<Duration> {
        match self.deadline_secs {
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResolverConfig::default();
        assert!(config.use_global_discovery);
        assert!(config.cache_failures);
        assert!(!config.retry_on_key_not_found);
        assert_eq!(config.ttl.topology_policy().positive, Duration::from_secs(3600));
        assert_eq!(config.ttl.domain_policy().negative, Duration::from_secs(300));
        assert_eq!(config.ttl.max_lifetime(), Duration::from_secs(86_400));
        assert_eq!(config.deadline_duration(), None);
    }

    #[test]
    fn builder_setters() {
        let config = ResolverConfig::new()
            .global_endpoints(["http://gls1", "http://gls2"])
            .home_endpoints(vec![String::from("http://hls")])
            .try_all_global(true)
            .ttl(CacheTtls::new().topology(Duration::from_secs(90_000)))
            .deadline(Duration::from_secs(20));

        assert_eq!(config.global_endpoints.len(), 2);
        assert_eq!(config.home_endpoints, ["http://hls"]);
        assert!(config.try_all_global);
        assert_eq!(config.ttl.max_lifetime(), Duration::from_secs(90_000));
        assert_eq!(config.deadline_duration(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{"home_endpoints": ["http://hls"], "ttl": {"host_secs": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.home_endpoints, ["http://hls"]);
        assert!(config.use_global_discovery);
        assert_eq!(config.ttl.host_secs, 60);
        assert_eq!(config.ttl.topology_secs, 3600);
    }
}
