//! Discovery of home services through the global services.

use crate::cache::CacheEntry;
use crate::cascade::find_services;
use crate::client::within_deadline;
use crate::config::ResolverConfig;
use crate::query::{discovery_query, global_domain_query, query_body};
use crate::DirectoryClient;
use pslookup_core::{Element, LookupError, Result};
use tracing::debug;

/// Cache tag of topology home discoveries
const TOPOLOGY_TAG: &str = "topology";

/// Cache tag prefix of IDC home discoveries
const IDC_TAG: &str = "idc";

/// Discovery endpoints
pub struct DiscoveryApi<'a> {
    client: &'a DirectoryClient,
}

impl<'a> DiscoveryApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// Send `body` to the configured global services and collect the access
    /// points they return
    pub async fn discover(&self, body: &[Element]) -> Result<Vec<String>> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), async {
            if config.global_endpoints.is_empty() {
                return Err(LookupError::Config(
                    "no global lookup services defined".into(),
                ));
            }
            find_services(
                self.client.channel(),
                &config.global_endpoints,
                config.try_all_global,
                body,
            )
            .await
        })
        .await
    }

    /// Send `body` to `candidates` in order, collecting access points
    pub async fn find_services(
        &self,
        candidates: &[String],
        try_all: bool,
        body: &[Element],
    ) -> Result<Vec<String>> {
        let config = self.client.config();
        within_deadline(
            config.deadline_duration(),
            find_services(self.client.channel(), candidates, try_all, body),
        )
        .await
    }

    /// Home services summarizing topology for the DNS domain `domain_name`.
    ///
    /// Failures yield an empty list.
    pub async fn topology_homes(&self, domain_name: &str) -> Vec<String> {
        self.topology_homes_with(&self.client.config(), domain_name)
            .await
    }

    /// Home services of IDCs summarizing `value` at `address_path`.
    ///
    /// Failures yield an empty list.
    pub async fn idc_homes(&self, address_path: &str, address_type: &str, value: &str) -> Vec<String> {
        self.idc_homes_with(&self.client.config(), address_path, address_type, value)
            .await
    }

    pub(crate) async fn topology_homes_with(
        &self,
        config: &ResolverConfig,
        domain_name: &str,
    ) -> Vec<String> {
        self.cached(config, TOPOLOGY_TAG, domain_name, || {
            global_domain_query(domain_name)
        })
        .await
    }

    pub(crate) async fn idc_homes_with(
        &self,
        config: &ResolverConfig,
        address_path: &str,
        address_type: &str,
        value: &str,
    ) -> Vec<String> {
        let tag = format!("{IDC_TAG} {address_type} {address_path}");
        self.cached(config, &tag, value, || {
            discovery_query(address_path, address_type, value)
        })
        .await
    }

    async fn cached(
        &self,
        config: &ResolverConfig,
        tag: &str,
        key: &str,
        query: impl FnOnce() -> String,
    ) -> Vec<String> {
        if !config.use_global_discovery {
            return Vec::new();
        }

        let cache = self.client.discovery_cache();
        if let Some(entry) = cache.get_live(key, Some(tag), config.ttl.domain_policy()) {
            debug!(key = %key, tag = %tag, "using discovery cache");
            return entry.payload.clone().unwrap_or_default();
        }

        if config.global_endpoints.is_empty() {
            debug!(key = %key, "no global lookup services defined");
            return Vec::new();
        }

        let body = query_body(&query());
        match find_services(
            self.client.channel(),
            &config.global_endpoints,
            config.try_all_global,
            &body,
        )
        .await
        {
            Ok(homes) => {
                cache.put(CacheEntry::new(key, Some(tag), None, Some(homes.clone())));
                homes
            }
            Err(err) => {
                debug!(key = %key, error = %err, "discovery failed");
                cache.put(CacheEntry::new(key, Some(tag), None, None));
                Vec::new()
            }
        }
    }
}
