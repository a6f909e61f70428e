//! Host name and node resolution.

use crate::api::DiscoveryApi;
use crate::cache::CacheEntry;
use crate::cascade::with_backups;
use crate::client::within_deadline;
use crate::config::ResolverConfig;
use crate::lookup::LookupClient;
use crate::query::{host_query, node_query, query_body, DOMAIN_NAME_PATH, SUBNET_ADDRESS_PATH};
use crate::DirectoryClient;
use pslookup_core::namespace::{PS_SERVICE, TOPOLOGY};
use pslookup_core::{Element, LookupError, Result};
use tracing::{debug, instrument};

/// Host endpoints
pub struct HostApi<'a> {
    client: &'a DirectoryClient,
}

impl<'a> HostApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// Resolve the link identifier registered for the host `name`.
    ///
    /// Answers are cached per host name for the configured host TTL.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<String> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), self.resolve_with(&config, name)).await
    }

    async fn resolve_with(&self, config: &ResolverConfig, name: &str) -> Result<String> {
        let cache = self.client.host_cache();
        if let Some(entry) = cache.get_live(name, None, config.ttl.host_policy()) {
            if let Some(urn) = &entry.payload {
                debug!("using host cache");
                return Ok(urn.clone());
            }
        }

        let domain = strip_first_label(name);
        let discovered = DiscoveryApi::new(self.client)
            .idc_homes_with(config, DOMAIN_NAME_PATH, "dns", domain)
            .await;
        let homes = with_backups(discovered, &config.home_endpoints);

        let body = query_body(&host_query(name));
        for home in &homes {
            let client = self.client.lookup(home.as_str());
            let response = match client.query(body.clone()).await {
                Ok(response) => response,
                Err(err) => {
                    debug!(endpoint = %home, error = %err, "host query failed");
                    continue;
                }
            };
            let urn = LookupClient::extract_datum(response.as_ref(), PS_SERVICE)
                .map(Element::text_trim)
                .unwrap_or_default();
            if !urn.is_empty() {
                cache.put(CacheEntry::new(name, None, Some(home.as_str()), Some(urn.clone())));
                return Ok(urn);
            }
        }

        Err(LookupError::NotFound(format!(
            "couldn't find a mapping for {domain}"
        )))
    }

    /// Find the topology node with the given address.
    ///
    /// Addresses that look like DNS names are discovered by domain name,
    /// anything else by L3 subnet address.
    #[instrument(skip(self))]
    pub async fn node(&self, address: &str) -> Result<Option<Element>> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), self.node_with(&config, address)).await
    }

    async fn node_with(&self, config: &ResolverConfig, address: &str) -> Result<Option<Element>> {
        let (node_path, address_path, address_type, key) = if looks_like_name(address) {
            ("nmtb:name", DOMAIN_NAME_PATH, "dns", strip_first_label(address))
        } else {
            ("nmtl3:port/nmtl3:address", SUBNET_ADDRESS_PATH, "ipv4", address)
        };

        let discovered = DiscoveryApi::new(self.client)
            .idc_homes_with(config, address_path, address_type, key)
            .await;
        let homes = with_backups(discovered, &config.home_endpoints);

        let body = query_body(&node_query(node_path, address));
        for home in &homes {
            let client = self.client.lookup(home.as_str());
            match client.query(body.clone()).await {
                Ok(response) => {
                    let node = LookupClient::extract_datum(response.as_ref(), PS_SERVICE)
                        .and_then(|datum| datum.child("node", TOPOLOGY));
                    if let Some(node) = node {
                        return Ok(Some(node.clone()));
                    }
                }
                Err(err) => debug!(endpoint = %home, error = %err, "node query failed"),
            }
        }
        Ok(None)
    }
}

/// `name` without its first dot-separated label
pub(crate) fn strip_first_label(name: &str) -> &str {
    name.split_once('.').map_or(name, |(_, rest)| rest)
}

/// Returns true if `address` has a dot followed by a letter
fn looks_like_name(address: &str) -> bool {
    address
        .as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'.' && pair[1].is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_label_is_stripped() {
        assert_eq!(strip_first_label("chic-cr1.es.net"), "es.net");
        assert_eq!(strip_first_label("localhost"), "localhost");
    }

    #[test]
    fn names_and_addresses() {
        assert!(looks_like_name("host.es.net"));
        assert!(!looks_like_name("198.51.100.7"));
        assert!(!looks_like_name("2001:db8::1"));
    }
}
