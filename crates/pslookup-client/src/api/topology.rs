//! Domain topology resolution.

use crate::api::topology_service::topology_from_response;
use crate::api::DiscoveryApi;
use crate::cache::CacheEntry;
use crate::cascade::find_services;
use crate::client::within_deadline;
use crate::config::ResolverConfig;
use crate::query::{home_domain_query, query_body, topology_query};
use crate::DirectoryClient;
use chrono::Utc;
use pslookup_core::{Element, Identifier, IdentifierKind, Result};
use tracing::{debug, instrument};

/// Topology endpoints
pub struct TopologyApi<'a> {
    client: &'a DirectoryClient,
}

impl<'a> TopologyApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// Resolve the topology of the domain `domain_id`.
    ///
    /// The returned topology holds only the requested domain, restricted to
    /// `namespace` when one is given. Returns `None` when `domain_id` is not
    /// a domain identifier or no topology service knows it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use pslookup_client::{DirectoryClient, ResolverConfig};
    /// # async fn example() -> pslookup_client::Result<()> {
    /// let client = DirectoryClient::new(
    ///     ResolverConfig::new().global_endpoints(["http://gls.example.net/ls"]),
    /// )?;
    /// let topology = client
    ///     .topology()
    ///     .resolve("urn:ogf:network:domain=es.net", None)
    ///     .await?;
    /// println!("found: {}", topology.is_some());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        domain_id: &str,
        namespace: Option<&str>,
    ) -> Result<Option<Element>> {
        let config = self.client.config();
        within_deadline(
            config.deadline_duration(),
            self.resolve_with(&config, domain_id, namespace),
        )
        .await
    }

    async fn resolve_with(
        &self,
        config: &ResolverConfig,
        domain_id: &str,
        namespace: Option<&str>,
    ) -> Result<Option<Element>> {
        let identifier = Identifier::parse(domain_id);
        if identifier.kind != IdentifierKind::Domain {
            debug!(kind = %identifier.kind, "not a domain identifier");
            return Ok(None);
        }
        let domain_name = identifier.domain.unwrap_or_default();

        let cache = self.client.topology_cache();
        if let Some(entry) = cache.get(domain_id, namespace) {
            if entry.is_live(config.ttl.topology_policy()) {
                debug!("using cached topology");
                return Ok(entry.payload.clone());
            }
            if let Some(bound) = entry.endpoint.as_deref() {
                if entry.age_at(Utc::now()) < config.ttl.binding() {
                    debug!(endpoint = %bound, "revalidating against bound topology service");
                    if let Some(topology) = self.query_service(bound, domain_id, namespace).await {
                        self.remember(domain_id, namespace, bound, &topology);
                        return Ok(Some(topology));
                    }
                }
            }
        }

        let candidates = self.candidates(config, domain_id, &domain_name).await;
        for endpoint in &candidates {
            if let Some(topology) = self.query_service(endpoint, domain_id, namespace).await {
                self.remember(domain_id, namespace, endpoint, &topology);
                return Ok(Some(topology));
            }
        }

        if config.cache_failures && namespace.is_some() {
            cache.put(CacheEntry::new(domain_id, namespace, None, None));
        }
        Ok(None)
    }

    /// Topology services that may hold `domain_id`
    async fn candidates(
        &self,
        config: &ResolverConfig,
        domain_id: &str,
        domain_name: &str,
    ) -> Vec<String> {
        if !config.topology_endpoints.is_empty() {
            return config.topology_endpoints.clone();
        }

        let homes = if config.home_endpoints.is_empty() {
            DiscoveryApi::new(self.client)
                .topology_homes_with(config, domain_name)
                .await
        } else {
            config.home_endpoints.clone()
        };
        if homes.is_empty() {
            return Vec::new();
        }

        let body = query_body(&home_domain_query(domain_id));
        match find_services(self.client.channel(), &homes, true, &body).await {
            Ok(services) => services,
            Err(err) => {
                debug!(error = %err, "no topology services found");
                Vec::new()
            }
        }
    }

    /// Query one topology service, keeping only the matching domain
    async fn query_service(
        &self,
        endpoint: &str,
        domain_id: &str,
        namespace: Option<&str>,
    ) -> Option<Element> {
        let response = match self
            .client
            .channel()
            .send_envelope(endpoint, &topology_query(domain_id))
            .await
        {
            Ok(response) => response?,
            Err(err) => {
                debug!(endpoint = %endpoint, error = %err, "topology query failed");
                return None;
            }
        };
        let topology = topology_from_response(&response)?;
        restrict_to_domain(topology, domain_id, namespace)
    }

    fn remember(&self, domain_id: &str, namespace: Option<&str>, endpoint: &str, topology: &Element) {
        let namespace = namespace.map(String::from).or_else(|| {
            topology
                .children_local("domain")
                .next()
                .and_then(Element::namespace)
                .map(String::from)
        });
        if let Some(namespace) = namespace {
            self.client.topology_cache().put(CacheEntry::new(
                domain_id,
                Some(&namespace),
                Some(endpoint),
                Some(topology.clone()),
            ));
        }
    }
}

/// Strip every `domain` child other than `domain_id` in `namespace`.
///
/// Returns `None` if no matching domain remains.
fn restrict_to_domain(
    mut topology: Element,
    domain_id: &str,
    namespace: Option<&str>,
) -> Option<Element> {
    let matches = |domain: &Element| {
        domain.attr("id") == Some(domain_id)
            && namespace.map_or(true, |ns| domain.namespace() == Some(ns))
    };
    topology.retain_children(|child| child.name() != "domain" || matches(child));
    let found = topology.children_local("domain").next().is_some();
    found.then_some(topology)
}
