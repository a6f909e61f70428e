//! Lookup of IDCs and notification brokers by their relations.

use crate::api::host::strip_first_label;
use crate::api::DiscoveryApi;
use crate::cascade::with_backups;
use crate::client::within_deadline;
use crate::config::ResolverConfig;
use crate::query::{
    query_body, service_relation_query, supported_message_where, DOMAIN_NAME_PATH,
    URL_ADDRESS_PATH,
};
use crate::DirectoryClient;
use pslookup_core::event::{is_lookup_error, QUERY_SUCCESS};
use pslookup_core::namespace::{NMWG, PS_SERVICE, TOPOLOGY};
use pslookup_core::{Element, LookupError, Result, IDC_TYPE, NB_TYPE};
use tracing::{debug, instrument};
use url::{Host, Url};

const DOMAIN_URN_PREFIX: &str = "urn:ogf:network:domain=";

/// Service endpoints
pub struct ServiceApi<'a> {
    client: &'a DirectoryClient,
}

impl<'a> ServiceApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// Find the service datum of a `service_type` service with `relation`
    /// to `id`.
    ///
    /// `id` is either a topology identifier or a URL. `extra_where` extends
    /// the match condition and `result_path` selects what is returned below
    /// the service.
    #[instrument(skip(self, extra_where, result_path))]
    pub async fn find_by_relation(
        &self,
        service_type: &str,
        id: &str,
        relation: &str,
        extra_where: &str,
        result_path: &str,
    ) -> Result<Option<Element>> {
        let config = self.client.config();
        let query = service_relation_query(service_type, id, relation, extra_where, result_path);
        within_deadline(
            config.deadline_duration(),
            self.find_with(&config, id, &query),
        )
        .await
    }

    async fn find_with(
        &self,
        config: &ResolverConfig,
        id: &str,
        query: &str,
    ) -> Result<Option<Element>> {
        let key = discovery_key(id);
        let discovered = DiscoveryApi::new(self.client)
            .idc_homes_with(config, DOMAIN_NAME_PATH, "dns", &key)
            .await;
        let homes = with_backups(discovered, &config.home_endpoints);

        let body = query_body(query);
        for home in &homes {
            let response = match self.client.lookup(home.as_str()).query(body.clone()).await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    debug!(endpoint = %home, "no response returned");
                    continue;
                }
                Err(err) => {
                    debug!(endpoint = %home, error = %err, "service query failed");
                    continue;
                }
            };

            let metadata = response.metadata().ok_or_else(|| {
                LookupError::Protocol(format!("no metadata element in response from {home}"))
            })?;
            let event_type = metadata
                .child("eventType", NMWG)
                .map(Element::text_trim);
            match event_type.as_deref() {
                Some(QUERY_SUCCESS) => {
                    if let Some(datum) = response.datum(PS_SERVICE) {
                        return Ok(Some(datum.clone()));
                    }
                }
                Some(event) if is_lookup_error(event) => {
                    debug!(endpoint = %home, event_type = %event, reason = %response.error_reason(), "service query rejected");
                }
                other => debug!(endpoint = %home, event_type = ?other, "unrecognized status"),
            }
        }
        Ok(None)
    }

    /// The IDC controlling `domain`
    pub async fn idc(&self, domain: &str) -> Result<Option<Element>> {
        let datum = self
            .find_by_relation(IDC_TYPE, domain, "controls", "", "")
            .await?;
        Ok(datum.and_then(|datum| datum.child("service", TOPOLOGY).cloned()))
    }

    /// URLs of the IDC controlling `domain`
    pub async fn idc_urls(&self, domain: &str) -> Result<Vec<String>> {
        let datum = self
            .find_by_relation(IDC_TYPE, domain, "controls", "", URL_ADDRESS_PATH)
            .await?;
        Ok(address_urls(datum.as_ref()))
    }

    /// The notification broker serving the IDC at `idc_url`
    pub async fn notification_broker(&self, idc_url: &str) -> Result<Option<Element>> {
        let datum = self
            .find_by_relation(
                NB_TYPE,
                idc_url,
                "subscriber",
                &supported_message_where(idc_url),
                "",
            )
            .await?;
        Ok(datum.and_then(|datum| datum.child("service", TOPOLOGY).cloned()))
    }

    /// URLs accepting notification subscriptions for the IDC at `idc_url`
    pub async fn notification_broker_urls(&self, idc_url: &str) -> Result<Vec<String>> {
        let datum = self
            .find_by_relation(
                NB_TYPE,
                idc_url,
                "subscriber",
                &supported_message_where(idc_url),
                URL_ADDRESS_PATH,
            )
            .await?;
        Ok(address_urls(datum.as_ref()))
    }
}

/// Domain name used to discover the homes of `id`
fn discovery_key(id: &str) -> String {
    let key = id.replace(DOMAIN_URN_PREFIX, "");
    match Url::parse(&key) {
        Ok(url) => match url.host() {
            Some(Host::Domain(host)) => strip_first_label(host).to_string(),
            _ => key,
        },
        Err(_) => key,
    }
}

/// Trimmed, deduplicated `address` texts of a datum
fn address_urls(datum: Option<&Element>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for address in datum
        .into_iter()
        .flat_map(|datum| datum.children_named("address", TOPOLOGY))
    {
        let url = address.text_trim();
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}
