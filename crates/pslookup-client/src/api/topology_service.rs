//! Direct access to one topology service.

use crate::envelope::ResponseEnvelope;
use crate::query::{topology_fetch_all, topology_query, topology_replace};
use crate::DirectoryClient;
use pslookup_core::event::{is_success, TOPOLOGY_EVENT_TYPE};
use pslookup_core::namespace::TOPOLOGY;
use pslookup_core::{Element, MessageKind, Result};
use tracing::{debug, warn};

/// Topology service endpoints
pub struct TopologyServiceApi<'a> {
    client: &'a DirectoryClient,
    endpoint: String,
}

impl<'a> TopologyServiceApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    /// The topology service endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Retrieve the service's whole topology
    pub async fn fetch(&self) -> Result<Option<Element>> {
        let response = self
            .client
            .channel()
            .send_envelope(&self.endpoint, &topology_fetch_all())
            .await?;
        Ok(response.as_ref().and_then(topology_from_response))
    }

    /// Retrieve the topology containing the element `domain_id`
    pub async fn query(&self, domain_id: &str) -> Result<Option<Element>> {
        let response = self
            .client
            .channel()
            .send_envelope(&self.endpoint, &topology_query(domain_id))
            .await?;
        Ok(response.as_ref().and_then(topology_from_response))
    }

    /// Add `domain` to the service, replacing any domain with the same id.
    ///
    /// Returns true if the service reported success.
    pub async fn add_replace_domain(&self, domain: Element) -> Result<bool> {
        let response = self
            .client
            .channel()
            .send_envelope(&self.endpoint, &topology_replace(domain))
            .await?;

        let mut replaced = false;
        for pair in response.iter().flat_map(ResponseEnvelope::pairs) {
            if pair.message_kind != MessageKind::TopologyReplace.response_type() {
                warn!(kind = %pair.message_kind, "unexpected message type");
                continue;
            }
            match pair.event_type() {
                Some(event) if is_success(&event) => replaced = true,
                Some(event) if event.starts_with("error.") => replaced = false,
                other => warn!(event_type = ?other, "unknown replace status"),
            }
        }
        Ok(replaced)
    }
}

/// The last topology carried by a topology query response
pub(crate) fn topology_from_response(response: &ResponseEnvelope) -> Option<Element> {
    let mut topology = None;
    for pair in response.pairs() {
        if pair.message_kind != MessageKind::TopologyQuery.response_type() {
            debug!(kind = %pair.message_kind, "unexpected message type");
            continue;
        }
        if pair.event_type().as_deref() != Some(TOPOLOGY_EVENT_TYPE) {
            debug!(event_type = ?pair.event_type(), "unexpected event type");
            continue;
        }
        match pair.data.child("topology", TOPOLOGY) {
            Some(found) => topology = Some(found),
            None => debug!("no topology located in data"),
        }
    }
    topology.cloned()
}
