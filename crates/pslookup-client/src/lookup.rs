//! A client for one lookup service.

use crate::channel::MessageChannel;
use crate::envelope::{unique_id, RequestEnvelope, ResponseEnvelope};
use pslookup_core::namespace::{Namespace, NMWG};
use pslookup_core::{Element, MessageKind, Result};
use tracing::instrument;

/// Sends lookup requests to a single service endpoint
#[derive(Debug, Clone)]
pub struct LookupClient {
    endpoint: String,
    channel: MessageChannel,
}

impl LookupClient {
    /// Create a client for `endpoint`
    #[must_use]
    pub fn new(endpoint: impl Into<String>, channel: MessageChannel) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel,
        }
    }

    /// The service endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Publish a registration
    pub async fn register(
        &self,
        body: Vec<Element>,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<ResponseEnvelope>> {
        self.manage(MessageKind::Register, body, namespaces).await
    }

    /// Refresh a registration
    pub async fn keepalive(
        &self,
        body: Vec<Element>,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<ResponseEnvelope>> {
        self.manage(MessageKind::Keepalive, body, namespaces).await
    }

    /// Withdraw a registration
    pub async fn deregister(
        &self,
        body: Vec<Element>,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<ResponseEnvelope>> {
        self.manage(MessageKind::Deregister, body, namespaces).await
    }

    /// Run a query
    #[instrument(skip(self, body), fields(endpoint = %self.endpoint))]
    pub async fn query(&self, body: Vec<Element>) -> Result<Option<ResponseEnvelope>> {
        let envelope = RequestEnvelope::new(MessageKind::Query).with_body(body);
        self.channel.send_envelope(&self.endpoint, &envelope).await
    }

    #[instrument(skip(self, body, namespaces), fields(endpoint = %self.endpoint))]
    async fn manage(
        &self,
        kind: MessageKind,
        body: Vec<Element>,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<ResponseEnvelope>> {
        let envelope = RequestEnvelope::new(kind)
            .declare_all(namespaces.iter().copied())
            .with_body(body);
        self.channel.send_envelope(&self.endpoint, &envelope).await
    }

    /// The `nmwg:key` element carrying an update key
    #[must_use]
    pub fn key_element(key: &str) -> Element {
        let param = Element::in_ns("parameter", NMWG)
            .with_attr("name", "lsKey")
            .with_text(key);
        Element::in_ns("key", NMWG)
            .with_attr("id", unique_id("key"))
            .with_child(
                Element::in_ns("parameters", NMWG)
                    .with_attr("id", unique_id("keyParams"))
                    .with_child(param),
            )
    }

    /// The datum in `ns` under the response's data section, if both exist
    #[must_use]
    pub fn extract_datum(response: Option<&ResponseEnvelope>, ns: Namespace) -> Option<&Element> {
        response.and_then(|response| response.datum(ns))
    }
}
