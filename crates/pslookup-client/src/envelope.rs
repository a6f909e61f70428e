//! Request and response messages.

use crate::correlate::{correlate, MetadataDataPair};
use pslookup_core::event::{is_lookup_error, UNKNOWN_ERROR_REASON};
use pslookup_core::namespace::{Namespace, NMWG, NMWG_RESULT, PERFSONAR, PS_SERVICE, XQUERY};
use pslookup_core::{Element, LookupError, MessageKind, Result};
use uuid::Uuid;

/// A fresh identifier such as `message-6f1c...`
#[must_use]
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// A typed request message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    kind: MessageKind,
    id: String,
    namespaces: Vec<(String, String)>,
    body: Vec<Element>,
}

impl RequestEnvelope {
    /// Create an empty request of the given kind
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            id: unique_id("message"),
            namespaces: Vec::new(),
            body: Vec::new(),
        }
    }

    /// The request kind
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The message identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declare an extra namespace on the message element
    #[must_use]
    pub fn declare(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    /// Declare every `(prefix, uri)` pair on the message element
    #[must_use]
    pub fn declare_all<'a>(self, namespaces: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        namespaces
            .into_iter()
            .fold(self, |envelope, (prefix, uri)| envelope.declare(prefix, uri))
    }

    /// Append body elements
    #[must_use]
    pub fn with_body(mut self, body: impl IntoIterator<Item = Element>) -> Self {
        self.body.extend(body);
        self
    }

    /// The body elements
    #[must_use]
    pub fn body(&self) -> &[Element] {
        &self.body
    }

    fn default_namespaces(&self) -> &'static [Namespace] {
        match self.kind {
            MessageKind::Register | MessageKind::Keepalive | MessageKind::Deregister => {
                &[PERFSONAR, PS_SERVICE]
            }
            MessageKind::Query => &[XQUERY],
            MessageKind::TopologyQuery | MessageKind::TopologyReplace => &[],
        }
    }

    /// Build the `nmwg:message` element
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut message = Element::in_ns("message", NMWG)
            .with_attr("type", self.kind.as_str())
            .with_attr("id", self.id.as_str());
        for ns in self.default_namespaces() {
            message.declare(Some(ns.prefix), ns.uri);
        }
        for (prefix, uri) in &self.namespaces {
            message.declare(Some(prefix.as_str()), uri.as_str());
        }
        for element in &self.body {
            message.push(element.clone());
        }
        message
    }

    /// Serialize the message
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }
}

/// A response message returned by a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    message: Element,
}

impl ResponseEnvelope {
    /// Wrap a parsed `message` element
    #[must_use]
    pub const fn new(message: Element) -> Self {
        Self { message }
    }

    /// The message element
    #[must_use]
    pub const fn message(&self) -> &Element {
        &self.message
    }

    /// Consume the envelope, returning the message element
    #[must_use]
    pub fn into_message(self) -> Element {
        self.message
    }

    /// The message `type` attribute, empty if absent
    #[must_use]
    pub fn kind(&self) -> &str {
        self.message.attr("type").unwrap_or_default()
    }

    /// The first metadata element
    #[must_use]
    pub fn metadata(&self) -> Option<&Element> {
        self.message.child("metadata", NMWG)
    }

    /// Event type of the first metadata element
    pub fn event_type(&self) -> Result<String> {
        let metadata = self
            .metadata()
            .ok_or_else(|| LookupError::Protocol("no metadata element in response".into()))?;
        metadata
            .child("eventType", NMWG)
            .map(Element::text_trim)
            .ok_or_else(|| LookupError::Protocol("no eventType returned".into()))
    }

    /// The `datum` in `ns` under the first data element
    #[must_use]
    pub fn datum(&self, ns: Namespace) -> Option<&Element> {
        self.message
            .child("data", NMWG)
            .and_then(|data| data.child("datum", ns))
    }

    /// Reason text from the result datum, or a generic reason
    #[must_use]
    pub fn error_reason(&self) -> String {
        self.datum(NMWG_RESULT)
            .map(Element::text_trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_REASON.to_string())
    }

    /// Check the event type against `expected`.
    ///
    /// `error.ls*` event types fail with [`LookupError::Remote`]; any other
    /// mismatch is a protocol error.
    pub fn expect_status(&self, expected: &str) -> Result<()> {
        let event_type = self.event_type()?;
        if event_type == expected {
            return Ok(());
        }
        if is_lookup_error(&event_type) {
            return Err(LookupError::Remote {
                reason: self.error_reason(),
                event_type,
            });
        }
        Err(LookupError::Protocol(format!(
            "unrecognized status: {event_type}"
        )))
    }

    /// The update key in `metadata/key/parameters/parameter[@name='lsKey']`
    #[must_use]
    pub fn update_key(&self) -> Option<String> {
        self.message
            .children_named("metadata", NMWG)
            .filter_map(|metadata| metadata.child("key", NMWG))
            .flat_map(|key| key.children_named("parameters", NMWG))
            .flat_map(|params| params.children_named("parameter", NMWG))
            .find(|param| param.attr("name") == Some("lsKey"))
            .map(Element::text_trim)
    }

    /// Correlated metadata/data pairs
    pub fn pairs(&self) -> impl Iterator<Item = MetadataDataPair<'_>> + '_ {
        correlate(&self.message)
    }
}
