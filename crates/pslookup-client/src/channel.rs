//! Message channel: SOAP framing, transport and response unwrapping.

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::transport::Transport;
use pslookup_core::{Element, LookupError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Marker whose presence means a request is already SOAP framed
const SOAP_MARKER: &str = "SOAP-ENV";

const SOAP_HEAD: &str = concat!(
    "<?xml version='1.0' encoding='UTF-8'?>",
    "<SOAP-ENV:Envelope xmlns:SOAP-ENC=\"http://schemas.xmlsoap.org/soap/encoding/\" ",
    "xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" ",
    "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" ",
    "xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\">",
    "<SOAP-ENV:Header/><SOAP-ENV:Body>",
);

const SOAP_TAIL: &str = "</SOAP-ENV:Body></SOAP-ENV:Envelope>";

/// Wrap `request` in a SOAP envelope unless it already carries one
#[must_use]
pub fn soap_wrap(request: &str) -> String {
    if request.contains(SOAP_MARKER) {
        return request.to_string();
    }
    let mut framed = String::with_capacity(SOAP_HEAD.len() + request.len() + SOAP_TAIL.len());
    framed.push_str(SOAP_HEAD);
    framed.push_str(request);
    framed.push_str(SOAP_TAIL);
    framed
}

/// Sends request documents to services and returns their `message` element
#[derive(Clone)]
pub struct MessageChannel {
    transport: Arc<dyn Transport>,
    hop_timeout: Option<Duration>,
}

impl std::fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("hop_timeout", &self.hop_timeout)
            .finish_non_exhaustive()
    }
}

impl MessageChannel {
    /// Create a channel over `transport` with no hop timeout
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            hop_timeout: None,
        }
    }

    /// Bound every hop by `timeout`
    #[must_use]
    pub fn with_hop_timeout(mut self, timeout: Duration) -> Self {
        self.hop_timeout = Some(timeout);
        self
    }

    /// The per-hop timeout, if any
    #[must_use]
    pub const fn hop_timeout(&self) -> Option<Duration> {
        self.hop_timeout
    }

    /// The transport requests are posted over
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send a typed request envelope
    pub async fn send_envelope(
        &self,
        endpoint: &str,
        envelope: &RequestEnvelope,
    ) -> Result<Option<ResponseEnvelope>> {
        self.send(endpoint, &envelope.to_xml()).await
    }

    /// Send a serialized request and return the last `message` element of
    /// the response.
    ///
    /// Returns `Ok(None)` when the response is well formed but holds no
    /// message. Non-2xx statuses, transport failures, hop timeouts and
    /// malformed bodies are errors.
    pub async fn send(&self, endpoint: &str, request: &str) -> Result<Option<ResponseEnvelope>> {
        let body = soap_wrap(request);
        debug!(endpoint = %endpoint, "sending message");

        let post = self.transport.post(endpoint, body);
        let response = match self.hop_timeout {
            Some(limit) => tokio::time::timeout(limit, post)
                .await
                .map_err(|_| LookupError::Timeout(limit))??,
            None => post.await?,
        };

        if !response.is_success() {
            debug!(endpoint = %endpoint, status = response.status, "bad status");
            return Err(LookupError::Status {
                code: response.status,
            });
        }

        let document = Element::parse(&response.body)?;
        let message = document.descendants_local("message").pop().cloned();
        if message.is_none() {
            debug!(endpoint = %endpoint, "no message in response");
        }
        Ok(message.map(ResponseEnvelope::new))
    }
}
