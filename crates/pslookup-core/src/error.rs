use std::time::Duration;
use thiserror::Error;

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors that can occur when talking to lookup services
#[derive(Error, Debug)]
pub enum LookupError {
    /// Network or transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport answered with a non-2xx status
    #[error("bad status returned: {code}")]
    Status {
        /// HTTP status code
        code: u16,
    },

    /// A hop or a whole cascade ran past its time bound
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Response body was not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(String),

    /// Well-formed response missing required structure
    #[error("{0}")]
    Protocol(String),

    /// Response carried an explicit `error.*` event type
    #[error("{event_type}: {reason}")]
    Remote {
        /// The event type reported by the service
        event_type: String,
        /// Human-readable reason from the result datum
        reason: String,
    },

    /// Every candidate of a discovery cascade failed
    #[error("no services found after trying lookup services:\n{log}")]
    NoServicesFound {
        /// One entry per candidate: endpoint and failure text
        log: String,
    },

    /// The cascade completed but nothing matched
    #[error("not found: {0}")]
    NotFound(String),

    /// A registration, keepalive or deregistration hop failed
    #[error("registration with {endpoint} failed: {source}")]
    Registration {
        /// The home directory that rejected the request
        endpoint: String,
        /// Underlying failure
        #[source]
        source: Box<LookupError>,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl LookupError {
    /// Wrap this error as a failed registration against `endpoint`
    #[must_use]
    pub fn in_registration(self, endpoint: impl Into<String>) -> Self {
        Self::Registration {
            endpoint: endpoint.into(),
            source: Box::new(self),
        }
    }

    /// Returns true for network, status, timeout and parse failures
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Timeout(_) | Self::Xml(_)
        )
    }

    /// Returns true if a cascade records this error and moves on
    #[must_use]
    pub const fn is_hop_failure(&self) -> bool {
        self.is_transport() || matches!(self, Self::Protocol(_) | Self::Remote { .. })
    }

    /// The remote event type, if the service reported one
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Remote { event_type, .. } => Some(event_type),
            Self::Registration { source, .. } => source.event_type(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_exposes_remote_event_type() {
        let err = LookupError::Remote {
            event_type: "error.ls.register.key_not_found".into(),
            reason: "key expired".into(),
        }
        .in_registration("https://hls.example.net/ls");

        assert_eq!(err.event_type(), Some("error.ls.register.key_not_found"));
        assert!(!err.is_hop_failure());
        assert_eq!(
            err.to_string(),
            "registration with https://hls.example.net/ls failed: \
             error.ls.register.key_not_found: key expired"
        );
    }

    #[test]
    fn transport_class() {
        assert!(LookupError::Status { code: 502 }.is_transport());
        assert!(LookupError::Xml("eof".into()).is_hop_failure());
        assert!(!LookupError::NotFound("x".into()).is_hop_failure());
    }
}
