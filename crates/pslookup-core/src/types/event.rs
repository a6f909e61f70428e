/// Event type of topology metadata and topology-service queries
pub const TOPOLOGY_EVENT_TYPE: &str = "http://ggf.org/ns/nmwg/topology/20070809";

/// Event type carried by lookup-service XQuery requests
pub const XQUERY_EVENT_TYPE: &str =
    "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/lookup/xquery/1.0";

/// Event type under which IDC services summarize their domains
pub const OSCARS_EVENT_TYPE: &str = "http://oscars.es.net/OSCARS";

/// Prefix of every lookup-service error event type
pub const LS_ERROR_PREFIX: &str = "error.ls";

/// Successful lookup query
pub const QUERY_SUCCESS: &str = "success.ls.query";

/// Successful registration
pub const REGISTER_SUCCESS: &str = "success.ls.register";

/// Successful keepalive
pub const KEEPALIVE_SUCCESS: &str = "success.ls.keepalive";

/// Successful deregistration
pub const DEREGISTER_SUCCESS: &str = "success.ls.deregister";

/// Registration key unknown to the directory
pub const REGISTER_KEY_NOT_FOUND: &str = "error.ls.register.key_not_found";

/// Keepalive key unknown to the directory
pub const KEEPALIVE_KEY_NOT_FOUND: &str = "error.ls.keepalive.key_not_found";

/// Reason used when an error response carries no result datum
pub const UNKNOWN_ERROR_REASON: &str = "An unknown error occurred";

/// Returns true for `error.ls*` event types
#[must_use]
pub fn is_lookup_error(event_type: &str) -> bool {
    event_type.starts_with(LS_ERROR_PREFIX)
}

/// Returns true for any `success.*` event type
#[must_use]
pub fn is_success(event_type: &str) -> bool {
    event_type.starts_with("success.")
}

/// The kind of a request envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Publish a registration
    Register,
    /// Refresh a registration
    Keepalive,
    /// Withdraw a registration
    Deregister,
    /// Query a lookup service
    Query,
    /// Query a topology service
    TopologyQuery,
    /// Add or replace topology at a topology service
    TopologyReplace,
}

impl MessageKind {
    /// The `type` attribute value on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "LSRegisterRequest",
            Self::Keepalive => "LSKeepaliveRequest",
            Self::Deregister => "LSDeregisterRequest",
            Self::Query => "LSQueryRequest",
            Self::TopologyQuery => "QueryRequest",
            Self::TopologyReplace => "TSReplaceRequest",
        }
    }

    /// The `type` attribute expected on the matching response
    #[must_use]
    pub const fn response_type(self) -> &'static str {
        match self {
            Self::Register => "LSRegisterResponse",
            Self::Keepalive => "LSKeepaliveResponse",
            Self::Deregister => "LSDeregisterResponse",
            Self::Query => "LSQueryResponse",
            Self::TopologyQuery => "QueryResponse",
            Self::TopologyReplace => "TSReplaceResponse",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
