/// An XML namespace with its conventional prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Prefix used when serializing elements in this namespace
    pub prefix: &'static str,
    /// Namespace URI; the identity used for matching
    pub uri: &'static str,
}

impl Namespace {
    /// Create a namespace
    #[must_use]
    pub const fn new(prefix: &'static str, uri: &'static str) -> Self {
        Self { prefix, uri }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// NMWG base schema (messages, metadata, data)
pub const NMWG: Namespace = Namespace::new("nmwg", "http://ggf.org/ns/nmwg/base/2.0/");

/// NMWG result datum, used for error reasons
pub const NMWG_RESULT: Namespace = Namespace::new("nmwgr", "http://ggf.org/ns/nmwg/result/2.0/");

/// perfSONAR subjects
pub const PERFSONAR: Namespace =
    Namespace::new("perfsonar", "http://ggf.org/ns/nmwg/tools/org/perfsonar/1.0/");

/// perfSONAR service descriptions and datums
pub const PS_SERVICE: Namespace = Namespace::new(
    "psservice",
    "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/1.0/",
);

/// Lookup-service XQuery subjects and parameters
pub const XQUERY: Namespace = Namespace::new(
    "xquery",
    "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/lookup/xquery/1.0/",
);

/// Topology-service path subjects
pub const XPATH_SUBJECT: Namespace =
    Namespace::new("xquery", "http://ggf.org/ns/nmwg/tools/org/perfsonar/xquery/1.0/");

/// Network topology base schema
pub const TOPOLOGY: Namespace =
    Namespace::new("nmtopo", "http://ogf.org/schema/network/topology/base/20070828/");

/// Network topology layer 3 schema
pub const TOPOLOGY_L3: Namespace =
    Namespace::new("nmtl3", "http://ogf.org/schema/network/topology/l3/20070828/");

/// Dynamic circuit networking subjects
pub const DCN: Namespace = Namespace::new("dcn", "http://ggf.org/ns/nmwg/tools/org/dcn/1.0/");

/// SOAP 1.1 envelope
pub const SOAP_ENV: Namespace =
    Namespace::new("SOAP-ENV", "http://schemas.xmlsoap.org/soap/envelope/");
