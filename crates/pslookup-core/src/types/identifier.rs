use std::net::IpAddr;

/// Prefix shared by every topology identifier
pub const URN_PREFIX: &str = "urn:ogf:network:";

/// What a parsed identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// A network domain
    Domain,
    /// A node within a domain
    Node,
    /// A port on a node
    Port,
    /// A link on a port
    Link,
    /// A literal IPv4 address
    Ipv4Address,
    /// A literal IPv6 address
    Ipv6Address,
    /// Blank input
    Empty,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Domain => "domain",
            Self::Node => "node",
            Self::Port => "port",
            Self::Link => "link",
            Self::Ipv4Address => "ipv4address",
            Self::Ipv6Address => "ipv6address",
            Self::Empty => "empty",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A parsed topology identifier such as
/// `urn:ogf:network:domain=es.net:node=chic-cr1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The identifier kind
    pub kind: IdentifierKind,
    /// Domain component
    pub domain: Option<String>,
    /// Node component
    pub node: Option<String>,
    /// Port component
    pub port: Option<String>,
    /// Link component
    pub link: Option<String>,
}

const COMPONENTS: [&str; 4] = ["domain", "node", "port", "link"];

impl Identifier {
    /// Parse an identifier in either the fully-qualified
    /// (`domain=a:node=b`) or compact (`a:b`) form
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::of_kind(IdentifierKind::Empty);
        }

        if let Some(rest) = text.strip_prefix(URN_PREFIX) {
            if let Some(values) = split_components(rest) {
                let mut values = values.into_iter();
                let kind = match values.len() {
                    1 => IdentifierKind::Domain,
                    2 => IdentifierKind::Node,
                    3 => IdentifierKind::Port,
                    _ => IdentifierKind::Link,
                };
                return Self {
                    kind,
                    domain: values.next(),
                    node: values.next(),
                    port: values.next(),
                    link: values.next(),
                };
            }
        }

        match text.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Self::of_kind(IdentifierKind::Ipv4Address),
            Ok(IpAddr::V6(_)) => Self::of_kind(IdentifierKind::Ipv6Address),
            Err(_) => Self::of_kind(IdentifierKind::Unknown),
        }
    }

    const fn of_kind(kind: IdentifierKind) -> Self {
        Self {
            kind,
            domain: None,
            node: None,
            port: None,
            link: None,
        }
    }

    /// Returns true for domain, node, port and link identifiers
    #[must_use]
    pub const fn is_topology(&self) -> bool {
        matches!(
            self.kind,
            IdentifierKind::Domain | IdentifierKind::Node | IdentifierKind::Port | IdentifierKind::Link
        )
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        [&self.domain, &self.node, &self.port, &self.link]
            .into_iter()
            .map_while(|v| v.as_deref())
    }

    /// Fully-qualified form, e.g. `urn:ogf:network:domain=a:node=b`
    #[must_use]
    pub fn fully_qualified(&self) -> Option<String> {
        if !self.is_topology() {
            return None;
        }
        let parts: Vec<String> = COMPONENTS
            .iter()
            .zip(self.values())
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        Some(format!("{URN_PREFIX}{}", parts.join(":")))
    }

    /// Compact form, e.g. `urn:ogf:network:a:b`
    #[must_use]
    pub fn compact(&self) -> Option<String> {
        self.bare_compact().map(|bare| format!("{URN_PREFIX}{bare}"))
    }

    /// Compact form without the URN prefix, e.g. `a:b`
    #[must_use]
    pub fn bare_compact(&self) -> Option<String> {
        self.is_topology()
            .then(|| self.values().collect::<Vec<_>>().join(":"))
    }

    /// Fully-qualified identifier of the enclosing domain
    #[must_use]
    pub fn domain_identifier(&self) -> Option<String> {
        self.domain
            .as_ref()
            .map(|domain| format!("{URN_PREFIX}domain={domain}"))
    }
}

/// Split `rest` into component values; every part must be either
/// `key=value` with keys in canonical order, or a bare value
fn split_components(rest: &str) -> Option<Vec<String>> {
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.is_empty() || parts.len() > COMPONENTS.len() {
        return None;
    }

    if parts.iter().all(|p| !p.contains('=')) {
        return parts
            .iter()
            .all(|p| !p.is_empty())
            .then(|| parts.iter().map(|p| (*p).to_string()).collect());
    }

    parts
        .iter()
        .zip(COMPONENTS)
        .map(|(part, expected)| match part.split_once('=') {
            Some((key, value)) if key == expected && !value.is_empty() => Some(value.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_qualified_port() {
        let id = Identifier::parse(" urn:ogf:network:domain=es.net:node=chic-cr1:port=xe-1/0/0 ");
        assert_eq!(id.kind, IdentifierKind::Port);
        assert_eq!(id.domain.as_deref(), Some("es.net"));
        assert_eq!(id.node.as_deref(), Some("chic-cr1"));
        assert_eq!(id.port.as_deref(), Some("xe-1/0/0"));
        assert_eq!(id.link, None);
        assert_eq!(id.compact().as_deref(), Some("urn:ogf:network:es.net:chic-cr1:xe-1/0/0"));
        assert_eq!(id.bare_compact().as_deref(), Some("es.net:chic-cr1:xe-1/0/0"));
        assert_eq!(
            id.domain_identifier().as_deref(),
            Some("urn:ogf:network:domain=es.net")
        );
    }

    #[test]
    fn compact_link_round_trips_to_fully_qualified() {
        let id = Identifier::parse("urn:ogf:network:es.net:n1:p1:l1");
        assert_eq!(id.kind, IdentifierKind::Link);
        assert_eq!(
            id.fully_qualified().as_deref(),
            Some("urn:ogf:network:domain=es.net:node=n1:port=p1:link=l1")
        );
    }

    #[test]
    fn domain_forms() {
        assert_eq!(Identifier::parse("urn:ogf:network:domain=internet2.edu").kind, IdentifierKind::Domain);
        assert_eq!(Identifier::parse("urn:ogf:network:internet2.edu").kind, IdentifierKind::Domain);
    }

    #[test]
    fn rejects_mixed_and_misordered_forms() {
        assert_eq!(Identifier::parse("urn:ogf:network:domain=a:b").kind, IdentifierKind::Unknown);
        assert_eq!(Identifier::parse("urn:ogf:network:node=a").kind, IdentifierKind::Unknown);
        assert_eq!(Identifier::parse("urn:ogf:network:a::b").kind, IdentifierKind::Unknown);
        assert_eq!(Identifier::parse("urn:ogf:network:a:b:c:d:e").kind, IdentifierKind::Unknown);
    }

    #[test]
    fn addresses_and_blanks() {
        assert_eq!(Identifier::parse("192.0.2.7").kind, IdentifierKind::Ipv4Address);
        assert_eq!(Identifier::parse("2001:db8::1").kind, IdentifierKind::Ipv6Address);
        assert_eq!(Identifier::parse("   ").kind, IdentifierKind::Empty);
        assert_eq!(Identifier::parse("host.example.net").kind, IdentifierKind::Unknown);
        assert_eq!(Identifier::parse("host.example.net").fully_qualified(), None);
    }
}
