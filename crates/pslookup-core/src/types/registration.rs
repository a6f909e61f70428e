//! Builders for the subjects published through a lookup service.

use crate::types::element::Element;
use crate::types::namespace::{TOPOLOGY, TOPOLOGY_L3};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Location fields accepted by [`NodeRegistration::set_location`], in the
/// order they are written
pub const LOCATION_FIELDS: [&str; 14] = [
    "country",
    "zipcode",
    "state",
    "institution",
    "city",
    "streetAddress",
    "floor",
    "room",
    "cage",
    "rack",
    "shelf",
    "latitude",
    "longitude",
    "continent",
];

/// Service type of an inter-domain controller
pub const IDC_TYPE: &str = "IDC";

/// Service type of a notification broker
pub const NB_TYPE: &str = "NB";

/// Protocol parameters keyed by parameter name
pub type ProtocolParams = BTreeMap<String, Vec<String>>;

/// A network node to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRegistration {
    node: Element,
}

impl NodeRegistration {
    /// Start a registration for the node with the given identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            node: Element::in_ns("node", TOPOLOGY).with_attr("id", id),
        }
    }

    /// Set the node's name, e.g. a DNS host name with type `dns`
    pub fn set_name(&mut self, name: impl Into<String>, name_type: impl Into<String>) {
        self.node.push(
            Element::in_ns("name", TOPOLOGY)
                .with_attr("type", name_type)
                .with_text(name),
        );
    }

    /// The node's name
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.node.child("name", TOPOLOGY).map(Element::text)
    }

    /// The type of the node's name
    #[must_use]
    pub fn name_type(&self) -> Option<&str> {
        self.node
            .child("name", TOPOLOGY)
            .and_then(|name| name.attr("type"))
    }

    /// Add a layer 3 port carrying `address`
    pub fn add_l3_address(&mut self, address: impl Into<String>, ipv6: bool) {
        let address = Element::in_ns("address", TOPOLOGY_L3)
            .with_attr("type", if ipv6 { "ipv6" } else { "ipv4" })
            .with_text(address);
        self.node
            .push(Element::in_ns("port", TOPOLOGY_L3).with_child(address));
    }

    /// Add a location block built from the recognized fields in `info`.
    ///
    /// Unrecognized keys are ignored. Returns false, and adds nothing, when
    /// none of the keys are recognized.
    pub fn set_location(&mut self, info: &HashMap<String, String>) -> bool {
        let mut location = Element::in_ns("location", TOPOLOGY);
        for field in LOCATION_FIELDS {
            if let Some(value) = info.get(field) {
                location.push(Element::in_ns(field, TOPOLOGY).with_text(value.as_str()));
            }
        }
        if location.children().next().is_none() {
            return false;
        }
        self.node.push(location);
        true
    }

    /// The `nmtopo:node` element
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.node
    }

    /// Consume the registration, returning the `nmtopo:node` element
    #[must_use]
    pub fn into_element(self) -> Element {
        self.node
    }
}

/// A network service to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    service: Element,
    optional_parameters: Option<Element>,
}

impl ServiceRegistration {
    /// Start a registration for a service with the given name and type
    #[must_use]
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        let service = Element::in_ns("service", TOPOLOGY)
            .with_child(Element::in_ns("name", TOPOLOGY).with_text(name))
            .with_child(Element::in_ns("type", TOPOLOGY).with_text(service_type));
        Self {
            service,
            optional_parameters: None,
        }
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.service.child(name, TOPOLOGY).map(Element::text)
    }

    /// The service identifier, when one was supplied
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.child_text("id")
    }

    /// The service name
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.child_text("name")
    }

    /// The service type
    #[must_use]
    pub fn service_type(&self) -> Option<String> {
        self.child_text("type")
    }

    /// The service description
    #[must_use]
    pub fn description(&self) -> Option<String> {
        self.child_text("description")
    }

    /// Describe the service
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.service
            .push(Element::in_ns("description", TOPOLOGY).with_text(description));
    }

    /// Record the node this service runs on
    pub fn set_node(&mut self, urn: &str) {
        self.push_relation("runsOn", [(urn, "node")]);
    }

    /// The node this service runs on
    #[must_use]
    pub fn node(&self) -> Option<String> {
        self.relation("runsOn")
            .and_then(|relation| relation.child("idRef", TOPOLOGY))
            .map(Element::text)
    }

    /// Record the domains this service controls
    pub fn set_controls<S: AsRef<str>>(&mut self, domains: &[S]) {
        self.push_relation("controls", domains.iter().map(|d| (d.as_ref(), "domain")));
    }

    /// Domains this service controls
    #[must_use]
    pub fn controls(&self) -> Vec<String> {
        self.relation_refs("controls")
    }

    /// Record the services subscribed to this service's notifications
    pub fn set_subscribers<S: AsRef<str>>(&mut self, subscribers: &[S]) {
        self.push_relation("subscriber", subscribers.iter().map(|s| classify(s.as_ref())));
    }

    /// Services subscribed to this service's notifications
    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.relation_refs("subscriber")
    }

    /// Record the services publishing notifications to this service
    pub fn set_publishers<S: AsRef<str>>(&mut self, publishers: &[S]) {
        self.push_relation("publisher", publishers.iter().map(|p| classify(p.as_ref())));
    }

    /// Services publishing notifications to this service
    #[must_use]
    pub fn publishers(&self) -> Vec<String> {
        self.relation_refs("publisher")
    }

    /// Add a port listening on `addresses` and speaking `protocol`
    pub fn add_port<S: AsRef<str>>(&mut self, addresses: &[S], protocol: &str, params: &ProtocolParams) {
        let mut port = Element::in_ns("port", TOPOLOGY);
        for address in addresses {
            port.push(
                Element::in_ns("address", TOPOLOGY)
                    .with_attr("type", "url")
                    .with_text(address.as_ref()),
            );
        }

        let mut parameters = Element::in_ns("parameters", TOPOLOGY);
        for (name, values) in params {
            for value in values {
                parameters.push(
                    Element::in_ns("parameter", TOPOLOGY)
                        .with_attr("name", name.as_str())
                        .with_text(value.as_str()),
                );
            }
        }

        port.push(
            Element::in_ns("protocol", TOPOLOGY)
                .with_child(Element::in_ns("type", TOPOLOGY).with_text(protocol))
                .with_child(parameters),
        );
        self.service.push(port);
    }

    /// The first port speaking `protocol`
    #[must_use]
    pub fn port_by_protocol(&self, protocol: &str) -> Option<&Element> {
        self.service.children_named("port", TOPOLOGY).find(|port| {
            port.child("protocol", TOPOLOGY)
                .and_then(|proto| proto.child("type", TOPOLOGY))
                .is_some_and(|t| t.text() == protocol)
        })
    }

    /// Addresses of the first port speaking `protocol`
    #[must_use]
    pub fn port_addresses(&self, protocol: &str) -> Vec<String> {
        self.port_by_protocol(protocol)
            .map(|port| {
                port.children_named("address", TOPOLOGY)
                    .map(Element::text)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parameters of the first port speaking `protocol`
    #[must_use]
    pub fn protocol_params(&self, protocol: &str) -> Option<ProtocolParams> {
        let params = self
            .port_by_protocol(protocol)?
            .child("protocol", TOPOLOGY)?
            .child("parameters", TOPOLOGY)?;

        let mut map = ProtocolParams::new();
        for param in params.children_named("parameter", TOPOLOGY) {
            let name = param.attr("name").unwrap_or_default().to_string();
            map.entry(name).or_default().push(param.text());
        }
        Some(map)
    }

    /// Attach parameters that follow the service inside the subject
    pub fn set_optional_parameters(&mut self, parameters: Element) {
        self.optional_parameters = Some(parameters);
    }

    /// Parameters that follow the service inside the subject
    #[must_use]
    pub const fn optional_parameters(&self) -> Option<&Element> {
        self.optional_parameters.as_ref()
    }

    /// The `nmtopo:service` element
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.service
    }

    /// The service element followed by any optional parameters
    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        std::iter::once(self.service)
            .chain(self.optional_parameters)
            .collect()
    }

    fn relation(&self, relation_type: &str) -> Option<&Element> {
        self.service
            .children_named("relation", TOPOLOGY)
            .find(|relation| relation.attr("type") == Some(relation_type))
    }

    fn relation_refs(&self, relation_type: &str) -> Vec<String> {
        self.relation(relation_type)
            .map(|relation| {
                relation
                    .children()
                    .filter(|r| r.is("idRef", TOPOLOGY) || r.is("address", TOPOLOGY))
                    .map(Element::text)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn push_relation<'a>(
        &mut self,
        relation_type: &str,
        refs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let mut relation = Element::in_ns("relation", TOPOLOGY).with_attr("type", relation_type);
        for (reference, ref_type) in refs {
            let tag = if ref_type == "url" { "address" } else { "idRef" };
            relation.push(
                Element::in_ns(tag, TOPOLOGY)
                    .with_attr("type", ref_type)
                    .with_text(reference),
            );
        }
        self.service.push(relation);
    }
}

fn classify(reference: &str) -> (&str, &'static str) {
    let kind = if Url::parse(reference).is_ok_and(|url| url.has_host()) {
        "url"
    } else {
        "uri"
    };
    (reference, kind)
}
