//! Builders for lookup queries and topology-service requests.
//!
//! Lookup services answer XQuery expressions over their `LSStore`. Each
//! builder here returns the query text; [`query_metadata`] and
//! [`request_pair`] turn it into the metadata/data body of a request.

use crate::envelope::{unique_id, RequestEnvelope};
use pslookup_core::event::{OSCARS_EVENT_TYPE, TOPOLOGY_EVENT_TYPE, XQUERY_EVENT_TYPE};
use pslookup_core::namespace::{NMWG, TOPOLOGY, XPATH_SUBJECT, XQUERY};
use pslookup_core::{Element, MessageKind};

/// Protocol type of an IDC's OSCARS interface
pub const PROTO_OSCARS: &str = OSCARS_EVENT_TYPE;

/// WS-Notification base protocol
pub const PROTO_WSN: &str = "http://docs.oasis-open.org/wsn/b-2";

/// WS-Notification brokered protocol
pub const PROTO_WSNB: &str = "http://docs.oasis-open.org/wsn/br-2";

/// Port parameter naming a supported message
pub const PARAM_SUPPORTED_MSG: &str = "keyword:supportedMessage";

/// Port parameter naming a notification topic
pub const PARAM_TOPIC: &str = "keyword:topic";

/// Result path selecting a service's URL addresses
pub const URL_ADDRESS_PATH: &str = "/nmtb:port/nmtb:address[@type=\"url\"]";

/// Address path of a DNS domain name in a summary subject
pub const DOMAIN_NAME_PATH: &str = "nmtb:domain/nmtb:name";

/// Address path of an L3 subnet in a summary subject
pub const SUBNET_ADDRESS_PATH: &str = "nmtl3:network/nmtl3:subnet/nmtl3:address";

const SUMMARY_URI: &str =
    "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/lookup/summarization/2.0/";

const STORE: &str = "/nmwg:store[@type=\"LSStore\"]";

fn prolog(prefixes: &[&str]) -> String {
    prefixes
        .iter()
        .map(|prefix| {
            let uri = match *prefix {
                "nmwg" => NMWG.uri,
                "summary" => SUMMARY_URI,
                "perfsonar" => "http://ggf.org/ns/nmwg/tools/org/perfsonar/1.0/",
                "psservice" => "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/1.0/",
                "nmtb" => TOPOLOGY.uri,
                "nmtl3" => "http://ogf.org/schema/network/topology/l3/20070828/",
                _ => "http://ggf.org/ns/nmwg/tools/org/dcn/1.0/",
            };
            format!("declare namespace {prefix}=\"{uri}\";\n")
        })
        .collect()
}

/// Escape a value for use inside a double-quoted XQuery string literal
fn literal(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// Access points of every service whose summary matches `condition`
fn access_point_query(event_type: &str, condition: &str) -> String {
    format!(
        "{prolog}for $metadata in {STORE}/nmwg:metadata\n    \
         let $metadata_id := $metadata/@id\n    \
         let $data := {STORE}/nmwg:data[@metadataIdRef=$metadata_id]\n    \
         where $data/nmwg:metadata/nmwg:eventType[text()=\"{event_type}\"] and {condition}\n    \
         return $metadata/perfsonar:subject/psservice:service/psservice:accessPoint\n",
        prolog = prolog(&["nmwg", "summary", "perfsonar", "psservice", "nmtb"]),
    )
}

/// Global query for the home services summarizing topology of a DNS domain
#[must_use]
pub fn global_domain_query(domain_name: &str) -> String {
    access_point_query(
        TOPOLOGY_EVENT_TYPE,
        &format!(
            "$data/nmwg:metadata/summary:subject/{DOMAIN_NAME_PATH}[@type=\"dns\" and text()=\"{}\"]",
            literal(domain_name)
        ),
    )
}

/// Home query for the topology services holding a domain identifier
#[must_use]
pub fn home_domain_query(domain_id: &str) -> String {
    access_point_query(
        TOPOLOGY_EVENT_TYPE,
        &format!(
            "$data/nmwg:metadata/*[local-name()=\"subject\"]/*[local-name()=\"domain\" and @id=\"{}\"]",
            literal(domain_id)
        ),
    )
}

/// Global query for the home services of IDCs summarizing `value` at
/// `address_path` with the given type attribute
#[must_use]
pub fn discovery_query(address_path: &str, address_type: &str, value: &str) -> String {
    access_point_query(
        OSCARS_EVENT_TYPE,
        &format!(
            "$data/nmwg:metadata/summary:subject/{address_path}[@type=\"{}\" and text()=\"{}\"]",
            literal(address_type),
            literal(value)
        ),
    )
}

/// Query for the link identifier registered for a host name
#[must_use]
pub fn host_query(hostname: &str) -> String {
    format!(
        "{prolog}{STORE}/nmwg:data/nmwg:metadata/*[local-name()=\"subject\"]/nmtb:node/nmtb:relation/nmtb:linkIdRef/text()[../../../nmtb:address[text()=\"{}\"]]\n",
        literal(hostname),
        prolog = prolog(&["nmwg", "nmtb"]),
    )
}

/// Query for the node with `address` at `address_path`
#[must_use]
pub fn node_query(address_path: &str, address: &str) -> String {
    format!(
        "{prolog}{STORE}/nmwg:metadata/*[local-name()=\"subject\"]/nmtb:node[./{address_path}[text()=\"{}\"]]\n",
        literal(address),
        prolog = prolog(&["nmwg", "nmtb", "nmtl3"]),
    )
}

/// Query for services of `service_type` with `relation` to `id`.
///
/// `extra_where` is appended after the relation condition and
/// `result_path` after the returned service.
#[must_use]
pub fn service_relation_query(
    service_type: &str,
    id: &str,
    relation: &str,
    extra_where: &str,
    result_path: &str,
) -> String {
    let id_type = if id.starts_with("urn:ogf:network") {
        "idRef"
    } else {
        "address"
    };
    let subject = "$metadata/*[local-name()=\"subject\"]/nmtb:service";
    format!(
        "{prolog}for $metadata in {STORE}/nmwg:metadata\n    \
         where ({subject}/nmtb:type[text()=\"{}\"] and {subject}/nmtb:relation[@type=\"{}\"]/nmtb:{id_type}[text()=\"{}\"]){extra_where}\n    \
         return {subject}{result_path}\n",
        literal(service_type),
        literal(relation),
        literal(id),
        prolog = prolog(&["nmwg", "nmtb", "dcn"]),
    )
}

/// Extra condition matching IDC ports at `address` that accept
/// WS-Notification subscriptions
#[must_use]
pub fn supported_message_where(address: &str) -> String {
    format!(
        " or $metadata/*[local-name()=\"subject\"]/nmtb:service[nmtb:type[text()=\"IDC\"]]\
         /nmtb:port[nmtb:address[text()=\"{}\"]]/nmtb:protocol/nmtb:parameters\
         /nmtb:parameter[@name=\"{PARAM_SUPPORTED_MSG}\" and text()=\"{PROTO_WSN}#Subscribe\"]",
        literal(address)
    )
}

/// A metadata element with a fresh identifier and no subject
#[must_use]
pub fn empty_metadata() -> Element {
    Element::in_ns("metadata", NMWG).with_attr("id", unique_id("meta"))
}

/// Metadata carrying `query` as an XQuery subject
#[must_use]
pub fn query_metadata(query: &str) -> Element {
    let subject = Element::in_ns("subject", XQUERY)
        .with_attr("id", unique_id("subj"))
        .with_text(query);
    let parameters = Element::in_ns("parameters", XQUERY)
        .with_attr("id", unique_id("params"))
        .with_child(
            Element::in_ns("parameter", NMWG)
                .with_attr("name", "lsOutput")
                .with_text("native"),
        );

    empty_metadata()
        .with_child(subject)
        .with_child(Element::in_ns("eventType", NMWG).with_text(XQUERY_EVENT_TYPE))
        .with_child(parameters)
}

/// `metadata` followed by a data element referencing it and holding `data`
#[must_use]
pub fn request_pair(metadata: Element, data: Vec<Element>) -> Vec<Element> {
    let mut data_element = Element::in_ns("data", NMWG)
        .with_attr("metadataIdRef", metadata.attr("id").unwrap_or_default())
        .with_attr("id", unique_id("data"));
    for child in data {
        data_element.push(child);
    }
    vec![metadata, data_element]
}

/// Body of a lookup query for `query`
#[must_use]
pub fn query_body(query: &str) -> Vec<Element> {
    request_pair(query_metadata(query), Vec::new())
}

fn topology_metadata() -> Element {
    empty_metadata().with_child(Element::in_ns("eventType", NMWG).with_text(TOPOLOGY_EVENT_TYPE))
}

/// Topology-service request for the element with identifier `domain_id`
#[must_use]
pub fn topology_query(domain_id: &str) -> RequestEnvelope {
    let subject = Element::in_ns("subject", XPATH_SUBJECT)
        .with_attr("id", unique_id("subj"))
        .with_text(format!("//*[@id=\"{domain_id}\"]"));
    let mut metadata = topology_metadata();
    metadata.insert(0, subject);

    RequestEnvelope::new(MessageKind::TopologyQuery).with_body(request_pair(metadata, Vec::new()))
}

/// Topology-service request for its whole topology
#[must_use]
pub fn topology_fetch_all() -> RequestEnvelope {
    RequestEnvelope::new(MessageKind::TopologyQuery)
        .with_body(request_pair(topology_metadata(), Vec::new()))
}

/// Topology-service request adding or replacing `domain`
#[must_use]
pub fn topology_replace(domain: Element) -> RequestEnvelope {
    let topology = Element::in_ns("topology", TOPOLOGY).with_child(domain);
    RequestEnvelope::new(MessageKind::TopologyReplace)
        .with_body(request_pair(topology_metadata(), vec![topology]))
}
