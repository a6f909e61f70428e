mod common;

use chrono::{TimeDelta, Utc};
use common::*;
use pslookup_client::{CacheEntry, DirectoryClient, LookupError, ResolverConfig};
use pslookup_core::namespace::TOPOLOGY;
use pslookup_core::Element;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPOLOGY_EVENT: &str = "http://ggf.org/ns/nmwg/topology/20070809";
const DOMAIN: &str = "urn:ogf:network:domain=es.net";

fn topology_response() -> String {
    message(
        "QueryResponse",
        &event(TOPOLOGY_EVENT),
        r#"<nmtopo:topology>
             <nmtopo:domain id="urn:ogf:network:domain=es.net"><nmtopo:node id="n1"/></nmtopo:domain>
             <nmtopo:domain id="urn:ogf:network:domain=other.net"/>
           </nmtopo:topology>"#,
    )
}

#[tokio::test]
async fn host_is_served_from_cache_the_second_time() {
    let server = MockServer::start().await;
    answer(&server, "/gls", access_points(&[endpoint(&server, "/hls").as_str()]), 1).await;
    answer(
        &server,
        "/hls",
        query_datum("urn:ogf:network:domain=es.net:node=chic-cr1:port=xe-0:link=l1"),
        1,
    )
    .await;

    let client = client(ResolverConfig::new().global_endpoints([endpoint(&server, "/gls")]));
    let hosts = client.hosts();

    let first = assert_ok!(hosts.resolve("chic-cr1.es.net").await);
    let second = assert_ok!(hosts.resolve("chic-cr1.es.net").await);
    assert_eq!(first, "urn:ogf:network:domain=es.net:node=chic-cr1:port=xe-0:link=l1");
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_host_is_not_found() {
    let server = MockServer::start().await;
    answer(&server, "/hls", query_datum(""), 1).await;

    let client = client(
        ResolverConfig::new()
            .home_endpoints([endpoint(&server, "/hls")])
            .use_global_discovery(false),
    );

    let err = client.hosts().resolve("nowhere.example.net").await.unwrap_err();
    assert!(matches!(err, LookupError::NotFound(ref what) if what.contains("example.net")));
}

#[tokio::test]
async fn node_by_address() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls",
        query_datum(r#"<nmtopo:node id="urn:ogf:network:domain=es.net:node=n1"/>"#),
        1,
    )
    .await;

    let client = client(
        ResolverConfig::new()
            .home_endpoints([endpoint(&server, "/hls")])
            .use_global_discovery(false),
    );

    let node = client.hosts().node("198.51.100.7").await.unwrap().unwrap();
    assert!(node.is("node", TOPOLOGY));
    assert_eq!(node.attr("id"), Some("urn:ogf:network:domain=es.net:node=n1"));
}

#[tokio::test]
async fn topology_is_restricted_and_cached() {
    let server = MockServer::start().await;
    answer(&server, "/ts", topology_response(), 1).await;

    let client = client(ResolverConfig::new().topology_endpoints([endpoint(&server, "/ts")]));
    let topology = client.topology();

    let first = topology.resolve(DOMAIN, None).await.unwrap().unwrap();
    let domains: Vec<&Element> = first.children_local("domain").collect();
    assert_eq!(domains.len(), 1);
    assert_eq!(domains[0].attr("id"), Some(DOMAIN));

    let second = topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap();
    assert_eq!(second.as_ref(), Some(&first));
}

#[tokio::test]
async fn topology_found_through_home_services() {
    let server = MockServer::start().await;
    answer(&server, "/hls", access_points(&[endpoint(&server, "/ts").as_str()]), 1).await;
    answer(&server, "/ts", topology_response(), 1).await;

    let client = client(ResolverConfig::new().home_endpoints([endpoint(&server, "/hls")]));

    let found = client.topology().resolve(DOMAIN, None).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn failed_topology_is_cached_when_namespace_given() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ts"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(ResolverConfig::new().topology_endpoints([endpoint(&server, "/ts")]));
    let topology = client.topology();

    assert!(topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap().is_none());
    assert!(topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap().is_none());
}

fn stale_topology() -> Element {
    Element::in_ns("topology", TOPOLOGY).with_child(
        Element::in_ns("domain", TOPOLOGY)
            .with_attr("id", DOMAIN)
            .with_child(Element::in_ns("node", TOPOLOGY).with_attr("id", "stale")),
    )
}

/// Seed the topology cache with an entry retrieved `age_secs` ago
fn seed_aged(client: &DirectoryClient, bound: Option<&str>, age_secs: i64) {
    let mut entry = CacheEntry::new(DOMAIN, Some(TOPOLOGY.uri), bound, Some(stale_topology()));
    entry.retrieved_at = Utc::now() - TimeDelta::seconds(age_secs);
    client.topology_cache().put(entry);
}

fn node_ids(topology: &Element) -> Vec<String> {
    topology
        .children_local("domain")
        .flat_map(|domain| domain.children_local("node"))
        .filter_map(|node| node.attr("id").map(String::from))
        .collect()
}

#[tokio::test]
async fn expired_entry_is_revalidated_at_bound_endpoint() {
    let server = MockServer::start().await;
    answer(&server, "/bound", topology_response(), 1).await;
    answer(&server, "/ts", topology_response(), 0).await;

    let bound = endpoint(&server, "/bound");
    let client = client(ResolverConfig::new().topology_endpoints([endpoint(&server, "/ts")]));
    seed_aged(&client, Some(bound.as_str()), 4000);

    let topology = client.topology();
    let refreshed = topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap().unwrap();
    assert_eq!(node_ids(&refreshed), ["n1"]);

    let entry = client.topology_cache().get(DOMAIN, Some(TOPOLOGY.uri)).unwrap();
    assert_eq!(entry.endpoint.as_deref(), Some(bound.as_str()));
    assert!(entry.age_at(Utc::now()) < std::time::Duration::from_secs(60));

    // served from the refreshed entry without another query
    let again = topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap();
    assert_eq!(again.as_ref(), Some(&refreshed));
}

#[tokio::test]
async fn expired_unbound_entry_is_resolved_again() {
    let server = MockServer::start().await;
    answer(&server, "/ts", topology_response(), 1).await;

    let client = client(ResolverConfig::new().topology_endpoints([endpoint(&server, "/ts")]));
    seed_aged(&client, None, 4000);

    let topology = client.topology();
    let resolved = topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap().unwrap();
    assert_eq!(node_ids(&resolved), ["n1"]);

    let cached = topology.resolve(DOMAIN, Some(TOPOLOGY.uri)).await.unwrap().unwrap();
    assert_eq!(node_ids(&cached), ["n1"]);
}

#[tokio::test]
async fn live_entry_is_served_without_query() {
    let server = MockServer::start().await;
    answer(&server, "/ts", topology_response(), 0).await;

    let client = client(ResolverConfig::new().topology_endpoints([endpoint(&server, "/ts")]));
    seed_aged(&client, None, 3000);

    let cached = client
        .topology()
        .resolve(DOMAIN, Some(TOPOLOGY.uri))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(node_ids(&cached), ["stale"]);
}

#[tokio::test]
async fn disabled_cache_always_queries() {
    let server = MockServer::start().await;
    answer(&server, "/ts", topology_response(), 2).await;

    let client = client(
        ResolverConfig::new()
            .topology_endpoints([endpoint(&server, "/ts")])
            .disable_caching(true),
    );

    assert!(client.topology().resolve(DOMAIN, None).await.unwrap().is_some());
    assert!(client.topology().resolve(DOMAIN, None).await.unwrap().is_some());
}

#[tokio::test]
async fn non_domain_identifier_resolves_to_nothing() {
    let client = client(ResolverConfig::new());
    let found = client
        .topology()
        .resolve("urn:ogf:network:domain=es.net:node=n1", None)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn idc_urls_are_deduplicated() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls",
        query_datum(
            "<nmtopo:address>https://idc.es.net/OSCARS</nmtopo:address>\
             <nmtopo:address> https://idc.es.net/OSCARS </nmtopo:address>",
        ),
        1,
    )
    .await;

    let client = client(
        ResolverConfig::new()
            .home_endpoints([endpoint(&server, "/hls")])
            .use_global_discovery(false),
    );

    let urls = client.services().idc_urls(DOMAIN).await.unwrap();
    assert_eq!(urls, ["https://idc.es.net/OSCARS"]);
}

#[tokio::test]
async fn service_lookup_skips_rejecting_homes() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls1",
        lookup_error("LSQueryResponse", "error.ls.query.empty_results", "none"),
        1,
    )
    .await;
    answer(
        &server,
        "/hls2",
        query_datum(r#"<nmtopo:service id="idc-1"/>"#),
        1,
    )
    .await;

    let client = client(
        ResolverConfig::new()
            .home_endpoints([endpoint(&server, "/hls1"), endpoint(&server, "/hls2")])
            .use_global_discovery(false),
    );

    let idc = client.services().idc(DOMAIN).await.unwrap().unwrap();
    assert_eq!(idc.attr("id"), Some("idc-1"));
}

#[tokio::test]
async fn replace_domain_reports_success() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/ts",
        message("TSReplaceResponse", &event("success.ts.replace"), ""),
        1,
    )
    .await;

    let client = client(ResolverConfig::new());
    let domain = Element::in_ns("domain", TOPOLOGY).with_attr("id", DOMAIN);
    let replaced = client
        .topology_service(endpoint(&server, "/ts"))
        .add_replace_domain(domain)
        .await
        .unwrap();
    assert!(replaced);
}
