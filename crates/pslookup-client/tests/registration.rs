mod common;

use common::*;
use pslookup_client::api::UpdateKeys;
use pslookup_client::{LookupError, ResolverConfig};
use pslookup_core::{NodeRegistration, ServiceRegistration, IDC_TYPE};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node() -> NodeRegistration {
    let mut node = NodeRegistration::new("urn:ogf:network:domain=es.net:node=chic-cr1");
    node.set_name("chic-cr1.es.net", "dns");
    node
}

#[tokio::test]
async fn abort_keeps_keys_from_earlier_homes() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls1",
        keyed("LSRegisterResponse", "success.ls.register", "key-1"),
        1,
    )
    .await;
    answer(
        &server,
        "/hls2",
        lookup_error("LSRegisterResponse", "error.ls.register.denied", "not authorized"),
        1,
    )
    .await;
    answer(
        &server,
        "/hls3",
        keyed("LSRegisterResponse", "success.ls.register", "key-3"),
        0,
    )
    .await;

    let hls1 = endpoint(&server, "/hls1");
    let hls2 = endpoint(&server, "/hls2");
    let client = client(ResolverConfig::new().home_endpoints([
        hls1.clone(),
        hls2.clone(),
        endpoint(&server, "/hls3"),
    ]));

    let mut keys = UpdateKeys::new();
    let err = client
        .registration()
        .register_node(node(), &mut keys)
        .await
        .unwrap_err();

    let LookupError::Registration { endpoint, .. } = &err else {
        panic!("expected Registration, got {err:?}");
    };
    assert_eq!(endpoint, &hls2);
    assert_eq!(err.event_type(), Some("error.ls.register.denied"));
    assert!(err.to_string().contains("not authorized"));
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[&hls1], "key-1");
}

async fn key_not_found_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hls"))
        .and(body_string_contains("lsKey"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lookup_error(
            "LSRegisterResponse",
            "error.ls.register.key_not_found",
            "key expired",
        )))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn key_not_found_retries_without_key() {
    let server = key_not_found_server().await;
    answer(
        &server,
        "/hls",
        keyed("LSRegisterResponse", "success.ls.register", "fresh-key"),
        1,
    )
    .await;

    let hls = endpoint(&server, "/hls");
    let client = client(
        ResolverConfig::new()
            .home_endpoints([hls.clone()])
            .retry_on_key_not_found(true),
    );

    let mut keys = UpdateKeys::from([(hls.clone(), "stale-key".to_string())]);
    assert_ok!(client.registration().register_node(node(), &mut keys).await);
    assert_eq!(keys[&hls], "fresh-key");
}

#[tokio::test]
async fn key_not_found_without_retry_aborts() {
    let server = key_not_found_server().await;
    answer(
        &server,
        "/hls",
        keyed("LSRegisterResponse", "success.ls.register", "fresh-key"),
        0,
    )
    .await;

    let hls = endpoint(&server, "/hls");
    let client = client(ResolverConfig::new().home_endpoints([hls.clone()]));

    let mut keys = UpdateKeys::from([(hls.clone(), "stale-key".to_string())]);
    let err = assert_err!(client.registration().register_node(node(), &mut keys).await);
    assert_eq!(err.event_type(), Some("error.ls.register.key_not_found"));
    assert!(err.to_string().contains("key expired"));
    assert_eq!(keys[&hls], "stale-key");
}

#[tokio::test]
async fn success_without_key_is_protocol_error() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls",
        message("LSRegisterResponse", &event("success.ls.register"), ""),
        1,
    )
    .await;

    let client = client(ResolverConfig::new().home_endpoints([endpoint(&server, "/hls")]));
    let mut keys = UpdateKeys::new();
    let err = assert_err!(
        client
            .registration()
            .register_service(ServiceRegistration::new("OSCARS", IDC_TYPE), &mut keys)
            .await
    );
    let LookupError::Registration { source, .. } = err else {
        panic!("expected Registration");
    };
    assert!(matches!(*source, LookupError::Protocol(_)));
}

#[tokio::test]
async fn no_home_services_is_config_error() {
    let client = client(ResolverConfig::new());
    let mut keys = UpdateKeys::new();
    let err = assert_err!(client.registration().register_node(node(), &mut keys).await);
    assert!(matches!(err, LookupError::Config(_)));
}

#[tokio::test]
async fn keepalive_refreshes_and_registers_missing() {
    let server = MockServer::start().await;
    answer(
        &server,
        "/hls1",
        message("LSKeepaliveResponse", &event("success.ls.keepalive"), ""),
        1,
    )
    .await;
    answer(
        &server,
        "/hls2",
        keyed("LSRegisterResponse", "success.ls.register", "key-2"),
        1,
    )
    .await;

    let hls1 = endpoint(&server, "/hls1");
    let hls2 = endpoint(&server, "/hls2");
    let client = client(ResolverConfig::new().home_endpoints([hls1.clone(), hls2.clone()]));

    let subject = pslookup_core::Element::in_ns("subject", pslookup_core::namespace::DCN);
    let mut keys = UpdateKeys::from([(hls1.clone(), "key-1".to_string())]);
    assert_ok!(client.registration().keepalive(subject, &mut keys).await);
    assert_eq!(keys[&hls1], "key-1");
    assert_eq!(keys[&hls2], "key-2");
}

#[tokio::test]
async fn keepalive_key_not_found_reregisters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hls"))
        .and(body_string_contains("LSKeepaliveRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lookup_error(
            "LSKeepaliveResponse",
            "error.ls.keepalive.key_not_found",
            "unknown key",
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hls"))
        .and(body_string_contains("LSRegisterRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(keyed(
            "LSRegisterResponse",
            "success.ls.register",
            "new-key",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let hls = endpoint(&server, "/hls");
    let client = client(
        ResolverConfig::new()
            .home_endpoints([hls.clone()])
            .retry_on_key_not_found(true),
    );

    let subject = pslookup_core::Element::in_ns("subject", pslookup_core::namespace::DCN)
        .with_child(node().into_element());
    let mut keys = UpdateKeys::from([(hls.clone(), "old-key".to_string())]);
    assert_ok!(client.registration().keepalive(subject, &mut keys).await);
    assert_eq!(keys[&hls], "new-key");
}

#[tokio::test]
async fn deregister_keys_removes_withdrawn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hls"))
        .and(body_string_contains("LSDeregisterRequest"))
        .and(body_string_contains("key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(message(
            "LSDeregisterResponse",
            &event("success.ls.deregister"),
            "",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let hls = endpoint(&server, "/hls");
    let client = client(ResolverConfig::new().home_endpoints([hls.clone()]));

    let mut keys = UpdateKeys::from([(hls.clone(), "key-1".to_string())]);
    assert_ok!(client.registration().deregister_keys(&mut keys).await);
    assert!(keys.is_empty());
}
