mod common;

use common::*;
use pslookup_client::{HttpTransport, LookupError, MessageChannel, RequestEnvelope};
use pslookup_core::MessageKind;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel(timeout: Duration) -> MessageChannel {
    let transport = HttpTransport::new(timeout, "pslookup-tests").unwrap();
    MessageChannel::new(Arc::new(transport)).with_hop_timeout(timeout)
}

#[tokio::test]
async fn posts_soap_wrapped_xml() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ls"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<SOAP-ENV:Body>"))
        .and(body_string_contains(r#"type="LSQueryRequest""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(access_points(&["https://hls"])))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = RequestEnvelope::new(MessageKind::Query);
    let response = assert_ok!(
        channel(Duration::from_secs(5))
            .send_envelope(&endpoint(&server, "/ls"), &envelope)
            .await
    );
    let response = response.unwrap();
    assert_eq!(response.kind(), "LSQueryResponse");
    assert_eq!(response.event_type().unwrap(), "success.ls.query");
}

#[tokio::test]
async fn server_error_is_transport_class() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = channel(Duration::from_secs(5))
        .send(&server.uri(), "<q/>")
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Status { code: 500 }));
    assert!(err.is_hop_failure());
}

#[tokio::test]
async fn malformed_body_is_xml_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<unclosed><a></unclosed>"))
        .mount(&server)
        .await;

    let err = channel(Duration::from_secs(5))
        .send(&server.uri(), "<q/>")
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Xml(_)));
}

#[tokio::test]
async fn slow_hop_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(access_points(&[]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = channel(Duration::from_millis(200))
        .send(&server.uri(), "<q/>")
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn deeply_nested_response_is_xml_error() {
    let depth = 200_000;
    let nested = format!("{}{}", "<x>".repeat(depth), "</x>".repeat(depth));
    let server = MockServer::start().await;
    answer(&server, "/ls", query_datum(&nested), 1).await;

    let err = channel(Duration::from_secs(5))
        .send(&endpoint(&server, "/ls"), "<q/>")
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Xml(_)));
}
