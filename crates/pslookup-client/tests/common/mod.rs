//! Canned lookup-service responses for the integration tests.

#![allow(dead_code)]

use pslookup_client::{DirectoryClient, ResolverConfig};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NAMESPACES: &str = concat!(
    r#"xmlns:nmwg="http://ggf.org/ns/nmwg/base/2.0/" "#,
    r#"xmlns:nmwgr="http://ggf.org/ns/nmwg/result/2.0/" "#,
    r#"xmlns:psservice="http://ggf.org/ns/nmwg/tools/org/perfsonar/service/1.0/" "#,
    r#"xmlns:nmtopo="http://ogf.org/schema/network/topology/base/20070828/""#,
);

/// A SOAP response carrying one message with one metadata/data pair
pub fn message(kind: &str, metadata: &str, data: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <nmwg:message {NAMESPACES} type="{kind}" id="response">
      <nmwg:metadata id="meta-1">{metadata}</nmwg:metadata>
      <nmwg:data id="data-1" metadataIdRef="meta-1">{data}</nmwg:data>
    </nmwg:message>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#
    )
}

pub fn event(event_type: &str) -> String {
    format!("<nmwg:eventType>{event_type}</nmwg:eventType>")
}

/// Successful discovery listing `access_points`
pub fn access_points(access_points: &[&str]) -> String {
    let points: String = access_points
        .iter()
        .map(|point| format!("<psservice:accessPoint>{point}</psservice:accessPoint>"))
        .collect();
    message(
        "LSQueryResponse",
        &event("success.ls.query"),
        &format!("<psservice:datum>{points}</psservice:datum>"),
    )
}

/// Successful query whose service datum holds `content`
pub fn query_datum(content: &str) -> String {
    message(
        "LSQueryResponse",
        &event("success.ls.query"),
        &format!("<psservice:datum>{content}</psservice:datum>"),
    )
}

/// An `error.ls*` response with `reason`
pub fn lookup_error(kind: &str, event_type: &str, reason: &str) -> String {
    message(
        kind,
        &event(event_type),
        &format!("<nmwgr:datum>{reason}</nmwgr:datum>"),
    )
}

/// A registration-style response carrying `key`
pub fn keyed(kind: &str, event_type: &str, key: &str) -> String {
    let key = format!(
        r#"<nmwg:key><nmwg:parameters id="p"><nmwg:parameter name="lsKey">{key}</nmwg:parameter></nmwg:parameters></nmwg:key>"#
    );
    message(kind, &format!("{key}{}", event(event_type)), "")
}

/// Mount a POST mock on `route` answering `body`, expected `times` times
pub async fn answer(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

pub fn endpoint(server: &MockServer, route: &str) -> String {
    format!("{}{route}", server.uri())
}

pub fn client(config: ResolverConfig) -> DirectoryClient {
    DirectoryClient::builder()
        .timeout(Duration::from_secs(5))
        .config(config)
        .build()
        .unwrap()
}
