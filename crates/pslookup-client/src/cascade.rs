//! Sequential search across a list of lookup services.

use crate::channel::MessageChannel;
use crate::envelope::ResponseEnvelope;
use crate::lookup::LookupClient;
use pslookup_core::event::QUERY_SUCCESS;
use pslookup_core::namespace::PS_SERVICE;
use pslookup_core::{Element, LookupError, Result};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Query each of `candidates` in order and collect the access points they
/// return.
///
/// Unless `try_all` is set the search stops at the first candidate that
/// answers successfully with at least one access point. Access points are
/// returned in first-seen order without duplicates. When nothing is found
/// the error carries one `"{endpoint}: {failure}"` entry per failed
/// candidate.
pub async fn find_services(
    channel: &MessageChannel,
    candidates: &[String],
    try_all: bool,
    body: &[Element],
) -> Result<Vec<String>> {
    let mut found: Vec<String> = Vec::new();
    let mut log = String::new();

    for endpoint in candidates {
        let client = LookupClient::new(endpoint.as_str(), channel.clone());
        let response = client.query(body.to_vec()).await;

        match response.and_then(|response| access_points(response.as_ref())) {
            Ok(points) => {
                debug!(endpoint = %endpoint, count = points.len(), "lookup service answered");
                let answered = !points.is_empty();
                for point in points {
                    if !found.contains(&point) {
                        found.push(point);
                    }
                }
                if answered && !try_all {
                    break;
                }
            }
            Err(err) => {
                if let LookupError::Remote { event_type, reason } = &err {
                    warn!(endpoint = %endpoint, event_type = %event_type, reason = %reason, "lookup error");
                } else {
                    debug!(endpoint = %endpoint, error = %err, "lookup service failed");
                }
                let _ = write!(log, "{endpoint}: {err}\n\n");
            }
        }
    }

    if found.is_empty() {
        return Err(LookupError::NoServicesFound { log });
    }
    Ok(found)
}

/// Access points in a successful discovery response
fn access_points(response: Option<&ResponseEnvelope>) -> Result<Vec<String>> {
    let response =
        response.ok_or_else(|| LookupError::Protocol("no message in discovery response".into()))?;
    response.expect_status(QUERY_SUCCESS)?;

    let datum = response.datum(PS_SERVICE).ok_or_else(|| {
        LookupError::Protocol("no service datum returned from discovery request".into())
    })?;
    Ok(datum
        .children_named("accessPoint", PS_SERVICE)
        .map(Element::text_trim)
        .filter(|point| !point.is_empty())
        .collect())
}

/// Merge discovered services with configured ones, keeping order and
/// dropping duplicates
pub fn with_backups(discovered: Vec<String>, configured: &[String]) -> Vec<String> {
    let mut merged = discovered;
    for endpoint in configured {
        if !merged.contains(endpoint) {
            merged.push(endpoint.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backups_follow_discoveries() {
        let merged = with_backups(
            vec!["http://a".into(), "http://b".into()],
            &["http://b".into(), "http://c".into()],
        );
        assert_eq!(merged, ["http://a", "http://b", "http://c"]);
    }

    #[test]
    fn missing_message_is_protocol_error() {
        assert!(matches!(access_points(None), Err(LookupError::Protocol(_))));
    }
}
