//! Registration of subjects with the home lookup services.

use crate::client::within_deadline;
use crate::config::ResolverConfig;
use crate::envelope::{unique_id, ResponseEnvelope};
use crate::lookup::LookupClient;
use crate::query::{empty_metadata, request_pair};
use crate::DirectoryClient;
use pslookup_core::event::{
    DEREGISTER_SUCCESS, KEEPALIVE_KEY_NOT_FOUND, KEEPALIVE_SUCCESS, REGISTER_KEY_NOT_FOUND,
    REGISTER_SUCCESS,
};
use pslookup_core::namespace::DCN;
use pslookup_core::{Element, LookupError, NodeRegistration, Result, ServiceRegistration};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Update keys indexed by home lookup service endpoint
pub type UpdateKeys = HashMap<String, String>;

/// Registration endpoints.
///
/// Every operation walks the configured home lookup services in order and
/// aborts on the first failure. Keys obtained before the failure stay
/// recorded in the caller's [`UpdateKeys`].
pub struct RegistrationApi<'a> {
    client: &'a DirectoryClient,
}

impl<'a> RegistrationApi<'a> {
    pub(crate) const fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// Register a node with every home lookup service
    pub async fn register_node(&self, node: NodeRegistration, keys: &mut UpdateKeys) -> Result<()> {
        let subject = subject_element([node.into_element()]);
        self.register(subject, keys).await
    }

    /// Register a service with every home lookup service
    pub async fn register_service(
        &self,
        service: ServiceRegistration,
        keys: &mut UpdateKeys,
    ) -> Result<()> {
        let subject = subject_element(service.into_elements());
        self.register(subject, keys).await
    }

    /// Register `subject` with every home lookup service.
    ///
    /// A known key for a service is sent along so the service updates the
    /// existing registration. The key each service returns is recorded in
    /// `keys`.
    #[instrument(skip_all)]
    pub async fn register(&self, subject: Element, keys: &mut UpdateKeys) -> Result<()> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), async {
            for home in home_endpoints(&config)? {
                let key = self
                    .register_one(&config, home, &subject, keys.get(home).map(String::as_str))
                    .await
                    .map_err(|err| err.in_registration(home))?;
                debug!(endpoint = %home, "registered");
                keys.insert(home.clone(), key);
            }
            Ok(())
        })
        .await
    }

    /// Refresh the registration of `subject` with every home lookup
    /// service.
    ///
    /// Services without a key get a fresh registration.
    #[instrument(skip_all)]
    pub async fn keepalive(&self, subject: Element, keys: &mut UpdateKeys) -> Result<()> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), async {
            for home in home_endpoints(&config)? {
                let key = match keys.get(home) {
                    Some(key) => self.keepalive_one(&config, home, &subject, key).await,
                    None => self.register_one(&config, home, &subject, None).await,
                }
                .map_err(|err| err.in_registration(home))?;
                keys.insert(home.clone(), key);
            }
            Ok(())
        })
        .await
    }

    /// Withdraw the registration under `key` from every home lookup service
    #[instrument(skip_all)]
    pub async fn deregister(&self, key: &str) -> Result<()> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), async {
            for home in home_endpoints(&config)? {
                self.deregister_one(home, key)
                    .await
                    .map_err(|err| err.in_registration(home))?;
            }
            Ok(())
        })
        .await
    }

    /// Withdraw each recorded key from the service it was issued by.
    ///
    /// Withdrawn keys are removed from `keys`.
    #[instrument(skip_all)]
    pub async fn deregister_keys(&self, keys: &mut UpdateKeys) -> Result<()> {
        let config = self.client.config();
        within_deadline(config.deadline_duration(), async {
            for home in home_endpoints(&config)? {
                let Some(key) = keys.get(home) else {
                    continue;
                };
                self.deregister_one(home, key)
                    .await
                    .map_err(|err| err.in_registration(home))?;
                keys.remove(home);
            }
            Ok(())
        })
        .await
    }

    async fn register_one(
        &self,
        config: &ResolverConfig,
        home: &str,
        subject: &Element,
        key: Option<&str>,
    ) -> Result<String> {
        let client = self.client.lookup(home);
        let mut response = required(client.register(registration_body(subject, key), &[]).await?)?;

        if key.is_some()
            && config.retry_on_key_not_found
            && response.event_type()? == REGISTER_KEY_NOT_FOUND
        {
            warn!(endpoint = %home, "registration key not found, registering without key");
            response = required(client.register(registration_body(subject, None), &[]).await?)?;
        }

        response.expect_status(REGISTER_SUCCESS)?;
        response
            .update_key()
            .ok_or_else(|| LookupError::Protocol("no key in the response".into()))
    }

    async fn keepalive_one(
        &self,
        config: &ResolverConfig,
        home: &str,
        subject: &Element,
        key: &str,
    ) -> Result<String> {
        let client = self.client.lookup(home);
        let metadata = empty_metadata().with_child(LookupClient::key_element(key));
        let response = required(client.keepalive(request_pair(metadata, Vec::new()), &[]).await?)?;

        if config.retry_on_key_not_found && response.event_type()? == KEEPALIVE_KEY_NOT_FOUND {
            warn!(endpoint = %home, "keepalive key not found, registering again");
            return self.register_one(config, home, subject, None).await;
        }

        response.expect_status(KEEPALIVE_SUCCESS)?;
        Ok(response.update_key().unwrap_or_else(|| key.to_string()))
    }

    async fn deregister_one(&self, home: &str, key: &str) -> Result<()> {
        let client = self.client.lookup(home);
        let metadata = empty_metadata().with_child(LookupClient::key_element(key));
        let response = required(client.deregister(request_pair(metadata, Vec::new()), &[]).await?)?;
        response.expect_status(DEREGISTER_SUCCESS)
    }
}

fn home_endpoints(config: &ResolverConfig) -> Result<&[String]> {
    if config.home_endpoints.is_empty() {
        return Err(LookupError::Config(
            "no home lookup services specified".into(),
        ));
    }
    Ok(&config.home_endpoints)
}

fn required(response: Option<ResponseEnvelope>) -> Result<ResponseEnvelope> {
    response.ok_or_else(|| LookupError::Protocol("no message in registration response".into()))
}

/// A `dcn:subject` holding `content`
fn subject_element(content: impl IntoIterator<Item = Element>) -> Element {
    let mut subject = Element::in_ns("subject", DCN).with_attr("id", unique_id("subj"));
    for child in content {
        subject.push(child);
    }
    subject
}

/// Metadata carrying `subject`, preceded by `key` when one is known
fn registration_body(subject: &Element, key: Option<&str>) -> Vec<Element> {
    let mut metadata = empty_metadata();
    if let Some(key) = key {
        metadata.push(LookupClient::key_element(key));
    }
    metadata.push(subject.clone());
    request_pair(metadata, Vec::new())
}
