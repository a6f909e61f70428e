//! Async client for a federation of perfSONAR lookup services.
//!
//! [`DirectoryClient`] discovers home lookup services through the global
//! ones, resolves topologies, hosts and services through them, and keeps
//! registrations alive on the configured home services. Outcomes are cached
//! with separate lifetimes for successes and failures.
//!
//! # Example
//!
//! ```no_run
//! use pslookup_client::{DirectoryClient, ResolverConfig};
//!
//! # async fn example() -> pslookup_client::Result<()> {
//! let client = DirectoryClient::new(
//!     ResolverConfig::new().global_endpoints(["http://gls.example.net:9995/perfSONAR_PS/services/gLS"]),
//! )?;
//! let urn = client.hosts().resolve("chic-cr1.es.net").await?;
//! println!("{urn}");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/pslookup-client/0.3.0")]

pub mod api;
mod cache;
mod cascade;
mod channel;
mod client;
mod config;
mod correlate;
mod envelope;
mod hints;
mod lookup;
pub mod query;
mod transport;

pub use cache::{CacheEntry, CachePolicy, ResolutionCache};
pub use cascade::{find_services, with_backups};
pub use channel::{soap_wrap, MessageChannel};
pub use client::{DirectoryClient, DirectoryClientBuilder};
pub use config::{CacheTtls, ResolverConfig};
pub use correlate::{correlate, MetadataDataPair};
pub use envelope::{unique_id, RequestEnvelope, ResponseEnvelope};
pub use hints::{fetch_global_hints, DEFAULT_HINTS_URL};
pub use lookup::LookupClient;
pub use pslookup_core::{LookupError, Result};
pub use transport::{HttpTransport, Transport, TransportResponse};
