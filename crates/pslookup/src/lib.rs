//! Async Rust client for federated perfSONAR lookup services.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pslookup::{DirectoryClient, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> pslookup::Result<()> {
//!     let client = DirectoryClient::new(
//!         ResolverConfig::new()
//!             .global_endpoints(["http://gls.example.net:9995/perfSONAR_PS/services/gLS"])
//!             .home_endpoints(["http://hls.example.net:9995/perfSONAR_PS/services/hLS"]),
//!     )?;
//!
//!     // Map a host name to its topology identifier
//!     let urn = client.hosts().resolve("chic-cr1.es.net").await?;
//!     println!("{urn}");
//!
//!     // Fetch a domain's topology
//!     let topology = client
//!         .topology()
//!         .resolve("urn:ogf:network:domain=es.net", None)
//!         .await?;
//!     println!("found: {}", topology.is_some());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/pslookup/0.3.0")]

// Re-export core types
pub use pslookup_core::*;

// Re-export client
pub use pslookup_client::api;
pub use pslookup_client::query;
pub use pslookup_client::{
    fetch_global_hints, CacheTtls, DirectoryClient, DirectoryClientBuilder, HttpTransport,
    LookupClient, MessageChannel, RequestEnvelope, ResolverConfig, ResponseEnvelope, Transport,
    TransportResponse, DEFAULT_HINTS_URL,
};

// Re-export runtime for convenience
pub use serde;
pub use tokio;
