//! Core types for the perfSONAR lookup service client.
//!
//! This crate provides the foundational types shared by the client crates:
//!
//! - **Documents**: a namespace-aware [`Element`] tree for lookup messages
//! - **Identifiers**: parsing of `urn:ogf:network:` topology identifiers
//! - **Registrations**: builders for node and service subjects
//! - **Errors**: one error taxonomy, [`LookupError`]
//!
//! # Example
//!
//! ```rust
//! use pslookup_core::{Identifier, IdentifierKind};
//!
//! let id = Identifier::parse("urn:ogf:network:domain=es.net:node=chic-cr1");
//! assert_eq!(id.kind, IdentifierKind::Node);
//! assert_eq!(id.compact().as_deref(), Some("urn:ogf:network:es.net:chic-cr1"));
//! ```

#![doc(html_root_url = "https://docs.rs/pslookup-core/0.3.0")]

mod error;
pub mod types;

pub use error::{LookupError, Result};
pub use types::*;
