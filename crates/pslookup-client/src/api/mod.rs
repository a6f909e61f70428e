//! Endpoint groups of a [`DirectoryClient`](crate::DirectoryClient).

mod discovery;
mod host;
mod registration;
mod service;
mod topology;
mod topology_service;

pub use discovery::DiscoveryApi;
pub use host::HostApi;
pub use registration::{RegistrationApi, UpdateKeys};
pub use service::ServiceApi;
pub use topology::TopologyApi;
pub use topology_service::TopologyServiceApi;
