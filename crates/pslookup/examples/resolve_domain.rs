//! Resolve a domain topology through the global lookup services.
//!
//! Run with: cargo run --example resolve_domain -- urn:ogf:network:domain=es.net
//!
//! The global services are read from the root hints file unless
//! PSLOOKUP_GLOBAL is set to a comma-separated list of endpoints.

use pslookup::{DirectoryClient, Identifier, LookupError, ResolverConfig, Result, DEFAULT_HINTS_URL};

#[tokio::main]
async fn main() -> Result<()> {
    let domain = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "urn:ogf:network:domain=es.net".to_string());

    let id = Identifier::parse(&domain);
    let Some(canonical) = id.fully_qualified() else {
        return Err(LookupError::Config(format!("{domain} is not a topology identifier")));
    };
    println!("Identifier: {canonical} ({})", id.kind);

    let client = DirectoryClient::new(ResolverConfig::new().try_all_global(true))?;

    // Seed the global services
    match std::env::var("PSLOOKUP_GLOBAL") {
        Ok(list) => client.update_config(|config| {
            config.global_endpoints = list.split(',').map(|s| s.trim().to_string()).collect();
        }),
        Err(_) => {
            let hints = client.bootstrap_global_hints(DEFAULT_HINTS_URL, true).await?;
            println!("Global services: {}", hints.len());
        }
    }

    if let Some(name) = id.domain.as_deref() {
        let homes = client.discovery().topology_homes(name).await;
        println!("Home services for {name}:");
        for home in &homes {
            println!("  - {home}");
        }
    }

    match client.topology().resolve(&canonical, None).await? {
        Some(topology) => {
            let nodes = topology
                .children_local("domain")
                .flat_map(|domain| domain.children_local("node"))
                .count();
            println!("Topology found with {nodes} nodes");
        }
        None => println!("No topology service knows {canonical}"),
    }

    Ok(())
}
