//! Bootstrap list of global lookup services.

use crate::transport::Transport;
use pslookup_core::{LookupError, Result};
use rand::seq::SliceRandom;
use tracing::debug;

/// Well-known location of the root hints file
pub const DEFAULT_HINTS_URL: &str = "http://www.perfsonar.net/gls.root.hints";

/// Fetch the newline-separated list of global services at `url`.
///
/// Blank lines are dropped. With `shuffle` set the list is returned in
/// uniformly random order so load spreads across the global services.
pub async fn fetch_global_hints(
    transport: &dyn Transport,
    url: &str,
    shuffle: bool,
) -> Result<Vec<String>> {
    let response = transport.post(url, String::new()).await?;
    if response.status != 200 {
        return Err(LookupError::Status {
            code: response.status,
        });
    }

    let mut hints = parse_hints(&response.body);
    if shuffle {
        hints.shuffle(&mut rand::thread_rng());
    }
    debug!(url = %url, count = hints.len(), "fetched global hints");
    Ok(hints)
}

fn parse_hints(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
