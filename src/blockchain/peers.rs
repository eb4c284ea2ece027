use std::collections::HashSet;

use reqwest::Url;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("address {0:?} has no host:port authority")]
    MalformedAddress(String),
}

/// Deduplicated set of known peer endpoints, stored as their normalized
/// `host:port` authority. Entries never expire.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    nodes: HashSet<String>,
}

impl PeerSet {
    pub fn new() -> PeerSet {
        PeerSet::default()
    }

    /// Register a peer by URI or bare `host:port`. Returns whether the peer
    /// was newly added; re-registering a known peer is a no-op. Addresses
    /// that yield no host are rejected.
    pub fn register(&mut self, address: &str) -> Result<bool, PeerError> {
        let authority = normalize(address)?;
        Ok(self.nodes.insert(authority))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.nodes.contains(authority)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Reduce an address to its `host:port` authority. Bare `host:port` input is
/// parsed as if it carried an `http://` scheme; a missing port falls back to
/// the scheme's default.
fn normalize(address: &str) -> Result<String, PeerError> {
    let malformed = || PeerError::MalformedAddress(address.to_string());

    let parsed = match Url::parse(address) {
        Ok(url) if url.host_str().is_some() => url,
        _ => Url::parse(&format!("http://{address}")).map_err(|_| malformed())?,
    };

    let host = parsed.host_str().ok_or_else(malformed)?;
    match parsed.port_or_known_default() {
        Some(port) => Ok(format!("{host}:{port}")),
        None => Ok(host.to_string()),
    }
}
