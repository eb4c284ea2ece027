use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::blockchain::block::Block;
use crate::blockchain::ledger::Ledger;
use crate::blockchain::peers::PeerSet;

/// A peer's view of its chain, the shape served by `GET /chain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Longest-valid-chain rule.
///
/// Fetches every peer's chain through the injected `fetch` capability and
/// keeps the longest candidate that is strictly longer than the running
/// maximum and passes `Ledger::is_valid`. Fetch failures are logged and
/// skipped; one unreachable peer never aborts the rest. Equal-length
/// candidates lose, so the local chain wins all ties.
///
/// The ledger lock is never held across a fetch; the replacement re-checks
/// length under the lock in case the local chain grew in the meantime.
/// Returns whether the local chain was replaced.
pub async fn resolve<F, Fut, E>(ledger: &Mutex<Ledger>, peers: &PeerSet, fetch: F) -> bool
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<ChainSnapshot, E>>,
    E: Display,
{
    let mut max_length = ledger.lock().expect("ledger mutex poisoned").len();
    let mut best: Option<Vec<Block>> = None;

    for peer in peers.iter() {
        let snapshot = match fetch(peer.to_string()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("skipping peer {peer}: {err}");
                continue;
            }
        };

        if snapshot.length > max_length && Ledger::is_valid(&snapshot.chain) {
            max_length = snapshot.length;
            best = Some(snapshot.chain);
        }
    }

    let Some(chain) = best else {
        return false;
    };

    let mut ledger = ledger.lock().expect("ledger mutex poisoned");
    if chain.len() <= ledger.len() {
        return false;
    }
    info!("adopting peer chain of length {}", chain.len());
    ledger.replace_chain(chain);
    true
}
