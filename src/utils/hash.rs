use hex;
use sha2::{Digest, Sha256};

use crate::blockchain::Block;

/// SHA-256 digest of a block's canonical JSON encoding, hex-encoded.
///
/// The block is serialized through `serde_json::Value`, whose object map
/// keeps keys in sorted order, so two structurally identical blocks hash
/// identically regardless of how they were constructed.
pub fn digest(block: &Block) -> String {
    let canonical = serde_json::to_value(block).expect("block serializes to JSON");

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    let result = hasher.finalize();

    hex::encode(result)
}
