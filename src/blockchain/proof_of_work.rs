use hex;
use sha2::{Digest, Sha256};

/// Fixed puzzle difficulty: leading hex zeros required of the guess digest.
const TARGET_PREFIX: &str = "0000";

/// The admission gate for new blocks: find a number whose SHA-256 digest,
/// concatenated with the previous block's proof, starts with four hex zeros.
pub struct ProofOfWork;

impl ProofOfWork {
    /// Find the smallest `proof` for which `verify(last_proof, proof)` holds.
    ///
    /// CPU-bound and blocking; expected ~65536 digests at this difficulty.
    /// There is no upper bound, callers wanting a bounded search must wrap it.
    pub fn search(last_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !Self::verify(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// The puzzle predicate. Pure and stateless, used both to terminate the
    /// search and to re-check every historical pair during chain validation.
    pub fn verify(last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");

        let mut hasher = Sha256::new();
        hasher.update(guess.as_bytes());
        let guess_hash = hex::encode(hasher.finalize());

        guess_hash.starts_with(TARGET_PREFIX)
    }
}
