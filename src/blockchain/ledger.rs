use thiserror::Error;

use crate::blockchain::block::{Block, Transaction};
use crate::blockchain::proof_of_work::ProofOfWork;
use crate::utils::hash;

/// Proof every node agrees to bake into its genesis block. Chains built from
/// a different genesis fail validation at index 1.
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Only reachable if an operation runs before genesis construction,
    /// which the `Ledger::new` contract rules out.
    #[error("chain has no blocks")]
    EmptyChain,
    #[error("proof {proof} does not satisfy the puzzle against last proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },
}

/// The chain of sealed blocks plus the pool of transactions waiting for the
/// next seal. No internal synchronization; embedders must serialize mutations
/// through a single exclusion boundary.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Ledger {
    /// Create a ledger holding only the fixed genesis block.
    pub fn new() -> Ledger {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger
            .seal_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()))
            .expect("genesis seal cannot fail on an empty chain");
        ledger
    }

    /// Seal the pending pool into a new block and append it.
    ///
    /// The proof is verified against the previous block's proof before
    /// anything is consumed; a failing proof leaves the pool untouched.
    /// The genesis seal (empty chain) is exempt since there is no prior
    /// proof to verify against. When `previous_hash` is absent it is
    /// computed from the last block.
    pub fn seal_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<&Block, ChainError> {
        if let Some(last) = self.chain.last() {
            if !ProofOfWork::verify(last.proof, proof) {
                return Err(ChainError::InvalidProof {
                    last_proof: last.proof,
                    proof,
                });
            }
        }

        let previous_hash = match previous_hash {
            Some(h) => h,
            None => hash::digest(self.last_block()?),
        };

        let block = Block::new(
            self.chain.len() as u64 + 1,
            std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        );
        self.chain.push(block);

        Ok(self.chain.last().expect("block was just appended"))
    }

    /// Stage a transaction for the next sealed block. Returns the index of
    /// the block it is expected to land in; informational only under
    /// concurrent staging.
    pub fn stage_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<u64, ChainError> {
        let next_index = self.last_block()?.index + 1;
        self.pending.push(Transaction::new(sender, recipient, amount));
        Ok(next_index)
    }

    /// The most recently appended block.
    pub fn last_block(&self) -> Result<&Block, ChainError> {
        self.chain.last().ok_or(ChainError::EmptyChain)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Wholesale replacement of the chain; only conflict resolution uses it.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }

    /// Walk a candidate chain pairwise and check every link: the hash
    /// pointer must match the digest of the previous block and the proof
    /// must satisfy the puzzle against the previous proof. The index-0 block
    /// is trusted as given.
    pub fn is_valid(chain: &[Block]) -> bool {
        chain.windows(2).all(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            cur.previous_hash == hash::digest(prev) && ProofOfWork::verify(prev.proof, cur.proof)
        })
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
