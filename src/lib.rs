//! A minimal append-only ledger node: a hash-linked chain of blocks gated by
//! a fixed-difficulty proof-of-work puzzle, a pending-transaction pool, and
//! longest-valid-chain conflict resolution across known peers.

pub mod api;
pub mod blockchain;
pub mod utils;

pub use blockchain::{Block, ChainSnapshot, Ledger, PeerSet, ProofOfWork, Transaction};
