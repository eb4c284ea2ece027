pub mod block;
pub mod consensus;
pub mod ledger;
pub mod peers;
pub mod proof_of_work;

pub use block::{Block, Transaction};
pub use consensus::ChainSnapshot;
pub use ledger::{ChainError, Ledger, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
pub use peers::{PeerError, PeerSet};
pub use proof_of_work::ProofOfWork;
