pub mod checkpoint;
pub mod network;
pub mod types;

// Explicit re-exports for the node crate
pub use checkpoint::dns::{DNS_CHECKPOINTS_ENABLED, DnsCheckpoints, TxtRecordResolver};
pub use checkpoint::shared::SharedCheckpoints;
pub use checkpoint::{BlockCheck, CheckpointError, Checkpoints};
pub use network::NetworkType;
pub use types::{BlockHash, parse_difficulty};
