use primitive_types::U256;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::BlockHash;

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors raised while building or loading the checkpoint registry
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("failed to parse checkpoint hash {value:?}: {reason}")]
    HashDecode { value: String, reason: String },

    #[error("failed to parse difficulty checkpoint {value:?}: {reason}")]
    DifficultyDecode { value: String, reason: String },

    #[error(
        "checkpoint at height {height} already exists with hash {existing}, refusing different hash {new}"
    )]
    HashConflict {
        height: u64,
        existing: BlockHash,
        new: BlockHash,
    },

    #[error(
        "difficulty checkpoint at height {height} already exists with {existing}, refusing different difficulty {new}"
    )]
    DifficultyConflict {
        height: u64,
        existing: U256,
        new: U256,
    },

    #[error("failed to read checkpoints file {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checkpoints file {path:?}: {source}")]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write checkpoints file {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("checkpoint TXT record lookup failed: {0}")]
    Resolver(String),

    /// Returned while the DNS checkpoint kill switch is off.
    #[error("DNS checkpoints are disabled")]
    DnsCheckpointsDisabled,
}

impl CheckpointError {
    /// Conflicting anchors mean a corrupted or hostile trust source.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CheckpointError::HashConflict { .. } | CheckpointError::DifficultyConflict { .. }
        )
    }

    /// Height of the conflicting anchor, if this is a conflict.
    pub fn conflict_height(&self) -> Option<u64> {
        match self {
            CheckpointError::HashConflict { height, .. }
            | CheckpointError::DifficultyConflict { height, .. } => Some(*height),
            _ => None,
        }
    }
}
