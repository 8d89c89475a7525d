//! Checkpoint registry
//!
//! Checkpoints are trusted (height, block hash) anchors, optionally paired with
//! the cumulative difficulty at that height. They pin the canonical chain so
//! that no alternative chain can rewrite blocks at or below an anchored height.
//!
//! Anchors come from three sources, loaded in this order:
//! - the hard-coded defaults for the network ([`defaults`])
//! - an optional JSON override file ([`json`])
//! - DNS TXT records, currently switched off ([`dns`])
//!
//! Every source goes through the same insert rule: a height may be anchored
//! once, re-adding the identical value is a no-op, and a different value at an
//! anchored height is rejected without touching the registry.

pub mod defaults;
pub mod dns;
pub mod error;
pub mod json;
pub mod shared;

use primitive_types::U256;
use std::collections::BTreeMap;

use crate::network::NetworkType;
use crate::types::{BlockHash, parse_difficulty};
pub use error::{CheckpointError, Result};

/// Outcome of checking a block against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCheck {
    /// false means the block contradicts a trusted anchor and must be rejected
    pub passed: bool,
    /// true if an anchor exists at the block's height
    pub is_checkpoint: bool,
}

/// In-memory anchor store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoints {
    points: BTreeMap<u64, BlockHash>,
    difficulty_points: BTreeMap<u64, U256>,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the hard-coded anchors for `network`.
    pub fn with_defaults(network: NetworkType) -> Result<Self> {
        let mut cp = Self::new();
        cp.init_default_checkpoints(network)?;
        Ok(cp)
    }

    /// Insert a hash anchor. Idempotent for an identical hash, rejects a
    /// different one.
    pub fn insert_hash_anchor(&mut self, height: u64, hash: BlockHash) -> Result<()> {
        self.ensure_hash_compatible(height, &hash)?;
        self.points.insert(height, hash);
        Ok(())
    }

    /// Insert a cumulative difficulty anchor, same rule as hash anchors.
    pub fn insert_difficulty_anchor(&mut self, height: u64, difficulty: U256) -> Result<()> {
        self.ensure_difficulty_compatible(height, difficulty)?;
        self.difficulty_points.insert(height, difficulty);
        Ok(())
    }

    /// Add a checkpoint from its textual form.
    ///
    /// `difficulty` may be `0x`-prefixed hex or decimal; `None` or an empty
    /// string adds a hash anchor only. Nothing is inserted unless both parts
    /// decode and neither conflicts.
    pub fn add_checkpoint(
        &mut self,
        height: u64,
        hash_hex: &str,
        difficulty: Option<&str>,
    ) -> Result<()> {
        let hash = BlockHash::from_hex(hash_hex)?;
        let difficulty = match difficulty.filter(|d| !d.is_empty()) {
            Some(d) => Some(parse_difficulty(d)?),
            None => None,
        };

        self.ensure_hash_compatible(height, &hash)?;
        if let Some(d) = difficulty {
            self.ensure_difficulty_compatible(height, d)?;
        }

        self.points.insert(height, hash);
        if let Some(d) = difficulty {
            self.difficulty_points.insert(height, d);
        }
        Ok(())
    }

    fn ensure_hash_compatible(&self, height: u64, hash: &BlockHash) -> Result<()> {
        match self.points.get(&height) {
            Some(existing) if existing != hash => Err(CheckpointError::HashConflict {
                height,
                existing: *existing,
                new: *hash,
            }),
            _ => Ok(()),
        }
    }

    fn ensure_difficulty_compatible(&self, height: u64, difficulty: U256) -> Result<()> {
        match self.difficulty_points.get(&height) {
            Some(existing) if *existing != difficulty => Err(CheckpointError::DifficultyConflict {
                height,
                existing: *existing,
                new: difficulty,
            }),
            _ => Ok(()),
        }
    }

    /// Fails on the first height where `other` anchors a different hash.
    pub fn check_for_conflicts(&self, other: &Checkpoints) -> Result<()> {
        for (height, hash) in &other.points {
            self.ensure_hash_compatible(*height, hash)?;
        }
        Ok(())
    }

    /// Merge every hash anchor of `other` into this registry.
    ///
    /// All or nothing: on a hash conflict the registry is left untouched.
    /// Foreign difficulty anchors only fill heights that have none locally.
    pub fn merge(&mut self, other: &Checkpoints) -> Result<()> {
        self.check_for_conflicts(other)?;

        for (height, hash) in &other.points {
            self.points.entry(*height).or_insert(*hash);
        }

        for (height, difficulty) in &other.difficulty_points {
            match self.difficulty_points.get(height) {
                None => {
                    self.difficulty_points.insert(*height, *difficulty);
                }
                Some(existing) if existing != difficulty => {
                    log::warn!(
                        "Ignoring foreign difficulty checkpoint at height {}: have {}, got {}",
                        height,
                        existing,
                        difficulty
                    );
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Strict merge used when committing a staged load: hash and difficulty
    /// conflicts both abort, and nothing is applied unless everything fits.
    pub(crate) fn commit_staged(&mut self, staged: &Checkpoints) -> Result<()> {
        self.check_for_conflicts(staged)?;
        for (height, difficulty) in &staged.difficulty_points {
            self.ensure_difficulty_compatible(*height, *difficulty)?;
        }

        for (height, hash) in &staged.points {
            self.points.insert(*height, *hash);
        }
        for (height, difficulty) in &staged.difficulty_points {
            self.difficulty_points.insert(*height, *difficulty);
        }
        Ok(())
    }

    /// Highest anchored height, `None` when no anchors are known.
    pub fn max_height(&self) -> Option<u64> {
        self.points.keys().next_back().copied()
    }

    /// Whether checkpoint enforcement applies at `height`.
    pub fn is_in_checkpoint_zone(&self, height: u64) -> bool {
        self.max_height().is_some_and(|max| height <= max)
    }

    /// Check a block against the anchor at its height, if any.
    pub fn check_block(&self, height: u64, hash: &BlockHash) -> BlockCheck {
        let Some(expected) = self.points.get(&height) else {
            return BlockCheck {
                passed: true,
                is_checkpoint: false,
            };
        };

        if expected == hash {
            log::info!("CHECKPOINT PASSED FOR HEIGHT {} {}", height, hash);
            BlockCheck {
                passed: true,
                is_checkpoint: true,
            }
        } else {
            log::warn!(
                "CHECKPOINT FAILED FOR HEIGHT {}. EXPECTED HASH: {}, FETCHED HASH: {}",
                height,
                expected,
                hash
            );
            BlockCheck {
                passed: false,
                is_checkpoint: true,
            }
        }
    }

    pub fn check_block_hash(&self, height: u64, hash: &BlockHash) -> bool {
        self.check_block(height, hash).passed
    }

    /// Whether a fork rooted at `block_height` may be considered while the
    /// local chain stands at `blockchain_height`.
    ///
    /// Forking at genesis is never allowed. Before the first anchor anything
    /// goes; past it, the fork must start strictly above the last anchor at or
    /// below the chain height.
    pub fn is_alternative_block_allowed(&self, blockchain_height: u64, block_height: u64) -> bool {
        if block_height == 0 {
            return false;
        }

        match self.points.range(..=blockchain_height).next_back() {
            None => true,
            Some((&checkpoint_height, _)) => checkpoint_height < block_height,
        }
    }

    pub fn hash_at(&self, height: u64) -> Option<&BlockHash> {
        self.points.get(&height)
    }

    pub fn difficulty_at(&self, height: u64) -> Option<&U256> {
        self.difficulty_points.get(&height)
    }

    pub fn points(&self) -> &BTreeMap<u64, BlockHash> {
        &self.points
    }

    pub fn difficulty_points(&self) -> &BTreeMap<u64, U256> {
        &self.difficulty_points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
