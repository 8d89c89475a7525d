//! Checkpoint hooks for the block validation pipeline
//!
//! A `false` from the registry is a hard rejection here: the block or fork is
//! refused with an error, never merely logged.

use anyhow::{Result, anyhow};
use pulse_core::{BlockCheck, BlockHash};

use crate::ChainContext;

impl ChainContext {
    /// Reject a block whose hash contradicts the checkpoint at its height.
    pub fn validate_block(&self, height: u64, hash_hex: &str) -> Result<BlockCheck> {
        let hash = BlockHash::from_hex(hash_hex)?;
        let check = self.checkpoints.check_block(height, &hash);

        if !check.passed {
            let expected = self
                .checkpoints
                .read()
                .hash_at(height)
                .map(|h| h.to_string())
                .unwrap_or_default();
            log::error!(
                "CHECKPOINT VIOLATION: Block at height {} has hash {}, but checkpoint requires {}",
                height,
                hash.short(),
                &expected[..16.min(expected.len())]
            );
            return Err(anyhow!(
                "block {} at height {} conflicts with checkpoint {}",
                hash,
                height,
                expected
            ));
        }

        Ok(check)
    }

    /// Reject an alternative chain forking at `fork_height` while our chain is
    /// at `chain_height`.
    pub fn validate_alternative_block(&self, chain_height: u64, fork_height: u64) -> Result<()> {
        if self
            .checkpoints
            .is_alternative_block_allowed(chain_height, fork_height)
        {
            return Ok(());
        }

        let anchor = self
            .checkpoints
            .read()
            .points()
            .range(..=chain_height)
            .next_back()
            .map(|(h, _)| *h);
        Err(match anchor {
            Some(anchor) => anyhow!(
                "alternative block at height {} is at or below checkpoint {} (chain height {})",
                fork_height,
                anchor,
                chain_height
            ),
            None => anyhow!("alternative block at genesis is never allowed"),
        })
    }

    /// Check if a reorganization of `reorg_depth` blocks from `current_height`
    /// would rewrite checkpointed history.
    /// Returns (allowed, reason)
    pub fn check_reorg_against_checkpoints(
        &self,
        reorg_depth: u64,
        current_height: u64,
    ) -> (bool, Option<String>) {
        // first block replaced by the reorg
        let fork_height = current_height
            .saturating_sub(reorg_depth)
            .saturating_add(1);

        match self.validate_alternative_block(current_height, fork_height) {
            Ok(()) => (true, None),
            Err(e) => (false, Some(format!("Reorg rejected by checkpoint: {}", e))),
        }
    }

    /// Blocks inside the checkpoint zone are pinned by a later anchor.
    pub fn is_in_checkpoint_zone(&self, height: u64) -> bool {
        self.checkpoints.is_in_checkpoint_zone(height)
    }
}
