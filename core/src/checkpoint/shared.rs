//! Shared checkpoint registry
//!
//! The registry is owned by the node's chain context and handed out as cheap
//! clones of [`SharedCheckpoints`]. Validation queries take the read lock.
//! Loads stage their changes on a snapshot, do their I/O without holding any
//! lock, and then commit the staged registry under the write lock in one step,
//! so readers see either the old or the new registry, never a partial load.

use parking_lot::{RwLock, RwLockReadGuard};
use std::path::Path;
use std::sync::Arc;

use super::dns::{DnsCheckpoints, TxtRecordResolver};
use super::json::load_checkpoints_from_json;
use super::{BlockCheck, Checkpoints, Result};
use crate::network::NetworkType;
use crate::types::BlockHash;

#[derive(Debug, Clone, Default)]
pub struct SharedCheckpoints {
    inner: Arc<RwLock<Checkpoints>>,
}

impl SharedCheckpoints {
    pub fn new(checkpoints: Checkpoints) -> Self {
        Self {
            inner: Arc::new(RwLock::new(checkpoints)),
        }
    }

    pub fn with_defaults(network: NetworkType) -> Result<Self> {
        Ok(Self::new(Checkpoints::with_defaults(network)?))
    }

    /// Read access for callers that need several queries against one state.
    pub fn read(&self) -> RwLockReadGuard<'_, Checkpoints> {
        self.inner.read()
    }

    pub fn snapshot(&self) -> Checkpoints {
        self.inner.read().clone()
    }

    pub fn check_block(&self, height: u64, hash: &BlockHash) -> BlockCheck {
        self.inner.read().check_block(height, hash)
    }

    pub fn is_in_checkpoint_zone(&self, height: u64) -> bool {
        self.inner.read().is_in_checkpoint_zone(height)
    }

    pub fn is_alternative_block_allowed(&self, blockchain_height: u64, block_height: u64) -> bool {
        self.inner
            .read()
            .is_alternative_block_allowed(blockchain_height, block_height)
    }

    pub fn max_height(&self) -> Option<u64> {
        self.inner.read().max_height()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Merge another registry; all or nothing.
    pub fn merge(&self, other: &Checkpoints) -> Result<()> {
        self.inner.write().merge(other)
    }

    fn stage_and_commit<F>(&self, load: F) -> Result<usize>
    where
        F: FnOnce(&mut Checkpoints) -> Result<usize>,
    {
        let mut staged = self.snapshot();
        let applied = load(&mut staged)?;
        // another load may have landed meanwhile; commit re-checks against it
        self.inner.write().commit_staged(&staged)?;
        Ok(applied)
    }

    pub fn load_from_json(&self, path: &Path) -> Result<usize> {
        self.stage_and_commit(|staged| load_checkpoints_from_json(staged, path))
    }

    pub fn load_from_dns(
        &self,
        network: NetworkType,
        settings: &DnsCheckpoints,
        resolver: &dyn TxtRecordResolver,
    ) -> Result<usize> {
        self.stage_and_commit(|staged| settings.load_checkpoints(staged, network, resolver))
    }

    /// Load the override file and, if `dns` is given, DNS checkpoints.
    ///
    /// Each source commits on its own success. Both must succeed for the call
    /// to succeed; the first error is returned.
    pub fn load_new_checkpoints(
        &self,
        json_path: &Path,
        network: NetworkType,
        dns: Option<(&DnsCheckpoints, &dyn TxtRecordResolver)>,
    ) -> Result<()> {
        let mut first_err = None;

        match self.load_from_json(json_path) {
            Ok(applied) => {
                if applied > 0 {
                    log::info!("Added {} checkpoints from {:?}", applied, json_path);
                }
            }
            Err(e) => {
                log::error!("Failed to load checkpoints from {:?}: {}", json_path, e);
                first_err = Some(e);
            }
        }

        if let Some((settings, resolver)) = dns {
            match self.load_from_dns(network, settings, resolver) {
                Ok(applied) => log::info!("Added {} DNS checkpoints", applied),
                Err(e) => {
                    log::error!("Failed to load DNS checkpoints: {}", e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointError;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    struct FixedResolver(Vec<String>);

    impl TxtRecordResolver for FixedResolver {
        fn load_txt_records(&self, _domains: &[String]) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn hash_hex(byte: u8) -> String {
        hex::encode([byte; 32])
    }

    fn write_hashlines(dir: &TempDir, lines: &[(u64, String)]) -> std::path::PathBuf {
        let hashlines: Vec<_> = lines
            .iter()
            .map(|(height, hash)| serde_json::json!({ "height": height, "hash": hash }))
            .collect();
        let path = dir.path().join("checkpoints.json");
        fs::write(&path, serde_json::json!({ "hashlines": hashlines }).to_string()).unwrap();
        path
    }

    #[test]
    fn queries_go_through_the_lock() {
        let shared = SharedCheckpoints::with_defaults(NetworkType::Mainnet).unwrap();
        let genesis = *shared.read().hash_at(0).unwrap();

        assert_eq!(shared.max_height(), Some(16500));
        assert!(shared.is_in_checkpoint_zone(16500));
        assert!(shared.check_block(0, &genesis).passed);
        assert!(!shared.check_block(0, &BlockHash::NULL).passed);
        assert!(!shared.is_alternative_block_allowed(17000, 16500));
        assert!(shared.is_alternative_block_allowed(17000, 16501));
    }

    #[test]
    fn clones_share_one_registry() {
        let shared = SharedCheckpoints::default();
        let other = shared.clone();
        let mut extra = Checkpoints::new();
        extra.insert_hash_anchor(7, BlockHash([7; 32])).unwrap();

        other.merge(&extra).unwrap();
        assert_eq!(shared.max_height(), Some(7));
    }

    #[test]
    fn json_only_load() {
        let dir = TempDir::new().unwrap();
        let path = write_hashlines(&dir, &[(17000, hash_hex(1)), (100, hash_hex(2))]);
        let shared = SharedCheckpoints::with_defaults(NetworkType::Mainnet).unwrap();

        shared
            .load_new_checkpoints(&path, NetworkType::Mainnet, None)
            .unwrap();
        assert_eq!(shared.max_height(), Some(17000));
        assert!(shared.read().hash_at(100).is_none());
    }

    #[test]
    fn missing_file_without_dns_is_success() {
        let dir = TempDir::new().unwrap();
        let shared = SharedCheckpoints::with_defaults(NetworkType::Testnet).unwrap();
        let before = shared.snapshot();

        shared
            .load_new_checkpoints(&dir.path().join("absent.json"), NetworkType::Testnet, None)
            .unwrap();
        assert_eq!(shared.snapshot(), before);
    }

    #[test]
    fn disabled_dns_fails_the_load_but_keeps_file_anchors() {
        let dir = TempDir::new().unwrap();
        let path = write_hashlines(&dir, &[(10, hash_hex(1))]);
        let shared = SharedCheckpoints::with_defaults(NetworkType::Stagenet).unwrap();
        let resolver = FixedResolver(vec![format!("20:{}", hash_hex(2))]);
        let settings = DnsCheckpoints::default();

        let resolver: &dyn TxtRecordResolver = &resolver;
        let err = shared
            .load_new_checkpoints(&path, NetworkType::Stagenet, Some((&settings, resolver)))
            .unwrap_err();
        assert!(matches!(err, CheckpointError::DnsCheckpointsDisabled));
        assert!(shared.read().hash_at(10).is_some());
        assert!(shared.read().hash_at(20).is_none());
    }

    #[test]
    fn enabled_dns_and_file_both_apply() {
        let dir = TempDir::new().unwrap();
        let path = write_hashlines(&dir, &[(10, hash_hex(1))]);
        let shared = SharedCheckpoints::with_defaults(NetworkType::Stagenet).unwrap();
        let resolver = FixedResolver(vec![format!("20:{}", hash_hex(2)), "junk".to_string()]);
        let settings = DnsCheckpoints {
            enabled: true,
            ..DnsCheckpoints::default()
        };

        let resolver: &dyn TxtRecordResolver = &resolver;
        shared
            .load_new_checkpoints(&path, NetworkType::Stagenet, Some((&settings, resolver)))
            .unwrap();
        assert_eq!(shared.len(), 3);
        assert_eq!(shared.max_height(), Some(20));
    }

    #[test]
    fn failed_file_load_reports_error_and_commits_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_hashlines(&dir, &[(10, hash_hex(1)), (10, hash_hex(2))]);
        let shared = SharedCheckpoints::with_defaults(NetworkType::Stagenet).unwrap();
        let before = shared.snapshot();

        let err = shared
            .load_new_checkpoints(&path, NetworkType::Stagenet, None)
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(shared.snapshot(), before);
    }

    #[test]
    fn readers_never_see_a_partial_merge() {
        let shared = SharedCheckpoints::default();
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for batch in 0..50u64 {
                    let mut incoming = Checkpoints::new();
                    for i in 0..10u64 {
                        let height = batch * 10 + i;
                        incoming
                            .insert_hash_anchor(height, BlockHash([(height % 251) as u8; 32]))
                            .unwrap();
                    }
                    shared.merge(&incoming).unwrap();
                }
            })
        };

        for _ in 0..1000 {
            assert_eq!(shared.len() % 10, 0);
        }
        writer.join().unwrap();
        assert_eq!(shared.len(), 500);
    }
}
