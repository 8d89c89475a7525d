//! DNS TXT record checkpoints
//!
//! Each record has the form `<height>:<64 hex chars>`. Records come from a
//! lower-trust channel than the override file, so a malformed record is
//! skipped instead of failing the batch. There is no height baseline here:
//! every well-formed record is attempted, and a conflicting one still fails the
//! load.
//!
//! DNS checkpoints are switched off. [`DNS_CHECKPOINTS_ENABLED`] is the kill
//! switch; while it is `false` a load reports
//! [`CheckpointError::DnsCheckpointsDisabled`] without touching the resolver.

use serde::{Deserialize, Serialize};

use super::{CheckpointError, Checkpoints, Result};
use crate::network::NetworkType;
use crate::types::BlockHash;

/// Kill switch for DNS checkpoints. Flip only together with non-empty source
/// lists below.
pub const DNS_CHECKPOINTS_ENABLED: bool = false;

pub const MAINNET_DNS_URLS: &[&str] = &[];
pub const TESTNET_DNS_URLS: &[&str] = &[];
pub const STAGENET_DNS_URLS: &[&str] = &[];

/// Source of raw TXT records.
///
/// An empty `domains` slice is a legal "no records" request, not an error.
pub trait TxtRecordResolver: Send + Sync {
    fn load_txt_records(&self, domains: &[String]) -> Result<Vec<String>>;
}

/// DNS checkpoint policy: kill switch plus per-network source domains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsCheckpoints {
    pub enabled: bool,
    pub mainnet_urls: Vec<String>,
    pub testnet_urls: Vec<String>,
    pub stagenet_urls: Vec<String>,
}

impl Default for DnsCheckpoints {
    fn default() -> Self {
        let owned = |urls: &[&str]| urls.iter().map(|u| u.to_string()).collect();
        Self {
            enabled: DNS_CHECKPOINTS_ENABLED,
            mainnet_urls: owned(MAINNET_DNS_URLS),
            testnet_urls: owned(TESTNET_DNS_URLS),
            stagenet_urls: owned(STAGENET_DNS_URLS),
        }
    }
}

impl DnsCheckpoints {
    pub fn urls(&self, network: NetworkType) -> &[String] {
        match network {
            NetworkType::Mainnet => &self.mainnet_urls,
            NetworkType::Testnet => &self.testnet_urls,
            NetworkType::Stagenet => &self.stagenet_urls,
        }
    }

    /// Resolve and apply the TXT checkpoints for `network`.
    ///
    /// Returns how many records were applied. On failure `cp` is unchanged.
    pub fn load_checkpoints(
        &self,
        cp: &mut Checkpoints,
        network: NetworkType,
        resolver: &dyn TxtRecordResolver,
    ) -> Result<usize> {
        if !self.enabled {
            log::debug!("DNS checkpoints disabled, skipping {} lookup", network);
            return Err(CheckpointError::DnsCheckpointsDisabled);
        }

        let records = resolver.load_txt_records(self.urls(network))?;
        log::debug!("Fetched {} {} checkpoint TXT records", records.len(), network);

        let mut staged = cp.clone();
        let mut applied = 0;
        for record in &records {
            let Some((height, hash)) = parse_txt_record(record) else {
                log::debug!("Skipping malformed checkpoint record {:?}", record);
                continue;
            };
            staged.insert_hash_anchor(height, hash)?;
            applied += 1;
        }

        *cp = staged;
        Ok(applied)
    }
}

/// Parse `<height>:<hash>`, `None` if either half is malformed.
pub fn parse_txt_record(record: &str) -> Option<(u64, BlockHash)> {
    let (height, hash) = record.split_once(':')?;
    let height = height.trim().parse::<u64>().ok()?;
    let hash = BlockHash::from_hex(hash.trim()).ok()?;
    Some((height, hash))
}
