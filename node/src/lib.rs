pub mod resolver;
pub mod validation;

pub use resolver::DohTxtResolver;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use pulse_core::{DnsCheckpoints, NetworkType, SharedCheckpoints, TxtRecordResolver};
use std::path::PathBuf;

/// Chain validation context: owns the checkpoint registry for the lifetime of
/// the node. The block pipeline gets at checkpoints only through this value.
pub struct ChainContext {
    pub network: NetworkType,
    pub checkpoints: SharedCheckpoints,
    pub checkpoints_file: PathBuf,
    /// Operator asked for DNS checkpoints (subject to the DNS kill switch)
    pub use_dns_checkpoints: bool,
    pub dns: DnsCheckpoints,
    /// Unix time of the last successful checkpoint load
    pub last_checkpoint_update: Mutex<Option<i64>>,
}

impl ChainContext {
    /// Context holding the hard-coded checkpoints for `network`.
    pub fn new(
        network: NetworkType,
        checkpoints_file: PathBuf,
        use_dns_checkpoints: bool,
    ) -> Result<Self> {
        let checkpoints = SharedCheckpoints::with_defaults(network)
            .with_context(|| format!("invalid default checkpoints for {}", network))?;

        log::info!(
            "Checkpoints initialized for {}: {} anchors, max height {:?}",
            network,
            checkpoints.len(),
            checkpoints.max_height()
        );

        Ok(Self {
            network,
            checkpoints,
            checkpoints_file,
            use_dns_checkpoints,
            dns: DnsCheckpoints::default(),
            last_checkpoint_update: Mutex::new(None),
        })
    }

    /// Load the override file and, when requested, DNS checkpoints.
    ///
    /// Blocking; run it off the async executor.
    pub fn load_new_checkpoints(&self, resolver: &dyn TxtRecordResolver) -> Result<()> {
        let dns = if self.use_dns_checkpoints {
            Some((&self.dns, resolver))
        } else {
            None
        };

        self.checkpoints
            .load_new_checkpoints(&self.checkpoints_file, self.network, dns)
            .with_context(|| {
                format!(
                    "failed to load checkpoints (file {:?}, dns {})",
                    self.checkpoints_file, self.use_dns_checkpoints
                )
            })?;

        *self.last_checkpoint_update.lock() = Some(Utc::now().timestamp());
        log::info!(
            "Checkpoints loaded: {} anchors, max height {:?}",
            self.checkpoints.len(),
            self.checkpoints.max_height()
        );
        Ok(())
    }
}
