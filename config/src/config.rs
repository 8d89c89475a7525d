use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const CHECKPOINTS_FILE_NAME: &str = "checkpoints.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: String,
    /// mainnet, testnet or stagenet
    pub network: String,
    /// Checkpoint override file; `<data_dir>/checkpoints.json` when unset
    pub checkpoints_file: Option<String>,
    pub enable_dns_checkpoints: bool,
    pub dns_refresh_interval_secs: u64,
    /// DNS-over-HTTPS JSON endpoint used for TXT lookups
    pub doh_endpoint: String,
    pub log_level: String,
}

impl Config {
    fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path);
        PathBuf::from(expanded.into_owned())
    }

    fn base_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        // Use a Windows-friendly folder when building on Windows to avoid tilde expansion issues.
        if cfg!(target_os = "windows") {
            return dirs::data_dir().unwrap_or(home).join("Pulse");
        }

        home.join(".pulse")
    }

    /// Compute the default data directory depending on the target OS.
    fn default_data_dir() -> String {
        Self::base_dir().join("data").to_string_lossy().into_owned()
    }

    pub fn default_path() -> PathBuf {
        Self::base_dir().join("config.json")
    }

    /// Data directory with tilde expansion applied.
    pub fn data_dir_resolved(&self) -> PathBuf {
        Self::expand_path(&self.data_dir)
    }

    /// Checkpoint override file with tilde expansion applied.
    pub fn checkpoints_file_resolved(&self) -> PathBuf {
        match &self.checkpoints_file {
            Some(path) => Self::expand_path(path),
            None => self.data_dir_resolved().join(CHECKPOINTS_FILE_NAME),
        }
    }

    pub fn load() -> io::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Read the configuration at `path`, writing the defaults there first if
    /// the file does not exist yet.
    pub fn load_from(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            println!(
                "Configuration file not found. Creating default configuration: {:?}",
                path
            );
            let cfg = Self::default();
            cfg.save_to(path)?;
            return Ok(cfg);
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let parse_bool = |v: &str| {
            v.parse::<bool>()
                .map_err(|_| format!("expected true or false for {}, got {}", key, v))
        };

        match key {
            "data_dir" => self.data_dir = value.to_string(),
            "network" => match value {
                "mainnet" | "testnet" | "stagenet" => self.network = value.to_string(),
                _ => return Err(format!("unknown network: {}", value)),
            },
            "checkpoints_file" => {
                self.checkpoints_file = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "enable_dns_checkpoints" => self.enable_dns_checkpoints = parse_bool(value)?,
            "dns_refresh_interval_secs" => {
                self.dns_refresh_interval_secs = value
                    .parse()
                    .map_err(|_| format!("expected seconds for {}, got {}", key, value))?
            }
            "doh_endpoint" => self.doh_endpoint = value.to_string(),
            "log_level" => self.log_level = value.to_string(),
            _ => return Err(format!("Unknown configuration key: {}", key)),
        }
        Ok(())
    }

    pub fn view(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            network: "mainnet".to_string(),
            checkpoints_file: None,
            enable_dns_checkpoints: false,
            dns_refresh_interval_secs: 3600,
            doh_endpoint: "https://cloudflare-dns.com/dns-query".to_string(),
            log_level: "info".to_string(),
        }
    }
}
