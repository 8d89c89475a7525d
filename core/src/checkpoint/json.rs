//! JSON checkpoint override file
//!
//! ```json
//! { "hashlines": [ { "height": 17000, "hash": "<64 hex chars>", "difficulty": "0x..." } ] }
//! ```
//!
//! `difficulty` is optional. Entries at or below the registry's highest anchor
//! at load time are ignored, so the file can only extend the anchored range.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{CheckpointError, Checkpoints, Result};

/// One checkpoint line of the override file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashLine {
    pub height: u64,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFile {
    pub hashlines: Vec<HashLine>,
}

impl HashFile {
    pub fn from_checkpoints(cp: &Checkpoints) -> Self {
        let hashlines = cp
            .points()
            .iter()
            .map(|(height, hash)| HashLine {
                height: *height,
                hash: hash.to_hex(),
                difficulty: cp.difficulty_at(*height).map(|d| format!("{:#x}", d)),
            })
            .collect();
        HashFile { hashlines }
    }
}

/// Merge checkpoints from the JSON file at `path` into `cp`.
///
/// A missing file is not an error. Returns how many lines were applied. On any
/// failure `cp` is left as it was.
pub fn load_checkpoints_from_json(cp: &mut Checkpoints, path: &Path) -> Result<usize> {
    if !path.exists() {
        log::debug!("Blockchain checkpoints file not found: {:?}", path);
        return Ok(0);
    }

    log::info!("Adding checkpoints from blockchain hashfile {:?}", path);

    let data = fs::read_to_string(path).map_err(|source| CheckpointError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let hashes: HashFile = serde_json::from_str(&data).map_err(|source| {
        log::error!("Error loading checkpoints from {:?}: {}", path, source);
        CheckpointError::FileParse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut staged = cp.clone();
    let applied = apply_hash_lines(&mut staged, &hashes.hashlines)?;
    *cp = staged;
    Ok(applied)
}

/// Apply `lines` above the current highest anchor, in order.
pub fn apply_hash_lines(cp: &mut Checkpoints, lines: &[HashLine]) -> Result<usize> {
    let prev_max_height = cp.max_height();
    log::debug!("Max checkpoint height before file load is {:?}", prev_max_height);

    let mut applied = 0;
    for line in lines {
        if prev_max_height.is_some_and(|max| line.height <= max) {
            log::debug!("ignoring checkpoint height {}", line.height);
            continue;
        }

        log::debug!("Adding checkpoint height {}, hash={}", line.height, line.hash);
        cp.add_checkpoint(line.height, &line.hash, line.difficulty.as_deref())?;
        applied += 1;
    }
    Ok(applied)
}

/// Write every anchor of `cp` to `path` in the override file format.
pub fn write_checkpoints_json(cp: &Checkpoints, path: &Path) -> Result<()> {
    let write_err = |reason: String| CheckpointError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let json = serde_json::to_string_pretty(&HashFile::from_checkpoints(cp))
        .map_err(|e| write_err(e.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
    }
    fs::write(path, json).map_err(|e| write_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkType;
    use crate::types::BlockHash;
    use primitive_types::U256;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HASH_A: &str = "aa00000000000000000000000000000000000000000000000000000000000001";
    const HASH_B: &str = "bb00000000000000000000000000000000000000000000000000000000000002";

    fn write_file(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("checkpoints.json");
        fs::write(&path, body).unwrap();
        path
    }

    fn anchors_up_to(max: u64) -> Checkpoints {
        let mut cp = Checkpoints::new();
        cp.insert_hash_anchor(0, BlockHash([1; 32])).unwrap();
        cp.insert_hash_anchor(max, BlockHash([2; 32])).unwrap();
        cp
    }

    #[test]
    fn missing_file_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut cp = anchors_up_to(1000);
        let before = cp.clone();

        let applied =
            load_checkpoints_from_json(&mut cp, &dir.path().join("does-not-exist.json")).unwrap();
        assert_eq!(applied, 0);
        assert_eq!(cp, before);
    }

    #[test]
    fn lines_at_or_below_baseline_are_ignored() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            r#"{{"hashlines":[
                {{"height": 500, "hash": "{HASH_A}"}},
                {{"height": 1000, "hash": "{HASH_A}"}},
                {{"height": 1200, "hash": "{HASH_B}"}}
            ]}}"#
        );
        let path = write_file(&dir, &body);
        let mut cp = anchors_up_to(1000);

        let applied = load_checkpoints_from_json(&mut cp, &path).unwrap();
        assert_eq!(applied, 1);
        // 1000 kept its default hash even though the file disagrees
        assert_eq!(cp.hash_at(1000), Some(&BlockHash([2; 32])));
        assert!(cp.hash_at(500).is_none());
        assert_eq!(cp.hash_at(1200).unwrap().to_hex(), HASH_B);
        assert_eq!(cp.max_height(), Some(1200));
    }

    #[test]
    fn baseline_is_taken_before_loading() {
        // 1100 is above the baseline even though 1200 was applied first
        let dir = TempDir::new().unwrap();
        let body = format!(
            r#"{{"hashlines":[
                {{"height": 1200, "hash": "{HASH_B}"}},
                {{"height": 1100, "hash": "{HASH_A}"}}
            ]}}"#
        );
        let path = write_file(&dir, &body);
        let mut cp = anchors_up_to(1000);

        assert_eq!(load_checkpoints_from_json(&mut cp, &path).unwrap(), 2);
        assert!(cp.hash_at(1100).is_some());
    }

    #[test]
    fn empty_registry_accepts_genesis_line() {
        let dir = TempDir::new().unwrap();
        let body = format!(r#"{{"hashlines":[{{"height": 0, "hash": "{HASH_A}", "difficulty": "1"}}]}}"#);
        let path = write_file(&dir, &body);
        let mut cp = Checkpoints::new();

        assert_eq!(load_checkpoints_from_json(&mut cp, &path).unwrap(), 1);
        assert_eq!(cp.max_height(), Some(0));
        assert_eq!(cp.difficulty_at(0), Some(&U256::one()));
    }

    #[test]
    fn malformed_file_fails_and_leaves_registry_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{ this is not json");
        let mut cp = anchors_up_to(10);
        let before = cp.clone();

        let err = load_checkpoints_from_json(&mut cp, &path).unwrap_err();
        assert!(matches!(err, CheckpointError::FileParse { .. }));
        assert_eq!(cp, before);

        let path = write_file(&dir, r#"{"lines": []}"#);
        assert!(matches!(
            load_checkpoints_from_json(&mut cp, &path),
            Err(CheckpointError::FileParse { .. })
        ));
    }

    #[test]
    fn bad_hash_fails_whole_load() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            r#"{{"hashlines":[
                {{"height": 20, "hash": "{HASH_A}"}},
                {{"height": 30, "hash": "xyz"}}
            ]}}"#
        );
        let path = write_file(&dir, &body);
        let mut cp = anchors_up_to(10);
        let before = cp.clone();

        let err = load_checkpoints_from_json(&mut cp, &path).unwrap_err();
        assert!(matches!(err, CheckpointError::HashDecode { .. }));
        // the valid line before the bad one was not committed
        assert_eq!(cp, before);
    }

    #[test]
    fn duplicate_height_with_different_hash_in_file_conflicts() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            r#"{{"hashlines":[
                {{"height": 20, "hash": "{HASH_A}"}},
                {{"height": 20, "hash": "{HASH_B}"}}
            ]}}"#
        );
        let path = write_file(&dir, &body);
        let mut cp = anchors_up_to(10);

        let err = load_checkpoints_from_json(&mut cp, &path).unwrap_err();
        assert_eq!(err.conflict_height(), Some(20));
        assert!(cp.hash_at(20).is_none());
    }

    #[test]
    fn written_file_loads_back_into_empty_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("export.json");
        let defaults = Checkpoints::with_defaults(NetworkType::Stagenet).unwrap();

        write_checkpoints_json(&defaults, &path).unwrap();
        let mut cp = Checkpoints::new();
        load_checkpoints_from_json(&mut cp, &path).unwrap();
        assert_eq!(cp, defaults);
    }
}
