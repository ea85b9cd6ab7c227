use std::fs;
use std::io::Write;
use std::path::Path;

use cnp_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

const EXPECTED_KEYS: [&str; 3] = ["urls", "timestamps", "texts"];

/// On-disk layout of the dedup history: three parallel arrays. Timestamps are
/// seconds since the epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostedFile {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub timestamps: Vec<f64>,
    #[serde(default)]
    pub texts: Vec<String>,
}

#[derive(Debug)]
pub enum LoadState {
    Loaded(PostedFile),
    Missing,
    Corrupt(String),
}

pub fn read_posted_file(path: &Path) -> LoadState {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadState::Missing,
        Err(e) => return LoadState::Corrupt(e.to_string()),
    };

    if content.trim().is_empty() {
        return LoadState::Corrupt("file is empty".to_string());
    }

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => return LoadState::Corrupt(e.to_string()),
    };
    let Some(object) = value.as_object() else {
        return LoadState::Corrupt("top level is not an object".to_string());
    };
    for key in EXPECTED_KEYS {
        if !object.contains_key(key) {
            warn!("⚠️ Missing key '{}' in {}, using an empty list", key, path.display());
        }
    }

    match serde_json::from_value::<PostedFile>(value) {
        Ok(mut file) => {
            file.repair(path);
            LoadState::Loaded(file)
        }
        Err(e) => LoadState::Corrupt(e.to_string()),
    }
}

/// Replace `path` with the serialized file. Goes through a temp file in the
/// same directory so a crash never leaves a half-written history.
pub fn write_posted_file(path: &Path, file: &PostedFile) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let content = serde_json::to_string_pretty(file)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)
        .map_err(|e| Error::Storage(format!("Failed to replace {}: {}", path.display(), e.error)))?;
    Ok(())
}

impl PostedFile {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Arrays of unequal length cannot be trusted past the shortest one.
    fn repair(&mut self, path: &Path) {
        let len = self.urls.len().min(self.timestamps.len()).min(self.texts.len());
        if self.urls.len() != len || self.timestamps.len() != len || self.texts.len() != len {
            warn!(
                "⚠️ Parallel arrays in {} differ in length ({}/{}/{}), truncating to {}",
                path.display(),
                self.urls.len(),
                self.timestamps.len(),
                self.texts.len(),
                len
            );
            self.urls.truncate(len);
            self.timestamps.truncate(len);
            self.texts.truncate(len);
        }
    }
}
