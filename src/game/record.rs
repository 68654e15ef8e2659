//! Player record module
//!
//! Handles saving and loading the persistent part of a character to/from
//! flat JSON files, one `<name>.pldat` file per character. Room location and
//! carried keys are session state and never appear in a record.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;

/// File extension of player record files
pub const RECORD_EXTENSION: &str = "pldat";

/// Whether a character is alive or permanently dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VitalStatus {
    #[default]
    Alive,
    Dead,
}

impl VitalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "ALIVE",
            Self::Dead => "DEAD",
        }
    }
}

impl std::fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable projection of a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub gold: u32,
    pub attack: u32,
    pub defense: u32,
    pub regen: u32,
    #[serde(alias = "status")]
    pub vital_status: VitalStatus,
    pub health: u32,
    #[serde(alias = "started")]
    pub configured: bool,
}

impl PlayerRecord {
    /// Decode a record from its JSON text
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Encode a record as JSON text
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Directory of player record files
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open the store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), "Player record store opened");
        Ok(Self { dir })
    }

    /// Directory the records live in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `name`
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !is_storable_name(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, RECORD_EXTENSION)))
    }

    /// Whether a record exists for `name`
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Load the record for `name`; `Ok(None)` when there is none
    pub fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StorageError> {
        let path = self.path_for(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        PlayerRecord::from_json(&text)
            .map(Some)
            .map_err(|source| StorageError::Malformed { path, source })
    }

    /// Overwrite the record for `name`
    ///
    /// The record is written next to its final path and renamed into place,
    /// so readers only ever see a complete file.
    pub fn save(&self, name: &str, record: &PlayerRecord) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        let text = record.to_json().map_err(|source| StorageError::Malformed {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension(format!("{}.tmp", RECORD_EXTENSION));
        fs::write(&tmp, text).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Names of every stored character, sorted
    pub fn list_names(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Names end up as file names, so anything that could leave the directory is refused
fn is_storable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}
