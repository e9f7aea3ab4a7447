use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookError, Result};

/// One user-defined script entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub description: String,
}

/// JSON-file store for script entries.
///
/// The whole collection is read and rewritten on every mutation; list order
/// is insertion order. Not safe for concurrent multi-writer use — the tool
/// is single-user by design.
pub struct ScriptBook {
    path: PathBuf,
}

impl ScriptBook {
    /// Open the store at `path`, creating an empty file (and parent
    /// directories) on first use.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            std::fs::write(&path, "[]\n")?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<ScriptEntry>> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Rewrite the whole collection.
    pub fn save(&self, entries: &[ScriptEntry]) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(entries)?;
        payload.push('\n');
        std::fs::write(&self.path, payload)?;
        Ok(())
    }

    /// Append an entry, rejecting names that already exist
    /// (case-insensitive).
    pub fn add(&self, entry: ScriptEntry) -> Result<()> {
        let mut entries = self.load()?;
        if entries
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(&entry.name))
        {
            return Err(BookError::DuplicateName { name: entry.name });
        }
        entries.push(entry);
        self.save(&entries)
    }

    /// Remove every entry matching `name` (case-insensitive). Removing a
    /// name that is not present is not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        let entries: Vec<ScriptEntry> = self
            .load()?
            .into_iter()
            .filter(|e| !e.name.eq_ignore_ascii_case(name))
            .collect();
        self.save(&entries)
    }
}
