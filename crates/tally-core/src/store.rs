use crate::error::Result;
use crate::model::Document;
use std::path::{Path, PathBuf};

/// Default data file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "sistemas.json";

/// The JSON file backing a [`Document`].
///
/// Every save rewrites the whole file through a tempfile and rename, so a
/// crash mid-write never truncates the store. There is no cross-process
/// locking; a single bot process is expected to own the file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    revision: u64,
}

impl Store {
    /// Open the store at `path`, creating it with an empty document if it
    /// does not exist yet, and return the repaired document.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Document)> {
        let path = path.into();
        crate::io::ensure_parent(&path)?;
        let mut store = Store { path, revision: 0 };
        if !store.path.exists() {
            tracing::info!(path = %store.path.display(), "creating new data file");
            store.save(&Document::new())?;
        }
        let doc = store.load()?;
        Ok((store, doc))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of saves performed through this handle.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn load(&self) -> Result<Document> {
        let data = std::fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&data)?;
        Document::from_value(value)
    }

    pub fn save(&mut self, doc: &Document) -> Result<()> {
        let mut data = serde_json::to_string_pretty(&doc.to_value()?)?;
        data.push('\n');
        crate::io::atomic_write(&self.path, data.as_bytes())?;
        self.revision += 1;
        tracing::debug!(
            path = %self.path.display(),
            revision = self.revision,
            "saved data file"
        );
        Ok(())
    }
}

/// Read the document at `path` without creating or repairing the file.
pub fn read_only(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Ok(Document::new());
    }
    let data = std::fs::read_to_string(path)?;
    Document::from_value(serde_json::from_str(&data)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
