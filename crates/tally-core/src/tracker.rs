use crate::error::Result;
use crate::model::{Activity, Decrement, Document, Removal};
use crate::store::Store;
use std::path::PathBuf;

/// Single owner of the in-memory document and the file that mirrors it.
///
/// Every successful mutation is persisted before returning. Failed
/// operations (unknown keys, bad amounts, already complete) leave both the
/// document and the file untouched.
#[derive(Debug)]
pub struct Tracker {
    doc: Document,
    store: Store,
}

impl Tracker {
    /// Load the data file at `path`, creating it if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let (store, doc) = Store::open(path)?;
        tracing::debug!(
            path = %store.path().display(),
            systems = doc.systems().len(),
            activities = doc.activity_count(),
            "loaded data file"
        );
        Ok(Self { doc, store })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn add_or_update(
        &mut self,
        system: &str,
        activity: &str,
        total: u32,
        kind: &str,
    ) -> Result<Activity> {
        let act = self.doc.add_or_update(system, activity, total, kind).clone();
        self.persist()?;
        Ok(act)
    }

    pub fn increment(&mut self, system: &str, activity: &str) -> Result<Activity> {
        let act = self.doc.increment(system, activity)?.clone();
        self.persist()?;
        Ok(act)
    }

    pub fn decrement(&mut self, system: &str, activity: &str, amount: i64) -> Result<Decrement> {
        let dec = self.doc.decrement(system, activity, amount)?;
        self.persist()?;
        Ok(dec)
    }

    pub fn remove(&mut self, system: &str, activity: &str) -> Result<Removal> {
        let removal = self.doc.remove(system, activity)?;
        self.persist()?;
        Ok(removal)
    }

    pub fn reset_all(&mut self) -> Result<usize> {
        let count = self.doc.reset_all();
        self.persist()?;
        Ok(count)
    }

    pub fn board_for(&self, channel: &str) -> Option<&str> {
        self.doc.board(channel)
    }

    /// Point `channel` at a new board message and persist the change.
    pub fn register_board(&mut self, channel: &str, message: &str) -> Result<()> {
        self.doc.set_board(channel, message);
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.doc)
    }
}
