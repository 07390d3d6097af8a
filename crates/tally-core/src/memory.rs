//! In-process chat channel that records every message.
//!
//! Used by the console transport and by tests. Messages get sequential
//! numeric identifiers; edits and sends can be made to fail on demand.

use crate::board::{ChatChannel, ChatError};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMessage {
    pub id: String,
    pub content: String,
    pub edits: u32,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    messages: Vec<MemoryMessage>,
    fail_edits: Option<ChatError>,
    fail_sends: Option<ChatError>,
}

#[derive(Debug)]
pub struct MemoryChannel {
    id: String,
    inner: Mutex<Inner>,
}

impl MemoryChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self::starting_at(id, 1)
    }

    /// Channel whose first message gets identifier `first_id`.
    pub fn starting_at(id: impl Into<String>, first_id: u64) -> Self {
        Self {
            id: id.into(),
            inner: Mutex::new(Inner {
                next_id: first_id,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn messages(&self) -> Vec<MemoryMessage> {
        self.lock().messages.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn content(&self, id: &str) -> Option<String> {
        self.lock()
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.content.clone())
    }

    pub fn last(&self) -> Option<MemoryMessage> {
        self.lock().messages.last().cloned()
    }

    /// Forget a message, as if someone deleted it from the channel.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.messages.len();
        inner.messages.retain(|m| m.id != id);
        inner.messages.len() != before
    }

    pub fn fail_edits(&self, err: ChatError) {
        self.lock().fail_edits = Some(err);
    }

    pub fn fail_sends(&self, err: ChatError) {
        self.lock().fail_sends = Some(err);
    }
}

#[async_trait]
impl ChatChannel for MemoryChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, content: &str) -> Result<String, ChatError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_sends.clone() {
            return Err(err);
        }
        let id = inner.next_id.to_string();
        inner.next_id += 1;
        inner.messages.push(MemoryMessage {
            id: id.clone(),
            content: content.to_string(),
            edits: 0,
        });
        Ok(id)
    }

    async fn fetch(&self, message: &str) -> Result<(), ChatError> {
        if self.lock().messages.iter().any(|m| m.id == message) {
            Ok(())
        } else {
            Err(ChatError::NotFound)
        }
    }

    async fn edit(&self, message: &str, content: &str) -> Result<(), ChatError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_edits.clone() {
            return Err(err);
        }
        let msg = inner
            .messages
            .iter_mut()
            .find(|m| m.id == message)
            .ok_or(ChatError::NotFound)?;
        msg.content = content.to_string();
        msg.edits += 1;
        Ok(())
    }
}
