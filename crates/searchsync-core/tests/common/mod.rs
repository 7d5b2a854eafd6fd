//! Shared stubs for the integration tests.

#![allow(dead_code)]

use searchsync_core::{ConfigStore, RemoteOperations, SavedSearchInput, SearchConfig, SyncError};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::time::Instant;

#[derive(Debug)]
pub struct StubError(pub String);

impl fmt::Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StubError {}

/// Remote service that records every call and hands out sequential ids.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    pub created: Vec<SavedSearchInput>,
    pub updated: Vec<(String, SavedSearchInput)>,
    pub deleted: Vec<String>,
    pub next_id: Option<String>,
    pub counter: u32,
    pub fail: Option<String>,
    /// Operation name and time of every successful call, in call order.
    pub timeline: Vec<(&'static str, Instant)>,
}

impl RecordingRemote {
    pub fn returning(id: &str) -> Self {
        Self {
            next_id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    fn check(&self) -> Result<(), StubError> {
        match &self.fail {
            Some(message) => Err(StubError(message.clone())),
            None => Ok(()),
        }
    }
}

impl RemoteOperations for RecordingRemote {
    type Error = StubError;

    fn create(&mut self, input: &SavedSearchInput) -> Result<String, StubError> {
        self.check()?;
        self.created.push(input.clone());
        self.timeline.push(("create", Instant::now()));
        self.counter += 1;
        Ok(self
            .next_id
            .clone()
            .unwrap_or_else(|| format!("SSC_stub{}", self.counter)))
    }

    fn update(&mut self, id: &str, input: &SavedSearchInput) -> Result<(), StubError> {
        self.check()?;
        self.updated.push((id.to_string(), input.clone()));
        self.timeline.push(("update", Instant::now()));
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StubError> {
        self.check()?;
        self.deleted.push(id.to_string());
        self.timeline.push(("delete", Instant::now()));
        Ok(())
    }
}

/// Store that keeps the document in memory and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub config: RefCell<SearchConfig>,
    pub saves: RefCell<usize>,
}

impl MemoryStore {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: RefCell::new(config),
            saves: RefCell::new(0),
        }
    }

    pub fn saved(&self) -> SearchConfig {
        self.config.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self, _location: &Path) -> Result<SearchConfig, SyncError> {
        Ok(self.config.borrow().clone())
    }

    fn save(&self, _location: &Path, config: &SearchConfig) -> Result<(), SyncError> {
        *self.config.borrow_mut() = config.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
