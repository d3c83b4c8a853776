//! Loading a project's communication records.
//!
//! The session never reads mailboxes itself; it asks a [`DataLoader`] for the
//! records of a project id. Concrete loaders (JSON exports on disk, fixtures in
//! tests) live behind this trait.

use std::collections::HashMap;

use hawk_core::error::{HawkError, Result};
use hawk_core::types::CommunicationRecord;

/// Source of communication records keyed by project id.
pub trait DataLoader {
    /// Fetch every record of `project_id`.
    ///
    /// Fails with [`HawkError::DataUnavailable`] when the project is unknown or
    /// its data cannot be read.
    fn load(&self, project_id: &str) -> Result<Vec<CommunicationRecord>>;
}

/// Loader serving records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    projects: HashMap<String, Vec<CommunicationRecord>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the records of a project.
    pub fn insert(&mut self, project_id: impl Into<String>, records: Vec<CommunicationRecord>) {
        self.projects.insert(project_id.into(), records);
    }

    /// Builder form of [`InMemoryLoader::insert`].
    pub fn with_project(
        mut self,
        project_id: impl Into<String>,
        records: Vec<CommunicationRecord>,
    ) -> Self {
        self.insert(project_id, records);
        self
    }
}

impl DataLoader for InMemoryLoader {
    fn load(&self, project_id: &str) -> Result<Vec<CommunicationRecord>> {
        self.projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| HawkError::unavailable(project_id, "unknown project"))
    }
}
