//! Mailbox exports on disk.
//!
//! Each project is a JSON file `<data_dir>/<project>.json` holding either a
//! bare array of messages or an object with an `emails` / `messages` /
//! `records` array.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use hawk_chat::DataLoader;
use hawk_core::error::{HawkError, Result};
use hawk_core::types::CommunicationRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum MailboxExport {
    Records(Vec<CommunicationRecord>),
    Wrapped {
        #[serde(alias = "emails", alias = "messages")]
        records: Vec<CommunicationRecord>,
    },
}

/// Loads projects from JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    root: PathBuf,
}

impl JsonDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `project_id`, or `None` for ids that could escape the
    /// data directory.
    pub fn project_path(&self, project_id: &str) -> Option<PathBuf> {
        if !is_valid_project_id(project_id) {
            return None;
        }
        Some(self.root.join(format!("{}.json", project_id)))
    }
}

impl DataLoader for JsonDirLoader {
    fn load(&self, project_id: &str) -> Result<Vec<CommunicationRecord>> {
        let path = self
            .project_path(project_id)
            .ok_or_else(|| HawkError::unavailable(project_id, "invalid project name"))?;

        let content = std::fs::read_to_string(&path).map_err(|e| {
            HawkError::unavailable(project_id, format!("{}: {}", path.display(), e))
        })?;
        let export: MailboxExport = serde_json::from_str(&content).map_err(|e| {
            HawkError::unavailable(project_id, format!("{}: {}", path.display(), e))
        })?;

        let mut records = match export {
            MailboxExport::Records(records) => records,
            MailboxExport::Wrapped { records } => records,
        };
        // Exports without ids get positional ones so matches stay traceable
        for (idx, record) in records.iter_mut().enumerate() {
            if record.id.trim().is_empty() {
                record.id = format!("{}-{}", project_id, idx + 1);
            }
        }

        debug!(project = project_id, path = %path.display(), records = records.len(), "Read mailbox export");
        Ok(records)
    }
}

/// Project ids are plain file stems: ASCII alphanumerics, `_`, `-` and `.`,
/// never `..`.
pub fn is_valid_project_id(project_id: &str) -> bool {
    !project_id.is_empty()
        && !project_id.contains("..")
        && !project_id.starts_with('.')
        && project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let rest = path.get(2..).unwrap_or("");
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}
