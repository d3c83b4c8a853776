//! Conversation session: the Idle / Loaded state machine around the
//! analysis pipeline.
//!
//! A session owns the message store of at most one project and the dialogue
//! memory of its turns. Sessions share nothing, so several can run side by
//! side for different projects without locking.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use hawk_core::config::HawkConfig;
use hawk_core::error::HawkError;
use hawk_core::types::CommunicationRecord;

use crate::context::TurnHistory;
use crate::error::ChatError;
use crate::loader::DataLoader;
use crate::orchestrator::AnalysisOrchestrator;
use crate::store::MessageStore;
use crate::types::{AnswerPayload, SessionMemory, Turn};

/// Whether a session has data to answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loaded,
}

/// One user's conversation over a loaded project.
pub struct ConversationSession {
    id: Uuid,
    orchestrator: AnalysisOrchestrator,
    store: Option<MessageStore>,
    memory: SessionMemory,
    history: TurnHistory,
}

impl ConversationSession {
    /// Create an idle session. Fails on invalid configuration.
    pub fn new(config: &HawkConfig) -> Result<Self, ChatError> {
        Ok(Self::with_orchestrator(
            AnalysisOrchestrator::new(config)?,
            config.chat.context_turns,
        ))
    }

    /// Create an idle session around a preconfigured pipeline.
    pub fn with_orchestrator(orchestrator: AnalysisOrchestrator, context_turns: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            orchestrator,
            store: None,
            memory: SessionMemory::default(),
            history: TurnHistory::new(context_turns),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        if self.store.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Idle
        }
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn store(&self) -> Option<&MessageStore> {
        self.store.as_ref()
    }

    /// Load `project_id` through `loader`, replacing any loaded project.
    ///
    /// Returns the number of records loaded. On failure the session drops
    /// whatever it held and is left Idle.
    pub fn load_project(
        &mut self,
        loader: &dyn DataLoader,
        project_id: &str,
    ) -> Result<usize, ChatError> {
        match loader.load(project_id) {
            Ok(records) => Ok(self.load_records(project_id, records)),
            Err(err) => {
                warn!(session = %self.id, project = project_id, error = %err, "Project load failed");
                self.clear();
                Err(match err {
                    HawkError::DataUnavailable { project, reason } => {
                        ChatError::DataUnavailable { project, reason }
                    }
                    other => ChatError::DataUnavailable {
                        project: project_id.to_string(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Load records that were already fetched. Always succeeds.
    pub fn load_records(&mut self, project_id: &str, records: Vec<CommunicationRecord>) -> usize {
        let store = MessageStore::new(project_id, records);
        let count = store.len();
        let malformed = store.malformed_count();
        if malformed > 0 {
            warn!(session = %self.id, project = project_id, malformed, "Loaded malformed records");
        }
        info!(session = %self.id, project = project_id, records = count, "Project loaded");

        self.store = Some(store);
        self.memory = SessionMemory::for_project(project_id);
        self.history.clear();
        count
    }

    /// Answer `query` as of the current time.
    pub fn ask(&mut self, query: &str) -> Result<AnswerPayload, ChatError> {
        self.ask_at(query, Utc::now())
    }

    /// Answer `query` as of `now`.
    ///
    /// Fails with [`ChatError::NotLoaded`] while Idle. Memory and history
    /// are updated only when an answer is produced.
    pub fn ask_at(&mut self, query: &str, now: DateTime<Utc>) -> Result<AnswerPayload, ChatError> {
        let store = self.store.as_ref().ok_or(ChatError::NotLoaded)?;
        let (payload, memory) = self.orchestrator.answer(store, &self.memory, query, now)?;

        self.history.push(Turn {
            query: query.to_string(),
            entity: memory.last_matches.entity.clone(),
            intent: payload.intent,
            total_matches: payload.total_matches,
            asked_at: now,
        });
        self.memory = memory;
        Ok(payload)
    }

    /// Unload the project and forget the conversation.
    pub fn reset(&mut self) {
        info!(session = %self.id, "Session reset");
        self.clear();
    }

    fn clear(&mut self) {
        self.store = None;
        self.memory = SessionMemory::default();
        self.history.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
