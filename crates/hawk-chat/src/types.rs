//! Data types shared across the analysis pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hawk_core::types::{BottleneckVerdict, CommunicationRecord, Entity, WaitingOn};

// =============================================================================
// Query intent
// =============================================================================

/// The kind of question being asked. Selects the text rendering only; every
/// query runs the full analysis pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// "What is stuck?", "what's blocked?"
    Bottleneck,
    /// "Who owes a reply?"
    Responsibility,
    /// "What's the status of ...?"
    Status,
    /// "Show communication related to ..."
    Communication,
    /// Anything else.
    General,
}

// =============================================================================
// Matching
// =============================================================================

/// Where a record matched the entity. Earlier variants rank higher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Subject,
    Domain,
    Body,
    /// No entity was given; every record is returned.
    Unfiltered,
}

impl MatchTier {
    /// Relevance score attached to matches of this tier.
    pub fn score(&self) -> f32 {
        match self {
            Self::Subject => 1.0,
            Self::Domain => 0.75,
            Self::Body => 0.5,
            Self::Unfiltered => 0.0,
        }
    }
}

/// A record judged relevant to an entity.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub record: Arc<CommunicationRecord>,
    pub tier: MatchTier,
    pub score: f32,
}

/// Ordered matches for one query. Rebuilt on every turn.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub entity: Option<Entity>,
    pub matches: Vec<ScoredMatch>,
    /// Malformed records left out of matching.
    pub skipped: usize,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matched records in ranking order.
    pub fn records(&self) -> impl Iterator<Item = &CommunicationRecord> {
        self.matches.iter().map(|m| m.record.as_ref())
    }

    /// Record ids in ranking order.
    pub fn ids(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.record.id.as_str()).collect()
    }
}

// =============================================================================
// Session state
// =============================================================================

/// Dialogue memory carried from one `ask` to the next.
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    pub last_entity: Option<Entity>,
    pub last_matches: MatchResult,
    pub loaded_project_id: Option<String>,
}

impl SessionMemory {
    /// Fresh memory for a newly loaded project.
    pub fn for_project(project_id: &str) -> Self {
        Self {
            loaded_project_id: Some(project_id.to_string()),
            ..Self::default()
        }
    }
}

/// One answered question in the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub entity: Option<Entity>,
    pub intent: QueryIntent,
    pub total_matches: usize,
    pub asked_at: DateTime<Utc>,
}

// =============================================================================
// Output
// =============================================================================

/// Messages sent by one participant among the matched records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderActivity {
    pub sender: String,
    pub messages: usize,
}

/// Structured answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub entity: Option<String>,
    /// The entity was taken from the previous turn.
    pub entity_from_memory: bool,
    pub intent: QueryIntent,
    pub total_matches: usize,
    pub threads_analyzed: usize,
    pub stuck_threads: Vec<BottleneckVerdict>,
    /// Threads expecting a reply that are not yet stuck.
    pub pending_threads: Vec<BottleneckVerdict>,
    /// Thread count per waiting party, over every analyzed thread.
    pub responsibility_summary: BTreeMap<WaitingOn, usize>,
    /// Senders of the matched records, most active first.
    pub top_senders: Vec<SenderActivity>,
    /// Malformed records ignored while answering.
    pub skipped_records: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Human-readable rendering of an [`AnswerPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_tier_ordering() {
        assert!(MatchTier::Subject < MatchTier::Domain);
        assert!(MatchTier::Domain < MatchTier::Body);
        assert!(MatchTier::Body < MatchTier::Unfiltered);
        assert!(MatchTier::Subject.score() > MatchTier::Domain.score());
        assert!(MatchTier::Domain.score() > MatchTier::Body.score());
    }

    #[test]
    fn test_empty_match_result() {
        let result = MatchResult::default();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.ids().is_empty());
    }

    #[test]
    fn test_memory_for_project() {
        let memory = SessionMemory::for_project("tusd");
        assert_eq!(memory.loaded_project_id.as_deref(), Some("tusd"));
        assert!(memory.last_entity.is_none());
        assert!(memory.last_matches.is_empty());
    }

    #[test]
    fn test_payload_summary_serializes_with_lowercase_keys() {
        let mut summary = BTreeMap::new();
        summary.insert(WaitingOn::Internal, 2);
        summary.insert(WaitingOn::External, 0);
        summary.insert(WaitingOn::Unknown, 1);
        let payload = AnswerPayload {
            entity: Some("tusd".to_string()),
            entity_from_memory: false,
            intent: QueryIntent::Bottleneck,
            total_matches: 3,
            threads_analyzed: 3,
            stuck_threads: vec![],
            pending_threads: vec![],
            responsibility_summary: summary,
            top_senders: vec![SenderActivity {
                sender: "john@tusd.edu".to_string(),
                messages: 2,
            }],
            skipped_records: 0,
            last_activity: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["responsibility_summary"]["internal"], 2);
        assert_eq!(json["responsibility_summary"]["unknown"], 1);
        assert_eq!(json["intent"], "bottleneck");
        assert!(json["entity"].is_string());
        assert_eq!(json["top_senders"][0]["sender"], "john@tusd.edu");
        assert_eq!(json["top_senders"][0]["messages"], 2);
    }
}
