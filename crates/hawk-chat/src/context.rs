//! Conversation context management.
//!
//! Keeps a bounded history of answered turns and resolves follow-up
//! questions against the previous turn's entity.

use std::collections::VecDeque;

use hawk_core::types::Entity;

use crate::parser::QueryParser;
use crate::types::{SessionMemory, Turn};

// =============================================================================
// FollowUpResolver
// =============================================================================

/// Fills in the entity of a follow-up question from session memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowUpResolver {
    parser: QueryParser,
}

impl FollowUpResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the entity for this turn.
    ///
    /// An explicitly extracted entity always wins. Otherwise, if the query
    /// contains an anaphor ("it", "that", ...) and memory holds a previous
    /// entity, that one is reused. Returns the entity and whether it came
    /// from memory.
    pub fn resolve(
        &self,
        raw_query: &str,
        extracted: Option<Entity>,
        memory: &SessionMemory,
    ) -> (Option<Entity>, bool) {
        if extracted.is_some() {
            return (extracted, false);
        }
        if self.parser.has_anaphor(raw_query) {
            if let Some(ref previous) = memory.last_entity {
                return (Some(previous.clone()), true);
            }
        }
        (None, false)
    }
}

// =============================================================================
// TurnHistory
// =============================================================================

/// Rolling window of the most recent turns.
#[derive(Debug, Clone)]
pub struct TurnHistory {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl TurnHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a turn, dropping the oldest ones beyond capacity.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryIntent;
    use chrono::Utc;

    fn entity(s: &str) -> Entity {
        Entity::parse(s).unwrap()
    }

    fn memory_with(last: Option<&str>) -> SessionMemory {
        SessionMemory {
            last_entity: last.map(entity),
            ..SessionMemory::default()
        }
    }

    fn turn(query: &str) -> Turn {
        Turn {
            query: query.to_string(),
            entity: None,
            intent: QueryIntent::General,
            total_matches: 0,
            asked_at: Utc::now(),
        }
    }

    // ---- Follow-up resolution ----

    #[test]
    fn test_explicit_entity_wins() {
        let resolver = FollowUpResolver::new();
        let (e, from_memory) =
            resolver.resolve("what about it and k12", Some(entity("k12")), &memory_with(Some("tusd")));
        assert_eq!(e, Some(entity("k12")));
        assert!(!from_memory);
    }

    #[test]
    fn test_anaphor_reuses_last_entity() {
        let resolver = FollowUpResolver::new();
        let (e, from_memory) = resolver.resolve("who is it hung on?", None, &memory_with(Some("tusd")));
        assert_eq!(e, Some(entity("tusd")));
        assert!(from_memory);
    }

    #[test]
    fn test_no_anaphor_no_carry() {
        let resolver = FollowUpResolver::new();
        let (e, from_memory) = resolver.resolve("show everything", None, &memory_with(Some("tusd")));
        assert!(e.is_none());
        assert!(!from_memory);
    }

    #[test]
    fn test_anaphor_without_memory() {
        let resolver = FollowUpResolver::new();
        let (e, from_memory) = resolver.resolve("who is it hung on?", None, &memory_with(None));
        assert!(e.is_none());
        assert!(!from_memory);
    }

    // ---- History ----

    #[test]
    fn test_history_trims_to_capacity() {
        let mut history = TurnHistory::new(3);
        for i in 0..5 {
            history.push(turn(&format!("query {}", i)));
        }
        assert_eq!(history.len(), 3);
        let queries: Vec<&str> = history.turns().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["query 2", "query 3", "query 4"]);
        assert_eq!(history.last().unwrap().query, "query 4");
    }

    #[test]
    fn test_history_zero_capacity_keeps_nothing() {
        let mut history = TurnHistory::new(0);
        history.push(turn("q"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_clear() {
        let mut history = TurnHistory::new(2);
        history.push(turn("q"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }
}
