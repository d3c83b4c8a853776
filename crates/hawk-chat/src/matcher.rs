//! Retrieval of the records relevant to an entity.

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, warn};

use hawk_core::types::{normalize_text, CommunicationRecord, Entity};

use crate::store::MessageStore;
use crate::types::{MatchResult, MatchTier, ScoredMatch};

/// Filters a [`MessageStore`] by entity and ranks the matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunicationMatcher;

impl CommunicationMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Find the records mentioning `entity`.
    ///
    /// Without an entity every well-formed record is returned. With one, a
    /// record matches on its subject, then its sender/recipient domains,
    /// then its body; the first tier that matches decides its rank. Results
    /// are ordered by tier, then newest first. Malformed records are counted
    /// in `skipped` and left out. Nothing matching is a normal, empty result.
    pub fn find_matches(&self, store: &MessageStore, entity: Option<&Entity>) -> MatchResult {
        let mut matches = Vec::new();
        let mut skipped = 0usize;

        for record in store.records() {
            if !record.is_well_formed() {
                skipped += 1;
                continue;
            }
            let tier = match entity {
                None => Some(MatchTier::Unfiltered),
                Some(e) => Self::tier_for(record, e),
            };
            if let Some(tier) = tier {
                matches.push(ScoredMatch {
                    record: Arc::clone(record),
                    tier,
                    score: tier.score(),
                });
            }
        }

        matches.sort_by_key(|m| (m.tier, Reverse(m.record.timestamp)));

        if skipped > 0 {
            warn!(
                project = store.project_id(),
                skipped, "Skipped malformed records while matching"
            );
        }
        debug!(
            entity = entity.map(Entity::as_str).unwrap_or("<all>"),
            matched = matches.len(),
            "Matched communications"
        );

        MatchResult {
            entity: entity.cloned(),
            matches,
            skipped,
        }
    }

    /// First tier in which `record` mentions `entity`.
    pub fn tier_for(record: &CommunicationRecord, entity: &Entity) -> Option<MatchTier> {
        let needle = entity.as_str();

        if normalize_text(&record.subject).contains(needle) {
            return Some(MatchTier::Subject);
        }

        let in_domain = record
            .sender_domain()
            .into_iter()
            .chain(record.recipient_domains())
            .any(|d| normalize_text(&d).contains(needle));
        if in_domain {
            return Some(MatchTier::Domain);
        }

        if normalize_text(&record.body).contains(needle) {
            return Some(MatchTier::Body);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: &str, subject: &str, sender: &str, body: &str, days_ago: i64) -> CommunicationRecord {
        let base = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
        CommunicationRecord {
            id: id.to_string(),
            subject: subject.to_string(),
            sender: Some(sender.to_string()),
            recipients: vec!["team@mycompany.com".to_string()],
            body: body.to_string(),
            timestamp: Some(base - Duration::days(days_ago)),
            thread_id: None,
        }
    }

    fn entity(s: &str) -> Entity {
        Entity::parse(s).unwrap()
    }

    fn sample_store() -> MessageStore {
        MessageStore::new(
            "tusd",
            vec![
                record("body-new", "Invoice", "billing@vendor.com", "re: tusd invoice", 1),
                record("domain", "Quick question", "john@tusd.edu", "hello", 2),
                record("subject-old", "TUSD Budget", "amy@sccoe.org", "numbers", 9),
                record("subject-new", "Re: TUSD Budget", "me@mycompany.com", "see attached", 3),
                record("unrelated", "Lunch", "bob@mycompany.com", "pizza?", 0),
            ],
        )
    }

    #[test]
    fn test_no_entity_returns_all_records() {
        let store = sample_store();
        let result = CommunicationMatcher::new().find_matches(&store, None);
        assert_eq!(result.len(), store.len());
        assert!(result.matches.iter().all(|m| m.tier == MatchTier::Unfiltered));
        // Newest first
        assert_eq!(result.ids()[0], "unrelated");
        assert!(result.entity.is_none());
    }

    #[test]
    fn test_tier_ordering_then_recency() {
        let store = sample_store();
        let result = CommunicationMatcher::new().find_matches(&store, Some(&entity("tusd")));
        assert_eq!(
            result.ids(),
            vec!["subject-new", "subject-old", "domain", "body-new"]
        );
        assert_eq!(result.matches[0].tier, MatchTier::Subject);
        assert_eq!(result.matches[2].tier, MatchTier::Domain);
        assert_eq!(result.matches[3].tier, MatchTier::Body);
        assert_eq!(result.entity, Some(entity("tusd")));
    }

    #[test]
    fn test_subject_beats_domain_for_same_record() {
        let rec = record("1", "TUSD kickoff", "john@tusd.edu", "tusd", 0);
        assert_eq!(
            CommunicationMatcher::tier_for(&rec, &entity("tusd")),
            Some(MatchTier::Subject)
        );
    }

    #[test]
    fn test_recipient_domain_matches() {
        let mut rec = record("1", "Hello", "me@mycompany.com", "", 0);
        rec.recipients = vec!["Amy <amy@sccoe.org>".to_string()];
        assert_eq!(
            CommunicationMatcher::tier_for(&rec, &entity("sccoe")),
            Some(MatchTier::Domain)
        );
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let store = sample_store();
        let result = CommunicationMatcher::new().find_matches(&store, Some(&entity("acme")));
        assert!(result.is_empty());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_malformed_records_skipped_and_counted() {
        let mut no_date = record("no-date", "TUSD", "john@tusd.edu", "", 0);
        no_date.timestamp = None;
        let mut no_sender = record("no-sender", "TUSD", "john@tusd.edu", "", 0);
        no_sender.sender = Some("Unknown".to_string());
        let store = MessageStore::new(
            "tusd",
            vec![no_date, no_sender, record("ok", "TUSD", "john@tusd.edu", "", 0)],
        );
        let result = CommunicationMatcher::new().find_matches(&store, Some(&entity("tusd")));
        assert_eq!(result.ids(), vec!["ok"]);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_scores_follow_tier() {
        let store = sample_store();
        let result = CommunicationMatcher::new().find_matches(&store, Some(&entity("tusd")));
        assert_eq!(result.matches[0].score, 1.0);
        assert_eq!(result.matches[2].score, 0.75);
        assert_eq!(result.matches[3].score, 0.5);
    }
}
