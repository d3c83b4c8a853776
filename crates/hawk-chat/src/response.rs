//! Response generation for answered questions.
//!
//! Renders an [`AnswerPayload`] as plain text chosen by the query intent,
//! plus a few follow-up suggestions. The payload itself stays the contract;
//! this is one presentation of it.

use hawk_core::config::ChatConfig;
use hawk_core::types::{BottleneckVerdict, WaitingOn};

use crate::types::{AnswerPayload, ChatResponse, QueryIntent};

/// Generates chat responses from answer payloads.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    /// Stuck threads listed before "and N more".
    pub max_stuck_shown: usize,
    /// Pending threads listed in a summary.
    pub max_display_results: usize,
    /// Senders listed under "Most active participants".
    pub max_top_senders: usize,
}

impl ResponseGenerator {
    pub fn new(max_stuck_shown: usize, max_display_results: usize, max_top_senders: usize) -> Self {
        Self {
            max_stuck_shown,
            max_display_results,
            max_top_senders,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.max_stuck_shown,
            config.max_display_results,
            config.max_top_senders,
        )
    }

    /// Render `payload` for the user.
    pub fn compose(&self, payload: &AnswerPayload) -> ChatResponse {
        if payload.total_matches == 0 {
            return self.no_results_response(payload);
        }

        let mut answer = match payload.intent {
            QueryIntent::Bottleneck => self.bottleneck_answer(payload),
            QueryIntent::Responsibility => self.responsibility_answer(payload),
            QueryIntent::Status | QueryIntent::Communication | QueryIntent::General => {
                self.summary_answer(payload)
            }
        };

        if payload.entity_from_memory {
            if let Some(ref entity) = payload.entity {
                answer = format!("(Still looking at {}.)\n{}", entity, answer);
            }
        }
        if payload.skipped_records > 0 {
            answer.push_str(&format!(
                "\n\n{} malformed message{} ignored.",
                payload.skipped_records,
                plural(payload.skipped_records)
            ));
        }

        ChatResponse {
            answer,
            suggestions: self.generate_suggestions(payload),
        }
    }

    /// Reply for a question asked before any project is loaded.
    pub fn not_loaded_response() -> ChatResponse {
        ChatResponse {
            answer: "No project is loaded yet. Load one first, then ask away.".to_string(),
            suggestions: vec!["load <project>".to_string(), "help".to_string()],
        }
    }

    /// Reply for a project whose data could not be fetched.
    pub fn unavailable_response(project: &str, reason: &str) -> ChatResponse {
        ChatResponse {
            answer: format!(
                "I couldn't load the data for '{}' ({}). No project is loaded now.",
                project, reason
            ),
            suggestions: vec![
                "Check the project name".to_string(),
                "load <project>".to_string(),
            ],
        }
    }

    /// Suggested follow-up questions, two to four of them.
    pub fn generate_suggestions(&self, payload: &AnswerPayload) -> Vec<String> {
        let mut suggestions = Vec::new();

        if payload.intent != QueryIntent::Responsibility && !payload.stuck_threads.is_empty() {
            suggestions.push("Who is it hung on?".to_string());
        }
        if payload.intent != QueryIntent::Bottleneck {
            suggestions.push("What communications are stuck?".to_string());
        }
        match payload.entity {
            Some(ref entity) if payload.intent != QueryIntent::Status => {
                suggestions.push(format!("What's the status of {}?", entity));
            }
            Some(_) => suggestions.push("Show me all communications".to_string()),
            None => suggestions.push("Do you see any communication related to <company>?".to_string()),
        }
        if payload.intent != QueryIntent::Responsibility {
            suggestions.push("Who needs to respond?".to_string());
        }

        suggestions.truncate(4);
        suggestions
    }

    // -- Private helpers --

    fn no_results_response(&self, payload: &AnswerPayload) -> ChatResponse {
        let answer = match payload.entity {
            Some(ref entity) => format!(
                "I don't see any recent communications related to {} in the loaded email data.",
                entity
            ),
            None => "I don't see any recent communications in the loaded email data.".to_string(),
        };
        ChatResponse {
            answer,
            suggestions: vec![
                "Try a different company or project name".to_string(),
                "Show me all communications".to_string(),
            ],
        }
    }

    fn bottleneck_answer(&self, payload: &AnswerPayload) -> String {
        if payload.stuck_threads.is_empty() {
            return format!(
                "Nothing looks stuck{}. {} thread{} checked.",
                about(payload),
                payload.threads_analyzed,
                plural(payload.threads_analyzed)
            );
        }

        let mut lines = vec![format!(
            "Found {} potentially stuck communication{}{}:",
            payload.stuck_threads.len(),
            plural(payload.stuck_threads.len()),
            about(payload)
        )];
        for verdict in payload.stuck_threads.iter().take(self.max_stuck_shown) {
            lines.push(String::new());
            lines.push(format!("- {}", display_subject(verdict)));
            lines.push(format!("  Waiting {} days", verdict.days_waiting));
            lines.push(format!("  Needs response from: {}", party(verdict)));
            lines.push(format!(
                "  From: {}",
                verdict.last_sender.as_deref().unwrap_or("unknown")
            ));
        }
        let hidden = payload.stuck_threads.len().saturating_sub(self.max_stuck_shown);
        if hidden > 0 {
            lines.push(String::new());
            lines.push(format!("...and {} more.", hidden));
        }
        lines.join("\n")
    }

    fn responsibility_answer(&self, payload: &AnswerPayload) -> String {
        let mut lines = vec![format!(
            "Across {} thread{}{}, the next reply is owed by:",
            payload.threads_analyzed,
            plural(payload.threads_analyzed),
            about(payload)
        )];
        for waiting_on in WaitingOn::ALL {
            let count = payload
                .responsibility_summary
                .get(&waiting_on)
                .copied()
                .unwrap_or(0);
            lines.push(format!("- {}: {}", owner_label(waiting_on), count));
        }

        if !payload.top_senders.is_empty() && self.max_top_senders > 0 {
            lines.push(String::new());
            lines.push("Most active participants:".to_string());
            for activity in payload.top_senders.iter().take(self.max_top_senders) {
                lines.push(format!(
                    "- {}: {} message{}",
                    activity.sender,
                    activity.messages,
                    plural(activity.messages)
                ));
            }
        }

        let open: Vec<&BottleneckVerdict> = payload
            .stuck_threads
            .iter()
            .chain(&payload.pending_threads)
            .take(self.max_display_results)
            .collect();
        if !open.is_empty() {
            lines.push(String::new());
            lines.push("Open questions:".to_string());
            for verdict in open {
                lines.push(format!(
                    "- {} ({} days, waiting on {})",
                    display_subject(verdict),
                    verdict.days_waiting,
                    party(verdict)
                ));
            }
        }
        lines.join("\n")
    }

    fn summary_answer(&self, payload: &AnswerPayload) -> String {
        let mut lines = vec![format!(
            "I found {} communication{}{}.",
            payload.total_matches,
            plural(payload.total_matches),
            about(payload)
        )];

        if !payload.stuck_threads.is_empty() {
            lines.push(format!(
                "{} thread{} look{} stuck.",
                payload.stuck_threads.len(),
                plural(payload.stuck_threads.len()),
                if payload.stuck_threads.len() == 1 { "s" } else { "" }
            ));
        }

        if !payload.pending_threads.is_empty() {
            lines.push(String::new());
            lines.push("Pending responses:".to_string());
            for verdict in payload.pending_threads.iter().take(self.max_display_results) {
                lines.push(format!("- {}", display_subject(verdict)));
                lines.push(format!("  Waiting on: {}", party(verdict)));
                lines.push(format!(
                    "  From: {}",
                    verdict.last_sender.as_deref().unwrap_or("unknown")
                ));
                lines.push(format!(
                    "  Date: {}",
                    verdict.last_activity.format("%Y-%m-%d %H:%M")
                ));
            }
        }

        if let Some(last) = payload.last_activity {
            lines.push(String::new());
            lines.push(format!("Last activity: {}", last.format("%Y-%m-%d %H:%M")));
        }
        lines.join("\n")
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn about(payload: &AnswerPayload) -> String {
    match payload.entity {
        Some(ref entity) => format!(" related to {}", entity),
        None => String::new(),
    }
}

fn display_subject(verdict: &BottleneckVerdict) -> &str {
    if verdict.subject.trim().is_empty() {
        "(no subject)"
    } else {
        verdict.subject.as_str()
    }
}

fn owner_label(waiting_on: WaitingOn) -> &'static str {
    match waiting_on {
        WaitingOn::Internal => "us (internal)",
        WaitingOn::External => "them (external)",
        WaitingOn::Unknown => "unclear",
    }
}

fn party(verdict: &BottleneckVerdict) -> String {
    match verdict.responsible_party {
        Some(ref who) => format!("{} ({})", verdict.waiting_on, who),
        None => verdict.waiting_on.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SenderActivity;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn gen() -> ResponseGenerator {
        ResponseGenerator::new(2, 10, 2)
    }

    fn verdict(subject: &str, days: i64, stuck: bool, waiting_on: WaitingOn) -> BottleneckVerdict {
        BottleneckVerdict {
            thread_id: subject.to_lowercase(),
            subject: subject.to_string(),
            is_stuck: stuck,
            awaiting_reply: true,
            days_waiting: days,
            waiting_on,
            responsible_party: None,
            last_sender: Some("john@tusd.edu".to_string()),
            last_activity: Utc.with_ymd_and_hms(2025, 10, 15, 9, 30, 0).unwrap(),
        }
    }

    fn payload(intent: QueryIntent, stuck: Vec<BottleneckVerdict>) -> AnswerPayload {
        let mut summary = BTreeMap::new();
        summary.insert(WaitingOn::Internal, stuck.len());
        summary.insert(WaitingOn::External, 0);
        summary.insert(WaitingOn::Unknown, 0);
        AnswerPayload {
            entity: Some("tusd".to_string()),
            entity_from_memory: false,
            intent,
            total_matches: stuck.len().max(1),
            threads_analyzed: stuck.len().max(1),
            stuck_threads: stuck,
            pending_threads: vec![],
            responsibility_summary: summary,
            top_senders: vec![],
            skipped_records: 0,
            last_activity: Some(Utc.with_ymd_and_hms(2025, 10, 15, 9, 30, 0).unwrap()),
        }
    }

    // ---- Empty results ----

    #[test]
    fn test_no_matches_is_friendly() {
        let mut p = payload(QueryIntent::Communication, vec![]);
        p.total_matches = 0;
        let resp = gen().compose(&p);
        assert!(resp.answer.contains("don't see any recent communications related to tusd"));
        assert_eq!(resp.suggestions.len(), 2);
    }

    #[test]
    fn test_no_matches_without_entity() {
        let mut p = payload(QueryIntent::General, vec![]);
        p.total_matches = 0;
        p.entity = None;
        let resp = gen().compose(&p);
        assert!(!resp.answer.contains("related to"));
    }

    // ---- Bottleneck ----

    #[test]
    fn test_bottleneck_lists_stuck_threads() {
        let p = payload(
            QueryIntent::Bottleneck,
            vec![verdict("TUSD Budget", 5, true, WaitingOn::Internal)],
        );
        let resp = gen().compose(&p);
        assert!(resp.answer.contains("1 potentially stuck communication related to tusd"));
        assert!(resp.answer.contains("TUSD Budget"));
        assert!(resp.answer.contains("Waiting 5 days"));
        assert!(resp.answer.contains("Needs response from: internal"));
        assert!(resp.answer.contains("john@tusd.edu"));
    }

    #[test]
    fn test_bottleneck_caps_listing() {
        let p = payload(
            QueryIntent::Bottleneck,
            vec![
                verdict("A", 9, true, WaitingOn::Internal),
                verdict("B", 8, true, WaitingOn::Internal),
                verdict("C", 7, true, WaitingOn::Internal),
            ],
        );
        let resp = gen().compose(&p);
        assert!(resp.answer.contains("- A"));
        assert!(resp.answer.contains("- B"));
        assert!(!resp.answer.contains("- C"));
        assert!(resp.answer.contains("and 1 more"));
    }

    #[test]
    fn test_bottleneck_nothing_stuck() {
        let resp = gen().compose(&payload(QueryIntent::Bottleneck, vec![]));
        assert!(resp.answer.starts_with("Nothing looks stuck related to tusd"));
    }

    // ---- Responsibility ----

    #[test]
    fn test_responsibility_breakdown() {
        let mut v = verdict("TUSD Budget", 5, true, WaitingOn::External);
        v.responsible_party = Some("john@tusd.edu".to_string());
        let resp = gen().compose(&payload(QueryIntent::Responsibility, vec![v]));
        assert!(resp.answer.contains("us (internal): 1"));
        assert!(resp.answer.contains("them (external): 0"));
        assert!(resp.answer.contains("unclear: 0"));
        assert!(resp.answer.contains("waiting on external (john@tusd.edu)"));
    }

    #[test]
    fn test_responsibility_lists_most_active_senders() {
        let mut p = payload(QueryIntent::Responsibility, vec![]);
        p.top_senders = ["john@tusd.edu", "amy@tusd.edu", "bob@mycompany.com"]
            .iter()
            .zip([3, 1, 1])
            .map(|(sender, messages)| SenderActivity {
                sender: sender.to_string(),
                messages,
            })
            .collect();
        let resp = gen().compose(&p);
        assert!(resp.answer.contains("Most active participants:"));
        assert!(resp.answer.contains("- john@tusd.edu: 3 messages"));
        assert!(resp.answer.contains("- amy@tusd.edu: 1 message"));
        // Capped at two senders
        assert!(!resp.answer.contains("bob@mycompany.com"));
    }

    #[test]
    fn test_responsibility_without_senders_omits_section() {
        let resp = gen().compose(&payload(QueryIntent::Responsibility, vec![]));
        assert!(!resp.answer.contains("Most active participants"));
    }

    // ---- Summary ----

    #[test]
    fn test_summary_mentions_pending_and_last_activity() {
        let mut p = payload(QueryIntent::Communication, vec![]);
        p.pending_threads = vec![verdict("K12 rollout", 1, false, WaitingOn::Internal)];
        let resp = gen().compose(&p);
        assert!(resp.answer.starts_with("I found 1 communication related to tusd."));
        assert!(resp.answer.contains("Pending responses:"));
        assert!(resp.answer.contains("K12 rollout"));
        assert!(resp.answer.contains("Last activity: 2025-10-15 09:30"));
    }

    #[test]
    fn test_memory_entity_is_announced() {
        let mut p = payload(QueryIntent::Status, vec![]);
        p.entity_from_memory = true;
        let resp = gen().compose(&p);
        assert!(resp.answer.starts_with("(Still looking at tusd.)"));
    }

    #[test]
    fn test_skipped_records_reported() {
        let mut p = payload(QueryIntent::General, vec![]);
        p.skipped_records = 2;
        let resp = gen().compose(&p);
        assert!(resp.answer.contains("2 malformed messages ignored"));
    }

    // ---- Suggestions ----

    #[test]
    fn test_suggestions_between_two_and_four() {
        for intent in [
            QueryIntent::Bottleneck,
            QueryIntent::Responsibility,
            QueryIntent::Status,
            QueryIntent::Communication,
            QueryIntent::General,
        ] {
            for stuck in [vec![], vec![verdict("A", 5, true, WaitingOn::Internal)]] {
                let mut p = payload(intent, stuck);
                for entity in [None, Some("tusd".to_string())] {
                    p.entity = entity;
                    let s = gen().generate_suggestions(&p);
                    assert!((2..=4).contains(&s.len()), "{:?} -> {:?}", intent, s);
                }
            }
        }
    }

    #[test]
    fn test_suggestions_follow_up_on_stuck() {
        let p = payload(
            QueryIntent::Communication,
            vec![verdict("A", 5, true, WaitingOn::Internal)],
        );
        let s = gen().generate_suggestions(&p);
        assert!(s.iter().any(|q| q == "Who is it hung on?"));
    }

    // ---- Error replies ----

    #[test]
    fn test_not_loaded_and_unavailable() {
        assert!(ResponseGenerator::not_loaded_response().answer.contains("No project is loaded"));
        let resp = ResponseGenerator::unavailable_response("tusd", "file missing");
        assert!(resp.answer.contains("'tusd'"));
        assert!(resp.answer.contains("file missing"));
    }
}
