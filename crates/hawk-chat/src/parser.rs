//! Rule-based query parsing.
//!
//! Classifies what kind of question is asked and spots anaphoric
//! references ("it", "that") that point back to the previous turn.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::QueryIntent;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

struct IntentPatterns {
    bottleneck: Vec<Regex>,
    responsibility: Vec<Regex>,
    status: Vec<Regex>,
    communication: Vec<Regex>,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        // Checked first so "who is it stuck on" reads as a bottleneck question
        bottleneck: mk(&[
            r"(?i)\bstuck\b",
            r"(?i)\bblock(?:ed|ing|er|ers)?\b",
            r"(?i)\bhung\b",
            r"(?i)\bwaiting\b",
            r"(?i)\bpending\b",
            r"(?i)\bdelay(?:ed)?\b",
            r"(?i)\boverdue\b",
            r"(?i)\bbottlenecks?\b",
        ]),
        responsibility: mk(&[
            r"(?i)\bwho\b",
            r"(?i)\bresponsible\b",
            r"(?i)\bowner\b",
            r"(?i)\bowes?\b",
            r"(?i)\bassigned\b",
            r"(?i)\bwhose\s+(?:turn|court)\b",
        ]),
        status: mk(&[
            r"(?i)\bstatus\b",
            r"(?i)\bprogress\b",
            r"(?i)\bupdates?\b",
            r"(?i)\bhow\s+is\b",
            r"(?i)\bwhere\s+are\s+we\b",
        ]),
        communication: mk(&[
            r"(?i)\bcommunications?\b",
            r"(?i)\be-?mails?\b",
            r"(?i)\bmessages?\b",
            r"(?i)\bcontacts?\b",
            r"(?i)\bthreads?\b",
            r"(?i)\bcorrespondence\b",
        ]),
    }
});

static ANAPHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:it|that|this|them|they|those)\b").unwrap());

// =============================================================================
// QueryParser
// =============================================================================

/// Stateless parser for intent and anaphora.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    /// Classify the intent of a raw query string.
    ///
    /// Checks patterns in order: Bottleneck, Responsibility, Status,
    /// Communication. Falls back to `General` if nothing matches.
    pub fn classify_intent(&self, raw_query: &str) -> QueryIntent {
        let pats = &*INTENT_PATTERNS;
        let groups = [
            (&pats.bottleneck, QueryIntent::Bottleneck),
            (&pats.responsibility, QueryIntent::Responsibility),
            (&pats.status, QueryIntent::Status),
            (&pats.communication, QueryIntent::Communication),
        ];

        for (patterns, intent) in groups {
            if patterns.iter().any(|re| re.is_match(raw_query)) {
                return intent;
            }
        }

        QueryIntent::General
    }

    /// Whether the query refers back to something with a pronoun.
    pub fn has_anaphor(&self, raw_query: &str) -> bool {
        ANAPHOR_RE.is_match(raw_query)
    }
}
