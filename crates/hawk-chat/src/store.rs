//! In-memory message store for the loaded project.

use std::sync::Arc;

use hawk_core::types::{domain_matches, normalize_text, strip_reply_prefixes, CommunicationRecord};

use crate::extractor::{EntitySource, KnownEntities};

/// Mailbox providers whose domain says nothing about the company.
static GENERIC_PROVIDERS: &[&str] = &[
    "gmail", "googlemail", "outlook", "hotmail", "live", "yahoo", "icloud", "me", "aol",
    "proton", "protonmail", "msn",
];

// Subject words that never name a company or project
static STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "about", "into", "this", "that", "these", "those",
    "are", "was", "were", "has", "have", "had", "will", "would", "can", "could", "should",
    "you", "your", "our", "their", "its", "not", "but", "all", "any", "new", "next", "last",
    "re", "fw", "fwd", "status", "update", "updates", "progress", "email", "emails", "message",
    "messages", "communication", "communications", "thread", "meeting", "call", "follow",
    "followup", "question", "questions", "request", "please", "thanks", "regarding", "who",
    "what", "when", "where", "why", "how", "stuck", "waiting", "pending", "blocked",
    // question framing
    "related", "relating", "anything", "everything", "show", "see", "tell", "know", "there",
    "recent", "latest",
];

/// Immutable set of communication records for one loaded project.
///
/// Records are shared by `Arc` so match results can outlive a query without
/// copying message bodies.
#[derive(Debug, Clone)]
pub struct MessageStore {
    project_id: String,
    records: Vec<Arc<CommunicationRecord>>,
}

impl MessageStore {
    /// Build a store from the loader output.
    pub fn new(project_id: impl Into<String>, records: Vec<CommunicationRecord>) -> Self {
        Self {
            project_id: project_id.into(),
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn records(&self) -> &[Arc<CommunicationRecord>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records missing a timestamp or a usable sender.
    pub fn malformed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_well_formed()).count()
    }

    /// Company and project names seen in the loaded data, normalized.
    ///
    /// Includes the project id, the leading label of every non-internal
    /// sender or recipient domain, and subject keywords, each tagged with
    /// its source.
    pub fn known_entities(&self, internal_domains: &[String]) -> KnownEntities {
        let mut known = KnownEntities::new();
        known.insert(&self.project_id, EntitySource::ProjectId);

        for record in &self.records {
            let domains = record
                .sender_domain()
                .into_iter()
                .chain(record.recipient_domains());
            for domain in domains {
                if internal_domains.iter().any(|d| domain_matches(&domain, d)) {
                    continue;
                }
                if let Some(label) = organization_label(&domain) {
                    known.insert(&label, EntitySource::DomainLabel);
                }
            }

            for word in normalize_text(strip_reply_prefixes(&record.subject)).split(' ') {
                if is_subject_keyword(word) {
                    known.insert(word, EntitySource::SubjectKeyword);
                }
            }
        }

        known
    }
}

/// `"tusd"` for `"tusd.edu"`; `None` for generic mailbox providers.
fn organization_label(domain: &str) -> Option<String> {
    let label = normalize_text(domain.split('.').next()?);
    if label.chars().count() < 2 || GENERIC_PROVIDERS.contains(&label.as_str()) {
        return None;
    }
    Some(label)
}

fn is_subject_keyword(word: &str) -> bool {
    word.chars().count() >= 3
        && !STOP_WORDS.contains(&word)
        && !word.chars().all(|c| c.is_ascii_digit())
}
