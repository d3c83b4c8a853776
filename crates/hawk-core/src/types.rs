use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Text normalization
// =============================================================================

/// Normalize free text for entity comparison.
///
/// Lower-cases, turns every non-alphanumeric character into a space and
/// collapses runs of whitespace, so `"K1-K12?"` becomes `"k1 k12"`.
pub fn normalize_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Email addresses
// =============================================================================

/// Extract the bare address from a header like `"Jane Doe <jane@tusd.edu>"`.
///
/// Returns `None` when the field does not contain a usable `local@domain`.
pub fn extract_email_address(field: &str) -> Option<String> {
    let trimmed = field.trim();
    let candidate = match (trimmed.find('<'), trimmed.rfind('>')) {
        (Some(start), Some(end)) if end > start => &trimmed[start + 1..end],
        _ => trimmed,
    };
    let addr = candidate.trim().trim_matches('"').to_lowercase();
    let at = addr.rfind('@')?;
    if at == 0 || at + 1 >= addr.len() || addr.contains(char::is_whitespace) {
        return None;
    }
    Some(addr)
}

/// Domain part of a header or address, lower-cased.
pub fn extract_domain(field: &str) -> Option<String> {
    let addr = extract_email_address(field)?;
    addr.rfind('@').map(|at| addr[at + 1..].to_string())
}

/// A domain is well-formed when it has at least two dot-separated labels of
/// ASCII alphanumerics and hyphens.
pub fn is_well_formed_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// True when `domain` is `pattern` or one of its subdomains.
pub fn domain_matches(domain: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().trim_start_matches('@').to_lowercase();
    if pattern.is_empty() {
        return false;
    }
    domain == pattern || domain.ends_with(&format!(".{}", pattern))
}

// =============================================================================
// CommunicationRecord
// =============================================================================

static REPLY_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:(?:re|fwd?|fw)\s*:\s*)+").unwrap());

/// Subject with any leading `Re:` / `Fwd:` chain removed.
pub fn strip_reply_prefixes(subject: &str) -> &str {
    match REPLY_PREFIX_RE.find(subject) {
        Some(m) => subject[m.end()..].trim(),
        None => subject.trim(),
    }
}

/// A single normalized email message of the loaded project.
///
/// Field names of the mailbox export (`from`, `to`, `date`) are accepted as
/// aliases. A missing or unparseable timestamp deserializes to `None`; such
/// records load fine and are skipped by analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "from")]
    pub sender: Option<String>,
    #[serde(default, alias = "to", deserialize_with = "de_recipients")]
    pub recipients: Vec<String>,
    #[serde(default, alias = "preview", alias = "snippet")]
    pub body: String,
    #[serde(default, alias = "date", deserialize_with = "de_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "thread")]
    pub thread_id: Option<String>,
}

impl CommunicationRecord {
    /// Records without a timestamp or a parseable sender cannot be analyzed.
    pub fn is_well_formed(&self) -> bool {
        self.timestamp.is_some() && self.sender_address().is_some()
    }

    /// Bare sender address, if the sender field holds one.
    pub fn sender_address(&self) -> Option<String> {
        self.sender.as_deref().and_then(extract_email_address)
    }

    /// Sender domain, if the sender field holds an address.
    pub fn sender_domain(&self) -> Option<String> {
        self.sender.as_deref().and_then(extract_domain)
    }

    /// Domains of every recipient that holds an address.
    pub fn recipient_domains(&self) -> Vec<String> {
        self.recipients
            .iter()
            .filter_map(|r| extract_domain(r))
            .collect()
    }

    /// Key grouping this record into a conversation.
    ///
    /// The explicit thread id wins; otherwise the subject without reply
    /// prefixes, lower-cased.
    pub fn thread_key(&self) -> String {
        match self.thread_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => strip_reply_prefixes(&self.subject).to_lowercase(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecipients {
    One(String),
    Many(Vec<String>),
}

fn de_recipients<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawRecipients>::deserialize(deserializer)?;
    let list = match raw {
        None => Vec::new(),
        Some(RawRecipients::One(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(RawRecipients::Many(v)) => v,
    };
    Ok(list)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

fn de_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawTimestamp::Epoch(secs)) => Utc.timestamp_opt(secs, 0).single(),
        Some(RawTimestamp::Text(s)) => parse_timestamp(&s),
    })
}

/// Parse an RFC 3339 or RFC 2822 (email `Date:` header) timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// Entity
// =============================================================================

/// Normalized company or project name used as a filter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(String);

impl Entity {
    /// Normalize `raw`; `None` if nothing meaningful is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Entity(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Verdicts
// =============================================================================

/// The party expected to send the next message on a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitingOn {
    /// The organization owes a reply.
    Internal,
    /// The outside party owes a reply.
    External,
    /// The sender could not be classified.
    Unknown,
}

impl WaitingOn {
    pub const ALL: [WaitingOn; 3] = [WaitingOn::Internal, WaitingOn::External, WaitingOn::Unknown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WaitingOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-thread staleness judgment, derived from the most recent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckVerdict {
    pub thread_id: String,
    pub subject: String,
    pub is_stuck: bool,
    /// The representative message reads like it expects a reply.
    pub awaiting_reply: bool,
    pub days_waiting: i64,
    pub waiting_on: WaitingOn,
    /// Address expected to reply, when one can be named.
    pub responsible_party: Option<String>,
    pub last_sender: Option<String>,
    pub last_activity: DateTime<Utc>,
}
