//! Entity extraction from free-text questions.
//!
//! The extractor only decides *which* known name a question mentions; how a
//! candidate is scored against the question is a pluggable [`EntityScorer`],
//! so fuzzy or embedding-based matchers can replace the substring default.
//!
//! Candidates carry the [`EntitySource`] they were harvested from. A name
//! from a stronger source always beats one from a weaker source, and the
//! score only breaks ties within a source. Subject keywords are therefore a
//! fallback for questions that name no company, project or domain.

use std::collections::BTreeMap;

use hawk_core::types::{normalize_text, Entity};

/// Candidates shorter than this never match; single letters occur in
/// every question.
const MIN_CANDIDATE_CHARS: usize = 2;

/// Where a known entity name came from. Later variants outrank earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntitySource {
    /// A word from a message subject.
    SubjectKeyword,
    /// The organization label of a sender or recipient domain.
    DomainLabel,
    /// The id of the loaded project.
    ProjectId,
    /// Listed in `analysis.known_entities`.
    Configured,
}

/// Normalized entity names with their strongest source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownEntities {
    names: BTreeMap<String, EntitySource>,
}

impl KnownEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` after normalizing it. A name seen from several sources
    /// keeps the strongest. Returns `false` when nothing is left to add.
    pub fn insert(&mut self, name: &str, source: EntitySource) -> bool {
        let name = normalize_text(name);
        if name.is_empty() {
            return false;
        }
        let slot = self.names.entry(name).or_insert(source);
        if source > *slot {
            *slot = source;
        }
        true
    }

    /// Builder form of [`KnownEntities::insert`].
    pub fn with(mut self, name: &str, source: EntitySource) -> Self {
        self.insert(name, source);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn source(&self, name: &str) -> Option<EntitySource> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EntitySource)> {
        self.names.iter().map(|(name, source)| (name.as_str(), *source))
    }
}

/// Scores a known entity name against a question.
///
/// Both arguments are already normalized (see
/// [`hawk_core::types::normalize_text`]). Returns `None` when the candidate
/// is not mentioned; higher scores win.
pub trait EntityScorer: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> Option<f32>;
}

/// Exact or substring match; longer candidates score higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringScorer;

impl EntityScorer for SubstringScorer {
    fn score(&self, query: &str, candidate: &str) -> Option<f32> {
        if query.contains(candidate) {
            Some(candidate.chars().count() as f32)
        } else {
            None
        }
    }
}

/// Picks the most specific known entity mentioned in a question.
pub struct EntityExtractor {
    scorer: Box<dyn EntityScorer>,
}

impl EntityExtractor {
    /// Extractor using [`SubstringScorer`].
    pub fn new() -> Self {
        Self::with_scorer(SubstringScorer)
    }

    /// Extractor using a custom scoring function.
    pub fn with_scorer(scorer: impl EntityScorer + 'static) -> Self {
        Self {
            scorer: Box::new(scorer),
        }
    }

    /// Return the best known entity mentioned in `query`.
    ///
    /// Candidates are ranked by source first and score second. Matching is
    /// case- and punctuation-insensitive. Ties keep the candidate that sorts
    /// first. An empty query, or one that mentions no known entity, yields
    /// `None`.
    pub fn extract(&self, query: &str, known_entities: &KnownEntities) -> Option<Entity> {
        let normalized_query = normalize_text(query);
        if normalized_query.is_empty() {
            return None;
        }

        let mut best: Option<(EntitySource, f32, &str)> = None;
        for (candidate, source) in known_entities.iter() {
            if candidate.chars().count() < MIN_CANDIDATE_CHARS {
                continue;
            }
            let Some(score) = self.scorer.score(&normalized_query, candidate) else {
                continue;
            };
            let better = match best {
                Some((best_source, best_score, _)) => {
                    source > best_source || (source == best_source && score > best_score)
                }
                None => true,
            };
            if better {
                best = Some((source, score, candidate));
            }
        }

        best.and_then(|(_, _, candidate)| Entity::parse(candidate))
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}
