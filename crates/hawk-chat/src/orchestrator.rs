//! Analysis orchestrator: wires extractor, matcher, analyzer and resolver.
//!
//! [`AnalysisOrchestrator::answer`] is a pure function of the store, the
//! previous memory and the query; it returns the answer together with the
//! next memory and never touches session state itself.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use hawk_core::config::HawkConfig;
use hawk_core::types::WaitingOn;

use crate::analyzer::BottleneckAnalyzer;
use crate::context::FollowUpResolver;
use crate::error::ChatError;
use crate::extractor::{EntityExtractor, EntityScorer, EntitySource, KnownEntities};
use crate::matcher::CommunicationMatcher;
use crate::parser::QueryParser;
use crate::store::MessageStore;
use crate::types::{AnswerPayload, MatchResult, SenderActivity, SessionMemory};

/// Central coordinator of the analysis pipeline.
pub struct AnalysisOrchestrator {
    parser: QueryParser,
    extractor: EntityExtractor,
    follow_up_resolver: FollowUpResolver,
    matcher: CommunicationMatcher,
    analyzer: BottleneckAnalyzer,
    internal_domains: Vec<String>,
    extra_entities: Vec<String>,
    max_query_length: usize,
}

impl AnalysisOrchestrator {
    /// Build the pipeline from configuration.
    ///
    /// Fails when the configuration lacks internal domains.
    pub fn new(config: &HawkConfig) -> Result<Self, ChatError> {
        config.validate()?;
        let analyzer = BottleneckAnalyzer::from_config(&config.analysis);

        Ok(Self {
            parser: QueryParser::new(),
            extractor: EntityExtractor::new(),
            follow_up_resolver: FollowUpResolver::new(),
            matcher: CommunicationMatcher::new(),
            internal_domains: config.analysis.internal_domains.clone(),
            extra_entities: config.analysis.known_entities.clone(),
            max_query_length: config.chat.max_query_length,
            analyzer,
        })
    }

    /// Replace the entity scoring function.
    pub fn with_scorer(mut self, scorer: impl EntityScorer + 'static) -> Self {
        self.extractor = EntityExtractor::with_scorer(scorer);
        self
    }

    /// Entity names the extractor may pick for this store.
    pub fn known_entities(&self, store: &MessageStore) -> KnownEntities {
        let mut known = store.known_entities(&self.internal_domains);
        for name in &self.extra_entities {
            known.insert(name, EntitySource::Configured);
        }
        known
    }

    /// Answer one question against `store`.
    ///
    /// Runs extraction (falling back to `memory.last_entity` for anaphoric
    /// follow-ups), matching, and thread analysis, and returns the payload
    /// plus the memory for the next turn.
    pub fn answer(
        &self,
        store: &MessageStore,
        memory: &SessionMemory,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<(AnswerPayload, SessionMemory), ChatError> {
        if query.chars().count() > self.max_query_length {
            return Err(ChatError::QueryTooLong(self.max_query_length));
        }

        let intent = self.parser.classify_intent(query);
        let known = self.known_entities(store);
        let extracted = self.extractor.extract(query, &known);
        let (entity, entity_from_memory) =
            self.follow_up_resolver.resolve(query, extracted, memory);

        let matches = self.matcher.find_matches(store, entity.as_ref());
        let analysis = self.analyzer.analyze(matches.records(), now);

        let mut responsibility_summary: BTreeMap<WaitingOn, usize> =
            WaitingOn::ALL.iter().map(|w| (*w, 0)).collect();
        for verdict in &analysis.verdicts {
            *responsibility_summary.entry(verdict.waiting_on).or_insert(0) += 1;
        }

        let threads_analyzed = analysis.verdicts.len();
        let skipped_records = matches.skipped + analysis.skipped;
        let (stuck_threads, rest): (Vec<_>, Vec<_>) =
            analysis.verdicts.into_iter().partition(|v| v.is_stuck);
        let pending_threads = rest.into_iter().filter(|v| v.awaiting_reply).collect();

        let last_activity = matches.records().filter_map(|r| r.timestamp).max();
        let top_senders = sender_activity(&matches);

        debug!(
            query,
            ?intent,
            entity = entity.as_ref().map(|e| e.as_str()).unwrap_or("<none>"),
            entity_from_memory,
            matches = matches.len(),
            stuck = stuck_threads.len(),
            "Answered query"
        );

        let payload = AnswerPayload {
            entity: entity.as_ref().map(|e| e.to_string()),
            entity_from_memory,
            intent,
            total_matches: matches.len(),
            threads_analyzed,
            stuck_threads,
            pending_threads,
            responsibility_summary,
            top_senders,
            skipped_records,
            last_activity,
        };

        let next_memory = SessionMemory {
            last_entity: entity.or_else(|| memory.last_entity.clone()),
            last_matches: matches,
            loaded_project_id: Some(store.project_id().to_string()),
        };

        Ok((payload, next_memory))
    }
}

/// Message count per sender address, most active first, ties by address.
fn sender_activity(matches: &MatchResult) -> Vec<SenderActivity> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for address in matches.records().filter_map(|r| r.sender_address()) {
        *counts.entry(address).or_insert(0) += 1;
    }
    let mut activity: Vec<SenderActivity> = counts
        .into_iter()
        .map(|(sender, messages)| SenderActivity { sender, messages })
        .collect();
    // Stable sort keeps address order among equal counts
    activity.sort_by(|a, b| b.messages.cmp(&a.messages));
    activity
}

// =============================================================================
// Tests
// =============================================================================
