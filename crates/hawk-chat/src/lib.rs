//! Conversational analysis engine for Hawk.
//!
//! Extracts the company or project a question is about, retrieves the
//! matching messages of the loaded project, judges which threads are stuck
//! and who owes the next reply, and keeps per-session dialogue memory.

pub mod analyzer;
pub mod context;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod matcher;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod response;
pub mod session;
pub mod store;
pub mod types;

pub use analyzer::{BottleneckAnalyzer, ThreadAnalysis};
pub use context::{FollowUpResolver, TurnHistory};
pub use error::ChatError;
pub use extractor::{EntityExtractor, EntityScorer, EntitySource, KnownEntities, SubstringScorer};
pub use loader::{DataLoader, InMemoryLoader};
pub use matcher::CommunicationMatcher;
pub use orchestrator::AnalysisOrchestrator;
pub use parser::QueryParser;
pub use resolver::{DomainClass, Responsibility, ResponsibilityResolver};
pub use response::ResponseGenerator;
pub use session::{ConversationSession, SessionState};
pub use store::MessageStore;
pub use types::{
    AnswerPayload, ChatResponse, MatchResult, MatchTier, QueryIntent, ScoredMatch, SenderActivity,
    SessionMemory, Turn,
};
