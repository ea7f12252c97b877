//! LexRank authority core
//!
//! Citation validation, the citation graph and PageRank-based authority
//! scoring over a corpus of legal documents.

pub mod citation;
pub mod db_store;
pub mod engine;
pub mod graph;
pub mod pagerank;
pub mod store;

pub use citation::{
    CitationType, CitationValidator, CitationValidity, ParsedCitation, ValidityStatus,
};
pub use db_store::DbAuthorityStore;
pub use engine::{AuthorityEngine, EngineOptions, RunResult, CALCULATION_VERSION};
pub use graph::{CitationEdge, CitationGraph};
pub use pagerank::{DanglingStrategy, PageRankConfig, PageRankScorer};
pub use store::{
    AuthorityStore, CitationSource, CorpusSnapshot, DocumentAuthorityScore, InMemoryAuthorityStore,
    InMemoryCorpus, RunLogEntry, ScoreUpsert, TopDocument,
};
