//! Storage seams of the authority core
//!
//! [`CitationSource`] yields the corpus a run scores; [`AuthorityStore`]
//! keeps per-document scores and the append-only run log. Both have an
//! in-memory implementation here and a Postgres one in `db_store`.

use crate::graph::CitationEdge;
use crate::pagerank::PageRankConfig;
use chrono::{DateTime, Utc};
use lexrank_common::db::models::{AuthorityScore, RunStatus};
use lexrank_common::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub use lexrank_common::db::ScoreUpsert;

/// Documents and resolved citation edges at the start of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusSnapshot {
    pub documents: Vec<Uuid>,
    pub edges: Vec<CitationEdge>,
}

/// Persisted authority of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAuthorityScore {
    pub document_id: Uuid,
    pub pagerank_score: f64,
    /// Mirrors `pagerank_score` until a weighted variant exists
    pub weighted_pagerank: f64,
    pub citation_count: i32,
    pub citation_in_count: i32,
    pub citation_out_count: i32,
    pub h_index: i32,
    pub last_calculated: DateTime<Utc>,
    pub calculation_version: String,
    pub convergence_iterations: i32,
}

impl From<AuthorityScore> for DocumentAuthorityScore {
    fn from(row: AuthorityScore) -> Self {
        Self {
            document_id: row.document_id,
            pagerank_score: row.pagerank_score,
            weighted_pagerank: row.weighted_pagerank,
            citation_count: row.citation_count,
            citation_in_count: row.citation_in_count,
            citation_out_count: row.citation_out_count,
            h_index: row.h_index,
            last_calculated: row.last_calculated.with_timezone(&Utc),
            calculation_version: row.calculation_version,
            convergence_iterations: row.convergence_iterations,
        }
    }
}

impl From<ScoreUpsert> for DocumentAuthorityScore {
    fn from(update: ScoreUpsert) -> Self {
        Self {
            document_id: update.document_id,
            pagerank_score: update.pagerank_score,
            weighted_pagerank: update.pagerank_score,
            citation_count: update.citation_in_count + update.citation_out_count,
            citation_in_count: update.citation_in_count,
            citation_out_count: update.citation_out_count,
            h_index: update.h_index,
            last_calculated: update.calculated_at,
            calculation_version: update.calculation_version,
            convergence_iterations: update.convergence_iterations,
        }
    }
}

/// Entry of a top-K listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDocument {
    pub document_id: Uuid,
    pub pagerank_score: f64,
    pub citation_count: i32,
}

impl From<DocumentAuthorityScore> for TopDocument {
    fn from(score: DocumentAuthorityScore) -> Self {
        Self {
            document_id: score.document_id,
            pagerank_score: score.pagerank_score,
            citation_count: score.citation_count,
        }
    }
}

/// Audit record of one scoring run.
///
/// Failed runs carry an error message and no statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub id: Uuid,
    pub status: RunStatus,
    pub config: PageRankConfig,
    pub documents_processed: Option<usize>,
    pub iterations_run: Option<usize>,
    pub converged: Option<bool>,
    pub avg_pagerank: Option<f64>,
    pub max_pagerank: Option<f64>,
    pub min_pagerank: Option<f64>,
    pub processing_time_ms: u64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Read side of the corpus
#[async_trait::async_trait]
pub trait CitationSource: Send + Sync {
    /// All documents plus every citation edge whose target is resolved
    async fn load_corpus(&self) -> Result<CorpusSnapshot>;
}

/// Score and run-log persistence
#[async_trait::async_trait]
pub trait AuthorityStore: Send + Sync {
    /// Create or overwrite the score row of a document
    async fn upsert(&self, update: ScoreUpsert) -> Result<()>;

    /// Highest scores first, ties by ascending document id
    async fn top(&self, limit: usize) -> Result<Vec<DocumentAuthorityScore>>;

    async fn get_by_document(&self, document_id: Uuid) -> Result<Option<DocumentAuthorityScore>>;

    /// Append one run log entry
    async fn record_run(&self, entry: RunLogEntry) -> Result<()>;

    /// Latest run log entries, newest first
    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunLogEntry>>;

    async fn ping(&self) -> Result<()>;
}

/// Process-local corpus
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    snapshot: RwLock<CorpusSnapshot>,
}

impl InMemoryCorpus {
    pub fn new(snapshot: CorpusSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Build from documents and `(citing, cited)` pairs
    pub fn from_pairs(
        documents: impl IntoIterator<Item = Uuid>,
        pairs: impl IntoIterator<Item = (Uuid, Uuid)>,
    ) -> Self {
        Self::new(CorpusSnapshot {
            documents: documents.into_iter().collect(),
            edges: pairs
                .into_iter()
                .map(|(citing, cited)| CitationEdge::new(citing, cited))
                .collect(),
        })
    }

    /// Replace the corpus seen by the next run
    pub async fn replace(&self, snapshot: CorpusSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[async_trait::async_trait]
impl CitationSource for InMemoryCorpus {
    async fn load_corpus(&self) -> Result<CorpusSnapshot> {
        Ok(self.snapshot.read().await.clone())
    }
}

/// Process-local score store and run log
#[derive(Debug, Default)]
pub struct InMemoryAuthorityStore {
    scores: RwLock<HashMap<Uuid, DocumentAuthorityScore>>,
    runs: RwLock<Vec<RunLogEntry>>,
}

impl InMemoryAuthorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn score_count(&self) -> usize {
        self.scores.read().await.len()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait::async_trait]
impl AuthorityStore for InMemoryAuthorityStore {
    async fn upsert(&self, update: ScoreUpsert) -> Result<()> {
        let score = DocumentAuthorityScore::from(update);
        self.scores.write().await.insert(score.document_id, score);
        Ok(())
    }

    async fn top(&self, limit: usize) -> Result<Vec<DocumentAuthorityScore>> {
        let scores = self.scores.read().await;
        let mut ranked: Vec<DocumentAuthorityScore> = scores.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.pagerank_score
                .total_cmp(&a.pagerank_score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn get_by_document(&self, document_id: Uuid) -> Result<Option<DocumentAuthorityScore>> {
        Ok(self.scores.read().await.get(&document_id).cloned())
    }

    async fn record_run(&self, entry: RunLogEntry) -> Result<()> {
        self.runs.write().await.push(entry);
        Ok(())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunLogEntry>> {
        let runs = self.runs.read().await;
        Ok(runs.iter().rev().take(limit).cloned().collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(n: u128, score: f64, inbound: i32) -> ScoreUpsert {
        ScoreUpsert {
            document_id: Uuid::from_u128(n),
            pagerank_score: score,
            citation_in_count: inbound,
            citation_out_count: 1,
            h_index: 0,
            calculation_version: "test".to_string(),
            convergence_iterations: 3,
            calculated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = InMemoryAuthorityStore::new();
        store.upsert(update(1, 0.2, 4)).await.unwrap();
        store.upsert(update(1, 0.5, 9)).await.unwrap();

        let score = store.get_by_document(Uuid::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(score.pagerank_score, 0.5);
        assert_eq!(score.weighted_pagerank, 0.5);
        assert_eq!(score.citation_count, 10);
        assert_eq!(store.score_count().await, 1);
    }

    #[tokio::test]
    async fn test_top_orders_by_score_then_id() {
        let store = InMemoryAuthorityStore::new();
        store.upsert(update(3, 0.1, 0)).await.unwrap();
        store.upsert(update(2, 0.4, 0)).await.unwrap();
        store.upsert(update(1, 0.4, 0)).await.unwrap();

        let top: Vec<u128> = store
            .top(10)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.document_id.as_u128())
            .collect();
        assert_eq!(top, vec![1, 2, 3]);

        assert_eq!(store.top(1).await.unwrap().len(), 1);
        assert!(store.top(0).await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_document() {
        let store = InMemoryAuthorityStore::new();
        let found = tokio_test::block_on(store.get_by_document(Uuid::from_u128(7)));
        assert!(tokio_test::assert_ok!(found).is_none());
    }

    #[tokio::test]
    async fn test_corpus_replace() {
        let corpus = InMemoryCorpus::from_pairs([Uuid::from_u128(1)], Vec::<(Uuid, Uuid)>::new());
        assert_eq!(corpus.load_corpus().await.unwrap().documents.len(), 1);

        corpus.replace(CorpusSnapshot::default()).await;
        assert!(corpus.load_corpus().await.unwrap().documents.is_empty());
    }
}
