//! Postgres-backed corpus source and authority store

use crate::graph::CitationEdge;
use crate::pagerank::{DanglingStrategy, PageRankConfig};
use crate::store::{
    AuthorityStore, CitationSource, CorpusSnapshot, DocumentAuthorityScore, RunLogEntry,
    ScoreUpsert,
};
use chrono::Utc;
use lexrank_common::db::models::CalculationLog;
use lexrank_common::db::Repository;
use lexrank_common::errors::Result;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Store over the shared repository
#[derive(Clone)]
pub struct DbAuthorityStore {
    repo: Repository,
}

impl DbAuthorityStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait::async_trait]
impl CitationSource for DbAuthorityStore {
    #[instrument(skip(self))]
    async fn load_corpus(&self) -> Result<CorpusSnapshot> {
        let documents = self.repo.list_document_ids().await?;
        let edges = self
            .repo
            .list_citation_edges()
            .await?
            .into_iter()
            .map(|row| CitationEdge {
                citing_document_id: row.source_document_id,
                cited_document_id: row.target_document_id,
                strength: row.citation_strength,
            })
            .collect::<Vec<_>>();

        debug!(documents = documents.len(), edges = edges.len(), "Corpus loaded");
        Ok(CorpusSnapshot { documents, edges })
    }
}

#[async_trait::async_trait]
impl AuthorityStore for DbAuthorityStore {
    async fn upsert(&self, update: ScoreUpsert) -> Result<()> {
        self.repo.upsert_authority_score(update).await
    }

    async fn top(&self, limit: usize) -> Result<Vec<DocumentAuthorityScore>> {
        let rows = self.repo.top_authority_scores(limit as u64).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_by_document(&self, document_id: Uuid) -> Result<Option<DocumentAuthorityScore>> {
        let row = self.repo.find_authority_score(document_id).await?;
        Ok(row.map(Into::into))
    }

    async fn record_run(&self, entry: RunLogEntry) -> Result<()> {
        self.repo.insert_calculation_log(to_log_row(entry)).await
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunLogEntry>> {
        let rows = self.repo.recent_calculation_logs(limit as u64).await?;
        Ok(rows.into_iter().map(from_log_row).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }
}

fn to_log_row(entry: RunLogEntry) -> CalculationLog {
    CalculationLog {
        id: entry.id,
        status: entry.status.into(),
        damping_factor: entry.config.damping_factor,
        max_iterations: i32::try_from(entry.config.max_iterations).unwrap_or(i32::MAX),
        convergence_threshold: entry.config.convergence_threshold,
        dangling_strategy: entry.config.dangling_strategy.to_string(),
        documents_processed: entry.documents_processed.map(saturating_i32),
        iterations_run: entry.iterations_run.map(saturating_i32),
        converged: entry.converged,
        avg_pagerank: entry.avg_pagerank,
        max_pagerank: entry.max_pagerank,
        min_pagerank: entry.min_pagerank,
        processing_time_ms: i64::try_from(entry.processing_time_ms).unwrap_or(i64::MAX),
        error_message: entry.error_message,
        started_at: entry.started_at.into(),
        completed_at: entry.completed_at.into(),
    }
}

fn from_log_row(row: CalculationLog) -> RunLogEntry {
    RunLogEntry {
        id: row.id,
        status: row.run_status(),
        config: PageRankConfig {
            damping_factor: row.damping_factor,
            max_iterations: u32::try_from(row.max_iterations).unwrap_or(0),
            convergence_threshold: row.convergence_threshold,
            // Rows are only written by this crate
            dangling_strategy: row.dangling_strategy.parse().unwrap_or(DanglingStrategy::Leak),
        },
        documents_processed: row.documents_processed.map(|v| v.max(0) as usize),
        iterations_run: row.iterations_run.map(|v| v.max(0) as usize),
        converged: row.converged,
        avg_pagerank: row.avg_pagerank,
        max_pagerank: row.max_pagerank,
        min_pagerank: row.min_pagerank,
        processing_time_ms: row.processing_time_ms.max(0) as u64,
        error_message: row.error_message,
        started_at: row.started_at.with_timezone(&Utc),
        completed_at: row.completed_at.with_timezone(&Utc),
    }
}

fn saturating_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
