//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted citation edge with a resolved target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CitationEdgeRow {
    pub source_document_id: Uuid,
    pub target_document_id: Uuid,
    pub citation_strength: Option<f64>,
}

/// Score fields written for one document at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpsert {
    pub document_id: Uuid,
    pub pagerank_score: f64,
    pub citation_in_count: i32,
    pub citation_out_count: i32,
    pub h_index: i32,
    pub calculation_version: String,
    pub convergence_iterations: i32,
    pub calculated_at: DateTime<Utc>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Corpus Operations
    // ========================================================================

    /// List every document id in the corpus, ordered by id
    pub async fn list_document_ids(&self) -> Result<Vec<Uuid>> {
        LegalDocumentEntity::find()
            .select_only()
            .column(LegalDocumentColumn::Id)
            .order_by_asc(LegalDocumentColumn::Id)
            .into_tuple::<Uuid>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Enumerate all citation edges with a resolved target in one query.
    ///
    /// Both adjacency views of the graph are built from this single
    /// enumeration.
    pub async fn list_citation_edges(&self) -> Result<Vec<CitationEdgeRow>> {
        let rows = DocumentCitationEntity::find()
            .select_only()
            .column(DocumentCitationColumn::SourceDocumentId)
            .column(DocumentCitationColumn::TargetDocumentId)
            .column(DocumentCitationColumn::CitationStrength)
            .filter(DocumentCitationColumn::TargetDocumentId.is_not_null())
            .into_tuple::<(Uuid, Option<Uuid>, Option<f64>)>()
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(source, target, strength)| {
                target.map(|target| CitationEdgeRow {
                    source_document_id: source,
                    target_document_id: target,
                    citation_strength: strength,
                })
            })
            .collect())
    }

    // ========================================================================
    // Authority Score Operations
    // ========================================================================

    /// Insert or overwrite the score row of a document
    pub async fn upsert_authority_score(&self, score: ScoreUpsert) -> Result<()> {
        let row = AuthorityScoreActiveModel {
            document_id: Set(score.document_id),
            pagerank_score: Set(score.pagerank_score),
            weighted_pagerank: Set(score.pagerank_score),
            citation_count: Set(score.citation_in_count + score.citation_out_count),
            citation_in_count: Set(score.citation_in_count),
            citation_out_count: Set(score.citation_out_count),
            h_index: Set(score.h_index),
            last_calculated: Set(score.calculated_at.into()),
            calculation_version: Set(score.calculation_version),
            convergence_iterations: Set(score.convergence_iterations),
        };

        AuthorityScoreEntity::insert(row)
            .on_conflict(
                OnConflict::column(AuthorityScoreColumn::DocumentId)
                    .update_columns([
                        AuthorityScoreColumn::PagerankScore,
                        AuthorityScoreColumn::WeightedPagerank,
                        AuthorityScoreColumn::CitationCount,
                        AuthorityScoreColumn::CitationInCount,
                        AuthorityScoreColumn::CitationOutCount,
                        AuthorityScoreColumn::HIndex,
                        AuthorityScoreColumn::LastCalculated,
                        AuthorityScoreColumn::CalculationVersion,
                        AuthorityScoreColumn::ConvergenceIterations,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.write_conn())
            .await?;

        Ok(())
    }

    /// Highest ranked documents, ties broken by document id
    pub async fn top_authority_scores(&self, limit: u64) -> Result<Vec<AuthorityScore>> {
        AuthorityScoreEntity::find()
            .order_by_desc(AuthorityScoreColumn::PagerankScore)
            .order_by_asc(AuthorityScoreColumn::DocumentId)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find the score row of a document
    pub async fn find_authority_score(&self, document_id: Uuid) -> Result<Option<AuthorityScore>> {
        AuthorityScoreEntity::find_by_id(document_id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Calculation Log Operations
    // ========================================================================

    /// Append a calculation log row
    pub async fn insert_calculation_log(&self, log: CalculationLog) -> Result<()> {
        let row = CalculationLogActiveModel {
            id: Set(log.id),
            status: Set(log.status),
            damping_factor: Set(log.damping_factor),
            max_iterations: Set(log.max_iterations),
            convergence_threshold: Set(log.convergence_threshold),
            dangling_strategy: Set(log.dangling_strategy),
            documents_processed: Set(log.documents_processed),
            iterations_run: Set(log.iterations_run),
            converged: Set(log.converged),
            avg_pagerank: Set(log.avg_pagerank),
            max_pagerank: Set(log.max_pagerank),
            min_pagerank: Set(log.min_pagerank),
            processing_time_ms: Set(log.processing_time_ms),
            error_message: Set(log.error_message),
            started_at: Set(log.started_at),
            completed_at: Set(log.completed_at),
        };

        CalculationLogEntity::insert(row)
            .exec_without_returning(self.write_conn())
            .await?;

        Ok(())
    }

    /// Most recent calculation logs, newest first
    pub async fn recent_calculation_logs(&self, limit: u64) -> Result<Vec<CalculationLog>> {
        CalculationLogEntity::find()
            .order_by_desc(CalculationLogColumn::StartedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
