//! Authority scoring engine
//!
//! Runs one PageRank batch end to end: load the corpus, build the graph,
//! iterate, persist every score, then append exactly one run log entry.
//! Runs are serialized by an internal lock.

use crate::graph::CitationGraph;
use crate::pagerank::{h_index, PageRankConfig, PageRankOutcome, PageRankScorer};
use crate::store::{
    AuthorityStore, CitationSource, DocumentAuthorityScore, RunLogEntry, ScoreUpsert, TopDocument,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, TryStreamExt};
use lexrank_common::config::PageRankSettings;
use lexrank_common::db::models::RunStatus;
use lexrank_common::errors::{AppError, Result};
use lexrank_common::metrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Algorithm tag stored with every score row
pub const CALCULATION_VERSION: &str = "pagerank-v1";

/// Execution knobs that do not change the computed ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Concurrent score upserts while persisting
    pub persist_concurrency: usize,

    /// Fail the run once it exceeds this duration
    pub run_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            persist_concurrency: 16,
            run_timeout: None,
        }
    }
}

impl From<&PageRankSettings> for EngineOptions {
    fn from(settings: &PageRankSettings) -> Self {
        Self {
            persist_concurrency: settings.persist_concurrency.max(1),
            run_timeout: settings
                .run_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub documents_processed: usize,
    pub iterations_run: usize,
    pub converged: bool,
    pub avg_pagerank: f64,
    pub max_pagerank: f64,
    pub min_pagerank: f64,
    pub processing_time_ms: u64,
    pub edges_processed: usize,
    pub dangling_documents: usize,
    pub config: PageRankConfig,
}

/// Batch PageRank over the citation corpus
pub struct AuthorityEngine {
    source: Arc<dyn CitationSource>,
    store: Arc<dyn AuthorityStore>,
    defaults: PageRankConfig,
    options: EngineOptions,
    run_lock: Mutex<()>,
    running: AtomicBool,
}

impl AuthorityEngine {
    pub fn new(
        source: Arc<dyn CitationSource>,
        store: Arc<dyn AuthorityStore>,
        defaults: PageRankConfig,
    ) -> Self {
        Self {
            source,
            store,
            defaults,
            options: EngineOptions::default(),
            run_lock: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    /// Engine configured from the `pagerank` settings section
    pub fn from_settings(
        source: Arc<dyn CitationSource>,
        store: Arc<dyn AuthorityStore>,
        settings: &PageRankSettings,
    ) -> Result<Self> {
        let defaults = PageRankConfig::from_settings(settings)?;
        Ok(Self::new(source, store, defaults).with_options(EngineOptions::from(settings)))
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Run configuration used when a caller passes none
    pub fn defaults(&self) -> &PageRankConfig {
        &self.defaults
    }

    /// Whether a run is in flight; never touches the run lock
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Score the whole corpus and persist the result.
    ///
    /// Fails fast with `RunInProgress` while another run holds the lock;
    /// that rejection is not logged as a run. Every other failure after
    /// the run started is appended to the run log before it is returned.
    #[instrument(skip(self, config))]
    pub async fn calculate_page_rank(&self, config: Option<PageRankConfig>) -> Result<RunResult> {
        let config = config.unwrap_or(self.defaults);
        config.ensure_valid()?;

        let _guard = self.run_lock.try_lock().map_err(|_| AppError::RunInProgress)?;
        let _running = RunningFlag::raise(&self.running);

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();

        info!(
            %run_id,
            damping_factor = config.damping_factor,
            max_iterations = config.max_iterations,
            convergence_threshold = config.convergence_threshold,
            dangling_strategy = %config.dangling_strategy,
            "Starting PageRank run"
        );

        let result = match self.options.run_timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(run_id, config))
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::RunTimeout {
                        timeout_ms: limit.as_millis() as u64,
                    })
                }),
            None => self.execute(run_id, config).await,
        };

        let elapsed = timer.elapsed();
        let processing_time_ms = elapsed.as_millis() as u64;

        let result = match result {
            Ok(mut run) => {
                run.processing_time_ms = processing_time_ms;
                let entry = completed_entry(&run, started_at);
                match self.store.record_run(entry).await {
                    Ok(()) => Ok(run),
                    Err(e) => Err(e.into_persistence()),
                }
            }
            Err(e) => {
                self.record_failure(run_id, config, started_at, processing_time_ms, &e)
                    .await;
                Err(e)
            }
        };

        match &result {
            Ok(run) => {
                metrics::record_pagerank_run(
                    elapsed.as_secs_f64(),
                    true,
                    run.documents_processed,
                    run.iterations_run,
                    run.converged,
                );
                if !run.converged {
                    warn!(
                        %run_id,
                        iterations = run.iterations_run,
                        "PageRank stopped at the iteration budget without converging"
                    );
                }
                info!(
                    %run_id,
                    documents = run.documents_processed,
                    iterations = run.iterations_run,
                    converged = run.converged,
                    duration_ms = processing_time_ms,
                    "PageRank run completed"
                );
            }
            Err(e) => {
                metrics::record_pagerank_run(elapsed.as_secs_f64(), false, 0, 0, false);
                error!(
                    %run_id,
                    error = %e,
                    duration_ms = processing_time_ms,
                    "PageRank run failed"
                );
            }
        }

        result
    }

    async fn execute(&self, run_id: Uuid, config: PageRankConfig) -> Result<RunResult> {
        let corpus = self.source.load_corpus().await?;
        let (graph, summary) = CitationGraph::from_corpus(corpus.documents, corpus.edges);

        debug!(
            %run_id,
            documents = summary.documents,
            edges = summary.edges,
            duplicate_edges = summary.duplicate_edges,
            dropped_edges = summary.dropped_edges,
            "Citation graph built"
        );

        let outcome = PageRankScorer::new(config).compute(&graph)?;
        self.persist(&graph, &outcome).await?;

        let stats = outcome.stats();
        Ok(RunResult {
            run_id,
            documents_processed: graph.node_count(),
            iterations_run: outcome.iterations,
            converged: outcome.converged,
            avg_pagerank: stats.avg,
            max_pagerank: stats.max,
            min_pagerank: stats.min,
            processing_time_ms: 0,
            edges_processed: graph.edge_count(),
            dangling_documents: graph.dangling_count(),
            config,
        })
    }

    /// Upsert each document exactly once
    async fn persist(&self, graph: &CitationGraph, outcome: &PageRankOutcome) -> Result<()> {
        let calculated_at = Utc::now();
        let convergence_iterations = saturating_i32(outcome.iterations);
        let store = &self.store;

        let updates = (0..graph.node_count()).map(|idx| {
            let citation_in_count = graph.in_degree(idx);
            Ok::<_, AppError>(ScoreUpsert {
                document_id: graph.document_id(idx),
                pagerank_score: outcome.ranks[idx],
                citation_in_count: saturating_i32(citation_in_count),
                citation_out_count: saturating_i32(graph.out_degree(idx)),
                h_index: h_index(citation_in_count),
                calculation_version: CALCULATION_VERSION.to_string(),
                convergence_iterations,
                calculated_at,
            })
        });

        stream::iter(updates)
            .try_for_each_concurrent(self.options.persist_concurrency.max(1), |update| async move {
                store.upsert(update).await.map_err(AppError::into_persistence)
            })
            .await
    }

    async fn record_failure(
        &self,
        run_id: Uuid,
        config: PageRankConfig,
        started_at: DateTime<Utc>,
        processing_time_ms: u64,
        cause: &AppError,
    ) {
        let entry = RunLogEntry {
            id: run_id,
            status: RunStatus::Failed,
            config,
            documents_processed: None,
            iterations_run: None,
            converged: None,
            avg_pagerank: None,
            max_pagerank: None,
            min_pagerank: None,
            processing_time_ms,
            error_message: Some(cause.to_string()),
            started_at,
            completed_at: Utc::now(),
        };

        if let Err(e) = self.store.record_run(entry).await {
            error!(%run_id, error = %e, "Failed to record failed PageRank run");
        }
    }

    /// Highest ranked documents
    pub async fn get_top_documents(&self, limit: usize) -> Result<Vec<TopDocument>> {
        let scores = self.store.top(limit).await?;
        Ok(scores.into_iter().map(TopDocument::from).collect())
    }

    /// Stored authority of a document; `None` if it was never scored
    pub async fn get_document_authority(
        &self,
        document_id: Uuid,
    ) -> Result<Option<DocumentAuthorityScore>> {
        self.store.get_by_document(document_id).await
    }

    /// Latest run log entries, newest first
    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<RunLogEntry>> {
        self.store.recent_runs(limit).await
    }

    /// Check the backing store
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Trigger a run every `every`, skipping ticks while a run is in flight
    pub async fn run_scheduled(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if self.is_running() {
                debug!("Scheduled PageRank run skipped, a run is in flight");
                continue;
            }

            // Failures are logged and recorded by the run itself
            if let Err(AppError::RunInProgress) = self.calculate_page_rank(None).await {
                debug!("Scheduled PageRank run skipped, a run is in flight");
            }
        }
    }
}

/// Marks a run in flight until dropped, including on cancellation
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn completed_entry(run: &RunResult, started_at: DateTime<Utc>) -> RunLogEntry {
    RunLogEntry {
        id: run.run_id,
        status: RunStatus::Completed,
        config: run.config,
        documents_processed: Some(run.documents_processed),
        iterations_run: Some(run.iterations_run),
        converged: Some(run.converged),
        avg_pagerank: Some(run.avg_pagerank),
        max_pagerank: Some(run.max_pagerank),
        min_pagerank: Some(run.min_pagerank),
        processing_time_ms: run.processing_time_ms,
        error_message: None,
        started_at,
        completed_at: Utc::now(),
    }
}

fn saturating_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
