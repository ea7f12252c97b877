//! PageRank-based authority scoring
//!
//! Power iteration with teleportation over the citation graph. Every pass
//! reads only the previous rank table and writes a second one; the tables
//! are swapped afterwards, which makes the result independent of document
//! order.

use crate::graph::CitationGraph;
use lexrank_common::config::PageRankSettings;
use lexrank_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// How rank held by documents without outgoing citations is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingStrategy {
    /// Dangling documents pass nothing on; total rank may fall below 1.0
    #[default]
    Leak,
    /// Dangling mass is spread uniformly over all documents each pass
    Redistribute,
}

impl DanglingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DanglingStrategy::Leak => "leak",
            DanglingStrategy::Redistribute => "redistribute",
        }
    }
}

impl fmt::Display for DanglingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown dangling strategy '{0}' (expected 'leak' or 'redistribute')")]
pub struct ParseDanglingStrategyError(String);

impl FromStr for DanglingStrategy {
    type Err = ParseDanglingStrategyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leak" => Ok(DanglingStrategy::Leak),
            "redistribute" => Ok(DanglingStrategy::Redistribute),
            other => Err(ParseDanglingStrategyError(other.to_string())),
        }
    }
}

/// PageRank configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub damping_factor: f64,

    /// Maximum iterations
    #[validate(range(min = 1))]
    pub max_iterations: u32,

    /// Convergence threshold on the largest per-document change
    #[validate(range(exclusive_min = 0.0))]
    pub convergence_threshold: f64,

    #[serde(default)]
    pub dangling_strategy: DanglingStrategy,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            max_iterations: 100,
            convergence_threshold: 0.0001,
            dangling_strategy: DanglingStrategy::Leak,
        }
    }
}

impl PageRankConfig {
    /// Build run defaults from the service settings
    pub fn from_settings(settings: &PageRankSettings) -> Result<Self> {
        let dangling_strategy = settings
            .dangling_strategy
            .parse::<DanglingStrategy>()
            .map_err(|e: ParseDanglingStrategyError| AppError::Configuration {
                message: e.to_string(),
            })?;

        let config = Self {
            damping_factor: settings.damping_factor,
            max_iterations: settings.max_iterations,
            convergence_threshold: settings.convergence_threshold,
            dangling_strategy,
        };
        config.ensure_valid().map_err(|e| AppError::Configuration {
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Reject parameters outside their domain
    pub fn ensure_valid(&self) -> Result<()> {
        // NaN slips through range checks
        if self.damping_factor.is_nan() || self.convergence_threshold.is_nan() {
            return Err(AppError::Validation {
                message: "PageRank parameters must be numbers".to_string(),
                field: None,
            });
        }

        self.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: e.field_errors().keys().next().map(|f| f.to_string()),
        })
    }
}

/// Final rank table and convergence data of one computation
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankOutcome {
    /// Rank per graph index
    pub ranks: Vec<f64>,

    pub iterations: usize,

    pub converged: bool,

    /// Largest change observed in the last pass
    pub last_delta: f64,
}

/// Aggregate statistics of a rank table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub total: f64,
}

impl PageRankOutcome {
    pub fn stats(&self) -> RankStats {
        if self.ranks.is_empty() {
            return RankStats { avg: 0.0, max: 0.0, min: 0.0, total: 0.0 };
        }

        let total: f64 = self.ranks.iter().sum();
        let max = self.ranks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.ranks.iter().copied().fold(f64::INFINITY, f64::min);

        RankStats {
            avg: total / self.ranks.len() as f64,
            max,
            min,
            total,
        }
    }
}

/// Cheap h-index stand-in: floor(sqrt(incoming citations))
pub fn h_index(citation_in_count: usize) -> i32 {
    (citation_in_count as f64).sqrt().floor() as i32
}

/// PageRank scorer for documents
pub struct PageRankScorer {
    config: PageRankConfig,
}

impl PageRankScorer {
    /// Create a new scorer
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageRankConfig {
        &self.config
    }

    /// Compute PageRank scores for all documents.
    ///
    /// Fails with `EmptyCorpus` on an empty graph. Running out of iterations
    /// is not an error: the outcome reports `converged = false`.
    pub fn compute(&self, graph: &CitationGraph) -> Result<PageRankOutcome> {
        self.config.ensure_valid()?;

        let n = graph.node_count();
        if n == 0 {
            return Err(AppError::EmptyCorpus);
        }

        let n_f64 = n as f64;
        let damping = self.config.damping_factor;
        let teleport = (1.0 - damping) / n_f64;

        // Outgoing share divisor per document, floored at 1
        let out_divisor: Vec<f64> = (0..n)
            .map(|idx| graph.out_degree(idx).max(1) as f64)
            .collect();
        let dangling: Vec<usize> = (0..n).filter(|&idx| graph.out_degree(idx) == 0).collect();

        let mut current = vec![1.0 / n_f64; n];
        let mut next = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;
        let mut last_delta = f64::INFINITY;

        for _ in 0..self.config.max_iterations {
            let dangling_share = match self.config.dangling_strategy {
                DanglingStrategy::Leak => 0.0,
                DanglingStrategy::Redistribute => {
                    damping * dangling.iter().map(|&idx| current[idx]).sum::<f64>() / n_f64
                }
            };

            let mut max_diff: f64 = 0.0;
            for (node, slot) in next.iter_mut().enumerate() {
                // Sum contributions from documents citing this one
                let citation_sum: f64 = graph
                    .in_indices(node)
                    .iter()
                    .map(|&citing| current[citing] / out_divisor[citing])
                    .sum();

                let new_score = teleport + damping * citation_sum + dangling_share;
                max_diff = max_diff.max((new_score - current[node]).abs());
                *slot = new_score;
            }

            std::mem::swap(&mut current, &mut next);
            iterations += 1;
            last_delta = max_diff;

            // Check convergence
            if max_diff < self.config.convergence_threshold {
                converged = true;
                break;
            }
        }

        Ok(PageRankOutcome {
            ranks: current,
            iterations,
            converged,
            last_delta,
        })
    }
}
