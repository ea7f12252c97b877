//! PageRank calculation audit log
//!
//! One row per run, written after the run finished (successfully or not).
//! Rows are never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Run status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => RunStatus::Completed,
            _ => RunStatus::Failed,
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => "completed".to_string(),
            RunStatus::Failed => "failed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pagerank_calculation_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub damping_factor: f64,

    pub max_iterations: i32,

    pub convergence_threshold: f64,

    #[sea_orm(column_type = "Text")]
    pub dangling_strategy: String,

    pub documents_processed: Option<i32>,

    pub iterations_run: Option<i32>,

    pub converged: Option<bool>,

    pub avg_pagerank: Option<f64>,

    pub max_pagerank: Option<f64>,

    pub min_pagerank: Option<f64>,

    pub processing_time_ms: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub started_at: DateTimeWithTimeZone,

    pub completed_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the run status as an enum
    pub fn run_status(&self) -> RunStatus {
        RunStatus::from(self.status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
