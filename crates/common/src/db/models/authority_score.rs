//! Per-document authority score, one row per scored document

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_authority_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub document_id: Uuid,

    pub pagerank_score: f64,

    /// Reserved for a citation-strength weighted variant
    pub weighted_pagerank: f64,

    pub citation_count: i32,

    pub citation_in_count: i32,

    pub citation_out_count: i32,

    pub h_index: i32,

    pub last_calculated: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text")]
    pub calculation_version: String,

    pub convergence_iterations: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::legal_document::Entity",
        from = "Column::DocumentId",
        to = "super::legal_document::Column::Id",
        on_delete = "Cascade"
    )]
    Document,
}

impl Related<super::legal_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
