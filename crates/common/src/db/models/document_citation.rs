//! Citation edge between two legal documents

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_citations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Document that contains the citation
    pub source_document_id: Uuid,

    /// Document being cited; unresolved references have no target
    pub target_document_id: Option<Uuid>,

    /// Citation text as extracted upstream
    #[sea_orm(column_type = "Text")]
    pub raw_citation: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub normalized_form: Option<String>,

    /// Extraction confidence; not used by the unweighted ranking
    pub citation_strength: Option<f64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::legal_document::Entity",
        from = "Column::SourceDocumentId",
        to = "super::legal_document::Column::Id",
        on_delete = "Cascade"
    )]
    SourceDocument,

    #[sea_orm(
        belongs_to = "super::legal_document::Entity",
        from = "Column::TargetDocumentId",
        to = "super::legal_document::Column::Id",
        on_delete = "SetNull"
    )]
    TargetDocument,
}

impl ActiveModelBehavior for ActiveModel {}
