//! Legal document entity
//!
//! Documents are owned by the document store; LexRank only reads them to
//! enumerate the corpus.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "legal_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// law, decree, ruling, ...
    #[sea_orm(column_type = "Text", nullable)]
    pub document_type: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::authority_score::Entity")]
    AuthorityScore,
}

impl Related<super::authority_score::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorityScore.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
