//! SeaORM entity models
//!
//! Database entities for LexRank

mod authority_score;
mod calculation_log;
mod document_citation;
mod legal_document;

pub use legal_document::{
    Entity as LegalDocumentEntity,
    Model as LegalDocument,
    Column as LegalDocumentColumn,
};

pub use document_citation::{
    Entity as DocumentCitationEntity,
    Model as DocumentCitation,
    Column as DocumentCitationColumn,
};

pub use authority_score::{
    Entity as AuthorityScoreEntity,
    Model as AuthorityScore,
    ActiveModel as AuthorityScoreActiveModel,
    Column as AuthorityScoreColumn,
};

pub use calculation_log::{
    Entity as CalculationLogEntity,
    Model as CalculationLog,
    ActiveModel as CalculationLogActiveModel,
    Column as CalculationLogColumn,
    RunStatus,
};
