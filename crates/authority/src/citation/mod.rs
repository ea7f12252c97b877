//! Citation validation
//!
//! Gatekeeper between upstream citation extraction and the citation graph:
//! a parsed reference only becomes an edge once it passes the structural
//! rules of its citation type.

mod rules;
mod validator;

pub use rules::{CitationRules, CONSTITUTIONAL_COURT_FOUNDED, KNOWN_CODES, REPUBLIC_FOUNDED};
pub use validator::{CitationValidator, DEFAULT_VALIDITY_TTL, VALIDATION_SOURCE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of legal reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    Law,
    Decree,
    ConstitutionalCourt,
    SupremeCourt,
    Resolution,
    Article,
    Code,
    #[serde(other)]
    Other,
}

impl CitationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Law => "law",
            CitationType::Decree => "decree",
            CitationType::ConstitutionalCourt => "constitutional_court",
            CitationType::SupremeCourt => "supreme_court",
            CitationType::Resolution => "resolution",
            CitationType::Article => "article",
            CitationType::Code => "code",
            CitationType::Other => "other",
        }
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named parts of a reference. Which parts are present depends on the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,

    /// Ruling kind for court citations (C, T, SU), code name for codes
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A structured legal reference produced by upstream extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCitation {
    /// Citation text as it appeared in the document
    #[serde(default)]
    pub raw: String,

    #[serde(rename = "type", default)]
    pub citation_type: Option<CitationType>,

    /// Canonical form, used as the cache key
    #[serde(default)]
    pub normalized_form: Option<String>,

    #[serde(default)]
    pub components: CitationComponents,
}

impl ParsedCitation {
    /// Create a citation of the given type with no components
    pub fn new(
        raw: impl Into<String>,
        citation_type: CitationType,
        normalized_form: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            citation_type: Some(citation_type),
            normalized_form: Some(normalized_form.into()),
            components: CitationComponents::default(),
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.components.number = Some(number.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.components.year = Some(year.into());
        self
    }

    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.components.article = Some(article.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.components.kind = Some(kind.into());
        self
    }

    /// Cache key; blank normalized forms count as absent
    pub fn cache_key(&self) -> Option<&str> {
        self.normalized_form
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// External status of a cited norm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityStatus {
    Valid,
    Invalid,
    /// Placeholder until an external source resolves the status
    Unknown,
    Superseded,
}

/// Cached validation outcome for one normalized citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationValidity {
    pub is_valid: bool,
    pub status: ValidityStatus,
    pub last_checked: DateTime<Utc>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_citation() {
        let json = r#"{
            "raw": "Ley 45 de 2021",
            "type": "law",
            "normalized_form": "ley-45-2021",
            "components": { "number": "045", "year": "2021" }
        }"#;

        let citation: ParsedCitation = serde_json::from_str(json).unwrap();
        assert_eq!(citation.citation_type, Some(CitationType::Law));
        assert_eq!(citation.components.number.as_deref(), Some("045"));
        assert_eq!(citation.cache_key(), Some("ley-45-2021"));
    }

    #[test]
    fn test_unknown_type_maps_to_other() {
        let json = r#"{"raw": "Circular 3", "type": "circular", "normalized_form": "circ-3"}"#;
        let citation: ParsedCitation = serde_json::from_str(json).unwrap();
        assert_eq!(citation.citation_type, Some(CitationType::Other));
    }

    #[test]
    fn test_component_type_field_name() {
        let citation =
            ParsedCitation::new("C-123 de 2015", CitationType::ConstitutionalCourt, "cc-c-123-2015")
                .with_kind("C");
        let value = serde_json::to_value(&citation).unwrap();
        assert_eq!(value["type"], "constitutional_court");
        assert_eq!(value["components"]["type"], "C");
    }

    #[test]
    fn test_blank_normalized_form_has_no_key() {
        let mut citation = ParsedCitation::new("Ley 1", CitationType::Law, "   ");
        assert_eq!(citation.cache_key(), None);
        citation.normalized_form = None;
        assert_eq!(citation.cache_key(), None);
    }
}
