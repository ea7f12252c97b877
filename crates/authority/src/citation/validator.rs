//! Citation validator with a per-instance validity cache

use super::{CitationRules, CitationValidity, ParsedCitation, ValidityStatus};
use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use lexrank_common::metrics;
use std::time::Duration;
use tracing::debug;

/// Cached decisions are refreshed after a week
pub const DEFAULT_VALIDITY_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Provenance tag of decisions made by the structural rules
pub const VALIDATION_SOURCE: &str = "internal_validation";

const CACHE_NAME: &str = "citation_validity";

/// Validates parsed citations and caches validity records by normalized form.
///
/// The cache belongs to the instance: two validators never share entries.
/// It is safe to use one validator from many tasks at once.
pub struct CitationValidator {
    rules: CitationRules,
    cache: DashMap<String, CitationValidity>,
    ttl: chrono::Duration,
}

impl Default for CitationValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationValidator {
    /// Create a validator with the default one-week TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_VALIDITY_TTL)
    }

    /// Create a validator with a custom cache TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            rules: CitationRules::new(),
            cache: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Whether the citation is well-formed enough to become a graph edge
    pub fn validate(&self, citation: &ParsedCitation) -> bool {
        self.validate_at(citation, Utc::now())
    }

    /// Same as [`validate`](Self::validate), with an explicit clock
    pub fn validate_at(&self, citation: &ParsedCitation, now: DateTime<Utc>) -> bool {
        let valid = self.rules.check(citation, now.year());

        let citation_type = citation
            .citation_type
            .map(|t| t.as_str())
            .unwrap_or("untyped");
        metrics::record_citation_validation(citation_type, valid);
        debug!(
            normalized_form = citation.cache_key().unwrap_or_default(),
            citation_type,
            valid,
            "Citation validated"
        );

        valid
    }

    /// Cached validity record, recomputed once older than the TTL
    pub fn check_validity(&self, citation: &ParsedCitation) -> CitationValidity {
        self.check_validity_at(citation, Utc::now())
    }

    /// Same as [`check_validity`](Self::check_validity), with an explicit clock
    pub fn check_validity_at(
        &self,
        citation: &ParsedCitation,
        now: DateTime<Utc>,
    ) -> CitationValidity {
        let Some(key) = citation.cache_key() else {
            // Nothing to key on; the structural check fails anyway
            return self.fresh_validity(citation, now);
        };

        let cached = self
            .cache
            .get(key)
            .filter(|entry| now.signed_duration_since(entry.last_checked) < self.ttl)
            .map(|entry| entry.value().clone());

        if let Some(validity) = cached {
            metrics::record_cache(true, CACHE_NAME);
            return validity;
        }

        metrics::record_cache(false, CACHE_NAME);
        let validity = self.fresh_validity(citation, now);
        self.cache.insert(key.to_string(), validity.clone());
        validity
    }

    /// Drop every cached decision
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Citation validity cache cleared");
    }

    /// Number of cached decisions
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn fresh_validity(&self, citation: &ParsedCitation, now: DateTime<Utc>) -> CitationValidity {
        CitationValidity {
            is_valid: self.validate_at(citation, now),
            status: ValidityStatus::Unknown,
            last_checked: now,
            source: VALIDATION_SOURCE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::CitationType;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn law(number: &str, year: &str) -> ParsedCitation {
        ParsedCitation::new(
            format!("Ley {} de {}", number, year),
            CitationType::Law,
            format!("ley-{}-{}", number, year),
        )
        .with_number(number)
        .with_year(year)
    }

    #[test]
    fn test_reference_examples() {
        let validator = CitationValidator::new();
        let now = at(2025, 6, 1);

        assert!(validator.validate_at(&law("045", "2021"), now));
        assert!(!validator.validate_at(&law("045", "1500"), now));

        let ruling =
            ParsedCitation::new("C-12-34/07", CitationType::ConstitutionalCourt, "cc-12-34-07")
                .with_kind("C")
                .with_number("12-34")
                .with_year("07");
        assert!(!validator.validate_at(&ruling, now));

        let code =
            ParsedCitation::new("Código Civil, art. 1602", CitationType::Code, "codigo-civil")
                .with_kind("Código Civil");
        assert!(validator.validate_at(&code, now));
    }

    #[test]
    fn test_upper_bound_follows_clock() {
        let validator = CitationValidator::new();
        let citation = law("10", "2025");

        assert!(!validator.validate_at(&citation, at(2024, 12, 31)));
        assert!(validator.validate_at(&citation, at(2025, 1, 1)));
    }

    #[test]
    fn test_validate_uses_current_year() {
        let validator = CitationValidator::new();
        let this_year = Utc::now().year().to_string();
        assert!(validator.validate(&law("100", &this_year)));
    }

    #[test]
    fn test_check_validity_fresh_record() {
        let validator = CitationValidator::new();
        let now = at(2025, 6, 1);

        let validity = validator.check_validity_at(&law("045", "2021"), now);
        assert!(validity.is_valid);
        assert_eq!(validity.status, ValidityStatus::Unknown);
        assert_eq!(validity.source, VALIDATION_SOURCE);
        assert_eq!(validity.last_checked, now);
        assert_eq!(validator.cache_len(), 1);
    }

    #[test]
    fn test_check_validity_cached_within_ttl() {
        let validator = CitationValidator::new();
        let first_seen = at(2025, 6, 1);
        let citation = law("045", "2021");

        let first = validator.check_validity_at(&citation, first_seen);
        let second = validator.check_validity_at(&citation, first_seen + chrono::Duration::days(6));

        assert_eq!(first, second);
        assert_eq!(second.last_checked, first_seen);
    }

    #[test]
    fn test_check_validity_refreshed_after_ttl() {
        let validator = CitationValidator::new();
        let first_seen = at(2025, 6, 1);
        let later = first_seen + chrono::Duration::days(7);
        let citation = law("045", "2021");

        let first = validator.check_validity_at(&citation, first_seen);
        let refreshed = validator.check_validity_at(&citation, later);

        assert_eq!(refreshed.last_checked, later);
        assert_ne!(first, refreshed);
        assert_eq!(validator.cache_len(), 1);
    }

    #[test]
    fn test_cached_decision_is_keyed_by_normalized_form() {
        let validator = CitationValidator::new();
        let now = at(2025, 6, 1);

        let valid = law("045", "2021");
        let mut same_key = law("045", "1500");
        same_key.normalized_form = valid.normalized_form.clone();

        assert!(validator.check_validity_at(&valid, now).is_valid);
        // Same key within the TTL: the cached decision wins
        assert!(validator.check_validity_at(&same_key, now).is_valid);
    }

    #[test]
    fn test_missing_key_is_not_cached() {
        let validator = CitationValidator::new();
        let mut citation = law("045", "2021");
        citation.normalized_form = None;

        let validity = validator.check_validity_at(&citation, at(2025, 6, 1));
        assert!(!validity.is_valid);
        assert_eq!(validator.cache_len(), 0);
    }

    #[test]
    fn test_clear_cache() {
        let validator = CitationValidator::new();
        let now = at(2025, 6, 1);
        validator.check_validity_at(&law("1", "2001"), now);
        validator.check_validity_at(&law("2", "2002"), now);
        assert_eq!(validator.cache_len(), 2);

        validator.clear_cache();
        assert_eq!(validator.cache_len(), 0);
    }

    #[test]
    fn test_instances_do_not_share_cache() {
        let a = CitationValidator::new();
        let b = CitationValidator::with_ttl(Duration::from_secs(60));
        a.check_validity_at(&law("1", "2001"), at(2025, 6, 1));

        assert_eq!(a.cache_len(), 1);
        assert_eq!(b.cache_len(), 0);
    }

    #[test]
    fn test_short_ttl() {
        let validator = CitationValidator::with_ttl(Duration::from_secs(60));
        let now = at(2025, 6, 1);
        let citation = law("1", "2001");

        validator.check_validity_at(&citation, now);
        let refreshed = validator.check_validity_at(&citation, now + chrono::Duration::seconds(61));
        assert_eq!(refreshed.last_checked, now + chrono::Duration::seconds(61));
    }

    #[tokio::test]
    async fn test_concurrent_checks_keep_entries_separate() {
        let validator = Arc::new(CitationValidator::new());
        let now = at(2025, 6, 1);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let validator = Arc::clone(&validator);
                tokio::spawn(async move {
                    let year = if i % 2 == 0 { "2001" } else { "1500" };
                    let citation = law(&i.to_string(), year);
                    (i, validator.check_validity_at(&citation, now).is_valid)
                })
            })
            .collect();

        for task in tasks {
            let (i, valid) = task.await.unwrap();
            assert_eq!(valid, i % 2 == 0);
        }
        assert_eq!(validator.cache_len(), 32);
    }
}
