//! Jurisdiction-specific structural rules per citation type

use super::{CitationComponents, CitationType, ParsedCitation};
use regex_lite::Regex;

/// Founding year of the republic; no norm predates it
pub const REPUBLIC_FOUNDED: i32 = 1830;

/// Founding year of the constitutional court
pub const CONSTITUTIONAL_COURT_FOUNDED: i32 = 2008;

/// Codes a `code` citation may name (matched case-insensitively as substrings)
pub const KNOWN_CODES: &[&str] = &[
    "Civil",
    "Comercial",
    "Penal",
    "Laboral",
    "Contencioso Administrativo",
    "Procedimiento Civil",
    "Procedimiento Penal",
];

/// Compiled rule set shared by every validation of a validator instance
#[derive(Debug, Clone)]
pub struct CitationRules {
    digits: Regex,
    docket: Regex,
    known_codes: Vec<String>,
}

impl Default for CitationRules {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationRules {
    pub fn new() -> Self {
        Self {
            digits: Regex::new(r"^\d+$").expect("static pattern"),
            docket: Regex::new(r"^[0-9-]+$").expect("static pattern"),
            known_codes: KNOWN_CODES.iter().map(|code| code.to_lowercase()).collect(),
        }
    }

    /// Structural check followed by the rule set of the citation's type.
    ///
    /// `current_year` bounds every year component from above.
    pub fn check(&self, citation: &ParsedCitation, current_year: i32) -> bool {
        if citation.raw.trim().is_empty() || citation.cache_key().is_none() {
            return false;
        }

        let Some(citation_type) = citation.citation_type else {
            return false;
        };

        let parts = &citation.components;
        match citation_type {
            CitationType::Law | CitationType::Decree | CitationType::Resolution => {
                self.check_numbered_norm(parts, current_year)
            }
            CitationType::ConstitutionalCourt => {
                self.check_constitutional_ruling(parts, current_year)
            }
            CitationType::SupremeCourt => self.check_supreme_ruling(parts, current_year),
            CitationType::Article => field(&parts.article).is_some_and(|a| self.digits.is_match(a)),
            CitationType::Code => self.check_code(parts),
            CitationType::Other => true,
        }
    }

    fn check_numbered_norm(&self, parts: &CitationComponents, current_year: i32) -> bool {
        let (Some(number), Some(year)) = (field(&parts.number), field(&parts.year)) else {
            return false;
        };

        self.digits.is_match(number)
            && parse_year(year).is_some_and(|y| (REPUBLIC_FOUNDED..=current_year).contains(&y))
    }

    fn check_constitutional_ruling(&self, parts: &CitationComponents, current_year: i32) -> bool {
        let (Some(_kind), Some(number), Some(year)) =
            (field(&parts.kind), field(&parts.number), field(&parts.year))
        else {
            return false;
        };

        if !self.docket.is_match(number) {
            return false;
        }

        // Rulings are commonly cited with two-digit years (C-123/15)
        let Some(year) = parse_year(year) else {
            return false;
        };
        let full_year = if year < 100 { year + 2000 } else { year };

        (CONSTITUTIONAL_COURT_FOUNDED..=current_year).contains(&full_year)
    }

    fn check_supreme_ruling(&self, parts: &CitationComponents, current_year: i32) -> bool {
        let (Some(_number), Some(year)) = (field(&parts.number), field(&parts.year)) else {
            return false;
        };

        parse_year(year).is_some_and(|y| (REPUBLIC_FOUNDED..=current_year).contains(&y))
    }

    fn check_code(&self, parts: &CitationComponents) -> bool {
        let Some(kind) = field(&parts.kind) else {
            return false;
        };

        let kind = kind.to_lowercase();
        self.known_codes.iter().any(|code| kind.contains(code.as_str()))
    }
}

/// Trimmed, non-empty component value
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_year(value: &str) -> Option<i32> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2025;

    fn law(number: &str, year: &str) -> ParsedCitation {
        ParsedCitation::new(
            format!("Ley {} de {}", number, year),
            CitationType::Law,
            format!("ley-{}-{}", number, year),
        )
        .with_number(number)
        .with_year(year)
    }

    fn ruling(number: &str, year: &str) -> ParsedCitation {
        ParsedCitation::new(
            format!("Sentencia {}/{}", number, year),
            CitationType::ConstitutionalCourt,
            format!("cc-{}-{}", number, year),
        )
        .with_kind("C")
        .with_number(number)
        .with_year(year)
    }

    #[test]
    fn test_law_rules() {
        let rules = CitationRules::new();

        assert!(rules.check(&law("045", "2021"), YEAR));
        assert!(rules.check(&law("1", "1830"), YEAR));
        assert!(rules.check(&law("1", "2025"), YEAR));

        assert!(!rules.check(&law("045", "1500"), YEAR));
        assert!(!rules.check(&law("045", "1829"), YEAR));
        assert!(!rules.check(&law("045", "2026"), YEAR));
        assert!(!rules.check(&law("45A", "2021"), YEAR));
        assert!(!rules.check(&law("45", "dos mil"), YEAR));
        assert!(!rules.check(&law("45", "-2021"), YEAR));
    }

    #[test]
    fn test_law_requires_number_and_year() {
        let rules = CitationRules::new();
        let no_year = ParsedCitation::new("Ley 45", CitationType::Law, "ley-45").with_number("45");
        let no_number =
            ParsedCitation::new("Ley de 2021", CitationType::Law, "ley-2021").with_year("2021");

        assert!(!rules.check(&no_year, YEAR));
        assert!(!rules.check(&no_number, YEAR));
    }

    #[test]
    fn test_decree_and_resolution_share_law_rules() {
        let rules = CitationRules::new();
        for citation_type in [CitationType::Decree, CitationType::Resolution] {
            let mut citation = law("1072", "2015");
            citation.citation_type = Some(citation_type);
            assert!(rules.check(&citation, YEAR));

            citation.components.year = Some("1700".into());
            assert!(!rules.check(&citation, YEAR));
        }
    }

    #[test]
    fn test_constitutional_court_two_digit_years() {
        let rules = CitationRules::new();

        assert!(rules.check(&ruling("12-34", "15"), YEAR));
        assert!(rules.check(&ruling("123", "2008"), YEAR));
        assert!(rules.check(&ruling("123", "08"), YEAR));

        // 07 expands to 2007, before the court existed
        assert!(!rules.check(&ruling("12-34", "07"), YEAR));
        assert!(!rules.check(&ruling("12-34", "2007"), YEAR));
        assert!(!rules.check(&ruling("12/34", "15"), YEAR));
        assert!(!rules.check(&ruling("12-34", "99"), YEAR));
    }

    #[test]
    fn test_constitutional_court_requires_kind() {
        let rules = CitationRules::new();
        let mut citation = ruling("123", "2015");
        citation.components.kind = None;
        assert!(!rules.check(&citation, YEAR));
    }

    #[test]
    fn test_supreme_court_rules() {
        let rules = CitationRules::new();
        let citation = ParsedCitation::new(
            "CSJ SC-4567 de 1995",
            CitationType::SupremeCourt,
            "csj-sc4567-1995",
        )
        .with_number("SC-4567")
        .with_year("1995");
        assert!(rules.check(&citation, YEAR));

        let ancient = citation.clone().with_year("1820");
        assert!(!rules.check(&ancient, YEAR));
    }

    #[test]
    fn test_article_rules() {
        let rules = CitationRules::new();
        let article =
            ParsedCitation::new("art. 29", CitationType::Article, "art-29").with_article("29");
        assert!(rules.check(&article, YEAR));

        let lettered =
            ParsedCitation::new("art. 29A", CitationType::Article, "art-29a").with_article("29A");
        assert!(!rules.check(&lettered, YEAR));

        let bare = ParsedCitation::new("art.", CitationType::Article, "art");
        assert!(!rules.check(&bare, YEAR));
    }

    #[test]
    fn test_code_rules() {
        let rules = CitationRules::new();
        let civil = ParsedCitation::new("Código Civil", CitationType::Code, "codigo-civil")
            .with_kind("Código Civil");
        assert!(rules.check(&civil, YEAR));

        let procedural = ParsedCitation::new("CPACA", CitationType::Code, "cpaca")
            .with_kind(
                "código de procedimiento administrativo y de lo CONTENCIOSO ADMINISTRATIVO",
            );
        assert!(rules.check(&procedural, YEAR));

        let unknown = ParsedCitation::new("Código Minero", CitationType::Code, "codigo-minero")
            .with_kind("Código Minero");
        assert!(!rules.check(&unknown, YEAR));
    }

    #[test]
    fn test_other_is_permissive() {
        let rules = CitationRules::new();
        let circular = ParsedCitation::new("Circular 7", CitationType::Other, "circular-7");
        assert!(rules.check(&circular, YEAR));
    }

    #[test]
    fn test_structural_check() {
        let rules = CitationRules::new();

        let mut blank_raw = law("45", "2021");
        blank_raw.raw = "   ".into();
        assert!(!rules.check(&blank_raw, YEAR));

        let mut untyped = law("45", "2021");
        untyped.citation_type = None;
        assert!(!rules.check(&untyped, YEAR));

        let mut unkeyed = ParsedCitation::new("Circular 7", CitationType::Other, "circular-7");
        unkeyed.normalized_form = None;
        assert!(!rules.check(&unkeyed, YEAR));
    }

    #[test]
    fn test_components_are_trimmed() {
        let rules = CitationRules::new();
        assert!(rules.check(&law(" 45 ", " 2021 "), YEAR));
    }
}
