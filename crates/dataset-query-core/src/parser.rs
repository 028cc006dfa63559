//! Free-text question parsing.
//!
//! A question is turned into a [`ParsedQuery`] by a fixed pipeline of
//! heuristics. There is no grammar, only independent extractors:
//!
//! 1. Category detection: first catalog category with a keyword that
//!    occurs anywhere in the question.
//! 2. [`TimeExtractor`] × 3: month (`tháng 5`), quarter (`quý 2`), year
//!    (`năm 2024`). Each yields at most one term such as `thang5`.
//! 3. [`NameExtractor`]: the text after the first indicator word
//!    (`của`, `cho`, `về`), with time expressions and parentheses removed.
//!
//! All steps see the question lowercased but not diacritic-folded, so the
//! Vietnamese patterns still match. Emitted terms are diacritic-folded.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::Catalog;
use crate::models::ParsedQuery;
use crate::normalize::Normalization;

/// Normalization applied to every term the parser emits.
pub const TERM_NORMALIZATION: Normalization = Normalization::DiacriticFolding;

/// Indicator words introducing an entity name, in priority order
/// ("belonging to", "for", "about").
pub const NAME_INDICATORS: &[&str] = &["của", "cho", "về"];

/// One step of the extraction pipeline.
pub trait TermExtractor: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Extracts at most one normalized filter term from a lowercased question.
    fn extract(&self, question: &str) -> Option<String>;
}

/// Matches `<unit> <digits>` and emits `normalize(unit + digits)`.
#[derive(Debug, Clone)]
pub struct TimeExtractor {
    unit: &'static str,
    pattern: Regex,
}

impl TimeExtractor {
    /// `digits` is a regex repetition such as `{1,2}` or `{4}`.
    pub fn new(unit: &'static str, digits: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"\b{}\s*(\d{})\b", regex::escape(unit), digits))?;
        Ok(Self { unit, pattern })
    }

    pub fn month() -> Result<Self, regex::Error> {
        Self::new("tháng", "{1,2}")
    }

    pub fn quarter() -> Result<Self, regex::Error> {
        Self::new("quý", "{1}")
    }

    pub fn year() -> Result<Self, regex::Error> {
        Self::new("năm", "{4}")
    }

    /// Removes every occurrence of this time expression from `text`.
    pub fn strip<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        self.pattern.replace_all(text, " ")
    }
}

impl TermExtractor for TimeExtractor {
    fn label(&self) -> &str {
        self.unit
    }

    fn extract(&self, question: &str) -> Option<String> {
        let caps = self.pattern.captures(question)?;
        let digits = caps.get(1)?.as_str();
        Some(TERM_NORMALIZATION.apply(&format!("{}{}", self.unit, digits)))
    }
}

/// Takes the clause after the first indicator word as an entity name.
#[derive(Debug, Clone)]
pub struct NameExtractor {
    indicators: Vec<&'static str>,
    time: Vec<TimeExtractor>,
}

impl NameExtractor {
    /// `time` lists the expressions to cut out of the name clause.
    pub fn new(indicators: &[&'static str], time: Vec<TimeExtractor>) -> Self {
        Self {
            indicators: indicators.to_vec(),
            time,
        }
    }
}

impl TermExtractor for NameExtractor {
    fn label(&self) -> &str {
        "name"
    }

    fn extract(&self, question: &str) -> Option<String> {
        // Only the first indicator present is considered, even if its
        // clause turns out empty.
        let (indicator, pos) = self
            .indicators
            .iter()
            .find_map(|ind| question.find(ind).map(|pos| (*ind, pos)))?;
        let mut clause = question[pos + indicator.len()..].to_string();
        for t in &self.time {
            clause = t.strip(&clause).into_owned();
        }
        let clause = clause.replace(['(', ')'], " ");
        let term = TERM_NORMALIZATION.apply(clause.trim());
        (!term.is_empty()).then_some(term)
    }
}

/// The compiled question parser. Build once and share.
pub struct QueryParser {
    extractors: Vec<Box<dyn TermExtractor>>,
}

impl QueryParser {
    /// Compiles the standard pipeline: month, quarter, year, then name.
    pub fn new() -> Result<Self, regex::Error> {
        let time = vec![
            TimeExtractor::month()?,
            TimeExtractor::quarter()?,
            TimeExtractor::year()?,
        ];
        let name = NameExtractor::new(NAME_INDICATORS, time.clone());

        let mut extractors: Vec<Box<dyn TermExtractor>> = Vec::new();
        for t in time {
            extractors.push(Box::new(t));
        }
        extractors.push(Box::new(name));
        Ok(Self { extractors })
    }

    /// Builds a parser from a custom extractor pipeline, run in order.
    pub fn with_extractors(extractors: Vec<Box<dyn TermExtractor>>) -> Self {
        Self { extractors }
    }

    /// Extractor labels in pipeline order.
    pub fn labels(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.label()).collect()
    }

    /// Parses a free-text question against `catalog`.
    pub fn parse(&self, catalog: &Catalog, question: &str) -> ParsedQuery {
        let lowered: String = question.nfc().collect::<String>().to_lowercase();

        let category = catalog.detect(&lowered).map(|c| c.name.clone());

        let mut filters = Vec::new();
        for extractor in &self.extractors {
            if let Some(term) = extractor.extract(&lowered) {
                tracing::debug!(extractor = extractor.label(), term = %term, "extracted filter term");
                filters.push(term);
            }
        }

        ParsedQuery { category, filters }
    }
}

impl std::fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParser")
            .field("extractors", &self.labels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> QueryParser {
        QueryParser::new().unwrap()
    }

    fn builtin() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_kpi_question_with_store_name_and_month() {
        let q = parser().parse(
            &builtin(),
            "KPI của Cửa Hàng Kim Khí Kim Phương (Phù Cát) tháng 5",
        );
        assert_eq!(q.category.as_deref(), Some("kpi"));
        assert_eq!(
            q.filters,
            vec![
                "thang5".to_string(),
                "cuahangkimkhikimphuongphucat".to_string()
            ]
        );
    }

    #[test]
    fn test_time_terms_in_pattern_order() {
        let q = parser().parse(&builtin(), "doanh thu năm 2024 quý 2 tháng 12");
        assert_eq!(q.category.as_deref(), Some("sale"));
        assert_eq!(q.filters, vec!["thang12", "quy2", "nam2024"]);
    }

    #[test]
    fn test_time_digits_bounded() {
        let p = TimeExtractor::month().unwrap();
        assert_eq!(p.extract("tháng 123"), None);
        assert_eq!(p.extract("tháng 07").as_deref(), Some("thang07"));
        let y = TimeExtractor::year().unwrap();
        assert_eq!(y.extract("năm 24"), None);
        assert_eq!(y.extract("năm2023").as_deref(), Some("nam2023"));
    }

    #[test]
    fn test_first_indicator_in_priority_order_wins() {
        // "của" outranks "cho" even though "cho" appears first.
        let q = parser().parse(&builtin(), "kpi cho tuần này của chi nhánh bắc");
        assert_eq!(q.filters, vec!["chinhanhbac"]);
    }

    #[test]
    fn test_empty_name_clause_is_dropped() {
        let q = parser().parse(&builtin(), "sản phẩm của (tháng 3)");
        assert_eq!(q.category.as_deref(), Some("product"));
        assert_eq!(q.filters, vec!["thang3"]);
    }

    #[test]
    fn test_indicator_at_start_takes_rest_of_question() {
        let q = parser().parse(&builtin(), "cho xem tất cả KPI");
        assert_eq!(q.category.as_deref(), Some("kpi"));
        assert_eq!(q.filters, vec!["xemtatcakpi"]);
    }

    #[test]
    fn test_no_filters_is_valid() {
        let q = parser().parse(&builtin(), "KPI");
        assert_eq!(q.category.as_deref(), Some("kpi"));
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_unresolved_category_still_extracts_terms() {
        let q = parser().parse(&builtin(), "báo cáo về Chi Nhánh Nam");
        assert_eq!(q.category, None);
        assert_eq!(q.filters, vec!["chinhanhnam"]);
    }

    #[test]
    fn test_decomposed_question_matches() {
        // "tháng" written with a combining acute accent
        let q = parser().parse(&builtin(), "kpi tha\u{0301}ng 4");
        assert_eq!(q.filters, vec!["thang4"]);
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(parser().labels(), vec!["tháng", "quý", "năm", "name"]);
    }

    #[test]
    fn test_custom_pipeline() {
        let extractors: Vec<Box<dyn TermExtractor>> = vec![Box::new(TimeExtractor::year().unwrap())];
        let p = QueryParser::with_extractors(extractors);
        let q = p.parse(&builtin(), "kpi của ABC năm 2022");
        assert_eq!(q.filters, vec!["nam2022"]);
    }
}
