//! Data types shared by the parser, the filter, and the service layer.

use serde::Serialize;

/// One loaded JSON object: field name to arbitrary JSON value.
///
/// Records are read-only once loaded and are never cached between requests.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result of parsing a free-text question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Name of the detected category, or `None` when no keyword matched.
    pub category: Option<String>,
    /// Normalized filter terms: time terms (month, quarter, year) then the name term.
    pub filters: Vec<String>,
}
