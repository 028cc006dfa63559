//! The query pipeline shared by the CLI and the HTTP server.
//!
//! Each entry point runs the same four steps:
//!
//! 1. Resolve a category (exact keyword, literal folder, question, or none).
//! 2. Load its records through the [`DatasetReader`].
//! 3. Fold the filter terms over the records.
//! 4. Report [`QueryError::EmptyResultSet`] when nothing survives.

use dataset_query_core::filter::apply_filters;
use dataset_query_core::{Catalog, Normalization, ParsedQuery, QueryParser, Record};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::dataset::DatasetReader;

/// Normalization used by `GET /{keyword}`.
pub const KEYWORD_NORMALIZATION: Normalization = Normalization::WhitespaceOnly;
/// Normalization used by the folder, question, and global search endpoints.
pub const TEXT_NORMALIZATION: Normalization = Normalization::DiacriticFolding;

/// Response for a keyword lookup (`GET /{keyword}`).
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub keyword: String,
    pub category: String,
    pub filter: Option<String>,
    pub results: Vec<Record>,
}

/// Response for a literal folder lookup (`GET /api/{folder}`).
#[derive(Debug, Clone, Serialize)]
pub struct FolderResponse {
    pub folder: String,
    pub filter: Option<String>,
    pub results: Vec<Record>,
}

/// Response for a free-text question (`GET /api/query`).
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResponse {
    pub question: String,
    pub category: String,
    pub filters: Vec<String>,
    pub results: Vec<Record>,
}

/// Response for a global search (`GET /search`).
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub filter_keyword: String,
    pub results: Vec<Record>,
}

/// Runs queries against one catalog and one reader.
///
/// Cheap to share behind an `Arc`; nothing inside is mutated after
/// construction.
pub struct QueryService {
    catalog: Arc<Catalog>,
    parser: QueryParser,
    reader: Arc<dyn DatasetReader>,
}

impl QueryService {
    pub fn new(catalog: Arc<Catalog>, reader: Arc<dyn DatasetReader>) -> anyhow::Result<Self> {
        tracing::info!(
            reader = reader.name(),
            categories = catalog.categories().len(),
            "query service ready"
        );
        Ok(Self {
            catalog,
            parser: QueryParser::new()?,
            reader,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Name of the reader records are loaded through.
    pub fn reader_name(&self) -> &str {
        self.reader.name()
    }

    /// Parses a question without loading anything.
    pub fn parse(&self, question: &str) -> ParsedQuery {
        self.parser.parse(&self.catalog, question)
    }

    /// Resolves `keyword` through the catalog and applies one optional filter.
    pub async fn lookup(&self, keyword: &str, filter: Option<&str>) -> Result<LookupResponse> {
        let category = self
            .catalog
            .resolve(keyword)
            .ok_or_else(|| QueryError::UnresolvableCategory(keyword.to_string()))?;
        tracing::info!(keyword, category = %category.name, reader = self.reader.name(), "resolved keyword");

        let records = self.reader.load_category(category).await?;
        let filter = non_empty(filter);
        let results = narrow(records, filter.as_slice(), KEYWORD_NORMALIZATION, &category.name)?;

        Ok(LookupResponse {
            keyword: keyword.to_string(),
            category: category.name.clone(),
            filter: filter.map(str::to_string),
            results,
        })
    }

    /// Loads a storage folder named directly by the client.
    pub async fn lookup_folder(&self, folder: &str, filter: Option<&str>) -> Result<FolderResponse> {
        let records = self.reader.load_folder(folder).await?;
        let filter = non_empty(filter);
        let results = narrow(records, filter.as_slice(), TEXT_NORMALIZATION, folder)?;

        Ok(FolderResponse {
            folder: folder.to_string(),
            filter: filter.map(str::to_string),
            results,
        })
    }

    /// Answers a free-text question: parse, load, apply every derived term.
    ///
    /// A question that yields no filter terms returns the whole category.
    pub async fn ask(&self, question: &str) -> Result<QuestionResponse> {
        let parsed = self.parse(question);
        let category = parsed
            .category
            .as_deref()
            .and_then(|name| self.catalog.get(name))
            .ok_or_else(|| QueryError::UnresolvableCategory(question.to_string()))?;
        tracing::info!(
            category = %category.name,
            filters = ?parsed.filters,
            "parsed question"
        );

        let records = self.reader.load_category(category).await?;
        let results = narrow(records, &parsed.filters, TEXT_NORMALIZATION, &category.name)?;

        Ok(QuestionResponse {
            question: question.to_string(),
            category: category.name.clone(),
            filters: parsed.filters,
            results,
        })
    }

    /// Filters every record the reader can see.
    pub async fn search_all(&self, term: &str) -> Result<SearchResponse> {
        let records = self.reader.load_all().await?;
        let results = narrow(records, &[term], TEXT_NORMALIZATION, "all datasets")?;

        Ok(SearchResponse {
            filter_keyword: term.to_string(),
            results,
        })
    }
}

fn non_empty(filter: Option<&str>) -> Option<&str> {
    filter.filter(|f| !f.trim().is_empty())
}

fn narrow<S: AsRef<str> + std::fmt::Debug>(
    records: Vec<Record>,
    terms: &[S],
    strategy: Normalization,
    source: &str,
) -> Result<Vec<Record>> {
    let loaded = records.len();
    let (results, counts) = apply_filters(records, terms, strategy);
    tracing::debug!(source, loaded, ?terms, ?counts, %strategy, "applied filters");
    if results.is_empty() {
        return Err(QueryError::EmptyResultSet(source.to_string()));
    }
    Ok(results)
}
