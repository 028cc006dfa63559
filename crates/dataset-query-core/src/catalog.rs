//! Category catalog (the synonym table) and exact keyword resolution.
//!
//! The catalog is an ordered list of categories, each with a non-empty set
//! of lowercase keywords. It is built once at startup and shared read-only;
//! lookups walk the categories in declared order and the first hit wins.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Errors raised while building a [`Catalog`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog must declare at least one category")]
    Empty,

    #[error("category name must not be empty")]
    EmptyName,

    #[error("category '{0}' has no keywords")]
    NoKeywords(String),

    #[error("category '{0}' is declared more than once")]
    DuplicateCategory(String),
}

/// A dataset partition and the keywords that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Canonical category name, echoed back in responses.
    pub name: String,
    /// Storage location relative to the data root (a folder or a `.json` file).
    pub storage: String,
    /// Lowercased keywords. Membership is what matters; order is not.
    pub keywords: BTreeSet<String>,
}

impl Category {
    /// Builds a category, trimming, NFC-composing and lowercasing every keyword.
    ///
    /// `storage` defaults to the category name when `None`.
    pub fn new<I, S>(
        name: impl Into<String>,
        storage: Option<String>,
        keywords: I,
    ) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let keywords: BTreeSet<String> = keywords
            .into_iter()
            .map(|k| canonical_token(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(CatalogError::NoKeywords(name));
        }
        let storage = storage
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| name.clone());
        Ok(Self {
            name,
            storage,
            keywords,
        })
    }

    /// Exact keyword membership (the token must already be lowercased).
    pub fn has_keyword(&self, token: &str) -> bool {
        self.keywords.contains(token)
    }

    /// True when any keyword occurs as a substring of `text`.
    pub fn mentioned_in(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Ordered, immutable category table.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Builds a catalog from categories in resolution order.
    ///
    /// A keyword shared by two categories is allowed, but only the earlier
    /// category can ever be resolved through it; a warning is logged.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        if categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for category in &categories {
            if !names.insert(category.name.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }
            for keyword in &category.keywords {
                match owners.get(keyword.as_str()) {
                    Some(first) => tracing::warn!(
                        keyword = keyword.as_str(),
                        winner = *first,
                        shadowed = category.name.as_str(),
                        "keyword listed under several categories; earlier category wins"
                    ),
                    None => {
                        owners.insert(keyword.as_str(), category.name.as_str());
                    }
                }
            }
        }

        Ok(Self { categories })
    }

    /// The built-in sales / products / KPI table.
    pub fn builtin() -> Result<Self, CatalogError> {
        let table: [(&str, &[&str]); 3] = [
            (
                "sale",
                &["sale", "sales", "doanhthu", "doanh thu", "bán hàng", "banhang"],
            ),
            (
                "product",
                &["product", "products", "sanpham", "sản phẩm", "hàng hóa", "hanghoa"],
            ),
            ("kpi", &["kpi", "chỉ tiêu", "chitieu"]),
        ];
        let categories = table
            .iter()
            .map(|(name, keywords)| Category::new(*name, None, keywords.iter()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(categories)
    }

    /// Categories in resolution order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Looks up a category by its canonical name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Resolves a single keyword by exact, case-insensitive match.
    ///
    /// No diacritic folding happens here: `"sanpham"` and `"sản phẩm"` are
    /// distinct tokens and must each be listed to resolve. Decomposed and
    /// precomposed spellings of the same keyword are equal.
    pub fn resolve(&self, token: &str) -> Option<&Category> {
        let token = canonical_token(token);
        self.categories.iter().find(|c| c.has_keyword(&token))
    }

    /// Finds the first category with any keyword contained in `text`.
    ///
    /// `text` is expected to be NFC-composed and lowercased already.
    pub fn detect(&self, text: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.mentioned_in(text))
    }
}

fn canonical_token(raw: &str) -> String {
    raw.trim().nfc().collect::<String>().to_lowercase()
}
