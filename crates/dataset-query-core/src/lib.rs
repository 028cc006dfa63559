//! # Dataset Query Core
//!
//! Pure logic for dataset-query: text normalization, the category catalog,
//! free-text question parsing, and record filtering.
//!
//! This crate contains no tokio, filesystem I/O, or HTTP dependencies. The
//! calling application loads records and hands them to [`filter`].
//!
//! ```text
//!  keyword ──▶ Catalog::resolve ─┐
//!                                ├──▶ category + terms ──▶ (load) ──▶ filter::apply_filters
//! question ──▶ QueryParser::parse┘
//! ```

pub mod catalog;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod parser;

pub use catalog::{Catalog, CatalogError, Category};
pub use models::{ParsedQuery, Record};
pub use normalize::Normalization;
pub use parser::QueryParser;
