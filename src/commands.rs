//! CLI entry points for one-shot queries.
//!
//! Each command runs the same pipeline as the matching HTTP endpoint and
//! prints the response as pretty JSON on stdout. Query failures are printed
//! to stderr and exit with status 1.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::dataset::FsDatasetReader;
use crate::error::QueryError;
use crate::service::QueryService;

fn build_service(config: &Config) -> Result<QueryService> {
    let catalog = Arc::new(config.catalog()?);
    let reader = Arc::new(FsDatasetReader::from_config(config)?);
    QueryService::new(catalog, reader)
}

fn print_or_exit<T: Serialize>(result: std::result::Result<T, QueryError>) -> Result<()> {
    match result {
        Ok(resp) => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error ({}): {}", e.code(), e);
            std::process::exit(1);
        }
    }
}

/// `dsq resolve <keyword>`: prints the category a keyword maps to.
pub fn run_resolve(config: &Config, keyword: &str) -> Result<()> {
    let catalog = config.catalog()?;
    match catalog.resolve(keyword) {
        Some(category) => {
            println!("{}", serde_json::to_string_pretty(category)?);
            Ok(())
        }
        None => print_or_exit::<()>(Err(QueryError::UnresolvableCategory(keyword.to_string()))),
    }
}

/// `dsq parse "<question>"`: prints the parsed category and filter terms.
pub fn run_parse(config: &Config, question: &str) -> Result<()> {
    let service = build_service(config)?;
    let parsed = service.parse(question);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

pub async fn run_get(config: &Config, keyword: &str, filter: Option<&str>) -> Result<()> {
    let service = build_service(config)?;
    print_or_exit(service.lookup(keyword, filter).await)
}

pub async fn run_folder(config: &Config, folder: &str, filter: Option<&str>) -> Result<()> {
    let service = build_service(config)?;
    print_or_exit(service.lookup_folder(folder, filter).await)
}

pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let service = build_service(config)?;
    print_or_exit(service.ask(question).await)
}

pub async fn run_search(config: &Config, term: &str) -> Result<()> {
    if term.trim().is_empty() {
        eprintln!("Error (bad_request): search term must not be empty");
        std::process::exit(1);
    }
    let service = build_service(config)?;
    print_or_exit(service.search_all(term).await)
}
