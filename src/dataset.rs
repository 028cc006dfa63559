//! Dataset readers.
//!
//! A [`DatasetReader`] turns a category (or a literal folder name) into the
//! list of JSON records stored for it. The built-in [`FsDatasetReader`]
//! reads from a directory tree under a single data root:
//!
//! ```text
//! <root>/
//! ├── sale/            directory storage: every matching *.json below it
//! │   ├── 2024-05.json
//! │   └── branch/north.json
//! ├── product.json     file storage: one JSON document
//! └── kpi/...
//! ```
//!
//! Each file holds either an array of objects or a single object. Files that
//! fail to parse, and array elements that are not objects, are skipped with
//! a warning; they never fail the load.

use async_trait::async_trait;
use dataset_query_core::{Category, Record};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{QueryError, Result};

/// Source of records for the query pipeline.
///
/// Implementations must be `Send + Sync`; one reader is shared by every
/// in-flight request. Records are loaded fresh on each call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use dataset_query::dataset::DatasetReader;
/// use dataset_query::error::Result;
/// use dataset_query_core::{Category, Record};
///
/// pub struct EmptyReader;
///
/// #[async_trait]
/// impl DatasetReader for EmptyReader {
///     fn name(&self) -> &str { "empty" }
///     async fn load_category(&self, _category: &Category) -> Result<Vec<Record>> { Ok(vec![]) }
///     async fn load_folder(&self, _folder: &str) -> Result<Vec<Record>> { Ok(vec![]) }
///     async fn load_all(&self) -> Result<Vec<Record>> { Ok(vec![]) }
/// }
/// ```
#[async_trait]
pub trait DatasetReader: Send + Sync {
    /// Reader name, used in logs.
    fn name(&self) -> &str;

    /// Loads every record stored for `category`.
    ///
    /// Fails with [`QueryError::CategoryNotFound`] when the category's
    /// storage location does not exist.
    async fn load_category(&self, category: &Category) -> Result<Vec<Record>>;

    /// Loads records from a storage location named directly by the client.
    async fn load_folder(&self, folder: &str) -> Result<Vec<Record>>;

    /// Loads every record available to this reader.
    async fn load_all(&self) -> Result<Vec<Record>>;
}

/// Reads JSON files from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsDatasetReader {
    root: PathBuf,
    include: GlobSet,
}

/// Storage health for one category, as shown by `dsq categories`.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub category: String,
    pub storage: String,
    pub path: PathBuf,
    pub exists: bool,
}

impl FsDatasetReader {
    pub fn new(root: impl Into<PathBuf>, include_globs: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            root: root.into(),
            include: build_globset(include_globs)?,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(config.data.root.clone(), &config.data.include_globs)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reports whether each category's storage exists under the root.
    pub fn status<'a>(&self, categories: impl IntoIterator<Item = &'a Category>) -> Vec<StorageStatus> {
        categories
            .into_iter()
            .map(|c| {
                let path = self.root.join(&c.storage);
                StorageStatus {
                    category: c.name.clone(),
                    storage: c.storage.clone(),
                    exists: path.exists(),
                    path,
                }
            })
            .collect()
    }

    /// Blocking load of `<root>/<relative>`, labelled `label` in errors.
    pub fn read_location(&self, label: &str, relative: &str) -> Result<Vec<Record>> {
        let path = self.root.join(relative);
        if !path.exists() {
            return Err(QueryError::CategoryNotFound {
                category: label.to_string(),
                path,
            });
        }
        if path.is_file() {
            read_file(&path)
        } else {
            self.read_tree(&path)
        }
    }

    /// Blocking load of every matching file under the root.
    pub fn read_everything(&self) -> Result<Vec<Record>> {
        if !self.root.is_dir() {
            return Err(QueryError::CategoryNotFound {
                category: "*".to_string(),
                path: self.root.clone(),
            });
        }
        self.read_tree(&self.root)
    }

    fn read_tree(&self, dir: &Path) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut files = 0usize;

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(dir).unwrap_or(path);
            if !self.include.is_match(relative) {
                continue;
            }
            files += 1;
            records.extend(read_file(path)?);
        }

        tracing::debug!(dir = %dir.display(), files, records = records.len(), "loaded dataset directory");
        Ok(records)
    }
}

#[async_trait]
impl DatasetReader for FsDatasetReader {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn load_category(&self, category: &Category) -> Result<Vec<Record>> {
        let reader = self.clone();
        let label = category.name.clone();
        let storage = category.storage.clone();
        run_blocking(move || reader.read_location(&label, &storage)).await
    }

    async fn load_folder(&self, folder: &str) -> Result<Vec<Record>> {
        validate_folder(folder)?;
        let reader = self.clone();
        let folder = folder.to_string();
        run_blocking(move || reader.read_location(&folder, &folder)).await
    }

    async fn load_all(&self) -> Result<Vec<Record>> {
        let reader = self.clone();
        run_blocking(move || reader.read_everything()).await
    }
}

async fn run_blocking<F>(f: F) -> Result<Vec<Record>>
where
    F: FnOnce() -> Result<Vec<Record>> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QueryError::Task(e.to_string()))?
}

/// A literal folder must be a single plain path segment.
fn validate_folder(folder: &str) -> Result<()> {
    let mut components = Path::new(folder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !folder.contains(['/', '\\']) => Ok(()),
        _ => Err(QueryError::InvalidStorageName(folder.to_string())),
    }
}

fn read_file(path: &Path) -> Result<Vec<Record>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            tracing::warn!(path = %path.display(), "skipping non-UTF-8 dataset file");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(QueryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(parse_records(path, &content))
}

/// Decodes one file's content into records, skipping what does not fit.
pub fn parse_records(path: &Path, content: &str) -> Vec<Record> {
    let value: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping malformed JSON file");
            return Vec::new();
        }
    };

    match value {
        Value::Object(record) => vec![record],
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<Record> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                tracing::warn!(
                    path = %path.display(),
                    skipped = total - records.len(),
                    "skipping non-object array elements"
                );
            }
            records
        }
        _ => {
            tracing::warn!(path = %path.display(), "skipping JSON file that is neither an object nor an array");
            Vec::new()
        }
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
