use anyhow::Result;

use crate::config::Config;
use crate::dataset::FsDatasetReader;

/// Prints the catalog with the storage health of each category.
pub fn list_categories(config: &Config) -> Result<()> {
    let catalog = config.catalog()?;
    let reader = FsDatasetReader::from_config(config)?;

    println!("data root: {}", reader.root().display());
    println!("{:<16} {:<24} {:<8} KEYWORDS", "CATEGORY", "STORAGE", "HEALTHY");
    for (category, status) in catalog
        .categories()
        .iter()
        .zip(reader.status(catalog.categories()))
    {
        let keywords: Vec<&str> = category.keywords.iter().map(String::as_str).collect();
        println!(
            "{:<16} {:<24} {:<8} {}",
            status.category,
            status.storage,
            status.exists,
            keywords.join(", ")
        );
    }

    Ok(())
}
