//! Release catalog loaded from CSV.
//!
//! Columns: `id,slug,artist,title,kind,cover_url,admin_total,score,votes,created_at`.
//! Empty cells are read as missing values; `created_at` is RFC 3339.

use crate::models::Release;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Errors while reading the catalog.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "Could not open catalog: {}", e),
            CatalogError::Csv(e) => write!(f, "Invalid catalog row: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(e: csv::Error) -> Self {
        CatalogError::Csv(e)
    }
}

/// Load every release from the CSV file at `path`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Release>, CatalogError> {
    let file = File::open(path)?;
    read_catalog(file)
}

/// Read releases from any CSV source (header row required).
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<Release>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let releases = rdr.deserialize().collect::<Result<Vec<Release>, _>>()?;
    Ok(releases)
}
