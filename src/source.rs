//! Local catalog sources: in-memory data and JSON files.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::debug;

use crate::catalog::CatalogData;
use crate::error::DispatchResult;
use crate::traits::CatalogSource;

/// A catalog supplied directly by the caller.
#[derive(Debug, Clone)]
pub struct StaticCatalog(pub CatalogData);

impl CatalogSource for StaticCatalog {
    fn load_catalog(&self) -> DispatchResult<CatalogData> {
        Ok(self.0.clone())
    }
}

/// A catalog stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    pub path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for JsonFileCatalog {
    fn load_catalog(&self) -> DispatchResult<CatalogData> {
        debug!(path = %self.path.display(), "reading catalog file");
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatchError;

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonFileCatalog::new("/nonexistent/catalog.json");
        assert!(matches!(source.load_catalog(), Err(DispatchError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let path = std::env::temp_dir().join(format!(
            "shuttle-dispatch-bad-catalog-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let result = JsonFileCatalog::new(&path).load_catalog();
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(DispatchError::Json(_))));
    }
}
