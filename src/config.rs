//! Query configuration: which export to read.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Export read when nothing else is configured
pub const DEFAULT_EXPORT_PATH: &str = "data/export_full.xml";

/// Environment variable overriding [`DEFAULT_EXPORT_PATH`]
pub const EXPORT_PATH_ENV: &str = "CATALOG_EXPORT_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub source: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            source: PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }
}

impl CatalogConfig {
    /// Defaults, with the source taken from `CATALOG_EXPORT_PATH` when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        match lookup(EXPORT_PATH_ENV).filter(|value| !value.is_empty()) {
            Some(path) => CatalogConfig::default().with_source(path),
            None => CatalogConfig::default(),
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.source(), Path::new("data/export_full.xml"));
    }

    #[test]
    fn test_env_override() {
        let config = CatalogConfig::from_lookup(|key| {
            assert_eq!(key, EXPORT_PATH_ENV);
            Some(OsString::from("/srv/exports/today.xml"))
        });
        assert_eq!(config.source(), Path::new("/srv/exports/today.xml"));

        let empty = CatalogConfig::from_lookup(|_| Some(OsString::new()));
        assert_eq!(empty, CatalogConfig::default());
        assert_eq!(CatalogConfig::from_lookup(|_| None), CatalogConfig::default());
    }

    #[test]
    fn test_with_source() {
        let config = CatalogConfig::from_env().with_source("catalog.xml");
        assert_eq!(config.source(), Path::new("catalog.xml"));
    }
}
