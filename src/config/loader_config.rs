use crate::services::error_handling::LoaderError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_THRESHOLD: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// The `limit` passed on every fetch
    pub page_size: usize,

    /// Rows from the end of the loaded list at which a consumer should
    /// request the next page. Carried by the loader, read by the table.
    pub threshold: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl LoaderConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.page_size == 0 {
            return Err(LoaderError::InvalidConfig {
                field: "page_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Viewport height in pixels
    pub height: f32,

    /// Fixed row height in pixels
    pub row_height: f32,

    /// How many `{ items: [], has_more: true }` pages in a row the table
    /// will fetch on its own before waiting for an explicit retry
    pub max_consecutive_empty_pages: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            height: 600.0,
            row_height: 50.0,
            max_consecutive_empty_pages: 3,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), LoaderError> {
        if !(self.height > 0.0) {
            return Err(LoaderError::InvalidConfig {
                field: "height".to_string(),
                reason: format!("must be positive, got {}", self.height),
            });
        }
        if !(self.row_height > 0.0) {
            return Err(LoaderError::InvalidConfig {
                field: "row_height".to_string(),
                reason: format!("must be positive, got {}", self.row_height),
            });
        }
        Ok(())
    }

    /// Number of rows that fit in the viewport, counting a partially visible one.
    pub fn visible_rows(&self) -> usize {
        (self.height / self.row_height).ceil() as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KolboardConfig {
    /// SQLite database file
    pub database_path: String,

    pub loader: LoaderConfig,

    pub table: TableConfig,
}

impl Default for KolboardConfig {
    fn default() -> Self {
        Self {
            database_path: "kolboard.db".to_string(),
            loader: LoaderConfig::default(),
            table: TableConfig::default(),
        }
    }
}

impl KolboardConfig {
    /// Load configuration from the user config directory, writing the
    /// defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            Ok(default_config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::Config {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| LoaderError::Config {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = ?path, "Configuration saved");
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("kolboard").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), LoaderError> {
        self.loader.validate()?;
        self.table.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KolboardConfig::default();
        assert_eq!(config.loader.page_size, 50);
        assert_eq!(config.loader.threshold, 5);
        assert_eq!(config.table.max_consecutive_empty_pages, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = LoaderConfig::default().with_page_size(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LoaderError::InvalidConfig { ref field, .. } if field == "page_size"));
    }

    #[test]
    fn test_non_positive_row_height_rejected() {
        let config = TableConfig {
            row_height: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            height: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visible_rows() {
        let config = TableConfig {
            height: 600.0,
            row_height: 60.0,
            ..Default::default()
        };
        assert_eq!(config.visible_rows(), 10);

        let config = TableConfig {
            height: 610.0,
            row_height: 60.0,
            ..Default::default()
        };
        assert_eq!(config.visible_rows(), 11);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[loader]\npage_size = 100\n").unwrap();

        let config = KolboardConfig::load_from(&path).unwrap();
        assert_eq!(config.loader.page_size, 100);
        assert_eq!(config.loader.threshold, 5);
        assert_eq!(config.database_path, "kolboard.db");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = KolboardConfig::default();
        config.database_path = "/tmp/kol.db".to_string();
        config.loader.threshold = 12;
        config.save_to(&path).unwrap();

        let loaded = KolboardConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[loader]\npage_size = 0\n").unwrap();
        assert!(KolboardConfig::load_from(&path).is_err());

        std::fs::write(&path, "loader = [").unwrap();
        let err = KolboardConfig::load_from(&path).unwrap_err();
        let loader_err = err.downcast_ref::<LoaderError>().unwrap();
        assert!(matches!(loader_err, LoaderError::Config { .. }));
    }
}
