use crate::core::Storage;
use crate::utils::error::{QuoteError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Local output directory for exported quotations.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    /// `path` joined under the base directory; it may only descend.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(QuoteError::InvalidConfigValue {
                field: "output path".to_string(),
                value: path.to_string(),
                reason: format!("must stay inside {}", self.base_path),
            });
        }
        Ok(Path::new(&self.base_path).join(relative))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = self.resolve(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!("writing file: {}", full_path.display());
        fs::write(&full_path, data)?;
        Ok(full_path.display().to_string())
    }
}
