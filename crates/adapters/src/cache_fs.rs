//! Filesystem asset cache oracle

use asset_regen_domain::CacheSizeOracle;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Counts cached assets stored as files under `<root>/<category>/`
#[derive(Debug, Clone)]
pub struct FsCacheSizeOracle {
    root: PathBuf,
}

impl FsCacheSizeOracle {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CacheSizeOracle for FsCacheSizeOracle {
    async fn count_available(&self, category: &str) -> usize {
        let dir = self.root.join(category);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "No cached assets for category");
                return 0;
            }
        };

        let mut count = 0;
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                        count += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Failed to read asset cache entry");
                    break;
                }
            }
        }

        count
    }
}
