//! Filesystem document loader
//!
//! Reads files under the workspace root on tokio's blocking pool. Existing
//! files that resolve outside the root are refused.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::error::LoadError;
use crate::core::file_reader::{read_document, FileReadConfig};
use crate::core::location::FileId;
use crate::core::paths::{is_within_root, resolve};
use crate::tree::document::{DocumentLoader, LoadFuture};

#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
    config: Arc<FileReadConfig>,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>, config: FileReadConfig) -> Self {
        Self {
            root: root.into(),
            config: Arc::new(config),
        }
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self, file: &FileId) -> LoadFuture {
        let path = resolve(&self.root, file);
        let root = self.root.clone();
        let config = self.config.clone();
        let file = file.clone();
        Box::pin(async move {
            let task_file = file.clone();
            tokio::task::spawn_blocking(move || {
                if path.exists() && !is_within_root(&path, &root) {
                    return Err(LoadError::Skipped {
                        path,
                        reason: "Outside the workspace root".to_string(),
                    });
                }
                read_document(&path, task_file, &config)
            })
            .await
            .map_err(|_| LoadError::Aborted(file))?
        })
    }
}
