use std::path::Path;

use crate::fs::{DirEntry, FileProvider};

#[derive(Clone, Debug, Default)]
pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FileProvider for LocalFileProvider {
    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn list(&self, root: &Path) -> std::io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut dir = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = dir.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(dir_entry) = DirEntry::from_path(&path) {
                    entries.push(dir_entry);
                }
            }
        }
        Ok(entries)
    }

    async fn load(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
