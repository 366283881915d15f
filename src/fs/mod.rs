pub mod local;

use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirEntry {
    /// Without extension
    pub filename: String,
    /// Full path, with the filename and the ext
    pub full_path: PathBuf,
    /// Extension of the file, lower-cased
    pub ext: String,
}

impl DirEntry {
    pub fn from_path(path: &Path) -> Option<Self> {
        let filename = path.file_stem()?.to_str()?.to_string();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        Some(DirEntry {
            filename,
            full_path: path.to_path_buf(),
            ext,
        })
    }
}

/// Filesystem access used by the engine.
///
/// Errors are surfaced rather than swallowed: a fragment that cannot be listed
/// or read must abort the whole load. Futures are `Send` so a reload can run
/// as its own task.
pub trait FileProvider: Send + Sync + 'static {
    /// Whether `path` resolves to an accessible directory.
    fn is_dir(&self, path: &Path) -> impl Future<Output = bool> + Send;
    /// Every regular file below `root`, recursively.
    fn list(&self, root: &Path) -> impl Future<Output = std::io::Result<Vec<DirEntry>>> + Send;
    fn load(&self, path: &Path) -> impl Future<Output = std::io::Result<String>> + Send;
}
