//! Store Module
//!
//! Raw byte I/O at paths relative to a fixed root directory. The cache core
//! depends only on the three-operation [`Store`] contract.

use std::future::Future;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;

/// Suffix of in-flight write files, see [`is_temp_file`]
const TEMP_SUFFIX: &str = ".tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// == Store Trait ==
/// Byte storage addressed by relative paths.
///
/// Implementations must treat a missing path as absence rather than failure:
/// `get` returns `Ok(None)` and `delete` returns `Ok(())`.
pub trait Store: Send + Sync + 'static {
    /// Reads the bytes stored at `path`.
    fn get(&self, path: &Path) -> impl Future<Output = io::Result<Option<Vec<u8>>>> + Send;

    /// Writes `bytes` to `path`, replacing any existing content.
    fn set(&self, path: &Path, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Removes whatever is stored at `path`.
    fn delete(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

// == File Store ==
/// [`Store`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory all relative paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path to its absolute location.
    pub fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Store for FileStore {
    async fn get(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.full_path(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes through a sibling temp file renamed into place, so readers
    /// only ever see a complete old or new entry.
    async fn set(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = temp_path_for(&full_path);
        if let Err(e) = fs::write(&tmp_path, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp_path, &full_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// == Temp Files ==
/// Unique sibling path for an in-flight write to `path`.
///
/// Named `.<file>.<pid>-<seq>.tmp`; entry files are hex digests and never
/// start with a dot.
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(
        ".{}.{}-{}{}",
        file_name,
        std::process::id(),
        seq,
        TEMP_SUFFIX
    ))
}

/// Whether `path` names an in-flight write left by [`FileStore::set`].
pub(crate) fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(TEMP_SUFFIX))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_set_and_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = Path::new("a/b/entry");

        store.set(path, b"hello").await.unwrap();

        assert_eq!(store.get(path).await.unwrap(), Some(b"hello".to_vec()));
        assert!(dir.path().join("a/b/entry").is_file());
    }

    #[tokio::test]
    async fn test_file_store_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = Path::new("x/entry");

        store.set(path, b"first, longer value").await.unwrap();
        store.set(path, b"second").await.unwrap();

        assert_eq!(store.get(path).await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_file_store_get_missing() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get(Path::new("nope/entry")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = Path::new("d/entry");

        store.set(path, b"bye").await.unwrap();
        store.delete(path).await.unwrap();
        store.delete(path).await.unwrap();

        assert_eq!(store.get(path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_set_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = Path::new("t/entry");

        store.set(path, b"one").await.unwrap();
        store.set(path, b"two").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path().join("t"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("entry")]);
    }

    #[test]
    fn test_temp_paths_are_unique_and_recognised() {
        let target = Path::new("/cache/a/abc.json");
        let first = temp_path_for(target);
        let second = temp_path_for(target);

        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
        assert!(is_temp_file(&first));
        assert!(!is_temp_file(target));
        assert!(!is_temp_file(Path::new("/cache/a/abc.tmp")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_readers_never_see_partial_writes() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));
        let path = Path::new("r/entry");
        let small = vec![b'a'; 16];
        let large = vec![b'b'; 1 << 20];
        store.set(path, &small).await.unwrap();

        let writer = {
            let store = store.clone();
            let large = large.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    store.set(Path::new("r/entry"), &large).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let bytes = store.get(path).await.unwrap().unwrap();
            assert!(bytes == small || bytes == large, "read a torn write");
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_reports_other_errors() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        // A directory where the file should be is an error, not absence
        std::fs::create_dir_all(dir.path().join("e/entry")).unwrap();
        assert!(store.get(Path::new("e/entry")).await.is_err());
        assert!(store.set(Path::new("e/entry"), b"v").await.is_err());
    }
}
