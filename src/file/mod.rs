//! File access layer for module files on disk.
//!
//! Resolution touches the filesystem at a single point: when a dependency assembly has been
//! located and must be handed to the decoding layer. This module owns that access.
//!
//! # Key Components
//!
//! - [`Backend`] - Bounds-checked byte access to a loaded file
//! - [`Physical`] - Memory-mapped, read-only [`Backend`] for files on disk
//! - [`FileCache`] - At most one open [`Physical`] per path, with explicit invalidation
//!
//! # Thread Safety
//!
//! [`FileCache`] is [`Send`] and [`Sync`]. Concurrent `open` calls for the same new path map
//! the file exactly once; calls for different paths never wait on each other.

mod physical;

pub use physical::Physical;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, trace};

use crate::{
    utils::{unshare, SingleFlight},
    Result,
};

/// Shared, read-only view of a cached file.
///
/// The view stays memory-safe after [`FileCache::invalidate`] or [`FileCache::dispose`]:
/// the cache only drops its own handle, and the mapping is released once the last view is
/// dropped. Callers must not expect a view obtained before invalidation to reflect the file
/// contents on disk afterwards.
pub type SharedView = Arc<Physical>;

/// Backend for byte access to a loaded module file.
///
/// Implemented by [`Physical`]; the decoding layer reads through this trait so that
/// it does not need to know where the bytes come from.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache of open, memory-mapped module files keyed by absolute path.
///
/// Relative paths are made absolute against the working directory, so `deps/A.dll` and
/// `./deps/A.dll` share one mapping. Symbolic links are not resolved.
///
/// # Examples
///
/// ```rust,no_run
/// use dotscope_resolver::file::{Backend, FileCache};
/// use std::{path::Path, sync::Arc};
///
/// let cache = FileCache::new();
/// let first = cache.open(Path::new("deps/Newtonsoft.Json.dll"))?;
/// let second = cache.open(Path::new("deps/Newtonsoft.Json.dll"))?;
/// assert!(Arc::ptr_eq(&first, &second));
///
/// // The file changed on disk, drop the stale mapping
/// cache.invalidate(Path::new("deps/Newtonsoft.Json.dll"));
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub struct FileCache {
    files: SingleFlight<PathBuf, SharedView>,
}

impl FileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        FileCache {
            files: SingleFlight::new(),
        }
    }

    /// Returns the cached view for `path`, mapping the file if it was not opened before.
    ///
    /// # Arguments
    /// * `path` - Path of the module file
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or
    /// [`crate::Error::LoadFailed`] when a concurrent open of the same path failed.
    pub fn open(&self, path: &Path) -> Result<SharedView> {
        let mut mapped = false;
        let result = self.files.get_or_load(Self::key(path), || {
            mapped = true;
            debug!("Mapping {}", path.display());
            Ok(Arc::new(Physical::new(path)?))
        });

        if !mapped {
            trace!("File cache hit for {}", path.display());
        }

        result.map_err(|source| unshare(source, || path.display().to_string()))
    }

    /// Closes and evicts the entry for `path`, if present.
    ///
    /// A subsequent [`FileCache::open`] re-maps the file from disk.
    pub fn invalidate(&self, path: &Path) {
        if self.files.remove(&Self::key(path)).is_some() {
            debug!("Invalidated {}", path.display());
        }
    }

    /// Closes every cached handle and clears the cache.
    pub fn dispose(&self) {
        self.files.clear();
    }

    /// Returns `true` if `path` is currently cached.
    #[must_use]
    pub fn is_open(&self, path: &Path) -> bool {
        self.files.contains(&Self::key(path))
    }

    /// Returns the paths of all currently cached files.
    #[must_use]
    pub fn opened_files(&self) -> Vec<PathBuf> {
        self.files.keys()
    }

    fn key(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::{sync::Barrier, thread};

    #[test]
    fn test_open_returns_cached_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Library.dll");
        std::fs::write(&path, b"first").unwrap();

        let cache = FileCache::new();
        let first = cache.open(&path).unwrap();
        let second = cache.open(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_open(&path));
        assert_eq!(cache.opened_files(), vec![path.clone()]);
    }

    #[test]
    fn test_invalidate_reopens_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Library.dll");
        std::fs::write(&path, b"first").unwrap();

        let cache = FileCache::new();
        let before = cache.open(&path).unwrap();
        assert_eq!(before.data(), b"first");

        // Replace the file rather than writing into the mapped inode
        std::fs::remove_file(&path).unwrap();
        std::fs::write(&path, b"second!").unwrap();

        // Still cached, still the old mapping
        assert!(Arc::ptr_eq(&before, &cache.open(&path).unwrap()));

        cache.invalidate(&path);
        assert!(!cache.is_open(&path));

        let after = cache.open(&path).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.data(), b"second!");
        // The old view stays readable
        assert_eq!(before.data(), b"first");
    }

    #[test]
    fn test_relative_paths_share_the_mapping() {
        let absolute = std::env::current_dir().unwrap().join("Cargo.toml");

        let cache = FileCache::new();
        let relative = cache.open(Path::new("Cargo.toml")).unwrap();
        let dotted = cache.open(Path::new("./Cargo.toml")).unwrap();

        assert!(Arc::ptr_eq(&relative, &dotted));
        assert!(Arc::ptr_eq(&relative, &cache.open(&absolute).unwrap()));
        assert_eq!(cache.opened_files(), vec![absolute.clone()]);

        cache.invalidate(Path::new("./Cargo.toml"));
        assert!(!cache.is_open(&absolute));
    }

    #[test]
    fn test_dispose_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.dll");
        let b = dir.path().join("B.dll");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let cache = FileCache::new();
        cache.open(&a).unwrap();
        cache.open(&b).unwrap();
        assert_eq!(cache.opened_files().len(), 2);

        cache.dispose();
        assert!(cache.opened_files().is_empty());
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Missing.dll");

        let cache = FileCache::new();
        assert!(matches!(cache.open(&path), Err(Error::FileError(_))));
        assert!(!cache.is_open(&path));

        std::fs::write(&path, b"now here").unwrap();
        assert!(cache.open(&path).is_ok());
    }

    #[test]
    fn test_concurrent_open_maps_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Shared.dll");
        std::fs::write(&path, b"shared").unwrap();

        let cache = Arc::new(FileCache::new());
        let barrier = Arc::new(Barrier::new(8));

        let views: Vec<SharedView> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                let path = path.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.open(&path).unwrap()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        for view in &views {
            assert!(Arc::ptr_eq(view, &views[0]));
        }
    }
}
