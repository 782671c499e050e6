use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use log::{debug, trace};

use crate::metadata::{identity::AssemblyIdentity, runtime::TargetRuntime};

/// Maps an assembly identity to a file on disk.
///
/// Implementations decide which directories to probe and in which order. The first
/// existing candidate wins; a locator never opens or validates the file it returns.
pub trait AssemblyLocator: Send + Sync {
    /// Find the file implementing `identity`, if any.
    fn locate(&self, identity: &AssemblyIdentity) -> Option<PathBuf>;

    /// The caller-supplied directories, probed before any runtime-specific location.
    fn search_directories(&self) -> &SearchDirectories;

    /// The runtime this locator probes for.
    fn runtime(&self) -> TargetRuntime;
}

/// Ordered, thread-safe list of directories to probe.
///
/// Owned by one locator; mutations are seen by the next `locate` call.
#[derive(Debug, Default)]
pub struct SearchDirectories {
    directories: RwLock<Vec<PathBuf>>,
}

impl SearchDirectories {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory. Duplicates are ignored.
    pub fn push(&self, directory: impl Into<PathBuf>) {
        let directory = directory.into();
        let mut directories = write_lock!(self.directories);
        if !directories.contains(&directory) {
            directories.push(directory);
        }
    }

    /// Insert a directory at `index`, clamped to the end of the list.
    pub fn insert(&self, index: usize, directory: impl Into<PathBuf>) {
        let directory = directory.into();
        let mut directories = write_lock!(self.directories);
        directories.retain(|existing| *existing != directory);
        let index = index.min(directories.len());
        directories.insert(index, directory);
    }

    /// Remove a directory, returns whether it was present.
    pub fn remove(&self, directory: &Path) -> bool {
        let mut directories = write_lock!(self.directories);
        let before = directories.len();
        directories.retain(|existing| existing != directory);
        directories.len() != before
    }

    /// Remove all directories.
    pub fn clear(&self) {
        write_lock!(self.directories).clear();
    }

    /// Copy of the current list, in probe order.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        read_lock!(self.directories).clone()
    }

    /// Number of directories.
    pub fn len(&self) -> usize {
        read_lock!(self.directories).len()
    }

    /// Returns `true` if there are no directories.
    pub fn is_empty(&self) -> bool {
        read_lock!(self.directories).is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SearchDirectories {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        let directories = SearchDirectories::new();
        for directory in iter {
            directories.push(directory);
        }
        directories
    }
}

/// Candidate files for `identity` inside `directory`, in probe order.
pub(crate) fn candidates(directory: &Path, identity: &AssemblyIdentity) -> Vec<PathBuf> {
    let name = &identity.name;
    let mut candidates = Vec::with_capacity(5);

    if let Some(culture) = identity.culture.as_deref() {
        let satellite = directory.join(culture);
        candidates.push(satellite.join(format!("{}.dll", name)));
        candidates.push(satellite.join(format!("{}.exe", name)));
    }

    candidates.push(directory.join(format!("{}.dll", name)));
    candidates.push(directory.join(format!("{}.exe", name)));
    candidates.push(directory.join(name).join(format!("{}.dll", name)));
    candidates
}

/// Probe one directory for `identity`.
///
/// Tries `<culture>/<name>.dll` and `<culture>/<name>.exe` when the identity has a
/// culture, then `<name>.dll`, `<name>.exe` and `<name>/<name>.dll`. A candidate that
/// cannot be inspected counts as absent.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{metadata::identity::AssemblyIdentity, resolver::probe_directory};
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("Demo.dll"), b"MZ")?;
///
/// let identity = AssemblyIdentity::parse("Demo, Version=1.0.0.0")?;
/// assert_eq!(probe_directory(dir.path(), &identity), Some(dir.path().join("Demo.dll")));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn probe_directory(directory: &Path, identity: &AssemblyIdentity) -> Option<PathBuf> {
    for candidate in candidates(directory, identity) {
        if candidate.is_file() {
            debug!("Located '{}' at {}", identity.name, candidate.display());
            return Some(candidate);
        }
        trace!("Probe miss for '{}': {}", identity.name, candidate.display());
    }
    None
}

/// Probe every directory of `directories` in order.
pub(crate) fn probe_all(directories: &SearchDirectories, identity: &AssemblyIdentity) -> Option<PathBuf> {
    directories
        .snapshot()
        .iter()
        .find_map(|directory| probe_directory(directory, identity))
}
