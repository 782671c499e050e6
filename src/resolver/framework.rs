use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::{
    metadata::{identity::AssemblyIdentity, runtime::TargetRuntime},
    resolver::locator::{probe_all, AssemblyLocator, SearchDirectories},
};

/// Locator for the legacy .NET Framework.
///
/// Probes the caller's search directories in order, then each configured global assembly
/// cache root. There are no implicit default directories; callers add the framework
/// reference directories they want probed.
///
/// Matching is by file name only. Version, culture and public key token of a hit are not
/// checked against the requested identity.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{
///     metadata::{identity::{AssemblyIdentity, AssemblyVersion}, runtime::TargetRuntime},
///     resolver::{AssemblyLocator, FrameworkLocator},
/// };
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("mscorlib.dll"), b"MZ")?;
///
/// let locator = FrameworkLocator::new(TargetRuntime::NetFramework(AssemblyVersion::new(4, 8, 0, 0)))
///     .with_search_directory(dir.path());
/// let mscorlib = AssemblyIdentity::parse("mscorlib, Version=4.0.0.0")?;
/// assert_eq!(locator.locate(&mscorlib), Some(dir.path().join("mscorlib.dll")));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FrameworkLocator {
    runtime: TargetRuntime,
    directories: SearchDirectories,
    gac_roots: Vec<PathBuf>,
}

impl FrameworkLocator {
    /// Create a locator without search directories.
    #[must_use]
    pub fn new(runtime: TargetRuntime) -> Self {
        FrameworkLocator {
            runtime,
            directories: SearchDirectories::new(),
            gac_roots: Vec::new(),
        }
    }

    /// Append a search directory.
    #[must_use]
    pub fn with_search_directory(self, directory: impl Into<PathBuf>) -> Self {
        self.directories.push(directory);
        self
    }

    /// Add a global assembly cache root, e.g. `C:\Windows\Microsoft.NET\assembly\GAC_MSIL`.
    ///
    /// Roots are probed after the search directories, in the order they were added.
    #[must_use]
    pub fn with_gac_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.gac_roots.push(root.into());
        self
    }

    /// Candidate files for `identity` under one cache root.
    ///
    /// The cache keys entries by `<version>_<culture>_<token>`; the 4.0 cache prefixes
    /// that with `v4.0_`. Only strong-named assemblies live in the cache.
    fn gac_candidates(root: &Path, identity: &AssemblyIdentity) -> Vec<PathBuf> {
        let Some(token) = identity.public_key_token() else {
            return Vec::new();
        };

        let key = format!(
            "{}_{}_{}",
            identity.version,
            identity.culture.as_deref().unwrap_or_default(),
            hex::encode(token)
        );
        let file = format!("{}.dll", identity.name);
        let base = root.join(&identity.name);

        vec![
            base.join(&key).join(&file),
            base.join(format!("v4.0_{}", key)).join(&file),
        ]
    }

    fn probe_gac(&self, identity: &AssemblyIdentity) -> Option<PathBuf> {
        for root in &self.gac_roots {
            for candidate in Self::gac_candidates(root, identity) {
                if candidate.is_file() {
                    debug!("Located '{}' in cache at {}", identity.name, candidate.display());
                    return Some(candidate);
                }
                trace!("Cache miss for '{}': {}", identity.name, candidate.display());
            }
        }
        None
    }
}

impl AssemblyLocator for FrameworkLocator {
    fn locate(&self, identity: &AssemblyIdentity) -> Option<PathBuf> {
        probe_all(&self.directories, identity).or_else(|| self.probe_gac(identity))
    }

    fn search_directories(&self) -> &SearchDirectories {
        &self.directories
    }

    fn runtime(&self) -> TargetRuntime {
        self.runtime
    }
}
