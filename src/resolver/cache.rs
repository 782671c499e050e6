use std::{
    collections::HashSet,
    path::PathBuf,
    sync::Arc,
};

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::{
    file::{Backend, FileCache},
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
        identity::AssemblyIdentity,
        typesystem::ModuleRc,
    },
    resolver::{AssemblyLocator, ModuleReader},
    utils::{unshare, SingleFlight},
    Error, Result,
};

/// Memoizing loader for dependency modules.
///
/// Maps assembly identities to decoded module graphs. A graph is located, mapped and read
/// at most once per identity, no matter how many threads ask for it at the same time, and
/// identities that locate the same file share one graph. Failed loads are reported to
/// every caller waiting on them and then forgotten, so a later request retries.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dotscope_resolver::{
///     metadata::{
///         diagnostics::Diagnostics,
///         identity::{AssemblyIdentity, AssemblyVersion},
///         runtime::TargetRuntime,
///         typesystem::ModuleDefinition,
///     },
///     resolver::{FrameworkLocator, ModuleCache},
/// };
///
/// let runtime = TargetRuntime::NetFramework(AssemblyVersion::new(4, 8, 0, 0));
/// let cache = ModuleCache::new(
///     Arc::new(FrameworkLocator::new(runtime)),
///     Arc::new(|_: &std::path::Path, _: &[u8]| -> dotscope_resolver::Result<_> {
///         Err(dotscope_resolver::Error::NotSupported)
///     }),
///     Arc::new(Diagnostics::new()),
/// );
///
/// let primary = ModuleDefinition::new("App.exe", AssemblyIdentity::parse("App, Version=1.0.0.0")?);
/// cache.register(primary.clone())?;
/// assert!(Arc::ptr_eq(&cache.load(primary.assembly())?, &primary));
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub struct ModuleCache {
    locator: Arc<dyn AssemblyLocator>,
    reader: Arc<dyn ModuleReader>,
    files: FileCache,
    modules: SingleFlight<AssemblyIdentity, ModuleRc>,
    paths: SingleFlight<PathBuf, ModuleRc>,
    diagnostics: Arc<Diagnostics>,
}

impl ModuleCache {
    /// Create an empty cache.
    ///
    /// # Arguments
    /// * `locator` - Maps identities to files
    /// * `reader` - Decodes located files
    /// * `diagnostics` - Receives load failures
    pub fn new(
        locator: Arc<dyn AssemblyLocator>,
        reader: Arc<dyn ModuleReader>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        ModuleCache {
            locator,
            reader,
            files: FileCache::new(),
            modules: SingleFlight::new(),
            paths: SingleFlight::new(),
            diagnostics,
        }
    }

    /// Returns the graph for `identity`, loading it on first request.
    ///
    /// # Errors
    /// Returns [`Error::AssemblyNotFound`] if the locator finds no file, the file or reader
    /// error if loading fails, or [`Error::LoadFailed`] wrapping the failure of a load
    /// another thread performed for the same identity.
    pub fn load(&self, identity: &AssemblyIdentity) -> Result<ModuleRc> {
        let mut loaded = false;
        let result = self.modules.get_or_load(identity.clone(), || {
            loaded = true;
            self.load_uncached(identity)
        });

        if !loaded && result.is_ok() {
            trace!("Module cache hit for '{}'", identity);
        }

        result.map_err(|source| unshare(source, || identity.display_name()))
    }

    fn load_uncached(&self, identity: &AssemblyIdentity) -> Result<ModuleRc> {
        let Some(path) = self.locator.locate(identity) else {
            warn!("Could not locate '{}'", identity);
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Probe,
                    "Assembly could not be located",
                )
                .with_assembly(identity.display_name()),
            );
            return Err(Error::AssemblyNotFound(identity.display_name()));
        };

        let result = self.paths.get_or_load(path.clone(), || {
            let view = self.files.open(&path)?;
            debug!("Reading '{}' from {}", identity, path.display());

            let module = self.reader.read(&path, view.data())?;
            module.set_path(&path);
            Ok(module)
        });

        match result {
            Ok(module) => Ok(module),
            Err(source) => {
                warn!("Failed to load '{}' from {}: {}", identity, path.display(), source);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Load,
                        source.to_string(),
                    )
                    .with_assembly(identity.display_name())
                    .with_path(&path),
                );
                Err(unshare(source, || identity.display_name()))
            }
        }
    }

    /// Load several identities in parallel.
    ///
    /// Results are returned in input order. Identities that share a file, or repeat,
    /// are still loaded only once.
    pub fn load_many(&self, identities: &[AssemblyIdentity]) -> Vec<Result<ModuleRc>> {
        identities
            .par_iter()
            .map(|identity| self.load(identity))
            .collect()
    }

    /// Add an already decoded graph under its own assembly identity.
    ///
    /// Returns the graph stored for that identity afterwards, which is an earlier graph
    /// if one was already present.
    ///
    /// # Errors
    /// Returns the failure of an in-flight load of the same identity, or of the same file
    /// if the graph records the path it was read from.
    pub fn register(&self, module: ModuleRc) -> Result<ModuleRc> {
        let identity = module.assembly().clone();
        if let Some(path) = module.path() {
            self.paths
                .insert(path.to_path_buf(), module.clone())
                .map_err(|source| unshare(source, || path.display().to_string()))?;
        }

        let stored = self
            .modules
            .insert(identity.clone(), module)
            .map_err(|source| unshare(source, || identity.display_name()))?;
        debug!("Registered '{}'", identity);
        Ok(stored)
    }

    /// Drop the graph cached for `identity`, and everything sharing its file.
    ///
    /// The next request for any of these identities locates, maps and reads again.
    pub fn invalidate(&self, identity: &AssemblyIdentity) {
        let Some(module) = self.modules.remove(identity) else {
            return;
        };

        for alias in self.modules.keys() {
            if self
                .modules
                .get(&alias)
                .is_some_and(|other| Arc::ptr_eq(&other, &module))
            {
                self.modules.remove(&alias);
            }
        }

        if let Some(path) = module.path() {
            let path = path.to_path_buf();
            self.paths.remove(&path);
            self.files.invalidate(&path);
        }
        debug!("Invalidated '{}'", identity);
    }

    /// Drop every cached graph, release every mapped file and forget reported diagnostics.
    pub fn clear(&self) {
        self.modules.clear();
        self.paths.clear();
        self.files.dispose();
        self.diagnostics.clear();
    }

    /// The cached graph for `identity`, without loading.
    pub fn get(&self, identity: &AssemblyIdentity) -> Option<ModuleRc> {
        self.modules.get(identity)
    }

    /// Returns `true` if a graph is cached for `identity`.
    pub fn is_loaded(&self, identity: &AssemblyIdentity) -> bool {
        self.modules.contains(identity)
    }

    /// All cached graphs, each listed once even if several identities share it.
    pub fn loaded(&self) -> Vec<ModuleRc> {
        let mut seen = HashSet::new();
        self.modules
            .values()
            .into_iter()
            .filter(|module| seen.insert(Arc::as_ptr(module)))
            .collect()
    }

    /// The file cache backing this module cache.
    pub fn files(&self) -> &FileCache {
        &self.files
    }

    /// The locator used for cache misses.
    pub fn locator(&self) -> &dyn AssemblyLocator {
        self.locator.as_ref()
    }

    /// The diagnostics container load failures are reported to.
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{identity::AssemblyVersion, runtime::TargetRuntime},
        resolver::FrameworkLocator,
        test::{identity, CountingReader},
    };
    use std::{
        fs,
        sync::{atomic::Ordering, Barrier},
        thread,
    };

    fn runtime() -> TargetRuntime {
        TargetRuntime::NetFramework(AssemblyVersion::new(4, 8, 0, 0))
    }

    fn cache_in(dir: &std::path::Path) -> (ModuleCache, Arc<CountingReader>) {
        let reader = Arc::new(CountingReader::new());
        let cache = ModuleCache::new(
            Arc::new(FrameworkLocator::new(runtime()).with_search_directory(dir)),
            reader.clone(),
            Arc::new(Diagnostics::new()),
        );
        (cache, reader)
    }

    #[test]
    fn load_once_and_memoize() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Library.dll"), b"Library").unwrap();
        let (cache, reader) = cache_in(dir.path());

        let library = identity("Library", 1);
        let first = cache.load(&library).unwrap();
        let second = cache.load(&library).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
        assert_eq!(first.path(), Some(dir.path().join("Library.dll").as_path()));
        assert!(cache.is_loaded(&library));
        assert!(cache.files().is_open(&dir.path().join("Library.dll")));
    }

    #[test]
    fn concurrent_loads_share_one_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Library.dll"), b"Library").unwrap();
        let (cache, reader) = cache_in(dir.path());
        let cache = Arc::new(cache);

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.load(&identity("Library", 1)).unwrap()
                })
            })
            .collect();

        let modules: Vec<ModuleRc> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(modules.iter().all(|m| Arc::ptr_eq(m, &modules[0])));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identities_sharing_a_file_share_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mscorlib.dll"), b"mscorlib").unwrap();
        let (cache, reader) = cache_in(dir.path());

        let v2 = cache.load(&identity("mscorlib", 2)).unwrap();
        let v4 = cache.load(&identity("mscorlib", 4)).unwrap();

        assert!(Arc::ptr_eq(&v2, &v4));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loaded().len(), 1);
    }

    #[test]
    fn missing_assembly_is_reported_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, reader) = cache_in(dir.path());
        let library = identity("Library", 1);

        assert!(matches!(cache.load(&library), Err(Error::AssemblyNotFound(_))));
        assert!(!cache.is_loaded(&library));
        assert_eq!(cache.diagnostics().by_category(DiagnosticCategory::Probe).len(), 1);

        fs::write(dir.path().join("Library.dll"), b"Library").unwrap();
        assert!(cache.load(&library).is_ok());
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reader_failure_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Broken.dll"), b"!broken").unwrap();
        let (cache, reader) = cache_in(dir.path());
        let broken = identity("Broken", 1);

        assert!(cache.load(&broken).is_err());
        assert!(cache.load(&broken).is_err());
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.diagnostics().by_category(DiagnosticCategory::Load).len(), 1);
    }

    #[test]
    fn repeated_misses_report_once() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = cache_in(dir.path());
        let missing = identity("Missing", 1);

        for _ in 0..1000 {
            assert!(cache.load(&missing).is_err());
        }
        assert_eq!(cache.diagnostics().len(), 1);

        cache.load(&identity("Other", 1)).unwrap_err();
        assert_eq!(cache.diagnostics().len(), 2);

        cache.clear();
        assert!(cache.diagnostics().is_empty());
        assert!(cache.load(&missing).is_err());
        assert_eq!(cache.diagnostics().len(), 1);
    }

    #[test]
    fn registered_path_is_shared_with_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.dll");
        fs::write(&path, b"!broken").unwrap();
        let (cache, _) = cache_in(dir.path());
        assert!(cache.load(&identity("Broken", 1)).is_err());

        let module = crate::metadata::typesystem::ModuleDefinition::new(
            "Broken.dll",
            identity("Broken", 2),
        );
        module.set_path(&path);
        let stored = cache.register(module.clone()).unwrap();
        assert!(Arc::ptr_eq(&stored, &module));
        assert!(Arc::ptr_eq(&cache.load(&identity("Broken", 1)).unwrap(), &module));
    }

    #[test]
    fn invalidate_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Library.dll");
        fs::write(&path, b"Library").unwrap();
        let (cache, reader) = cache_in(dir.path());
        let library = identity("Library", 1);
        let alias = identity("Library", 2);

        let first = cache.load(&library).unwrap();
        cache.load(&alias).unwrap();
        cache.invalidate(&library);

        assert!(!cache.is_loaded(&library));
        assert!(!cache.is_loaded(&alias));
        assert!(!cache.files().is_open(&path));

        let second = cache.load(&library).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn register_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, reader) = cache_in(dir.path());

        let module = crate::metadata::typesystem::ModuleDefinition::new(
            "App.exe",
            identity("App", 1),
        );
        assert!(Arc::ptr_eq(&cache.register(module.clone()).unwrap(), &module));
        assert!(Arc::ptr_eq(&cache.load(&identity("App", 1)).unwrap(), &module));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);

        cache.clear();
        assert!(cache.get(&identity("App", 1)).is_none());
        assert!(cache.loaded().is_empty());
    }

    #[test]
    fn load_many_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.dll"), b"A").unwrap();
        fs::write(dir.path().join("B.dll"), b"B").unwrap();
        let (cache, reader) = cache_in(dir.path());

        let results = cache.load_many(&[
            identity("A", 1),
            identity("Missing", 1),
            identity("B", 1),
            identity("A", 1),
        ]);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().assembly().name, "A");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().assembly().name, "B");
        assert!(Arc::ptr_eq(
            results[0].as_ref().unwrap(),
            results[3].as_ref().unwrap()
        ));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
    }
}
