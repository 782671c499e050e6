use std::{path::PathBuf, sync::Arc};

use log::debug;

use crate::{
    metadata::{
        diagnostics::Diagnostics,
        runtime::{RuntimeKind, TargetRuntime},
        typesystem::ModuleRc,
    },
    resolver::{
        metadata::DEFAULT_MAX_DEPTH, AssemblyLocator, CorLibrary, FrameworkLocator,
        MetadataResolver, ModuleCache, ModuleReader, NetCoreLocator, SignatureComparer,
    },
    Error, Result,
};

/// Configures and creates a [`MetadataResolver`].
///
/// Only the [`ModuleReader`] is required. Without an explicit locator, one matching the
/// target runtime is created: [`FrameworkLocator`] for .NET Framework, [`NetCoreLocator`]
/// otherwise. Without an explicit base library, the one of the target runtime is loaded
/// through the locator on first use; only if that fails does a member-less skeleton
/// stand in.
///
/// # Examples
///
/// ```rust
/// use std::{path::Path, sync::Arc};
/// use dotscope_resolver::{
///     metadata::{runtime::TargetRuntime, typesystem::ModuleRc},
///     resolver::{ComparisonFlags, SignatureComparer},
///     Error, MetadataResolver, Result,
/// };
///
/// let resolver = MetadataResolver::builder()
///     .runtime(TargetRuntime::parse(".NETFramework,Version=v4.7.2")?)
///     .search_directory("/app/bin")
///     .comparer(SignatureComparer::new(ComparisonFlags::ACCEPT_NEWER_VERSIONS))
///     .reader(Arc::new(|_: &Path, _: &[u8]| -> Result<ModuleRc> { Err(Error::NotSupported) }))
///     .build()?;
///
/// assert_eq!(resolver.corlib().identity().name, "mscorlib");
/// assert_eq!(resolver.cache().locator().search_directories().len(), 1);
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub struct ResolverBuilder {
    runtime: TargetRuntime,
    search_directories: Vec<PathBuf>,
    locator: Option<Arc<dyn AssemblyLocator>>,
    reader: Option<Arc<dyn ModuleReader>>,
    corlib: Option<ModuleRc>,
    modules: Vec<ModuleRc>,
    comparer: SignatureComparer,
    max_depth: usize,
}

impl ResolverBuilder {
    /// Create a builder targeting the default runtime.
    #[must_use]
    pub fn new() -> Self {
        ResolverBuilder {
            runtime: TargetRuntime::default(),
            search_directories: Vec::new(),
            locator: None,
            reader: None,
            corlib: None,
            modules: Vec::new(),
            comparer: SignatureComparer::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the runtime the analyzed modules target.
    #[must_use]
    pub fn runtime(mut self, runtime: TargetRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Append a directory probed before any runtime location.
    #[must_use]
    pub fn search_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.search_directories.push(directory.into());
        self
    }

    /// Use a custom locator. Search directories of this builder are added to it.
    #[must_use]
    pub fn locator(mut self, locator: Arc<dyn AssemblyLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Set the reader decoding located files.
    #[must_use]
    pub fn reader(mut self, reader: Arc<dyn ModuleReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Use a decoded base library instead of locating the runtime's.
    ///
    /// The module is also registered under its own identity.
    #[must_use]
    pub fn corlib(mut self, module: ModuleRc) -> Self {
        self.corlib = Some(module);
        self
    }

    /// Register an already decoded module, typically the one under analysis.
    #[must_use]
    pub fn module(mut self, module: ModuleRc) -> Self {
        self.modules.push(module);
        self
    }

    /// Set the comparer used to match members.
    #[must_use]
    pub fn comparer(mut self, comparer: SignatureComparer) -> Self {
        self.comparer = comparer;
        self
    }

    /// Bound nested scope, forwarder and inheritance walks to `max_depth` levels.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Create the resolver.
    ///
    /// # Errors
    /// Returns [`Error::Error`] if no reader was set.
    pub fn build(self) -> Result<MetadataResolver> {
        let reader = self
            .reader
            .ok_or_else(|| Error::Error("A module reader is required".to_string()))?;

        let runtime = self.runtime;
        let locator: Arc<dyn AssemblyLocator> = match self.locator {
            Some(locator) => locator,
            None => match runtime.kind() {
                RuntimeKind::NetFramework => Arc::new(FrameworkLocator::new(runtime)),
                RuntimeKind::NetCore | RuntimeKind::NetStandard => {
                    Arc::new(NetCoreLocator::new(runtime))
                }
            },
        };
        for directory in self.search_directories {
            locator.search_directories().push(directory);
        }

        let diagnostics = Arc::new(Diagnostics::new());
        let cache = Arc::new(ModuleCache::new(locator, reader, diagnostics));

        let corlib = match self.corlib {
            Some(module) => {
                cache.register(module.clone())?;
                Some(CorLibrary::from_module(module))
            }
            None => None,
        };
        for module in self.modules {
            cache.register(module)?;
        }

        match &corlib {
            Some(corlib) => debug!(
                "Created resolver for {} with base library '{}'",
                runtime,
                corlib.identity()
            ),
            None => debug!("Created resolver for {}", runtime),
        }
        Ok(MetadataResolver::new(
            cache,
            corlib,
            runtime,
            self.comparer,
            self.max_depth,
        ))
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
