//! Cross-module resolution of type and member references.
//!
//! A reference found in one module names its target symbolically: a namespace and name
//! anchored at a scope, plus a signature for members. This module turns such references
//! into the definitions that provide them, loading dependency assemblies from disk on
//! demand.
//!
//! # Architecture
//!
//! Resolution is layered, each layer usable on its own:
//!
//! - [`AssemblyLocator`] - maps an assembly identity to a file, per runtime flavor
//!   ([`FrameworkLocator`], [`NetCoreLocator`])
//! - [`ModuleCache`] - single-flight, memoized loading of module graphs through a
//!   [`ModuleReader`], backed by the mapped [`crate::file::FileCache`]
//! - [`SignatureComparer`] - structural equality and hashing of types, members and
//!   signatures across modules
//! - [`CorLibrary`] - the base library fundamental types resolve to without loading
//! - [`MetadataResolver`] - the scope walk and member search tying it all together
//!
//! # Caching
//!
//! Only module graphs are cached. References never remember what they resolved to, and
//! every lookup scans the live tables by current name, so renaming a reference or a
//! definition is reflected by the next call.
//!
//! # Examples
//!
//! ```rust
//! use std::{path::Path, sync::Arc};
//! use dotscope_resolver::{
//!     metadata::{
//!         identity::AssemblyIdentity,
//!         runtime::TargetRuntime,
//!         typesystem::{ModuleRc, ResolutionScope, TypeRef},
//!     },
//!     Error, MetadataResolver, Result,
//! };
//!
//! let resolver = MetadataResolver::builder()
//!     .runtime(TargetRuntime::parse("net8.0")?)
//!     .reader(Arc::new(|_: &Path, _: &[u8]| -> Result<ModuleRc> { Err(Error::NotSupported) }))
//!     .build()?;
//!
//! // Fundamental types resolve through any base library facade without touching disk
//! let runtime = AssemblyIdentity::parse("System.Runtime, Version=8.0.0.0")?;
//! let object = TypeRef::new(ResolutionScope::Assembly(runtime), Some("System"), "Object");
//! assert!(resolver.resolve_type_ref(&object).is_some());
//! # Ok::<(), dotscope_resolver::Error>(())
//! ```

mod builder;
mod cache;
mod comparer;
mod corlib;
mod framework;
mod locator;
mod metadata;
mod netcore;
mod reader;

pub use builder::ResolverBuilder;
pub use cache::ModuleCache;
pub use comparer::{ComparisonFlags, SignatureComparer};
pub use corlib::CorLibrary;
pub use framework::FrameworkLocator;
pub use locator::{probe_directory, AssemblyLocator, SearchDirectories};
pub use metadata::MetadataResolver;
pub use netcore::{Exact, FrameworkInstall, FrameworkVersionPolicy, LatestCompatible, NetCoreLocator};
pub use reader::ModuleReader;
