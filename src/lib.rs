// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotscope-resolver
//!
//! Cross-assembly resolution for .NET (ECMA-335) metadata. Given a type, method or field
//! reference found while analyzing one module, `dotscope-resolver` finds the definition that
//! provides it: in the same module, in a dependency assembly located on disk, or in the
//! runtime base library.
//!
//! ## Features
//!
//! - **📂 Runtime aware probing** - .NET Framework directories and global assembly cache,
//!   .NET shared framework folders with pluggable version selection
//! - **⚡ Single-flight loading** - every dependency is located, mapped and decoded at most once,
//!   no matter how many threads need it
//! - **🔍 Structural matching** - types, members and signatures compare by shape, never by
//!   object identity, so references match definitions across independently loaded modules
//! - **🔄 Never stale** - references and definitions may be renamed in place; the next lookup
//!   reflects it, since only module graphs are cached
//! - **🛡️ Robust** - cyclic scopes, forwarders and base chains are dead ends, recorded as
//!   diagnostics instead of panics
//!
//! ## Quick Start
//!
//! The resolver does not decode binaries itself. A [`resolver::ModuleReader`] supplied by the
//! decoding layer turns located files into module graphs:
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//! use dotscope_resolver::prelude::*;
//!
//! fn decode(path: &Path, data: &[u8]) -> Result<ModuleRc> {
//!     // hand the bytes to your metadata decoder
//!     # unimplemented!()
//! }
//!
//! let resolver = MetadataResolver::builder()
//!     .runtime(TargetRuntime::parse(".NETFramework,Version=v4.8")?)
//!     .search_directory("C:/Windows/Microsoft.NET/Framework64/v4.0.30319")
//!     .reader(Arc::new(decode))
//!     .build()?;
//!
//! let mscorlib = AssemblyIdentity::parse("mscorlib, Version=4.0.0.0")?;
//! let console = TypeRef::new(ResolutionScope::Assembly(mscorlib), Some("System"), "Console");
//!
//! let write_line = MemberRef::new(
//!     console.into(),
//!     "WriteLine",
//!     SignatureMethod::new_static(TypeSignature::Void, vec![TypeSignature::String]),
//! );
//!
//! match resolver.resolve_method(&write_line) {
//!     Some(method) => println!("Resolved {}", method.name()),
//!     None => println!("Unresolved:\n{}", resolver.diagnostics()),
//! }
//! # Ok::<(), dotscope_resolver::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - The module graph model: identities, runtimes, types, members, signatures
//! - [`resolver`] - Locators, the module cache, the signature comparer and the resolver
//! - [`file`] - Memory-mapped, shared file access
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and installs no logger:
//! loads and cache hits at `debug`, probe misses and resolution steps at `trace`, load
//! failures and malformed scopes at `warn`.
//!
//! ## Standards Compliance
//!
//! The model follows the **ECMA-335 specification** (6th edition), Partition II.
//!
//! ### References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Official CLI specification
//! - [.NET Runtime](https://github.com/dotnet/runtime) - Microsoft's reference implementation
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotscope_resolver::prelude::*;
///
/// let identity = AssemblyIdentity::parse("System.Runtime, Version=8.0.0.0")?;
/// assert!(CorLibrary::is_corlib_name(&identity.name));
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub mod prelude;

/// Memory-mapped file access shared between loads
///
/// Each path is mapped once; every module read from it borrows the same view. Mappings
/// are released on invalidation once the last view is dropped.
pub mod file;

/// The in-memory metadata model resolution works on
///
/// # Key Components
///
/// - [`metadata::identity`] - Assembly identities, versions and strong names
/// - [`metadata::runtime`] - Target runtime flavors and their base libraries
/// - [`metadata::typesystem`] - Modules, types, members and references
/// - [`metadata::signatures`] - Structural method, field and type signatures
/// - [`metadata::diagnostics`] - Problems collected while loading and resolving
pub mod metadata;

/// Locating, loading and matching across assemblies
///
/// See [`resolver::MetadataResolver`] for the entry point.
pub mod resolver;

pub(crate) mod utils;

/// `dotscope-resolver` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `dotscope-resolver` Error type
///
/// The main error type for all operations in this crate. Note that resolution calls never
/// fail: unresolvable references yield `None`, and the causes are collected as diagnostics.
pub use error::Error;

/// Main entry point for resolving references
pub use resolver::MetadataResolver;
