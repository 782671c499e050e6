//! Metadata model for cross-module resolution.
//!
//! This module holds the decoded, in-memory view of .NET modules that the resolver works
//! on. Decoding itself happens elsewhere and hands its result over through
//! [`crate::resolver::ModuleReader`].
//!
//! # Key Components
//!
//! - [`identity`] - Assembly identities, versions and strong names
//! - [`typesystem`] - Module graphs: type definitions, references and members
//! - [`signatures`] - Structural method, field and type signatures
//! - [`runtime`] - Target runtime flavor and version
//! - [`diagnostics`] - Non-fatal problems found while loading and resolving

/// Diagnostics collected while loading dependencies and resolving references
pub mod diagnostics;
/// Assembly identities and strong names
pub mod identity;
/// Target runtime descriptor
pub mod runtime;
/// Method, field and type signatures
pub mod signatures;
/// Module graph object model
pub mod typesystem;
