//! # dotscope-resolver Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotscope-resolver library. Import this module to get quick access to the
//! essential types for resolving references across assemblies.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotscope-resolver operations
pub use crate::Error;

/// The result type used throughout dotscope-resolver
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Resolution entry point and its configuration
pub use crate::resolver::{MetadataResolver, ResolverBuilder};

/// Decoding layer interface
pub use crate::resolver::ModuleReader;

// ================================================================================================
// Identities and Runtimes
// ================================================================================================

/// Assembly identity components
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, Identity};

/// Target runtime flavors
pub use crate::metadata::runtime::{RuntimeKind, TargetRuntime};

// ================================================================================================
// Type System
// ================================================================================================

/// Module graph components
pub use crate::metadata::typesystem::{
    CorLibTypeKind, ExportedType, FieldDef, FieldDefRc, MemberDefinition, MemberDescriptor,
    MemberRef, MemberRefRc, MethodDef, MethodDefRc, ModuleDefinition, ModuleRc,
    ResolutionScope, TypeDef, TypeDefOrRef, TypeDefRc, TypeRef, TypeRefRc,
};

/// Structural signatures
pub use crate::metadata::signatures::{
    SignatureField, SignatureMember, SignatureMethod, TypeSignature,
};

// ================================================================================================
// Resolution Components
// ================================================================================================

/// Assembly discovery
pub use crate::resolver::{AssemblyLocator, FrameworkLocator, NetCoreLocator, SearchDirectories};

/// Loading, matching and the base library
pub use crate::resolver::{ComparisonFlags, CorLibrary, ModuleCache, SignatureComparer};

/// Diagnostics collected during loading and resolution
pub use crate::metadata::diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics};
