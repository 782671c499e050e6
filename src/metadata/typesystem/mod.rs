//! In-memory module graph: types, members and the references between them.
//!
//! This is the object model the resolver walks. Definitions are owned by their module,
//! references are symbolic (namespace, name, scope) and are resolved on demand. Names,
//! namespaces, base types and reference scopes are mutable in place, so a graph can be
//! edited while it is being resolved against.
//!
//! # Key Components
//!
//! - [`ModuleDefinition`]: One decoded module, owning its top-level and exported types
//! - [`TypeDef`]: A type definition with ordered members, interfaces and nested types
//! - [`TypeRef`]: A symbolic type reference anchored at a [`ResolutionScope`]
//! - [`TypeDefOrRef`]: Any of a definition, a reference or a signature-described type
//! - [`MethodDef`], [`FieldDef`], [`MemberRef`]: Members and member references
//! - [`CorLibTypeKind`]: The fundamental types of the base library
//! - [`TypeSignatureHash`]: Hash builder used for structural type hashing
//!
//! # Examples
//!
//! ```rust
//! use dotscope_resolver::metadata::{
//!     identity::AssemblyIdentity,
//!     typesystem::{ModuleDefinition, ResolutionScope, TypeDef, TypeDefOrRef, TypeRef},
//! };
//!
//! let corlib = AssemblyIdentity::parse("mscorlib, Version=4.0.0.0")?;
//! let module = ModuleDefinition::new("mscorlib.dll", corlib.clone());
//! module.add_type(TypeDef::new(Some("System"), "Object"));
//!
//! let object = TypeRef::new(ResolutionScope::Assembly(corlib), Some("System"), "Object");
//! assert_eq!(TypeDefOrRef::from(object).fullname(), "System.Object");
//! # Ok::<(), dotscope_resolver::Error>(())
//! ```

mod hash;
mod members;
mod module;
mod primitives;
mod typedef;
mod typeref;

use std::sync::Arc;

pub use hash::TypeSignatureHash;
pub use members::{FieldDef, FieldDefRc, MemberRef, MemberRefRc, MethodDef, MethodDefRc};
pub use module::{
    ExportedType, ExportedTypeImplementation, ExportedTypeRc, ModuleDefinition, ModuleRc,
};
pub use primitives::CorLibTypeKind;
pub use typedef::{TypeDef, TypeDefRc};
pub use typeref::{ResolutionScope, TypeRef, TypeRefRc};

use crate::metadata::signatures::{SignatureMember, TypeSignature};

/// Joins namespace and name the way metadata displays them.
pub(crate) fn fullname(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(namespace) if !namespace.is_empty() => format!("{}.{}", namespace, name),
        _ => name.to_string(),
    }
}

/// A type descriptor: a definition, a reference, or a type described by a signature
/// (the `TypeDefOrRef` coded index, §II.24.2.6).
#[derive(Debug, Clone)]
pub enum TypeDefOrRef {
    /// A type defined in a loaded module
    Definition(TypeDefRc),
    /// A symbolic reference, possibly into another assembly
    Reference(TypeRefRc),
    /// A constructed type, e.g. a generic instance used as a base type
    Specification(Arc<TypeSignature>),
}

impl TypeDefOrRef {
    /// Current name of the named type; for specifications, of the type they are built on.
    pub fn name(&self) -> Option<String> {
        match self {
            TypeDefOrRef::Definition(def) => Some(def.name()),
            TypeDefOrRef::Reference(reference) => Some(reference.name()),
            TypeDefOrRef::Specification(signature) => signature.named_type()?.name(),
        }
    }

    /// Current namespace of the named type.
    pub fn namespace(&self) -> Option<String> {
        match self {
            TypeDefOrRef::Definition(def) => def.namespace(),
            TypeDefOrRef::Reference(reference) => reference.namespace(),
            TypeDefOrRef::Specification(signature) => signature.named_type()?.namespace(),
        }
    }

    /// Display name, for diagnostics.
    pub fn fullname(&self) -> String {
        match self {
            TypeDefOrRef::Definition(def) => def.fullname(),
            TypeDefOrRef::Reference(reference) => reference.fullname(),
            TypeDefOrRef::Specification(signature) => match signature.named_type() {
                Some(named) => named.fullname(),
                None => format!("{:?}", signature),
            },
        }
    }

    /// Returns the definition, if this is one.
    pub fn as_definition(&self) -> Option<&TypeDefRc> {
        match self {
            TypeDefOrRef::Definition(def) => Some(def),
            _ => None,
        }
    }

    /// Returns the reference, if this is one.
    pub fn as_reference(&self) -> Option<&TypeRefRc> {
        match self {
            TypeDefOrRef::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

impl From<TypeDefRc> for TypeDefOrRef {
    fn from(def: TypeDefRc) -> Self {
        TypeDefOrRef::Definition(def)
    }
}

impl From<TypeRefRc> for TypeDefOrRef {
    fn from(reference: TypeRefRc) -> Self {
        TypeDefOrRef::Reference(reference)
    }
}

impl From<TypeSignature> for TypeDefOrRef {
    fn from(signature: TypeSignature) -> Self {
        TypeDefOrRef::Specification(Arc::new(signature))
    }
}

/// A member descriptor: a method or field definition, or a member reference.
#[derive(Debug, Clone)]
pub enum MemberDescriptor {
    /// A method definition
    Method(MethodDefRc),
    /// A field definition
    Field(FieldDefRc),
    /// A reference to a method or field
    Reference(MemberRefRc),
}

impl MemberDescriptor {
    /// Current member name.
    pub fn name(&self) -> String {
        match self {
            MemberDescriptor::Method(method) => method.name(),
            MemberDescriptor::Field(field) => field.name(),
            MemberDescriptor::Reference(reference) => reference.name(),
        }
    }

    /// The declaring type, if it is known.
    pub fn declaring_type(&self) -> Option<TypeDefOrRef> {
        match self {
            MemberDescriptor::Method(method) => method.declaring_type().map(TypeDefOrRef::from),
            MemberDescriptor::Field(field) => field.declaring_type().map(TypeDefOrRef::from),
            MemberDescriptor::Reference(reference) => Some(reference.parent()),
        }
    }

    /// The member signature.
    pub fn signature(&self) -> SignatureMember {
        match self {
            MemberDescriptor::Method(method) => SignatureMember::Method(method.signature.clone()),
            MemberDescriptor::Field(field) => SignatureMember::Field(field.signature.clone()),
            MemberDescriptor::Reference(reference) => reference.signature.clone(),
        }
    }
}

impl From<MethodDefRc> for MemberDescriptor {
    fn from(method: MethodDefRc) -> Self {
        MemberDescriptor::Method(method)
    }
}

impl From<FieldDefRc> for MemberDescriptor {
    fn from(field: FieldDefRc) -> Self {
        MemberDescriptor::Field(field)
    }
}

impl From<MemberRefRc> for MemberDescriptor {
    fn from(reference: MemberRefRc) -> Self {
        MemberDescriptor::Reference(reference)
    }
}

/// The definition a member reference resolves to.
#[derive(Debug, Clone)]
pub enum MemberDefinition {
    /// A method definition
    Method(MethodDefRc),
    /// A field definition
    Field(FieldDefRc),
}

impl MemberDefinition {
    /// Returns the method, if this is one.
    pub fn as_method(&self) -> Option<&MethodDefRc> {
        match self {
            MemberDefinition::Method(method) => Some(method),
            MemberDefinition::Field(_) => None,
        }
    }

    /// Returns the field, if this is one.
    pub fn as_field(&self) -> Option<&FieldDefRc> {
        match self {
            MemberDefinition::Field(field) => Some(field),
            MemberDefinition::Method(_) => None,
        }
    }

    /// Current member name.
    pub fn name(&self) -> String {
        match self {
            MemberDefinition::Method(method) => method.name(),
            MemberDefinition::Field(field) => field.name(),
        }
    }
}

impl From<MemberDefinition> for MemberDescriptor {
    fn from(definition: MemberDefinition) -> Self {
        match definition {
            MemberDefinition::Method(method) => MemberDescriptor::Method(method),
            MemberDefinition::Field(field) => MemberDescriptor::Field(field),
        }
    }
}
