use bitflags::bitflags;

use crate::metadata::{
    identity::AssemblyIdentity,
    signatures::{SignatureField, SignatureMember, SignatureMethod, TypeSignature},
    typesystem::{
        CorLibTypeKind, MemberDescriptor, ResolutionScope, TypeDef, TypeDefOrRef, TypeRef,
        TypeSignatureHash,
    },
};

/// Upper bound on nesting and signature depth, malformed graphs may be cyclic
const MAX_DEPTH: usize = 64;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Relaxations applied when comparing assembly identities
    pub struct ComparisonFlags: u32 {
        /// A candidate with a newer version than the reference matches
        const ACCEPT_NEWER_VERSIONS = 0x01;
        /// A candidate with an older version than the reference matches
        const ACCEPT_OLDER_VERSIONS = 0x02;
        /// Versions are ignored entirely
        const VERSION_AGNOSTIC = 0x04;
    }
}

/// Where a named type lives: its namespace, its name chain from the outermost enclosing
/// type inwards, and the assembly of the outermost type.
#[derive(Debug)]
struct TypeKey {
    namespace: String,
    names: Vec<String>,
    assembly: Option<AssemblyIdentity>,
}

/// Structural equality and hashing over types, members and signatures.
///
/// Compares by current names and scopes, never by object identity, so a reference from
/// one module can be matched against a definition in another. Stateless apart from its
/// [`ComparisonFlags`].
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{
///     metadata::{
///         identity::AssemblyIdentity,
///         typesystem::{ModuleDefinition, ResolutionScope, TypeDef, TypeDefOrRef, TypeRef},
///     },
///     resolver::SignatureComparer,
/// };
///
/// let mscorlib = AssemblyIdentity::parse("mscorlib, Version=4.0.0.0")?;
/// let module = ModuleDefinition::new("mscorlib.dll", mscorlib.clone());
/// let object = TypeDef::new(Some("System"), "Object");
/// module.add_type(object.clone());
///
/// let reference = TypeRef::new(ResolutionScope::Assembly(mscorlib), Some("System"), "Object");
///
/// let comparer = SignatureComparer::default();
/// assert!(comparer.types_equal(&reference.into(), &object.into()));
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureComparer {
    flags: ComparisonFlags,
}

impl SignatureComparer {
    /// Create a comparer with the given relaxations.
    #[must_use]
    pub fn new(flags: ComparisonFlags) -> Self {
        SignatureComparer { flags }
    }

    /// The relaxations this comparer applies.
    #[must_use]
    pub fn flags(&self) -> ComparisonFlags {
        self.flags
    }

    /// Compare a requested identity against a candidate.
    ///
    /// Names compare case-sensitively, cultures exactly, and public key tokens only when
    /// both sides carry one. An unknown version (0.0.0.0) on either side matches any
    /// version; otherwise versions must be equal unless a flag relaxes that.
    #[must_use]
    pub fn assemblies_equal(&self, reference: &AssemblyIdentity, candidate: &AssemblyIdentity) -> bool {
        if reference.name != candidate.name || reference.culture != candidate.culture {
            return false;
        }

        if let (Some(a), Some(b)) = (reference.public_key_token(), candidate.public_key_token()) {
            if a != b {
                return false;
            }
        }

        let (wanted, found) = (reference.version, candidate.version);
        if self.flags.contains(ComparisonFlags::VERSION_AGNOSTIC)
            || wanted.is_unknown()
            || found.is_unknown()
            || wanted == found
        {
            return true;
        }

        (found > wanted && self.flags.contains(ComparisonFlags::ACCEPT_NEWER_VERSIONS))
            || (found < wanted && self.flags.contains(ComparisonFlags::ACCEPT_OLDER_VERSIONS))
    }

    fn ref_key(reference: &TypeRef) -> Option<TypeKey> {
        let mut names = vec![reference.name()];
        let mut namespace = reference.namespace();
        let mut scope = reference.scope();

        for _ in 0..MAX_DEPTH {
            match scope {
                ResolutionScope::Nested(enclosing) => {
                    names.push(enclosing.name());
                    namespace = enclosing.namespace();
                    scope = enclosing.scope();
                }
                ResolutionScope::Assembly(identity) => {
                    names.reverse();
                    return Some(TypeKey {
                        namespace: namespace.unwrap_or_default(),
                        names,
                        assembly: Some(identity),
                    });
                }
                ResolutionScope::Module(module) => {
                    names.reverse();
                    return Some(TypeKey {
                        namespace: namespace.unwrap_or_default(),
                        names,
                        assembly: module.upgrade().map(|m| m.assembly().clone()),
                    });
                }
            }
        }
        None
    }

    fn def_key(definition: &TypeDef) -> Option<TypeKey> {
        let mut names = vec![definition.name()];
        let mut namespace = definition.namespace();
        let mut current = definition.declaring_type();

        while let Some(outer) = current {
            if names.len() > MAX_DEPTH {
                return None;
            }
            names.push(outer.name());
            namespace = outer.namespace();
            current = outer.declaring_type();
        }

        names.reverse();
        Some(TypeKey {
            namespace: namespace.unwrap_or_default(),
            names,
            assembly: definition.module().map(|m| m.assembly().clone()),
        })
    }

    /// Key of a named type; specifications yield their named type only when they are a
    /// plain class or value type.
    fn key(ty: &TypeDefOrRef) -> Option<TypeKey> {
        match ty {
            TypeDefOrRef::Definition(definition) => Self::def_key(definition),
            TypeDefOrRef::Reference(reference) => Self::ref_key(reference),
            TypeDefOrRef::Specification(signature) => match signature.as_ref() {
                TypeSignature::Class(named) | TypeSignature::ValueType(named) => match named {
                    TypeDefOrRef::Specification(_) => None,
                    named => Self::key(named),
                },
                _ => None,
            },
        }
    }

    fn keys_equal(&self, a: &TypeKey, b: &TypeKey) -> bool {
        a.namespace == b.namespace
            && a.names == b.names
            && match (&a.assembly, &b.assembly) {
                (Some(a), Some(b)) => self.assemblies_equal(a, b),
                (None, None) => true,
                _ => false,
            }
    }

    /// Compare two type descriptors structurally.
    #[must_use]
    pub fn types_equal(&self, a: &TypeDefOrRef, b: &TypeDefOrRef) -> bool {
        self.types_equal_at(a, b, 0)
    }

    fn types_equal_at(&self, a: &TypeDefOrRef, b: &TypeDefOrRef, depth: usize) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }

        if let (TypeDefOrRef::Specification(a), TypeDefOrRef::Specification(b)) = (a, b) {
            return self.type_signatures_equal_at(a, b, depth + 1);
        }

        match (Self::key(a), Self::key(b)) {
            (Some(a), Some(b)) => self.keys_equal(&a, &b),
            _ => false,
        }
    }

    /// Compare two type references structurally.
    #[must_use]
    pub fn type_refs_equal(&self, a: &TypeRef, b: &TypeRef) -> bool {
        match (Self::ref_key(a), Self::ref_key(b)) {
            (Some(a), Some(b)) => self.keys_equal(&a, &b),
            _ => false,
        }
    }

    /// Compare two type signatures structurally.
    ///
    /// A primitive element type equals a class or value type naming the same fundamental
    /// type in the `System` namespace.
    #[must_use]
    pub fn type_signatures_equal(&self, a: &TypeSignature, b: &TypeSignature) -> bool {
        self.type_signatures_equal_at(a, b, 0)
    }

    fn primitive_matches_named(kind: CorLibTypeKind, named: &TypeDefOrRef) -> bool {
        match Self::key(named) {
            Some(key) => {
                key.namespace == CorLibTypeKind::NAMESPACE
                    && key.names.len() == 1
                    && key.names[0] == kind.name()
            }
            None => false,
        }
    }

    fn type_signatures_equal_at(&self, a: &TypeSignature, b: &TypeSignature, depth: usize) -> bool {
        use TypeSignature as T;

        if depth > MAX_DEPTH {
            return false;
        }
        let next = depth + 1;

        match (a, b) {
            (T::Class(a), T::Class(b)) | (T::ValueType(a), T::ValueType(b)) => {
                self.types_equal_at(a, b, next)
            }
            (T::Ptr(a), T::Ptr(b))
            | (T::ByRef(a), T::ByRef(b))
            | (T::Pinned(a), T::Pinned(b))
            | (T::SzArray(a), T::SzArray(b)) => self.type_signatures_equal_at(a, b, next),
            (T::Array(a, rank_a), T::Array(b, rank_b)) => {
                rank_a == rank_b && self.type_signatures_equal_at(a, b, next)
            }
            (T::GenericInst(a, args_a), T::GenericInst(b, args_b)) => {
                args_a.len() == args_b.len()
                    && self.type_signatures_equal_at(a, b, next)
                    && args_a
                        .iter()
                        .zip(args_b)
                        .all(|(a, b)| self.type_signatures_equal_at(a, b, next))
            }
            (T::GenericParamType(a), T::GenericParamType(b))
            | (T::GenericParamMethod(a), T::GenericParamMethod(b)) => a == b,
            (T::FnPtr(a), T::FnPtr(b)) => self.method_signatures_equal_at(a, b, next),
            (
                T::Modified {
                    required: required_a,
                    modifier: modifier_a,
                    base: base_a,
                },
                T::Modified {
                    required: required_b,
                    modifier: modifier_b,
                    base: base_b,
                },
            ) => {
                required_a == required_b
                    && self.types_equal_at(modifier_a, modifier_b, next)
                    && self.type_signatures_equal_at(base_a, base_b, next)
            }
            (T::Sentinel, T::Sentinel) => true,
            (primitive, T::Class(named) | T::ValueType(named))
            | (T::Class(named) | T::ValueType(named), primitive) => primitive
                .corlib_kind()
                .is_some_and(|kind| Self::primitive_matches_named(kind, named)),
            (a, b) => match (a.corlib_kind(), b.corlib_kind()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Compare two method signatures: calling convention, generic arity, return type and
    /// parameter types in order.
    #[must_use]
    pub fn method_signatures_equal(&self, a: &SignatureMethod, b: &SignatureMethod) -> bool {
        self.method_signatures_equal_at(a, b, 0)
    }

    fn method_signatures_equal_at(&self, a: &SignatureMethod, b: &SignatureMethod, depth: usize) -> bool {
        a.calling_convention == b.calling_convention
            && a.generic_param_count == b.generic_param_count
            && a.params.len() == b.params.len()
            && self.type_signatures_equal_at(&a.return_type, &b.return_type, depth)
            && a
                .params
                .iter()
                .zip(&b.params)
                .all(|(a, b)| self.type_signatures_equal_at(a, b, depth))
    }

    /// Compare two field signatures.
    #[must_use]
    pub fn field_signatures_equal(&self, a: &SignatureField, b: &SignatureField) -> bool {
        self.type_signatures_equal(&a.base, &b.base)
    }

    /// Compare two member signatures; a method never equals a field.
    #[must_use]
    pub fn member_signatures_equal(&self, a: &SignatureMember, b: &SignatureMember) -> bool {
        match (a, b) {
            (SignatureMember::Method(a), SignatureMember::Method(b)) => {
                self.method_signatures_equal(a, b)
            }
            (SignatureMember::Field(a), SignatureMember::Field(b)) => {
                self.field_signatures_equal(a, b)
            }
            _ => false,
        }
    }

    /// Compare two members by name and signature, and by declaring type when both sides
    /// know theirs.
    #[must_use]
    pub fn members_equal(&self, a: &MemberDescriptor, b: &MemberDescriptor) -> bool {
        if a.name() != b.name() || !self.member_signatures_equal(&a.signature(), &b.signature()) {
            return false;
        }

        match (a.declaring_type(), b.declaring_type()) {
            (Some(a), Some(b)) => self.types_equal(&a, &b),
            _ => true,
        }
    }

    /// Hash of a type descriptor, consistent with [`SignatureComparer::types_equal`].
    ///
    /// Named types hash by namespace and name chain only, so the hash stays stable under
    /// the version relaxations of [`ComparisonFlags`].
    #[must_use]
    pub fn type_hash(&self, ty: &TypeDefOrRef) -> u64 {
        if let TypeDefOrRef::Specification(signature) = ty {
            return self.type_signature_hash(signature);
        }

        match Self::key(ty) {
            Some(key) => Self::named_hash(&key.namespace, &key.names),
            None => TypeSignatureHash::new().finalize(),
        }
    }

    // Named types and primitives share one tag so `string` and `class System.String`
    // hash alike.
    fn named_hash<S: AsRef<str>>(namespace: &str, names: &[S]) -> u64 {
        names
            .iter()
            .fold(
                TypeSignatureHash::new().add_tag(0x01).add_component(namespace),
                |hash, name| hash.add_component(name.as_ref()),
            )
            .finalize()
    }

    /// Hash of a type signature, consistent with
    /// [`SignatureComparer::type_signatures_equal`].
    #[must_use]
    pub fn type_signature_hash(&self, signature: &TypeSignature) -> u64 {
        self.type_signature_hash_at(signature, 0)
    }

    fn type_signature_hash_at(&self, signature: &TypeSignature, depth: usize) -> u64 {
        use TypeSignature as T;

        let hash = TypeSignatureHash::new();
        if depth > MAX_DEPTH {
            return hash.finalize();
        }
        let next = depth + 1;

        if let Some(kind) = signature.corlib_kind() {
            return Self::named_hash(CorLibTypeKind::NAMESPACE, &[kind.name()]);
        }

        let nested = |inner: &TypeSignature| self.type_signature_hash_at(inner, next);
        match signature {
            T::Class(named) | T::ValueType(named) => self.type_hash(named),
            T::Ptr(inner) => hash.add_tag(0x0f).add_hash(nested(inner)).finalize(),
            T::ByRef(inner) => hash.add_tag(0x10).add_hash(nested(inner)).finalize(),
            T::Pinned(inner) => hash.add_tag(0x45).add_hash(nested(inner)).finalize(),
            T::SzArray(inner) => hash.add_tag(0x1d).add_hash(nested(inner)).finalize(),
            T::Array(inner, rank) => hash
                .add_tag(0x14)
                .add_component(rank)
                .add_hash(nested(inner))
                .finalize(),
            T::GenericInst(generic, args) => args
                .iter()
                .fold(hash.add_tag(0x15).add_hash(nested(generic)), |hash, arg| {
                    hash.add_hash(nested(arg))
                })
                .finalize(),
            T::GenericParamType(index) => hash.add_tag(0x13).add_component(index).finalize(),
            T::GenericParamMethod(index) => hash.add_tag(0x1e).add_component(index).finalize(),
            T::FnPtr(method) => method
                .params
                .iter()
                .fold(
                    hash.add_tag(0x1b)
                        .add_component(&method.calling_convention.bits())
                        .add_hash(nested(&method.return_type)),
                    |hash, param| hash.add_hash(nested(param)),
                )
                .finalize(),
            T::Modified { required, base, .. } => hash
                .add_tag(if *required { 0x1f } else { 0x20 })
                .add_hash(nested(base))
                .finalize(),
            T::Sentinel => hash.add_tag(0x41).finalize(),
            _ => hash.finalize(),
        }
    }
}
