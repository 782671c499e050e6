use std::{
    fmt,
    sync::{Arc, OnceLock, RwLock, Weak},
};

use crate::metadata::{
    signatures::{SignatureField, SignatureMember, SignatureMethod},
    typesystem::{TypeDef, TypeDefOrRef, TypeDefRc},
};

/// Reference to a `MethodDef`
pub type MethodDefRc = Arc<MethodDef>;
/// Reference to a `FieldDef`
pub type FieldDefRc = Arc<FieldDef>;
/// Reference to a `MemberRef`
pub type MemberRefRc = Arc<MemberRef>;

/// A method defined by a type (§II.22.26).
pub struct MethodDef {
    name: RwLock<String>,
    /// Method attributes (§II.23.1.10)
    pub flags: u16,
    /// The structural signature
    pub signature: SignatureMethod,
    pub(crate) declaring_type: OnceLock<Weak<TypeDef>>,
}

impl MethodDef {
    /// Create a method that is not yet attached to a type, see [`TypeDef::add_method`].
    pub fn new(name: &str, signature: SignatureMethod) -> MethodDefRc {
        Self::with_flags(name, 0, signature)
    }

    /// Create a method with explicit attributes.
    pub fn with_flags(name: &str, flags: u16, signature: SignatureMethod) -> MethodDefRc {
        Arc::new(MethodDef {
            name: RwLock::new(name.to_string()),
            flags,
            signature,
            declaring_type: OnceLock::new(),
        })
    }

    /// Current name.
    pub fn name(&self) -> String {
        read_lock!(self.name).clone()
    }

    /// Rename the method in place.
    pub fn set_name(&self, name: &str) {
        *write_lock!(self.name) = name.to_string();
    }

    /// Returns `true` if the current name equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        *read_lock!(self.name) == name
    }

    /// The type declaring this method, while it is alive.
    pub fn declaring_type(&self) -> Option<TypeDefRc> {
        self.declaring_type.get().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name())
            .field("declaring_type", &self.declaring_type().map(|t| t.fullname()))
            .field("signature", &self.signature)
            .finish()
    }
}

/// A field defined by a type (§II.22.15).
pub struct FieldDef {
    name: RwLock<String>,
    /// Field attributes (§II.23.1.5)
    pub flags: u16,
    /// The structural signature
    pub signature: SignatureField,
    pub(crate) declaring_type: OnceLock<Weak<TypeDef>>,
}

impl FieldDef {
    /// Create a field that is not yet attached to a type, see [`TypeDef::add_field`].
    pub fn new(name: &str, signature: SignatureField) -> FieldDefRc {
        Self::with_flags(name, 0, signature)
    }

    /// Create a field with explicit attributes.
    pub fn with_flags(name: &str, flags: u16, signature: SignatureField) -> FieldDefRc {
        Arc::new(FieldDef {
            name: RwLock::new(name.to_string()),
            flags,
            signature,
            declaring_type: OnceLock::new(),
        })
    }

    /// Current name.
    pub fn name(&self) -> String {
        read_lock!(self.name).clone()
    }

    /// Rename the field in place.
    pub fn set_name(&self, name: &str) {
        *write_lock!(self.name) = name.to_string();
    }

    /// Returns `true` if the current name equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        *read_lock!(self.name) == name
    }

    /// The type declaring this field, while it is alive.
    pub fn declaring_type(&self) -> Option<TypeDefRc> {
        self.declaring_type.get().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name())
            .field("declaring_type", &self.declaring_type().map(|t| t.fullname()))
            .field("signature", &self.signature)
            .finish()
    }
}

/// A reference to a method or field of some type, possibly in another module (§II.22.25).
///
/// The parent and name are mutable; the signature is fixed.
pub struct MemberRef {
    name: RwLock<String>,
    parent: RwLock<TypeDefOrRef>,
    /// The member's structural signature; its variant tells method from field
    pub signature: SignatureMember,
}

impl MemberRef {
    /// Create a new member reference.
    ///
    /// # Arguments
    /// * `parent` - The declaring type of the referenced member
    /// * `name` - The member name
    /// * `signature` - The member signature
    pub fn new(parent: TypeDefOrRef, name: &str, signature: impl Into<SignatureMember>) -> MemberRefRc {
        Arc::new(MemberRef {
            name: RwLock::new(name.to_string()),
            parent: RwLock::new(parent),
            signature: signature.into(),
        })
    }

    /// Current name.
    pub fn name(&self) -> String {
        read_lock!(self.name).clone()
    }

    /// Rename the reference.
    pub fn set_name(&self, name: &str) {
        *write_lock!(self.name) = name.to_string();
    }

    /// Current declaring type.
    pub fn parent(&self) -> TypeDefOrRef {
        read_lock!(self.parent).clone()
    }

    /// Replace the declaring type.
    pub fn set_parent(&self, parent: TypeDefOrRef) {
        *write_lock!(self.parent) = parent;
    }

    /// Returns `true` if this references a method.
    pub fn is_method(&self) -> bool {
        matches!(self.signature, SignatureMember::Method(_))
    }

    /// Returns `true` if this references a field.
    pub fn is_field(&self) -> bool {
        matches!(self.signature, SignatureMember::Field(_))
    }
}

impl fmt::Debug for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberRef")
            .field("name", &self.name())
            .field("parent", &self.parent().fullname())
            .field("signature", &self.signature)
            .finish()
    }
}
