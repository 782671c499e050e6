use bitflags::bitflags;

use crate::metadata::typesystem::{CorLibTypeKind, TypeDefOrRef};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Calling convention byte of a method signature, see §II.23.2.1 and §II.15.3
    ///
    /// The low nibble is an enumeration of the convention kind (`DEFAULT`, `C`, `STDCALL`,
    /// `THISCALL`, `FASTCALL`, `VARARG`); the high bits are flags.
    pub struct CallingConvention: u8 {
        /// Managed default convention
        const DEFAULT = 0x00;
        /// Native 'cdecl' calling convention
        const C = 0x01;
        /// Native 'stdcall' calling convention
        const STDCALL = 0x02;
        /// Native 'thiscall' calling convention
        const THISCALL = 0x03;
        /// Native 'fastcall' calling convention
        const FASTCALL = 0x04;
        /// Managed variable-argument convention
        const VARARG = 0x05;
        /// The method has generic parameters
        const GENERIC = 0x10;
        /// Instance method, an implicit `this` is passed
        const HAS_THIS = 0x20;
        /// The `this` parameter is explicitly listed in the parameters
        const EXPLICIT_THIS = 0x40;
    }
}

impl CallingConvention {
    /// Mask of the convention kind in the low nibble
    pub const KIND_MASK: u8 = 0x0F;

    /// Returns the convention kind (low nibble) only.
    #[must_use]
    pub fn kind(self) -> u8 {
        self.bits() & Self::KIND_MASK
    }

    /// Returns `true` for instance method signatures.
    #[must_use]
    pub fn has_this(self) -> bool {
        self.contains(Self::HAS_THIS)
    }
}

/// Structural type of a signature element, see §II.23.2.12
///
/// Named types are carried as [`TypeDefOrRef`], so a signature read from one module can
/// be compared with a signature from another module through
/// [`crate::resolver::SignatureComparer`], which never relies on object identity.
#[derive(Debug, Clone)]
pub enum TypeSignature {
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// i8
    I1,
    /// u8
    U1,
    /// i16
    I2,
    /// u16
    U2,
    /// i32
    I4,
    /// u32
    U4,
    /// i64
    I8,
    /// u64
    U8,
    /// f32
    R4,
    /// f64
    R8,
    /// isize
    I,
    /// usize
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// System.TypedReference
    TypedByRef,
    /// A reference type, named through a `TypeDefOrRef`
    Class(TypeDefOrRef),
    /// A value type, named through a `TypeDefOrRef`
    ValueType(TypeDefOrRef),
    /// Unmanaged pointer
    Ptr(Box<TypeSignature>),
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// Pinned local
    Pinned(Box<TypeSignature>),
    /// Single-dimensional, zero-based array
    SzArray(Box<TypeSignature>),
    /// General array with rank
    Array(Box<TypeSignature>, u32),
    /// Instantiation of a generic type with its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Generic parameter of the enclosing type, by index
    GenericParamType(u32),
    /// Generic parameter of the enclosing method, by index
    GenericParamMethod(u32),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// Type with a custom modifier (`modreq` when `required`, `modopt` otherwise)
    Modified {
        /// `modreq` (true) or `modopt` (false)
        required: bool,
        /// The modifier type
        modifier: TypeDefOrRef,
        /// The modified type
        base: Box<TypeSignature>,
    },
    /// A sentinel, separating fixed and variable parameters of a vararg call site
    Sentinel,
}

impl TypeSignature {
    /// Maps a primitive element type onto its base library type, if it is one.
    #[must_use]
    pub fn corlib_kind(&self) -> Option<CorLibTypeKind> {
        Some(match self {
            TypeSignature::Void => CorLibTypeKind::Void,
            TypeSignature::Boolean => CorLibTypeKind::Boolean,
            TypeSignature::Char => CorLibTypeKind::Char,
            TypeSignature::I1 => CorLibTypeKind::SByte,
            TypeSignature::U1 => CorLibTypeKind::Byte,
            TypeSignature::I2 => CorLibTypeKind::Int16,
            TypeSignature::U2 => CorLibTypeKind::UInt16,
            TypeSignature::I4 => CorLibTypeKind::Int32,
            TypeSignature::U4 => CorLibTypeKind::UInt32,
            TypeSignature::I8 => CorLibTypeKind::Int64,
            TypeSignature::U8 => CorLibTypeKind::UInt64,
            TypeSignature::R4 => CorLibTypeKind::Single,
            TypeSignature::R8 => CorLibTypeKind::Double,
            TypeSignature::I => CorLibTypeKind::IntPtr,
            TypeSignature::U => CorLibTypeKind::UIntPtr,
            TypeSignature::String => CorLibTypeKind::String,
            TypeSignature::Object => CorLibTypeKind::Object,
            TypeSignature::TypedByRef => CorLibTypeKind::TypedReference,
            _ => return None,
        })
    }

    /// Returns the named type this signature is built on, if any.
    ///
    /// Generic instances yield their generic type, modifiers yield their base.
    #[must_use]
    pub fn named_type(&self) -> Option<&TypeDefOrRef> {
        match self {
            TypeSignature::Class(ty) | TypeSignature::ValueType(ty) => Some(ty),
            TypeSignature::GenericInst(generic, _) => generic.named_type(),
            TypeSignature::Modified { base, .. } => base.named_type(),
            _ => None,
        }
    }
}

/// Method signature (II.23.2.1)
#[derive(Debug, Clone)]
pub struct SignatureMethod {
    /// Calling convention and flags
    pub calling_convention: CallingConvention,
    /// Number of generic parameters (0 for non-generic methods)
    pub generic_param_count: u32,
    /// The return type of this method
    pub return_type: TypeSignature,
    /// The parameter types, in declaration order
    pub params: Vec<TypeSignature>,
}

impl SignatureMethod {
    /// Create a signature for a static method with the default calling convention.
    ///
    /// # Arguments
    /// * `return_type` - Return type of the method
    /// * `params` - Parameter types, in order
    #[must_use]
    pub fn new_static(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            calling_convention: CallingConvention::DEFAULT,
            generic_param_count: 0,
            return_type,
            params,
        }
    }

    /// Create a signature for an instance method (`HAS_THIS`).
    ///
    /// # Arguments
    /// * `return_type` - Return type of the method
    /// * `params` - Parameter types, in order
    #[must_use]
    pub fn new_instance(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            calling_convention: CallingConvention::HAS_THIS,
            generic_param_count: 0,
            return_type,
            params,
        }
    }

    /// Turns this signature into a generic method signature with `count` parameters.
    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        if count > 0 {
            self.calling_convention |= CallingConvention::GENERIC;
        } else {
            self.calling_convention.remove(CallingConvention::GENERIC);
        }
        self
    }
}

/// Field signature (II.23.2.4)
#[derive(Debug, Clone)]
pub struct SignatureField {
    /// The type of the field
    pub base: TypeSignature,
}

impl SignatureField {
    /// Create a field signature of the given type.
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureField { base }
    }
}

/// Signature of a member reference: either a method or a field (II.22.25)
#[derive(Debug, Clone)]
pub enum SignatureMember {
    /// The reference points to a method
    Method(SignatureMethod),
    /// The reference points to a field
    Field(SignatureField),
}

impl From<SignatureMethod> for SignatureMember {
    fn from(signature: SignatureMethod) -> Self {
        SignatureMember::Method(signature)
    }
}

impl From<SignatureField> for SignatureMember {
    fn from(signature: SignatureField) -> Self {
        SignatureMember::Field(signature)
    }
}
