use strum::{AsRefStr, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// The fundamental types every base library defines in the `System` namespace.
///
/// The variant names are the type names, so `CorLibTypeKind::Int32.name()` is `"Int32"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum CorLibTypeKind {
    /// System.Void
    Void,
    /// System.Boolean
    Boolean,
    /// System.Char
    Char,
    /// System.SByte
    SByte,
    /// System.Byte
    Byte,
    /// System.Int16
    Int16,
    /// System.UInt16
    UInt16,
    /// System.Int32
    Int32,
    /// System.UInt32
    UInt32,
    /// System.Int64
    Int64,
    /// System.UInt64
    UInt64,
    /// System.Single
    Single,
    /// System.Double
    Double,
    /// System.IntPtr
    IntPtr,
    /// System.UIntPtr
    UIntPtr,
    /// System.Object
    Object,
    /// System.String
    String,
    /// System.TypedReference
    TypedReference,
    /// System.ValueType
    ValueType,
}

impl CorLibTypeKind {
    /// Namespace of all fundamental types
    pub const NAMESPACE: &'static str = "System";

    /// The type name in the `System` namespace.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns true for types that derive from System.ValueType.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        !matches!(
            self,
            CorLibTypeKind::Object | CorLibTypeKind::String | CorLibTypeKind::ValueType
        )
    }

    /// Look up a fundamental type by namespace and name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotscope_resolver::metadata::typesystem::CorLibTypeKind;
    ///
    /// assert_eq!(CorLibTypeKind::from_name("System", "Int32"), Some(CorLibTypeKind::Int32));
    /// assert_eq!(CorLibTypeKind::from_name("System", "Console"), None);
    /// assert_eq!(CorLibTypeKind::from_name("Other", "Int32"), None);
    /// ```
    #[must_use]
    pub fn from_name(namespace: &str, name: &str) -> Option<Self> {
        if namespace != Self::NAMESPACE {
            return None;
        }
        name.parse().ok()
    }

    /// Iterate all fundamental types in declaration order.
    pub fn all() -> impl Iterator<Item = CorLibTypeKind> {
        Self::iter()
    }
}
