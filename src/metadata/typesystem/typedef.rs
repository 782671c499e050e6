use std::{
    fmt,
    sync::{Arc, OnceLock, RwLock, Weak},
};

use crate::metadata::typesystem::{
    FieldDefRc, MethodDefRc, ModuleDefinition, ModuleRc, TypeDefOrRef,
};

/// Reference to a `TypeDef`
pub type TypeDefRc = Arc<TypeDef>;

/// Upper bound on declaring-type hops, malformed graphs may nest a type inside itself
const MAX_NESTING: usize = 128;

/// `TypeAttributes` interface semantics bit (§II.23.1.15)
const INTERFACE: u32 = 0x0000_0020;

/// A type defined in a module (§II.22.37).
///
/// Owns its members, interfaces and nested types in declaration order. Back-links to the
/// declaring type and the module are weak and set once, when the type is attached through
/// [`TypeDef::add_nested_type`] or [`ModuleDefinition::add_type`].
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::metadata::typesystem::TypeDef;
///
/// let outer = TypeDef::new(Some("Demo"), "Outer");
/// let inner = TypeDef::new(None, "Inner");
/// outer.add_nested_type(inner.clone());
///
/// assert_eq!(inner.fullname(), "Demo.Outer/Inner");
/// assert!(inner.declaring_type().is_some());
/// ```
pub struct TypeDef {
    namespace: RwLock<Option<String>>,
    name: RwLock<String>,
    /// Type attributes (§II.23.1.15)
    pub flags: u32,
    base: RwLock<Option<TypeDefOrRef>>,
    /// Implemented interfaces, in declaration order
    pub interfaces: boxcar::Vec<TypeDefOrRef>,
    /// Nested types, in declaration order
    pub nested_types: boxcar::Vec<TypeDefRc>,
    /// Methods, in declaration order
    pub methods: boxcar::Vec<MethodDefRc>,
    /// Fields, in declaration order
    pub fields: boxcar::Vec<FieldDefRc>,
    declaring_type: OnceLock<Weak<TypeDef>>,
    module: OnceLock<Weak<ModuleDefinition>>,
    this: Weak<TypeDef>,
}

impl TypeDef {
    /// Create a class with no members.
    pub fn new(namespace: Option<&str>, name: &str) -> TypeDefRc {
        Self::with_flags(namespace, name, 0)
    }

    /// Create a type with explicit attributes.
    pub fn with_flags(namespace: Option<&str>, name: &str, flags: u32) -> TypeDefRc {
        Arc::new_cyclic(|this| TypeDef {
            namespace: RwLock::new(namespace.map(str::to_string)),
            name: RwLock::new(name.to_string()),
            flags,
            base: RwLock::new(None),
            interfaces: boxcar::Vec::new(),
            nested_types: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            declaring_type: OnceLock::new(),
            module: OnceLock::new(),
            this: this.clone(),
        })
    }

    /// Create an interface type.
    pub fn interface(namespace: Option<&str>, name: &str) -> TypeDefRc {
        Self::with_flags(namespace, name, INTERFACE)
    }

    /// Current name.
    pub fn name(&self) -> String {
        read_lock!(self.name).clone()
    }

    /// Current namespace.
    pub fn namespace(&self) -> Option<String> {
        read_lock!(self.namespace).clone()
    }

    /// Rename the type in place.
    pub fn set_name(&self, name: &str) {
        *write_lock!(self.name) = name.to_string();
    }

    /// Move the type to another namespace in place.
    pub fn set_namespace(&self, namespace: Option<&str>) {
        *write_lock!(self.namespace) = namespace.map(str::to_string);
    }

    /// Returns `true` if the current namespace and name equal the given ones.
    ///
    /// A missing namespace and an empty namespace are the same.
    pub fn is_type_of(&self, namespace: &str, name: &str) -> bool {
        *read_lock!(self.name) == name
            && read_lock!(self.namespace).as_deref().unwrap_or_default() == namespace
    }

    /// Returns `true` if the current name equals `name`, ignoring the namespace.
    pub fn is_named(&self, name: &str) -> bool {
        *read_lock!(self.name) == name
    }

    /// Returns `true` if the interface semantics bit is set.
    pub fn is_interface(&self) -> bool {
        self.flags & INTERFACE != 0
    }

    /// The base type, if any.
    pub fn base(&self) -> Option<TypeDefOrRef> {
        read_lock!(self.base).clone()
    }

    /// Replace the base type.
    pub fn set_base(&self, base: Option<TypeDefOrRef>) {
        *write_lock!(self.base) = base;
    }

    /// Append an implemented interface.
    pub fn add_interface(&self, interface: TypeDefOrRef) {
        self.interfaces.push(interface);
    }

    /// Append a nested type and make `self` its declaring type.
    ///
    /// A type keeps the first declaring type it is attached to.
    pub fn add_nested_type(&self, nested: TypeDefRc) {
        let _ = nested.declaring_type.set(self.this.clone());
        self.nested_types.push(nested);
    }

    /// Append a method and make `self` its declaring type.
    pub fn add_method(&self, method: MethodDefRc) {
        let _ = method.declaring_type.set(self.this.clone());
        self.methods.push(method);
    }

    /// Append a field and make `self` its declaring type.
    pub fn add_field(&self, field: FieldDefRc) {
        let _ = field.declaring_type.set(self.this.clone());
        self.fields.push(field);
    }

    /// The enclosing type of a nested type.
    pub fn declaring_type(&self) -> Option<TypeDefRc> {
        self.declaring_type.get().and_then(Weak::upgrade)
    }

    pub(crate) fn attach_module(&self, module: Weak<ModuleDefinition>) {
        let _ = self.module.set(module);
    }

    /// The module defining this type. Nested types report their outermost type's module.
    pub fn module(&self) -> Option<ModuleRc> {
        if let Some(module) = self.module.get() {
            return module.upgrade();
        }

        let mut current = self.declaring_type()?;
        for _ in 0..MAX_NESTING {
            if let Some(module) = current.module.get() {
                return module.upgrade();
            }
            current = current.declaring_type()?;
        }
        None
    }

    /// Returns the full name. Nested types use `Outer/Inner` notation.
    pub fn fullname(&self) -> String {
        let mut names = vec![self.name()];
        let mut namespace = self.namespace();

        let mut current = self.declaring_type();
        while let Some(outer) = current {
            if names.len() > MAX_NESTING {
                break;
            }
            names.push(outer.name());
            namespace = outer.namespace();
            current = outer.declaring_type();
        }

        names.reverse();
        super::fullname(namespace.as_deref(), &names.join("/"))
    }

    /// Find a method by current name, first declared wins.
    pub fn method(&self, name: &str) -> Option<MethodDefRc> {
        self.methods
            .iter()
            .find(|(_, m)| m.is_named(name))
            .map(|(_, m)| m.clone())
    }

    /// Find a field by current name, first declared wins.
    pub fn field(&self, name: &str) -> Option<FieldDefRc> {
        self.fields
            .iter()
            .find(|(_, f)| f.is_named(name))
            .map(|(_, f)| f.clone())
    }

    /// Find a nested type by current name, first declared wins.
    pub fn nested(&self, name: &str) -> Option<TypeDefRc> {
        self.nested_types
            .iter()
            .find(|(_, t)| t.is_named(name))
            .map(|(_, t)| t.clone())
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("fullname", &self.fullname())
            .field("flags", &self.flags)
            .field("methods", &self.methods.count())
            .field("fields", &self.fields.count())
            .field("nested_types", &self.nested_types.count())
            .finish()
    }
}
