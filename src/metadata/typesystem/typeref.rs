use std::{
    fmt,
    sync::{Arc, RwLock, Weak},
};

use crate::metadata::{identity::AssemblyIdentity, typesystem::ModuleDefinition};

/// Reference to a `TypeRef`
pub type TypeRefRc = Arc<TypeRef>;

/// The anchor a [`TypeRef`]'s namespace and name lookup is relative to (§II.22.38).
#[derive(Clone)]
pub enum ResolutionScope {
    /// The type lives in another assembly
    Assembly(AssemblyIdentity),
    /// The type lives in the module that holds the reference
    Module(Weak<ModuleDefinition>),
    /// The type is nested inside the referenced enclosing type
    Nested(TypeRefRc),
}

impl ResolutionScope {
    /// Create a module scope pointing at `module`.
    #[must_use]
    pub fn module(module: &Arc<ModuleDefinition>) -> Self {
        ResolutionScope::Module(Arc::downgrade(module))
    }

    /// Returns the assembly identity this scope names directly, if it is an assembly scope.
    #[must_use]
    pub fn assembly(&self) -> Option<&AssemblyIdentity> {
        match self {
            ResolutionScope::Assembly(identity) => Some(identity),
            _ => None,
        }
    }
}

impl fmt::Debug for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionScope::Assembly(identity) => write!(f, "Assembly({})", identity),
            ResolutionScope::Module(module) => match module.upgrade() {
                Some(module) => write!(f, "Module({})", module.name()),
                None => write!(f, "Module(<dropped>)"),
            },
            // Only one level: a malformed chain may point back at itself
            ResolutionScope::Nested(enclosing) => write!(f, "Nested({})", enclosing.fullname()),
        }
    }
}

/// A symbolic type reference (§II.22.38): a namespace and name anchored at a scope.
///
/// Name, namespace and scope are mutable in place. A `TypeRef` never caches what it
/// resolved to; resolving it always reflects its current state.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::metadata::{
///     identity::AssemblyIdentity,
///     typesystem::{ResolutionScope, TypeRef},
/// };
///
/// let mscorlib = AssemblyIdentity::parse("mscorlib, Version=4.0.0.0")?;
/// let object = TypeRef::new(ResolutionScope::Assembly(mscorlib), Some("System"), "Object");
/// assert_eq!(object.fullname(), "System.Object");
///
/// object.set_name("String");
/// assert!(object.is_type_of("System", "String"));
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub struct TypeRef {
    namespace: RwLock<Option<String>>,
    name: RwLock<String>,
    scope: RwLock<ResolutionScope>,
}

impl TypeRef {
    /// Create a new type reference.
    ///
    /// # Arguments
    /// * `scope` - Where the lookup is anchored
    /// * `namespace` - The namespace, `None` for nested or global types
    /// * `name` - The simple type name
    pub fn new(scope: ResolutionScope, namespace: Option<&str>, name: &str) -> TypeRefRc {
        Arc::new(TypeRef {
            namespace: RwLock::new(namespace.map(str::to_string)),
            name: RwLock::new(name.to_string()),
            scope: RwLock::new(scope),
        })
    }

    /// Create a reference to a type nested inside `enclosing`.
    pub fn nested(enclosing: &TypeRefRc, name: &str) -> TypeRefRc {
        Self::new(ResolutionScope::Nested(enclosing.clone()), None, name)
    }

    /// Current name.
    pub fn name(&self) -> String {
        read_lock!(self.name).clone()
    }

    /// Current namespace.
    pub fn namespace(&self) -> Option<String> {
        read_lock!(self.namespace).clone()
    }

    /// Current scope.
    pub fn scope(&self) -> ResolutionScope {
        read_lock!(self.scope).clone()
    }

    /// Replace the name.
    pub fn set_name(&self, name: &str) {
        *write_lock!(self.name) = name.to_string();
    }

    /// Replace the namespace.
    pub fn set_namespace(&self, namespace: Option<&str>) {
        *write_lock!(self.namespace) = namespace.map(str::to_string);
    }

    /// Replace the scope.
    pub fn set_scope(&self, scope: ResolutionScope) {
        *write_lock!(self.scope) = scope;
    }

    /// Returns `true` if the current namespace and name equal the given ones.
    ///
    /// A missing namespace and an empty namespace are the same.
    pub fn is_type_of(&self, namespace: &str, name: &str) -> bool {
        *read_lock!(self.name) == name
            && read_lock!(self.namespace).as_deref().unwrap_or_default() == namespace
    }

    /// Returns the full name (Namespace.Name), or just the name without a namespace.
    pub fn fullname(&self) -> String {
        super::fullname(self.namespace().as_deref(), &self.name())
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("fullname", &self.fullname())
            .field("scope", &self.scope())
            .finish()
    }
}
