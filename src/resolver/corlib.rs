use log::debug;

use crate::metadata::{
    identity::AssemblyIdentity,
    runtime::TargetRuntime,
    typesystem::{CorLibTypeKind, ModuleDefinition, ModuleRc, TypeDef, TypeDefOrRef, TypeDefRc},
};

/// Assembly names that may host the fundamental types, depending on the runtime.
const CORLIB_NAMES: [&str; 4] = [
    "mscorlib",
    "System.Runtime",
    "System.Private.CoreLib",
    "netstandard",
];

/// The base class library of the target runtime.
///
/// Resolution of fundamental types (`System.Object`, `System.String`, `System.Int32`, ...)
/// goes through here, no matter which of the corlib facades a reference names. Without an
/// explicit module, a skeleton is synthesized: one definition per [`CorLibTypeKind`], with
/// the expected base types and without members. Member resolution against the base
/// library needs the real module, see [`CorLibrary::from_module`].
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{
///     metadata::{identity::AssemblyIdentity, runtime::TargetRuntime},
///     resolver::CorLibrary,
/// };
///
/// let corlib = CorLibrary::new(TargetRuntime::default());
/// let facade = AssemblyIdentity::parse("System.Runtime, Version=8.0.0.0")?;
///
/// let string = corlib.lookup(&facade, "System", "String").unwrap();
/// assert_eq!(string.fullname(), "System.String");
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CorLibrary {
    module: ModuleRc,
}

impl CorLibrary {
    /// Synthesize a skeleton for the base library of `runtime`.
    #[must_use]
    pub fn new(runtime: TargetRuntime) -> Self {
        Self::with_identity(runtime.corlib_identity())
    }

    /// Synthesize a skeleton carrying `identity`.
    #[must_use]
    pub fn with_identity(identity: AssemblyIdentity) -> Self {
        let module = ModuleDefinition::new(&format!("{}.dll", identity.name), identity);

        let object = TypeDef::new(Some(CorLibTypeKind::NAMESPACE), CorLibTypeKind::Object.name());
        let value_type =
            TypeDef::new(Some(CorLibTypeKind::NAMESPACE), CorLibTypeKind::ValueType.name());
        value_type.set_base(Some(object.clone().into()));
        module.add_type(object.clone());
        module.add_type(value_type.clone());

        for kind in CorLibTypeKind::all() {
            let base: TypeDefRc = match kind {
                CorLibTypeKind::Object | CorLibTypeKind::ValueType => continue,
                CorLibTypeKind::String => object.clone(),
                _ => value_type.clone(),
            };

            let ty = TypeDef::new(Some(CorLibTypeKind::NAMESPACE), kind.name());
            ty.set_base(Some(TypeDefOrRef::from(base)));
            module.add_type(ty);
        }

        debug!(
            "Synthesized base library '{}' with {} types",
            module.assembly(),
            module.types.count()
        );
        CorLibrary { module }
    }

    /// Use a decoded base library module.
    #[must_use]
    pub fn from_module(module: ModuleRc) -> Self {
        CorLibrary { module }
    }

    /// The base library module.
    #[must_use]
    pub fn module(&self) -> &ModuleRc {
        &self.module
    }

    /// The identity of the base library module.
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        self.module.assembly()
    }

    /// Returns `true` if `name` is one of the assembly names hosting fundamental types.
    #[must_use]
    pub fn is_corlib_name(name: &str) -> bool {
        CORLIB_NAMES.contains(&name)
    }

    /// Look up a fundamental type referenced through `assembly`.
    ///
    /// Applies only when `assembly` is a base library name and `namespace.name` is one of
    /// the [`CorLibTypeKind`]s; other types in the base library go through regular
    /// loading, since facades forward them elsewhere.
    #[must_use]
    pub fn lookup(&self, assembly: &AssemblyIdentity, namespace: &str, name: &str) -> Option<TypeDefRc> {
        if !Self::is_corlib_name(&assembly.name) {
            return None;
        }

        let kind = CorLibTypeKind::from_name(namespace, name)?;
        self.module.find_type(CorLibTypeKind::NAMESPACE, kind.name())
    }

    /// The definition of a fundamental type.
    #[must_use]
    pub fn get(&self, kind: CorLibTypeKind) -> Option<TypeDefRc> {
        self.module.find_type(CorLibTypeKind::NAMESPACE, kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{corlib_module, identity};

    #[test]
    fn skeleton_hierarchy() {
        let corlib = CorLibrary::new(TargetRuntime::default());
        assert_eq!(corlib.identity().name, "System.Private.CoreLib");
        assert_eq!(corlib.module().types.count(), CorLibTypeKind::all().count());

        let object = corlib.get(CorLibTypeKind::Object).unwrap();
        assert!(object.base().is_none());

        let string = corlib.get(CorLibTypeKind::String).unwrap();
        assert_eq!(string.base().unwrap().fullname(), "System.Object");

        let int = corlib.get(CorLibTypeKind::Int32).unwrap();
        assert_eq!(int.base().unwrap().fullname(), "System.ValueType");
        assert!(int.module().is_some());
        assert_eq!(int.methods.count(), 0);
    }

    #[test]
    fn lookup_through_facades() {
        let corlib = CorLibrary::new(TargetRuntime::default());

        for name in ["mscorlib", "System.Runtime", "netstandard", "System.Private.CoreLib"] {
            let found = corlib.lookup(&identity(name, 4), "System", "Int32").unwrap();
            assert!(std::sync::Arc::ptr_eq(&found, &corlib.get(CorLibTypeKind::Int32).unwrap()));
        }

        assert!(corlib.lookup(&identity("System.Console", 4), "System", "Int32").is_none());
        assert!(corlib.lookup(&identity("mscorlib", 4), "System", "Console").is_none());
        assert!(corlib.lookup(&identity("MSCORLIB", 4), "System", "Int32").is_none());
    }

    #[test]
    fn supplied_module_is_used() {
        let corlib = CorLibrary::from_module(corlib_module(identity("mscorlib", 4)));
        let string = corlib.lookup(&identity("mscorlib", 4), "System", "String").unwrap();
        assert!(string.field("Empty").is_some());
    }

    #[test]
    fn renamed_types_leave_lookup() {
        let corlib = CorLibrary::new(TargetRuntime::default());
        corlib.get(CorLibTypeKind::Int64).unwrap().set_name("Long");
        assert!(corlib.lookup(&identity("mscorlib", 4), "System", "Int64").is_none());
    }
}
