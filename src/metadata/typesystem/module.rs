use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock, Weak},
};

use crate::metadata::{
    identity::AssemblyIdentity,
    typesystem::{ResolutionScope, TypeDefRc},
};

/// Reference to a `ModuleDefinition`
pub type ModuleRc = Arc<ModuleDefinition>;
/// Reference to an `ExportedType`
pub type ExportedTypeRc = Arc<ExportedType>;

/// Where an exported type is really implemented (§II.22.14)
#[derive(Debug, Clone)]
pub enum ExportedTypeImplementation {
    /// Forwarded to another assembly
    Assembly(AssemblyIdentity),
    /// Another file of the same multi-file assembly
    File(String),
    /// Nested inside another exported type
    Nested(ExportedTypeRc),
}

/// A type exported by an assembly but implemented elsewhere, typically a type forwarder.
#[derive(Debug)]
pub struct ExportedType {
    /// The type namespace
    pub namespace: Option<String>,
    /// The type name
    pub name: String,
    /// Type attributes (§II.23.1.15)
    pub flags: u32,
    /// Where the type is implemented
    pub implementation: ExportedTypeImplementation,
}

impl ExportedType {
    /// Create a forwarder to `target`.
    pub fn forwarder(namespace: Option<&str>, name: &str, target: AssemblyIdentity) -> ExportedTypeRc {
        Self::new(namespace, name, ExportedTypeImplementation::Assembly(target))
    }

    /// Create an exported type entry.
    pub fn new(
        namespace: Option<&str>,
        name: &str,
        implementation: ExportedTypeImplementation,
    ) -> ExportedTypeRc {
        Arc::new(ExportedType {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            flags: 0,
            implementation,
        })
    }

    /// Returns `true` if namespace and name equal the given ones.
    pub fn is_type_of(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref().unwrap_or_default() == namespace
    }
}

/// A decoded module: the in-memory graph of one assembly's manifest module.
///
/// Built by a [`crate::resolver::ModuleReader`] or by hand. Types added through
/// [`ModuleDefinition::add_type`] point back at the module weakly.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::metadata::{
///     identity::{AssemblyIdentity, AssemblyVersion},
///     typesystem::{ModuleDefinition, TypeDef},
/// };
///
/// let module = ModuleDefinition::new(
///     "Demo.dll",
///     AssemblyIdentity::simple("Demo", AssemblyVersion::new(1, 0, 0, 0)),
/// );
/// let program = TypeDef::new(Some("Demo"), "Program");
/// module.add_type(program.clone());
///
/// assert!(module.find_type("Demo", "Program").is_some());
/// assert!(program.module().is_some());
/// ```
pub struct ModuleDefinition {
    name: String,
    assembly: AssemblyIdentity,
    /// Top-level types, in declaration order
    pub types: boxcar::Vec<TypeDefRc>,
    /// Exported types, in declaration order
    pub exported_types: boxcar::Vec<ExportedTypeRc>,
    path: OnceLock<PathBuf>,
    this: Weak<ModuleDefinition>,
}

impl ModuleDefinition {
    /// Create an empty module.
    ///
    /// # Arguments
    /// * `name` - Module name (usually the file name)
    /// * `assembly` - Identity of the assembly this module manifests
    pub fn new(name: &str, assembly: AssemblyIdentity) -> ModuleRc {
        Arc::new_cyclic(|this| ModuleDefinition {
            name: name.to_string(),
            assembly,
            types: boxcar::Vec::new(),
            exported_types: boxcar::Vec::new(),
            path: OnceLock::new(),
            this: this.clone(),
        })
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the assembly this module belongs to.
    pub fn assembly(&self) -> &AssemblyIdentity {
        &self.assembly
    }

    /// A scope that anchors references at this module.
    pub fn scope(&self) -> ResolutionScope {
        ResolutionScope::Module(self.this.clone())
    }

    /// Append a top-level type and make `self` its module.
    pub fn add_type(&self, ty: TypeDefRc) {
        ty.attach_module(self.this.clone());
        self.types.push(ty);
    }

    /// Append an exported type entry.
    pub fn add_exported_type(&self, exported: ExportedTypeRc) {
        self.exported_types.push(exported);
    }

    /// The file this module was read from, if known.
    pub fn path(&self) -> Option<&Path> {
        self.path.get().map(PathBuf::as_path)
    }

    /// Record the file this module was read from. The first recorded path is kept.
    pub fn set_path(&self, path: &Path) {
        let _ = self.path.set(path.to_path_buf());
    }

    /// Find a top-level type by current namespace and name, first declared wins.
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<TypeDefRc> {
        self.types
            .iter()
            .find(|(_, ty)| ty.is_type_of(namespace, name))
            .map(|(_, ty)| ty.clone())
    }

    /// Find an exported type entry by namespace and name, first declared wins.
    pub fn find_exported_type(&self, namespace: &str, name: &str) -> Option<ExportedTypeRc> {
        self.exported_types
            .iter()
            .find(|(_, exported)| exported.is_type_of(namespace, name))
            .map(|(_, exported)| exported.clone())
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("name", &self.name)
            .field("assembly", &self.assembly.display_name())
            .field("types", &self.types.count())
            .field("exported_types", &self.exported_types.count())
            .field("path", &self.path.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{identity::AssemblyVersion, typesystem::TypeDef};

    fn module() -> ModuleRc {
        ModuleDefinition::new(
            "Demo.dll",
            AssemblyIdentity::simple("Demo", AssemblyVersion::new(1, 0, 0, 0)),
        )
    }

    #[test]
    fn find_type_first_declared_wins() {
        let module = module();
        let first = TypeDef::new(Some("Demo"), "Dup");
        let second = TypeDef::new(Some("Demo"), "Dup");
        module.add_type(first.clone());
        module.add_type(second);

        assert!(Arc::ptr_eq(&module.find_type("Demo", "Dup").unwrap(), &first));
    }

    #[test]
    fn find_type_sees_renames() {
        let module = module();
        let ty = TypeDef::new(Some("Demo"), "Before");
        module.add_type(ty.clone());

        ty.set_name("After");
        assert!(module.find_type("Demo", "Before").is_none());
        assert!(module.find_type("Demo", "After").is_some());
    }

    #[test]
    fn empty_namespace_matches_none() {
        let module = module();
        module.add_type(TypeDef::new(None, "<Module>"));
        assert!(module.find_type("", "<Module>").is_some());
    }

    #[test]
    fn type_module_backlink() {
        let module = module();
        let outer = TypeDef::new(Some("Demo"), "Outer");
        let inner = TypeDef::new(None, "Inner");
        outer.add_nested_type(inner.clone());
        module.add_type(outer);

        assert!(Arc::ptr_eq(&inner.module().unwrap(), &module));
    }

    #[test]
    fn path_is_set_once() {
        let module = module();
        module.set_path(Path::new("/a/Demo.dll"));
        module.set_path(Path::new("/b/Demo.dll"));
        assert_eq!(module.path(), Some(Path::new("/a/Demo.dll")));
    }
}
