use std::{
    collections::HashSet,
    sync::{Arc, OnceLock},
};

use log::{debug, trace, warn};

use crate::{
    metadata::{
        diagnostics::{DiagnosticCategory, Diagnostics},
        identity::AssemblyIdentity,
        runtime::TargetRuntime,
        signatures::{SignatureMember, TypeSignature},
        typesystem::{
            CorLibTypeKind, ExportedTypeImplementation, ExportedTypeRc, FieldDefRc,
            MemberDefinition, MemberRef, MethodDefRc, ModuleRc, ResolutionScope, TypeDefOrRef,
            TypeDefRc, TypeRef,
        },
    },
    resolver::{CorLibrary, ModuleCache, ResolverBuilder, SignatureComparer},
    Result,
};

/// Default bound on nested scope, forwarder and inheritance walks
pub(crate) const DEFAULT_MAX_DEPTH: usize = 100;

/// Identity of a graph node for cycle detection.
fn node<T>(value: *const T) -> usize {
    value as *const () as usize
}

/// Per-call walk state.
///
/// `active` holds the nodes currently being resolved, so a node met again further down
/// its own chain is a cycle, while siblings may share ancestors freely.
struct ResolutionContext {
    active: HashSet<usize>,
    max_depth: usize,
}

enum Step {
    Entered,
    Cycle,
    TooDeep,
}

impl ResolutionContext {
    fn new(max_depth: usize) -> Self {
        ResolutionContext {
            active: HashSet::new(),
            max_depth,
        }
    }

    fn enter(&mut self, node: usize) -> Step {
        if self.active.len() >= self.max_depth {
            Step::TooDeep
        } else if self.active.insert(node) {
            Step::Entered
        } else {
            Step::Cycle
        }
    }

    fn exit(&mut self, node: usize) {
        self.active.remove(&node);
    }
}

/// Resolves type and member references to the definitions providing them.
///
/// A reference is resolved by walking its scope chain (base library shortcut, referenced
/// assembly, same module or enclosing type), then scanning the target's live tables by
/// current name. Dependency assemblies are loaded on demand through the shared
/// [`ModuleCache`]; nothing else is cached, so every call reflects the current state of
/// the reference and the graphs it walks.
///
/// Unresolvable references yield `None`. Malformed scopes, cycles and load failures are
/// recorded in [`MetadataResolver::diagnostics`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::{path::Path, sync::Arc};
/// use dotscope_resolver::{
///     metadata::{
///         identity::AssemblyIdentity,
///         typesystem::{ModuleRc, ResolutionScope, TypeRef},
///     },
///     MetadataResolver, Result,
/// };
///
/// fn decode(path: &Path, data: &[u8]) -> Result<ModuleRc> {
///     // provided by the decoding layer
///     # unimplemented!()
/// }
///
/// let resolver = MetadataResolver::builder()
///     .search_directory("/app/bin")
///     .reader(Arc::new(decode))
///     .build()?;
///
/// let logger = TypeRef::new(
///     ResolutionScope::Assembly(AssemblyIdentity::parse("Logging, Version=2.0.0.0")?),
///     Some("Logging"),
///     "Logger",
/// );
///
/// match resolver.resolve_type_ref(&logger) {
///     Some(definition) => println!("{} resolved", definition.fullname()),
///     None => println!("unresolved:\n{}", resolver.diagnostics()),
/// }
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub struct MetadataResolver {
    cache: Arc<ModuleCache>,
    corlib: OnceLock<CorLibrary>,
    runtime: TargetRuntime,
    comparer: SignatureComparer,
    diagnostics: Arc<Diagnostics>,
    max_depth: usize,
}

impl MetadataResolver {
    /// Without `corlib`, the base library of `runtime` is loaded through `cache` on first
    /// use.
    pub(crate) fn new(
        cache: Arc<ModuleCache>,
        corlib: Option<CorLibrary>,
        runtime: TargetRuntime,
        comparer: SignatureComparer,
        max_depth: usize,
    ) -> Self {
        MetadataResolver {
            diagnostics: cache.diagnostics().clone(),
            cache,
            corlib: corlib.map(OnceLock::from).unwrap_or_default(),
            runtime,
            comparer,
            max_depth,
        }
    }

    /// Start configuring a resolver.
    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Resolve any type descriptor. Definitions resolve to themselves.
    pub fn resolve_type(&self, ty: &TypeDefOrRef) -> Option<TypeDefRc> {
        let mut context = ResolutionContext::new(self.max_depth);
        self.resolve_in(&mut context, ty)
    }

    /// Resolve a type reference to its definition.
    pub fn resolve_type_ref(&self, reference: &TypeRef) -> Option<TypeDefRc> {
        let mut context = ResolutionContext::new(self.max_depth);
        self.resolve_ref(&mut context, reference)
    }

    /// Resolve the type a signature is built on.
    ///
    /// Primitive element types map onto the base library, generic instances onto their
    /// generic type and modified types onto their base. Pointers, arrays and generic
    /// parameters have no definition.
    pub fn resolve_type_signature(&self, signature: &TypeSignature) -> Option<TypeDefRc> {
        let mut context = ResolutionContext::new(self.max_depth);
        self.resolve_signature(&mut context, signature)
    }

    /// Resolve a method reference.
    ///
    /// Searches the parent type, its base types rootward, then every interface they
    /// implement, for a method whose name and signature match. First match wins.
    pub fn resolve_method(&self, reference: &MemberRef) -> Option<MethodDefRc> {
        let SignatureMember::Method(signature) = &reference.signature else {
            return None;
        };
        let name = reference.name();

        self.walk_members(&reference.parent(), |ty| {
            ty.methods
                .iter()
                .find(|(_, method)| {
                    method.is_named(&name)
                        && self
                            .comparer
                            .method_signatures_equal(&method.signature, signature)
                })
                .map(|(_, method)| method.clone())
        })
    }

    /// Resolve a field reference, in the same order as [`MetadataResolver::resolve_method`].
    pub fn resolve_field(&self, reference: &MemberRef) -> Option<FieldDefRc> {
        let SignatureMember::Field(signature) = &reference.signature else {
            return None;
        };
        let name = reference.name();

        self.walk_members(&reference.parent(), |ty| {
            ty.fields
                .iter()
                .find(|(_, field)| {
                    field.is_named(&name)
                        && self
                            .comparer
                            .field_signatures_equal(&field.signature, signature)
                })
                .map(|(_, field)| field.clone())
        })
    }

    /// Resolve a member reference of either kind.
    pub fn resolve_member(&self, reference: &MemberRef) -> Option<MemberDefinition> {
        match reference.signature {
            SignatureMember::Method(_) => self.resolve_method(reference).map(MemberDefinition::Method),
            SignatureMember::Field(_) => self.resolve_field(reference).map(MemberDefinition::Field),
        }
    }

    /// Add an already decoded module, typically the one under analysis.
    ///
    /// # Errors
    /// Returns the failure of an in-flight load of the same identity.
    pub fn register(&self, module: ModuleRc) -> Result<ModuleRc> {
        self.cache.register(module)
    }

    /// Problems met while loading and resolving.
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// The module cache dependencies are loaded through.
    pub fn cache(&self) -> &Arc<ModuleCache> {
        &self.cache
    }

    /// The comparer members are matched with.
    pub fn comparer(&self) -> &SignatureComparer {
        &self.comparer
    }

    /// The base library fundamental types resolve to.
    ///
    /// Unless one was configured, the first call locates and loads the base library of the
    /// target runtime. A synthesized skeleton stands in if it cannot be located or loaded,
    /// or does not define `System.Object`.
    pub fn corlib(&self) -> &CorLibrary {
        self.corlib.get_or_init(|| self.load_corlib())
    }

    fn load_corlib(&self) -> CorLibrary {
        let identity = self.runtime.corlib_identity();
        if self.cache.locator().locate(&identity).is_none() {
            self.diagnostics.info(
                DiagnosticCategory::Probe,
                format!("Base library '{}' not found, using synthesized types", identity),
            );
            return CorLibrary::with_identity(identity);
        }

        let defines_object =
            |module: &ModuleRc| module.find_type(CorLibTypeKind::NAMESPACE, "Object").is_some();
        match self.cache.load(&identity) {
            Ok(module) if defines_object(&module) => {
                debug!("Using base library '{}'", module.assembly());
                return CorLibrary::from_module(module);
            }
            Ok(module) => self.diagnostics.info(
                DiagnosticCategory::Type,
                format!(
                    "'{}' does not define System.Object, using synthesized types",
                    module.assembly()
                ),
            ),
            Err(error) => warn!("Base library '{}' unusable - {}", identity, error),
        }
        CorLibrary::with_identity(identity)
    }

    fn resolve_in(&self, context: &mut ResolutionContext, ty: &TypeDefOrRef) -> Option<TypeDefRc> {
        match ty {
            TypeDefOrRef::Definition(definition) => Some(definition.clone()),
            TypeDefOrRef::Reference(reference) => self.resolve_ref(context, reference),
            TypeDefOrRef::Specification(signature) => self.resolve_signature(context, signature),
        }
    }

    fn resolve_signature(
        &self,
        context: &mut ResolutionContext,
        signature: &TypeSignature,
    ) -> Option<TypeDefRc> {
        if let Some(kind) = signature.corlib_kind() {
            return self.corlib().get(kind);
        }

        match signature {
            TypeSignature::Class(ty) | TypeSignature::ValueType(ty) => self.resolve_in(context, ty),
            TypeSignature::GenericInst(generic, _) => self.resolve_signature(context, generic),
            TypeSignature::Modified { base, .. } => self.resolve_signature(context, base),
            _ => None,
        }
    }

    /// Guard `walk` against cycles and runaway depth at `key`.
    fn guarded<T>(
        &self,
        context: &mut ResolutionContext,
        key: usize,
        subject: impl FnOnce() -> String,
        walk: impl FnOnce(&mut ResolutionContext) -> Option<T>,
    ) -> Option<T> {
        match context.enter(key) {
            Step::Entered => {
                let result = walk(context);
                context.exit(key);
                result
            }
            Step::Cycle => {
                let subject = subject();
                warn!("Cyclic scope chain at '{}'", subject);
                self.diagnostics.warning(
                    DiagnosticCategory::Scope,
                    format!("Cyclic scope chain at '{}'", subject),
                );
                None
            }
            Step::TooDeep => {
                let subject = subject();
                warn!("Scope chain of '{}' exceeds {} levels", subject, context.max_depth);
                self.diagnostics.warning(
                    DiagnosticCategory::Scope,
                    format!("Scope chain of '{}' exceeds {} levels", subject, context.max_depth),
                );
                None
            }
        }
    }

    fn resolve_ref(&self, context: &mut ResolutionContext, reference: &TypeRef) -> Option<TypeDefRc> {
        self.guarded(
            context,
            node(reference as *const TypeRef),
            || reference.fullname(),
            |context| self.resolve_ref_unguarded(context, reference),
        )
    }

    fn resolve_ref_unguarded(
        &self,
        context: &mut ResolutionContext,
        reference: &TypeRef,
    ) -> Option<TypeDefRc> {
        let namespace = reference.namespace().unwrap_or_default();
        let name = reference.name();

        match reference.scope() {
            ResolutionScope::Assembly(identity) => {
                trace!("Resolving '{}' in '{}'", reference.fullname(), identity);
                self.resolve_in_assembly(context, &identity, &namespace, &name)
            }
            ResolutionScope::Module(module) => {
                let Some(module) = module.upgrade() else {
                    warn!("Module scope of '{}' was dropped", reference.fullname());
                    self.diagnostics.warning(
                        DiagnosticCategory::Scope,
                        format!("Module scope of '{}' was dropped", reference.fullname()),
                    );
                    return None;
                };
                trace!("Resolving '{}' in module '{}'", reference.fullname(), module.name());
                self.resolve_in_module(context, &module, &namespace, &name)
            }
            ResolutionScope::Nested(enclosing) => {
                let outer = self.resolve_ref(context, &enclosing)?;
                trace!("Resolving '{}' in '{}'", name, outer.fullname());
                outer.nested(&name)
            }
        }
    }

    fn resolve_in_assembly(
        &self,
        context: &mut ResolutionContext,
        identity: &AssemblyIdentity,
        namespace: &str,
        name: &str,
    ) -> Option<TypeDefRc> {
        if CorLibrary::is_corlib_name(&identity.name) {
            if let Some(found) = self.corlib().lookup(identity, namespace, name) {
                return Some(found);
            }
        }

        let module = match self.cache.load(identity) {
            Ok(module) => module,
            Err(error) => {
                warn!("'{}.{}' unresolved - {}", namespace, name, error);
                return None;
            }
        };
        self.resolve_in_module(context, &module, namespace, name)
    }

    /// Top-level types first, then forwarders.
    fn resolve_in_module(
        &self,
        context: &mut ResolutionContext,
        module: &ModuleRc,
        namespace: &str,
        name: &str,
    ) -> Option<TypeDefRc> {
        if let Some(found) = module.find_type(namespace, name) {
            return Some(found);
        }

        let exported = module.find_exported_type(namespace, name)?;
        self.resolve_exported(context, &exported)
    }

    fn resolve_exported(
        &self,
        context: &mut ResolutionContext,
        exported: &ExportedTypeRc,
    ) -> Option<TypeDefRc> {
        let subject = || {
            crate::metadata::typesystem::fullname(exported.namespace.as_deref(), &exported.name)
        };

        self.guarded(context, node(Arc::as_ptr(exported)), subject, |context| {
            let namespace = exported.namespace.as_deref().unwrap_or_default();
            match &exported.implementation {
                ExportedTypeImplementation::Assembly(target) => {
                    trace!("Following forwarder of '{}' to '{}'", subject(), target);
                    self.resolve_in_assembly(context, target, namespace, &exported.name)
                }
                ExportedTypeImplementation::Nested(outer) => self
                    .resolve_exported(context, outer)?
                    .nested(&exported.name),
                ExportedTypeImplementation::File(file) => {
                    self.diagnostics.info(
                        DiagnosticCategory::Type,
                        format!(
                            "'{}' is implemented in module file '{}', which is not loaded",
                            subject(),
                            file
                        ),
                    );
                    None
                }
            }
        })
    }

    /// Search `parent`, its base chain, then the interfaces of the chain, for the first
    /// type `find` accepts.
    fn walk_members<T>(&self, parent: &TypeDefOrRef, find: impl Fn(&TypeDefRc) -> Option<T>) -> Option<T> {
        let mut context = ResolutionContext::new(self.max_depth);
        let Some(declaring) = self.resolve_in(&mut context, parent) else {
            trace!("Declaring type '{}' unresolved", parent.fullname());
            return None;
        };

        let mut chain: Vec<TypeDefRc> = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(declaring);

        while let Some(ty) = current {
            if !seen.insert(node(Arc::as_ptr(&ty))) {
                warn!("Cyclic base type chain at '{}'", ty.fullname());
                self.diagnostics.warning(
                    DiagnosticCategory::Type,
                    format!("Cyclic base type chain at '{}'", ty.fullname()),
                );
                break;
            }
            if chain.len() >= self.max_depth {
                self.diagnostics.warning(
                    DiagnosticCategory::Type,
                    format!("Base type chain of '{}' exceeds {} levels", parent.fullname(), self.max_depth),
                );
                break;
            }

            if let Some(found) = find(&ty) {
                return Some(found);
            }

            current = ty.base().and_then(|base| {
                let resolved = self.resolve_in(&mut context, &base);
                if resolved.is_none() {
                    trace!("Base type '{}' of '{}' unresolved", base.fullname(), ty.fullname());
                }
                resolved
            });
            chain.push(ty);
        }

        let mut visited = HashSet::new();
        chain.iter().find_map(|ty| self.walk_interfaces(&mut context, ty, &find, &mut visited, 0))
    }

    /// Depth-first over the interfaces of `ty`, each interface searched before the
    /// interfaces it extends.
    fn walk_interfaces<T>(
        &self,
        context: &mut ResolutionContext,
        ty: &TypeDefRc,
        find: &impl Fn(&TypeDefRc) -> Option<T>,
        visited: &mut HashSet<usize>,
        depth: usize,
    ) -> Option<T> {
        if depth >= self.max_depth {
            return None;
        }

        for (_, interface) in ty.interfaces.iter() {
            let Some(resolved) = self.resolve_in(context, interface) else {
                trace!("Interface '{}' of '{}' unresolved", interface.fullname(), ty.fullname());
                continue;
            };
            if !visited.insert(node(Arc::as_ptr(&resolved))) {
                continue;
            }

            if let Some(found) = find(&resolved) {
                return Some(found);
            }
            if let Some(found) = self.walk_interfaces(context, &resolved, find, visited, depth + 1) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            diagnostics::DiagnosticSeverity,
            identity::AssemblyVersion,
            signatures::{SignatureField, SignatureMethod},
            typesystem::{
                ExportedType, MemberRef, MethodDef, ModuleDefinition, TypeDef,
            },
        },
        test::{corlib_module, identity, nested_module, type_ref, CountingReader},
    };
    use std::fs;

    struct Fixture {
        resolver: MetadataResolver,
        reader: Arc<CountingReader>,
        _dir: tempfile::TempDir,
    }

    /// `mscorlib` 4.0 as the base library, plus files for the stems in `files`
    fn fixture(files: &[&str], reader: CountingReader) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        for stem in files {
            fs::write(dir.path().join(format!("{}.dll", stem)), stem.as_bytes()).unwrap();
        }

        let reader = Arc::new(reader);
        let resolver = MetadataResolver::builder()
            .search_directory(dir.path())
            .reader(reader.clone())
            .corlib(corlib_module(identity("mscorlib", 4)))
            .build()
            .unwrap();

        Fixture {
            resolver,
            reader,
            _dir: dir,
        }
    }

    fn mscorlib() -> AssemblyIdentity {
        identity("mscorlib", 4)
    }

    #[test]
    fn definitions_resolve_to_themselves() {
        let f = fixture(&[], CountingReader::new());
        let ty = TypeDef::new(Some("Demo"), "Local");
        let resolved = f.resolver.resolve_type(&ty.clone().into()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &ty));
    }

    #[test]
    fn corlib_types_skip_loading() {
        let f = fixture(&[], CountingReader::new());
        for facade in ["mscorlib", "System.Runtime", "netstandard"] {
            let object = type_ref(&identity(facade, 4), "System", "Object");
            let resolved = f.resolver.resolve_type_ref(&object).unwrap();
            assert!(resolved.is_type_of("System", "Object"));
        }
        assert_eq!(f.reader.reads(), 0);
    }

    #[test]
    fn non_fundamental_corlib_types_go_through_the_cache() {
        let f = fixture(&[], CountingReader::new());
        let console = type_ref(&mscorlib(), "System", "Console");
        let resolved = f.resolver.resolve_type_ref(&console).unwrap();
        assert!(Arc::ptr_eq(
            &resolved,
            &f.resolver.corlib().module().find_type("System", "Console").unwrap()
        ));
    }

    #[test]
    fn reference_mutation_is_observed() {
        let f = fixture(&[], CountingReader::new());
        let reference = type_ref(&mscorlib(), "System", "Object");
        let object = f.resolver.resolve_type_ref(&reference).unwrap();

        reference.set_name("String");
        let string = f.resolver.resolve_type_ref(&reference).unwrap();
        assert!(!Arc::ptr_eq(&object, &string));
        assert!(string.is_type_of("System", "String"));

        reference.set_namespace(Some("Other"));
        assert!(f.resolver.resolve_type_ref(&reference).is_none());
    }

    #[test]
    fn module_scope() {
        let f = fixture(&[], CountingReader::new());
        let module = ModuleDefinition::new("App.exe", identity("App", 1));
        let local = TypeDef::new(Some("App"), "Program");
        module.add_type(local.clone());

        let reference = TypeRef::new(ResolutionScope::module(&module), Some("App"), "Program");
        assert!(Arc::ptr_eq(&f.resolver.resolve_type_ref(&reference).unwrap(), &local));

        drop(local);
        drop(module);
        assert!(f.resolver.resolve_type_ref(&reference).is_none());
        assert_eq!(f.resolver.diagnostics().by_category(DiagnosticCategory::Scope).len(), 1);
    }

    #[test]
    fn nested_chain() {
        let f = fixture(
            &["Demo"],
            CountingReader::new().with_module("Demo", |_| nested_module(identity("Demo", 1), &mscorlib())),
        );
        let outer = type_ref(&identity("Demo", 1), "Demo", "Outer");
        let inner = TypeRef::nested(&outer, "Inner");
        let inner_inner = TypeRef::nested(&inner, "InnerInner");

        let resolved_inner = f.resolver.resolve_type_ref(&inner).unwrap();
        let resolved = f.resolver.resolve_type_ref(&inner_inner).unwrap();
        assert!(Arc::ptr_eq(&resolved, &resolved_inner.nested("InnerInner").unwrap()));
        assert_eq!(resolved.fullname(), "Demo.Outer/Inner/InnerInner");
        assert_eq!(f.reader.reads(), 1);
    }

    #[test]
    fn self_nested_scope_is_a_dead_end() {
        let f = fixture(&[], CountingReader::new());
        let looped = type_ref(&mscorlib(), "System", "Object");
        looped.set_scope(ResolutionScope::Nested(looped.clone()));

        assert!(f.resolver.resolve_type_ref(&looped).is_none());
        assert!(!f.resolver.diagnostics().by_category(DiagnosticCategory::Scope).is_empty());

        looped.set_scope(ResolutionScope::Assembly(mscorlib()));
        assert!(f.resolver.resolve_type_ref(&looped).is_some());
    }

    #[test]
    fn forwarded_types() {
        let reader = CountingReader::new()
            .with_module("Facade", |_| {
                let module = ModuleDefinition::new("Facade.dll", identity("Facade", 1));
                module.add_exported_type(ExportedType::forwarder(
                    Some("Lib"),
                    "Widget",
                    identity("Impl", 1),
                ));
                module
            })
            .with_module("Impl", |_| {
                let module = ModuleDefinition::new("Impl.dll", identity("Impl", 1));
                module.add_type(TypeDef::new(Some("Lib"), "Widget"));
                module
            });
        let f = fixture(&["Facade", "Impl"], reader);

        let widget = type_ref(&identity("Facade", 1), "Lib", "Widget");
        let resolved = f.resolver.resolve_type_ref(&widget).unwrap();
        assert_eq!(resolved.module().unwrap().assembly().name, "Impl");
        assert_eq!(f.reader.reads(), 2);
    }

    #[test]
    fn forwarding_cycle_is_a_dead_end() {
        let forwarding = |from: &'static str, to: &'static str| {
            move |_: &std::path::Path| {
                let module = ModuleDefinition::new(&format!("{}.dll", from), identity(from, 1));
                module.add_exported_type(ExportedType::forwarder(Some("Lib"), "Widget", identity(to, 1)));
                module
            }
        };
        let reader = CountingReader::new()
            .with_module("A", forwarding("A", "B"))
            .with_module("B", forwarding("B", "A"));
        let f = fixture(&["A", "B"], reader);

        assert!(f
            .resolver
            .resolve_type_ref(&type_ref(&identity("A", 1), "Lib", "Widget"))
            .is_none());
        assert!(!f.resolver.diagnostics().by_category(DiagnosticCategory::Scope).is_empty());
    }

    #[test]
    fn missing_assembly_is_unresolved() {
        let f = fixture(&[], CountingReader::new());
        let missing = type_ref(&identity("Missing", 1), "Lib", "Widget");
        assert!(f.resolver.resolve_type_ref(&missing).is_none());
        assert_eq!(f.resolver.diagnostics().by_category(DiagnosticCategory::Probe).len(), 1);
    }

    #[test]
    fn type_signatures() {
        let f = fixture(&[], CountingReader::new());
        let int = f.resolver.resolve_type_signature(&TypeSignature::I4).unwrap();
        assert!(int.is_type_of("System", "Int32"));

        let list = TypeSignature::GenericInst(
            Box::new(TypeSignature::Class(type_ref(&mscorlib(), "System", "Console").into())),
            vec![TypeSignature::I4],
        );
        assert!(f.resolver.resolve_type_signature(&list).unwrap().is_type_of("System", "Console"));
        assert!(f
            .resolver
            .resolve_type_signature(&TypeSignature::SzArray(Box::new(TypeSignature::I4)))
            .is_none());
    }

    #[test]
    fn methods_match_by_signature() {
        let f = fixture(&[], CountingReader::new());
        let console: TypeDefOrRef = type_ref(&mscorlib(), "System", "Console").into();

        let write_line = MemberRef::new(
            console.clone(),
            "WriteLine",
            SignatureMethod::new_static(TypeSignature::Void, vec![TypeSignature::String]),
        );
        let method = f.resolver.resolve_method(&write_line).unwrap();
        assert!(matches!(method.signature.params[..], [TypeSignature::String]));

        let mismatched = MemberRef::new(
            console,
            "WriteLine",
            SignatureMethod::new_static(TypeSignature::Void, vec![TypeSignature::R8]),
        );
        assert!(f.resolver.resolve_method(&mismatched).is_none());
        assert!(f.resolver.resolve_field(&write_line).is_none());
    }

    #[test]
    fn fields_match_by_signature() {
        let f = fixture(&[], CountingReader::new());
        let string: TypeDefOrRef = type_ref(&mscorlib(), "System", "String").into();

        let empty = MemberRef::new(string.clone(), "Empty", SignatureField::new(TypeSignature::String));
        let field = f.resolver.resolve_field(&empty).unwrap();
        assert!(field.is_named("Empty"));
        assert!(matches!(
            f.resolver.resolve_member(&empty),
            Some(MemberDefinition::Field(_))
        ));

        let int = MemberRef::new(string, "Empty", SignatureField::new(TypeSignature::I4));
        assert!(f.resolver.resolve_field(&int).is_none());
    }

    #[test]
    fn members_found_on_base_types_and_interfaces() {
        let f = fixture(&[], CountingReader::new());
        let string: TypeDefOrRef = type_ref(&mscorlib(), "System", "String").into();

        let to_string = MemberRef::new(
            string.clone(),
            "ToString",
            SignatureMethod::new_instance(TypeSignature::String, vec![]),
        );
        let method = f.resolver.resolve_method(&to_string).unwrap();
        assert!(method.declaring_type().unwrap().is_type_of("System", "Object"));

        let compare_to = MemberRef::new(
            string,
            "CompareTo",
            SignatureMethod::new_instance(TypeSignature::I4, vec![TypeSignature::Object]),
        );
        let method = f.resolver.resolve_method(&compare_to).unwrap();
        assert!(method.declaring_type().unwrap().is_type_of("System", "IComparable"));
    }

    #[test]
    fn cyclic_base_chain_is_a_dead_end() {
        let f = fixture(&[], CountingReader::new());
        let a = TypeDef::new(Some("Demo"), "A");
        let b = TypeDef::new(Some("Demo"), "B");
        a.set_base(Some(b.clone().into()));
        b.set_base(Some(a.clone().into()));

        let missing = MemberRef::new(
            a.clone().into(),
            "Run",
            SignatureMethod::new_instance(TypeSignature::Void, vec![]),
        );
        assert!(f.resolver.resolve_method(&missing).is_none());
        assert_eq!(f.resolver.diagnostics().by_category(DiagnosticCategory::Type).len(), 1);

        b.add_method(MethodDef::new(
            "Run",
            SignatureMethod::new_instance(TypeSignature::Void, vec![]),
        ));
        assert!(f.resolver.resolve_method(&missing).is_some());

        a.set_base(None);
    }

    #[test]
    fn first_declared_wins() {
        let f = fixture(&[], CountingReader::new());
        let ty = TypeDef::new(Some("Demo"), "Twice");
        let signature = SignatureMethod::new_static(TypeSignature::Void, vec![]);
        let first = MethodDef::new("Run", signature.clone());
        ty.add_method(first.clone());
        ty.add_method(MethodDef::new("Run", signature.clone()));

        let reference = MemberRef::new(ty.into(), "Run", signature);
        assert!(Arc::ptr_eq(&f.resolver.resolve_method(&reference).unwrap(), &first));
    }

    fn run() -> SignatureMethod {
        SignatureMethod::new_instance(TypeSignature::Void, vec![])
    }

    #[test]
    fn base_chain_before_interfaces() {
        let f = fixture(&[], CountingReader::new());
        let runnable = TypeDef::interface(Some("Demo"), "IRunnable");
        runnable.add_method(MethodDef::new("Run", run()));

        let base = TypeDef::new(Some("Demo"), "Base");
        let inherited = MethodDef::new("Run", run());
        base.add_method(inherited.clone());

        let derived = TypeDef::new(Some("Demo"), "Derived");
        derived.set_base(Some(base.into()));
        derived.add_interface(runnable.into());

        let reference = MemberRef::new(derived.into(), "Run", run());
        assert!(Arc::ptr_eq(&f.resolver.resolve_method(&reference).unwrap(), &inherited));
    }

    #[test]
    fn interfaces_are_searched_transitively() {
        let f = fixture(&[], CountingReader::new());
        let disposable = TypeDef::interface(Some("Demo"), "IDisposable");
        let dispose = MethodDef::new("Dispose", run());
        disposable.add_method(dispose.clone());

        let service = TypeDef::interface(Some("Demo"), "IService");
        service.add_interface(disposable.into());

        let ty = TypeDef::new(Some("Demo"), "Service");
        ty.add_interface(service.into());

        let reference = MemberRef::new(ty.into(), "Dispose", run());
        let method = f.resolver.resolve_method(&reference).unwrap();
        assert!(Arc::ptr_eq(&method, &dispose));
        assert!(method.declaring_type().unwrap().is_interface());
    }

    #[test]
    fn unresolvable_interfaces_are_skipped() {
        let f = fixture(&[], CountingReader::new());
        let missing = type_ref(&identity("Missing", 1), "Demo", "IGone");
        let runnable = TypeDef::interface(Some("Demo"), "IRunnable");
        let declared = MethodDef::new("Run", run());
        runnable.add_method(declared.clone());

        let ty = TypeDef::new(Some("Demo"), "Worker");
        ty.add_interface(missing.into());
        ty.add_interface(runnable.into());

        let reference = MemberRef::new(ty.into(), "Run", run());
        assert!(Arc::ptr_eq(&f.resolver.resolve_method(&reference).unwrap(), &declared));
        assert_eq!(f.resolver.diagnostics().by_category(DiagnosticCategory::Probe).len(), 1);
    }

    fn legacy_resolver(dir: &std::path::Path, reader: Arc<CountingReader>) -> MetadataResolver {
        MetadataResolver::builder()
            .runtime(TargetRuntime::NetFramework(AssemblyVersion::new(4, 8, 0, 0)))
            .search_directory(dir)
            .reader(reader)
            .build()
            .unwrap()
    }

    #[test]
    fn runtime_base_library_is_loaded_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mscorlib.dll"), b"mscorlib").unwrap();
        let reader = Arc::new(
            CountingReader::new().with_module("mscorlib", |_| corlib_module(identity("mscorlib", 4))),
        );
        let resolver = legacy_resolver(dir.path(), reader.clone());
        assert_eq!(reader.reads(), 0);

        let string: TypeDefOrRef = type_ref(&mscorlib(), "System", "String").into();
        let empty = MemberRef::new(string, "Empty", SignatureField::new(TypeSignature::String));
        let field = resolver.resolve_field(&empty).unwrap();
        assert!(field.declaring_type().unwrap().is_type_of("System", "String"));

        let to_string = MemberRef::new(
            TypeSignature::String.into(),
            "ToString",
            SignatureMethod::new_instance(TypeSignature::String, vec![]),
        );
        assert!(resolver.resolve_method(&to_string).is_some());

        assert!(Arc::ptr_eq(
            resolver.corlib().module(),
            &resolver.cache().get(&mscorlib()).unwrap()
        ));
        assert_eq!(reader.reads(), 1);
        assert!(resolver.diagnostics().is_empty());
    }

    #[test]
    fn skeleton_stands_in_for_missing_base_library() {
        let dir = tempfile::tempdir().unwrap();
        let reader = Arc::new(CountingReader::new());
        let resolver = legacy_resolver(dir.path(), reader.clone());

        let string = type_ref(&mscorlib(), "System", "String");
        assert!(resolver.resolve_type_ref(&string).is_some());
        let empty = MemberRef::new(string.into(), "Empty", SignatureField::new(TypeSignature::String));
        assert!(resolver.resolve_field(&empty).is_none());

        assert_eq!(resolver.corlib().identity().name, "mscorlib");
        assert_eq!(resolver.diagnostics().at_least(DiagnosticSeverity::Info).len(), 1);
        assert!(!resolver.diagnostics().has_errors());
        assert_eq!(reader.reads(), 0);
    }

    #[test]
    fn base_library_without_object_is_not_adopted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mscorlib.dll"), b"mscorlib").unwrap();
        let reader = Arc::new(CountingReader::new());
        let resolver = legacy_resolver(dir.path(), reader.clone());

        let object = resolver.resolve_type_signature(&TypeSignature::Object).unwrap();
        assert!(object.module().is_some_and(|module| module.path().is_none()));
        assert_eq!(resolver.diagnostics().by_category(DiagnosticCategory::Type).len(), 1);
        assert_eq!(reader.reads(), 1);
    }
}
