use crate::{
    metadata::{
        identity::AssemblyIdentity,
        signatures::{SignatureField, SignatureMethod, TypeSignature},
        typesystem::{
            FieldDef, MethodDef, ModuleDefinition, ModuleRc, ResolutionScope, TypeDef,
            TypeDefOrRef, TypeRef, TypeRefRc,
        },
    },
    resolver::CorLibrary,
};

const STATIC: u16 = 0x0010;

// Helper function to create a reference to a top level type of another assembly
pub fn type_ref(assembly: &AssemblyIdentity, namespace: &str, name: &str) -> TypeRefRc {
    TypeRef::new(
        ResolutionScope::Assembly(assembly.clone()),
        Some(namespace),
        name,
    )
}

/// A base library with members on `Object`, `String` and `Console`, and `String`
/// implementing `IComparable`.
pub fn corlib_module(identity: AssemblyIdentity) -> ModuleRc {
    let module = CorLibrary::with_identity(identity).module().clone();
    let object = module.find_type("System", "Object").unwrap();
    let string = module.find_type("System", "String").unwrap();

    object.add_method(MethodDef::new(
        "ToString",
        SignatureMethod::new_instance(TypeSignature::String, vec![]),
    ));
    object.add_method(MethodDef::new(
        "GetHashCode",
        SignatureMethod::new_instance(TypeSignature::I4, vec![]),
    ));

    string.add_field(FieldDef::with_flags(
        "Empty",
        STATIC,
        SignatureField::new(TypeSignature::String),
    ));
    string.add_method(MethodDef::new(
        "get_Length",
        SignatureMethod::new_instance(TypeSignature::I4, vec![]),
    ));
    string.add_method(MethodDef::with_flags(
        "Concat",
        STATIC,
        SignatureMethod::new_static(
            TypeSignature::String,
            vec![TypeSignature::String, TypeSignature::String],
        ),
    ));

    let comparable = TypeDef::interface(Some("System"), "IComparable");
    comparable.add_method(MethodDef::new(
        "CompareTo",
        SignatureMethod::new_instance(TypeSignature::I4, vec![TypeSignature::Object]),
    ));
    module.add_type(comparable.clone());
    string.add_interface(comparable.into());

    let console = TypeDef::new(Some("System"), "Console");
    console.set_base(Some(object.clone().into()));
    for params in [
        vec![],
        vec![TypeSignature::String],
        vec![TypeSignature::I4],
        vec![TypeSignature::Object],
        vec![TypeSignature::String, TypeSignature::Object],
    ] {
        console.add_method(MethodDef::with_flags(
            "WriteLine",
            STATIC,
            SignatureMethod::new_static(TypeSignature::Void, params),
        ));
    }
    module.add_type(console);

    let exception = TypeDef::new(Some("System"), "Exception");
    exception.set_base(Some(object.into()));
    exception.add_method(MethodDef::new(
        "get_Message",
        SignatureMethod::new_instance(TypeSignature::String, vec![]),
    ));
    module.add_type(exception);

    module
}

/// `Demo.Outer`, containing `Inner`, containing `InnerInner`, all deriving from the
/// `System.Object` of `corlib`.
pub fn nested_module(identity: AssemblyIdentity, corlib: &AssemblyIdentity) -> ModuleRc {
    let module = ModuleDefinition::new(&format!("{}.dll", identity.name), identity);
    let object = TypeDefOrRef::from(type_ref(corlib, "System", "Object"));

    let outer = TypeDef::new(Some("Demo"), "Outer");
    let inner = TypeDef::new(None, "Inner");
    let inner_inner = TypeDef::new(None, "InnerInner");
    for ty in [&outer, &inner, &inner_inner] {
        ty.set_base(Some(object.clone()));
    }

    inner.add_method(MethodDef::new(
        "Run",
        SignatureMethod::new_instance(TypeSignature::Void, vec![]),
    ));
    inner_inner.add_field(FieldDef::new(
        "Depth",
        SignatureField::new(TypeSignature::I4),
    ));

    inner.add_nested_type(inner_inner);
    outer.add_nested_type(inner);
    module.add_type(outer);
    module
}
