//! Structural method, field and type signatures.
//!
//! The decoding layer turns signature blobs (ECMA-335 §II.23.2) into these values. Unlike
//! raw blobs, named types are represented by [`crate::metadata::typesystem::TypeDefOrRef`]
//! instead of module-local tokens, which keeps signatures comparable across modules.
//!
//! # Signature Types
//!
//! - [`SignatureMethod`] - calling convention, generic arity, return and parameter types
//! - [`SignatureField`] - field type
//! - [`SignatureMember`] - signature attached to a member reference
//! - [`TypeSignature`] - a single structural type
//!
//! # Examples
//!
//! ```rust
//! use dotscope_resolver::metadata::signatures::{SignatureMethod, TypeSignature};
//!
//! // static void WriteLine(string)
//! let write_line = SignatureMethod::new_static(TypeSignature::Void, vec![TypeSignature::String]);
//! assert_eq!(write_line.params.len(), 1);
//! assert!(!write_line.calling_convention.has_this());
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod types;

pub use types::*;
