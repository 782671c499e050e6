//! Assembly identity system.
//!
//! - [`AssemblyIdentity`] - name, version, culture, strong name and architecture of an assembly
//! - [`AssemblyVersion`] - four-part version with compatibility helpers
//! - [`Identity`] - strong name as public key, ECMA key or public key token
//! - [`ProcessorArchitecture`] - processor architecture specification

pub use assembly::{AssemblyIdentity, AssemblyVersion, ProcessorArchitecture};
pub use cryptographic::Identity;

mod assembly;
mod cryptographic;
