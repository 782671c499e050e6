//! Target runtime descriptor.
//!
//! A [`TargetRuntime`] names the runtime flavor and version a module was built for. It drives
//! which locator policy probes for dependencies and which base library the resolver
//! precomputes.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_resolver::metadata::{
//!     identity::AssemblyVersion,
//!     runtime::{RuntimeKind, TargetRuntime},
//! };
//!
//! let runtime = TargetRuntime::parse(".NETCoreApp,Version=v8.0")?;
//! assert_eq!(runtime.kind(), RuntimeKind::NetCore);
//! assert_eq!(runtime.version(), AssemblyVersion::new(8, 0, 0, 0));
//!
//! let legacy = TargetRuntime::parse("net472")?;
//! assert_eq!(legacy, TargetRuntime::NetFramework(AssemblyVersion::new(4, 7, 2, 0)));
//! # Ok::<(), dotscope_resolver::Error>(())
//! ```

use std::fmt;

use strum::{Display, EnumDiscriminants, EnumIter, EnumString};

use crate::{
    metadata::identity::{AssemblyIdentity, AssemblyVersion, Identity},
    Result,
};

/// `b77a5c561934e089`, the ECMA token of mscorlib and the legacy framework
const ECMA_TOKEN: [u8; 8] = [0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89];
/// `7cec85d7bea7798e`, the token of System.Private.CoreLib
const CORE_TOKEN: [u8; 8] = [0x7c, 0xec, 0x85, 0xd7, 0xbe, 0xa7, 0x79, 0x8e];
/// `cc7b13ffcd2ddd51`, the token of netstandard
const STANDARD_TOKEN: [u8; 8] = [0xcc, 0x7b, 0x13, 0xff, 0xcd, 0x2d, 0xdd, 0x51];

/// The runtime a module targets, with its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(name(RuntimeKind), doc = "The flavor of a [`TargetRuntime`], without its version.", derive(Display, EnumString, EnumIter, Hash))]
pub enum TargetRuntime {
    /// The legacy .NET Framework (mscorlib based, global assembly cache)
    NetFramework(AssemblyVersion),
    /// .NET Core and .NET 5+ (shared framework directories)
    NetCore(AssemblyVersion),
    /// .NET Standard reference surface
    NetStandard(AssemblyVersion),
}

impl TargetRuntime {
    /// The flavor of this runtime.
    #[must_use]
    pub fn kind(&self) -> RuntimeKind {
        RuntimeKind::from(self)
    }

    /// The runtime version.
    #[must_use]
    pub fn version(&self) -> AssemblyVersion {
        match self {
            TargetRuntime::NetFramework(version)
            | TargetRuntime::NetCore(version)
            | TargetRuntime::NetStandard(version) => *version,
        }
    }

    /// Parse a target framework, either in `TargetFrameworkAttribute` form
    /// (`.NETCoreApp,Version=v8.0`) or as a short moniker (`net8.0`, `net472`,
    /// `netcoreapp3.1`, `netstandard2.0`).
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown frameworks or versions.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some((framework, version)) = value.split_once(',') {
            let version = version
                .trim()
                .strip_prefix("Version=")
                .map(|v| v.trim_start_matches('v'))
                .ok_or_else(|| malformed_error!("Missing framework version in '{}'", value))?;
            let version = AssemblyVersion::parse(version)?;

            return match framework.trim() {
                ".NETFramework" => Ok(TargetRuntime::NetFramework(version)),
                ".NETCoreApp" => Ok(TargetRuntime::NetCore(version)),
                ".NETStandard" => Ok(TargetRuntime::NetStandard(version)),
                other => Err(malformed_error!("Unknown target framework '{}'", other)),
            };
        }

        let moniker = value.to_ascii_lowercase();
        if let Some(version) = moniker.strip_prefix("netstandard") {
            return Ok(TargetRuntime::NetStandard(AssemblyVersion::parse(version)?));
        }
        if let Some(version) = moniker.strip_prefix("netcoreapp") {
            return Ok(TargetRuntime::NetCore(AssemblyVersion::parse(version)?));
        }
        if let Some(version) = moniker.strip_prefix("net") {
            // Dotted monikers are the modern runtime, dotless ones the legacy framework
            let version = version.split('-').next().unwrap_or_default();
            if version.contains('.') {
                return Ok(TargetRuntime::NetCore(AssemblyVersion::parse(version)?));
            }

            let digits: Vec<u16> = version
                .chars()
                .map(|c| {
                    c.to_digit(10)
                        .and_then(|d| u16::try_from(d).ok())
                        .ok_or_else(|| malformed_error!("Invalid framework moniker '{}'", value))
                })
                .collect::<Result<_>>()?;
            return match digits.as_slice() {
                [major, minor] => Ok(TargetRuntime::NetFramework(AssemblyVersion::new(
                    *major, *minor, 0, 0,
                ))),
                [major, minor, build] => Ok(TargetRuntime::NetFramework(AssemblyVersion::new(
                    *major, *minor, *build, 0,
                ))),
                _ => Err(malformed_error!("Invalid framework moniker '{}'", value)),
            };
        }

        Err(malformed_error!("Unknown target framework '{}'", value))
    }

    /// Identity of the base library an assembly targeting this runtime defines its
    /// fundamental types in.
    #[must_use]
    pub fn corlib_identity(&self) -> AssemblyIdentity {
        let version = self.version();
        let (name, version, token) = match self {
            TargetRuntime::NetFramework(_) if version.major < 4 => {
                ("mscorlib", AssemblyVersion::new(2, 0, 0, 0), ECMA_TOKEN)
            }
            TargetRuntime::NetFramework(_) => {
                ("mscorlib", AssemblyVersion::new(4, 0, 0, 0), ECMA_TOKEN)
            }
            TargetRuntime::NetCore(_) => (
                "System.Private.CoreLib",
                AssemblyVersion::new(version.major, version.minor, 0, 0),
                CORE_TOKEN,
            ),
            TargetRuntime::NetStandard(_) => (
                "netstandard",
                AssemblyVersion::new(version.major, version.minor, 0, 0),
                STANDARD_TOKEN,
            ),
        };

        AssemblyIdentity {
            name: name.to_string(),
            version,
            culture: None,
            strong_name: Some(Identity::Token(u64::from_le_bytes(token))),
            processor_architecture: None,
        }
    }
}

impl Default for TargetRuntime {
    fn default() -> Self {
        TargetRuntime::NetCore(AssemblyVersion::new(8, 0, 0, 0))
    }
}

impl fmt::Display for TargetRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let framework = match self {
            TargetRuntime::NetFramework(_) => ".NETFramework",
            TargetRuntime::NetCore(_) => ".NETCoreApp",
            TargetRuntime::NetStandard(_) => ".NETStandard",
        };
        let version = self.version();
        write!(f, "{},Version=v{}.{}", framework, version.major, version.minor)?;
        if version.build != 0 {
            write!(f, ".{}", version.build)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parse_attribute_form() {
        assert_eq!(
            TargetRuntime::parse(".NETFramework,Version=v4.7.2").unwrap(),
            TargetRuntime::NetFramework(AssemblyVersion::new(4, 7, 2, 0))
        );
        assert_eq!(
            TargetRuntime::parse(".NETStandard,Version=v2.0").unwrap(),
            TargetRuntime::NetStandard(AssemblyVersion::new(2, 0, 0, 0))
        );
        assert!(TargetRuntime::parse(".NETPortable,Version=v4.5").is_err());
        assert!(TargetRuntime::parse(".NETCoreApp,Profile=Client").is_err());
    }

    #[test]
    fn parse_monikers() {
        assert_eq!(
            TargetRuntime::parse("net8.0").unwrap(),
            TargetRuntime::NetCore(AssemblyVersion::new(8, 0, 0, 0))
        );
        assert_eq!(
            TargetRuntime::parse("netcoreapp3.1").unwrap(),
            TargetRuntime::NetCore(AssemblyVersion::new(3, 1, 0, 0))
        );
        assert_eq!(
            TargetRuntime::parse("net48").unwrap(),
            TargetRuntime::NetFramework(AssemblyVersion::new(4, 8, 0, 0))
        );
        assert_eq!(
            TargetRuntime::parse("netstandard2.1").unwrap(),
            TargetRuntime::NetStandard(AssemblyVersion::new(2, 1, 0, 0))
        );
        assert!(TargetRuntime::parse("net4x").is_err());
    }

    #[test]
    fn display_round_trips() {
        for runtime in [
            TargetRuntime::NetFramework(AssemblyVersion::new(4, 7, 2, 0)),
            TargetRuntime::NetCore(AssemblyVersion::new(8, 0, 0, 0)),
        ] {
            assert_eq!(TargetRuntime::parse(&runtime.to_string()).unwrap(), runtime);
        }
    }

    #[test]
    fn corlib_identities() {
        let legacy = TargetRuntime::NetFramework(AssemblyVersion::new(3, 5, 0, 0));
        let identity = legacy.corlib_identity();
        assert_eq!(identity.name, "mscorlib");
        assert_eq!(identity.version, AssemblyVersion::new(2, 0, 0, 0));
        assert_eq!(
            identity.public_key_token(),
            Some([0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89])
        );

        let core = TargetRuntime::NetCore(AssemblyVersion::new(8, 0, 0, 0)).corlib_identity();
        assert_eq!(core.name, "System.Private.CoreLib");
        assert_eq!(core.display_name(), "System.Private.CoreLib, Version=8.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e");
    }

    #[test]
    fn runtime_kinds() {
        assert_eq!(RuntimeKind::iter().count(), 3);
        assert_eq!("NetCore".parse::<RuntimeKind>().unwrap(), RuntimeKind::NetCore);
        assert_eq!(RuntimeKind::NetFramework.to_string(), "NetFramework");
    }
}
