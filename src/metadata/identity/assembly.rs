//! Assembly names and versions.
//!
//! An assembly is named by its simple name, a four-part version, a culture for satellite
//! assemblies, an optional strong name and an optional processor architecture. The
//! identity is what module references point at, what the module cache is keyed by and
//! what locators search for.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_resolver::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//!
//! let mscorlib = AssemblyIdentity::parse(
//!     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
//! )?;
//! assert_eq!(mscorlib.name, "mscorlib");
//! assert_eq!(mscorlib.version, AssemblyVersion::new(4, 0, 0, 0));
//! assert!(mscorlib.is_strong_named());
//! # Ok::<(), dotscope_resolver::Error>(())
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use strum::{Display, EnumString};

use crate::{metadata::identity::Identity, Error, Result};

/// The name an assembly is referenced and located by.
///
/// Equality and hashing cover the name (case-sensitive), version, culture and processor
/// architecture, but not the strong name: a reference carrying the full public key and
/// one carrying only its token name the same assembly. Compare
/// [`AssemblyIdentity::public_key_token`] to tell strong names apart.
#[derive(Debug, Clone)]
pub struct AssemblyIdentity {
    /// Simple name, e.g. `System.Runtime`
    pub name: String,
    /// Assembly version, [`AssemblyVersion::UNKNOWN`] when not given
    pub version: AssemblyVersion,
    /// Culture of a satellite assembly, `None` when neutral
    pub culture: Option<String>,
    /// Public key or public key token
    pub strong_name: Option<Identity>,
    /// Target architecture, if the name pins one
    pub processor_architecture: Option<ProcessorArchitecture>,
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.culture == other.culture
            && self.processor_architecture == other.processor_architecture
    }
}

impl Eq for AssemblyIdentity {}

impl Hash for AssemblyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.culture.hash(state);
        self.processor_architecture.hash(state);
    }
}

impl AssemblyIdentity {
    /// Create an identity from its parts.
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: Option<String>,
        strong_name: Option<Identity>,
        processor_architecture: Option<ProcessorArchitecture>,
    ) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture,
            strong_name,
            processor_architecture,
        }
    }

    /// Create a culture-neutral identity without strong name.
    pub fn simple(name: impl Into<String>, version: AssemblyVersion) -> Self {
        Self::new(name, version, None, None, None)
    }

    /// Parse a display name such as
    /// `System.Xml, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089`.
    ///
    /// Keys are matched case-insensitively. `Culture=neutral` and `PublicKeyToken=null`
    /// mean absent. Keys the model has no field for, like `Retargetable`, are skipped.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for an empty name, a component without `=`, or a
    /// value that does not parse.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut components = display_name.split(',').map(str::trim);
        let name = components.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity::simple(name, AssemblyVersion::UNKNOWN);
        for component in components.filter(|component| !component.is_empty()) {
            let Some((key, value)) = component.split_once('=') else {
                return Err(malformed_error!("Expected 'key=value' in '{}'", component));
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = value.parse()?,
                "culture" if value.eq_ignore_ascii_case("neutral") || value.is_empty() => {
                    identity.culture = None;
                }
                "culture" => identity.culture = Some(value.to_string()),
                "publickeytoken" if value.eq_ignore_ascii_case("null") || value.is_empty() => {
                    identity.strong_name = None;
                }
                "publickeytoken" => {
                    let token = decode_hex(value)?;
                    if token.len() != 8 {
                        return Err(malformed_error!(
                            "PublicKeyToken must be 8 bytes, got {} from '{}'",
                            token.len(),
                            value
                        ));
                    }
                    identity.strong_name = Some(Identity::from(&token, false)?);
                }
                "publickey" => identity.strong_name = Some(Identity::from(&decode_hex(value)?, true)?),
                "processorarchitecture" => {
                    let architecture = value.parse::<ProcessorArchitecture>().map_err(|_| {
                        malformed_error!("Unknown processor architecture '{}'", value)
                    })?;
                    identity.processor_architecture = Some(architecture);
                }
                _ => {}
            }
        }

        Ok(identity)
    }

    /// The canonical display name. Key identities are shown by their derived token.
    #[must_use]
    pub fn display_name(&self) -> String {
        let token = self
            .public_key_token()
            .map_or_else(|| "null".to_string(), hex::encode);
        let mut display = format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            token
        );

        if let Some(architecture) = self.processor_architecture {
            display.push_str(&format!(", ProcessorArchitecture={}", architecture));
        }
        display
    }

    /// The public key token in display byte order, if the identity carries a strong name.
    #[must_use]
    pub fn public_key_token(&self) -> Option<[u8; 8]> {
        self.strong_name.as_ref().map(Identity::token_bytes)
    }

    /// Returns `true` if the identity carries a public key or token.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.strong_name.is_some()
    }

    /// Returns `true` if the identity has no culture.
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }

    /// Returns `true` if an assembly with this identity can stand in for `required`.
    ///
    /// Names compare case-insensitively, as the runtime loader does. Cultures must be
    /// equal and the version must be [compatible](AssemblyVersion::is_compatible_with).
    #[must_use]
    pub fn satisfies(&self, required: &AssemblyIdentity) -> bool {
        self.name.eq_ignore_ascii_case(&required.name)
            && self.culture == required.culture
            && self.version.is_compatible_with(&required.version)
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|error| malformed_error!("Invalid hex '{}': {}", value, error))
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Four-part assembly version, ordered component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major component
    pub major: u16,
    /// Minor component
    pub minor: u16,
    /// Build component
    pub build: u16,
    /// Revision component
    pub revision: u16,
}

impl AssemblyVersion {
    /// `0.0.0.0`, standing for "any version".
    pub const UNKNOWN: Self = Self::new(0, 0, 0, 0);

    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Returns `true` for [`AssemblyVersion::UNKNOWN`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.build == 0 && self.revision == 0
    }

    /// Returns `true` if this version can serve a request for `required`: the same major
    /// version and not older. Anything serves an unknown request.
    ///
    /// ```rust
    /// use dotscope_resolver::metadata::identity::AssemblyVersion;
    ///
    /// let v4_0 = AssemblyVersion::new(4, 0, 0, 0);
    /// let v4_5 = AssemblyVersion::new(4, 5, 0, 0);
    ///
    /// assert!(v4_5.is_compatible_with(&v4_0));
    /// assert!(!v4_0.is_compatible_with(&v4_5));
    /// assert!(!AssemblyVersion::new(5, 0, 0, 0).is_compatible_with(&v4_0));
    /// assert!(v4_0.is_compatible_with(&AssemblyVersion::UNKNOWN));
    /// ```
    #[must_use]
    pub fn is_compatible_with(&self, required: &AssemblyVersion) -> bool {
        required.is_unknown() || (self.major == required.major && self >= required)
    }

    /// Returns `true` if this version is a better fallback for `target` than `other`.
    ///
    /// A version sharing the target's major version beats one that does not; between two
    /// of the same kind, the nearer major version wins, then the higher version.
    #[must_use]
    pub fn is_closer_to(&self, other: &AssemblyVersion, target: &AssemblyVersion) -> bool {
        let distance = |version: &AssemblyVersion| version.major.abs_diff(target.major);
        match distance(self).cmp(&distance(other)) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self > other,
        }
    }

    /// Parse one to four dot-separated components, missing ones default to 0.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for more than four components or one that is not a
    /// `u16`.
    pub fn parse(value: &str) -> Result<Self> {
        let mut components = [0u16; 4];
        let parts: Vec<&str> = value.trim().split('.').collect();
        if parts.len() > components.len() {
            return Err(malformed_error!("Invalid version format: {}", value));
        }

        for (component, part) in components.iter_mut().zip(&parts) {
            *component = part
                .parse()
                .map_err(|_| malformed_error!("Invalid version component '{}' in {}", part, value))?;
        }

        let [major, minor, build, revision] = components;
        Ok(Self::new(major, minor, build, revision))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.revision)
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Processor architecture an assembly name may pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ProcessorArchitecture {
    /// Architecture neutral IL
    MSIL,
    /// 32-bit x86
    #[strum(to_string = "x86")]
    X86,
    /// Itanium
    IA64,
    /// x86-64, also written `x64`
    #[strum(to_string = "AMD64", serialize = "x64")]
    AMD64,
    /// 32-bit ARM
    ARM,
    /// 64-bit ARM
    ARM64,
}
