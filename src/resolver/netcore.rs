use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use log::{debug, trace};

use crate::{
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        runtime::{RuntimeKind, TargetRuntime},
    },
    resolver::locator::{probe_all, probe_directory, AssemblyLocator, SearchDirectories},
};

/// Name of the shared framework holding the base class library
const SHARED_FRAMEWORK: &str = "Microsoft.NETCore.App";

/// One installed version folder of the shared framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkInstall {
    /// The numeric version parsed from the folder name
    pub version: AssemblyVersion,
    /// `true` if the folder name carries a pre-release suffix (`9.0.0-preview.1`)
    pub prerelease: bool,
    /// The version folder
    pub path: PathBuf,
}

impl FrameworkInstall {
    /// Parse a version folder; returns `None` if its name is not a version.
    #[must_use]
    pub fn from_folder(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (numeric, suffix) = match name.split_once('-') {
            Some((numeric, suffix)) => (numeric, Some(suffix)),
            None => (name, None),
        };
        let version = AssemblyVersion::parse(numeric).ok()?;
        Some(FrameworkInstall {
            version,
            prerelease: suffix.is_some(),
            path,
        })
    }
}

/// Chooses which installed shared-framework version serves a target runtime version.
pub trait FrameworkVersionPolicy: Send + Sync + fmt::Debug {
    /// Pick one of `installed` for `target`, or none.
    fn select<'a>(
        &self,
        target: &AssemblyVersion,
        installed: &'a [FrameworkInstall],
    ) -> Option<&'a FrameworkInstall>;
}

/// Prefer the highest installed version compatible with the target (same major, not
/// older). Without one, fall back to the installed version closest to the target.
/// Releases beat pre-releases of the same version.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatestCompatible;

impl FrameworkVersionPolicy for LatestCompatible {
    fn select<'a>(
        &self,
        target: &AssemblyVersion,
        installed: &'a [FrameworkInstall],
    ) -> Option<&'a FrameworkInstall> {
        let compatible = installed
            .iter()
            .filter(|install| install.version.is_compatible_with(target))
            .max_by_key(|install| (install.version, !install.prerelease));
        if compatible.is_some() {
            return compatible;
        }

        installed.iter().fold(None, |best, install| match best {
            None => Some(install),
            Some(best) if install.version.is_closer_to(&best.version, target) => Some(install),
            Some(best) if install.version == best.version && best.prerelease && !install.prerelease => {
                Some(install)
            }
            best => best,
        })
    }
}

/// Only accept an installed version equal to the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct Exact;

impl FrameworkVersionPolicy for Exact {
    fn select<'a>(
        &self,
        target: &AssemblyVersion,
        installed: &'a [FrameworkInstall],
    ) -> Option<&'a FrameworkInstall> {
        installed
            .iter()
            .filter(|install| install.version == *target)
            .max_by_key(|install| !install.prerelease)
    }
}

/// Locator for .NET Core and .NET 5+.
///
/// Probes the caller's search directories in order, then the shared framework directory
/// `<dotnet_root>/shared/Microsoft.NETCore.App/<version>/`. The installation root comes
/// from [`NetCoreLocator::with_dotnet_root`], else the `DOTNET_ROOT` environment variable,
/// else the platform's default install locations. The version folder is picked once, by
/// the configured [`FrameworkVersionPolicy`].
///
/// Matching is by file name only.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{
///     metadata::{identity::{AssemblyIdentity, AssemblyVersion}, runtime::TargetRuntime},
///     resolver::{AssemblyLocator, NetCoreLocator},
/// };
///
/// let root = tempfile::tempdir()?;
/// let shared = root.path().join("shared/Microsoft.NETCore.App/8.0.4");
/// std::fs::create_dir_all(&shared)?;
/// std::fs::write(shared.join("System.Runtime.dll"), b"MZ")?;
///
/// let locator = NetCoreLocator::new(TargetRuntime::NetCore(AssemblyVersion::new(8, 0, 0, 0)))
///     .with_dotnet_root(root.path());
/// let runtime = AssemblyIdentity::parse("System.Runtime, Version=8.0.0.0")?;
/// assert_eq!(locator.locate(&runtime), Some(shared.join("System.Runtime.dll")));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct NetCoreLocator {
    runtime: TargetRuntime,
    directories: SearchDirectories,
    dotnet_root: Option<PathBuf>,
    policy: Arc<dyn FrameworkVersionPolicy>,
    framework_directory: OnceLock<Option<PathBuf>>,
}

impl NetCoreLocator {
    /// Create a locator using the default installation root and [`LatestCompatible`].
    #[must_use]
    pub fn new(runtime: TargetRuntime) -> Self {
        NetCoreLocator {
            runtime,
            directories: SearchDirectories::new(),
            dotnet_root: None,
            policy: Arc::new(LatestCompatible),
            framework_directory: OnceLock::new(),
        }
    }

    /// Append a search directory.
    #[must_use]
    pub fn with_search_directory(self, directory: impl Into<PathBuf>) -> Self {
        self.directories.push(directory);
        self
    }

    /// Use an explicit installation root instead of `DOTNET_ROOT` or the defaults.
    #[must_use]
    pub fn with_dotnet_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dotnet_root = Some(root.into());
        self.framework_directory = OnceLock::new();
        self
    }

    /// Replace the version folder policy.
    #[must_use]
    pub fn with_version_policy(mut self, policy: impl FrameworkVersionPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self.framework_directory = OnceLock::new();
        self
    }

    /// Candidate installation roots, in the order they are tried.
    fn dotnet_roots(&self) -> Vec<PathBuf> {
        if let Some(root) = &self.dotnet_root {
            return vec![root.clone()];
        }

        if let Some(root) = env::var_os("DOTNET_ROOT").filter(|root| !root.is_empty()) {
            return vec![PathBuf::from(root)];
        }

        default_roots()
    }

    /// The version the policy matches against. Non-core targets accept any version.
    fn target_version(&self) -> AssemblyVersion {
        match self.runtime.kind() {
            RuntimeKind::NetCore => self.runtime.version(),
            RuntimeKind::NetFramework | RuntimeKind::NetStandard => AssemblyVersion::UNKNOWN,
        }
    }

    /// All installed shared-framework versions under `root`.
    fn installed(root: &Path) -> Vec<FrameworkInstall> {
        let shared = root.join("shared").join(SHARED_FRAMEWORK);
        let Ok(entries) = fs::read_dir(&shared) else {
            trace!("No shared framework at {}", shared.display());
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(FrameworkInstall::from_folder)
            .collect()
    }

    /// The selected shared-framework version folder, computed on first use.
    pub fn framework_directory(&self) -> Option<&Path> {
        self.framework_directory
            .get_or_init(|| {
                let target = self.target_version();
                for root in self.dotnet_roots() {
                    let installed = Self::installed(&root);
                    if let Some(install) = self.policy.select(&target, &installed) {
                        debug!(
                            "Using shared framework {} for {}",
                            install.path.display(),
                            self.runtime
                        );
                        return Some(install.path.clone());
                    }
                }
                debug!("No shared framework matches {}", self.runtime);
                None
            })
            .as_deref()
    }
}

impl AssemblyLocator for NetCoreLocator {
    fn locate(&self, identity: &AssemblyIdentity) -> Option<PathBuf> {
        probe_all(&self.directories, identity).or_else(|| {
            self.framework_directory()
                .and_then(|directory| probe_directory(directory, identity))
        })
    }

    fn search_directories(&self) -> &SearchDirectories {
        &self.directories
    }

    fn runtime(&self) -> TargetRuntime {
        self.runtime
    }
}

#[cfg(windows)]
fn default_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for variable in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Some(base) = env::var_os(variable) {
            roots.push(PathBuf::from(base).join("dotnet"));
        }
    }
    roots.push(PathBuf::from(r"C:\Program Files\dotnet"));
    roots
}

#[cfg(target_os = "macos")]
fn default_roots() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/local/share/dotnet"),
        PathBuf::from("/opt/homebrew/share/dotnet"),
    ]
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_roots() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from("/usr/share/dotnet"),
        PathBuf::from("/usr/lib/dotnet"),
        PathBuf::from("/usr/local/share/dotnet"),
        PathBuf::from("/opt/dotnet"),
    ];
    if let Some(home) = env::var_os("HOME") {
        roots.push(PathBuf::from(home).join(".dotnet"));
    }
    roots
}
