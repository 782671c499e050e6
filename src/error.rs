use std::sync::Arc;

use thiserror::Error;

/// Creates an [`Error::Malformed`] carrying the source location it was raised at.
///
/// ```rust, ignore
/// return Err(malformed_error!("Invalid version component: {}", part));
/// ```
macro_rules! malformed_error {
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Errors raised while locating, mapping and loading assemblies, or parsing identities.
///
/// An unresolvable reference is not an error: [`crate::MetadataResolver`] answers `None`,
/// since many references in foreign binaries point at assemblies that are simply not
/// present. Failures met during a resolution walk are recorded in
/// [`crate::metadata::diagnostics::Diagnostics`] instead of being returned.
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::{metadata::identity::AssemblyIdentity, Error};
///
/// match AssemblyIdentity::parse("mscorlib, Version=4.0.0.0.1") {
///     Err(Error::Malformed { message, .. }) => assert!(message.contains("version")),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An identity string, version folder or file region could not be parsed.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// What was wrong with the input
        message: String,
        /// Source file that detected the problem
        file: &'static str,
        /// Source line that detected the problem
        line: u32,
    },

    /// The reader does not support this file.
    #[error("This file type is not supported")]
    NotSupported,

    /// A located file has no content.
    #[error("File is empty")]
    Empty,

    /// Opening or mapping a file failed.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Misconfiguration and other failures without a dedicated variant.
    #[error("{0}")]
    Error(String),

    /// No probed location holds the requested assembly. Carries its display name.
    #[error("Could not locate assembly - {0}")]
    AssemblyNotFound(String),

    /// A load performed for several waiting callers failed.
    ///
    /// The cause is shared between all callers that waited on the same in-flight load.
    #[error("Failed to load assembly '{assembly}' - {source}")]
    LoadFailed {
        /// Display name of the assembly or path that failed to load
        assembly: String,
        /// The underlying cause
        #[source]
        source: Arc<Error>,
    },
}
