//! Shared utilities.
//!
//! - [`SingleFlight`] - per-key single execution gate backing all caches of this crate
//! - [`compute_sha1`] - SHA-1 digest used for public key token derivation

mod synchronization;

pub(crate) use synchronization::unshare;
pub use synchronization::{SharedResult, SingleFlight};

use sha1::{Digest, Sha1};

/// Computes the SHA-1 hash of input bytes.
///
/// **Security Warning**: SHA-1 is cryptographically broken and should not be used
/// for security purposes. It is used here because .NET derives public key tokens from
/// the SHA-1 digest of an assembly's public key.
///
/// # Arguments
///
/// * `data` - The input bytes to hash
///
/// # Returns
///
/// A 20-byte vector containing the SHA-1 hash.
#[must_use]
pub fn compute_sha1(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
