//! Strong-name identity of .NET assemblies.
//!
//! Assembly references carry either the full public key of the referenced assembly or an
//! 8-byte *public key token* derived from it. Resolution has to treat both forms as the same
//! identity, which requires deriving the token from a key: the token is the last 8 bytes of
//! the SHA-1 digest of the public key, in reverse order, and is stored here as a
//! little-endian `u64` so that its byte order matches the display form
//! (`b77a5c561934e089` is the token of the ECMA standard key used by `mscorlib`).

use crate::{utils::compute_sha1, Result};

/// Strong-name identity representation for .NET assemblies.
///
/// # Variants
///
/// - [`Identity::PubKey`]: Complete public key data of a strong-named assembly
/// - [`Identity::Token`]: 8-byte token derived from a public key
/// - [`Identity::EcmaKey`]: 16-byte ECMA standard key used by framework assemblies
///
/// # Examples
///
/// ```rust
/// use dotscope_resolver::metadata::identity::Identity;
///
/// let token = Identity::from(&[0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89], false)?;
/// assert_eq!(token.to_token(), 0x89e0_3419_565c_7ab7);
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Complete RSA public key data for strong-named assemblies.
    PubKey(Vec<u8>),

    /// Compact 8-byte token derived from hashing the public key.
    ///
    /// Stored as a little-endian `u64` of the token bytes in display order.
    Token(u64),

    /// ECMA standard 16-byte key for framework assemblies.
    EcmaKey(Vec<u8>),
}

impl Identity {
    /// Create an [`Identity`] from raw binary data.
    ///
    /// # Arguments
    /// * `data` - Raw binary data from assembly metadata
    /// * `is_pub` - `true` for public key data, `false` for token data
    ///
    /// # Detection Logic
    /// - **`is_pub=false`**: [`Identity::Token`] from the first 8 bytes
    /// - **16 bytes + `is_pub=true`**: [`Identity::EcmaKey`]
    /// - **Other sizes + `is_pub=true`**: [`Identity::PubKey`]
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if token data is shorter than 8 bytes.
    pub fn from(data: &[u8], is_pub: bool) -> Result<Self> {
        Ok(if is_pub {
            match data.len() {
                16 => Identity::EcmaKey(data.to_vec()),
                _ => Identity::PubKey(data.to_vec()),
            }
        } else {
            let Some(bytes) = data.get(..8) else {
                return Err(malformed_error!(
                    "Public key token requires 8 bytes, got {}",
                    data.len()
                ));
            };
            let mut token = [0u8; 8];
            token.copy_from_slice(bytes);
            Identity::Token(u64::from_le_bytes(token))
        })
    }

    /// Returns the public key token of this identity.
    ///
    /// For key identities the token is derived from the SHA-1 digest of the key data;
    /// for token identities the stored token is returned unchanged.
    #[must_use]
    pub fn to_token(&self) -> u64 {
        match self {
            Identity::PubKey(data) | Identity::EcmaKey(data) => Self::compute_token(data),
            Identity::Token(token) => *token,
        }
    }

    /// Returns the public key token bytes in display order.
    #[must_use]
    pub fn token_bytes(&self) -> [u8; 8] {
        self.to_token().to_le_bytes()
    }

    fn compute_token(data: &[u8]) -> u64 {
        let hash = compute_sha1(data);
        let mut token = [0u8; 8];
        for (dst, src) in token.iter_mut().zip(hash.iter().rev()) {
            *dst = *src;
        }
        u64::from_le_bytes(token)
    }
}
