//! Order-sensitive hash builder for structural type identity.
//!
//! Components are folded in with an FNV-1a step followed by a finalizer avalanche, so
//! `("System", "String")` and `("String", "System")` land apart where an XOR fold would
//! collide. [`crate::resolver::SignatureComparer`] only mixes in what takes part in its
//! equality, which keeps hashes consistent with equality under every comparison flag.
//!
//! ```rust
//! use dotscope_resolver::metadata::typesystem::TypeSignatureHash;
//!
//! let string = TypeSignatureHash::new().add_tag(0x01).add_component("System").add_component("String");
//! let object = TypeSignatureHash::new().add_tag(0x01).add_component("System").add_component("Object");
//! assert_ne!(string.finalize(), object.finalize());
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;
const AVALANCHE: u64 = 0xff51_afd7_ed55_8ccd;

/// Builder folding tags, components and nested hashes into one `u64`.
#[derive(Debug, Clone, Copy)]
pub struct TypeSignatureHash(u64);

impl TypeSignatureHash {
    /// Start from the FNV offset basis.
    #[must_use]
    pub fn new() -> Self {
        TypeSignatureHash(FNV_OFFSET_BASIS)
    }

    fn mix(self, value: u64) -> Self {
        let mut state = (self.0 ^ value).wrapping_mul(FNV_PRIME);
        state ^= state >> 33;
        state = state.wrapping_mul(AVALANCHE);
        TypeSignatureHash(state ^ (state >> 33))
    }

    /// Fold in a structural tag, e.g. the element type of a signature node.
    #[must_use]
    pub fn add_tag(self, tag: u8) -> Self {
        self.mix(u64::from(tag))
    }

    /// Fold in any hashable value, such as a name or an index.
    #[must_use]
    pub fn add_component<T: Hash + ?Sized>(self, component: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.mix(hasher.finish())
    }

    /// Fold in a finished hash, e.g. of a generic argument.
    #[must_use]
    pub fn add_hash(self, hash: u64) -> Self {
        self.mix(hash)
    }

    /// The accumulated hash.
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.0
    }
}

impl Default for TypeSignatureHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(namespace: &str, name: &str) -> u64 {
        TypeSignatureHash::new()
            .add_tag(0x01)
            .add_component(namespace)
            .add_component(name)
            .finalize()
    }

    #[test]
    fn deterministic() {
        assert_eq!(named("System", "String"), named("System", "String"));
    }

    #[test]
    fn order_and_tags_matter() {
        assert_ne!(named("System", "String"), named("String", "System"));

        let class = TypeSignatureHash::new().add_tag(0x12).add_hash(named("System", "Guid"));
        let value = TypeSignatureHash::new().add_tag(0x11).add_hash(named("System", "Guid"));
        assert_ne!(class.finalize(), value.finalize());
    }

    #[test]
    fn similar_names_spread() {
        let hashes = [
            named("System", "String"),
            named("System", "Object"),
            named("System.Collections", "String"),
            named("System", "StringBuilder"),
            named("", "SystemString"),
        ];

        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
