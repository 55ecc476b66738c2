use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// The namespace identifier byte-length.
pub const NAMESPACE_SIZE: usize = 8;

/// The underlying digest byte-length (SHA-256).
pub const HASH_SIZE: usize = 32;

/// The byte-length of a namespaced hash: `min || max || digest`.
pub const NAMESPACED_HASH_SIZE: usize = 2 * NAMESPACE_SIZE + HASH_SIZE;

/// A fixed-width byte tag classifying a leaf; leaves are sorted by namespace.
pub type NamespaceId = [u8; NAMESPACE_SIZE];

/// Builds a big-endian [`NamespaceId`] from an integer.
pub const fn namespace_from_u64(id: u64) -> NamespaceId {
    id.to_be_bytes()
}

/// A tree node hash carrying the namespace range of its subtree.
///
/// Layout: `min-namespace || max-namespace || digest`. For a leaf both
/// namespaces equal the leaf's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespacedHash([u8; NAMESPACED_HASH_SIZE]);

impl NamespacedHash {
    /// Reads a namespaced hash from raw bytes, rejecting any other length.
    pub fn from_raw(bytes: &[u8]) -> anyhow::Result<Self> {
        anyhow::ensure!(
            bytes.len() == NAMESPACED_HASH_SIZE,
            "invalid namespaced hash length, got: {}, want: {}",
            bytes.len(),
            NAMESPACED_HASH_SIZE
        );

        let mut out = [0u8; NAMESPACED_HASH_SIZE];

        out.copy_from_slice(bytes);

        Ok(Self(out))
    }

    /// The smallest namespace present in the subtree under this node.
    pub fn min_namespace(&self) -> NamespaceId {
        let mut out = [0u8; NAMESPACE_SIZE];

        out.copy_from_slice(&self.0[..NAMESPACE_SIZE]);

        out
    }

    /// The largest namespace present in the subtree under this node.
    pub fn max_namespace(&self) -> NamespaceId {
        let mut out = [0u8; NAMESPACE_SIZE];

        out.copy_from_slice(&self.0[NAMESPACE_SIZE..2 * NAMESPACE_SIZE]);

        out
    }

    /// The digest portion of the hash.
    pub fn digest(&self) -> &[u8] {
        &self.0[2 * NAMESPACE_SIZE..]
    }

    /// Returns the hash as a fixed-size array.
    pub const fn to_array(self) -> [u8; NAMESPACED_HASH_SIZE] {
        self.0
    }

    /// Returns the hash as an owned byte vector.
    pub fn to_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for NamespacedHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; NAMESPACED_HASH_SIZE]> for NamespacedHash {
    fn from(bytes: [u8; NAMESPACED_HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Serialize for NamespacedHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for NamespacedHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = Base64.decode(s).map_err(serde::de::Error::custom)?;

        Self::from_raw(&bytes).map_err(serde::de::Error::custom)
    }
}

/// The namespaced SHA-256 hasher.
///
/// Node kinds are domain separated by a one-byte prefix so a leaf block can
/// never collide with an inner block.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamespacedSha256;

impl NamespacedSha256 {
    /// Domain separator prepended to leaf payloads before hashing.
    pub const LEAF_PREFIX: u8 = 0x00;

    /// Domain separator prepended to inner payloads before hashing.
    pub const INNER_PREFIX: u8 = 0x01;

    /// Hashes a leaf, producing `ns || ns || sha256(leaf-prefix || ns || share)`.
    pub fn hash_leaf(namespace: &NamespaceId, share: &[u8]) -> NamespacedHash {
        let mut hasher = Sha256::new();

        hasher.update([Self::LEAF_PREFIX]);
        hasher.update(namespace);
        hasher.update(share);

        let mut out = [0u8; NAMESPACED_HASH_SIZE];

        out[..NAMESPACE_SIZE].copy_from_slice(namespace);
        out[NAMESPACE_SIZE..2 * NAMESPACE_SIZE].copy_from_slice(namespace);
        out[2 * NAMESPACE_SIZE..].copy_from_slice(hasher.finalize().as_slice());

        NamespacedHash(out)
    }

    /// Merges two children into their parent hash.
    ///
    /// The parent range is `[min(l, r), max(l, r)]` and its digest commits to
    /// the full namespaced hashes of both children, so the ranges are binding.
    pub fn hash_nodes(left: &NamespacedHash, right: &NamespacedHash) -> NamespacedHash {
        let mut hasher = Sha256::new();

        hasher.update([Self::INNER_PREFIX]);
        hasher.update(left);
        hasher.update(right);

        let min = left.min_namespace().min(right.min_namespace());
        let max = left.max_namespace().max(right.max_namespace());

        let mut out = [0u8; NAMESPACED_HASH_SIZE];

        out[..NAMESPACE_SIZE].copy_from_slice(&min);
        out[NAMESPACE_SIZE..2 * NAMESPACE_SIZE].copy_from_slice(&max);
        out[2 * NAMESPACE_SIZE..].copy_from_slice(hasher.finalize().as_slice());

        NamespacedHash(out)
    }

    /// The root of a tree with no leaves.
    pub fn empty_root() -> NamespacedHash {
        let mut out = [0u8; NAMESPACED_HASH_SIZE];

        out[2 * NAMESPACE_SIZE..].copy_from_slice(Sha256::new().finalize().as_slice());

        NamespacedHash(out)
    }
}
