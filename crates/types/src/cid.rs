use cid::CidGeneric;
use multihash::Multihash;

use crate::{NamespacedHash, NAMESPACED_HASH_SIZE};

/// The codec registered for leaf and inner nodes of a namespaced Merkle tree.
pub const NMT_CODEC: u64 = 0x7700;

/// The registered name of [`NMT_CODEC`].
pub const NMT_CODEC_NAME: &str = "nmt-node";

/// The multihash code of the namespace-flagged SHA-256 scheme.
pub const SHA256_NAMESPACE_FLAGGED: u64 = 0x7701;

/// The registered name of [`SHA256_NAMESPACE_FLAGGED`].
pub const SHA256_NAMESPACE_FLAGGED_NAME: &str = "sha2-256-namespace8-flagged";

/// A content identifier sized for namespaced hash digests.
pub type Cid = CidGeneric<NAMESPACED_HASH_SIZE>;

/// Wraps a namespaced hash into a content identifier.
///
/// The bytes become the digest of a [`SHA256_NAMESPACE_FLAGGED`] multihash
/// paired with the [`NMT_CODEC`] codec. Any length other than
/// [`NAMESPACED_HASH_SIZE`] is rejected.
pub fn cid_from_namespaced_hash(hash: &[u8]) -> anyhow::Result<Cid> {
    anyhow::ensure!(
        hash.len() == NAMESPACED_HASH_SIZE,
        "invalid namespaced hash length, got: {}, want: {}",
        hash.len(),
        NAMESPACED_HASH_SIZE
    );

    let mh = Multihash::wrap(SHA256_NAMESPACE_FLAGGED, hash)
        .map_err(|e| anyhow::anyhow!("failed to wrap namespaced hash into a multihash: {e}"))?;

    Ok(Cid::new_v1(NMT_CODEC, mh))
}

/// Wraps a namespaced hash into a content identifier, aborting on failure.
///
/// Reserved for callers whose input length is correct by construction, such
/// as tree visitor callbacks; a failure there is a programming error rather
/// than a runtime fault.
pub fn must_cid_from_namespaced_hash(hash: &[u8]) -> Cid {
    cid_from_namespaced_hash(hash)
        .unwrap_or_else(|e| panic!("malformed hash: {e}, codec: {SHA256_NAMESPACE_FLAGGED_NAME}"))
}

/// Extracts the namespaced hash embedded in a content identifier.
pub fn namespaced_hash_from_cid(cid: &Cid) -> anyhow::Result<NamespacedHash> {
    anyhow::ensure!(
        cid.codec() == NMT_CODEC,
        "unexpected codec {:#06x}, want {NMT_CODEC:#06x} ({NMT_CODEC_NAME})",
        cid.codec()
    );
    anyhow::ensure!(
        cid.hash().code() == SHA256_NAMESPACE_FLAGGED,
        "unexpected multihash code {:#06x}, want {SHA256_NAMESPACE_FLAGGED:#06x} ({SHA256_NAMESPACE_FLAGGED_NAME})",
        cid.hash().code()
    );

    NamespacedHash::from_raw(cid.hash().digest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{namespace_from_u64, NamespacedSha256};

    #[test]
    fn cid_embeds_the_namespaced_hash() {
        let hash = NamespacedSha256::hash_leaf(&namespace_from_u64(3), b"share");

        let cid = cid_from_namespaced_hash(hash.as_ref()).unwrap();

        assert_eq!(cid.codec(), NMT_CODEC);
        assert_eq!(cid.hash().code(), SHA256_NAMESPACE_FLAGGED);
        assert_eq!(cid.hash().size() as usize, NAMESPACED_HASH_SIZE);
        assert_eq!(cid.hash().digest(), hash.as_ref());

        let extracted = namespaced_hash_from_cid(&cid).unwrap();

        assert_eq!(extracted, hash);
    }

    #[test]
    fn cid_rejects_the_wrong_length() {
        let short = [0u8; NAMESPACED_HASH_SIZE - 1];
        let e = cid_from_namespaced_hash(&short).unwrap_err();

        assert!(e.to_string().contains("invalid namespaced hash length"));
    }

    #[test]
    #[should_panic(expected = "malformed hash")]
    fn must_cid_aborts_on_the_wrong_length() {
        must_cid_from_namespaced_hash(&[0u8; 3]);
    }
}
