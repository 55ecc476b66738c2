use std::sync::{OnceLock, RwLock};

use hashbrown::HashMap;

use crate::{
    Cid, NamespaceId, NamespacedHash, NamespacedSha256, NAMESPACED_HASH_SIZE, NAMESPACE_SIZE,
    SHA256_NAMESPACE_FLAGGED, SHA256_NAMESPACE_FLAGGED_NAME,
};

/// A multihash function computing a digest over a raw block.
pub type MultihashFn = fn(&[u8]) -> anyhow::Result<Vec<u8>>;

struct RegisteredCodec {
    name: &'static str,
    digest_len: usize,
    f: MultihashFn,
}

fn registry() -> &'static RwLock<HashMap<u64, RegisteredCodec>> {
    static REGISTRY: OnceLock<RwLock<HashMap<u64, RegisteredCodec>>> = OnceLock::new();

    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a multihash function for the provided code.
///
/// Registration is idempotent: re-registering the same code with identical
/// parameters is a no-op, while a conflicting re-registration aborts the
/// process because it would silently fork the identifier scheme.
pub fn register_namespaced_codec(code: u64, name: &'static str, digest_len: usize, f: MultihashFn) {
    let mut registry = registry()
        .write()
        .unwrap_or_else(|e| panic!("multihash registry lock poisoned: {e}"));

    if let Some(existing) = registry.get(&code) {
        let conflict = existing.name != name || existing.digest_len != digest_len;
        let registered = (existing.name, existing.digest_len);

        // release the lock before aborting so other threads see a usable map
        drop(registry);

        if conflict {
            panic!("multihash code {code:#06x} is already registered as {registered:?}");
        }

        return;
    }

    registry.insert(
        code,
        RegisteredCodec {
            name,
            digest_len,
            f,
        },
    );
}

/// Registers the default namespace-flagged SHA-256 scheme.
///
/// Safe to call any number of times; stores invoke it on construction.
pub fn register_defaults() {
    register_namespaced_codec(
        SHA256_NAMESPACE_FLAGGED,
        SHA256_NAMESPACE_FLAGGED_NAME,
        NAMESPACED_HASH_SIZE,
        sum_sha256_namespace_flagged,
    );
}

/// Computes the digest of `data` under the multihash function registered for
/// `code`.
pub fn multihash_digest(code: u64, data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let registry = registry()
        .read()
        .map_err(|e| anyhow::anyhow!("multihash registry lock poisoned: {e}"))?;

    let codec = registry
        .get(&code)
        .ok_or_else(|| anyhow::anyhow!("multihash code {code:#06x} is not registered"))?;

    (codec.f)(data)
}

/// Checks that a block's content re-hashes to the digest embedded in its
/// identifier.
pub fn verify_block(cid: &Cid, data: &[u8]) -> anyhow::Result<()> {
    let digest = multihash_digest(cid.hash().code(), data)?;

    anyhow::ensure!(
        digest == cid.hash().digest(),
        "block {cid} does not re-hash to its identifier"
    );

    Ok(())
}

/// The digest function behind [`SHA256_NAMESPACE_FLAGGED`].
///
/// The store hands over whole blocks, so the node kind is recovered from the
/// leading domain-separation byte: the leaf prefix routes the remainder
/// through the leaf hash, anything else through the inner hash.
fn sum_sha256_namespace_flagged(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(!data.is_empty(), "cannot hash an empty block");

    if data[0] == NamespacedSha256::LEAF_PREFIX {
        let namespaced = &data[1..];

        anyhow::ensure!(
            namespaced.len() >= NAMESPACE_SIZE,
            "leaf block of {} bytes is too short to carry a namespace",
            namespaced.len()
        );

        let namespace: NamespaceId = namespaced[..NAMESPACE_SIZE].try_into()?;

        return Ok(NamespacedSha256::hash_leaf(&namespace, &namespaced[NAMESPACE_SIZE..]).to_vec());
    }

    let nodes = &data[1..];

    anyhow::ensure!(
        nodes.len() == 2 * NAMESPACED_HASH_SIZE,
        "inner block of {} bytes does not hold two namespaced hashes",
        nodes.len()
    );

    let left = NamespacedHash::from_raw(&nodes[..NAMESPACED_HASH_SIZE])?;
    let right = NamespacedHash::from_raw(&nodes[NAMESPACED_HASH_SIZE..])?;

    Ok(NamespacedSha256::hash_nodes(&left, &right).to_vec())
}
