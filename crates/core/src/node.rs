use nmt_dag_types::{
    cid_from_namespaced_hash, Cid, NamespacedHash, NamespacedSha256, NAMESPACED_HASH_SIZE,
};

use crate::Block;

/// The wire size of an inner node block: one domain byte plus two namespaced
/// hashes.
pub const INNER_NODE_SIZE: usize = 1 + 2 * NAMESPACED_HASH_SIZE;

/// A decoded tree node block.
///
/// The two shapes a block can take are closed: a block is either a leaf
/// carrying a namespaced share or an inner node carrying the namespaced
/// hashes of its two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NmtNode {
    /// A leaf block.
    Leaf(LeafNode),
    /// An inner block.
    Inner(InnerNode),
}

/// A leaf block holding `namespace || share`.
///
/// The identifier is absent only for the placeholder produced from a
/// zero-length block, the store's stand-in for unknown content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    cid: Option<Cid>,
    data: Vec<u8>,
}

/// An inner block holding the namespaced hashes of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerNode {
    cid: Cid,
    left: NamespacedHash,
    right: NamespacedHash,
}

impl LeafNode {
    /// Creates a leaf node from its identifier and namespaced payload.
    pub fn new(cid: Option<Cid>, data: Vec<u8>) -> Self {
        Self { cid, data }
    }

    /// The namespaced payload, `namespace || share`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the node, returning the namespaced payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl InnerNode {
    /// Creates an inner node from its identifier and child hashes.
    pub fn new(cid: Cid, left: NamespacedHash, right: NamespacedHash) -> Self {
        Self { cid, left, right }
    }

    /// The namespaced hash of the left child.
    pub fn left(&self) -> &NamespacedHash {
        &self.left
    }

    /// The namespaced hash of the right child.
    pub fn right(&self) -> &NamespacedHash {
        &self.right
    }
}

impl NmtNode {
    /// Parses a raw block into a typed node.
    ///
    /// A zero-length payload decodes to the placeholder leaf. Otherwise the
    /// leading byte must be one of the two domain separators; inner blocks
    /// are additionally length-checked against [`INNER_NODE_SIZE`].
    pub fn decode(block: &Block) -> anyhow::Result<Self> {
        let data = &block.data;

        if data.is_empty() {
            return Ok(NmtNode::Leaf(LeafNode::new(None, Vec::new())));
        }

        match data[0] {
            b if b == NamespacedSha256::LEAF_PREFIX => Ok(NmtNode::Leaf(LeafNode::new(
                Some(block.cid),
                data[1..].to_vec(),
            ))),

            b if b == NamespacedSha256::INNER_PREFIX => {
                anyhow::ensure!(
                    data.len() == INNER_NODE_SIZE,
                    "malformed inner node block of {} bytes, want {INNER_NODE_SIZE}",
                    data.len()
                );

                let left = NamespacedHash::from_raw(&data[1..1 + NAMESPACED_HASH_SIZE])?;
                let right = NamespacedHash::from_raw(&data[1 + NAMESPACED_HASH_SIZE..])?;

                Ok(NmtNode::Inner(InnerNode::new(block.cid, left, right)))
            }

            b => anyhow::bail!(
                "expected first byte of block to be either the leaf or inner node prefix ({:#04x}, {:#04x}), got: {b:#04x}",
                NamespacedSha256::LEAF_PREFIX,
                NamespacedSha256::INNER_PREFIX,
            ),
        }
    }

    /// Re-materializes the exact on-wire bytes of the node.
    pub fn raw_bytes(&self) -> Vec<u8> {
        match self {
            NmtNode::Leaf(leaf) => {
                let mut out = Vec::with_capacity(1 + leaf.data.len());

                out.push(NamespacedSha256::LEAF_PREFIX);
                out.extend_from_slice(&leaf.data);

                out
            }

            NmtNode::Inner(inner) => {
                let mut out = Vec::with_capacity(INNER_NODE_SIZE);

                out.push(NamespacedSha256::INNER_PREFIX);
                out.extend_from_slice(inner.left.as_ref());
                out.extend_from_slice(inner.right.as_ref());

                out
            }
        }
    }

    /// The node's identifier, when defined.
    pub fn cid(&self) -> Option<&Cid> {
        match self {
            NmtNode::Leaf(leaf) => leaf.cid.as_ref(),
            NmtNode::Inner(inner) => Some(&inner.cid),
        }
    }

    /// Resolves the identifier of the child selected by a one-step path
    /// label.
    ///
    /// Child identifiers are minted here, and only here, from the stored
    /// namespaced hashes so they always match the global identifier scheme.
    pub fn resolve_link(&self, step: &str) -> anyhow::Result<Cid> {
        match self {
            NmtNode::Inner(inner) => match step {
                "0" => cid_from_namespaced_hash(inner.left.as_ref()),
                "1" => cid_from_namespaced_hash(inner.right.as_ref()),
                _ => anyhow::bail!(
                    "invalid path step {step:?} for an inner node, want \"0\" or \"1\""
                ),
            },

            NmtNode::Leaf(_) => anyhow::bail!("leaf nodes have no children to resolve"),
        }
    }

    /// The identifiers this node links to: both children for an inner node,
    /// the node itself for a leaf.
    pub fn links(&self) -> Vec<Cid> {
        match self {
            NmtNode::Leaf(leaf) => leaf.cid.into_iter().collect(),
            NmtNode::Inner(inner) => {
                vec![
                    cid_from_namespaced_hash(inner.left.as_ref()).unwrap_or_else(|e| {
                        panic!("inner node holds a malformed left hash: {e}")
                    }),
                    cid_from_namespaced_hash(inner.right.as_ref()).unwrap_or_else(|e| {
                        panic!("inner node holds a malformed right hash: {e}")
                    }),
                ]
            }
        }
    }

    /// Packs the node into a block, re-encoding its wire bytes.
    ///
    /// Fails on the placeholder leaf, which has no identifier to address the
    /// block by.
    pub fn to_block(&self) -> anyhow::Result<Block> {
        let cid = self
            .cid()
            .ok_or_else(|| anyhow::anyhow!("cannot build a block from a node with no identifier"))?;

        Ok(Block::new(*cid, self.raw_bytes()))
    }
}
