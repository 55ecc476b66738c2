use std::collections::VecDeque;

use nmt_dag_types::{must_cid_from_namespaced_hash, NamespaceId, NamespacedHash, NAMESPACE_SIZE};

use crate::{
    BlockBatch, BlockStore, InnerNode, LeafNode, NmtNode, Nmt, NodeVisitor, SHARE_SIZE,
};

/// Builds the typed node for a visited hash.
///
/// The hash was produced by the tree moments ago, so identifier construction
/// cannot fail for a correct tree; a failure aborts. The same holds for the
/// arity, which must be binary.
fn node_from_visit(hash: &NamespacedHash, children: &[&[u8]]) -> NmtNode {
    let cid = must_cid_from_namespaced_hash(hash.as_ref());

    match children {
        [leaf] => NmtNode::Leaf(LeafNode::new(Some(cid), leaf.to_vec())),

        [left, right] => {
            let left = NamespacedHash::from_raw(left)
                .unwrap_or_else(|e| panic!("malformed left child hash from the tree: {e}"));
            let right = NamespacedHash::from_raw(right)
                .unwrap_or_else(|e| panic!("malformed right child hash from the tree: {e}"));

            NmtNode::Inner(InnerNode::new(cid, left, right))
        }

        _ => panic!("expected a binary tree"),
    }
}

/// A visitor collecting typed nodes in memory.
///
/// The tree emits in post-order while consumers expect the root first, so
/// each node is prepended as it arrives; the final sequence starts at the
/// root and ends at the leftmost leaf.
#[derive(Debug, Default)]
pub struct NodeCollector {
    nodes: VecDeque<NmtNode>,
}

impl NodeCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collector preallocated for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: VecDeque::with_capacity(capacity),
        }
    }

    /// Consumes the collector, returning the nodes root-first.
    pub fn into_nodes(self) -> Vec<NmtNode> {
        self.nodes.into()
    }
}

impl NodeVisitor for NodeCollector {
    fn visit(&mut self, hash: &NamespacedHash, children: &[&[u8]]) {
        self.nodes.push_front(node_from_visit(hash, children));
    }
}

/// A visitor forwarding typed nodes into a write batch.
///
/// Attach it to a tree, compute the root, then take the batch back and commit
/// it to persist every produced block.
pub struct NodeAdder<'a, S> {
    batch: BlockBatch<'a, S>,
}

impl<'a, S: BlockStore> NodeAdder<'a, S> {
    /// Creates an adder batching writes into `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            batch: BlockBatch::new(store),
        }
    }

    /// Creates an adder over an existing batch.
    pub fn from_batch(batch: BlockBatch<'a, S>) -> Self {
        Self { batch }
    }

    /// Consumes the adder, handing back the batch for committing.
    pub fn into_batch(self) -> BlockBatch<'a, S> {
        self.batch
    }
}

impl<S: BlockStore> NodeVisitor for NodeAdder<'_, S> {
    fn visit(&mut self, hash: &NamespacedHash, children: &[&[u8]]) {
        let node = node_from_visit(hash, children);
        let block = node
            .to_block()
            .unwrap_or_else(|e| panic!("visited node has no identifier: {e}"));

        self.batch.add(block);
    }
}

/// Parses a stream of concatenated namespaced shares into the node sequence
/// of its tree, root-first.
///
/// The input carries `NAMESPACE_SIZE + SHARE_SIZE` bytes per share with no
/// framing; a trailing remainder is a parse error, as is any namespace
/// ordering violation.
pub fn parse_raw_shares(data: &[u8]) -> anyhow::Result<Vec<NmtNode>> {
    const RAW_SHARE_SIZE: usize = NAMESPACE_SIZE + SHARE_SIZE;

    anyhow::ensure!(
        data.len() % RAW_SHARE_SIZE == 0,
        "raw share stream of {} bytes is not a multiple of the namespaced share size {RAW_SHARE_SIZE}",
        data.len()
    );

    let mut tree = Nmt::with_visitor(NodeCollector::with_capacity(
        2 * data.len() / RAW_SHARE_SIZE,
    ));

    for share in data.chunks_exact(RAW_SHARE_SIZE) {
        let namespace: NamespaceId = share[..NAMESPACE_SIZE].try_into()?;

        tree.push(namespace, &share[NAMESPACE_SIZE..])?;
    }

    tree.root();

    Ok(tree.into_visitor().into_nodes())
}

#[cfg(test)]
mod tests {
    use nmt_dag_types::{cid_from_namespaced_hash, namespace_from_u64};

    use super::*;

    fn raw_shares(n: u64) -> Vec<u8> {
        let mut data = Vec::new();

        for i in 0..n {
            data.extend_from_slice(&namespace_from_u64(i));
            data.extend_from_slice(&[i as u8; SHARE_SIZE]);
        }

        data
    }

    #[test]
    fn collector_is_root_first() {
        let mut tree = Nmt::with_visitor(NodeCollector::new());

        for i in 0..8u64 {
            tree.push(namespace_from_u64(i), &[i as u8; 4]).unwrap();
        }

        let root = tree.root();
        let nodes = tree.into_visitor().into_nodes();

        assert_eq!(nodes.len(), 15);
        assert_eq!(
            nodes[0].cid(),
            Some(&cid_from_namespaced_hash(root.as_ref()).unwrap())
        );
        assert!(matches!(nodes[0], NmtNode::Inner(_)));
        assert!(matches!(nodes[14], NmtNode::Leaf(_)));
    }

    #[test]
    fn parsed_shares_produce_the_full_tree() {
        let nodes = parse_raw_shares(&raw_shares(4)).unwrap();

        assert_eq!(nodes.len(), 7);

        let leaves = nodes
            .iter()
            .filter(|n| matches!(n, NmtNode::Leaf(_)))
            .count();

        assert_eq!(leaves, 4);
    }

    #[test]
    fn ragged_input_is_rejected() {
        let mut data = raw_shares(2);

        data.push(0);

        let e = parse_raw_shares(&data).unwrap_err();

        assert!(e.to_string().contains("not a multiple"));
    }
}
