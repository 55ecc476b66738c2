use nmt_dag_types::{NamespaceId, NamespacedHash, NamespacedSha256, NAMESPACE_SIZE};

/// A callback fired for every node hash produced while a tree computes its
/// root.
///
/// A single child slice carries a leaf's namespaced payload; two slices carry
/// the left and right namespaced hashes of an inner node. Any other arity is
/// a programming error and must abort: the tree is binary.
pub trait NodeVisitor {
    /// Receives a produced node hash along with its children bytes.
    fn visit(&mut self, hash: &NamespacedHash, children: &[&[u8]]);
}

impl NodeVisitor for () {
    fn visit(&mut self, _hash: &NamespacedHash, _children: &[&[u8]]) {}
}

/// A namespaced Merkle tree over `namespace || share` leaves.
///
/// Leaves are pushed in ascending namespace order; the root is computed on
/// demand and visits every node hash in post-order, children before parents.
pub struct Nmt<V = ()> {
    leaves: Vec<Vec<u8>>,
    max_namespace: Option<NamespaceId>,
    root: Option<NamespacedHash>,
    visitor: V,
}

impl Nmt<()> {
    /// Creates a tree with no visitor attached.
    pub fn new() -> Self {
        Self::with_visitor(())
    }
}

impl Default for Nmt<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: NodeVisitor> Nmt<V> {
    /// Creates a tree forwarding every produced node to `visitor`.
    pub fn with_visitor(visitor: V) -> Self {
        Self {
            leaves: Vec::new(),
            max_namespace: None,
            root: None,
            visitor,
        }
    }

    /// Appends a leaf, enforcing ascending namespace order.
    pub fn push(&mut self, namespace: NamespaceId, share: &[u8]) -> anyhow::Result<()> {
        if let Some(max) = self.max_namespace {
            anyhow::ensure!(
                namespace >= max,
                "leaves must be pushed in ascending namespace order, got {namespace:x?} after {max:x?}"
            );
        }

        let mut leaf = Vec::with_capacity(NAMESPACE_SIZE + share.len());

        leaf.extend_from_slice(&namespace);
        leaf.extend_from_slice(share);

        self.leaves.push(leaf);
        self.max_namespace = Some(namespace);
        self.root = None;

        Ok(())
    }

    /// The number of leaves pushed so far.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns `true` if no leaves were pushed.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Computes and caches the tree root, visiting every produced node.
    pub fn root(&mut self) -> NamespacedHash {
        if let Some(root) = self.root {
            return root;
        }

        let root = if self.leaves.is_empty() {
            NamespacedSha256::empty_root()
        } else {
            self.compute_root(0, self.leaves.len())
        };

        self.root = Some(root);

        root
    }

    /// Consumes the tree, handing back the visitor.
    pub fn into_visitor(self) -> V {
        self.visitor
    }

    fn compute_root(&mut self, start: usize, end: usize) -> NamespacedHash {
        if end - start == 1 {
            let leaf = self.leaves[start].clone();

            let namespace: NamespaceId = leaf[..NAMESPACE_SIZE]
                .try_into()
                .unwrap_or_else(|_| unreachable!("leaves always start with a namespace"));

            let hash = NamespacedSha256::hash_leaf(&namespace, &leaf[NAMESPACE_SIZE..]);

            self.visitor.visit(&hash, &[leaf.as_slice()]);

            return hash;
        }

        let split = start + split_point(end - start);

        let left = self.compute_root(start, split);
        let right = self.compute_root(split, end);
        let hash = NamespacedSha256::hash_nodes(&left, &right);

        self.visitor.visit(&hash, &[left.as_ref(), right.as_ref()]);

        hash
    }
}

/// The largest power of two strictly below `n`, splitting a subtree so that
/// power-of-two leaf counts produce a complete binary tree.
fn split_point(n: usize) -> usize {
    n.next_power_of_two() >> 1
}

#[cfg(test)]
mod tests {
    use nmt_dag_types::namespace_from_u64;

    use super::*;

    struct Counter {
        leaves: usize,
        inners: usize,
        last: Option<NamespacedHash>,
    }

    impl NodeVisitor for Counter {
        fn visit(&mut self, hash: &NamespacedHash, children: &[&[u8]]) {
            match children.len() {
                1 => self.leaves += 1,
                2 => self.inners += 1,
                _ => panic!("expected a binary tree"),
            }

            self.last = Some(*hash);
        }
    }

    fn filled(n: u64) -> Nmt<Counter> {
        let mut tree = Nmt::with_visitor(Counter {
            leaves: 0,
            inners: 0,
            last: None,
        });

        for i in 0..n {
            tree.push(namespace_from_u64(i), &[i as u8; 4]).unwrap();
        }

        tree
    }

    #[test]
    fn visits_every_node_once_and_the_root_last() {
        let mut tree = filled(16);
        let root = tree.root();

        let counter = tree.into_visitor();

        assert_eq!(counter.leaves, 16);
        assert_eq!(counter.inners, 15);
        assert_eq!(counter.last, Some(root));
    }

    #[test]
    fn root_is_cached_between_pushes() {
        let mut tree = filled(4);

        let first = tree.root();
        assert_eq!(tree.root(), first);

        tree.push(namespace_from_u64(9), &[9; 4]).unwrap();

        assert_ne!(tree.root(), first);
    }

    #[test]
    fn out_of_order_pushes_are_rejected() {
        let mut tree = Nmt::new();

        tree.push(namespace_from_u64(2), b"a").unwrap();

        assert!(tree.push(namespace_from_u64(1), b"b").is_err());
        assert!(tree.push(namespace_from_u64(2), b"c").is_ok());
    }

    #[test]
    fn empty_tree_root_is_stable() {
        assert_eq!(Nmt::new().root(), NamespacedSha256::empty_root());
    }

    #[test]
    fn split_points() {
        let cases = [(2, 1), (3, 2), (5, 4), (8, 4), (16, 8)];

        for (n, expected) in cases {
            assert_eq!(split_point(n), expected, "n = {n}");
        }
    }
}
