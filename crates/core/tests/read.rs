use std::time::Duration;

use nmt_dag::{get_leaf_data, Block, BlockStore, MemoryStore, Nmt, NodeAdder, SHARE_SIZE};
use nmt_dag_types::{cid_from_namespaced_hash, Cid, NamespaceId, NAMESPACE_SIZE};
use rand::Rng as _;

/// Generates `total` random namespaced leaves sorted by namespace, the shape
/// the tree requires on push.
fn random_namespaced_leaves(total: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();

    let mut namespaces = vec![[0u8; NAMESPACE_SIZE]; total];

    for namespace in &mut namespaces {
        rng.fill(&mut namespace[..]);
    }

    namespaces.sort();

    namespaces
        .into_iter()
        .map(|namespace| {
            let mut leaf = vec![0u8; NAMESPACE_SIZE + SHARE_SIZE];

            leaf[..NAMESPACE_SIZE].copy_from_slice(&namespace);
            rng.fill(&mut leaf[NAMESPACE_SIZE..]);

            leaf
        })
        .collect()
}

/// Builds a tree over the provided leaves, committing every block to the
/// store and returning the root identifier.
async fn commit_tree<S: BlockStore>(store: &S, leaves: &[Vec<u8>]) -> Cid {
    let mut tree = Nmt::with_visitor(NodeAdder::new(store));

    for leaf in leaves {
        let namespace: NamespaceId = leaf[..NAMESPACE_SIZE].try_into().unwrap();

        tree.push(namespace, &leaf[NAMESPACE_SIZE..]).unwrap();
    }

    let root = tree.root();

    let mut batch = tree.into_visitor().into_batch();

    assert_eq!(batch.len(), 2 * leaves.len() - 1);

    batch.commit().await.unwrap();

    cid_from_namespaced_hash(root.as_ref()).unwrap()
}

#[tokio::test]
async fn sixteen_leaf_round_trip() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(16);

    let root = commit_tree(&store, &leaves).await;

    for (i, leaf) in leaves.iter().enumerate() {
        let data = get_leaf_data(&store, &root, i as u32, leaves.len() as u32)
            .await
            .unwrap();

        assert_eq!(&data, leaf, "leaf {i}");
    }
}

#[tokio::test]
async fn single_leaf_tree_round_trip() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(1);

    let root = commit_tree(&store, &leaves).await;

    let data = get_leaf_data(&store, &root, 0, 1).await.unwrap();

    assert_eq!(&data, &leaves[0]);
}

#[tokio::test]
async fn zero_total_is_an_invalid_argument() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(2);

    let root = commit_tree(&store, &leaves).await;

    let e = get_leaf_data(&store, &root, 0, 0).await.unwrap_err();

    assert!(e.to_string().contains("invalid argument"), "{e}");
}

#[tokio::test]
async fn out_of_range_index_is_an_invalid_argument() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(4);

    let root = commit_tree(&store, &leaves).await;

    let e = get_leaf_data(&store, &root, 4, 4).await.unwrap_err();

    assert!(e.to_string().contains("invalid argument"), "{e}");
}

#[tokio::test]
async fn inconsistent_total_is_a_structure_error() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(16);

    let root = commit_tree(&store, &leaves).await;

    // a doubled leaf count lengthens the path by one level, so the walk hits
    // a leaf with a step remaining
    let e = get_leaf_data(&store, &root, 0, 32).await.unwrap_err();

    assert!(e.to_string().contains("inconsistent"), "{e}");
}

#[tokio::test]
async fn missing_blocks_propagate_the_store_error() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(4);

    let root = commit_tree(&store, &leaves).await;

    let empty = MemoryStore::new();
    let e = get_leaf_data(&empty, &root, 0, 4).await.unwrap_err();

    assert!(e.to_string().contains("not found"), "{e}");
}

/// A store whose fetches never resolve.
#[derive(Debug, Default, Clone)]
struct HangingStore;

impl BlockStore for HangingStore {
    async fn get(&self, _cid: &Cid) -> anyhow::Result<Vec<u8>> {
        std::future::pending().await
    }

    async fn put(&self, _block: Block) -> anyhow::Result<()> {
        Ok(())
    }

    async fn has(&self, _cid: &Cid) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn stalled_retrievals_are_abandoned_on_timeout() {
    let store = MemoryStore::new();
    let leaves = random_namespaced_leaves(4);

    let root = commit_tree(&store, &leaves).await;

    let hanging = HangingStore;
    let walk = get_leaf_data(&hanging, &root, 0, 4);

    tokio::time::timeout(Duration::from_millis(20), walk)
        .await
        .unwrap_err();
}
