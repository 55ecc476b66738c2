use nmt_dag_types::Cid;

use crate::{leaf_path, Block, BlockStore, NmtNode};

/// Retrieves the namespaced payload of the leaf at `index` in the tree rooted
/// at `root`, walking the store one block per tree level.
///
/// `total` is the number of leaves in the tree. Fetches proceed strictly
/// sequentially along the path; to bound the walk, wrap the returned future
/// in a timeout and drop it on expiry. Store errors, including identifier
/// verification failures, propagate unchanged.
pub async fn get_leaf_data<S: BlockStore>(
    store: &S,
    root: &Cid,
    index: u32,
    total: u32,
) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        total > 0,
        "invalid argument: cannot retrieve a leaf from a tree with no leaves"
    );

    let path = leaf_path(index, total)?;
    let mut current = *root;

    for (depth, step) in path.iter().enumerate() {
        let node = fetch(store, &current).await?;

        tracing::trace!("descending {step} at depth {depth} of {}", path.len());

        current = match node {
            NmtNode::Inner(_) => node.resolve_link(step.as_str())?,
            NmtNode::Leaf(_) => anyhow::bail!(
                "reached a leaf {} levels above the bottom: the leaf count is inconsistent with the tree",
                path.len() - depth
            ),
        };
    }

    match fetch(store, &current).await? {
        NmtNode::Leaf(leaf) => Ok(leaf.into_data()),
        NmtNode::Inner(_) => {
            anyhow::bail!("expected a leaf at the end of the path, found an inner node")
        }
    }
}

async fn fetch<S: BlockStore>(store: &S, cid: &Cid) -> anyhow::Result<NmtNode> {
    let data = store.get(cid).await?;

    NmtNode::decode(&Block::new(*cid, data))
}
