use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use nmt_dag_types::{register_defaults, verify_block, Cid};

/// A raw block paired with its content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The content identifier of the block.
    pub cid: Cid,
    /// The raw on-wire bytes.
    pub data: Vec<u8>,
}

impl Block {
    /// Creates a block from its identifier and raw bytes.
    pub fn new(cid: Cid, data: Vec<u8>) -> Self {
        Self { cid, data }
    }
}

/// A content-addressed block store.
///
/// Blocks are immutable once committed and self-verifying: implementations
/// must check on `get` that the returned content re-hashes to the requested
/// identifier, and reject mismatched blocks on `put`. Callers bound slow
/// fetches by dropping the future, typically through `tokio::time::timeout`.
#[allow(async_fn_in_trait)]
pub trait BlockStore {
    /// Returns the verified content of the block at `cid`.
    ///
    /// A missing block is an error naming the identifier.
    async fn get(&self, cid: &Cid) -> anyhow::Result<Vec<u8>>;

    /// Writes a block, verifying it against its identifier first.
    async fn put(&self, block: Block) -> anyhow::Result<()>;

    /// Returns `true` if the block at `cid` is present.
    async fn has(&self, cid: &Cid) -> anyhow::Result<bool>;
}

/// An in-memory block store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    blocks: Arc<Mutex<HashMap<Cid, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates an empty store, installing the default multihash codecs.
    pub fn new() -> Self {
        register_defaults();

        Self {
            blocks: Default::default(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for MemoryStore {
    async fn get(&self, cid: &Cid) -> anyhow::Result<Vec<u8>> {
        let data = self
            .blocks
            .lock()
            .map_err(|e| anyhow::anyhow!("failed to lock block store: {e}"))?
            .get(cid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("block {cid} not found"))?;

        verify_block(cid, &data)?;

        Ok(data)
    }

    async fn put(&self, block: Block) -> anyhow::Result<()> {
        verify_block(&block.cid, &block.data)?;

        self.blocks
            .lock()
            .map_err(|e| anyhow::anyhow!("failed to lock block store: {e}"))?
            .insert(block.cid, block.data);

        Ok(())
    }

    async fn has(&self, cid: &Cid) -> anyhow::Result<bool> {
        Ok(self
            .blocks
            .lock()
            .map_err(|e| anyhow::anyhow!("failed to lock block store: {e}"))?
            .contains_key(cid))
    }
}

/// A write batch coalescing block puts into a single commit.
///
/// Blocks accumulate in submission order, children before parents when fed by
/// a tree visitor, and reach the store on [`BlockBatch::commit`]. The batch
/// is kept intact when a write fails so the caller may retry; committed
/// blocks are content addressed, so a retry is idempotent.
pub struct BlockBatch<'a, S> {
    store: &'a S,
    pending: Vec<Block>,
}

impl<'a, S: BlockStore> BlockBatch<'a, S> {
    /// Creates an empty batch writing into `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pending: Vec::new(),
        }
    }

    /// Creates an empty batch preallocated for `capacity` blocks.
    pub fn with_capacity(store: &'a S, capacity: usize) -> Self {
        Self {
            store,
            pending: Vec::with_capacity(capacity),
        }
    }

    /// Queues a block for the next commit.
    pub fn add(&mut self, block: Block) {
        self.pending.push(block);
    }

    /// The number of queued blocks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no blocks are queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Writes every queued block to the store, in submission order.
    ///
    /// The first failing write aborts the commit and surfaces its error.
    pub async fn commit(&mut self) -> anyhow::Result<()> {
        tracing::debug!("committing {} blocks", self.pending.len());

        for block in &self.pending {
            self.store.put(block.clone()).await?;
        }

        self.pending.clear();

        Ok(())
    }
}
