#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::path::Path;
use std::sync::Arc;

use nmt_dag::{Block, BlockStore};
use nmt_dag_types::{register_defaults, verify_block, Cid};
use rocksdb::{Options, DB};

/// A RocksDB block store.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Opens a block store at the provided path, creating it if missing and
    /// installing the default multihash codecs.
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        register_defaults();

        let mut opts = Options::default();

        opts.create_if_missing(true);

        let db = DB::open(&opts, path)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl BlockStore for RocksStore {
    async fn get(&self, cid: &Cid) -> anyhow::Result<Vec<u8>> {
        let data = self
            .db
            .get(cid.to_bytes())?
            .ok_or_else(|| anyhow::anyhow!("block {cid} not found"))?;

        verify_block(cid, &data)?;

        Ok(data)
    }

    async fn put(&self, block: Block) -> anyhow::Result<()> {
        verify_block(&block.cid, &block.data)?;

        self.db.put(block.cid.to_bytes(), &block.data)?;

        Ok(())
    }

    async fn has(&self, cid: &Cid) -> anyhow::Result<bool> {
        Ok(self.db.get(cid.to_bytes())?.is_some())
    }
}
