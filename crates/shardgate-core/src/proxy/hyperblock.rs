use crate::types::{
    Block, Hyperblock, MiniBlock, NotarizedBlock, Transaction, PEER_BLOCK_TYPE,
};

/// Assembles one metachain block and the shard blocks it notarizes into a
/// single logical hyperblock.
///
/// Each transaction appears in exactly one hyperblock: by default a
/// transaction belongs to the block of its destination shard (where it is
/// finalized). With `notarized_at_source` set, attribution flips to the
/// source shard instead. Peer miniblocks carry validator state changes, not
/// user transactions, so they are never surfaced.
pub struct HyperblockBuilder {
    notarized_at_source: bool,
    meta_block: Option<Block>,
    shard_blocks: Vec<Block>,
}

impl HyperblockBuilder {
    #[must_use]
    pub fn new(notarized_at_source: bool) -> Self {
        Self { notarized_at_source, meta_block: None, shard_blocks: Vec::new() }
    }

    pub fn add_meta_block(&mut self, block: Block) {
        self.meta_block = Some(block);
    }

    pub fn add_shard_block(&mut self, block: Block) {
        self.shard_blocks.push(block);
    }

    /// Builds the hyperblock. Returns `None` when no metachain block was
    /// added; shard blocks alone cannot anchor a hyperblock.
    #[must_use]
    pub fn build(self) -> Option<Hyperblock> {
        let meta = self.meta_block?;

        let mut transactions: Vec<Transaction> = Vec::new();
        let mut notarized: Vec<NotarizedBlock> = Vec::new();

        for block in &self.shard_blocks {
            transactions.extend(owned_transactions(block, self.notarized_at_source));
            notarized.push(NotarizedBlock {
                hash: block.hash.clone(),
                nonce: block.nonce,
                round: block.round,
                shard: block.shard,
                root_hash: block.state_root_hash.clone(),
                mini_block_hashes: block.miniblocks.iter().map(|mb| mb.hash.clone()).collect(),
                altered_accounts: block.altered_accounts.clone().unwrap_or_default(),
            });
        }

        transactions.extend(owned_transactions(&meta, self.notarized_at_source));

        Some(Hyperblock {
            hash: meta.hash,
            prev_block_hash: meta.prev_block_hash,
            state_root_hash: meta.state_root_hash,
            nonce: meta.nonce,
            round: meta.round,
            epoch: meta.epoch,
            timestamp: meta.timestamp,
            status: meta.status,
            num_txs: transactions.len() as u64,
            shard_blocks: notarized,
            transactions,
        })
    }
}

/// Returns the transactions this block owns under the chosen attribution
/// rule. A miniblock belongs to the block of its destination shard, or its
/// source shard when `notarized_at_source` is set.
fn owned_transactions(block: &Block, notarized_at_source: bool) -> Vec<Transaction> {
    block
        .miniblocks
        .iter()
        .filter(|mb| mb.block_type != PEER_BLOCK_TYPE)
        .filter(|mb| owning_shard(mb, notarized_at_source) == block.shard)
        .flat_map(|mb| mb.transactions.iter().cloned())
        .collect()
}

fn owning_shard(miniblock: &MiniBlock, notarized_at_source: bool) -> u32 {
    if notarized_at_source {
        miniblock.source_shard
    } else {
        miniblock.destination_shard
    }
}
