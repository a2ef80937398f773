use log::warn;

use crate::dict::Dict;
use crate::pool::{BlockHandle, BlockPool};

/// What a chain write actually did. `bytes_stored` can fall short of the
/// request when the pool runs dry mid-allocation: the blocks that were
/// secured stay in the chain and the caller records the truncated length
/// before reporting the failure. There is deliberately no rollback.
#[derive(Debug, PartialEq)]
#[must_use]
pub(crate) struct WriteOutcome {
    pub bytes_stored: usize,
    pub exhausted: bool,
}

impl WriteOutcome {
    fn complete(bytes_stored: usize) -> Self {
        Self {
            bytes_stored,
            exhausted: false,
        }
    }

    fn truncated(bytes_stored: usize) -> Self {
        Self {
            bytes_stored,
            exhausted: true,
        }
    }
}

/// Maps a file's identity to the ordered chain of pool blocks holding its
/// content. A file has exactly one entry here from creation to deletion;
/// every block handle in any chain is owned by that chain alone.
pub(crate) struct ChainIndex {
    chains: Dict<u64, Vec<BlockHandle>>,
}

impl ChainIndex {
    pub fn new() -> Self {
        Self {
            chains: Dict::new(),
        }
    }

    /// Backs a freshly created empty file with a single zeroed block.
    /// `None` means the pool is exhausted and nothing was recorded.
    pub fn create_empty(&mut self, pool: &mut BlockPool, id: u64) -> Option<()> {
        let handle = pool.allocate()?;
        let displaced = self.chains.upsert(id, vec![handle]);
        debug_assert!(displaced.is_none(), "file {} already had a chain", id);
        Some(())
    }

    /// Full overwrite: releases the current chain, then allocates
    /// `ceil(len / block_size)` fresh blocks (minimum one, so an empty file
    /// still holds a block) and copies `content` across them. The last block
    /// keeps its zero fill past the content's end.
    pub fn replace(&mut self, pool: &mut BlockPool, id: u64, content: &[u8]) -> WriteOutcome {
        self.release(pool, id);

        let block_size = pool.block_size();
        let blocks_needed = std::cmp::max(1, (content.len() + block_size - 1) / block_size);

        let mut chain = Vec::with_capacity(blocks_needed);
        let mut offset = 0;
        for _ in 0..blocks_needed {
            let handle = match pool.allocate() {
                Some(handle) => handle,
                None => {
                    warn!(
                        "pool exhausted overwriting file {}: {} of {} bytes stored",
                        id,
                        offset,
                        content.len()
                    );
                    self.chains.upsert(id, chain);
                    return WriteOutcome::truncated(offset);
                }
            };
            let take = std::cmp::min(block_size, content.len() - offset);
            pool.block_mut(handle)[..take].copy_from_slice(&content[offset..offset + take]);
            offset += take;
            chain.push(handle);
        }

        self.chains.upsert(id, chain);
        WriteOutcome::complete(content.len())
    }

    /// Grow-in-place: fills the unused tail of the chain's last block, then
    /// allocates for whatever remains. `current_len` is the file's recorded
    /// byte length, which locates the tail inside the last block.
    pub fn extend(
        &mut self,
        pool: &mut BlockPool,
        id: u64,
        current_len: u64,
        text: &[u8],
    ) -> Option<WriteOutcome> {
        let block_size = pool.block_size();
        let chain = self.chains.find_mut(&id)?;

        let mut offset = 0;
        let tail_used = (current_len as usize) % block_size;
        // A nonzero multiple of the block size means the last block is full.
        let tail_free = if current_len > 0 && tail_used == 0 {
            0
        } else {
            block_size - tail_used
        };
        if tail_free > 0 {
            if let Some(&last) = chain.last() {
                let take = std::cmp::min(tail_free, text.len());
                pool.block_mut(last)[tail_used..tail_used + take]
                    .copy_from_slice(&text[..take]);
                offset += take;
            }
        }

        while offset < text.len() {
            let handle = match pool.allocate() {
                Some(handle) => handle,
                None => {
                    warn!(
                        "pool exhausted appending to file {}: {} of {} bytes stored",
                        id,
                        offset,
                        text.len()
                    );
                    return Some(WriteOutcome::truncated(offset));
                }
            };
            let take = std::cmp::min(block_size, text.len() - offset);
            pool.block_mut(handle)[..take].copy_from_slice(&text[offset..offset + take]);
            offset += take;
            chain.push(handle);
        }

        Some(WriteOutcome::complete(text.len()))
    }

    /// Reassembles the first `len` bytes of the chain in order. Stops at the
    /// recorded length so stale zero padding in the last block never leaks.
    pub fn read(&self, pool: &BlockPool, id: u64, len: u64) -> Option<Vec<u8>> {
        let chain = self.chains.find(&id)?;

        let mut content = Vec::with_capacity(len as usize);
        let mut remaining = len as usize;
        for &handle in chain {
            if remaining == 0 {
                break;
            }
            let take = std::cmp::min(pool.block_size(), remaining);
            content.extend_from_slice(&pool.block(handle)[..take]);
            remaining -= take;
        }
        Some(content)
    }

    /// Frees every block in the chain and drops the index entry. Safe to
    /// call for identities with no entry.
    pub fn release(&mut self, pool: &mut BlockPool, id: u64) {
        if let Some(chain) = self.chains.remove(&id) {
            for handle in chain {
                pool.free(handle);
            }
        }
    }

    pub fn block_count(&self, id: u64) -> Option<usize> {
        self.chains.find(&id).map(|chain| chain.len())
    }

    /// Total blocks held across all live chains.
    pub fn indexed_blocks(&self) -> usize {
        self.chains.iter().map(|(_, chain)| chain.len()).sum()
    }

    /// Entries in ascending identity order, for the snapshot walk.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[BlockHandle])> {
        self.chains.iter().map(|(&id, chain)| (id, chain.as_slice()))
    }
}
