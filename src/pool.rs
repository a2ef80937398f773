use log::debug;

#[derive(Debug, PartialEq)]
pub enum State {
    Free,
    Used,
}

/// Stores one bit per pool slot, packed into `u64` words. Sized at
/// construction to the pool's block count rather than a fixed disk block.
pub struct Bitmap {
    words: Vec<u64>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; (len + 63) / 64],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, slot: usize) -> State {
        assert!(slot < self.len);
        let word = self.words[slot / 64];
        let mask = 0b01_u64 << (slot % 64);
        if word & mask == 0 {
            State::Free
        } else {
            State::Used
        }
    }

    pub fn set_used(&mut self, slot: usize) {
        assert!(slot < self.len);
        let mask = 0b01_u64 << (slot % 64);
        self.words[slot / 64] |= mask;
    }

    pub fn set_free(&mut self, slot: usize) {
        assert!(slot < self.len);
        let mask = 0b01_u64 << (slot % 64);
        self.words[slot / 64] &= !mask;
    }

    /// Used slot count, cheap enough to recount on demand. Bits past `len`
    /// in the final word are never set so a plain popcount is exact.
    pub fn used_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Retrieves the next available sequential slot, lowest index first.
    /// The deterministic policy matters: tests depend on allocation order.
    pub fn first_free(&self) -> Option<usize> {
        (0..self.len).find(|&i| self.get(i) == State::Free)
    }
}

/// Opaque reference to one slot in a [`BlockPool`]. Only meaningful to the
/// pool that issued it; whichever chain holds it owns the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle(pub(crate) usize);

/// A fixed arena of equal-size blocks with a presence bitmap, standing in
/// for raw disk blocks. All content bytes of every file live here.
pub struct BlockPool {
    arena: Vec<u8>,
    bitmap: Bitmap,
    block_size: usize,
}

impl BlockPool {
    /// Carves `block_count` blocks of `block_size` bytes, all free, all zero.
    pub fn new(block_size: usize, block_count: usize) -> Self {
        assert!(block_size > 0, "block size must be nonzero");
        Self {
            arena: vec![0; block_size * block_count],
            bitmap: Bitmap::new(block_count),
            block_size,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.bitmap.len()
    }

    /// Claims the lowest free slot, returning it zeroed. `None` when the
    /// pool is exhausted; the caller decides how loudly to fail.
    pub fn allocate(&mut self) -> Option<BlockHandle> {
        let slot = self.bitmap.first_free()?;
        self.bitmap.set_used(slot);
        let start = slot * self.block_size;
        for byte in &mut self.arena[start..start + self.block_size] {
            *byte = 0;
        }
        debug!("allocated block {}", slot);
        Some(BlockHandle(slot))
    }

    /// Releases a slot back to the pool. Out-of-range handles are ignored
    /// and freeing a free slot leaves the bitmap unchanged; ownership of
    /// handles is the caller's correctness boundary, not the pool's.
    pub fn free(&mut self, handle: BlockHandle) {
        if handle.0 < self.bitmap.len() {
            self.bitmap.set_free(handle.0);
            debug!("freed block {}", handle.0);
        }
    }

    pub fn block(&self, handle: BlockHandle) -> &[u8] {
        let start = handle.0 * self.block_size;
        &self.arena[start..start + self.block_size]
    }

    pub fn block_mut(&mut self, handle: BlockHandle) -> &mut [u8] {
        let start = handle.0 * self.block_size;
        &mut self.arena[start..start + self.block_size]
    }

    /// The presence bitmap in slot order, for persistence and accounting.
    pub fn occupancy(&self) -> Vec<bool> {
        (0..self.bitmap.len())
            .map(|i| self.bitmap.get(i) == State::Used)
            .collect()
    }

    pub fn occupied_blocks(&self) -> usize {
        self.bitmap.used_count()
    }
}
