use alloc::vec::Vec;

use crate::{hash, record::BlockIdentity, record::BufferRecord};

/// The cache state protected by the single cache-wide lock: the arena's
/// metadata (identity, flags, link fields), the LRU list endpoints, and
/// the hash table. The `BLOCK_SIZE`-byte payloads also live in the arena,
/// but once a buffer's `busy` flag is set, only its lease holder touches
/// its `data` field (see [`crate::cache::BufferHandle`]).
pub struct Inner<const BLOCK_SIZE: usize> {
    pub(crate) bufs: Vec<BufferRecord<BLOCK_SIZE>>,
    hash_table: Vec<Option<usize>>,
    lru_head: Option<usize>,
    lru_tail: Option<usize>,
    pub(crate) srp: usize,
}

impl<const BLOCK_SIZE: usize> Inner<BLOCK_SIZE> {
    pub(crate) fn new(num_buffers: usize, hash_size: usize, srp: usize) -> Self {
        let bufs = (0..num_buffers)
            .map(|_| BufferRecord::unassigned())
            .collect();
        let mut inner = Self {
            bufs,
            hash_table: alloc::vec![None; hash_size],
            lru_head: None,
            lru_tail: None,
            srp,
        };
        for idx in 0..num_buffers {
            inner.lru_push_front(idx);
        }
        inner
    }

    fn bucket(&self, id: BlockIdentity) -> usize {
        hash::bucket(id.dev, id.sector, self.hash_table.len())
    }

    /// Finds the buffer currently carrying `(dev, sector)`, if any.
    pub(crate) fn find(&self, dev: u32, sector: u64) -> Option<usize> {
        let bucket = hash::bucket(dev, sector, self.hash_table.len());
        let mut cur = self.hash_table[bucket];
        while let Some(idx) = cur {
            let id = self.bufs[idx].identity?;
            if id.dev == dev && id.sector == sector {
                return Some(idx);
            }
            cur = self.bufs[idx].hash_next;
        }
        None
    }

    /// Removes buffer `idx` from its current hash chain, if it has an
    /// identity. Must be called before the identity is overwritten.
    pub(crate) fn detach(&mut self, idx: usize) {
        let Some(id) = self.bufs[idx].identity else {
            return;
        };
        let bucket = self.bucket(id);
        let prev = self.bufs[idx].hash_prev;
        let next = self.bufs[idx].hash_next;
        match prev {
            Some(p) => self.bufs[p].hash_next = next,
            None => self.hash_table[bucket] = next,
        }
        if let Some(n) = next {
            self.bufs[n].hash_prev = prev;
        }
        self.bufs[idx].hash_prev = None;
        self.bufs[idx].hash_next = None;
    }

    /// Inserts buffer `idx` at the head of the chain for its (already
    /// updated) identity.
    pub(crate) fn attach(&mut self, idx: usize) {
        let id = self.bufs[idx]
            .identity
            .expect("attach requires an assigned identity");
        let bucket = self.bucket(id);
        let old_root = self.hash_table[bucket];
        self.bufs[idx].hash_prev = None;
        self.bufs[idx].hash_next = old_root;
        if let Some(r) = old_root {
            self.bufs[r].hash_prev = Some(idx);
        }
        self.hash_table[bucket] = Some(idx);
    }

    fn lru_remove(&mut self, idx: usize) {
        let prev = self.bufs[idx].lru_prev;
        let next = self.bufs[idx].lru_next;
        match prev {
            Some(p) => self.bufs[p].lru_next = next,
            None => self.lru_head = next,
        }
        match next {
            Some(n) => self.bufs[n].lru_prev = prev,
            None => self.lru_tail = prev,
        }
        self.bufs[idx].lru_prev = None;
        self.bufs[idx].lru_next = None;
    }

    fn lru_push_front(&mut self, idx: usize) {
        let old_head = self.lru_head;
        self.bufs[idx].lru_prev = None;
        self.bufs[idx].lru_next = old_head;
        if let Some(h) = old_head {
            self.bufs[h].lru_prev = Some(idx);
        }
        self.lru_head = Some(idx);
        if self.lru_tail.is_none() {
            self.lru_tail = Some(idx);
        }
    }

    /// Moves buffer `idx` to the most-recently-used position.
    pub(crate) fn lru_move_to_front(&mut self, idx: usize) {
        self.lru_remove(idx);
        self.lru_push_front(idx);
    }

    /// Returns buffer indices ordered from least- to most-recently used.
    pub(crate) fn lru_order_from_tail(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bufs.len());
        let mut cur = self.lru_tail;
        while let Some(idx) = cur {
            order.push(idx);
            cur = self.bufs[idx].lru_prev;
        }
        order
    }

    /// Number of buffers currently bearing `(dev, inum)`, used to
    /// enforce the per-inode residency quota.
    pub(crate) fn count_inode(&self, dev: u32, inum: u32) -> usize {
        self.bufs
            .iter()
            .filter(|b| b.inum == inum && b.identity.is_some_and(|id| id.dev == dev))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.bufs.len()
    }
}
