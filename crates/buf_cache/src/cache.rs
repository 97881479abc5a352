use condvar_api::CondVar;
use mutex_api::Mutex;

use crate::{device::BlockDevice, error::Error, inner::Inner, record::BlockIdentity};

/// A kernel-style disk block buffer cache.
///
/// Serves two purposes: it reduces physical reads by keeping recently
/// used sectors in memory, and it is the single synchronization point
/// for a given sector, so at most one client mutates a sector's
/// in-memory image at a time. A per-inode residency quota ("SRP") can
/// bound how many buffers a single inode is allowed to hold at once, so
/// that one large streaming file cannot flush every other inode's
/// working set out of the cache.
pub struct Cache<Device, M, C, const BLOCK_SIZE: usize>
where
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    device: Device,
    lock: M,
    /// One wait channel per buffer, indexed by buffer index.
    channels: alloc::vec::Vec<C>,
    /// Wait channel for the "no free buffer" exhaustion path; notified
    /// on every release so all blocked `get` calls can re-check.
    retry: C,
}

impl<Device, M, C, const BLOCK_SIZE: usize> Cache<Device, M, C, BLOCK_SIZE>
where
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    /// Builds the buffer pool, LRU list, hash table, and per-buffer wait
    /// channels.
    ///
    /// `srp` is the per-inode residency cap; a value below `3` disables
    /// the quota entirely (matching the source kernel, which only
    /// enforces it once it is large enough to be meaningful).
    ///
    /// # Panics
    ///
    /// Panics if `num_buffers` or `hash_size` is `0`.
    pub fn new(device: Device, num_buffers: usize, hash_size: usize, srp: usize) -> Self {
        assert!(
            num_buffers > 0,
            "buf_cache: num_buffers must be greater than 0"
        );
        assert!(hash_size > 0, "buf_cache: hash_size must be greater than 0");
        let channels = (0..num_buffers).map(|_| C::new()).collect();
        Self {
            device,
            lock: M::new(Inner::new(num_buffers, hash_size, srp)),
            channels,
            retry: C::new(),
        }
    }

    fn finish(
        &self,
        mut guard: M::Guard<'_>,
        idx: usize,
        dev: u32,
        sector: u64,
    ) -> BufferHandle<'_, Device, M, C, BLOCK_SIZE> {
        let inum = guard.bufs[idx].inum;
        let data: *mut [u8; BLOCK_SIZE] = &mut guard.bufs[idx].data;
        drop(guard);
        BufferHandle {
            cache: self,
            index: idx,
            dev,
            sector,
            inum,
            data,
        }
    }
}

impl<Device, M, C, const BLOCK_SIZE: usize> Cache<Device, M, C, BLOCK_SIZE>
where
    Device: BlockDevice<BLOCK_SIZE>,
    Device::Error: core::fmt::Debug,
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    /// Returns a leased handle to the buffer holding `(dev, sector)`,
    /// populating it from the device first if it is not already valid.
    pub fn read(&self, dev: u32, sector: u64, inum: u32) -> BufferHandle<'_, Device, M, C, BLOCK_SIZE> {
        let handle = self.get(dev, sector, inum);
        let needs_read = {
            let guard = self.lock.lock();
            !guard.bufs[handle.index].valid
        };
        if needs_read {
            log::debug!(
                "buf_cache: populating idx={} from device dev={dev} sector={sector}",
                handle.index
            );
            let mut data = [0; BLOCK_SIZE];
            match self.device.read(dev, sector, &mut data) {
                Ok(()) => {
                    // SAFETY: `handle` leases this buffer (busy), so no
                    // other code path touches its payload concurrently.
                    unsafe {
                        *handle.data = data;
                    }
                    let mut guard = self.lock.lock();
                    guard.bufs[handle.index].valid = true;
                    guard.bufs[handle.index].dirty = false;
                }
                Err(e) => {
                    log::error!(
                        "buf_cache: device read failed dev={dev} sector={sector}: {e:?}"
                    );
                    panic!("buf_cache: fatal device error reading dev={dev} sector={sector}");
                }
            }
        }
        handle
    }

    /// Finds or allocates the buffer for `(dev, sector, inum)`, marking
    /// it busy before returning. Never performs device I/O itself; see
    /// [`Self::read`].
    fn get(&self, dev: u32, sector: u64, inum: u32) -> BufferHandle<'_, Device, M, C, BLOCK_SIZE> {
        let mut guard = self.lock.lock();
        loop {
            if let Some(idx) = guard.find(dev, sector) {
                if !guard.bufs[idx].busy {
                    guard.bufs[idx].busy = true;
                    log::debug!("buf_cache: hit dev={dev} sector={sector} idx={idx}");
                    return self.finish(guard, idx, dev, sector);
                }
                log::debug!("buf_cache: idx={idx} busy, waiting dev={dev} sector={sector}");
                guard = self.channels[idx].wait(guard);
                continue;
            }

            let quota_active = guard.srp >= 3 && inum != 0;
            let counter = if quota_active {
                guard.count_inode(dev, inum)
            } else {
                0
            };

            if !quota_active || counter < guard.srp {
                let order = guard.lru_order_from_tail();
                if let Some(&idx) = order.iter().find(|&&i| !guard.bufs[i].busy) {
                    log::debug!("buf_cache: miss, evicting idx={idx} for dev={dev} sector={sector}");
                    guard = self.evict_and_assign(guard, idx, dev, sector, inum);
                    return self.finish(guard, idx, dev, sector);
                }
                log::warn!("buf_cache: pool exhausted, blocking dev={dev} sector={sector}");
                guard = self.retry.wait(guard);
                continue;
            }

            log::warn!(
                "buf_cache: srp quota exceeded dev={dev} inum={inum}, evicting within inode"
            );
            let order = guard.lru_order_from_tail();
            let mut victim = None;
            let mut first_match = None;
            for &idx in &order {
                let b = &guard.bufs[idx];
                let matches = b.inum == inum && b.identity.is_some_and(|id| id.dev == dev);
                if matches {
                    if first_match.is_none() {
                        first_match = Some(idx);
                    }
                    if !b.busy {
                        victim = Some(idx);
                        break;
                    }
                }
            }
            if let Some(idx) = victim {
                guard = self.evict_and_assign(guard, idx, dev, sector, inum);
                return self.finish(guard, idx, dev, sector);
            }
            let wait_idx =
                first_match.expect("srp quota exceeded implies a matching buffer exists");
            guard = self.channels[wait_idx].wait(guard);
        }
    }

    /// Claims buffer `idx` as the eviction victim, flushing it first if
    /// dirty, then reassigns its identity and re-attaches it to the new
    /// hash chain. The device flush happens with the cache lock released
    /// (the buffer is already `busy`, so it cannot be picked by anyone
    /// else in the meantime).
    fn evict_and_assign<'a>(
        &'a self,
        mut guard: M::Guard<'a>,
        idx: usize,
        dev: u32,
        sector: u64,
        inum: u32,
    ) -> M::Guard<'a> {
        let was_dirty = guard.bufs[idx].dirty;
        let flush_identity = guard.bufs[idx].identity;
        let flush_data = guard.bufs[idx].data;
        guard.bufs[idx].busy = true;
        guard.detach(idx);
        drop(guard);

        if was_dirty {
            if let Some(old_id) = flush_identity {
                log::debug!(
                    "buf_cache: flushing dirty idx={idx} dev={} sector={} before eviction",
                    old_id.dev,
                    old_id.sector
                );
                if let Err(e) = self.device.write(old_id.dev, old_id.sector, &flush_data) {
                    log::error!("buf_cache: device write failed during eviction flush: {e:?}");
                    panic!("buf_cache: fatal device error flushing idx={idx} before eviction");
                }
            }
        }

        let mut guard = self.lock.lock();
        guard.bufs[idx].identity = Some(BlockIdentity { dev, sector });
        guard.bufs[idx].inum = inum;
        guard.bufs[idx].valid = false;
        guard.bufs[idx].dirty = false;
        guard.attach(idx);
        guard
    }
}

/// A leased, exclusive handle to one buffer's payload.
///
/// Returned by [`Cache::read`]. The buffer is `busy` for as long as the
/// handle lives; dropping it (or calling [`Self::release`]) clears
/// `busy`, moves the buffer to the most-recently-used position, and
/// wakes anyone waiting on it. There is no separate "release a non-busy
/// buffer" or "write a non-busy buffer" failure mode to express: a
/// `BufferHandle` can only exist while its buffer is leased.
pub struct BufferHandle<'a, Device, M, C, const BLOCK_SIZE: usize>
where
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    cache: &'a Cache<Device, M, C, BLOCK_SIZE>,
    index: usize,
    dev: u32,
    sector: u64,
    inum: u32,
    data: *mut [u8; BLOCK_SIZE],
}

impl<Device, M, C, const BLOCK_SIZE: usize> BufferHandle<'_, Device, M, C, BLOCK_SIZE>
where
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    /// Device number this buffer is currently assigned to.
    pub fn dev(&self) -> u32 {
        self.dev
    }

    /// Sector number this buffer is currently assigned to.
    pub fn sector(&self) -> u64 {
        self.sector
    }

    /// Inode this sector currently belongs to (`0` denotes metadata).
    pub fn inum(&self) -> u32 {
        self.inum
    }

    /// Index of the buffer within the pool. Exposed mainly for tests
    /// that assert on cache behavior directly.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns a read-only view of the payload.
    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        // SAFETY: the buffer is busy for the lifetime of this handle and
        // the arena never reallocates after construction, so this
        // pointer is the sole alias to the payload.
        unsafe { &*self.data }
    }

    /// Returns mutable access to the payload and marks the buffer
    /// dirty. A client cannot obtain a `&mut` to the payload any other
    /// way, so there is no separate "mark dirty" step to forget.
    pub fn data_mut(&mut self) -> &mut [u8; BLOCK_SIZE] {
        {
            let mut guard = self.cache.lock.lock();
            guard.bufs[self.index].dirty = true;
        }
        // SAFETY: see `data`.
        unsafe { &mut *self.data }
    }

    /// Returns `true` if the payload has diverged from the device since
    /// the last successful flush.
    pub fn is_dirty(&self) -> bool {
        let guard = self.cache.lock.lock();
        guard.bufs[self.index].dirty
    }

    /// Releases the buffer. Equivalent to letting the handle go out of
    /// scope; provided as a named operation for callers who want the
    /// release point to read explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl<Device, M, C, const BLOCK_SIZE: usize> BufferHandle<'_, Device, M, C, BLOCK_SIZE>
where
    Device: BlockDevice<BLOCK_SIZE>,
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    /// Marks the payload dirty (if not already), writes it through the
    /// device, and clears `dirty` on success.
    pub fn write(&mut self) -> Result<(), Error<Device::Error>> {
        {
            let mut guard = self.cache.lock.lock();
            guard.bufs[self.index].dirty = true;
        }
        // SAFETY: see `data`; a plain copy out of a busy payload is as
        // sound as a shared borrow of it.
        let snapshot = unsafe { *self.data };
        match self.cache.device.write(self.dev, self.sector, &snapshot) {
            Ok(()) => {
                let mut guard = self.cache.lock.lock();
                guard.bufs[self.index].dirty = false;
                Ok(())
            }
            Err(e) => Err(Error::DeviceIo(e)),
        }
    }
}

impl<Device, M, C, const BLOCK_SIZE: usize> Drop for BufferHandle<'_, Device, M, C, BLOCK_SIZE>
where
    M: Mutex<Data = Inner<BLOCK_SIZE>>,
    C: CondVar<M>,
{
    fn drop(&mut self) {
        {
            let mut guard = self.cache.lock.lock();
            guard.lru_move_to_front(self.index);
            guard.bufs[self.index].busy = false;
        }
        self.cache.channels[self.index].notify_all();
        self.cache.retry.notify_all();
    }
}
