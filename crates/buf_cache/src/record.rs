/// The identity a buffer carries while assigned: which device and sector
/// its payload currently mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIdentity {
    /// Device number.
    pub dev: u32,
    /// Sector index on that device.
    pub sector: u64,
}

/// One slot of the buffer pool.
///
/// Link fields thread this record into at most one LRU position and at
/// most one hash chain; the arena owns all link storage, so neither
/// index structure allocates separately.
pub(crate) struct BufferRecord<const BLOCK_SIZE: usize> {
    pub(crate) identity: Option<BlockIdentity>,
    /// Inode the sector currently belongs to; `0` means "not associated
    /// with a user inode" (e.g. filesystem metadata).
    pub(crate) inum: u32,
    pub(crate) busy: bool,
    pub(crate) valid: bool,
    pub(crate) dirty: bool,
    pub(crate) data: [u8; BLOCK_SIZE],
    pub(crate) lru_prev: Option<usize>,
    pub(crate) lru_next: Option<usize>,
    pub(crate) hash_prev: Option<usize>,
    pub(crate) hash_next: Option<usize>,
}

impl<const BLOCK_SIZE: usize> BufferRecord<BLOCK_SIZE> {
    pub(crate) fn unassigned() -> Self {
        Self {
            identity: None,
            inum: 0,
            busy: false,
            valid: false,
            dirty: false,
            data: [0; BLOCK_SIZE],
            lru_prev: None,
            lru_next: None,
            hash_prev: None,
            hash_next: None,
        }
    }
}
