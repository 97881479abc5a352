/// A synchronous block device: reads and writes one fixed-size sector at a
/// time, addressed by a small device number plus a sector index.
///
/// Implementations are expected to block until the operation completes;
/// `buf_cache` never issues a second I/O for the same buffer while one is
/// outstanding, since the buffer stays `busy` for the duration.
pub trait BlockDevice<const BLOCK_SIZE: usize> {
    /// The error type returned by a failed read or write.
    type Error;

    /// Reads sector `sector` of device `dev` into `data`.
    fn read(&self, dev: u32, sector: u64, data: &mut [u8; BLOCK_SIZE]) -> Result<(), Self::Error>;

    /// Writes `data` to sector `sector` of device `dev`.
    fn write(&self, dev: u32, sector: u64, data: &[u8; BLOCK_SIZE]) -> Result<(), Self::Error>;
}
