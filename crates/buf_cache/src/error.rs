/// Error returned by [`crate::BufferHandle::write`].
///
/// This is the only recoverable error surface in `buf_cache`: a failed
/// flush on eviction or during `read`'s initial population is always
/// fatal (see the crate docs), since there is no layer above this one
/// that could usefully retry a single synchronous sector I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The underlying [`crate::BlockDevice`] returned an error while
    /// writing the buffer back.
    #[error("device I/O failed: {0:?}")]
    DeviceIo(E),
}
