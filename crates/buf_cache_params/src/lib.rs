#![no_std]

//! Suggested tuning constants for `buf_cache`, in the style of a kernel
//! parameters crate: named, compile-time defaults that embedders may
//! use instead of choosing their own and passing them to `Cache::new`.

/// Suggested number of buffers in the pool.
pub const NBUF: usize = 30;

/// Suggested number of hash table buckets.
///
/// Need not be prime; the hash function already spreads keys well. A
/// value close to `NBUF` keeps chains short.
pub const HASHSIZE: usize = 37;

/// Suggested per-inode residency cap ("same-inode residency policy").
///
/// A value below `3` disables the quota entirely (see `Cache::new`'s
/// docs in `buf_cache`).
pub const SRP: usize = 3;
