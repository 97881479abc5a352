//! A kernel-style disk block buffer cache with a per-inode residency
//! quota ("SRP").
//!
//! The cache sits between a filesystem layer and a block device driver.
//! It keeps recently used sectors in memory and acts as the single
//! synchronization point for any given sector: at most one client may
//! hold a sector's buffer leased (`busy`) at a time. See [`Cache`] for
//! the public entry point.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod cache;
mod device;
mod error;
mod hash;
mod inner;
mod record;

pub use cache::{BufferHandle, Cache};
pub use device::BlockDevice;
pub use error::Error;
pub use inner::Inner;
pub use record::BlockIdentity;
