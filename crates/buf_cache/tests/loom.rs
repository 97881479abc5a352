#![cfg(loom)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};

use buf_cache::{BlockDevice, Cache, Inner};
use loom::sync::Arc;

const BLOCK_SIZE: usize = 8;

#[derive(Clone)]
struct CountingDevice {
    reads: Arc<AtomicUsize>,
}

impl BlockDevice<BLOCK_SIZE> for CountingDevice {
    type Error = Infallible;

    fn read(&self, _dev: u32, _sector: u64, data: &mut [u8; BLOCK_SIZE]) -> Result<(), Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *data = [0; BLOCK_SIZE];
        Ok(())
    }

    fn write(&self, _dev: u32, _sector: u64, _data: &[u8; BLOCK_SIZE]) -> Result<(), Self::Error> {
        Ok(())
    }
}

type LoomCache = Cache<CountingDevice, loom::sync::Mutex<Inner<BLOCK_SIZE>>, loom::sync::Condvar, BLOCK_SIZE>;

/// Two threads racing on the same sector must never both hold it busy at
/// once; each acquires the buffer, marks an atomic flag, and checks no
/// one else got there first before releasing.
#[test]
fn concurrent_get_is_mutually_exclusive() {
    loom::model(|| {
        let device = CountingDevice {
            reads: Arc::new(AtomicUsize::new(0)),
        };
        let cache = Arc::new(LoomCache::new(device, 2, 3, 0));
        let holding = Arc::new(AtomicUsize::new(0));
        let violated = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let cache = Arc::clone(&cache);
            let holding = Arc::clone(&holding);
            let violated = Arc::clone(&violated);
            handles.push(loom::thread::spawn(move || {
                let handle = cache.read(1, 10, 0);
                if holding.fetch_add(1, Ordering::SeqCst) != 0 {
                    violated.fetch_add(1, Ordering::SeqCst);
                }
                holding.fetch_sub(1, Ordering::SeqCst);
                handle.release();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(violated.load(Ordering::SeqCst), 0);
    });
}

/// Once released, a buffer's second visit by a different identity must
/// not see it still reported busy.
#[test]
fn release_unblocks_waiting_acquirer() {
    loom::model(|| {
        let device = CountingDevice {
            reads: Arc::new(AtomicUsize::new(0)),
        };
        let cache = Arc::new(LoomCache::new(device, 1, 3, 0));

        let first = cache.read(1, 10, 0);
        let cache2 = Arc::clone(&cache);
        let waiter = loom::thread::spawn(move || {
            cache2.read(1, 10, 0).release();
        });

        first.release();
        waiter.join().unwrap();
    });
}
