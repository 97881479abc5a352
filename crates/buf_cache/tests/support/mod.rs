use std::sync::{Arc, Mutex};

use buf_cache::{BlockDevice, Cache};

pub const BLOCK_SIZE: usize = 64;

pub type TestCache<D> = Cache<D, Mutex<buf_cache::Inner<BLOCK_SIZE>>, std::sync::Condvar, BLOCK_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Read(u32, u64),
    Write(u32, u64),
}

#[derive(Clone)]
pub struct MockDevice {
    sectors: Arc<Mutex<std::collections::HashMap<(u32, u64), [u8; BLOCK_SIZE]>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            sectors: Arc::new(Mutex::new(std::collections::HashMap::new())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn read_count(&self, dev: u32, sector: u64) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == Event::Read(dev, sector))
            .count()
    }

    pub fn write_count(&self, dev: u32, sector: u64) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == Event::Write(dev, sector))
            .count()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl BlockDevice<BLOCK_SIZE> for MockDevice {
    type Error = std::convert::Infallible;

    fn read(
        &self,
        dev: u32,
        sector: u64,
        data: &mut [u8; BLOCK_SIZE],
    ) -> Result<(), Self::Error> {
        self.events.lock().unwrap().push(Event::Read(dev, sector));
        let sectors = self.sectors.lock().unwrap();
        *data = sectors.get(&(dev, sector)).copied().unwrap_or([0; BLOCK_SIZE]);
        Ok(())
    }

    fn write(&self, dev: u32, sector: u64, data: &[u8; BLOCK_SIZE]) -> Result<(), Self::Error> {
        self.events.lock().unwrap().push(Event::Write(dev, sector));
        self.sectors.lock().unwrap().insert((dev, sector), *data);
        Ok(())
    }
}
