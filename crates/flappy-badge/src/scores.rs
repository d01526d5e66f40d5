//! Flash-backed score store.
//!
//! The leaderboard's flat-text block lives in the data (NVS) partition
//! area of the on-board flash. Erased flash reads 0xFF, so the text is
//! terminated by the first 0xFF byte and the whole capacity is rewritten
//! on every save.

use embedded_storage::{
    ReadStorage,
    Storage,
};
use esp_storage::FlashStorage;
use flappy_core::leaderboard::{
    STORE_CAPACITY,
    ScoreStore,
};

/// Byte offset of the score block inside the flash.
const SCORE_BLOCK_OFFSET: u32 = 0x9000;

pub struct FlashScoreStore {
    flash: FlashStorage,
}

impl FlashScoreStore {
    pub fn new() -> Self {
        Self {
            flash: FlashStorage::new(),
        }
    }
}

impl Default for FlashScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for FlashScoreStore {
    type Error = esp_storage::FlashStorageError;

    fn load(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut raw = [0xFFu8; STORE_CAPACITY];
        let want = buf.len().min(STORE_CAPACITY);
        self.flash.read(SCORE_BLOCK_OFFSET, &mut raw[..want])?;
        let len = raw[..want].iter().position(|&b| b == 0xFF).unwrap_or(want);
        buf[..len].copy_from_slice(&raw[..len]);
        Ok(len)
    }

    fn save(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut block = [0xFFu8; STORE_CAPACITY];
        let len = data.len().min(STORE_CAPACITY);
        block[..len].copy_from_slice(&data[..len]);
        self.flash.write(SCORE_BLOCK_OFFSET, &block)
    }
}
