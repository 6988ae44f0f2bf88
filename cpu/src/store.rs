//! The 8192-word core store.
//!
//! Locations 0 to 3 hold the initial instructions.  They are wired,
//! not core: the fetch path reads them like any other location, but
//! the execute path reads them as zero and writes to them are
//! dropped.  That gating lives in the processor; the store itself is
//! a plain array.
//!
//! Core keeps its contents across power cycles, so the store can be
//! loaded from and saved to an image file: 8192 words, each stored as
//! a little-endian u64.  A missing or unreadable image is not an
//! error, it just means the machine starts with a clear store.

use std::fs;
use std::path::Path;

use tracing::{event, Level};

use base::prelude::*;

pub const STORE_WORDS: usize = 8192;

/// Store addresses at and above this are real core; below it are the
/// wired initial instructions.
pub const FIRST_CORE_ADDRESS: u32 = 4;

pub struct CoreStore {
    words: Vec<Word>,
}

impl CoreStore {
    /// A clear store with the initial instructions in place.
    #[must_use]
    pub fn new() -> CoreStore {
        let mut store = CoreStore {
            words: vec![Word::ZERO; STORE_WORDS],
        };
        store.seed_initial_orders();
        store
    }

    /// Load a store image, falling back to a clear store if the file
    /// cannot be read or is short.  The initial instructions are
    /// re-seeded over whatever the image held in locations 0 to 3.
    pub fn from_image_file(path: &Path) -> CoreStore {
        let mut store = CoreStore::new();
        match fs::read(path) {
            Ok(bytes) => {
                let words = bytes.len() / 8;
                if words < STORE_WORDS {
                    event!(
                        Level::WARN,
                        "core image {} is short ({} of {} words); padding with zeros",
                        path.display(),
                        words,
                        STORE_WORDS
                    );
                }
                for (i, chunk) in bytes.chunks_exact(8).take(STORE_WORDS).enumerate() {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(chunk);
                    store.words[i] = Word::from_raw(u64::from_le_bytes(raw));
                }
                store.seed_initial_orders();
            }
            Err(e) => {
                event!(
                    Level::WARN,
                    "failed to read core image {} ({}); using a clear store",
                    path.display(),
                    e
                );
            }
        }
        store
    }

    /// Write the store image back out.
    pub fn save_image_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let mut bytes = Vec::with_capacity(STORE_WORDS * 8);
        for w in &self.words {
            bytes.extend_from_slice(&w.bits().to_le_bytes());
        }
        fs::write(path, bytes)
    }

    fn seed_initial_orders(&mut self) {
        self.words[..4].copy_from_slice(&initial_orders());
    }

    /// Read for the fetch path: all 8192 locations are visible.
    pub fn fetch(&self, address: u32) -> Word {
        self.words[(address as usize) & (STORE_WORDS - 1)]
    }

    pub fn write(&mut self, address: u32, value: Word) {
        self.words[(address as usize) & (STORE_WORDS - 1)] = value;
    }
}

impl Default for CoreStore {
    fn default() -> CoreStore {
        CoreStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_has_initial_orders() {
        let store = CoreStore::new();
        assert_eq!(store.fetch(0), initial_orders()[0]);
        assert_eq!(store.fetch(3), initial_orders()[3]);
        assert_eq!(store.fetch(4), Word::ZERO);
    }

    #[test]
    fn fetch_wraps_address() {
        let mut store = CoreStore::new();
        store.write(5, Word::ONE);
        assert_eq!(store.fetch(5 + STORE_WORDS as u32), Word::ONE);
    }

    #[test]
    fn image_round_trip_reseeds_initial_orders() {
        let dir = std::env::temp_dir().join("e803-store-test");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("CoreImage");

        let mut store = CoreStore::new();
        store.write(0, Word::from_signed(-1)); // Clobber a wired location.
        store.write(100, Word::from_signed(12345));
        store.save_image_file(&path).expect("save image");

        let loaded = CoreStore::from_image_file(&path);
        assert_eq!(loaded.fetch(0), initial_orders()[0]);
        assert_eq!(loaded.fetch(100), Word::from_signed(12345));

        std::fs::remove_file(&path).expect("remove image");
    }
}
