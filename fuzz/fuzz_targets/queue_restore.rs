#![no_main]

use libfuzzer_sys::fuzz_target;

use aegis_core::QueueEntry;
use aegis_queue::{MemoryStore, QueueStore};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let store = MemoryStore::new();
        store.set_raw(raw);

        // Corrupt payloads surface as errors, never panics.
        if let Ok(entries) = store.load() {
            let round = serde_json::to_string(&entries).unwrap();
            let back: Vec<QueueEntry> = serde_json::from_str(&round).unwrap();
            assert_eq!(back.len(), entries.len());
        }
    }
});
