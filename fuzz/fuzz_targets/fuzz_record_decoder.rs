//! Fuzz target: `RecordDecoder` and the delete rewrite.
//!
//! Treats arbitrary bytes as the on-flash schedule log.  Decoding must
//! never panic, and rewriting the log must keep exactly the records that
//! were decodable before, minus the removed identifier.
//!
//! cargo fuzz run fuzz_record_decoder

#![no_main]

use irrigation::adapters::fs::SimFs;
use irrigation::schedule::{RecordDecoder, ScheduleStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let before: Vec<_> = RecordDecoder::new(data).collect();

    let fs = SimFs::new();
    fs.append_raw("log", data);
    let store = ScheduleStore::new(fs, "log", "tmp");

    let victim = before
        .first()
        .map(|r| r.identifier.as_str().to_owned())
        .unwrap_or_default();
    let removed = store
        .remove_by_identifier(&victim)
        .expect("in-memory rewrite cannot fail");

    let after = store.load_all().expect("log exists after rewrite");
    let expected: Vec<_> = before
        .iter()
        .filter(|r| r.identifier.as_str() != victim)
        .cloned()
        .collect();
    assert_eq!(removed, before.len() - expected.len());
    assert_eq!(after, expected);
});
