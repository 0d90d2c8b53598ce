//! Fuzz target: `ScheduleEditor::upload`
//!
//! Feeds arbitrary text as an uploaded record.  Accepted uploads must
//! round-trip through the store and raise reload + re-arm; rejected ones
//! must leave the store and the flags untouched.
//!
//! cargo fuzz run fuzz_schedule_upload

#![no_main]

use irrigation::adapters::fs::SimFs;
use irrigation::app::commands::ScheduleEditor;
use irrigation::events::{Notification, NotifyFlags};
use irrigation::schedule::ScheduleStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let editor = ScheduleEditor::new(ScheduleStore::new(fs.clone(), "log", "tmp"), &flags);

    match editor.upload(text) {
        Ok(record) => {
            assert_eq!(
                flags.take(),
                Notification::NEEDS_RELOAD | Notification::NEEDS_REARM
            );
            assert_eq!(editor.list().expect("log was just written"), vec![record]);
        }
        Err(_) => {
            assert!(flags.take().is_empty());
            assert!(!fs.exists("log"));
        }
    }
});
