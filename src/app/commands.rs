//! Inbound schedule commands.
//!
//! These are the actions the outside world (web handlers, serial console)
//! performs on the schedule store.  [`ScheduleEditor`] applies them and, on
//! success, signals the schedule task to reload and re-arm.

use log::info;

use crate::app::ports::RecordFs;
use crate::error::{Error, Result};
use crate::events::{Notification, NotifyFlags};
use crate::schedule::{ScheduleRecord, ScheduleStore, decode_str};

/// Commands that external adapters can send to the schedule store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleCommand {
    /// Store one record given as raw JSON text.
    Upload(String),
    /// Remove every record with this identifier.
    Delete(String),
    /// Return every stored record.
    List,
}

/// What a successfully applied command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Stored(ScheduleRecord),
    Removed(usize),
    Listing(Vec<ScheduleRecord>),
}

/// Producer side of the schedule store.
///
/// At most one mutating command may be in flight at a time; the store's
/// delete rewrite is not safe against a concurrent append.
pub struct ScheduleEditor<'a, F: RecordFs> {
    store: ScheduleStore<F>,
    flags: &'a NotifyFlags,
}

impl<'a, F: RecordFs> ScheduleEditor<'a, F> {
    pub fn new(store: ScheduleStore<F>, flags: &'a NotifyFlags) -> Self {
        Self { store, flags }
    }

    pub fn apply(&self, command: ScheduleCommand) -> Result<CommandReply> {
        match command {
            ScheduleCommand::Upload(text) => self.upload(&text).map(CommandReply::Stored),
            ScheduleCommand::Delete(id) => self.delete(&id).map(CommandReply::Removed),
            ScheduleCommand::List => self.list().map(CommandReply::Listing),
        }
    }

    /// Decode, reject duplicates, append, then signal reload + re-arm.
    pub fn upload(&self, text: &str) -> Result<ScheduleRecord> {
        let record = decode_str(text)?;
        if self.store.contains(&record.identifier)? {
            return Err(Error::DuplicateIdentifier);
        }
        self.store.append(&record)?;
        info!("editor: stored schedule '{}'", record.identifier);
        self.flags
            .notify(Notification::NEEDS_RELOAD | Notification::NEEDS_REARM);
        Ok(record)
    }

    /// Remove by identifier, then signal reload + re-arm.
    pub fn delete(&self, identifier: &str) -> Result<usize> {
        let removed = self.store.remove_by_identifier(identifier)?;
        self.flags
            .notify(Notification::NEEDS_RELOAD | Notification::NEEDS_REARM);
        Ok(removed)
    }

    /// Every stored record in file order.  No log yet reads as empty.
    pub fn list(&self) -> Result<Vec<ScheduleRecord>> {
        match self.store.load_all() {
            Ok(records) => Ok(records),
            Err(crate::app::ports::StorageError::Unavailable) => Ok(Vec::new()),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}
