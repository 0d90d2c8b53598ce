//! Unified error type for the irrigation firmware.
//!
//! Port-level errors ([`StorageError`], [`RtcError`]) live next to their
//! traits in [`crate::app::ports`]; this enum is what the producer-facing
//! operations (schedule editing, state queries) hand back to their callers.
//! All variants are `Copy`.

use core::fmt;

use crate::app::ports::{RtcError, StorageError};

/// Every fallible producer-facing operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The schedule file could not be opened, read or written.
    Storage(StorageError),
    /// The alarm RTC could not be reached or returned garbage.
    Rtc(RtcError),
    /// An uploaded record did not decode.  Carries the reason.
    Rejected(&'static str),
    /// An uploaded record reuses an identifier that is already stored.
    DuplicateIdentifier,
    /// A bounded channel operation did not complete in time; the message
    /// was dropped and the caller may retry.
    ChannelFull,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Rtc(e) => write!(f, "rtc: {e}"),
            Self::Rejected(why) => write!(f, "rejected: {why}"),
            Self::DuplicateIdentifier => write!(f, "identifier already stored"),
            Self::ChannelFull => write!(f, "channel full, message dropped"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RtcError> for Error {
    fn from(e: RtcError) -> Self {
        Self::Rtc(e)
    }
}
