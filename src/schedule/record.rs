//! Schedule record codec.
//!
//! One JSON object per record, whitespace/newline separated:
//!
//! ```text
//! {"identifier":"a1","mode":0,"date":"2024-05-01","time":"06:30","durationSeconds":900,"intervalValue":0,"intervalUnit":""}
//! ```
//!
//! Decoding is streaming and forgiving: the first malformed record ends the
//! stream exactly like end-of-input does, it is never fatal.

use std::io::Read;

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::de::IoRead;

use crate::error::{Error, Result};

/// Longest identifier the uploader may assign.
pub const IDENTIFIER_CAPACITY: usize = 48;
/// Longest recurrence unit tag ("minutes", "days", ...).
pub const INTERVAL_UNIT_CAPACITY: usize = 16;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

/// One stored watering schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    /// Opaque, unique among stored records.
    pub identifier: heapless::String<IDENTIFIER_CAPACITY>,
    /// Raw mode tag, see [`ScheduleMode::from_tag`].
    pub mode: u8,
    /// Local calendar date of the first activation.
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    /// Local wall-clock time of the first activation (minute resolution).
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    pub duration_seconds: u32,
    /// Recurrence interval.  Carried through, never acted on.
    #[serde(default)]
    pub interval_value: u32,
    #[serde(default)]
    pub interval_unit: heapless::String<INTERVAL_UNIT_CAPACITY>,
}

/// How a schedule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Runs once at `date`/`time`.
    OneShot,
    /// Has recurrence fields; only the first occurrence is armed.
    Recurring,
}

impl ScheduleMode {
    pub fn from_tag(tag: u8) -> Self {
        if tag == 0 {
            Self::OneShot
        } else {
            Self::Recurring
        }
    }
}

impl ScheduleRecord {
    /// Absolute start instant (Unix seconds) of the wall-clock `date`/`time`
    /// interpreted at `offset`.
    pub fn start_instant(&self, offset: FixedOffset) -> i64 {
        let local = self.date.and_time(self.time);
        local.and_utc().timestamp() - i64::from(offset.local_minus_utc())
    }

    pub fn mode(&self) -> ScheduleMode {
        ScheduleMode::from_tag(self.mode)
    }
}

mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, super::DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, super::TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Encoding
// ═══════════════════════════════════════════════════════════════

/// Serialize one record to a single line (no trailing newline).
pub fn encode_one(record: &ScheduleRecord) -> String {
    // The record has no maps with non-string keys, so this cannot fail.
    serde_json::to_string(record).unwrap_or_default()
}

/// Decode a single uploaded record.
pub fn decode_str(text: &str) -> Result<ScheduleRecord> {
    let record: ScheduleRecord = serde_json::from_str(text.trim()).map_err(|e| {
        debug!("codec: rejected upload: {}", e);
        Error::Rejected("malformed schedule record")
    })?;
    if record.identifier.is_empty() {
        return Err(Error::Rejected("empty identifier"));
    }
    Ok(record)
}

// ═══════════════════════════════════════════════════════════════
//  Streaming decoder
// ═══════════════════════════════════════════════════════════════

/// Outcome of [`RecordDecoder::decode_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Record(ScheduleRecord),
    /// No more input.
    EndOfStream,
    /// The next record is malformed; nothing after it is decoded.
    ParseFailure,
}

/// Pulls records one at a time from a byte stream.
///
/// Once a parse failure is seen the decoder is stuck on `ParseFailure`.
pub struct RecordDecoder<R: Read> {
    stream: serde_json::StreamDeserializer<'static, IoRead<R>, ScheduleRecord>,
    failed: bool,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
            failed: false,
        }
    }

    pub fn decode_one(&mut self) -> Decoded {
        if self.failed {
            return Decoded::ParseFailure;
        }
        match self.stream.next() {
            Some(Ok(record)) => Decoded::Record(record),
            None => Decoded::EndOfStream,
            Some(Err(e)) => {
                debug!("codec: stopping at byte {}: {}", self.stream.byte_offset(), e);
                self.failed = true;
                Decoded::ParseFailure
            }
        }
    }

    /// Whether decoding stopped on a malformed record.
    pub fn failed(&self) -> bool {
        self.failed
    }
}

/// Yields records until end-of-stream or the first parse failure.
impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = ScheduleRecord;

    fn next(&mut self) -> Option<ScheduleRecord> {
        match self.decode_one() {
            Decoded::Record(r) => Some(r),
            Decoded::EndOfStream | Decoded::ParseFailure => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(identifier: &str, date: &str, time: &str, duration_seconds: u32) -> ScheduleRecord {
    ScheduleRecord {
        identifier: heapless::String::try_from(identifier).unwrap(),
        mode: 0,
        date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
        time: NaiveTime::parse_from_str(time, TIME_FORMAT).unwrap(),
        duration_seconds,
        interval_value: 0,
        interval_unit: heapless::String::new(),
    }
}
