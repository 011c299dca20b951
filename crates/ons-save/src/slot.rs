//! Save slot listings
//!
//! A slot query stats `save<N>.dat` and breaks its modification time into
//! month, day, hour and minute, each with a fixed-width rendering for the
//! save menu.

use chrono::{DateTime, Datelike, Local, Timelike};
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;
use tracing::trace;

/// Renders integers in a fixed number of columns.
pub trait DigitFormatter {
    /// Render `value` in `columns` columns.
    ///
    /// Short numbers are padded on the left, with zeros when `zero_pad` is
    /// set and blanks otherwise. Numbers wider than `columns` keep their
    /// leading digits.
    fn format(&self, value: u32, columns: usize, zero_pad: bool) -> String;
}

fn leading_digits(value: u32, columns: usize) -> (Vec<u8>, usize) {
    let digits: Vec<u8> = value.to_string().bytes().map(|b| b - b'0').collect();
    let kept = digits.len().min(columns.max(1));
    let pad = columns.saturating_sub(kept);
    (digits[..kept].to_vec(), pad)
}

/// Full-width digits (`０`-`９`) padded with ideographic spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct FullWidthDigits;

impl DigitFormatter for FullWidthDigits {
    fn format(&self, value: u32, columns: usize, zero_pad: bool) -> String {
        let (digits, pad) = leading_digits(value, columns);
        let filler = if zero_pad { '０' } else { '\u{3000}' };
        std::iter::repeat_n(filler, pad)
            .chain(
                digits
                    .into_iter()
                    .filter_map(|d| char::from_u32(u32::from('０') + u32::from(d))),
            )
            .collect()
    }
}

/// ASCII digits padded with spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiDigits;

impl DigitFormatter for AsciiDigits {
    fn format(&self, value: u32, columns: usize, zero_pad: bool) -> String {
        let (digits, pad) = leading_digits(value, columns);
        let filler = if zero_pad { '0' } else { ' ' };
        std::iter::repeat_n(filler, pad)
            .chain(digits.into_iter().map(|d| char::from(b'0' + d)))
            .collect()
    }
}

/// Snapshot of one save slot, taken for a single menu render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFileInfo {
    /// Slot number
    pub no: u32,
    /// Whether the slot's save file exists
    pub valid: bool,
    /// Month of the last write, 1-12
    pub month: u32,
    /// Day of month of the last write
    pub day: u32,
    /// Hour of the last write
    pub hour: u32,
    /// Minute of the last write
    pub minute: u32,
    /// Rendered slot number
    pub no_text: String,
    /// Rendered month
    pub month_text: String,
    /// Rendered day
    pub day_text: String,
    /// Rendered hour
    pub hour_text: String,
    /// Rendered minute, zero padded
    pub minute_text: String,
}

impl SaveFileInfo {
    /// Columns used for the slot number
    pub const fn slot_columns(slot_count: u32) -> usize {
        if slot_count >= 10 { 2 } else { 1 }
    }

    /// Info for a slot whose file does not exist
    pub fn empty(no: u32, slot_count: u32, digits: &impl DigitFormatter) -> Self {
        Self {
            no,
            valid: false,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            no_text: digits.format(no, Self::slot_columns(slot_count), false),
            month_text: String::new(),
            day_text: String::new(),
            hour_text: String::new(),
            minute_text: String::new(),
        }
    }

    /// Info for a slot last written at `modified`
    pub fn from_timestamp(
        no: u32,
        modified: DateTime<Local>,
        slot_count: u32,
        digits: &impl DigitFormatter,
    ) -> Self {
        let (month, day, hour, minute) = (
            modified.month(),
            modified.day(),
            modified.hour(),
            modified.minute(),
        );
        Self {
            no,
            valid: true,
            month,
            day,
            hour,
            minute,
            no_text: digits.format(no, Self::slot_columns(slot_count), false),
            month_text: digits.format(month, 2, false),
            day_text: digits.format(day, 2, false),
            hour_text: digits.format(hour, 2, false),
            minute_text: digits.format(minute, 2, true),
        }
    }

    /// Stat `path` and describe it as slot `no`.
    pub fn search(
        path: &Path,
        no: u32,
        slot_count: u32,
        digits: &impl DigitFormatter,
    ) -> Self {
        let modified = std::fs::metadata(path).and_then(|meta| meta.modified());
        match modified {
            Ok(time) => Self::from_timestamp(no, local_time(time), slot_count, digits),
            Err(e) => {
                trace!("Save slot {} at {} is empty: {}", no, path.display(), e);
                Self::empty(no, slot_count, digits)
            }
        }
    }
}

fn local_time(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}
