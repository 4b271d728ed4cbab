//! Schedule parsing and grouping.
//!
//! Two interchangeable parsers produce the same normalized [`PickupEvent`]
//! sequence: the CSV export of the municipal schedule and the iCalendar feed.
//! Their bin label vocabularies differ between the sources and are kept as
//! separate tables.

pub mod csv;
pub mod ical;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use bitmask_enum::bitmask;
use chrono::NaiveDate;
use thiserror::Error;

#[bitmask]
pub enum WasteTypeBitmask {
    Organic,
    Residual,
    Paper,
    Recyclable,
}

/// A known bin category with its waste type and display color.
#[derive(Debug, PartialEq)]
pub struct Bin {
    pub label: &'static str,
    pub kind: WasteTypeBitmask,
    pub color: (u8, u8, u8),
}

/// Bin labels as spelled in the CSV export.
pub static CSV_BINS: [Bin; 4] = [
    Bin {
        label: "Bio",
        kind: WasteTypeBitmask::Organic,
        color: (0x95, 0x5b, 0x2c),
    },
    Bin {
        label: "Restmüll",
        kind: WasteTypeBitmask::Residual,
        color: (0x32, 0x32, 0x32),
    },
    Bin {
        label: "Papier",
        kind: WasteTypeBitmask::Paper,
        color: (0x00, 0x91, 0xd4),
    },
    Bin {
        label: "Gelbe Tonne",
        kind: WasteTypeBitmask::Recyclable,
        color: (0xc7, 0xbe, 0x01),
    },
];

/// Bin labels as spelled in the iCalendar feed.
pub static ICAL_BINS: [Bin; 4] = [
    Bin {
        label: "Bioabfall",
        kind: WasteTypeBitmask::Organic,
        color: (0x95, 0x5b, 0x2c),
    },
    Bin {
        label: "Restmüll",
        kind: WasteTypeBitmask::Residual,
        color: (0x32, 0x32, 0x32),
    },
    Bin {
        label: "Papier",
        kind: WasteTypeBitmask::Paper,
        color: (0x00, 0x91, 0xd4),
    },
    Bin {
        label: "Wertstoff",
        kind: WasteTypeBitmask::Recyclable,
        color: (0xc7, 0xbe, 0x01),
    },
];

/// Look a label up in a bin table. Matching is case-sensitive.
fn find_bin(table: &'static [Bin], label: &str) -> Option<&'static Bin> {
    table.iter().find(|bin| bin.label == label)
}

/// A single upcoming collection, reduced to the date the bin has to go out.
#[derive(Debug, PartialEq)]
pub struct PickupEvent {
    pub bin: &'static Bin,
    pub remind_date: NaiveDate,
}

/// Result of parsing one schedule file.
///
/// `skipped_labels` is only populated by the CSV parser, which batches its
/// unknown labels into one report; the iCalendar parser logs them per item.
#[derive(Debug, Default)]
pub struct ParsedSchedule {
    pub events: Vec<PickupEvent>,
    pub skipped_labels: BTreeSet<String>,
    pub past_dates: usize,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read schedule file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("schedule is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("record {row} has no '{column}' field")]
    MissingField { row: usize, column: &'static str },
    #[error("malformed csv record")]
    Csv(#[from] ::csv::Error),
    #[error("date string '{0}' did not resolve into a valid date")]
    InvalidDate(String),
    #[error("malformed calendar data")]
    Ical(#[from] ::ical::parser::ParserError),
    #[error("calendar event has no plain-text summary")]
    MissingSummary,
    #[error("calendar event has no usable start date")]
    MissingStart,
}

/// The two supported schedule file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFormat {
    Csv,
    Ical,
}

impl ScheduleFormat {
    /// Guess the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "ics" | "ical" => Some(Self::Ical),
            _ => None,
        }
    }

    /// Parse the schedule file into future pickup events.
    pub fn parse(self, path: &Path, today: NaiveDate) -> Result<ParsedSchedule, ScheduleError> {
        match self {
            Self::Csv => csv::parse(path, today),
            Self::Ical => ical::parse(path, today),
        }
    }
}

/// Bin labels due per reminder date, in chronological date order.
///
/// Labels within one date keep their input order, duplicates included.
pub type GroupedTasks = BTreeMap<NaiveDate, Vec<&'static str>>;

/// Reduce the event sequence into one bucket of bin labels per reminder date.
pub fn group_by_remind_date(events: &[PickupEvent]) -> GroupedTasks {
    let mut grouped = GroupedTasks::new();
    for event in events {
        grouped.entry(event.remind_date).or_default().push(event.bin.label);
    }
    grouped
}
