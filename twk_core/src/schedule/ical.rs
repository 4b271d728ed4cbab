//! iCalendar schedule parsing.
//!
//! The calendar feed already encodes reminder days: DTSTART is the day before
//! the actual collection, so no day-shift is applied here, unlike the CSV
//! export which carries the collection dates themselves.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use chrono::NaiveDate;
use ical::{parser::ical::component::IcalEvent, IcalParser};
use log::info;

use super::{find_bin, ParsedSchedule, PickupEvent, ScheduleError, ICAL_BINS};

static DATE_FORMAT: &str = "%Y%m%d";

/// Parse an iCalendar schedule into future pickup events.
///
/// Only VEVENT components are considered; unknown bin labels are logged and
/// skipped per item.
pub fn parse(path: &Path, today: NaiveDate) -> Result<ParsedSchedule, ScheduleError> {
    let file = File::open(path).map_err(|source| ScheduleError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_from(BufReader::new(file), today)
}

fn parse_from<R: BufRead>(reader: R, today: NaiveDate) -> Result<ParsedSchedule, ScheduleError> {
    let mut schedule = ParsedSchedule::default();
    for ical_calendar_result in IcalParser::new(reader) {
        let ical_calendar = ical_calendar_result?;
        let ignored = ical_calendar.todos.len()
            + ical_calendar.journals.len()
            + ical_calendar.free_busys.len();
        if ignored > 0 {
            info!("ignoring {ignored} non-event calendar components");
        }
        for ical_event in ical_calendar.events {
            let summary = ical_event
                .get_ical_property_value("SUMMARY")
                .ok_or(ScheduleError::MissingSummary)?;
            let dt_start = ical_event
                .get_ical_property_value("DTSTART")
                .ok_or(ScheduleError::MissingStart)?;
            let remind_date = start_date(dt_start)?;
            let label = summary.split_whitespace().next().unwrap_or_default();
            let Some(bin) = find_bin(&ICAL_BINS, label) else {
                info!("skipping unknown bin type '{label}'");
                continue;
            };
            if remind_date < today {
                schedule.past_dates += 1;
                continue;
            }
            schedule.events.push(PickupEvent { bin, remind_date });
        }
    }
    Ok(schedule)
}

/// Calendar date of a DTSTART value, in its encoded timezone.
fn start_date(dt_start: &str) -> Result<NaiveDate, ScheduleError> {
    let date_part = dt_start
        .get(0..8)
        .ok_or_else(|| ScheduleError::InvalidDate(dt_start.to_string()))?;
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|_| ScheduleError::InvalidDate(dt_start.to_string()))
}

trait GetIcalProperty {
    fn get_ical_property_value(&self, name: &str) -> Option<&String>;
}

impl GetIcalProperty for IcalEvent {
    fn get_ical_property_value(&self, name: &str) -> Option<&String> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .and_then(|property| property.value.as_ref())
    }
}
