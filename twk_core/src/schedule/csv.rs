//! CSV schedule parsing.
//!
//! The municipal export is ISO-8859-1 encoded and `;`-separated, with a header
//! row naming the columns. It carries the actual collection dates, so the
//! reminder date is one day before each entry.

use std::{fs, path::Path};

use chrono::NaiveDate;
use csv::ReaderBuilder;
use encoding_rs::mem::decode_latin1;

use super::{find_bin, ParsedSchedule, PickupEvent, ScheduleError, CSV_BINS};

static COLUMN_DATE: &str = "Datum";
static COLUMN_BIN: &str = "Abfallart";
static DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a CSV schedule export into future pickup events.
///
/// Unknown bin labels are collected into [`ParsedSchedule::skipped_labels`],
/// a missing column or an unparseable date aborts the parse.
pub fn parse(path: &Path, today: NaiveDate) -> Result<ParsedSchedule, ScheduleError> {
    let bytes = fs::read(path).map_err(|source| ScheduleError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_text(&decode_latin1(&bytes), today)
}

fn parse_text(text: &str, today: NaiveDate) -> Result<ParsedSchedule, ScheduleError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let date_index = headers
        .iter()
        .position(|header| header == COLUMN_DATE)
        .ok_or(ScheduleError::MissingColumn(COLUMN_DATE))?;
    let bin_index = headers
        .iter()
        .position(|header| header == COLUMN_BIN)
        .ok_or(ScheduleError::MissingColumn(COLUMN_BIN))?;

    let mut schedule = ParsedSchedule::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // the header is line 1, the first record line 2
        let row = index + 2;
        let date_value = record.get(date_index).ok_or(ScheduleError::MissingField {
            row,
            column: COLUMN_DATE,
        })?;
        let label = record.get(bin_index).ok_or(ScheduleError::MissingField {
            row,
            column: COLUMN_BIN,
        })?;
        let pickup_date = NaiveDate::parse_from_str(date_value, DATE_FORMAT)
            .map_err(|_| ScheduleError::InvalidDate(date_value.to_string()))?;
        let remind_date = pickup_date
            .pred_opt()
            .ok_or_else(|| ScheduleError::InvalidDate(date_value.to_string()))?;
        let Some(bin) = find_bin(&CSV_BINS, label) else {
            schedule.skipped_labels.insert(label.to_string());
            continue;
        };
        if remind_date < today {
            schedule.past_dates += 1;
            continue;
        }
        schedule.events.push(PickupEvent { bin, remind_date });
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use encoding_rs::mem::decode_latin1;

    use super::parse_text;
    use crate::schedule::ScheduleError;

    fn today() -> NaiveDate {
        NaiveDate::from_str("2025-02-01").unwrap()
    }

    #[test]
    fn test_parse_shifts_reminder_one_day_back() {
        let schedule = parse_text("Datum;Abfallart\n01.03.2025;Bio\n", today()).unwrap();
        assert_eq!(schedule.events.len(), 1);
        let event = &schedule.events[0];
        assert_eq!(event.bin.label, "Bio");
        assert_eq!(
            event.remind_date,
            NaiveDate::from_str("2025-02-28").unwrap()
        );
    }

    #[test]
    fn test_parse_skips_and_reports_unknown_bins() {
        let schedule = parse_text("Datum;Abfallart\n01.03.2025;Sperrmüll\n", today()).unwrap();
        assert!(schedule.events.is_empty());
        assert!(schedule.skipped_labels.contains("Sperrmüll"));
    }

    #[test]
    fn test_parse_keeps_same_day_reminder() {
        // collection on the 2nd reminds on the 1st, which is still today
        let schedule = parse_text("Datum;Abfallart\n02.02.2025;Bio\n", today()).unwrap();
        assert_eq!(schedule.events.len(), 1);
        assert_eq!(schedule.events[0].remind_date, today());
    }

    #[test]
    fn test_parse_drops_past_reminder_dates() {
        // collection on the 1st reminds on January 31st, already gone
        let schedule = parse_text("Datum;Abfallart\n01.02.2025;Bio\n", today()).unwrap();
        assert!(schedule.events.is_empty());
        assert_eq!(schedule.past_dates, 1);
    }

    #[test]
    fn test_parse_rejects_invalid_dates() {
        let result = parse_text("Datum;Abfallart\n2025-03-01;Bio\n", today());
        assert!(
            matches!(result, Err(ScheduleError::InvalidDate(value)) if value == "2025-03-01")
        );
    }

    #[test]
    fn test_parse_requires_expected_columns() {
        let result = parse_text("Datum;Art\n01.03.2025;Bio\n", today());
        assert!(matches!(
            result,
            Err(ScheduleError::MissingColumn("Abfallart"))
        ));
    }

    #[test]
    fn test_parse_keeps_shared_dates_as_separate_events() {
        let schedule = parse_text(
            "Datum;Abfallart\n01.03.2025;Bio\n01.03.2025;Papier\n",
            today(),
        )
        .unwrap();
        let labels: Vec<&str> = schedule.events.iter().map(|event| event.bin.label).collect();
        assert_eq!(labels, ["Bio", "Papier"]);
    }

    #[test]
    fn test_parse_decodes_latin1_labels() {
        let bytes = b"Datum;Abfallart\n01.03.2025;Restm\xfcll\n";
        let schedule = parse_text(&decode_latin1(bytes), today()).unwrap();
        assert_eq!(schedule.events[0].bin.label, "Restmüll");
    }
}
