//! This crate implements the core of tonnenwecker: it parses municipal waste
//! collection schedules (CSV export or iCalendar feed) into normalized pickup
//! events and creates one Todoist reminder task per reminder date.

pub use chrono;

pub mod schedule;
pub mod todoist;
