//! Calendar helpers.
//!
//! The model stores every date as a `(julian day, year)` pair in fixed-width
//! fields. Users think in ISO dates, so conversion happens here.

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};

/// A date expressed as day-of-year (1-based) plus year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayOfYear {
    pub day: u32,
    pub year: i32,
}

impl DayOfYear {
    pub fn new(day: u32, year: i32) -> CoreResult<Self> {
        NaiveDate::from_yo_opt(year, day)
            .map(Self::from_date)
            .ok_or(CoreError::DayOutOfRange { day, year })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.ordinal(),
            year: date.year(),
        }
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse_iso(value: &str) -> CoreResult<Self> {
        parse_iso_date(value).map(Self::from_date)
    }

    pub fn to_date(self) -> CoreResult<NaiveDate> {
        NaiveDate::from_yo_opt(self.year, self.day).ok_or(CoreError::DayOutOfRange {
            day: self.day,
            year: self.year,
        })
    }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| CoreError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
