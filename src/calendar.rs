//! Calendar index: the canonical daily time dimension
//!
//! One [`CalendarUnit`] per day, totally ordered by its integer `date_key`
//! (YYYYMMDD). Built once from a start/end date or assembled from an
//! upstream time-dimension table, immutable thereafter. Interval expansion
//! is driven by range scans against this index, so `range` is a pair of
//! binary searches over the sorted unit vector, not a filter.

use crate::error::{EngineError, EngineResult};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One calendar day with its derived reporting attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarUnit {
    /// Sortable integer key, YYYYMMDD
    pub date_key: u32,

    /// The calendar date this key encodes
    pub full_date: NaiveDate,

    pub year: i32,

    /// Month number, 1-12
    pub month: u32,

    /// English month name ("January" .. "December")
    pub month_name: String,

    /// Quarter number, 1-4
    pub quarter: u32,

    /// Label of the form "YYYY-MM"
    pub year_month: String,

    /// ISO weekday number, 1 = Monday .. 7 = Sunday
    pub day_of_week: u32,

    /// True for Saturday and Sunday
    pub is_weekend: bool,
}

impl CalendarUnit {
    /// Derive a unit from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        let weekday = date.weekday();
        Self {
            date_key: key_from_date(date),
            full_date: date,
            year: date.year(),
            month,
            month_name: month_name(month).to_string(),
            quarter: (month - 1) / 3 + 1,
            year_month: format!("{:04}-{:02}", date.year(), month),
            day_of_week: weekday.number_from_monday(),
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        }
    }

    /// Month bucket key, YYYYMM
    pub fn month_key(&self) -> u32 {
        self.date_key / 100
    }
}

/// Encode a date as a YYYYMMDD key
pub fn key_from_date(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Decode a YYYYMMDD key back to a date
pub fn date_from_key(key: u32) -> EngineResult<NaiveDate> {
    let year = (key / 10_000) as i32;
    let month = key / 100 % 100;
    let day = key % 100;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(EngineError::InvalidDateKey { key })
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

/// Immutable ordered daily calendar
#[derive(Debug, Clone)]
pub struct CalendarIndex {
    units: Vec<CalendarUnit>,
    by_key: HashMap<u32, usize>,
}

impl CalendarIndex {
    /// Build the index for every day from `start` through `end` inclusive
    pub fn build(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if start > end {
            return Err(EngineError::EmptyCalendarRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let mut units = Vec::new();
        let mut current = start;
        while current <= end {
            units.push(CalendarUnit::from_date(current));
            // Days::new(1) cannot overflow within NaiveDate's supported range
            current = match current.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(Self::from_units_sorted(units))
    }

    /// Build from date-key bounds
    pub fn build_from_keys(from_key: u32, to_key: u32) -> EngineResult<Self> {
        Self::build(date_from_key(from_key)?, date_from_key(to_key)?)
    }

    /// Assemble from pre-built units (an upstream time-dimension table)
    ///
    /// Units are sorted and de-duplicated by key; the upstream table is
    /// expected to be daily-grain but the index does not require contiguity.
    pub fn from_units(mut units: Vec<CalendarUnit>) -> Self {
        units.sort_by_key(|u| u.date_key);
        units.dedup_by_key(|u| u.date_key);
        Self::from_units_sorted(units)
    }

    fn from_units_sorted(units: Vec<CalendarUnit>) -> Self {
        let by_key = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.date_key, i))
            .collect();
        Self { units, by_key }
    }

    /// Number of days covered
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// First date key in the index
    pub fn first_key(&self) -> Option<u32> {
        self.units.first().map(|u| u.date_key)
    }

    /// Last date key in the index
    pub fn last_key(&self) -> Option<u32> {
        self.units.last().map(|u| u.date_key)
    }

    /// Look up a single unit by its date key
    pub fn lookup(&self, date_key: u32) -> Option<&CalendarUnit> {
        self.by_key.get(&date_key).map(|&i| &self.units[i])
    }

    /// All units in key order
    pub fn units(&self) -> &[CalendarUnit] {
        &self.units
    }

    /// Ordered units with `from_key <= date_key <= to_key`
    ///
    /// Bounds need not exist in the index: they clamp. A reversed range
    /// yields an empty slice.
    pub fn range(&self, from_key: u32, to_key: u32) -> &[CalendarUnit] {
        if from_key > to_key {
            return &[];
        }
        let lo = self.units.partition_point(|u| u.date_key < from_key);
        let hi = self.units.partition_point(|u| u.date_key <= to_key);
        &self.units[lo..hi]
    }

    /// Non-overlapping windows of at most `window_days` days covering the
    /// given range, in order. Windowed evaluation iterates these so that
    /// daily expansion never materializes the full policy x day product.
    pub fn windows(&self, from_key: u32, to_key: u32, window_days: usize) -> Vec<&[CalendarUnit]> {
        let span = self.range(from_key, to_key);
        if span.is_empty() {
            return Vec::new();
        }
        span.chunks(window_days.max(1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unit_attributes() {
        // 2024-01-06 is a Saturday
        let unit = CalendarUnit::from_date(date(2024, 1, 6));
        assert_eq!(unit.date_key, 20240106);
        assert_eq!(unit.year, 2024);
        assert_eq!(unit.month, 1);
        assert_eq!(unit.month_name, "January");
        assert_eq!(unit.quarter, 1);
        assert_eq!(unit.year_month, "2024-01");
        assert_eq!(unit.day_of_week, 6);
        assert!(unit.is_weekend);
        assert_eq!(unit.month_key(), 202401);
    }

    #[test]
    fn test_build_full_leap_year() {
        let index = CalendarIndex::build(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(index.len(), 366);
        assert_eq!(index.first_key(), Some(20240101));
        assert_eq!(index.last_key(), Some(20241231));

        // Leap day exists and February has 29 days
        assert!(index.lookup(20240229).is_some());
        assert_eq!(index.range(20240201, 20240229).len(), 29);
    }

    #[test]
    fn test_build_rejects_reversed_bounds() {
        let err = CalendarIndex::build(date(2024, 6, 1), date(2024, 1, 1));
        assert!(matches!(err, Err(EngineError::EmptyCalendarRange { .. })));
    }

    #[test]
    fn test_range_clamps_and_reverses() {
        let index = CalendarIndex::build(date(2024, 3, 1), date(2024, 3, 31)).unwrap();

        // Bounds outside the index clamp to its edges
        let all = index.range(20240101, 20251231);
        assert_eq!(all.len(), 31);

        // Inclusive of both endpoints
        let mid = index.range(20240310, 20240312);
        assert_eq!(mid.len(), 3);
        assert_eq!(mid[0].date_key, 20240310);
        assert_eq!(mid[2].date_key, 20240312);

        // Reversed range is empty, not a panic
        assert!(index.range(20240320, 20240310).is_empty());
    }

    #[test]
    fn test_key_date_round_trip() {
        let d = date(2024, 11, 30);
        assert_eq!(date_from_key(key_from_date(d)).unwrap(), d);
        assert!(date_from_key(20240230).is_err());
    }

    #[test]
    fn test_windows_cover_range_without_overlap() {
        let index = CalendarIndex::build(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        let windows = index.windows(20240101, 20241231, 92);

        let total: usize = windows.iter().map(|w| w.len()).sum();
        assert_eq!(total, 366);
        for pair in windows.windows(2) {
            assert!(pair[0].last().unwrap().date_key < pair[1].first().unwrap().date_key);
        }
    }

    #[test]
    fn test_from_units_sorts_and_dedups() {
        let units = vec![
            CalendarUnit::from_date(date(2024, 1, 2)),
            CalendarUnit::from_date(date(2024, 1, 1)),
            CalendarUnit::from_date(date(2024, 1, 2)),
        ];
        let index = CalendarIndex::from_units(units);
        assert_eq!(index.len(), 2);
        assert_eq!(index.first_key(), Some(20240101));
    }
}
