use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Serialize;

use crate::error::SeriesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Dst,
    Sunspot,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Dst => write!(f, "dst"),
            Dataset::Sunspot => write!(f, "sunspot"),
        }
    }
}

/// One calendar month; the unit in which Dst data is cached and fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, SeriesError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(SeriesError::InvalidMonthKey(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // year and month are range checked on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every month from `first` through `last`, both inclusive, ascending.
    /// Empty when `first` is after `last`.
    pub fn span(first: MonthKey, last: MonthKey) -> Vec<MonthKey> {
        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(current);
            current = current.succ();
        }
        months
    }

    /// `YYYYMM`, as used in cache file names and the Kyoto URL scheme.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = SeriesError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (year, month) = match trimmed.split_once('-') {
            Some((year, month)) => (year, month),
            None if trimmed.len() == 6 && trimmed.is_ascii() => trimmed.split_at(4),
            None => return Err(SeriesError::InvalidMonthKey(value.to_string())),
        };
        let all_digits =
            |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
        if year.len() != 4 || !all_digits(year) || month.len() > 2 || !all_digits(month) {
            return Err(SeriesError::InvalidMonthKey(value.to_string()));
        }
        let year = year
            .parse()
            .map_err(|_| SeriesError::InvalidMonthKey(value.to_string()))?;
        let month = month
            .parse()
            .map_err(|_| SeriesError::InvalidMonthKey(value.to_string()))?;
        Self::new(year, month).map_err(|_| SeriesError::InvalidMonthKey(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample<V> {
    pub timestamp: NaiveDateTime,
    pub value: V,
}

impl<V> Sample<V> {
    pub fn new(timestamp: NaiveDateTime, value: V) -> Self {
        Self { timestamp, value }
    }
}

/// Hourly Dst values in nanotesla, ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries {
    samples: Vec<Sample<i32>>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample<i32>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample<i32>> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample<i32>> {
        self.samples.last()
    }

    pub(crate) fn push(&mut self, sample: Sample<i32>) {
        self.samples.push(sample);
    }

    /// Appends a later month. The caller supplies months in ascending order.
    pub fn append(&mut self, mut other: TimeSeries) {
        self.samples.append(&mut other.samples);
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }

    pub fn into_samples(self) -> Vec<Sample<i32>> {
        self.samples
    }
}

impl FromIterator<Sample<i32>> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = Sample<i32>>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Monthly sunspot numbers as three index-aligned columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SunspotSeries {
    timestamps: Vec<NaiveDateTime>,
    raw: Vec<f64>,
    smoothed: Vec<f64>,
}

impl SunspotSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, timestamp: NaiveDateTime, raw: f64, smoothed: f64) {
        self.timestamps.push(timestamp);
        self.raw.push(raw);
        self.smoothed.push(smoothed);
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn smoothed(&self) -> &[f64] {
        &self.smoothed
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64, f64)> + '_ {
        self.timestamps
            .iter()
            .zip(&self.raw)
            .zip(&self.smoothed)
            .map(|((timestamp, raw), smoothed)| (*timestamp, *raw, *smoothed))
    }

    /// Months whose timestamp falls inside `[start, end]`, both inclusive.
    pub fn window(&self, start: NaiveDateTime, end: NaiveDateTime) -> SunspotSeries {
        let mut windowed = SunspotSeries::new();
        for (timestamp, raw, smoothed) in self.iter() {
            if timestamp >= start && timestamp <= end {
                windowed.push(timestamp, raw, smoothed);
            }
        }
        windowed
    }
}
