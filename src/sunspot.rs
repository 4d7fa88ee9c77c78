//! Parser for the NAOJ Mitaka monthly sunspot table (`mtkmonthly.txt`).

use std::sync::LazyLock;

use camino::Utf8Path;
use chrono::NaiveDate;

use crate::domain::SunspotSeries;
use crate::error::SeriesError;
use crate::layout::{FieldKind, FieldSpec, char_width};
use crate::store::Store;

/// Column that separates the year from the marker column in data records.
const DISCRIMINATOR_COLUMN: usize = 7;

struct SunspotLayout {
    year: FieldSpec,
    month: FieldSpec,
    raw: FieldSpec,
    smoothed: FieldSpec,
}

static LAYOUT: LazyLock<SunspotLayout> = LazyLock::new(|| SunspotLayout {
    year: FieldSpec::new("year", 1, 4, FieldKind::Integer),
    month: FieldSpec::new("month", 8, 2, FieldKind::Integer),
    raw: FieldSpec::new("raw count", 40, 6, FieldKind::OptionalDecimal),
    smoothed: FieldSpec::new("smoothed count", 66, 6, FieldKind::OptionalDecimal),
});

pub fn is_data_record(line: &str) -> bool {
    (line.starts_with(" 19") || line.starts_with(" 20"))
        && char_width(line) > 8
        && line.chars().nth(DISCRIMINATOR_COLUMN) == Some(' ')
}

pub fn parse_sunspot_file(path: &Utf8Path) -> Result<SunspotSeries, SeriesError> {
    let text = Store::read_to_string(path)?;
    parse_sunspot_text(&text, path)
}

/// Months lacking either the raw or the smoothed value are left out of all
/// three columns.
pub fn parse_sunspot_text(text: &str, path: &Utf8Path) -> Result<SunspotSeries, SeriesError> {
    let layout = &*LAYOUT;
    let mut series = SunspotSeries::new();

    for (index, line) in text.lines().enumerate() {
        if !is_data_record(line) {
            continue;
        }
        let line_no = index + 1;
        let year = layout.year.integer(line, path, line_no)?;
        let month = layout.month.integer(line, path, line_no)?;
        let raw = layout.raw.decimal(line, path, line_no)?;
        let smoothed = layout.smoothed.decimal(line, path, line_no)?;

        let (Some(raw), Some(smoothed)) = (raw, smoothed) else {
            tracing::debug!(%path, line = line_no, year, month, "skipping incomplete month");
            continue;
        };

        let timestamp = u32::try_from(month)
            .ok()
            .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                SeriesError::format(path, format!("line {line_no}: no month {year}-{month}"))
            })?;
        series.push(timestamp, raw, smoothed);
    }

    tracing::debug!(%path, months = series.len(), "parsed sunspot table");
    Ok(series)
}
