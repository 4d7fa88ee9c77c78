//! Parser for the monthly Dst pages of the WDC for Geomagnetism, Kyoto.
//!
//! Each page carries one `<pre class="data">` block. Below a line reading
//! `DAY` every non-blank line holds one day: the day of month in the first two
//! columns followed by 24 hourly values, four columns each. The table inserts
//! an extra separator column before hour 9 and again before hour 17, so the
//! hourly fields do not sit on a uniform stride.

use std::sync::LazyLock;

use camino::Utf8Path;
use chrono::{NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};

use crate::domain::{MonthKey, Sample, TimeSeries};
use crate::error::SeriesError;
use crate::layout::{FieldKind, FieldSpec, char_width, required_width};
use crate::store::Store;

pub const HOURS_PER_DAY: u32 = 24;
const DATA_SECTION_MARKER: &str = "DAY";
const DATA_BLOCK_SELECTOR: &str = "pre.data";

/// First column of the four-character field holding `hour`; `None` outside
/// 1..=24.
pub fn hour_offset(hour: u32) -> Option<usize> {
    if !(1..=HOURS_PER_DAY).contains(&hour) {
        return None;
    }
    let hour = hour as usize;
    Some(if hour <= 8 {
        hour * 4 - 1
    } else if hour <= 16 {
        hour * 4
    } else {
        hour * 4 + 1
    })
}

pub fn hour_field(hour: u32) -> Option<FieldSpec> {
    let offset = hour_offset(hour)?;
    Some(FieldSpec::new(format!("hour {hour}"), offset, 4, FieldKind::Integer))
}

static DAY_FIELD: LazyLock<FieldSpec> =
    LazyLock::new(|| FieldSpec::new("day", 0, 2, FieldKind::Integer));

static HOUR_FIELDS: LazyLock<Vec<FieldSpec>> =
    LazyLock::new(|| (1..=HOURS_PER_DAY).filter_map(hour_field).collect());

/// Characters a day record must have: through the end of the hour 24 field.
pub fn record_width() -> usize {
    required_width(&HOUR_FIELDS).max(DAY_FIELD.end())
}

pub fn parse_dst_file(path: &Utf8Path, key: MonthKey) -> Result<TimeSeries, SeriesError> {
    let html = Store::read_to_string(path)?;
    parse_dst_document(&html, key, path)
}

/// Locates the single data block in `html` and parses it.
pub fn parse_dst_document(
    html: &str,
    key: MonthKey,
    path: &Utf8Path,
) -> Result<TimeSeries, SeriesError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(DATA_BLOCK_SELECTOR)
        .map_err(|err| SeriesError::format(path, err.to_string()))?;
    let mut blocks = document.select(&selector);
    let block = match (blocks.next(), blocks.next()) {
        (Some(block), None) => block,
        (None, _) => {
            return Err(SeriesError::format(path, "no <pre class=\"data\"> block found"));
        }
        (Some(_), Some(_)) => {
            return Err(SeriesError::format(
                path,
                "multiple <pre class=\"data\"> blocks found",
            ));
        }
    };
    let text = block.text().collect::<String>();
    parse_dst_block(&text, key, path)
}

/// Parses the text content of a data block for month `key`.
pub fn parse_dst_block(
    text: &str,
    key: MonthKey,
    path: &Utf8Path,
) -> Result<TimeSeries, SeriesError> {
    let mut series = TimeSeries::new();
    let mut in_data = false;
    let mut previous: Option<NaiveDateTime> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed == DATA_SECTION_MARKER {
            in_data = true;
            continue;
        }
        if !in_data || trimmed.is_empty() {
            continue;
        }

        let width = char_width(line);
        if width < record_width() {
            return Err(SeriesError::format(
                path,
                format!(
                    "line {line_no} has {width} characters, a day record needs {}",
                    record_width()
                ),
            ));
        }

        let day = DAY_FIELD.integer(line, path, line_no)?;
        let date = u32::try_from(day)
            .ok()
            .and_then(|day| NaiveDate::from_ymd_opt(key.year(), key.month(), day))
            .ok_or_else(|| {
                SeriesError::format(path, format!("line {line_no}: day {day} is not in {key}"))
            })?;

        for (hour, field) in (1..=HOURS_PER_DAY).zip(HOUR_FIELDS.iter()) {
            let value = field.integer(line, path, line_no)?;
            let timestamp = hour_timestamp(date, hour).ok_or_else(|| {
                SeriesError::format(
                    path,
                    format!("line {line_no}: hour {hour} overflows the calendar"),
                )
            })?;
            if previous.is_some_and(|previous| timestamp <= previous) {
                return Err(SeriesError::format(
                    path,
                    format!("line {line_no}: day {day} is out of order"),
                ));
            }
            previous = Some(timestamp);
            series.push(Sample::new(timestamp, value));
        }
    }

    tracing::debug!(%path, month = %key, samples = series.len(), "parsed dst month");
    Ok(series)
}

/// Hours 1..=23 stay on `date`; hour 24 is midnight of the following day.
pub fn hour_timestamp(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    if hour == HOURS_PER_DAY {
        date.succ_opt()?.and_hms_opt(0, 0, 0)
    } else {
        date.and_hms_opt(hour, 0, 0)
    }
}
