#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use camino::Utf8Path;
use chrono::NaiveDate;

use geospace_series::error::SeriesError;
use geospace_series::fetch::Fetcher;
use geospace_series::store::Store;

/// Deterministic value for `day`/`hour`; odd hours are negative.
pub fn dst_value(day: u32, hour: u32) -> i32 {
    let magnitude = (day * 10 + hour) as i32;
    if hour % 2 == 1 { -magnitude } else { magnitude }
}

/// One day record in the Kyoto layout: day in columns 0..2, hours 1-8 from
/// column 3, an extra separator before hours 9 and 17.
pub fn dst_line(day: u32, values: &[i32; 24]) -> String {
    let mut line = format!("{day:>2} ");
    for (index, value) in values.iter().enumerate() {
        if index == 8 || index == 16 {
            line.push(' ');
        }
        line.push_str(&format!("{value:>4}"));
    }
    line
}

pub fn day_values(day: u32) -> [i32; 24] {
    let mut values = [0; 24];
    for hour in 1..=24u32 {
        values[(hour - 1) as usize] = dst_value(day, hour);
    }
    values
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .filter(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
        .max()
        .unwrap()
}

pub fn dst_block(year: i32, month: u32) -> String {
    let mut text = String::new();
    text.push_str(&format!("           FINAL Dst INDEX   {year} {month:02}\n"));
    text.push_str("                          (Unit=nT)\n");
    text.push_str("\n");
    text.push_str(" 1 2 3 4 5 6 7 8  9 10 11 12 13 14 15 16  17 18 19 20 21 22 23 24\n");
    text.push_str("DAY\n");
    for day in 1..=days_in_month(year, month) {
        text.push_str(&dst_line(day, &day_values(day)));
        text.push('\n');
    }
    text.push('\n');
    text
}

pub fn dst_html(year: i32, month: u32) -> String {
    wrap_html(&format!("<pre class=\"data\">{}</pre>", dst_block(year, month)))
}

pub fn wrap_html(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Dst</title></head><body>\n<h1>Final Dst</h1>\n{body}\n</body></html>\n"
    )
}

/// A sunspot record with the year at 1..5, month at 8..10, raw count at
/// 40..46 and the smoothed value at 66..72.
pub fn sunspot_line(year: i32, month: u32, raw: &str, smoothed: &str) -> String {
    let mut columns = vec![' '; 72];
    let mut place = |offset: usize, width: usize, text: &str| {
        let padded = format!("{text:>width$}");
        for (index, ch) in padded.chars().enumerate() {
            columns[offset + index] = ch;
        }
    };
    place(1, 4, &format!("{year:04}"));
    place(8, 2, &format!("{month:02}"));
    place(40, 6, raw);
    place(66, 6, smoothed);
    columns.into_iter().collect::<String>().trim_end().to_string()
}

pub fn sunspot_table() -> String {
    let mut text = String::new();
    text.push_str("Mitaka monthly sunspot number\n");
    text.push_str(" year  mm                                 raw                  smoothed\n");
    text.push_str(&sunspot_line(1957, 1, "201.3", "235.8"));
    text.push('\n');
    text.push_str(&sunspot_line(1957, 2, "164.1", "238.9"));
    text.push('\n');
    text.push_str(&sunspot_line(2024, 12, "154.5", ""));
    text.push('\n');
    text
}

/// Serves canned bodies by URL and records every request.
#[derive(Default)]
pub struct MockFetcher {
    bodies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn with(mut self, url: &str, body: String) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str, destination: &Utf8Path) -> Result<(), SeriesError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => Store::write_bytes_atomic(destination, body.as_bytes()),
            None => Err(SeriesError::Download {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
