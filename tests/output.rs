mod support;

use camino::Utf8Path;
use chrono::NaiveDate;
use serde_json::Value;

use geospace_series::config::FigureConfig;
use geospace_series::domain::MonthKey;
use geospace_series::dst::parse_dst_document;
use geospace_series::output::{
    CsvOutput, DisplayWindow, DstPlot, JsonOutput, SeriesRenderer, SunspotPlot,
};
use geospace_series::sunspot::parse_sunspot_text;

use support::{dst_html, dst_value, sunspot_table};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn json_dst_is_clipped_to_window() {
    let key = MonthKey::new(1957, 1).unwrap();
    let series = parse_dst_document(&dst_html(1957, 1), key, Utf8Path::new("x.html")).unwrap();
    let figure = FigureConfig {
        width: 10.0,
        height: 3.0,
        dpi: 200.0,
    };
    let plot = DstPlot {
        series: &series,
        window: DisplayWindow::from_dates(date(1957, 1, 2), date(1957, 1, 3)),
        figure,
    };

    let mut output = JsonOutput::new(Vec::new());
    output.render_dst(&plot).unwrap();
    let document: Value = serde_json::from_slice(&output.into_inner()).unwrap();

    assert_eq!(document["dataset"], "dst");
    assert_eq!(document["unit"], "nT");
    assert_eq!(document["figure"]["width"], 10.0);
    assert_eq!(document["figure"]["dpi"], 200.0);
    let samples = document["samples"].as_array().unwrap();
    // 1957-01-02T00:00 through 1957-01-03T00:00 inclusive
    assert_eq!(samples.len(), 25);
    assert_eq!(samples[0]["timestamp"], "1957-01-02T00:00:00");
    assert_eq!(samples[0]["value"], dst_value(1, 24));
    assert_eq!(samples[24]["timestamp"], "1957-01-03T00:00:00");
}

#[test]
fn csv_sunspots_without_window_keep_every_month() {
    let series = parse_sunspot_text(&sunspot_table(), Utf8Path::new("m.txt")).unwrap();
    let plot = SunspotPlot {
        series: &series,
        window: None,
        figure: FigureConfig::default(),
    };

    let mut output = CsvOutput::new(Vec::new());
    output.render_sunspots(&plot).unwrap();
    let text = String::from_utf8(output.into_inner().unwrap()).unwrap();

    assert_eq!(
        text,
        "timestamp,raw,smoothed\n\
         1957-01-01T00:00:00,201.3,235.8\n\
         1957-02-01T00:00:00,164.1,238.9\n"
    );
}

#[test]
fn csv_dst_rows_follow_window() {
    let key = MonthKey::new(1957, 1).unwrap();
    let series = parse_dst_document(&dst_html(1957, 1), key, Utf8Path::new("x.html")).unwrap();
    let plot = DstPlot {
        series: &series,
        window: DisplayWindow::from_dates(date(1957, 1, 31), date(1957, 2, 1)),
        figure: FigureConfig::default(),
    };

    let mut output = CsvOutput::new(Vec::new());
    output.render_dst(&plot).unwrap();
    let text = String::from_utf8(output.into_inner().unwrap()).unwrap();
    let lines = text.lines().collect::<Vec<_>>();

    // 01-31 00:00 (hour 24 of the 30th) through 02-01 00:00 (hour 24 of the 31st)
    assert_eq!(lines.len(), 1 + 25);
    assert_eq!(lines[0], "timestamp,dst_nt");
    assert_eq!(lines[1], format!("1957-01-31T00:00:00,{}", dst_value(30, 24)));
    assert_eq!(lines[25], format!("1957-02-01T00:00:00,{}", dst_value(31, 24)));
}

#[test]
fn csv_header_survives_empty_window() {
    let series = parse_sunspot_text(&sunspot_table(), Utf8Path::new("m.txt")).unwrap();
    let plot = SunspotPlot {
        series: &series,
        window: Some(DisplayWindow::from_dates(date(1800, 1, 1), date(1800, 12, 31))),
        figure: FigureConfig::default(),
    };

    let mut output = CsvOutput::new(Vec::new());
    output.render_sunspots(&plot).unwrap();
    let text = String::from_utf8(output.into_inner().unwrap()).unwrap();
    assert_eq!(text, "timestamp,raw,smoothed\n");
}

#[test]
fn sunspot_window_drops_outside_months() {
    let series = parse_sunspot_text(&sunspot_table(), Utf8Path::new("m.txt")).unwrap();
    let plot = SunspotPlot {
        series: &series,
        window: Some(DisplayWindow::from_dates(date(1957, 2, 1), date(1957, 12, 31))),
        figure: FigureConfig::default(),
    };

    let mut output = JsonOutput::new(Vec::new());
    output.render_sunspots(&plot).unwrap();
    let document: Value = serde_json::from_slice(&output.into_inner()).unwrap();
    let samples = document["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0]["raw"], 164.1);
    assert_eq!(samples[0]["smoothed"], 238.9);
}
