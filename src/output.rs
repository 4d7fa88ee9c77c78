use std::io::{self, Write};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::Serialize;

use crate::assemble::{ProgressEvent, ProgressSink};
use crate::config::FigureConfig;
use crate::domain::{Dataset, Sample, SunspotSeries, TimeSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Visible time range of a plot, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DisplayWindow {
    /// Midnight of `start` through midnight of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

pub struct DstPlot<'a> {
    pub series: &'a TimeSeries,
    pub window: DisplayWindow,
    pub figure: FigureConfig,
}

pub struct SunspotPlot<'a> {
    pub series: &'a SunspotSeries,
    pub window: Option<DisplayWindow>,
    pub figure: FigureConfig,
}

/// Consumer of assembled series.
pub trait SeriesRenderer {
    fn render_dst(&mut self, plot: &DstPlot<'_>) -> io::Result<()>;
    fn render_sunspots(&mut self, plot: &SunspotPlot<'_>) -> io::Result<()>;
}

#[derive(Serialize)]
struct DstDocument<'a> {
    dataset: Dataset,
    unit: &'static str,
    window: DisplayWindow,
    figure: FigureConfig,
    samples: Vec<&'a Sample<i32>>,
}

#[derive(Serialize)]
struct SunspotRow {
    timestamp: NaiveDateTime,
    raw: f64,
    smoothed: f64,
}

#[derive(Serialize)]
struct SunspotDocument {
    dataset: Dataset,
    window: Option<DisplayWindow>,
    figure: FigureConfig,
    samples: Vec<SunspotRow>,
}

fn windowed_sunspots(plot: &SunspotPlot<'_>) -> SunspotSeries {
    match plot.window {
        Some(window) => plot.series.window(window.start, window.end),
        None => plot.series.clone(),
    }
}

pub struct JsonOutput<W: Write> {
    writer: W,
}

impl<W: Write> JsonOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> SeriesRenderer for JsonOutput<W> {
    fn render_dst(&mut self, plot: &DstPlot<'_>) -> io::Result<()> {
        let samples = plot
            .series
            .samples()
            .iter()
            .filter(|sample| plot.window.contains(sample.timestamp))
            .collect();
        self.write_json(&DstDocument {
            dataset: Dataset::Dst,
            unit: "nT",
            window: plot.window,
            figure: plot.figure,
            samples,
        })
    }

    fn render_sunspots(&mut self, plot: &SunspotPlot<'_>) -> io::Result<()> {
        let samples = windowed_sunspots(plot)
            .iter()
            .map(|(timestamp, raw, smoothed)| SunspotRow {
                timestamp,
                raw,
                smoothed,
            })
            .collect();
        self.write_json(&SunspotDocument {
            dataset: Dataset::Sunspot,
            window: plot.window,
            figure: plot.figure,
            samples,
        })
    }
}

impl<W: Write> ProgressSink for JsonOutput<W> {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Serialize)]
struct DstRow {
    timestamp: NaiveDateTime,
    dst_nt: i32,
}

/// One header line, then one row per sample. Figure settings are not
/// representable here and are dropped.
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvOutput<W> {
    pub fn new(writer: W) -> Self {
        // headers are written explicitly so an empty window still gets one
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        Self { writer }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}

impl<W: Write> SeriesRenderer for CsvOutput<W> {
    fn render_dst(&mut self, plot: &DstPlot<'_>) -> io::Result<()> {
        self.writer.write_record(["timestamp", "dst_nt"])?;
        for sample in plot.series.samples() {
            if plot.window.contains(sample.timestamp) {
                self.writer.serialize(DstRow {
                    timestamp: sample.timestamp,
                    dst_nt: sample.value,
                })?;
            }
        }
        self.writer.flush()
    }

    fn render_sunspots(&mut self, plot: &SunspotPlot<'_>) -> io::Result<()> {
        self.writer.write_record(["timestamp", "raw", "smoothed"])?;
        for (timestamp, raw, smoothed) in windowed_sunspots(plot).iter() {
            self.writer.serialize(SunspotRow {
                timestamp,
                raw,
                smoothed,
            })?;
        }
        self.writer.flush()
    }
}

/// Prints progress lines to stderr.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.1}s)", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}
