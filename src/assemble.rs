use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use chrono::NaiveDate;

use crate::config::Sources;
use crate::domain::{Dataset, MonthKey, SunspotSeries, TimeSeries};
use crate::dst::parse_dst_file;
use crate::error::SeriesError;
use crate::fetch::Fetcher;
use crate::store::Store;
use crate::sunspot::parse_sunspot_file;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Whether a cache entry was already present or had to be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Downloaded,
}

/// Drives store, fetcher and parsers over a requested range.
///
/// Every step is sequential and the first error aborts the whole run; no
/// month is retried and no partial series is returned.
pub struct Assembler<F: Fetcher> {
    store: Store,
    fetcher: F,
    sources: Sources,
}

impl<F: Fetcher> Assembler<F> {
    pub fn new(store: Store, fetcher: F, sources: Sources) -> Self {
        Self {
            store,
            fetcher,
            sources,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Months touched by the inclusive date range, ascending.
    pub fn months(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthKey>, SeriesError> {
        if start > end {
            return Err(SeriesError::InvalidDateRange { start, end });
        }
        Ok(MonthKey::span(
            MonthKey::containing(start),
            MonthKey::containing(end),
        ))
    }

    /// Hourly Dst values for every month overlapping `[start, end]`.
    ///
    /// Whole months are returned; trimming to the exact dates is left to the
    /// renderer.
    pub fn assemble_dst(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        sink: &dyn ProgressSink,
    ) -> Result<TimeSeries, SeriesError> {
        let months = Self::months(start, end)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; {} month(s) from {} to {}",
                months.len(),
                months.first().map(ToString::to_string).unwrap_or_default(),
                months.last().map(ToString::to_string).unwrap_or_default(),
            ),
            elapsed: None,
        });

        let mut series = TimeSeries::new();
        for key in months {
            series.append(self.dst_month(key, sink)?);
        }
        Ok(series)
    }

    pub fn dst_month(
        &self,
        key: MonthKey,
        sink: &dyn ProgressSink,
    ) -> Result<TimeSeries, SeriesError> {
        let url = self.sources.dst_url(key);
        let (path, _) = self.ensure_cached(Dataset::Dst, Some(key), &url, sink)?;
        sink.event(ProgressEvent {
            message: format!("phase=Parse; dst {key}"),
            elapsed: None,
        });
        parse_dst_file(&path, key)
    }

    /// The whole sunspot table; windowing is left to the renderer.
    pub fn load_sunspots(&self, sink: &dyn ProgressSink) -> Result<SunspotSeries, SeriesError> {
        let url = self.sources.sunspot_url().to_string();
        let (path, _) = self.ensure_cached(Dataset::Sunspot, None, &url, sink)?;
        sink.event(ProgressEvent {
            message: "phase=Parse; sunspot table".to_string(),
            elapsed: None,
        });
        parse_sunspot_file(&path)
    }

    /// Resolves the cache path and downloads `url` into it when absent.
    pub fn ensure_cached(
        &self,
        dataset: Dataset,
        key: Option<MonthKey>,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(Utf8PathBuf, CacheOutcome), SeriesError> {
        let path = self.store.path(dataset, key)?;
        if self.store.exists(&path) {
            tracing::debug!(%path, "cache hit");
            sink.event(ProgressEvent {
                message: format!("phase=Resolve; using cached {path}"),
                elapsed: None,
            });
            return Ok((path, CacheOutcome::Hit));
        }

        self.store.ensure_cache_root()?;
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {url}"),
            elapsed: None,
        });
        let started = Instant::now();
        self.fetcher.fetch(url, &path)?;
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; saved {path}"),
            elapsed: Some(started.elapsed()),
        });
        Ok((path, CacheOutcome::Downloaded))
    }
}
