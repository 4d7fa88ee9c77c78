use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use geospace_series::assemble::{Assembler, ProgressSink, SilentSink};
use geospace_series::config::{ConfigLoader, FigureConfig, ResolvedConfig, validate_figure};
use geospace_series::domain::{Dataset, MonthKey};
use geospace_series::error::SeriesError;
use geospace_series::fetch::HttpFetcher;
use geospace_series::output::{
    CsvOutput, DisplayWindow, DstPlot, JsonOutput, OutputFormat, SeriesRenderer, StderrProgress,
    SunspotPlot,
};
use geospace_series::store::Store;

#[derive(Parser)]
#[command(name = "geospace")]
#[command(about = "Fetch and cache the Kyoto Dst index and NAOJ monthly sunspot numbers")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Directory holding downloaded files (default: cache)
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<String>,

    /// JSON config file (default: geospace.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write the rendered series here instead of stdout
    #[arg(long, global = true, value_name = "FILE")]
    output: Option<String>,

    /// Figure width in inches
    #[arg(long, global = true)]
    width: Option<f64>,

    /// Figure height in inches
    #[arg(long, global = true)]
    height: Option<f64>,

    #[arg(long, global = true)]
    dpi: Option<f64>,

    /// Request timeout; 0 waits indefinitely
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Suppress progress messages on stderr
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Hourly Dst index for a date range")]
    Dst(DstArgs),
    #[command(about = "Monthly sunspot numbers, raw and 13-month smoothed")]
    Sunspot(SunspotArgs),
    #[command(about = "Inspect the download cache")]
    Cache(CacheArgs),
}

#[derive(Args)]
struct DstArgs {
    #[arg(long, value_name = "DATE", value_parser = parse_date, default_value = "1957-01-01")]
    start_date: NaiveDate,

    #[arg(long, value_name = "DATE", value_parser = parse_date, default_value = "1957-12-31")]
    end_date: NaiveDate,
}

#[derive(Args)]
struct SunspotArgs {
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    start_date: Option<NaiveDate>,

    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    end_date: Option<NaiveDate>,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommand,
}

#[derive(Subcommand)]
enum CacheCommand {
    #[command(about = "Print the cache path of a dataset (dst needs YYYY-MM)")]
    Path {
        #[arg(value_enum)]
        dataset: Dataset,
        month: Option<String>,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SeriesError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SeriesError) -> u8 {
    match error {
        SeriesError::InvalidDateRange { .. }
        | SeriesError::InvalidMonthKey(_)
        | SeriesError::InvalidUrl(_)
        | SeriesError::ConfigRead(_)
        | SeriesError::ConfigParse(_) => 2,
        SeriesError::Download { .. } | SeriesError::Http { .. } => 3,
        SeriesError::Format { .. } | SeriesError::Parse { .. } => 4,
        SeriesError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.global.config.as_deref())?;
    let config = apply_overrides(config, &cli.global)?;
    let store = Store::new(config.cache_dir.clone());

    match cli.command {
        Commands::Dst(args) => run_dst(args, store, &config, &cli.global),
        Commands::Sunspot(args) => run_sunspot(args, store, &config, &cli.global),
        Commands::Cache(args) => run_cache(args, store),
    }
}

fn apply_overrides(
    mut config: ResolvedConfig,
    global: &GlobalArgs,
) -> Result<ResolvedConfig, SeriesError> {
    if let Some(cache_dir) = &global.cache_dir {
        config.cache_dir = Utf8PathBuf::from(cache_dir);
    }
    if let Some(secs) = global.timeout_secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config.figure = FigureConfig {
        width: global.width.unwrap_or(config.figure.width),
        height: global.height.unwrap_or(config.figure.height),
        dpi: global.dpi.unwrap_or(config.figure.dpi),
    };
    validate_figure(&config.figure)?;
    Ok(config)
}

fn run_dst(
    args: DstArgs,
    store: Store,
    config: &ResolvedConfig,
    global: &GlobalArgs,
) -> miette::Result<()> {
    if args.start_date >= args.end_date {
        return Err(SeriesError::InvalidDateRange {
            start: args.start_date,
            end: args.end_date,
        }
        .into());
    }

    let fetcher = HttpFetcher::new(config.timeout)?;
    let assembler = Assembler::new(store, fetcher, config.sources.clone());
    let sink = progress(global);
    let series = assembler.assemble_dst(args.start_date, args.end_date, sink.as_ref())?;
    tracing::info!(samples = series.len(), "dst series assembled");

    let plot = DstPlot {
        series: &series,
        window: DisplayWindow::from_dates(args.start_date, args.end_date),
        figure: config.figure,
    };
    let mut renderer = renderer(global)?;
    renderer.render_dst(&plot).into_diagnostic()
}

fn run_sunspot(
    args: SunspotArgs,
    store: Store,
    config: &ResolvedConfig,
    global: &GlobalArgs,
) -> miette::Result<()> {
    let window = match (args.start_date, args.end_date) {
        (None, None) => None,
        (start, end) => {
            let start = start.unwrap_or(NaiveDate::MIN);
            let end = end.unwrap_or(NaiveDate::MAX);
            if start >= end {
                return Err(SeriesError::InvalidDateRange { start, end }.into());
            }
            Some(DisplayWindow::from_dates(start, end))
        }
    };

    let fetcher = HttpFetcher::new(config.timeout)?;
    let assembler = Assembler::new(store, fetcher, config.sources.clone());
    let sink = progress(global);
    let series = assembler.load_sunspots(sink.as_ref())?;
    tracing::info!(months = series.len(), "sunspot series loaded");

    let plot = SunspotPlot {
        series: &series,
        window,
        figure: config.figure,
    };
    let mut renderer = renderer(global)?;
    renderer.render_sunspots(&plot).into_diagnostic()
}

fn run_cache(args: CacheArgs, store: Store) -> miette::Result<()> {
    match args.command {
        CacheCommand::Path { dataset, month } => {
            let key = month.map(|value| value.parse::<MonthKey>()).transpose()?;
            let path = store.path(dataset, key)?;
            let state = if store.exists(&path) { "cached" } else { "missing" };
            println!("{path}\t{state}");
            Ok(())
        }
    }
}

fn progress(global: &GlobalArgs) -> Box<dyn ProgressSink> {
    if global.quiet {
        Box::new(SilentSink)
    } else {
        Box::new(StderrProgress)
    }
}

fn renderer(global: &GlobalArgs) -> miette::Result<Box<dyn SeriesRenderer>> {
    let writer: Box<dyn Write> = match &global.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .map_err(|err| SeriesError::Filesystem(format!("create {path}: {err}")))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    Ok(match global.format {
        OutputFormat::Json => Box::new(JsonOutput::new(writer)),
        OutputFormat::Csv => Box::new(CsvOutput::new(writer)),
    })
}
