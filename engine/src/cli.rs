use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shared::models::{DateRange, GroupPriceSeries, PriceSeries};
use std::path::{Path, PathBuf};

use engine::config::AnalysisSettings;
use engine::data::csv_parser::PriceCsvParser;
use engine::data::market_data;
use engine::indicators::{ChartOptions, Indicator};
use engine::{Candlestick, ExponentialMovingAverage, GroupAnalyzer, Macd, MovingAverage, OperationArgs};

#[derive(Parser)]
#[command(name = "stock-engine")]
#[command(about = "Technical analysis over daily OHLCV price tables", long_about = None)]
pub struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Date window; when none of the flags is given the whole table is used.
#[derive(Args, Debug, Clone, Default)]
pub struct DateWindow {
    /// Window of this many days ending today (overrides --from/--to)
    #[arg(long)]
    pub days: Option<u32>,
    /// Lower bound, DD/MM/YYYY
    #[arg(long)]
    pub from: Option<String>,
    /// Upper bound, DD/MM/YYYY (requires --from)
    #[arg(long)]
    pub to: Option<String>,
}

impl DateWindow {
    fn is_empty(&self) -> bool {
        self.days.is_none() && self.from.is_none() && self.to.is_none()
    }

    fn resolve(&self, settings: &AnalysisSettings) -> Result<DateRange> {
        Ok(settings
            .date_range_resolver()
            .resolve(self.days, self.from.as_deref(), self.to.as_deref())?)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum IndicatorKind {
    Candlestick,
    Ma,
    Ema,
    Macd,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a date window and print it
    Range {
        #[command(flatten)]
        window: DateWindow,
    },
    /// Run one analyzer operation on every symbol of a price table
    Analyze {
        /// Price table CSV
        #[arg(long)]
        csv: PathBuf,
        /// Operation name, e.g. last_close, resistance, beta
        operation: String,
        /// Grouping column
        #[arg(long, default_value = "name")]
        group_by: String,
        #[arg(long)]
        level: Option<u8>,
        /// Look-back for daily_std/volatility (defaults to trading_days from settings)
        #[arg(long)]
        periods: Option<usize>,
        /// Risk-free rate (percent for alpha, plain rate for sharpe_ratio; defaults to settings)
        #[arg(long)]
        risk_free_rate: Option<f64>,
        /// Benchmark index CSV for beta/alpha
        #[arg(long)]
        index: Option<PathBuf>,
        /// Table CSV for corr_with
        #[arg(long)]
        other: Option<PathBuf>,
        #[command(flatten)]
        window: DateWindow,
    },
    /// Compute an indicator for one symbol and print its chart descriptor
    Indicator {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(value_enum)]
        kind: IndicatorKind,
        /// Window for ma/ema
        #[arg(long)]
        moving_days: Option<usize>,
        #[arg(long)]
        low: Option<usize>,
        #[arg(long)]
        high: Option<usize>,
        #[arg(long)]
        exp: Option<usize>,
        /// Style options passed to the renderer, as a JSON object
        #[arg(long)]
        options: Option<String>,
        #[command(flatten)]
        window: DateWindow,
    },
    /// Close statistics per symbol
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        window: DateWindow,
    },
    /// Per-date sums across all symbols
    Portfolio {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        window: DateWindow,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => AnalysisSettings::load(path)?,
        None => AnalysisSettings::default(),
    };

    match cli.command {
        Commands::Range { window } => print_json(&window.resolve(&settings)?),
        Commands::Analyze {
            csv,
            operation,
            group_by,
            level,
            periods,
            risk_free_rate,
            index,
            other,
            window,
        } => {
            let group = load_group(&settings, &csv, &window)?;
            let index = index.map(|p| load_series(&settings, &p, &window)).transpose()?;
            let other = other.map(|p| load_series(&settings, &p, &window)).transpose()?;

            let defaults = settings.operation_args();
            let args = OperationArgs {
                level,
                periods: periods.or(defaults.periods),
                risk_free_rate: risk_free_rate.or(defaults.risk_free_rate),
                index: index.as_ref(),
                other: other.as_ref(),
            };
            let analyzer = GroupAnalyzer::with_group_column(&group, &group_by)?;
            print_json(&analyzer.analyze(&operation, &args)?)
        }
        Commands::Indicator {
            csv,
            symbol,
            kind,
            moving_days,
            low,
            high,
            exp,
            options,
            window,
        } => {
            let group = load_group(&settings, &csv, &window)?;
            let series = group.series_for(&symbol.to_uppercase());
            if series.is_empty() {
                return Err(anyhow!("No rows for symbol '{}' in {}", symbol, csv.display()));
            }
            let options: ChartOptions = match options {
                Some(raw) => serde_json::from_str(&raw).context("--options must be a JSON object")?,
                None => ChartOptions::new(),
            };
            let moving_days = moving_days.unwrap_or(settings.moving_days);

            let chart = match kind {
                IndicatorKind::Candlestick => Candlestick::new(&series).plot(options)?,
                IndicatorKind::Ma => MovingAverage::new(&series, moving_days).plot(options)?,
                IndicatorKind::Ema => ExponentialMovingAverage::new(&series, moving_days).plot(options)?,
                IndicatorKind::Macd => Macd::new(
                    &series,
                    low.unwrap_or(settings.macd_low),
                    high.unwrap_or(settings.macd_high),
                    exp.unwrap_or(settings.macd_exp),
                )
                .plot(options)?,
            };
            print_json(&chart)
        }
        Commands::Summary { csv, window } => {
            let group = load_group(&settings, &csv, &window)?;
            let analyzer = GroupAnalyzer::new(&group)?;
            print_json(&analyzer.summary())
        }
        Commands::Portfolio { csv, window } => {
            let group = load_group(&settings, &csv, &window)?;
            print_json(&market_data::portfolio(&group))
        }
    }
}

fn load_group(settings: &AnalysisSettings, path: &Path, window: &DateWindow) -> Result<GroupPriceSeries> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Non UTF-8 path: {}", path.display()))?;
    let group = PriceCsvParser::from_settings(settings).load_from_csv(path_str)?;
    if window.is_empty() {
        return Ok(group);
    }
    let range = window.resolve(settings)?;
    let (from, to) = range.parse_bounds(shared::utils::DATE_FORMAT)?;
    tracing::info!(%range, "Restricting price table to date window");
    Ok(group.between(from, to))
}

fn load_series(settings: &AnalysisSettings, path: &Path, window: &DateWindow) -> Result<PriceSeries> {
    let group = load_group(settings, path, window)?;
    Ok(PriceSeries::new(group.bars().to_vec()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
