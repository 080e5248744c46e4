//! CLI command definitions and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    validate_analysis_config, validate_data_config, validate_portfolio_config,
};
use crate::domain::engine_config::{parse_lookbacks, EngineConfig};
use crate::domain::error::EngineError;
use crate::domain::frame::Frame;
use crate::domain::portfolio::Portfolio;
use crate::domain::series::Frequency;
use crate::domain::summary::summary_table;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "navport", about = "Portfolio time-series engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Performance summary over the configured lookback windows
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "-")]
        output: String,
        /// Deduct transaction costs before computing the summary
        #[arg(long)]
        net: bool,
    },
    /// Per-asset MTD/YTD contribution and recent trading-day weights
    Snapshot {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Weights aggregated by sector
    Sectors {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Recent weights next to today's extrapolated weights
    State {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Write ironed weights
    Iron {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "-")]
        output: String,
        /// Iron by threshold, overriding any configured rule
        #[arg(long, conflicts_with = "rule")]
        threshold: Option<f64>,
        /// Iron by calendar rule (W, M, Q, A) instead of by threshold
        #[arg(long)]
        rule: Option<String>,
    },
    /// List drawdown periods of the portfolio nav
    Drawdowns {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Summary {
            config,
            output,
            net,
        } => run_summary(&config, &output, net),
        Command::Snapshot { config, output } => run_snapshot(&config, &output),
        Command::Sectors { config, output } => run_sectors(&config, &output),
        Command::State { config, output } => run_state(&config, &output),
        Command::Iron {
            config,
            output,
            threshold,
            rule,
        } => run_iron(&config, &output, threshold, rule.as_deref()),
        Command::Drawdowns { config } => run_drawdowns(&config),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_engine_config(adapter: &dyn ConfigPort) -> Result<EngineConfig, EngineError> {
    let defaults = EngineConfig::default();
    let lookbacks = match adapter.get_string("analysis", "lookbacks") {
        Some(value) if !value.trim().is_empty() => parse_lookbacks(&value)?,
        _ => defaults.lookbacks.clone(),
    };
    let iron_rule = match adapter.get_string("portfolio", "iron_rule") {
        Some(rule) if !rule.trim().is_empty() => Some(rule.parse::<Frequency>()?),
        _ => None,
    };

    Ok(EngineConfig {
        alpha: adapter.get_double("analysis", "alpha", defaults.alpha),
        risk_free_rate: adapter.get_double("analysis", "risk_free_rate", defaults.risk_free_rate),
        periods_per_year: adapter.get_optional_double("analysis", "periods_per_year"),
        drawdown_eps: adapter.get_double("analysis", "drawdown_eps", defaults.drawdown_eps),
        lookbacks,
        iron_threshold: adapter.get_double("portfolio", "iron_threshold", defaults.iron_threshold),
        iron_rule,
        snapshot_days: adapter.get_count("portfolio", "snapshot_days", defaults.snapshot_days),
        top_n: adapter.get_count("portfolio", "top_n", defaults.top_n),
        fund_size: adapter.get_double("portfolio", "fund_size", defaults.fund_size),
        trade_threshold: adapter.get_double("portfolio", "trade_threshold", defaults.trade_threshold),
        transaction_cost_bps: adapter.get_double(
            "portfolio",
            "transaction_cost_bps",
            defaults.transaction_cost_bps,
        ),
    })
}

/// CSV data source from the `[data]` section; relative paths are resolved
/// against the directory of the config file.
pub fn build_data_adapter(
    adapter: &FileConfigAdapter,
    config_path: &Path,
) -> Result<CsvAdapter, EngineError> {
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let prices = adapter
        .get_path("data", "prices", base)
        .ok_or_else(|| EngineError::ConfigMissing {
            section: "data".into(),
            key: "prices".into(),
        })?;
    let mut csv = CsvAdapter::new(prices);
    if let Some(weights) = adapter.get_path("data", "weights", base) {
        csv = csv.with_weights(weights);
    }
    if let Some(sectors) = adapter.get_path("data", "sectors", base) {
        csv = csv.with_sectors(sectors);
    }
    Ok(csv)
}

/// Lay sparse weight observations onto the price dates. Weight dates
/// without a price are rejected.
pub fn align_weights(prices: &Frame, weights: &Frame) -> Result<Frame, EngineError> {
    if let Some(date) = weights
        .index()
        .iter()
        .find(|d| prices.position(**d).is_none())
    {
        return Err(EngineError::Data {
            reason: format!("weights dated {date} have no matching prices"),
        });
    }
    weights.reindex(prices.index())
}

pub fn load_portfolio(data: &dyn DataPort) -> Result<Portfolio, EngineError> {
    let prices = data.fetch_prices()?;
    match data.fetch_weights()? {
        Some(weights) => {
            let weights = align_weights(&prices, &weights)?;
            Portfolio::new(prices, weights)
        }
        None => {
            tracing::warn!("no weights configured, portfolio holds cash only");
            Portfolio::from_prices(prices)
        }
    }
}

struct Session {
    config: EngineConfig,
    data: CsvAdapter,
}

fn open_session(config_path: &Path) -> Result<Session, EngineError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    validate_analysis_config(&adapter)?;
    validate_portfolio_config(&adapter)?;
    Ok(Session {
        config: build_engine_config(&adapter)?,
        data: build_data_adapter(&adapter, config_path)?,
    })
}

fn run_summary(config_path: &Path, output: &str, net: bool) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let config = &session.config;
    let portfolio = load_portfolio(&session.data)?;
    let nav = if net {
        eprintln!(
            "Deducting transaction costs at {} bps",
            config.transaction_cost_bps
        );
        portfolio.nav_net_of_costs(config.transaction_cost_bps)?
    } else {
        portfolio.nav()?
    };
    eprintln!(
        "Computing summary for {} dates over {} windows",
        nav.len(),
        config.lookbacks.len()
    );
    let table = summary_table(
        &nav,
        &config.lookbacks,
        config.alpha,
        config.periods_per_year,
        config.risk_free_rate,
    );
    session.data.write_summary(&table, output)
}

fn run_snapshot(config_path: &Path, output: &str) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let portfolio = load_portfolio(&session.data)?;
    let config = &session.config;
    let snapshot =
        portfolio.snapshot_with(config.snapshot_days, config.fund_size, config.trade_threshold)?;
    session.data.write_table(&snapshot, output)?;

    let today = portfolio.last_date()?;
    let top_flop = portfolio.top_flop_mtd(config.top_n, today);
    for (asset, r) in &top_flop.top {
        eprintln!("  top   {asset:<12} {:>8.2}%", 100.0 * r);
    }
    for (asset, r) in &top_flop.flop {
        eprintln!("  flop  {asset:<12} {:>8.2}%", 100.0 * r);
    }
    Ok(())
}

fn run_sectors(config_path: &Path, output: &str) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let sectors = session.data.fetch_sector_map()?;
    if sectors.is_empty() {
        return Err(EngineError::ConfigMissing {
            section: "data".into(),
            key: "sectors".into(),
        });
    }
    let portfolio = load_portfolio(&session.data)?;
    let frame = portfolio.sector_weights(&sectors, true)?;
    session.data.write_frame(&frame, output)
}

fn run_state(config_path: &Path, output: &str) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let portfolio = load_portfolio(&session.data)?;
    let config = &session.config;
    let state = portfolio.state_with(config.fund_size, config.trade_threshold)?;
    session.data.write_table(&state, output)
}

fn run_iron(
    config_path: &Path,
    output: &str,
    threshold: Option<f64>,
    rule: Option<&str>,
) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let config = &session.config;
    let portfolio = load_portfolio(&session.data)?;

    // an explicit threshold beats the configured rule
    let rule = match (rule, threshold) {
        (Some(r), _) => Some(r.parse::<Frequency>()?),
        (None, Some(_)) => None,
        (None, None) => config.iron_rule,
    };
    let ironed = match rule {
        Some(freq) => {
            eprintln!("Ironing by rule {freq}");
            portfolio.iron_time(freq)
        }
        None => {
            let threshold = threshold.unwrap_or(config.iron_threshold);
            eprintln!("Ironing with threshold {threshold}");
            portfolio.iron_threshold(threshold)
        }
    };

    let before = portfolio.trading_days_with(config.fund_size, config.trade_threshold);
    let after = ironed.trading_days_with(config.fund_size, config.trade_threshold);
    let cost = |p: &Portfolio| {
        p.transaction_costs(config.transaction_cost_bps)
            .values()
            .iter()
            .sum::<f64>()
    };
    eprintln!(
        "Trading days: {} -> {}, transaction costs: {:.6} -> {:.6}",
        before.len(),
        after.len(),
        cost(&portfolio),
        cost(&ironed)
    );
    session.data.write_frame(ironed.weights(), output)
}

fn run_drawdowns(config_path: &Path) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let nav = load_portfolio(&session.data)?.nav()?;
    let periods = nav.drawdown_periods(session.config.drawdown_eps)?;
    if periods.is_empty() {
        eprintln!("No drawdown periods");
    }
    println!("start,days");
    for (start, duration) in &periods {
        println!("{},{}", start.format("%Y-%m-%d"), duration.num_days());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), EngineError> {
    let session = open_session(config_path)?;
    let portfolio = load_portfolio(&session.data)?;
    eprintln!(
        "Portfolio with {} assets over {} dates",
        portfolio.assets().len(),
        portfolio.len()
    );
    eprintln!("Configuration is valid");
    Ok(())
}
