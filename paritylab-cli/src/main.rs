//! ParityLab CLI: backtest runs, trade parity checks, and the preset catalog.
//!
//! Commands:
//! - `run`: execute a backtest over a bar CSV from a TOML run spec or named preset
//! - `validate`: replay a strategy over bars and grade its trades against a
//!   reference trade export, exiting nonzero when the strict gate fails
//! - `presets`: list the built-in strategy catalog with parameters

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use paritylab_core::domain::Bar;
use paritylab_core::engine::SessionConfig;
use paritylab_core::fingerprint::hash_dataset;
use paritylab_core::signal::{ExitMode, SignalMode, SignalPolicy};
use paritylab_core::strategy::{
    preset, IndicatorConfig, OrderSizing, StrategyConfig, PRESET_NAMES,
};
use paritylab_runner::{
    load_bars_csv, load_run_spec, run_backtest, save_artifacts, save_validation_artifacts,
    validate_all, BacktestResult, LoadedBars, ValidationCase, ValidationSettings,
    ValidationSummary,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "paritylab",
    about = "ParityLab CLI: signal replay and trade parity verification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest over a bar CSV from a TOML run spec or named preset.
    Run {
        /// Path to the bar CSV (timestamp,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML run spec.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset from the built-in catalog (see `presets`).
        #[arg(long)]
        preset: Option<String>,

        /// Symbol label for the result (used with --preset; run specs carry their own).
        #[arg(long)]
        symbol: Option<String>,

        /// Keep only bars dated on or after this day (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Keep only bars dated on or before this day (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Save the artifact bundle (manifest, trades CSV, equity CSV, report)
        /// under this directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a strategy and grade its trades against a reference export CSV.
    Validate {
        /// Path to the bar CSV (timestamp,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Path to the reference trade export CSV.
        #[arg(long)]
        reference: PathBuf,

        /// Path to a TOML run spec.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset from the built-in catalog (see `presets`).
        #[arg(long)]
        preset: Option<String>,

        /// Case label used in reports and artifact file names.
        /// Defaults to the strategy name.
        #[arg(long)]
        name: Option<String>,

        /// UTC offset in hours the reference export timestamps were displayed under.
        #[arg(long, default_value_t = 0.0)]
        utc_offset_hours: f64,

        /// Skip the relaxed diagnostic pass; run only the strict gate.
        #[arg(long, default_value_t = false)]
        strict_only: bool,

        /// Output directory for the validation artifact bundle.
        #[arg(long, default_value = "results")]
        output: PathBuf,
    },
    /// List the built-in strategy presets with their parameters.
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bars,
            config,
            preset,
            symbol,
            start,
            end,
            output,
        } => run_cmd(bars, config, preset, symbol, start, end, output),
        Commands::Validate {
            bars,
            reference,
            config,
            preset,
            name,
            utc_offset_hours,
            strict_only,
            output,
        } => validate_cmd(
            bars,
            reference,
            config,
            preset,
            name,
            utc_offset_hours,
            strict_only,
            output,
        ),
        Commands::Presets => run_presets(),
    }
}

fn run_cmd(
    bars_path: PathBuf,
    config: Option<PathBuf>,
    preset_name: Option<String>,
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let (symbol, strategy, session) = resolve_spec(config, preset_name, symbol)?;

    let mut data = load_bars_csv(&bars_path)
        .with_context(|| format!("failed to load bars from '{}'", bars_path.display()))?;
    if start.is_some() || end.is_some() {
        data = window_bars(data, start.as_deref(), end.as_deref())?;
    }

    let result = run_backtest(&symbol, strategy, session, &data)?;
    print_summary(&result);

    if let Some(dir) = output {
        let run_dir = save_artifacts(&result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn validate_cmd(
    bars_path: PathBuf,
    reference_path: PathBuf,
    config: Option<PathBuf>,
    preset_name: Option<String>,
    name: Option<String>,
    utc_offset_hours: f64,
    strict_only: bool,
    output: PathBuf,
) -> Result<()> {
    let (_, strategy, session) = resolve_spec(config, preset_name, None)?;
    let case_name = name.unwrap_or_else(|| strategy.name.clone());

    let case = ValidationCase::load(
        case_name,
        strategy,
        session,
        &bars_path,
        &reference_path,
        utc_offset_hours,
    )
    .with_context(|| {
        format!(
            "failed to load validation inputs '{}' and '{}'",
            bars_path.display(),
            reference_path.display()
        )
    })?;

    let mut settings = ValidationSettings::default();
    if strict_only {
        settings.relaxed = None;
    }

    let cases = [case];
    let summary = validate_all(&cases, &settings)?;
    print_validation_summary(&summary);

    let run_dir = save_validation_artifacts(&summary, &output)?;
    println!("Artifacts saved to: {}", run_dir.display());

    // The summary and artifacts are written even on failure; only the exit
    // code carries the verdict.
    if !summary.all_passed {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolve the strategy and session from either a TOML run spec or a named
/// preset. Exactly one of the two sources must be given.
fn resolve_spec(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    symbol: Option<String>,
) -> Result<(String, StrategyConfig, SessionConfig)> {
    if config_path.is_some() && preset_name.is_some() {
        bail!("--config and --preset are mutually exclusive");
    }

    if let Some(path) = config_path {
        let spec = load_run_spec(&path)?;
        let strategy = spec.strategy.resolve()?;
        Ok((spec.symbol, strategy, spec.session))
    } else if let Some(name) = preset_name {
        match preset(&name) {
            Ok(strategy) => {
                let symbol = symbol.unwrap_or_else(|| "BTCUSDT".to_string());
                Ok((symbol, strategy, SessionConfig::default()))
            }
            Err(_) => bail!(
                "unknown preset '{name}'. Valid: {}",
                PRESET_NAMES.join(", ")
            ),
        }
    } else {
        bail!("one of --config or --preset is required");
    }
}

/// Restrict loaded bars to a date window and re-stamp indices so the session
/// sees a contiguous series starting at zero.
fn window_bars(data: LoadedBars, start: Option<&str>, end: Option<&str>) -> Result<LoadedBars> {
    let start = start
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --start date, expected YYYY-MM-DD")?;
    let end = end
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --end date, expected YYYY-MM-DD")?;

    let mut bars: Vec<Bar> = data
        .bars
        .into_iter()
        .filter(|bar| {
            let date = bar.timestamp.date();
            start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
        })
        .collect();
    if bars.is_empty() {
        bail!("no bars remain inside the requested date window");
    }
    for (i, bar) in bars.iter_mut().enumerate() {
        bar.index = i as u64;
    }

    let dataset_hash = hash_dataset(&bars);
    Ok(LoadedBars { bars, dataset_hash })
}

fn run_presets() -> Result<()> {
    for name in PRESET_NAMES {
        let config = preset(name)?;
        println!("{name}");
        println!("  {}", describe_signal(&config));
        println!("  {}", describe_protections(&config));
        println!();
    }
    Ok(())
}

fn describe_signal(config: &StrategyConfig) -> String {
    let indicator = match config.indicator {
        IndicatorConfig::Momentum { period } => format!("MOM({period})"),
        IndicatorConfig::Sma { period } => format!("SMA({period})"),
        IndicatorConfig::Ema { period } => format!("EMA({period})"),
        IndicatorConfig::Rsi { period } => format!("RSI({period})"),
        IndicatorConfig::Cci { period } => format!("CCI({period})"),
        IndicatorConfig::Roc { period } => format!("ROC({period})"),
        IndicatorConfig::Apo {
            fast_period,
            slow_period,
        } => format!("APO({fast_period},{slow_period})"),
        IndicatorConfig::Tema { period } => format!("TEMA({period})"),
        IndicatorConfig::TemaSpread {
            short_period,
            long_period,
        } => format!("TEMA spread({short_period},{long_period})"),
    };

    match config.policy {
        SignalPolicy::Band {
            thresholds,
            mode,
            exit,
        } => {
            let mode_label = match mode {
                SignalMode::MeanReversion => "mean-reversion",
                SignalMode::Momentum => "momentum",
            };
            let exit_label = match exit {
                ExitMode::Midpoint => format!("midpoint exit at {}", thresholds.mid),
                ExitMode::Breakout => "no signal exit".to_string(),
            };
            format!(
                "{indicator}, {mode_label} band {}/{}, {exit_label}",
                thresholds.upper, thresholds.lower
            )
        }
        SignalPolicy::LineCross => format!("{indicator}, zero-line crossover"),
    }
}

fn describe_protections(config: &StrategyConfig) -> String {
    let mut parts: Vec<String> = Vec::new();
    if config.use_stop_loss {
        parts.push(format!("stop {:.2}%", config.stop_loss_percent * 100.0));
    }
    if config.use_take_profit {
        parts.push(format!("target {:.2}%", config.take_profit_percent * 100.0));
    }
    if config.use_max_holding {
        parts.push(format!("max hold {} bars", config.max_holding_bars));
    }
    if config.cooldown_bars > 0 {
        parts.push(format!("cooldown {} bars", config.cooldown_bars));
    }
    parts.push(if config.allow_flip {
        "flip allowed".to_string()
    } else {
        "no flip".to_string()
    });
    parts.push(match config.sizing {
        OrderSizing::Notional { value } => format!("notional {value}"),
        OrderSizing::Quantity { quantity } => format!("qty {quantity}"),
    });
    parts.join(", ")
}

fn print_summary(result: &BacktestResult) {
    let summary = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Strategy:       {}", summary.strategy_name);
    println!(
        "Bars:           {} ({} warmup)",
        summary.bars_processed, result.session.warmup_bars
    );
    println!("Signals:        {}", summary.total_signals);
    println!(
        "Trades:         {} ({} wins, {} losses)",
        summary.total_trades, summary.winning_trades, summary.losing_trades
    );
    println!();
    println!("--- Performance ---");
    println!("Capital:        ${:.2}", summary.initial_capital);
    println!("Final Equity:   ${:.2}", summary.final_equity);
    println!("Total Return:   {:.2}%", summary.total_return_pct);
    println!("Net PnL:        ${:.2}", summary.net_pnl);
    println!("Gross PnL:      ${:.2}", summary.gross_pnl);
    println!("Commission:     ${:.2}", summary.total_commission);
    println!("Max Drawdown:   {:.2}%", summary.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", summary.win_rate_pct);
    println!("Profit Factor:  {:.2}", summary.profit_factor);
    println!("Run ID:         {}", result.run_id);
    for warn in &result.warnings {
        eprintln!("WARNING: {warn}");
    }
    println!();
}

fn print_validation_summary(summary: &ValidationSummary) {
    println!();
    println!("=== Trade Parity ===");
    println!(
        "Cases:          {}/{} passed",
        summary.cases_passed, summary.cases_run
    );

    for report in &summary.reports {
        let verdict = if report.passed { "PASS" } else { "FAIL" };
        println!();
        println!("--- {}: {verdict} ---", report.case_name);

        let strict = &report.strict;
        println!("Generated:      {}", strict.generated_trade_count);
        println!("Reference:      {}", strict.reference_trade_count);
        println!("Matched:        {}", strict.matched_count);
        println!("Side Mismatch:  {}", strict.side_mismatch_count);
        println!("Time Mismatch:  {}", strict.time_mismatch_count);
        println!("PnL Mismatch:   {}", strict.pnl_mismatch_count);
        println!("Missing (ref):  {}", strict.missing_reference_count);
        println!("Missing (gen):  {}", strict.missing_generated_count);
        println!("Net PnL (gen):  {:.2}", strict.generated_net_pnl);
        println!("Net PnL (ref):  {:.2}", strict.reference_net_pnl);
        println!("Net PnL Diff:   {:.2}", strict.net_pnl_diff);

        if let Some(relaxed) = &report.relaxed {
            println!(
                "Relaxed pass (within {:.0} min): {} matched, {} time mismatches, {} still unpaired",
                relaxed.tolerance.time_tolerance_minutes,
                relaxed.matched_count,
                relaxed.time_mismatch_count,
                relaxed.missing_reference_count + relaxed.missing_generated_count
            );
        }

        let dropped = report.reference_skipped_rows
            + report.reference_incomplete_groups
            + report.reference_open_trades_skipped;
        if dropped > 0 {
            println!(
                "Reference export: {} rows skipped, {} incomplete groups, {} open trades dropped",
                report.reference_skipped_rows,
                report.reference_incomplete_groups,
                report.reference_open_trades_skipped
            );
        }

        for warn in &report.warnings {
            eprintln!("WARNING: {warn}");
        }
    }
    println!();
}
