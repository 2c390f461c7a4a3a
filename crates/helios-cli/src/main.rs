use anyhow::Result;
use clap::{Parser, Subcommand};
#[cfg(feature = "testkit")]
use std::path::PathBuf;

mod commands;

use commands::{backtest, bkt, run};

#[derive(Parser)]
#[command(name = "helios")]
#[command(about = "Helios trading engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> engine -> risk -> stress...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run lifecycle commands
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },

    /// Market-data ingestion commands
    Md {
        #[command(subcommand)]
        cmd: MdCmd,
    },

    /// Backtest commands
    Backtest {
        #[command(subcommand)]
        cmd: BacktestCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum RunCmd {
    /// Create a new run row in DB and print run_id + hashes.
    Start {
        /// Engine ID (e.g. MAIN, EXP)
        #[arg(long)]
        engine: String,

        /// Mode (BACKTEST | PAPER | LIVE)
        #[arg(long)]
        mode: String,

        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Arm a run for LIVE trading (requires manual confirmation per config).
    Arm {
        #[arg(long)]
        run_id: String,

        /// Manual confirmation phrase, required when arming LIVE runs.
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Transition a run from ARMED to RUNNING.
    Begin {
        #[arg(long)]
        run_id: String,
    },

    /// Transition a run to STOPPED.
    Stop {
        #[arg(long)]
        run_id: String,
    },

    /// Transition a run to HALTED.
    Halt {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        reason: String,
    },

    /// Record a heartbeat for a running run.
    Heartbeat {
        #[arg(long)]
        run_id: String,
    },

    /// Print the current status row for a run.
    Status {
        #[arg(long)]
        run_id: String,
    },

    /// Check whether a run's deadman TTL has expired (read-only).
    DeadmanCheck {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        ttl_seconds: i64,
    },

    /// Enforce the deadman TTL, halting the run if it has expired.
    DeadmanEnforce {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        ttl_seconds: i64,
    },

    /// Drive a deterministic offline orchestrator loop over synthetic bars.
    #[cfg(feature = "testkit")]
    Loop {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        symbol: String,

        #[arg(long, default_value_t = 100)]
        bars: usize,

        #[arg(long = "timeframe-secs", default_value_t = 60)]
        timeframe_secs: u64,

        #[arg(long = "exports-root", default_value = "../exports")]
        exports_root: PathBuf,

        #[arg(long, default_value = "")]
        label: String,
    },
}

#[derive(Subcommand)]
enum MdCmd {
    /// Ingest a CSV file into canonical md_bars.
    IngestCsv {
        #[arg(long)]
        path: String,

        #[arg(long)]
        timeframe: String,

        #[arg(long, default_value = "csv")]
        source: String,
    },

    /// Fetch bars from a named provider and ingest into canonical md_bars.
    IngestProvider {
        #[arg(long)]
        source: String,

        /// Comma-separated symbol list
        #[arg(long)]
        symbols: String,

        #[arg(long)]
        timeframe: String,

        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },
}

#[derive(Subcommand)]
enum BacktestCmd {
    /// Run a backtest over a local CSV bar file.
    Csv {
        #[arg(long = "bars")]
        bars_path: String,

        #[arg(long = "timeframe-secs")]
        timeframe_secs: i64,

        #[arg(long = "initial-cash-micros", default_value_t = 100_000_000_000)]
        initial_cash_micros: i64,

        #[arg(long)]
        shadow: bool,

        #[arg(long = "integrity-enabled", default_value_t = true)]
        integrity_enabled: bool,

        #[arg(long = "integrity-stale-threshold-ticks", default_value_t = 5)]
        integrity_stale_threshold_ticks: u64,

        #[arg(long = "integrity-gap-tolerance-bars", default_value_t = 0)]
        integrity_gap_tolerance_bars: u32,

        #[arg(long = "out-dir")]
        out_dir: Option<String>,
    },

    /// Run a backtest over bars loaded from the md_bars table.
    Db {
        #[arg(long)]
        timeframe: String,

        #[arg(long = "start-end-ts")]
        start_end_ts: i64,

        #[arg(long = "end-end-ts")]
        end_end_ts: i64,

        /// Comma-separated symbol allowlist; omit for all symbols.
        #[arg(long)]
        symbols: Option<String>,

        #[arg(long = "timeframe-secs")]
        timeframe_secs: i64,

        #[arg(long = "initial-cash-micros", default_value_t = 100_000_000_000)]
        initial_cash_micros: i64,

        #[arg(long)]
        shadow: bool,

        #[arg(long = "integrity-enabled", default_value_t = true)]
        integrity_enabled: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = helios_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = helios_db::status(&pool).await?;
                    println!("db_ok={} has_runs_table={}", s.ok, s.has_runs_table);
                }
                DbCmd::Migrate => {
                    helios_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = helios_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Run { cmd } => match cmd {
            RunCmd::Start {
                engine,
                mode,
                config_paths,
            } => run::run_start(engine, mode, config_paths).await?,

            RunCmd::Arm { run_id, confirm } => run::run_arm(run_id, confirm).await?,

            RunCmd::Begin { run_id } => run::run_begin(run_id).await?,

            RunCmd::Stop { run_id } => run::run_stop(run_id).await?,

            RunCmd::Halt { run_id, reason } => run::run_halt(run_id, reason).await?,

            RunCmd::Heartbeat { run_id } => run::run_heartbeat(run_id).await?,

            RunCmd::Status { run_id } => run::run_status(run_id).await?,

            RunCmd::DeadmanCheck {
                run_id,
                ttl_seconds,
            } => run::run_deadman_check(run_id, ttl_seconds).await?,

            RunCmd::DeadmanEnforce {
                run_id,
                ttl_seconds,
            } => run::run_deadman_enforce(run_id, ttl_seconds).await?,

            #[cfg(feature = "testkit")]
            RunCmd::Loop {
                run_id,
                symbol,
                bars,
                timeframe_secs,
                exports_root,
                label,
            } => run::run_loop(run_id, symbol, bars, timeframe_secs, exports_root, label)?,
        },

        Commands::Md { cmd } => match cmd {
            MdCmd::IngestCsv {
                path,
                timeframe,
                source,
            } => backtest::md_ingest_csv(path, timeframe, source).await?,

            MdCmd::IngestProvider {
                source,
                symbols,
                timeframe,
                start,
                end,
            } => backtest::md_ingest_provider(source, symbols, timeframe, start, end).await?,
        },

        Commands::Backtest { cmd } => match cmd {
            BacktestCmd::Csv {
                bars_path,
                timeframe_secs,
                initial_cash_micros,
                shadow,
                integrity_enabled,
                integrity_stale_threshold_ticks,
                integrity_gap_tolerance_bars,
                out_dir,
            } => {
                bkt::run_backtest_csv(
                    bars_path,
                    timeframe_secs,
                    initial_cash_micros,
                    shadow,
                    integrity_enabled,
                    integrity_stale_threshold_ticks,
                    integrity_gap_tolerance_bars,
                    out_dir,
                )
                .await?
            }

            BacktestCmd::Db {
                timeframe,
                start_end_ts,
                end_end_ts,
                symbols,
                timeframe_secs,
                initial_cash_micros,
                shadow,
                integrity_enabled,
            } => {
                bkt::run_backtest_db(
                    timeframe,
                    start_end_ts,
                    end_end_ts,
                    symbols,
                    timeframe_secs,
                    initial_cash_micros,
                    shadow,
                    integrity_enabled,
                )
                .await?
            }
        },
    }

    Ok(())
}
