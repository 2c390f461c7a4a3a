//! Standalone deterministic paper-loop runner.
//!
//! Thin wrapper around `helios_testkit::Orchestrator` for operators who want
//! a single binary to drive a synthetic bar sequence through the full
//! strategy/execution/broker/portfolio/risk/audit stack without going
//! through `helios run loop` (which requires a DB-backed run row). Only
//! built when the `testkit` feature is enabled.

use anyhow::{Context, Result};
use clap::Parser;
use helios_testkit::{Orchestrator, OrchestratorBar, OrchestratorConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "helios_paper_loop")]
#[command(about = "Run a deterministic offline orchestrator loop over synthetic bars")]
struct Args {
    #[arg(long)]
    symbol: String,

    #[arg(long, default_value_t = 100)]
    bars: usize,

    #[arg(long = "timeframe-secs", default_value_t = 60)]
    timeframe_secs: u64,

    #[arg(long = "exports-root", default_value = "../exports")]
    exports_root: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = OrchestratorConfig::test_defaults();
    cfg.timeframe_secs = args.timeframe_secs as i64;

    let mut orch = Orchestrator::new(cfg);

    let mut generated: Vec<OrchestratorBar> = Vec::with_capacity(args.bars);
    for i in 0..args.bars {
        let ts: u64 = 1_700_000_000u64 + (i as u64) * args.timeframe_secs;
        let price: i64 = 100_000_000i64 + (i as i64) * 100_000;

        generated.push(OrchestratorBar {
            symbol: args.symbol.clone(),
            end_ts: ts as i64,
            open_micros: price,
            high_micros: price + 50_000,
            low_micros: price - 50_000,
            close_micros: price,
            volume: 1_000i64,
            is_complete: true,
            day_id: (ts / 86_400) as u32,
        });
    }

    let report = orch
        .run(&generated, &args.exports_root)
        .context("orchestrator run")?;

    println!("run_id={}", report.run_id);
    println!("symbol={}", args.symbol);
    println!("bars_processed={}", report.bars_processed);
    println!("fills={}", report.fills_count);
    println!("broker_acks={}", report.broker_acks);
    println!("broker_fills={}", report.broker_fills);
    println!("execution_blocked={}", report.execution_blocked);
    println!("halted={}", report.halted);
    println!("run_dir={}", report.run_dir.display());
    if let Some((end_ts, equity_micros)) = report.equity_curve.last() {
        println!("last_end_ts={}", end_ts);
        println!("last_equity_micros={}", equity_micros);
    }

    Ok(())
}
