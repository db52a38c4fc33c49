use clap::Parser;
use dvnet_sim::controller::Controller;
use dvnet_sim::sim::SimTime;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "netsim", about = "Run a packet-network case on the dvnet-sim simulator")]
struct Args {
    /// Path to the case JSON file
    #[arg(long)]
    case: PathBuf,

    /// Run until this time (ms); defaults to running until completion
    #[arg(long)]
    until_ms: Option<u64>,

    /// Output metrics JSON file
    #[arg(long)]
    metrics_json: Option<PathBuf>,

    /// Output run summary JSON file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut ctl = match Controller::from_path(&args.case) {
        Ok(ctl) => ctl,
        Err(e) => {
            error!(case = %args.case.display(), "配置错误: {e}");
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    ctl.run(args.until_ms.map(SimTime::from_millis));

    let summary = ctl.summary();
    for f in &summary.flows {
        let done = f
            .done_ms
            .map(|t| format!("{t:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "flow {} tla={} packets={} acked={} done_ms={} sent={} retransmits={} fast_retransmits={} timeouts={} window={:.2}",
            f.name,
            f.tla,
            f.packets,
            f.acked,
            done,
            f.sender.data_sent,
            f.sender.retransmits,
            f.sender.fast_retransmits,
            f.sender.timeouts,
            f.window,
        );
    }
    println!(
        "end_ms={:.3} events={} dropped={}",
        summary.end_ms, summary.events, summary.dropped_pkts
    );

    if let Some(path) = &args.metrics_json {
        let json = match ctl.world.net.metrics.to_json_pretty() {
            Ok(json) => json,
            Err(e) => {
                eprintln!("error: serialize metrics: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = fs::write(path, json) {
            eprintln!("error: write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), events = ctl.world.net.metrics.events.len(), "已写出度量 JSON");
    }

    if let Some(path) = &args.summary_json {
        let written = serde_json::to_string_pretty(&summary)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("error: write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
