// src/main.rs
//
// Replays a recorded drive through the desire helper: one JSON CycleInput
// per line in, one JSON DesireOutput per line out.

use anyhow::{Context, Result};
use clap::Parser;
use desire_helper::{DesireHelper, YamlParams};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "desire-replay", about = "Replay recorded cycles through the lane change desire helper")]
struct Args {
    /// YAML params file (NudgelessLaneChange, LaneChangeTimer, LaneDetection, OneLaneChange)
    #[arg(long)]
    params: PathBuf,

    /// JSON-lines file of recorded cycle inputs
    #[arg(long)]
    input: PathBuf,

    /// Where to write outputs (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a metrics summary as JSON to stderr when done
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desire_helper=info,desire_replay=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let params = YamlParams::load(&args.params)
        .with_context(|| format!("loading params from {}", args.params.display()))?;
    let mut helper = DesireHelper::new(params).context("reading lane change params")?;
    info!("✓ Params loaded from {}", args.params.display());

    let input = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut cycles = 0u64;
    for (idx, line) in BufReader::new(input).lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let cycle = serde_json::from_str(&line)
            .with_context(|| format!("parsing cycle on line {}", idx + 1))?;
        let output = helper.update_from(&cycle);
        serde_json::to_writer(&mut out, &output)?;
        writeln!(out)?;

        for event in helper.drain_events() {
            info!("cycle {}: {}", cycles, serde_json::to_string(&event)?);
        }
        cycles += 1;
    }
    out.flush()?;

    info!("✓ Replayed {} cycles", cycles);

    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&helper.metrics())?);
    }

    Ok(())
}
