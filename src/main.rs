use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use emu::cpu::legv8::{LegV8, SimConfig};
use emu::cpu::program::Program;
use emu::disassembler;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Disassembles a LEGv8 binary listing and traces its execution.
#[derive(Parser, Debug)]
#[command(name = "legsim", version, about, long_about = None)]
struct Args {
    /// Program image, one 32 digit binary word per line.
    #[arg(short = 'i', long = "input", default_value = "input.txt")]
    input: PathBuf,

    /// Disassembly listing.
    #[arg(short = 'o', long = "output", default_value = "out.txt")]
    output: PathBuf,

    /// Simulation trace.
    #[arg(long = "o2", visible_alias = "sim-output", default_value = "outputsim.txt")]
    sim_output: PathBuf,

    /// Stop after this many retired instructions.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Write the final machine state as JSON.
    #[arg(long)]
    state_json: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Ok(Some(guard))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref())?;

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let program = Program::decode(source.lines());
    if program.is_empty() {
        tracing::warn!("{} holds no words", args.input.display());
    } else {
        tracing::info!("decoded {} records from {}", program.len(), args.input.display());
    }

    let mut listing = create(&args.output)?;
    disassembler::write_listing(&program, &mut listing)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let mut trace = create(&args.sim_output)?;
    let mut cpu = LegV8::new(&program);
    let summary = cpu
        .run(
            SimConfig {
                max_cycles: args.max_cycles,
            },
            &mut trace,
        )
        .with_context(|| format!("simulation of {} failed", args.input.display()))?;
    tracing::info!(
        "simulation stopped: {:?} after {} instructions",
        summary.outcome,
        summary.retired
    );

    if let Some(path) = &args.state_json {
        let json = serde_json::to_string_pretty(&cpu.snapshot(summary))?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}
