use aigdd_core::{codec, reduce, CommandOracle, ReduceStats};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Shrinks a failure-triggering and-inverter graph to a minimal variant
/// that still makes the oracle return the same exit code.
#[derive(Parser)]
#[command(name = "aigdd")]
#[command(version)]
struct Cli {
    /// Failure-triggering source circuit (ASCII or binary AIGER)
    src: PathBuf,

    /// Destination path; overwritten with every candidate, holds the
    /// minimized circuit on completion
    dst: PathBuf,

    /// Oracle executable; invoked with the candidate path as its single
    /// argument, its exit code is the failure signature
    #[arg(default_value = "./run")]
    oracle: PathBuf,

    /// Increase verbosity (-v for progress, -vv for per-chunk decisions)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Kill an oracle run after this many milliseconds and treat the probe
    /// as a mismatch
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the run report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ReportJson {
    schema_version: String,
    tool: ToolInfo,
    invocation: Invocation,
    inputs: Vec<FileDigest>,
    outputs: Vec<FileDigest>,
    result: ReductionInfo,
    started_at: String,
    finished_at: String,
    duration_ms: u64,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct Invocation {
    source: String,
    destination: String,
    oracle: String,
    timeout_ms: Option<u64>,
    verbose: u8,
}

#[derive(Serialize)]
struct FileDigest {
    path: String,
    sha256: String,
}

#[derive(Serialize)]
struct ReductionInfo {
    baseline_exit: i32,
    probes: u64,
    oracle_calls: u64,
    commits: u64,
    eliminated_vars: u32,
    remaining_vars: u32,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests land here too; they exit 0, every
            // real usage error is fatal.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.verbose);
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("*** [aigdd] {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let data = fs::read(&cli.src).with_context(|| format!("read {}", cli.src.display()))?;
    let circuit = codec::parse(&data).with_context(|| format!("parse {}", cli.src.display()))?;
    info!(
        "loaded '{}' with {} variables",
        cli.src.display(),
        circuit.max_var
    );

    let mut oracle = CommandOracle::new(&cli.oracle);
    if let Some(ms) = cli.timeout_ms {
        oracle = oracle.with_timeout(Duration::from_millis(ms));
    }
    let reduction = reduce(&circuit, &cli.src, &cli.dst, oracle)?;

    let finished_at = Utc::now();
    let report = ReportJson {
        schema_version: "0.1".to_string(),
        tool: ToolInfo {
            name: "aigdd".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        invocation: Invocation {
            source: cli.src.to_string_lossy().to_string(),
            destination: cli.dst.to_string_lossy().to_string(),
            oracle: cli.oracle.to_string_lossy().to_string(),
            timeout_ms: cli.timeout_ms,
            verbose: cli.verbose,
        },
        inputs: vec![file_digest(&cli.src)?],
        outputs: vec![file_digest(&cli.dst)?],
        result: reduction_info(&reduction.stats),
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        duration_ms: timer.elapsed().as_millis() as u64,
    };

    match cli.format {
        OutputFormat::Json => emit_json(&report, cli.output.as_deref()),
        OutputFormat::Text => emit_text(&report, cli.output.as_deref()),
    }
}

fn reduction_info(stats: &ReduceStats) -> ReductionInfo {
    ReductionInfo {
        baseline_exit: stats.baseline,
        probes: stats.probes,
        oracle_calls: stats.oracle_calls,
        commits: stats.commits,
        eliminated_vars: stats.eliminated,
        remaining_vars: stats.remaining,
    }
}

fn file_digest(path: &Path) -> Result<FileDigest> {
    let data = fs::read(path).with_context(|| format!("digest {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(FileDigest {
        path: path.to_string_lossy().to_string(),
        sha256: hex::encode(hasher.finalize()),
    })
}

fn emit_json(report: &ReportJson, output: Option<&Path>) -> Result<()> {
    let payload = serde_json::to_string_pretty(report).context("serialize report json")?;
    if let Some(path) = output {
        write_atomic(path, payload.as_bytes())?;
        return Ok(());
    }
    println!("{payload}");
    Ok(())
}

fn emit_text(report: &ReportJson, output: Option<&Path>) -> Result<()> {
    let result = &report.result;
    let summary = format!(
        "eliminated {} of {} variables (baseline exit {}, {} probes) -> {}",
        result.eliminated_vars,
        result.eliminated_vars + result.remaining_vars,
        result.baseline_exit,
        result.probes,
        report.invocation.destination,
    );
    if let Some(path) = output {
        write_atomic(path, summary.as_bytes())?;
        return Ok(());
    }
    println!("{summary}");
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("rename {}", path.display()))?;
    Ok(())
}
