use anyhow::{bail, Result};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use util_test_harness::config::{DEFAULT_EXE_NAME, DEFAULT_FIXTURE_NAME};
use util_test_harness::exec::{conventional_executable, is_windows, resolve_override};
use util_test_harness::{run, HexNewlines, RunConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fixture-driven golden-file harness for tx utilities", long_about = None)]
struct Cli {
    /// The path to the test data location
    #[arg(long)]
    path: String,
    /// Fixture file inside the test data directory
    #[arg(long, default_value = DEFAULT_FIXTURE_NAME)]
    fixture_name: String,
    /// Binary name looked up next to the test data (".exe" added on Windows)
    #[arg(long, default_value = DEFAULT_EXE_NAME)]
    exe_name: String,
    /// Explicit binary under test; bare names are searched on PATH
    #[arg(long)]
    exe: Option<PathBuf>,
    /// Kill a case after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
    /// Only run cases whose description contains this filter
    #[arg(short, long)]
    filter: Option<String>,
    /// Report golden-file mismatches without rewriting them
    #[arg(long, default_value_t = false)]
    no_update: bool,
    /// Compare .hex golden files byte-for-byte instead of ignoring newlines
    #[arg(long, default_value_t = false)]
    preserve_hex_newlines: bool,
    /// Print per-case execution details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

const LONG_FLAGS: &[&str] = &[
    "path",
    "fixture-name",
    "exe-name",
    "exe",
    "timeout",
    "filter",
    "no-update",
    "preserve-hex-newlines",
    "verbose",
];

/// Accept Go-style single-dash long flags (`-path dir`, `-path=dir`).
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut out = Vec::new();
    let mut passthrough = false;
    for arg in args {
        if passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = arg.to_str().and_then(|s| {
            if s == "--" {
                return None;
            }
            let name = s.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
            let flag = name.split_once('=').map_or(name, |(flag, _)| flag);
            LONG_FLAGS.contains(&flag).then(|| OsString::from(format!("-{s}")))
        });
        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: Cli) -> Result<RunConfig> {
    if cli.path.is_empty() {
        bail!("Invalid test data path.");
    }
    let data_dir = PathBuf::from(&cli.path);
    let executable = match &cli.exe {
        Some(exe) => resolve_override(exe)?,
        None => conventional_executable(&data_dir, &cli.exe_name, is_windows()),
    };

    let mut config = RunConfig::new(data_dir, executable);
    config.fixture_name = cli.fixture_name;
    config.timeout = cli.timeout.map(Duration::from_secs);
    config.filter = cli.filter;
    config.update_golden = !cli.no_update;
    config.hex_newlines = if cli.preserve_hex_newlines {
        HexNewlines::Preserve
    } else {
        HexNewlines::Strip
    };
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    let config = build_config(cli)?;
    run(&config)?;
    Ok(())
}
