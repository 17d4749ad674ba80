//! Check that a raw pprof dump parses, and summarize it.
//!
//! # Usage
//!
//! ```bash
//! pprof_raw_validate pprof.raw.txt
//! pprof_raw_validate pprof.raw.txt --json
//! pprof_raw_validate pprof.raw.txt --dump > profile.json
//! ```

use clap::Parser;
use env_logger::Env;
use pprof_legacy::{Summary, write_json};
use pprof_legacy::input::read_dump_path;
use pprof_legacy::pprof_raw::ParseResult;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pprof_raw_validate")]
#[command(about = "Validate a raw pprof dump and print a summary")]
#[command(version)]
struct Args {
    /// Raw dump file, or `-` for stdin
    input: PathBuf,

    /// Print the summary as JSON
    #[arg(long, conflicts_with = "dump")]
    json: bool,

    /// Print every parsed record and location as JSON
    #[arg(long)]
    dump: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_dump_path(&args.input)?;
    let profile = ParseResult::parse(&bytes)
        .map_err(|e| format!("Invalid raw dump '{}': {}", args.input.display(), e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.dump {
        write_json(&profile, &mut out)?;
        return Ok(());
    }

    let summary = Summary::of(&profile);
    if args.json {
        write_json(&summary, &mut out)?;
        return Ok(());
    }

    writeln!(out, "Valid raw dump: {}", args.input.display())?;
    writeln!(out, "  Units: {}", summary.units.join(" "))?;
    writeln!(out, "  Stacks: {}", summary.records)?;
    writeln!(out, "  Locations: {}", summary.locations)?;
    writeln!(out, "  Samples: {}", summary.total_samples)?;
    writeln!(
        out,
        "  Duration: {:?}",
        Duration::from_nanos(summary.total_duration_ns)
    )?;
    if summary.unresolved > 0 {
        writeln!(out, "  Unresolved function IDs: {}", summary.unresolved)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
