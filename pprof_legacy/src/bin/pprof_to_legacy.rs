//! Convert a raw pprof dump to legacy stack-trace text.
//!
//! This binary reads the output of `go tool pprof -raw` (optionally gzipped)
//! and writes one block per sampled stack: a function name per frame, leaf
//! first, then the sample count.
//!
//! # Usage
//!
//! ```bash
//! pprof_to_legacy pprof.raw.txt -o stacks.txt
//! go tool pprof -raw cpu.pprof | pprof_to_legacy - --blank-lines | stackcollapse-go.pl
//! ```

use clap::Parser;
use env_logger::Env;
use pprof_legacy::input::read_dump_path;
use pprof_legacy::pprof_raw::ParseResult;
use pprof_legacy::{FormatterConfig, LegacyFormatter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "pprof_to_legacy")]
#[command(about = "Convert a raw pprof dump to legacy stack-trace text")]
#[command(version)]
struct Args {
    /// Raw dump file, or `-` for stdin
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an empty line after every stack
    #[arg(long)]
    blank_lines: bool,

    /// Name prefix for function IDs without a location entry
    #[arg(long, default_value = "unknown#")]
    unknown_prefix: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_dump_path(&args.input)?;
    let profile = ParseResult::parse(&bytes)?;

    let formatter = LegacyFormatter::with_config(FormatterConfig {
        stack_separator: args.blank_lines,
        unknown_prefix: args.unknown_prefix,
    });

    match &args.output {
        Some(output_path) => {
            let output_file = File::create(output_path).map_err(|e| {
                format!(
                    "Failed to create output file '{}': {}",
                    output_path.display(),
                    e
                )
            })?;
            let mut writer = BufWriter::new(output_file);
            formatter.write_legacy(&profile, &mut writer)?;
            writer.flush()?;

            eprintln!(
                "Converted '{}' -> '{}' ({} stacks)",
                args.input.display(),
                output_path.display(),
                profile.records.len()
            );
        }
        None => {
            let mut writer = BufWriter::new(io::stdout().lock());
            formatter.write_legacy(&profile, &mut writer)?;
            writer.flush()?;
        }
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
