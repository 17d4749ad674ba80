//! Raw pprof dump converters and tools.
//!
//! This crate turns the raw text dump of a pprof CPU profile into the legacy
//! stack-trace text read by flame graph collapsers.
//!
//! # Modules
//!
//! - [`legacy`] - Render parsed dumps as legacy stack-trace text
//! - [`input`] - Read dumps from files or stdin, gzipped or not
//!
//! # Example
//!
//! ```no_run
//! use pprof_legacy::{FormatterConfig, convert};
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! let input = BufReader::new(File::open("pprof.raw.txt").unwrap());
//! let output = BufWriter::new(File::create("pprof.legacy.txt").unwrap());
//!
//! convert(input, output, FormatterConfig::default()).unwrap();
//! ```

pub mod input;
pub mod legacy;

pub use legacy::{ConvertError, FormatterConfig, LegacyFormatter, Result, parse_raw};
// Re-export pprof_raw for convenience
pub use pprof_raw;

use pprof_raw::ParseResult;
use serde::Serialize;
use std::io::{Read, Write};

/// Read a raw dump, convert it, and write the legacy text.
///
/// Returns the parsed profile so callers can report on it. Nothing is
/// written if the dump fails to parse.
pub fn convert<R: Read, W: Write>(
    reader: R,
    writer: W,
    config: FormatterConfig,
) -> Result<ParseResult> {
    let bytes = input::read_dump(reader)?;
    let profile = ParseResult::parse(&bytes)?;
    LegacyFormatter::with_config(config).write_legacy(&profile, writer)?;
    Ok(profile)
}

/// Write `value` as pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Overview of a parsed dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub units: Vec<String>,
    pub records: usize,
    pub locations: usize,
    pub total_samples: u64,
    pub total_duration_ns: u64,
    /// Function IDs used in stacks without a location entry.
    pub unresolved: usize,
}

impl Summary {
    pub fn of(profile: &ParseResult) -> Self {
        Self {
            units: profile.units.clone(),
            records: profile.records.len(),
            locations: profile.func_names.len(),
            total_samples: profile.total_samples(),
            total_duration_ns: u64::try_from(profile.total_duration().as_nanos())
                .unwrap_or(u64::MAX),
            unresolved: profile.unresolved_ids().len(),
        }
    }
}
