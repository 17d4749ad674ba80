//! Render raw pprof dumps as legacy stack-trace text.
//!
//! Each stack record becomes one block: the function name of every frame,
//! leaf first, one per line, followed by a line holding the sample count.
//!
//! ```text
//! main.fib
//! main.main
//! runtime.main
//! 2
//! ```
//!
//! This is the input expected by line-oriented stack collapsers such as
//! `stackcollapse-go.pl`.
//!
//! # Example
//!
//! ```
//! let dump = b"Samples:
//! samples/count cpu/nanoseconds
//!    2   10000000: 1 2
//! Locations:
//!      1: 0x4a0b8d main.fib :0 s=0
//!      2: 0x4a0c1f main.main :0 s=0
//! ";
//!
//! let legacy = pprof_legacy::legacy::parse_raw(dump).unwrap();
//! assert_eq!(legacy, b"main.fib\nmain.main\n2\n");
//! ```

use log::warn;
use pprof_raw::ParseResult;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur while converting a raw dump.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] pprof_raw::ParseError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Configuration for the legacy formatter.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Write an empty line after every block.
    pub stack_separator: bool,
    /// Prefix for frames whose function ID has no location entry. The ID is
    /// appended in decimal, e.g. `unknown#42`.
    pub unknown_prefix: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            stack_separator: false,
            unknown_prefix: "unknown#".to_string(),
        }
    }
}

/// Formatter from a parsed raw dump to legacy stack-trace text.
#[derive(Debug, Clone, Default)]
pub struct LegacyFormatter {
    config: FormatterConfig,
}

impl LegacyFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Render every record, in input order.
    pub fn render(&self, profile: &ParseResult) -> String {
        let mut out = String::new();

        for record in &profile.records {
            for &id in &record.stack {
                match profile.name_of(id) {
                    Some(name) => out.push_str(name),
                    None => {
                        out.push_str(&self.config.unknown_prefix);
                        out.push_str(&id.to_string());
                    }
                }
                out.push('\n');
            }
            out.push_str(&record.samples.to_string());
            out.push('\n');
            if self.config.stack_separator {
                out.push('\n');
            }
        }

        let unknown = profile.unresolved_ids();
        if !unknown.is_empty() {
            warn!(
                "{} function IDs have no location entry and were written as '{}<id>'",
                unknown.len(),
                self.config.unknown_prefix
            );
        }

        out
    }

    /// Render every record to a writer.
    pub fn write_legacy<W: Write>(&self, profile: &ParseResult, mut writer: W) -> Result<()> {
        writer.write_all(self.render(profile).as_bytes())?;
        Ok(())
    }
}

/// Convert a raw dump to legacy stack-trace text with the default config.
///
/// Parse errors are returned unchanged; no partial output is produced.
pub fn parse_raw(input: &[u8]) -> pprof_raw::Result<Vec<u8>> {
    parse_raw_with_config(input, FormatterConfig::default())
}

/// Convert a raw dump to legacy stack-trace text.
pub fn parse_raw_with_config(
    input: &[u8],
    config: FormatterConfig,
) -> pprof_raw::Result<Vec<u8>> {
    let profile = ParseResult::parse(input)?;
    Ok(LegacyFormatter::with_config(config)
        .render(&profile)
        .into_bytes())
}
