//! Parser for the raw text dump of a pprof CPU profile.
//!
//! The raw dump (as printed by `go tool pprof -raw`) has a `Samples:` section
//! listing sampled call stacks by function ID, followed by a `Locations:`
//! section mapping each function ID to a name. This crate turns that text into
//! a [`ParseResult`] and nothing more; rendering it is left to callers.
//!
//! # Example
//!
//! ```
//! use pprof_raw::{FuncId, ParseResult};
//!
//! let dump = b"Samples:
//! samples/count cpu/nanoseconds
//!    2   10000000: 1 2
//! Locations:
//!      1: 0x4a0b8d main.fib :0 s=0
//!      2: 0x4a0c1f main.main :0 s=0
//! ";
//!
//! let result = ParseResult::parse(dump).unwrap();
//! assert_eq!(result.records.len(), 1);
//! assert_eq!(result.records[0].samples, 2);
//! assert_eq!(result.name_of(FuncId(1)), Some("main.fib"));
//! ```

use log::debug;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A line of the raw dump that could not be parsed.
///
/// Parsing is fail-fast: the first bad line aborts the whole parse and is
/// reported here together with its 1-based line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at line {line}: {message}: {content:?}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
    pub content: String,
}

/// Result type for raw dump parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

const SAMPLES_HEADER: &str = "Samples:";
const LOCATIONS_HEADER: &str = "Locations:";
const MAPPINGS_HEADER: &str = "Mappings:";

/// Fields required on a location line.
const LOCATION_FIELDS: usize = 5;

// ============================================================================
// Tokenizer
// ============================================================================

/// Split a line into fields on runs of whitespace.
///
/// Never returns an empty vector: a blank (or all-whitespace) string yields
/// `[""]`, so field-count checks fail on blank lines instead of passing them.
pub fn split_by_space(s: &str) -> Vec<&str> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.is_empty() { vec![""] } else { fields }
}

// ============================================================================
// Profile types
// ============================================================================

/// Identifier of a location in the dump, shared by both sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FuncId(pub u64);

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FuncId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(FuncId)
    }
}

/// One sampled call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackRecord {
    /// Number of samples that hit this stack.
    pub samples: u64,
    /// CPU time attributed to the stack.
    #[serde(serialize_with = "serialize_nanos")]
    pub duration: Duration,
    /// Function IDs from leaf to root, never empty.
    pub stack: Vec<FuncId>,
}

/// Everything parsed out of a raw dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    /// Fields of the units line following `Samples:`, e.g.
    /// `["samples/count", "cpu/nanoseconds"]`.
    pub units: Vec<String>,
    /// Stack records in input order.
    pub records: Vec<StackRecord>,
    /// Function name for every declared location.
    pub func_names: BTreeMap<FuncId, String>,
}

impl ParseResult {
    /// Parse a complete raw dump.
    pub fn parse(input: &[u8]) -> Result<Self> {
        RawParser::new().parse(input)
    }

    /// Look up the declared name of a function ID.
    pub fn name_of(&self, id: FuncId) -> Option<&str> {
        self.func_names.get(&id).map(String::as_str)
    }

    /// Function IDs used in some stack but never declared as a location.
    pub fn unresolved_ids(&self) -> BTreeSet<FuncId> {
        self.records
            .iter()
            .flat_map(|r| r.stack.iter().copied())
            .filter(|&id| self.name_of(id).is_none())
            .collect()
    }

    /// Sum of sample counts over all records.
    pub fn total_samples(&self) -> u64 {
        self.records.iter().map(|r| r.samples).sum()
    }

    /// Sum of durations over all records.
    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(|r| r.duration).sum()
    }
}

fn serialize_nanos<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
    serializer.serialize_u64(nanos)
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before the `Samples:` header, or after `Mappings:`.
    Preamble,
    /// The units line right after `Samples:`.
    Units,
    Samples,
    Locations,
}

/// Line-by-line parser for the raw dump.
///
/// Consumed by [`RawParser::parse`]; use [`ParseResult::parse`] unless the
/// parser needs to be handed around before the input is available.
#[derive(Debug)]
pub struct RawParser {
    section: Section,
    result: ParseResult,
}

impl Default for RawParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RawParser {
    pub fn new() -> Self {
        Self {
            section: Section::Preamble,
            result: ParseResult::default(),
        }
    }

    /// Parse the whole input, stopping at the first malformed line.
    pub fn parse(mut self, input: &[u8]) -> Result<ParseResult> {
        let text = String::from_utf8_lossy(input);

        for (idx, line) in text.lines().enumerate() {
            self.parse_line(line).map_err(|message| ParseError {
                line: idx + 1,
                message: message.to_string(),
                content: line.to_string(),
            })?;
        }

        debug!(
            "parsed {} stack records and {} locations",
            self.result.records.len(),
            self.result.func_names.len()
        );
        Ok(self.result)
    }

    fn parse_line(&mut self, line: &str) -> std::result::Result<(), &'static str> {
        match self.section {
            Section::Preamble => {
                if line.starts_with(SAMPLES_HEADER) {
                    self.enter(Section::Units);
                }
            }
            Section::Units => {
                let units = split_by_space(line);
                if units == [""] {
                    return Err("missing units line after samples header");
                }
                self.result.units = units.into_iter().map(String::from).collect();
                self.enter(Section::Samples);
            }
            Section::Samples => {
                if line.starts_with(LOCATIONS_HEADER) {
                    self.enter(Section::Locations);
                } else {
                    let record = Self::parse_sample(line)?;
                    self.result.records.push(record);
                }
            }
            Section::Locations => {
                if line.starts_with(MAPPINGS_HEADER) {
                    self.enter(Section::Preamble);
                } else {
                    let (id, name) = Self::parse_location(line)?;
                    self.result.func_names.insert(id, name.to_string());
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, section: Section) {
        debug!("raw dump section {:?} -> {:?}", self.section, section);
        self.section = section;
    }

    /// Parse a sample line.
    /// Format: `<count> <duration>: <funcID> <funcID> ...`
    fn parse_sample(line: &str) -> std::result::Result<StackRecord, &'static str> {
        let (weights, stack) = line.split_once(':').ok_or("sample line has no ':' separator")?;

        let weights = split_by_space(weights);
        let [samples, duration] = weights.as_slice() else {
            return Err("sample line needs a count and a duration");
        };
        let samples = samples.parse::<u64>().map_err(|_| "invalid sample count")?;
        let nanos = duration.parse::<u64>().map_err(|_| "invalid sample duration")?;

        // An empty stack tokenizes to [""], which fails here too.
        let stack = split_by_space(stack)
            .into_iter()
            .map(str::parse::<FuncId>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| "invalid function ID in sample stack")?;

        Ok(StackRecord {
            samples,
            duration: Duration::from_nanos(nanos),
            stack,
        })
    }

    /// Parse a location line.
    /// Format: `<funcID>: <address> <name> :<line> s=<skip>`
    fn parse_location(line: &str) -> std::result::Result<(FuncId, &str), &'static str> {
        let parts = split_by_space(line);
        if parts.len() < LOCATION_FIELDS {
            return Err("location line needs id, address, name, line and skip fields");
        }

        let id = parts[0]
            .trim_end_matches(':')
            .parse::<FuncId>()
            .map_err(|_| "invalid function ID in location")?;

        Ok((id, parts[2]))
    }
}
