use flate2::Compression;
use flate2::write::GzEncoder;
use pprof_legacy::input::read_dump_path;
use pprof_legacy::pprof_raw::{FuncId, ParseResult};
use pprof_legacy::{ConvertError, FormatterConfig, Summary, convert, parse_raw};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/pprof.raw.txt")
}

fn fixture() -> Vec<u8> {
    fs::read(fixture_path()).unwrap()
}

#[test]
fn parse_fixture() {
    let profile = ParseResult::parse(&fixture()).unwrap();

    assert_eq!(profile.records.len(), 6);
    assert_eq!(profile.func_names.len(), 20);
    assert_eq!(profile.records[4].samples, 12);
    assert_eq!(profile.records[4].duration, Duration::from_millis(120));
    assert_eq!(
        profile.records[4].stack,
        (13..=17).map(FuncId).collect::<Vec<_>>()
    );
    assert_eq!(profile.name_of(FuncId(1)), Some("main.fib"));
    assert_eq!(profile.name_of(FuncId(17)), Some("runtime.morestack"));
}

#[test]
fn fixture_summary() {
    let profile = ParseResult::parse(&fixture()).unwrap();

    let summary = Summary::of(&profile);

    assert_eq!(summary.total_samples, 20);
    assert_eq!(summary.total_duration_ns, 200_000_000);
    assert_eq!(summary.unresolved, 0);
}

#[test]
fn parse_raw_fixture_contains_expected_stacks() {
    let got = String::from_utf8(parse_raw(&fixture()).unwrap()).unwrap();

    let fib = "main.fib
main.fib
main.fib
main.fib
main.main
runtime.main
runtime.goexit
1
";
    assert!(got.contains(fib), "missing expected stack:\n{fib}");

    let morestack = "runtime.schedule
runtime.goschedImpl
runtime.gopreempt_m
runtime.newstack
runtime.morestack
12
";
    assert!(got.contains(morestack), "missing expected stack:\n{morestack}");
}

#[test]
fn parse_raw_fixture_is_deterministic() {
    let bytes = fixture();

    assert_eq!(parse_raw(&bytes).unwrap(), parse_raw(&bytes).unwrap());
}

#[test]
fn convert_file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("stacks.txt");

    let input = BufReader::new(File::open(fixture_path()).unwrap());
    let output = BufWriter::new(File::create(&output_path).unwrap());
    convert(input, output, FormatterConfig::default()).unwrap();

    let written = fs::read(&output_path).unwrap();
    assert_eq!(written, parse_raw(&fixture()).unwrap());
}

#[test]
fn convert_with_blank_lines_separates_stacks() {
    let mut out = Vec::new();
    let config = FormatterConfig {
        stack_separator: true,
        ..FormatterConfig::default()
    };

    convert(fixture().as_slice(), &mut out, config).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("\n\n").count(), 6);
    assert!(text.ends_with("main.alloc\nruntime.goexit\n2\n\n"));
}

#[test]
fn gzipped_file_converts_like_plain() {
    let dir = tempfile::tempdir().unwrap();
    let gz_path = dir.path().join("pprof.raw.txt.gz");

    let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(&fixture()).unwrap();
    encoder.finish().unwrap();

    let bytes = read_dump_path(&gz_path).unwrap();

    assert_eq!(parse_raw(&bytes).unwrap(), parse_raw(&fixture()).unwrap());
}

#[test]
fn malformed_location_aborts_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let bad_path = dir.path().join("bad.raw.txt");
    let text = String::from_utf8(fixture())
        .unwrap()
        .replace("    12: 0x2120 main.fib :0 s=0", "    12");
    fs::write(&bad_path, text).unwrap();

    let mut out = Vec::new();
    let result = convert(File::open(&bad_path).unwrap(), &mut out, FormatterConfig::default());

    match result {
        Err(ConvertError::Parse(e)) => {
            assert_eq!(e.line, 25);
            assert_eq!(e.content, "    12");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(out.is_empty());
}
