//! Reading raw dumps from files, stdin, or gzip-compressed sources.

use crate::legacy::Result;
use flate2::read::MultiGzDecoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read all bytes from `reader`, decompressing them if they are gzipped.
pub fn read_dump<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    maybe_decompress(bytes)
}

/// Read a dump from `path`, or from stdin when `path` is `-`.
pub fn read_dump_path(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        return read_dump(io::stdin().lock());
    }

    let file = File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to open input file '{}': {}", path.display(), e),
        )
    })?;
    read_dump(BufReader::new(file))
}

/// Decompress `bytes` if they start with the gzip magic number.
pub fn maybe_decompress(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut decoded = Vec::new();
    MultiGzDecoder::new(bytes.as_slice()).read_to_end(&mut decoded)?;
    debug!(
        "decompressed gzip input: {} -> {} bytes",
        bytes.len(),
        decoded.len()
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const DUMP: &[u8] = b"Samples:\nsamples/count cpu/nanoseconds\n   1 10: 3\n";

    #[test]
    fn plain_input_passes_through() {
        let bytes = read_dump(DUMP).unwrap();

        assert_eq!(bytes, DUMP);
    }

    #[test]
    fn gzip_input_is_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(DUMP).unwrap();
        let compressed = encoder.finish().unwrap();

        let bytes = read_dump(compressed.as_slice()).unwrap();

        assert_eq!(bytes, DUMP);
    }

    #[test]
    fn truncated_gzip_fails() {
        let result = maybe_decompress(vec![0x1f, 0x8b, 0x08]);

        assert!(result.is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_dump_path(Path::new("/nonexistent/raw.txt")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/raw.txt"));
    }
}
