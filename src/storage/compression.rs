//! Transparent decompression for input files.
//!
//! Compression is orthogonal to the logical format: `users.csv.gz` is a CSV
//! file wrapped in gzip. Inputs are decompressed fully into memory before
//! parsing.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::store::error::{FqError, Result};

/// Compression wrappers recognised by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
    Zip,
    Xz,
}

impl Compression {
    /// Maps a lowercase extension (without the dot) to a codec.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gz" => Some(Self::Gzip),
            "bz2" => Some(Self::Bzip2),
            "zip" => Some(Self::Zip),
            "xz" => Some(Self::Xz),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Zip => "zip",
            Self::Xz => "xz",
        }
    }
}

/// Reads `path` and returns its decompressed contents.
pub fn read_to_bytes(path: &Path, compression: Compression) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    decompress(raw, compression)
}

/// Decompress `data` with the given codec.
pub fn decompress(data: Vec<u8>, compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data),
        Compression::Gzip => decompress_gzip(&data),
        Compression::Bzip2 => decompress_bzip2(&data),
        Compression::Zip => decompress_zip(data),
        Compression::Xz => decompress_xz(&data),
    }
}

fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::MultiGzDecoder;

    let mut decoder = MultiGzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| FqError::Decompression(format!("gzip: {}", e)))?;

    Ok(output)
}

fn decompress_bzip2(data: &[u8]) -> Result<Vec<u8>> {
    use bzip2::read::MultiBzDecoder;

    let mut decoder = MultiBzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| FqError::Decompression(format!("bzip2: {}", e)))?;

    Ok(output)
}

fn decompress_xz(data: &[u8]) -> Result<Vec<u8>> {
    use xz2::read::XzDecoder;

    let mut decoder = XzDecoder::new_multi_decoder(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| FqError::Decompression(format!("xz: {}", e)))?;

    Ok(output)
}

/// Only the first file entry of the archive is read.
fn decompress_zip(data: Vec<u8>) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| FqError::Decompression(format!("zip: {}", e)))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| FqError::Decompression(format!("zip: {}", e)))?;
        if entry.is_dir() {
            continue;
        }

        let mut output = Vec::new();
        entry
            .read_to_end(&mut output)
            .map_err(|e| FqError::Decompression(format!("zip: {}", e)))?;
        return Ok(output);
    }

    Err(FqError::Decompression("zip: archive has no file entries".to_string()))
}
