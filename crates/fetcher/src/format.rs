//! Payload classification by magic numbers.
//!
//! Instead of trying tar extraction and falling back on any failure, the
//! downloaded file is classified once up front and then extracted by a
//! single dispatch. Corruption inside a recognised format is reported as
//! such rather than mistaken for the other format.

use crate::types::{ArchiveFormat, Compression};
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use xz2::read::XzDecoder;

/// Size of a tar header block.
const TAR_BLOCK: usize = 512;

/// Longest magic number checked by `detect_compression`.
const MAGIC_LEN: u64 = 6;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_OFFSET: usize = 257;
const CHKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// Classify an in-memory payload.
///
/// `bytes` may be only the start of a payload; a compressed head must
/// still decode to at least one tar block to be recognised as a tar.
///
/// # Examples
///
/// ```
/// use fetcher::{detect_format, ArchiveFormat};
///
/// assert_eq!(detect_format(b"%PDF-1.5"), ArchiveFormat::Unknown);
/// ```
pub fn detect_format(bytes: &[u8]) -> ArchiveFormat {
    let compression = detect_compression(bytes);
    classify(compression, &first_block(bytes, compression))
}

/// Classify the file at `path`.
///
/// The decoder runs over the file itself until it yields the first tar
/// block, however much compressed input that takes. A bzip2 block, for
/// instance, produces no output before up to 900 kB of input is consumed.
pub fn detect_file_format(path: &Path) -> io::Result<ArchiveFormat> {
    let mut magic = Vec::with_capacity(MAGIC_LEN as usize);
    File::open(path)?.take(MAGIC_LEN).read_to_end(&mut magic)?;

    let compression = detect_compression(&magic);
    let file = BufReader::new(File::open(path)?);
    let block = first_block(file, compression);

    Ok(classify(compression, &block))
}

fn classify(compression: Compression, block: &[u8]) -> ArchiveFormat {
    match (compression, is_tar_header(block)) {
        (Compression::None, true) => ArchiveFormat::TapeArchive(Compression::None),
        (Compression::None, false) => ArchiveFormat::Unknown,
        (compression, true) => ArchiveFormat::TapeArchive(compression),
        (compression, false) => ArchiveFormat::SingleStream(compression),
    }
}

fn detect_compression(bytes: &[u8]) -> Compression {
    if bytes.starts_with(GZIP_MAGIC) {
        Compression::Gzip
    } else if bytes.starts_with(BZIP2_MAGIC)
        && bytes.get(3).is_some_and(|b| (b'1'..=b'9').contains(b))
    {
        Compression::Bzip2
    } else if bytes.starts_with(XZ_MAGIC) {
        Compression::Xz
    } else {
        Compression::None
    }
}

/// Wrap a reader in the decoder for `compression`.
pub(crate) fn decoder<'a, R: Read + 'a>(
    reader: R,
    compression: Compression,
) -> Box<dyn Read + 'a> {
    match compression {
        Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
        Compression::Xz => Box::new(XzDecoder::new(reader)),
        Compression::None => Box::new(reader),
    }
}

/// Up to one tar block of decoded payload. The input may be truncated or
/// corrupt; a decoder error just ends the block early and is reported
/// later by extraction.
fn first_block<R: Read>(reader: R, compression: Compression) -> Vec<u8> {
    let mut block = Vec::with_capacity(TAR_BLOCK);
    let _ = decoder(reader, compression)
        .take(TAR_BLOCK as u64)
        .read_to_end(&mut block);
    block
}

/// Whether `bytes` starts with a tar header: POSIX/GNU `ustar` magic, or a
/// pre-POSIX header whose checksum matches.
fn is_tar_header(bytes: &[u8]) -> bool {
    let Some(block) = bytes.get(..TAR_BLOCK) else {
        return false;
    };

    if block[USTAR_OFFSET..].starts_with(USTAR_MAGIC) {
        return true;
    }

    let Some(stored) = parse_octal(&block[CHKSUM_RANGE]) else {
        return false;
    };

    let computed: u64 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let b = if CHKSUM_RANGE.contains(&i) { b' ' } else { b };
            u64::from(b)
        })
        .sum();

    stored == computed
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let digits: &[u8] = {
        let start = field.iter().position(|&b| b != b' ')?;
        let field = &field[start..];
        let end = field
            .iter()
            .position(|&b| b == 0 || b == b' ')
            .unwrap_or(field.len());
        &field[..end]
    };

    if digits.is_empty() {
        return None;
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| u64::from_str_radix(s, 8).ok())
}
