//! Extraction of a downloaded e-print into its own directory.

use crate::error::FetchError;
use crate::format::{decoder, detect_file_format};
use crate::identifier::Identifier;
use crate::storage::{persist, temp_file_beside};
use crate::types::{ArchiveFormat, Compression, ExtractStats};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

/// Extract `input_path` into `<extract_root>/<identifier>/`.
///
/// The payload is classified first and then handled by exactly one of:
/// - tar (plain, gzip, bzip2 or xz): every member is unpacked into the
///   directory; members whose path would escape it are skipped by `tar`
/// - single compressed stream: the decompressed bytes are written to
///   `<extract_root>/<identifier>/<identifier>`
///
/// Extraction is repeated on every call; existing members are overwritten.
///
/// # Errors
///
/// - `UnsupportedFormat` if the payload is neither tar nor compressed
/// - `Corrupted` if a recognised payload fails to decode
/// - `Cancelled` if `cancel_flag` is set between tar members
/// - `Io` for filesystem failures
pub fn extract_archive(
    input_path: &Path,
    identifier: &Identifier,
    extract_root: &Path,
    cancel_flag: &AtomicBool,
) -> Result<ExtractStats, FetchError> {
    let start_time = Instant::now();

    let output_dir = extract_root.join(identifier.relative_path());
    fs::create_dir_all(&output_dir)?;

    let format = detect_file_format(input_path)?;
    debug!(path = %input_path.display(), %format, "classified payload");

    let mut stats = match format {
        ArchiveFormat::TapeArchive(compression) => {
            unpack_tar(input_path, compression, &output_dir, cancel_flag)?
        }
        ArchiveFormat::SingleStream(compression) => {
            let target = output_dir.join(identifier.relative_path());
            decompress_stream(input_path, compression, &target)?
        }
        ArchiveFormat::Unknown => {
            return Err(FetchError::UnsupportedFormat(input_path.to_path_buf()));
        }
    };

    stats.format = format;
    stats.duration = start_time.elapsed();
    Ok(stats)
}

fn open_decoded(path: &Path, compression: Compression) -> io::Result<Box<dyn io::Read>> {
    let file = File::open(path)?;
    Ok(decoder(BufReader::new(file), compression))
}

/// Unpack every member of a tar stream into `output_dir`.
fn unpack_tar(
    archive_path: &Path,
    compression: Compression,
    output_dir: &Path,
    cancel_flag: &AtomicBool,
) -> Result<ExtractStats, FetchError> {
    let mut stats = ExtractStats::new(ArchiveFormat::TapeArchive(compression));
    let mut archive = tar::Archive::new(open_decoded(archive_path, compression)?);
    archive.set_overwrite(true);

    let entries = archive
        .entries()
        .map_err(|e| header_error(archive_path, e))?;

    for entry in entries {
        if cancel_flag.load(Ordering::Relaxed) {
            return Err(FetchError::Cancelled);
        }

        let mut entry = entry.map_err(|e| header_error(archive_path, e))?;
        let is_file = entry.header().entry_type().is_file();
        let size = entry.size();
        let member = entry.path().map(PathBuf::from).unwrap_or_default();

        let unpacked = entry
            .unpack_in(output_dir)
            .map_err(|e| read_error(archive_path, e))?;

        if !unpacked {
            debug!(member = %member.display(), "skipped member outside extraction directory");
            continue;
        }

        if is_file {
            stats.files_extracted += 1;
            stats.bytes_written += size;
        }
    }

    Ok(stats)
}

/// Decompress a single stream into `target`, replacing it atomically.
fn decompress_stream(
    input_path: &Path,
    compression: Compression,
    target: &Path,
) -> Result<ExtractStats, FetchError> {
    let mut stats = ExtractStats::new(ArchiveFormat::SingleStream(compression));
    let mut reader = open_decoded(input_path, compression)?;
    let mut temp = temp_file_beside(target)?;

    let written = io::copy(&mut reader, &mut temp).map_err(|e| read_error(input_path, e))?;
    persist(temp, target)?;

    stats.files_extracted = 1;
    stats.bytes_written = written;
    Ok(stats)
}

/// Decoder failures surface as `InvalidData`/`InvalidInput`/`UnexpectedEof`
/// from the reader chain; anything else is a genuine I/O problem.
fn read_error(path: &Path, err: io::Error) -> FetchError {
    match err.kind() {
        io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::UnexpectedEof => FetchError::corrupted(path, err),
        _ => FetchError::Io(err),
    }
}

/// Errors while reading tar headers. `tar` reports its own header
/// problems, such as a checksum mismatch, as `ErrorKind::Other`.
fn header_error(path: &Path, err: io::Error) -> FetchError {
    match err.kind() {
        io::ErrorKind::Other => FetchError::corrupted(path, err),
        _ => read_error(path, err),
    }
}
