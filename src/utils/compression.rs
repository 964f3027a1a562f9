//! Single-entry zip containers used by compressed batches.
//!
//! A compressed batch body is a complete zip archive holding exactly one deflated entry
//! named `"z"`. Extraction enforces the declared size both before allocation and after
//! inflation, so a container can never expand past what its envelope announced.

use crate::error::{constants, ProtocolError, Result};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry name every compressed batch container must use.
pub const BATCH_ENTRY_NAME: &str = "z";

fn failure(context: &str, err: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::DecompressionFailure(format!("{context}: {err}"))
}

/// Inflate the only entry of `container`.
///
/// # Errors
/// Returns `ProtocolError::DecompressionFailure` if:
/// - `declared_size` exceeds `max_size`
/// - the archive cannot be opened or holds anything other than one entry
/// - the entry name is not `entry_name`
/// - the entry's recorded or actual inflated size differs from `declared_size`
/// - the entry fails to inflate or its checksum does not match
pub fn extract_single_entry(
    container: &[u8],
    entry_name: &str,
    declared_size: usize,
    max_size: usize,
) -> Result<Vec<u8>> {
    if declared_size > max_size {
        return Err(ProtocolError::DecompressionFailure(format!(
            "{} ({declared_size} > {max_size})",
            constants::ERR_DECLARED_SIZE_LIMIT
        )));
    }

    let mut archive = ZipArchive::new(Cursor::new(container))
        .map_err(|e| failure(constants::ERR_CONTAINER_OPEN, e))?;

    if archive.len() != 1 {
        return Err(ProtocolError::DecompressionFailure(format!(
            "{} (found {})",
            constants::ERR_CONTAINER_ENTRY_COUNT,
            archive.len()
        )));
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| failure(constants::ERR_CONTAINER_OPEN, e))?;

    if entry.name() != entry_name {
        return Err(ProtocolError::DecompressionFailure(format!(
            "{} (found {:?})",
            constants::ERR_CONTAINER_ENTRY_NAME,
            entry.name()
        )));
    }

    if entry.size() != declared_size as u64 {
        return Err(ProtocolError::DecompressionFailure(format!(
            "{} (entry {}, declared {declared_size})",
            constants::ERR_CONTAINER_ENTRY_SIZE,
            entry.size()
        )));
    }

    // One extra byte lets an entry that inflates past its header be detected
    let mut out = Vec::with_capacity(declared_size);
    Read::by_ref(&mut entry)
        .take(declared_size as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| failure(constants::ERR_CONTAINER_READ, e))?;

    if out.len() != declared_size {
        return Err(ProtocolError::DecompressionFailure(format!(
            "{} (inflated {}, declared {declared_size})",
            constants::ERR_CONTAINER_ENTRY_SIZE,
            out.len()
        )));
    }

    Ok(out)
}

/// Build a deflated single-entry container, the inverse of [`extract_single_entry`].
///
/// # Errors
/// Returns `ProtocolError::DecompressionFailure` if the archive cannot be written
pub fn compress_single_entry(entry_name: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer
        .start_file(entry_name, options)
        .map_err(|e| failure("Failed to start container entry", e))?;
    writer
        .write_all(data)
        .map_err(|e| failure("Failed to write container entry", e))?;
    let cursor = writer
        .finish()
        .map_err(|e| failure("Failed to finish container", e))?;

    Ok(cursor.into_inner())
}
