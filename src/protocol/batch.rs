//! Multi batch expansion.
//!
//! A batch body is a `CMsgMulti`. With `size_unzipped == 0` its `message_body` is a run of
//! `{u32 length}{length bytes}` records; otherwise it is a zip container whose single
//! entry `"z"` inflates to that run. Records are returned as slices of one shared buffer.

use crate::config::BatchConfig;
use crate::core::schema::CMsgMulti;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::compression::{extract_single_entry, BATCH_ENTRY_NAME};
use bytes::{Buf, Bytes};
use prost::Message;
use tracing::trace;

const RECORD_LEN_PREFIX: usize = 4;

/// Records carried by one batch, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedBatch {
    pub records: Vec<Bytes>,
    pub compressed: bool,
}

#[derive(Debug, Clone)]
pub struct BatchUnpacker {
    max_uncompressed_size: usize,
    max_nesting_depth: usize,
}

impl BatchUnpacker {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            max_uncompressed_size: config.max_uncompressed_size,
            max_nesting_depth: config.max_nesting_depth,
        }
    }

    /// How many batches may enclose one another before expansion is refused.
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Decode a batch body into its raw sub-envelopes.
    ///
    /// The whole buffer is framed before anything is returned, so a bad batch never
    /// yields a partial result.
    ///
    /// # Errors
    /// - `ProtocolError::ProtocolViolation` if the body is not a valid `CMsgMulti`
    /// - `ProtocolError::DecompressionFailure` if the container is malformed, has the wrong
    ///   entry, or inflates to anything other than the declared size
    /// - `ProtocolError::FramingError` if record lengths do not add up to the buffer
    pub fn unpack(&self, payload: &Bytes) -> Result<UnpackedBatch> {
        let multi = CMsgMulti::decode(payload.clone())?;
        let body = multi.message_body.unwrap_or_default();
        let declared = multi.size_unzipped.unwrap_or_default() as usize;

        let (buffer, compressed) = if declared == 0 {
            (body, false)
        } else {
            let inflated = extract_single_entry(
                &body,
                BATCH_ENTRY_NAME,
                declared,
                self.max_uncompressed_size,
            )?;
            (Bytes::from(inflated), true)
        };

        let records = split_records(buffer)?;
        trace!(records = records.len(), compressed, "Batch unpacked");
        Ok(UnpackedBatch {
            records,
            compressed,
        })
    }
}

/// Split a `{u32 length}{length bytes}` run into zero-copy records.
pub fn split_records(mut buffer: Bytes) -> Result<Vec<Bytes>> {
    let mut records = Vec::new();
    while buffer.has_remaining() {
        if buffer.remaining() < RECORD_LEN_PREFIX {
            return Err(ProtocolError::FramingError(format!(
                "{} ({} bytes left)",
                constants::ERR_RECORD_HEADER_TRUNCATED,
                buffer.remaining()
            )));
        }
        let len = buffer.get_u32_le() as usize;
        if len > buffer.remaining() {
            return Err(ProtocolError::FramingError(format!(
                "{} (length {len}, {} bytes left)",
                constants::ERR_RECORD_OVERRUN,
                buffer.remaining()
            )));
        }
        records.push(buffer.split_to(len));
    }
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::utils::compression::compress_single_entry;

    fn framed(bodies: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        for body in bodies {
            buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
            buf.extend_from_slice(body);
        }
        buf
    }

    fn multi(size_unzipped: u32, body: Vec<u8>) -> Bytes {
        CMsgMulti {
            size_unzipped: Some(size_unzipped),
            message_body: Some(Bytes::from(body)),
        }
        .encode_to_vec()
        .into()
    }

    fn unpacker() -> BatchUnpacker {
        BatchUnpacker::new(&BatchConfig::default())
    }

    #[test]
    fn test_uncompressed_records_in_order() {
        let batch = unpacker()
            .unpack(&multi(0, framed(&[b"abc", b"defgh"])))
            .unwrap();
        assert!(!batch.compressed);
        assert_eq!(batch.records, vec![Bytes::from_static(b"abc"), Bytes::from_static(b"defgh")]);
    }

    #[test]
    fn test_compressed_matches_uncompressed() {
        let plain = framed(&[b"abc", b"defgh"]);
        let container = compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap();
        let batch = unpacker()
            .unpack(&multi(plain.len() as u32, container))
            .unwrap();
        assert!(batch.compressed);

        let expected = unpacker().unpack(&multi(0, plain)).unwrap();
        assert_eq!(batch.records, expected.records);
    }

    #[test]
    fn test_overrun_is_framing_error() {
        let mut buf = framed(&[b"abc"]);
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(b"short");
        assert!(matches!(
            unpacker().unpack(&multi(0, buf)),
            Err(ProtocolError::FramingError(_))
        ));
    }

    #[test]
    fn test_trailing_partial_prefix_is_framing_error() {
        let mut buf = framed(&[b"abc"]);
        buf.extend_from_slice(&[1, 0]);
        assert!(matches!(
            split_records(Bytes::from(buf)),
            Err(ProtocolError::FramingError(_))
        ));
    }

    #[test]
    fn test_size_mismatch_is_decompression_failure() {
        let plain = framed(&[b"abc"]);
        let container = compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap();
        assert!(matches!(
            unpacker().unpack(&multi(plain.len() as u32 + 1, container)),
            Err(ProtocolError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_declared_size_over_limit() {
        let config = BatchConfig {
            max_uncompressed_size: 8,
            ..Default::default()
        };
        let plain = framed(&[b"abcdefgh"]);
        let container = compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap();
        assert!(matches!(
            BatchUnpacker::new(&config).unpack(&multi(plain.len() as u32, container)),
            Err(ProtocolError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_empty_batch_has_no_records() {
        let batch = unpacker().unpack(&multi(0, Vec::new())).unwrap();
        assert!(batch.records.is_empty());
    }
}
