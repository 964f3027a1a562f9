//! Edge cases for batch expansion and compressed containers

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::Bytes;
use prost::Message;
use std::io::{Cursor, Write};
use steam_dispatch::config::BatchConfig;
use steam_dispatch::core::schema::CMsgMulti;
use steam_dispatch::protocol::batch::{split_records, BatchUnpacker};
use steam_dispatch::utils::compression::{
    compress_single_entry, extract_single_entry, BATCH_ENTRY_NAME,
};
use steam_dispatch::ProtocolError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

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
        message_body: Some(body.into()),
    }
    .encode_to_vec()
    .into()
}

fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn unpacker() -> BatchUnpacker {
    BatchUnpacker::new(&BatchConfig::default())
}

#[test]
fn test_lengths_three_and_five() {
    let batch = unpacker()
        .unpack(&multi(0, framed(&[b"one", b"three"])))
        .unwrap();
    assert_eq!(batch.records.len(), 2);
    assert_eq!(&batch.records[0][..], b"one");
    assert_eq!(&batch.records[1][..], b"three");
}

#[test]
fn test_zero_length_record() {
    let records = split_records(Bytes::from(framed(&[b"", b"x"]))).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_empty());
}

#[test]
fn test_overrun() {
    let mut buf = framed(&[b"abc"]);
    buf.extend_from_slice(&6u32.to_le_bytes());
    buf.extend_from_slice(b"abcde");
    let err = unpacker().unpack(&multi(0, buf)).unwrap_err();
    assert!(matches!(err, ProtocolError::FramingError(_)));
}

#[test]
fn test_length_prefix_cut_short() {
    let mut buf = framed(&[b"abc"]);
    buf.extend_from_slice(&[5, 0, 0]);
    assert!(matches!(
        split_records(Bytes::from(buf)),
        Err(ProtocolError::FramingError(_))
    ));
}

#[test]
fn test_compressed_equivalent_to_plain() {
    let plain = framed(&[b"one", b"three"]);
    let container = compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap();
    let compressed = unpacker()
        .unpack(&multi(plain.len() as u32, container))
        .unwrap();
    let uncompressed = unpacker().unpack(&multi(0, plain)).unwrap();
    assert_eq!(compressed.records, uncompressed.records);
    assert!(compressed.compressed);
}

#[test]
fn test_wrong_entry_name() {
    let plain = framed(&[b"abc"]);
    let container = zip_with(&[("y", plain.as_slice())]);
    assert!(matches!(
        unpacker().unpack(&multi(plain.len() as u32, container)),
        Err(ProtocolError::DecompressionFailure(_))
    ));
}

#[test]
fn test_extra_entry() {
    let plain = framed(&[b"abc"]);
    let container = zip_with(&[("z", plain.as_slice()), ("extra", &b"1"[..])]);
    assert!(matches!(
        unpacker().unpack(&multi(plain.len() as u32, container)),
        Err(ProtocolError::DecompressionFailure(_))
    ));
}

#[test]
fn test_empty_container() {
    let container = zip_with(&[]);
    assert!(matches!(
        unpacker().unpack(&multi(4, container)),
        Err(ProtocolError::DecompressionFailure(_))
    ));
}

#[test]
fn test_declared_size_smaller_than_entry() {
    let plain = framed(&[b"abcdef"]);
    let container = compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap();
    assert!(matches!(
        unpacker().unpack(&multi(plain.len() as u32 - 1, container)),
        Err(ProtocolError::DecompressionFailure(_))
    ));
}

#[test]
fn test_corrupt_container() {
    assert!(matches!(
        unpacker().unpack(&multi(16, b"PK\x03\x04 definitely not a zip".to_vec())),
        Err(ProtocolError::DecompressionFailure(_))
    ));
}

#[test]
fn test_bomb_limit_checked_before_inflating() {
    let data = vec![0u8; 64 * 1024];
    let container = compress_single_entry(BATCH_ENTRY_NAME, &data).unwrap();
    assert!(container.len() < data.len() / 10);

    let err = extract_single_entry(&container, BATCH_ENTRY_NAME, data.len(), 1024).unwrap_err();
    assert!(err.to_string().contains("exceeds limit"));
}

#[test]
fn test_malformed_multi_body() {
    assert!(matches!(
        unpacker().unpack(&Bytes::from_static(&[0x0a, 0xff])),
        Err(ProtocolError::ProtocolViolation(_))
    ));
}
