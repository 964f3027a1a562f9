#![allow(clippy::unwrap_used, clippy::uninlined_format_args)]

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use prost::Message;
use steam_dispatch::config::BatchConfig;
use steam_dispatch::core::schema::CMsgMulti;
use steam_dispatch::protocol::batch::BatchUnpacker;
use steam_dispatch::utils::compression::{compress_single_entry, BATCH_ENTRY_NAME};

fn run_of(records: usize, record_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records * (record_len + 4));
    for i in 0..records {
        buf.extend_from_slice(&(record_len as u32).to_le_bytes());
        buf.extend(std::iter::repeat((i % 251) as u8).take(record_len));
    }
    buf
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_unpack");
    let unpacker = BatchUnpacker::new(&BatchConfig::default());

    for &records in &[4usize, 64, 512] {
        let plain = run_of(records, 96);
        group.throughput(Throughput::Bytes(plain.len() as u64));

        let uncompressed: Bytes = CMsgMulti {
            size_unzipped: Some(0),
            message_body: Some(plain.clone().into()),
        }
        .encode_to_vec()
        .into();
        group.bench_function(format!("plain_{}_records", records), |b| {
            b.iter(|| {
                let batch = unpacker.unpack(&uncompressed).unwrap();
                assert_eq!(batch.records.len(), records);
            })
        });

        let compressed: Bytes = CMsgMulti {
            size_unzipped: Some(plain.len() as u32),
            message_body: Some(compress_single_entry(BATCH_ENTRY_NAME, &plain).unwrap().into()),
        }
        .encode_to_vec()
        .into();
        group.bench_function(format!("zip_{}_records", records), |b| {
            b.iter(|| {
                let batch = unpacker.unpack(&compressed).unwrap();
                assert_eq!(batch.records.len(), records);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch);
criterion_main!(benches);
