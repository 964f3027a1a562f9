#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use steam_dispatch::core::header::{Header, Identity};
use steam_dispatch::protocol::decoders::{decode_chat_enter, decode_chat_msg, decode_machine_auth};
use steam_dispatch::{EMsg, SteamId};

fn chat_enter(members: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&1u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&2u32.to_le_bytes());
    buf.extend_from_slice(&3u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.push(0);
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&members.to_le_bytes());
    buf.extend_from_slice(b"benchmark room\0");
    for i in 0..members as u64 {
        buf.extend_from_slice(&i.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
    }
    buf
}

fn bench_decoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoders");

    let mut chat = Vec::new();
    chat.extend_from_slice(&1u64.to_le_bytes());
    chat.extend_from_slice(&2u64.to_le_bytes());
    chat.extend_from_slice(&1u32.to_le_bytes());
    chat.extend_from_slice(b"a reasonably sized chat line\0");
    group.bench_function("chat_msg", |b| {
        b.iter(|| decode_chat_msg(black_box(&chat)).unwrap().text.len())
    });

    let enter = chat_enter(64);
    group.bench_function("chat_enter_64_members", |b| {
        b.iter(|| {
            let view = decode_chat_enter(black_box(&enter)).unwrap();
            view.members.iter().count()
        })
    });

    let auth = prost::Message::encode_to_vec(&steam_dispatch::core::schema::CMsgClientUpdateMachineAuth {
        bytes: Some(vec![7u8; 2048]),
        ..Default::default()
    });
    group.bench_function("machine_auth_sha1_2k", |b| {
        b.iter(|| decode_machine_auth(black_box(&auth)).unwrap())
    });

    let identity = Identity {
        steam_id: SteamId(76561198000000001),
        session_id: 7,
    };
    let framed: Bytes = Header::outbound(EMsg::CLIENT_HEART_BEAT, 42, identity).encode(&[0u8; 32]);
    group.bench_function("protobuf_header_parse", |b| {
        b.iter(|| Header::parse(black_box(framed.clone())).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_decoders);
criterion_main!(benches);
