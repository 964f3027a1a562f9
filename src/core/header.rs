//! Envelope header codec.
//!
//! Three header shapes exist on the wire, all little-endian:
//!
//! ```text
//! Protobuf:  [EMsg|0x80000000 (4)] [HeaderLen (4)] [CMsgProtoBufHeader (HeaderLen)]
//! Channel:   [EMsg (4)] [TargetJob (8)] [SourceJob (8)]
//! Extended:  [EMsg (4)] [Size=36 (1)] [Version=2 (2)] [TargetJob (8)] [SourceJob (8)]
//!            [Canary=239 (1)] [SteamId (8)] [SessionId (4)]
//! ```
//!
//! Inbound envelopes announce the protobuf shape through the high bit of the kind. The
//! channel shape is reserved for the handshake kinds; everything else uses the extended
//! shape.

use crate::core::reader::WireReader;
use crate::core::schema::CMsgProtoBufHeader;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::{EMsg, Envelope, SteamId, PROTO_MASK};
use bytes::{BufMut, Bytes, BytesMut};
use prost::Message;

/// Wire sentinel for "no job".
pub const JOB_ID_NONE: u64 = u64::MAX;

const EXTENDED_HEADER_SIZE: u8 = 36;
const EXTENDED_HEADER_VERSION: u16 = 2;
const EXTENDED_HEADER_CANARY: u8 = 239;

/// Account handle and session assigned by the server at logon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub steam_id: SteamId,
    pub session_id: i32,
}

impl Identity {
    pub fn is_assigned(&self) -> bool {
        self.session_id != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderShape {
    Protobuf,
    Channel,
    Extended,
}

impl HeaderShape {
    /// Shape used when this core sends a message of the given kind.
    pub fn for_kind(kind: EMsg) -> Self {
        if kind.is_channel_encrypt() {
            HeaderShape::Channel
        } else if matches!(
            kind,
            EMsg::CLIENT_CHAT_MSG | EMsg::CLIENT_CHAT_ENTER | EMsg::CLIENT_CHAT_MEMBER_INFO
        ) {
            HeaderShape::Extended
        } else {
            HeaderShape::Protobuf
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub shape: HeaderShape,
    pub kind: EMsg,
    pub target_job: u64,
    pub source_job: u64,
    pub identity: Identity,
}

impl Header {
    /// Header for a message this client originates, answering `job_id` if non-zero.
    pub fn outbound(kind: EMsg, job_id: u64, identity: Identity) -> Self {
        Self {
            shape: HeaderShape::for_kind(kind),
            kind,
            target_job: if job_id == 0 { JOB_ID_NONE } else { job_id },
            source_job: JOB_ID_NONE,
            identity,
        }
    }

    /// Split a raw envelope into its header and body.
    pub fn parse(raw: Bytes) -> Result<(Header, Bytes)> {
        let mut reader = WireReader::new("envelope header", &raw);
        let wire_kind = reader.u32()?;
        let kind = EMsg::from_wire(wire_kind);

        let header = if wire_kind & PROTO_MASK != 0 {
            let len = reader.u32()? as usize;
            let proto = CMsgProtoBufHeader::decode(reader.bytes(len)?)?;
            Header {
                shape: HeaderShape::Protobuf,
                kind,
                target_job: proto.jobid_target.unwrap_or(JOB_ID_NONE),
                source_job: proto.jobid_source.unwrap_or(JOB_ID_NONE),
                identity: Identity {
                    steam_id: SteamId(proto.steamid.unwrap_or_default()),
                    session_id: proto.client_sessionid.unwrap_or_default(),
                },
            }
        } else if kind.is_channel_encrypt() {
            Header {
                shape: HeaderShape::Channel,
                kind,
                target_job: reader.u64()?,
                source_job: reader.u64()?,
                identity: Identity::default(),
            }
        } else {
            if reader.u8()? != EXTENDED_HEADER_SIZE {
                return Err(ProtocolError::ProtocolViolation(
                    constants::ERR_HEADER_SIZE.into(),
                ));
            }
            let _version = reader.u16()?;
            let target_job = reader.u64()?;
            let source_job = reader.u64()?;
            if reader.u8()? != EXTENDED_HEADER_CANARY {
                return Err(ProtocolError::ProtocolViolation(
                    constants::ERR_HEADER_CANARY.into(),
                ));
            }
            let steam_id = reader.steam_id()?;
            let session_id = reader.i32()?;
            Header {
                shape: HeaderShape::Extended,
                kind,
                target_job,
                source_job,
                identity: Identity {
                    steam_id,
                    session_id,
                },
            }
        };

        let offset = reader.position();
        Ok((header, raw.slice(offset..)))
    }

    /// Prepend this header to `body`.
    pub fn encode(&self, body: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(body.len() + 64);
        match self.shape {
            HeaderShape::Protobuf => {
                let proto = CMsgProtoBufHeader {
                    steamid: Some(self.identity.steam_id.0),
                    client_sessionid: Some(self.identity.session_id),
                    jobid_source: (self.source_job != JOB_ID_NONE).then_some(self.source_job),
                    jobid_target: (self.target_job != JOB_ID_NONE).then_some(self.target_job),
                    ..Default::default()
                };
                let encoded = proto.encode_to_vec();
                buf.put_u32_le(self.kind.0 | PROTO_MASK);
                buf.put_u32_le(encoded.len() as u32);
                buf.put_slice(&encoded);
            }
            HeaderShape::Channel => {
                buf.put_u32_le(self.kind.0);
                buf.put_u64_le(self.target_job);
                buf.put_u64_le(self.source_job);
            }
            HeaderShape::Extended => {
                buf.put_u32_le(self.kind.0);
                buf.put_u8(EXTENDED_HEADER_SIZE);
                buf.put_u16_le(EXTENDED_HEADER_VERSION);
                buf.put_u64_le(self.target_job);
                buf.put_u64_le(self.source_job);
                buf.put_u8(EXTENDED_HEADER_CANARY);
                buf.put_u64_le(self.identity.steam_id.0);
                buf.put_i32_le(self.identity.session_id);
            }
        }
        buf.put_slice(body);
        buf.freeze()
    }

    /// Job id a handler should correlate replies with; 0 when the sender set none.
    pub fn job_id(&self) -> u64 {
        if self.source_job == JOB_ID_NONE {
            0
        } else {
            self.source_job
        }
    }

    pub fn into_envelope(self, body: Bytes) -> Envelope {
        Envelope {
            kind: self.kind,
            job_id: self.job_id(),
            payload: body,
        }
    }
}

/// Frame an outbound body for `kind`.
pub fn encode(kind: EMsg, job_id: u64, identity: &Identity, body: &[u8]) -> Bytes {
    Header::outbound(kind, job_id, *identity).encode(body)
}
