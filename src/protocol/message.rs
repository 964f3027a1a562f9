//! Message kinds, result codes and the envelope types that flow through the dispatcher.
//!
//! The numeric values are the wire contract of the connection-manager protocol. They are
//! modelled as transparent newtypes with associated constants rather than closed enums so
//! that kinds this core does not know about still round-trip unchanged.

use crate::core::header::Identity;
use bytes::Bytes;
use std::fmt;

/// Bit set on the wire kind when the envelope carries a protobuf header.
pub const PROTO_MASK: u32 = 0x8000_0000;

/// Message kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EMsg(pub u32);

impl EMsg {
    pub const MULTI: EMsg = EMsg(1);
    pub const CLIENT_HEART_BEAT: EMsg = EMsg(703);
    pub const CLIENT_LOG_ON_RESPONSE: EMsg = EMsg(751);
    pub const CLIENT_PERSONA_STATE: EMsg = EMsg(766);
    pub const CLIENT_CHAT_MSG: EMsg = EMsg(799);
    pub const CLIENT_CHAT_ENTER: EMsg = EMsg(807);
    pub const CLIENT_CHAT_MEMBER_INFO: EMsg = EMsg(810);
    pub const CHANNEL_ENCRYPT_REQUEST: EMsg = EMsg(1303);
    pub const CHANNEL_ENCRYPT_RESPONSE: EMsg = EMsg(1304);
    pub const CHANNEL_ENCRYPT_RESULT: EMsg = EMsg(1305);
    pub const CLIENT_UPDATE_MACHINE_AUTH: EMsg = EMsg(5537);
    pub const CLIENT_UPDATE_MACHINE_AUTH_RESPONSE: EMsg = EMsg(5538);

    /// Strip the protobuf flag from a raw wire value.
    pub fn from_wire(raw: u32) -> Self {
        EMsg(raw & !PROTO_MASK)
    }

    /// The three handshake kinds travel with the short, non-protobuf header.
    pub fn is_channel_encrypt(self) -> bool {
        matches!(
            self,
            EMsg::CHANNEL_ENCRYPT_REQUEST
                | EMsg::CHANNEL_ENCRYPT_RESPONSE
                | EMsg::CHANNEL_ENCRYPT_RESULT
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            EMsg::MULTI => "Multi",
            EMsg::CLIENT_HEART_BEAT => "ClientHeartBeat",
            EMsg::CLIENT_LOG_ON_RESPONSE => "ClientLogOnResponse",
            EMsg::CLIENT_PERSONA_STATE => "ClientPersonaState",
            EMsg::CLIENT_CHAT_MSG => "ClientChatMsg",
            EMsg::CLIENT_CHAT_ENTER => "ClientChatEnter",
            EMsg::CLIENT_CHAT_MEMBER_INFO => "ClientChatMemberInfo",
            EMsg::CHANNEL_ENCRYPT_REQUEST => "ChannelEncryptRequest",
            EMsg::CHANNEL_ENCRYPT_RESPONSE => "ChannelEncryptResponse",
            EMsg::CHANNEL_ENCRYPT_RESULT => "ChannelEncryptResult",
            EMsg::CLIENT_UPDATE_MACHINE_AUTH => "ClientUpdateMachineAuth",
            EMsg::CLIENT_UPDATE_MACHINE_AUTH_RESPONSE => "ClientUpdateMachineAuthResponse",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for EMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// Result code carried by handshake results and logon responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EResult(pub u32);

impl EResult {
    pub const INVALID: EResult = EResult(0);
    pub const OK: EResult = EResult(1);
    pub const FAIL: EResult = EResult(2);
    pub const NO_CONNECTION: EResult = EResult(3);
    pub const INVALID_PASSWORD: EResult = EResult(5);
    pub const ACCESS_DENIED: EResult = EResult(15);
    pub const ENCRYPTION_FAILURE: EResult = EResult(68);

    pub fn is_ok(self) -> bool {
        self == EResult::OK
    }
}

impl From<i32> for EResult {
    fn from(raw: i32) -> Self {
        EResult(raw as u32)
    }
}

impl fmt::Display for EResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EResult::OK => write!(f, "OK(1)"),
            EResult::FAIL => write!(f, "Fail(2)"),
            other => write!(f, "EResult({})", other.0),
        }
    }
}

/// Response code for a chat room join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRoomEnterResponse(pub u32);

impl ChatRoomEnterResponse {
    pub const SUCCESS: ChatRoomEnterResponse = ChatRoomEnterResponse(1);
    pub const DOESNT_EXIST: ChatRoomEnterResponse = ChatRoomEnterResponse(2);
    pub const NOT_ALLOWED: ChatRoomEnterResponse = ChatRoomEnterResponse(3);
    pub const FULL: ChatRoomEnterResponse = ChatRoomEnterResponse(4);
    pub const ERROR: ChatRoomEnterResponse = ChatRoomEnterResponse(5);
    pub const BANNED: ChatRoomEnterResponse = ChatRoomEnterResponse(6);
}

/// Discriminator inside a chat member info message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatInfoType(pub u32);

impl ChatInfoType {
    pub const STATE_CHANGE: ChatInfoType = ChatInfoType(1);
    pub const INFO_UPDATE: ChatInfoType = ChatInfoType(2);
    pub const MEMBER_LIMIT_CHANGE: ChatInfoType = ChatInfoType(3);
}

/// Bit flags describing what happened to a chat member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatMemberStateChange(pub u32);

impl ChatMemberStateChange {
    pub const ENTERED: u32 = 0x01;
    pub const LEFT: u32 = 0x02;
    pub const DISCONNECTED: u32 = 0x04;
    pub const KICKED: u32 = 0x08;
    pub const BANNED: u32 = 0x10;

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

/// Opaque account / chat room handle. Only equality and display matter to this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SteamId(pub u64);

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound message after header parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: EMsg,
    /// Correlation token of the request, 0 when absent.
    pub job_id: u64,
    pub payload: Bytes,
}

impl Envelope {
    pub fn new(kind: EMsg, job_id: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            job_id,
            payload: payload.into(),
        }
    }
}

/// A message handed to the transport for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub kind: EMsg,
    /// Job id of the request this message answers, 0 when unsolicited.
    pub job_id: u64,
    pub body: Bytes,
    /// Whether the payload must be protected once the channel is encrypted.
    pub encrypted: bool,
}

impl OutboundMessage {
    /// Frame the body behind the header shape its kind requires.
    pub fn encode(&self, identity: &Identity) -> Bytes {
        crate::core::header::encode(self.kind, self.job_id, identity, &self.body)
    }
}
