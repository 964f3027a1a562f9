//! Per-kind message decoders.
//!
//! Each decoder validates the envelope against its layout before reading any field and
//! yields either an owned value or a view borrowing the envelope bytes. Views live only as
//! long as the payload they were parsed from, which in practice is one callback
//! invocation.

use crate::core::reader::WireReader;
use crate::core::schema::{
    CMsgClientLogonResponse, CMsgClientPersonaState, CMsgClientUpdateMachineAuth,
};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::{
    ChatInfoType, ChatMemberStateChange, ChatRoomEnterResponse, EResult, SteamId,
};
use prost::Message;
use sha1::{Digest, Sha1};
use std::borrow::Cow;

/// Size of a SHA-1 digest.
pub const SHA1_LEN: usize = 20;

/// Fixed size of one member record inside chat enter and chat member info messages.
pub const CHAT_MEMBER_LEN: usize = 16;

const CHAT_MSG_HEADER_LEN: usize = 20;
const CHAT_ENTER_HEADER_LEN: usize = 41;
const CHAT_MEMBER_INFO_HEADER_LEN: usize = 12;
const STATE_CHANGE_LEN: usize = 8 + 4 + 8 + CHAT_MEMBER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogonResponse {
    pub result: EResult,
    pub heartbeat_seconds: i32,
}

pub fn decode_logon_response(payload: &[u8]) -> Result<LogonResponse> {
    let msg = CMsgClientLogonResponse::decode(payload)?;
    Ok(LogonResponse {
        // An absent eresult means Fail on this message
        result: msg.eresult.map(EResult::from).unwrap_or(EResult::FAIL),
        heartbeat_seconds: msg.out_of_game_heartbeat_seconds.unwrap_or_default(),
    })
}

/// SHA-1 of the sentry blob carried by a machine auth update.
pub fn decode_machine_auth(payload: &[u8]) -> Result<[u8; SHA1_LEN]> {
    let msg = CMsgClientUpdateMachineAuth::decode(payload)?;
    let blob = msg.bytes.unwrap_or_default();
    Ok(Sha1::digest(&blob).into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaUpdate {
    pub user: SteamId,
    pub source: SteamId,
    pub name: String,
}

/// Persona state is a repeated field on the wire, but the server always sends exactly one
/// friend per message. Any other count is rejected.
pub fn decode_persona_state(payload: &[u8]) -> Result<PersonaUpdate> {
    let msg = CMsgClientPersonaState::decode(payload)?;
    let count = msg.friends.len();
    let friend = match <[_; 1]>::try_from(msg.friends) {
        Ok([friend]) => friend,
        Err(_) => {
            return Err(ProtocolError::ProtocolViolation(format!(
                "{} (found {count})",
                constants::ERR_PERSONA_CARDINALITY
            )))
        }
    };
    Ok(PersonaUpdate {
        user: SteamId(friend.friendid.unwrap_or_default()),
        source: SteamId(friend.steamid_source.unwrap_or_default()),
        name: friend.player_name.unwrap_or_default(),
    })
}

/// Chat room text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage<'a> {
    pub room: SteamId,
    pub chatter: SteamId,
    pub entry_type: u32,
    pub text: Cow<'a, str>,
}

pub fn decode_chat_msg(payload: &[u8]) -> Result<ChatMessage<'_>> {
    let mut reader = WireReader::new("ClientChatMsg", payload);
    reader.require(CHAT_MSG_HEADER_LEN)?;
    let chatter = reader.steam_id()?;
    let room = reader.steam_id()?;
    let entry_type = reader.u32()?;

    // Text ends at the first NUL if there is one, otherwise it runs to the end
    let trailing = reader.rest();
    let end = trailing
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(trailing.len());

    Ok(ChatMessage {
        room,
        chatter,
        entry_type,
        text: String::from_utf8_lossy(&trailing[..end]),
    })
}

/// One fixed-size member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatMember {
    pub steam_id: SteamId,
    pub permissions: u32,
    pub details: u32,
}

impl ChatMember {
    fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            steam_id: reader.steam_id()?,
            permissions: reader.u32()?,
            details: reader.u32()?,
        })
    }
}

/// Borrowed view over a packed member array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatMembers<'a> {
    raw: &'a [u8],
}

impl<'a> ChatMembers<'a> {
    pub fn len(&self) -> usize {
        self.raw.len() / CHAT_MEMBER_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    pub fn get(&self, index: usize) -> Option<ChatMember> {
        let start = index.checked_mul(CHAT_MEMBER_LEN)?;
        let record = self.raw.get(start..start + CHAT_MEMBER_LEN)?;
        ChatMember::read(&mut WireReader::new("ChatMember", record)).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChatMember> + 'a {
        let raw = self.raw;
        raw.chunks_exact(CHAT_MEMBER_LEN)
            .filter_map(|record| ChatMember::read(&mut WireReader::new("ChatMember", record)).ok())
    }
}

/// Response to joining a chat room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEnter<'a> {
    pub room: SteamId,
    pub friend: SteamId,
    pub room_type: u32,
    pub owner: SteamId,
    pub clan: SteamId,
    pub flags: u8,
    pub response: ChatRoomEnterResponse,
    pub name: Cow<'a, str>,
    pub member_count: u32,
    pub members: ChatMembers<'a>,
}

pub fn decode_chat_enter(payload: &[u8]) -> Result<ChatEnter<'_>> {
    let mut reader = WireReader::new("ClientChatEnter", payload);
    reader.require(CHAT_ENTER_HEADER_LEN + 4)?;
    let room = reader.steam_id()?;
    let friend = reader.steam_id()?;
    let room_type = reader.u32()?;
    let owner = reader.steam_id()?;
    let clan = reader.steam_id()?;
    let flags = reader.u8()?;
    let response = ChatRoomEnterResponse(reader.u32()?);
    let member_count = reader.u32()?;
    let name = reader.nul_terminated(constants::ERR_MISSING_NUL)?;

    let members_len = (member_count as usize)
        .checked_mul(CHAT_MEMBER_LEN)
        .ok_or_else(|| {
            ProtocolError::ProtocolViolation(format!("Member count {member_count} overflows"))
        })?;
    let members = reader.bytes(members_len)?;

    Ok(ChatEnter {
        room,
        friend,
        room_type,
        owner,
        clan,
        flags,
        response,
        name: String::from_utf8_lossy(name),
        member_count,
        members: ChatMembers { raw: members },
    })
}

/// A member joined, left, or was acted on by another member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStateChange {
    pub room: SteamId,
    pub acted_on: SteamId,
    pub state_change: ChatMemberStateChange,
    pub acted_by: SteamId,
    pub member: ChatMember,
}

/// Returns `None` for info types other than state change; those are accepted but not
/// surfaced.
pub fn decode_chat_member_info(payload: &[u8]) -> Result<Option<ChatStateChange>> {
    let mut reader = WireReader::new("ClientChatMemberInfo", payload);
    reader.require(CHAT_MEMBER_INFO_HEADER_LEN)?;
    let room = reader.steam_id()?;
    let info_type = ChatInfoType(reader.u32()?);

    if info_type != ChatInfoType::STATE_CHANGE {
        return Ok(None);
    }

    reader.require(STATE_CHANGE_LEN)?;
    Ok(Some(ChatStateChange {
        room,
        acted_on: reader.steam_id()?,
        state_change: ChatMemberStateChange(reader.u32()?),
        acted_by: reader.steam_id()?,
        member: ChatMember::read(&mut reader)?,
    }))
}
