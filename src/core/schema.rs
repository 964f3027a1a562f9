//! Protobuf wire contracts used by the dispatch core.
//!
//! Only the fields this core reads or writes are declared; prost skips unknown tags on
//! decode, so the full upstream schemas stay compatible.

use prost::Message;

/// Header attached to every protobuf-flagged envelope.
#[derive(Clone, PartialEq, Message)]
pub struct CMsgProtoBufHeader {
    #[prost(fixed64, optional, tag = "1")]
    pub steamid: Option<u64>,
    #[prost(int32, optional, tag = "2")]
    pub client_sessionid: Option<i32>,
    #[prost(fixed64, optional, tag = "10")]
    pub jobid_source: Option<u64>,
    #[prost(fixed64, optional, tag = "11")]
    pub jobid_target: Option<u64>,
    #[prost(string, optional, tag = "12")]
    pub target_job_name: Option<String>,
    #[prost(int32, optional, tag = "13")]
    pub eresult: Option<i32>,
}

/// Batch of sub-envelopes, optionally zip-compressed.
#[derive(Clone, PartialEq, Message)]
pub struct CMsgMulti {
    #[prost(uint32, optional, tag = "1")]
    pub size_unzipped: Option<u32>,
    #[prost(bytes = "bytes", optional, tag = "2")]
    pub message_body: Option<bytes::Bytes>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CMsgClientLogonResponse {
    #[prost(int32, optional, tag = "1")]
    pub eresult: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub out_of_game_heartbeat_seconds: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub in_game_heartbeat_seconds: Option<i32>,
    #[prost(fixed64, optional, tag = "20")]
    pub client_supplied_steamid: Option<u64>,
}

/// Empty keep-alive body.
#[derive(Clone, PartialEq, Message)]
pub struct CMsgClientHeartBeat {}

#[derive(Clone, PartialEq, Message)]
pub struct CMsgClientUpdateMachineAuth {
    #[prost(string, optional, tag = "1")]
    pub filename: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub offset: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub cubtowrite: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub bytes: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CMsgClientUpdateMachineAuthResponse {
    #[prost(string, optional, tag = "1")]
    pub filename: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub eresult: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub filesize: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub sha_file: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CMsgClientPersonaState {
    #[prost(uint32, optional, tag = "1")]
    pub status_flags: Option<u32>,
    #[prost(message, repeated, tag = "2")]
    pub friends: Vec<PersonaFriend>,
}

/// `CMsgClientPersonaState.Friend`
#[derive(Clone, PartialEq, Message)]
pub struct PersonaFriend {
    #[prost(fixed64, optional, tag = "1")]
    pub friendid: Option<u64>,
    #[prost(uint32, optional, tag = "2")]
    pub persona_state: Option<u32>,
    #[prost(string, optional, tag = "15")]
    pub player_name: Option<String>,
    #[prost(fixed64, optional, tag = "25")]
    pub steamid_source: Option<u64>,
}
