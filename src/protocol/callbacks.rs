//! Application-facing event hooks.
//!
//! [`EventHandler`] has one method per event, each defaulting to a no-op, so the dispatcher
//! never special-cases a missing listener. [`CallbackRegistry`] is the closure-based
//! implementation: each slot holds zero or one handler.

use crate::protocol::decoders::{ChatEnter, ChatMessage, ChatStateChange, SHA1_LEN};
use crate::protocol::message::{EResult, SteamId};
use std::fmt;
use tracing::trace;

/// Receiver for decoded events.
///
/// Borrowed arguments are only valid for the duration of the call.
pub trait EventHandler {
    /// Channel encryption is established.
    fn on_handshake(&mut self) {}

    fn on_log_on(&mut self, _result: EResult, _steam_id: SteamId) {}

    /// The server pushed a sentry file; `digest` is its SHA-1.
    fn on_sentry(&mut self, _digest: &[u8; SHA1_LEN]) {}

    fn on_user_info(&mut self, _user: SteamId, _source: SteamId, _name: &str) {}

    fn on_chat_msg(&mut self, _msg: &ChatMessage<'_>) {}

    fn on_chat_enter(&mut self, _enter: &ChatEnter<'_>) {}

    fn on_chat_state_change(&mut self, _change: &ChatStateChange) {}
}

/// Handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

/// Event kinds with a slot in [`CallbackRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Handshake,
    LogOn,
    Sentry,
    UserInfo,
    ChatMsg,
    ChatEnter,
    ChatStateChange,
}

type HandshakeFn = dyn FnMut() + Send;
type LogOnFn = dyn FnMut(EResult, SteamId) + Send;
type SentryFn = dyn FnMut(&[u8; SHA1_LEN]) + Send;
type UserInfoFn = dyn FnMut(SteamId, SteamId, &str) + Send;
type ChatMsgFn = dyn for<'a> FnMut(&ChatMessage<'a>) + Send;
type ChatEnterFn = dyn for<'a> FnMut(&ChatEnter<'a>) + Send;
type ChatStateChangeFn = dyn FnMut(&ChatStateChange) + Send;

/// Zero-or-one closure per event kind.
#[derive(Default)]
pub struct CallbackRegistry {
    handshake: Option<Box<HandshakeFn>>,
    log_on: Option<Box<LogOnFn>>,
    sentry: Option<Box<SentryFn>>,
    user_info: Option<Box<UserInfoFn>>,
    chat_msg: Option<Box<ChatMsgFn>>,
    chat_enter: Option<Box<ChatEnterFn>>,
    chat_state_change: Option<Box<ChatStateChangeFn>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handshake(&mut self, f: impl FnMut() + Send + 'static) -> &mut Self {
        self.handshake = Some(Box::new(f));
        self
    }

    pub fn set_log_on(&mut self, f: impl FnMut(EResult, SteamId) + Send + 'static) -> &mut Self {
        self.log_on = Some(Box::new(f));
        self
    }

    pub fn set_sentry(&mut self, f: impl FnMut(&[u8; SHA1_LEN]) + Send + 'static) -> &mut Self {
        self.sentry = Some(Box::new(f));
        self
    }

    pub fn set_user_info(
        &mut self,
        f: impl FnMut(SteamId, SteamId, &str) + Send + 'static,
    ) -> &mut Self {
        self.user_info = Some(Box::new(f));
        self
    }

    pub fn set_chat_msg(
        &mut self,
        f: impl for<'a> FnMut(&ChatMessage<'a>) + Send + 'static,
    ) -> &mut Self {
        self.chat_msg = Some(Box::new(f));
        self
    }

    pub fn set_chat_enter(
        &mut self,
        f: impl for<'a> FnMut(&ChatEnter<'a>) + Send + 'static,
    ) -> &mut Self {
        self.chat_enter = Some(Box::new(f));
        self
    }

    pub fn set_chat_state_change(
        &mut self,
        f: impl FnMut(&ChatStateChange) + Send + 'static,
    ) -> &mut Self {
        self.chat_state_change = Some(Box::new(f));
        self
    }

    /// Remove the handler for `kind`, if any.
    pub fn clear(&mut self, kind: EventKind) {
        match kind {
            EventKind::Handshake => self.handshake = None,
            EventKind::LogOn => self.log_on = None,
            EventKind::Sentry => self.sentry = None,
            EventKind::UserInfo => self.user_info = None,
            EventKind::ChatMsg => self.chat_msg = None,
            EventKind::ChatEnter => self.chat_enter = None,
            EventKind::ChatStateChange => self.chat_state_change = None,
        }
    }

    pub fn is_set(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Handshake => self.handshake.is_some(),
            EventKind::LogOn => self.log_on.is_some(),
            EventKind::Sentry => self.sentry.is_some(),
            EventKind::UserInfo => self.user_info.is_some(),
            EventKind::ChatMsg => self.chat_msg.is_some(),
            EventKind::ChatEnter => self.chat_enter.is_some(),
            EventKind::ChatStateChange => self.chat_state_change.is_some(),
        }
    }
}

fn no_listener(kind: EventKind) {
    trace!(event = ?kind, "No listener registered, event dropped");
}

impl EventHandler for CallbackRegistry {
    fn on_handshake(&mut self) {
        match self.handshake.as_mut() {
            Some(f) => f(),
            None => no_listener(EventKind::Handshake),
        }
    }

    fn on_log_on(&mut self, result: EResult, steam_id: SteamId) {
        match self.log_on.as_mut() {
            Some(f) => f(result, steam_id),
            None => no_listener(EventKind::LogOn),
        }
    }

    fn on_sentry(&mut self, digest: &[u8; SHA1_LEN]) {
        match self.sentry.as_mut() {
            Some(f) => f(digest),
            None => no_listener(EventKind::Sentry),
        }
    }

    fn on_user_info(&mut self, user: SteamId, source: SteamId, name: &str) {
        match self.user_info.as_mut() {
            Some(f) => f(user, source, name),
            None => no_listener(EventKind::UserInfo),
        }
    }

    fn on_chat_msg(&mut self, msg: &ChatMessage<'_>) {
        match self.chat_msg.as_mut() {
            Some(f) => f(msg),
            None => no_listener(EventKind::ChatMsg),
        }
    }

    fn on_chat_enter(&mut self, enter: &ChatEnter<'_>) {
        match self.chat_enter.as_mut() {
            Some(f) => f(enter),
            None => no_listener(EventKind::ChatEnter),
        }
    }

    fn on_chat_state_change(&mut self, change: &ChatStateChange) {
        match self.chat_state_change.as_mut() {
            Some(f) => f(change),
            None => no_listener(EventKind::ChatStateChange),
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("handshake", &self.handshake.is_some())
            .field("log_on", &self.log_on.is_some())
            .field("sentry", &self.sentry.is_some())
            .field("user_info", &self.user_info.is_some())
            .field("chat_msg", &self.chat_msg.is_some())
            .field("chat_enter", &self.chat_enter.is_some())
            .field("chat_state_change", &self.chat_state_change.is_some())
            .finish()
    }
}
