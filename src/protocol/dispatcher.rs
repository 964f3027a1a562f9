//! Single entry point for inbound envelopes.
//!
//! The dispatcher routes each envelope by kind to the handshake, the batch unpacker, or a
//! decoder, then hands the decoded value to the [`EventHandler`]. Kinds without a route are
//! ignored. Batches are expanded through an explicit worklist so sub-envelopes are routed
//! in wire order and nesting depth never grows the call stack.

use crate::config::ClientConfig;
use crate::core::header::Header;
use crate::core::schema::{CMsgClientHeartBeat, CMsgClientUpdateMachineAuthResponse};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::batch::BatchUnpacker;
use crate::protocol::callbacks::{CallbackRegistry, EventHandler};
use crate::protocol::decoders;
use crate::protocol::handshake::{HandshakeCoordinator, HandshakeState};
use crate::protocol::message::{EMsg, Envelope, OutboundMessage};
use crate::protocol::state::{ConnectionState, EncryptionState, SessionKey};
use crate::service::timer::IntervalTimer;
use crate::service::transport::Transport;
use crate::utils::metrics::Metrics;
use bytes::Bytes;
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Routes the envelopes of one connection.
pub struct Dispatcher<H: EventHandler = CallbackRegistry> {
    handler: H,
    state: ConnectionState,
    handshake: HandshakeCoordinator,
    batches: BatchUnpacker,
    transport: Arc<dyn Transport>,
    timer: Arc<dyn IntervalTimer>,
    metrics: Arc<Metrics>,
}

impl<H: EventHandler> Dispatcher<H> {
    /// Build a dispatcher from validated configuration.
    ///
    /// # Errors
    /// Returns `ProtocolError::ConfigError` if the configuration does not validate or the
    /// handshake key cannot be parsed
    pub fn new(
        config: &ClientConfig,
        handler: H,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn IntervalTimer>,
    ) -> Result<Self> {
        config.validate_strict()?;
        Ok(Self::from_parts(
            HandshakeCoordinator::from_config(&config.handshake)?,
            BatchUnpacker::new(&config.batch),
            handler,
            transport,
            timer,
        ))
    }

    pub fn from_parts(
        handshake: HandshakeCoordinator,
        batches: BatchUnpacker,
        handler: H,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn IntervalTimer>,
    ) -> Self {
        Self {
            handler,
            state: ConnectionState::new(),
            handshake,
            batches,
            transport,
            timer,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Shared flag for the transport to decide whether to protect outbound payloads.
    pub fn encryption(&self) -> EncryptionState {
        self.state.encryption.clone()
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Move the negotiated session key to the symmetric layer once encryption is up.
    pub fn take_session_key(&mut self) -> Option<SessionKey> {
        self.handshake.take_session_key()
    }

    /// Parse the header of a raw envelope and dispatch it.
    pub fn handle_message(&mut self, raw: Bytes) -> Result<()> {
        let envelope = self.read_envelope(raw).inspect_err(|e| self.reject(e))?;
        self.dispatch(envelope)
    }

    /// Route one envelope, expanding batches in place.
    ///
    /// The first error aborts this envelope and whatever remains of its batch.
    pub fn dispatch(&mut self, envelope: Envelope) -> Result<()> {
        // Each entry carries the number of batches enclosing it
        let mut pending = vec![(envelope, 0)];
        while let Some((envelope, depth)) = pending.pop() {
            let result = if envelope.kind == EMsg::MULTI {
                self.expand(&envelope, depth, &mut pending)
            } else {
                self.route(envelope)
            };
            result.inspect_err(|e| self.reject(e))?;
        }
        Ok(())
    }

    fn read_envelope(&mut self, raw: Bytes) -> Result<Envelope> {
        let (header, body) = Header::parse(raw)?;
        self.state.observe_identity(header.identity);
        Ok(header.into_envelope(body))
    }

    /// Push a batch's records onto the worklist so the first record is popped next.
    ///
    /// A batch already enclosed by `max_nesting_depth` others is refused before it is
    /// inflated.
    fn expand(
        &mut self,
        batch: &Envelope,
        depth: usize,
        pending: &mut Vec<(Envelope, usize)>,
    ) -> Result<()> {
        if depth >= self.batches.max_nesting_depth() {
            return Err(ProtocolError::ProtocolViolation(format!(
                "{} ({})",
                constants::ERR_BATCH_NESTING,
                self.batches.max_nesting_depth()
            )));
        }

        let unpacked = self.batches.unpack(&batch.payload)?;
        self.metrics
            .batch_expanded(unpacked.records.len(), unpacked.compressed);

        let mut records = Vec::with_capacity(unpacked.records.len());
        for raw in unpacked.records {
            let mut envelope = self.read_envelope(raw)?;
            if envelope.job_id == 0 {
                envelope.job_id = batch.job_id;
            }
            records.push(envelope);
        }

        debug!(
            records = records.len(),
            compressed = unpacked.compressed,
            "Expanding batch"
        );
        pending.extend(records.into_iter().rev().map(|record| (record, depth + 1)));
        Ok(())
    }

    fn route(&mut self, envelope: Envelope) -> Result<()> {
        trace!(kind = %envelope.kind, job_id = envelope.job_id, len = envelope.payload.len(), "Dispatching");
        let payload = &envelope.payload;

        match envelope.kind {
            EMsg::CHANNEL_ENCRYPT_REQUEST => {
                let (transport, metrics) = (&self.transport, &self.metrics);
                self.handshake.handle_request(payload, |response| {
                    transport.send(response)?;
                    metrics.message_sent();
                    Ok(())
                })?;
            }
            EMsg::CHANNEL_ENCRYPT_RESULT => {
                let result =
                    self.handshake
                        .handle_result(payload, &self.state.encryption, &mut self.handler);
                match &result {
                    Ok(()) => self.metrics.handshake_success(),
                    Err(_) => self.metrics.handshake_failed(),
                }
                result?;
            }
            EMsg::CLIENT_LOG_ON_RESPONSE => {
                let logon = decoders::decode_logon_response(payload)?;
                self.handler
                    .on_log_on(logon.result, self.state.identity.steam_id);
                if logon.result.is_ok() {
                    self.schedule_heartbeat(logon.heartbeat_seconds)?;
                }
            }
            EMsg::CLIENT_UPDATE_MACHINE_AUTH => {
                let digest = decoders::decode_machine_auth(payload)?;
                let reply = CMsgClientUpdateMachineAuthResponse {
                    sha_file: Some(digest.to_vec()),
                    ..Default::default()
                };
                self.send(OutboundMessage {
                    kind: EMsg::CLIENT_UPDATE_MACHINE_AUTH_RESPONSE,
                    job_id: envelope.job_id,
                    body: reply.encode_to_vec().into(),
                    encrypted: true,
                })?;
                self.handler.on_sentry(&digest);
            }
            EMsg::CLIENT_PERSONA_STATE => {
                let persona = decoders::decode_persona_state(payload)?;
                self.handler
                    .on_user_info(persona.user, persona.source, &persona.name);
            }
            EMsg::CLIENT_CHAT_MSG => {
                let msg = decoders::decode_chat_msg(payload)?;
                self.handler.on_chat_msg(&msg);
            }
            EMsg::CLIENT_CHAT_ENTER => {
                let enter = decoders::decode_chat_enter(payload)?;
                self.handler.on_chat_enter(&enter);
            }
            EMsg::CLIENT_CHAT_MEMBER_INFO => {
                if let Some(change) = decoders::decode_chat_member_info(payload)? {
                    self.handler.on_chat_state_change(&change);
                }
            }
            other => {
                debug!(kind = %other, "Ignoring unhandled message kind");
                self.metrics.message_unhandled();
                return Ok(());
            }
        }

        self.metrics.message_dispatched();
        Ok(())
    }

    fn schedule_heartbeat(&self, seconds: i32) -> Result<()> {
        if seconds <= 0 {
            return Err(ProtocolError::ProtocolViolation(format!(
                "{} ({seconds})",
                constants::ERR_HEARTBEAT_INTERVAL
            )));
        }

        let transport = Arc::clone(&self.transport);
        let metrics = Arc::clone(&self.metrics);
        let body = Bytes::from(CMsgClientHeartBeat::default().encode_to_vec());

        self.timer.set_interval(
            Duration::from_secs(seconds as u64),
            Box::new(move || {
                let beat = OutboundMessage {
                    kind: EMsg::CLIENT_HEART_BEAT,
                    job_id: 0,
                    body: body.clone(),
                    encrypted: true,
                };
                match transport.send(beat) {
                    Ok(()) => metrics.message_sent(),
                    Err(e) => warn!(error = %e, "Heartbeat send failed"),
                }
            }),
        );

        self.metrics.heartbeat_scheduled();
        debug!(seconds, "Heartbeat scheduled");
        Ok(())
    }

    fn send(&self, message: OutboundMessage) -> Result<()> {
        self.transport.send(message)?;
        self.metrics.message_sent();
        Ok(())
    }

    fn reject(&self, error: &ProtocolError) {
        self.metrics.protocol_error();
        warn!(error = %error, "Dropping message");
    }
}

impl<H: EventHandler + std::fmt::Debug> std::fmt::Debug for Dispatcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler", &self.handler)
            .field("state", &self.state)
            .field("handshake", &self.handshake)
            .field("batches", &self.batches)
            .finish_non_exhaustive()
    }
}
