//! Session lifecycle and the host-side state machine
//!
//! A session walks a fixed ladder before accepting work:
//!
//! ```text
//! Disconnected -> HandshakeStep1 -> HandshakeStep2 -> Negotiating -> Ready
//! ```
//!
//! The two handshake steps exchange start/sync markers; negotiation then
//! queries the device's type (Sense Type and Model) and its capability
//! batch (Obtain Printer Characteristics). A device fresh from power-on
//! answers the first query with a normal-reset NACK, in which case the
//! session sends a continue marker and retries the query exactly once.
//!
//! All inbound traffic flows through a dedicated reader thread (see
//! [`reader`]); callers block on an event channel, never on the socket.

pub mod assembler;
pub mod reader;

pub use assembler::ReplyAssembler;
pub use reader::{reader_loop, SessionEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::codec::{
    AckData, AckReply, Command, CommandBody, HomeStateOrder, SelfDefiningField, StmReply,
};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::transport::{
    write_envelope, TcpTransport, Transport, OPCODE_CONTINUE, OPCODE_PROTOCOL_DATA,
    OPCODE_SESSION_START, OPCODE_SESSION_SYNC,
};

/// Host-side session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    HandshakeStep1,
    HandshakeStep2,
    Negotiating,
    Ready,
    AwaitingReply,
}

/// One established printer session
///
/// Owns the reader thread; dropping the session shuts it down.
pub struct Session {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    events: Receiver<SessionEvent>,
    shutdown: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
    config: SessionConfig,
    state: SessionState,
    next_correlation: u16,
    device: Option<StmReply>,
    characteristics: Vec<SelfDefiningField>,
}

impl Session {
    /// Connect over TCP and establish the session
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let transport = TcpTransport::connect(
            &config.printer_address,
            Duration::from_millis(config.poll_interval_ms),
        )?;
        Self::with_transport(Box::new(transport), config)
    }

    /// Establish a session over an already-open transport
    pub fn with_transport(transport: Box<dyn Transport>, config: SessionConfig) -> Result<Self> {
        let transport = Arc::new(Mutex::new(transport));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded();

        let reader_handle = {
            let transport = Arc::clone(&transport);
            let shutdown = Arc::clone(&shutdown);
            let poll = Duration::from_millis(config.poll_interval_ms);
            std::thread::Builder::new()
                .name("ipds-reader".to_string())
                .spawn(move || reader_loop(transport, tx, shutdown, poll))?
        };

        let mut session = Self {
            transport,
            events: rx,
            shutdown,
            reader_handle: Some(reader_handle),
            config,
            state: SessionState::Disconnected,
            next_correlation: 1,
            device: None,
            characteristics: Vec::new(),
        };

        if let Err(e) = session.establish() {
            session.close();
            return Err(e);
        }
        Ok(session)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Device identity from negotiation
    pub fn device(&self) -> Option<&StmReply> {
        self.device.as_ref()
    }

    /// Capability batch from negotiation
    pub fn characteristics(&self) -> &[SelfDefiningField] {
        &self.characteristics
    }

    // ========================================================================
    // Establishment
    // ========================================================================

    fn establish(&mut self) -> Result<()> {
        self.handshake()?;
        self.negotiate()?;
        self.state = SessionState::Ready;
        info!(
            "Session ready: device type 0x{:04X}, {} characteristic fields",
            self.device.as_ref().map(|d| d.device_type).unwrap_or(0),
            self.characteristics.len()
        );
        Ok(())
    }

    /// Exchange the start and sync markers
    fn handshake(&mut self) -> Result<()> {
        self.state = SessionState::HandshakeStep1;
        self.write_marker(OPCODE_SESSION_START)?;
        self.await_marker(OPCODE_SESSION_START)?;

        self.state = SessionState::HandshakeStep2;
        self.write_marker(OPCODE_SESSION_SYNC)?;
        self.await_marker(OPCODE_SESSION_SYNC)?;
        Ok(())
    }

    /// Query device type and capabilities
    fn negotiate(&mut self) -> Result<()> {
        self.state = SessionState::Negotiating;

        let mut ack = self.transact(self.stm_query())?;
        let reset = ack.sense().is_some_and(|s| s.is_normal_reset());
        if reset && self.config.retry_on_device_reset {
            // Fresh power-on; acknowledge the reset and retry once.
            debug!("Device reports normal reset, retrying capability query");
            self.write_marker(OPCODE_CONTINUE)?;
            ack = self.transact(self.stm_query())?;
        }
        match ack.data {
            AckData::Stm(stm) => {
                debug!(
                    "Device type 0x{:04X} model 0x{:02X}, {} command sets",
                    stm.device_type,
                    stm.model,
                    stm.command_sets.len()
                );
                self.device = Some(stm);
            }
            other => {
                return Err(Error::HandshakeFailed(format!(
                    "capability query answered with {:?}",
                    other
                )))
            }
        }

        let order = Command::new(CommandBody::ExecuteOrderHomeState {
            order: HomeStateOrder::ObtainPrinterCharacteristics,
        })
        .with_acknowledgment()
        .with_long_reply();
        let ack = self.transact(order)?;
        match ack.data {
            AckData::Characteristics(fields) => {
                self.characteristics = fields;
                Ok(())
            }
            other => Err(Error::HandshakeFailed(format!(
                "characteristics query answered with {:?}",
                other
            ))),
        }
    }

    fn stm_query(&self) -> Command {
        Command::new(CommandBody::SenseTypeAndModel)
            .with_acknowledgment()
            .with_long_reply()
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send a command; await its acknowledge reply when `expect_reply`
    ///
    /// A negative acknowledgment is returned as a reply, not an error.
    pub fn send(&mut self, command: Command, expect_reply: bool) -> Result<Option<Command>> {
        if self.state != SessionState::Ready {
            return Err(Error::ProtocolViolation(format!(
                "cannot send in state {:?}",
                self.state
            )));
        }
        if expect_reply {
            let reply = self.submit_and_await(command)?;
            Ok(Some(reply))
        } else {
            self.submit(command)?;
            Ok(None)
        }
    }

    /// Send a command expecting an acknowledge reply, return the ack data
    fn transact(&mut self, command: Command) -> Result<AckReply> {
        let reply = self.submit_and_await(command)?;
        match reply.body {
            CommandBody::Acknowledge(ack) => Ok(ack),
            other => Err(Error::ProtocolViolation(format!(
                "expected an acknowledge reply, got {:?}",
                other
            ))),
        }
    }

    fn submit(&mut self, command: Command) -> Result<()> {
        let bytes = command.encode()?;
        let mut t = self.transport.lock();
        write_envelope(t.as_mut(), OPCODE_PROTOCOL_DATA, &bytes)
    }

    fn submit_and_await(&mut self, mut command: Command) -> Result<Command> {
        if command.correlation_id.is_none() {
            command.correlation_id = Some(self.next_correlation);
            self.next_correlation = self.next_correlation.wrapping_add(1).max(1);
        }
        let expected_cid = command.correlation_id;
        let previous = self.state;
        self.submit(command)?;
        self.state = SessionState::AwaitingReply;

        let deadline = Instant::now() + Duration::from_millis(self.config.reply_timeout_ms);
        loop {
            match self.await_event(deadline) {
                Ok(SessionEvent::Reply(reply)) => {
                    if reply.correlation_id != expected_cid {
                        warn!(
                            "Discarding reply with stale correlation id {:?}",
                            reply.correlation_id
                        );
                        continue;
                    }
                    self.state = previous;
                    return Ok(reply);
                }
                Ok(SessionEvent::Marker { opcode, .. }) => {
                    warn!("Unexpected marker 0x{:08X} while awaiting a reply", opcode);
                }
                Ok(SessionEvent::Error(msg)) => {
                    self.state = previous;
                    return Err(Error::ProtocolViolation(msg));
                }
                Ok(SessionEvent::Closed) => {
                    self.state = SessionState::Disconnected;
                    return Err(Error::ConnectionClosed);
                }
                Err(e) => {
                    self.state = previous;
                    return Err(e);
                }
            }
        }
    }

    // ========================================================================
    // Event plumbing
    // ========================================================================

    fn write_marker(&self, opcode: u32) -> Result<()> {
        let mut t = self.transport.lock();
        write_envelope(t.as_mut(), opcode, &[])
    }

    fn await_marker(&mut self, opcode: u32) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(self.config.reply_timeout_ms);
        loop {
            match self.await_event(deadline)? {
                SessionEvent::Marker { opcode: got, .. } if got == opcode => return Ok(()),
                SessionEvent::Marker { opcode: got, .. } => {
                    return Err(Error::HandshakeFailed(format!(
                        "expected marker 0x{:08X}, device sent 0x{:08X}",
                        opcode, got
                    )));
                }
                SessionEvent::Reply(_) => {
                    warn!("Discarding reply received during handshake");
                }
                SessionEvent::Error(msg) => return Err(Error::ProtocolViolation(msg)),
                SessionEvent::Closed => {
                    self.state = SessionState::Disconnected;
                    return Err(Error::ConnectionClosed);
                }
            }
        }
    }

    fn await_event(&self, deadline: Instant) -> Result<SessionEvent> {
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::ReplyTimeout);
        }
        match self.events.recv_timeout(deadline - now) {
            Ok(event) => Ok(event),
            Err(RecvTimeoutError::Timeout) => Err(Error::ReplyTimeout),
            Err(RecvTimeoutError::Disconnected) => Err(Error::ConnectionClosed),
        }
    }

    /// Stop the reader thread and mark the session disconnected
    pub fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
        self.state = SessionState::Disconnected;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
