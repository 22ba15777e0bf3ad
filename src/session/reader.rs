//! Reader thread for inbound envelopes
//!
//! One background thread owns all inbound parsing: it polls the shared
//! transport for envelopes, routes protocol data through the reply
//! assembler, and forwards finished replies and session markers over a
//! channel. Continuation frames are answered synchronously from this
//! thread so the device can release the next frame without waiting on
//! the caller.
//!
//! The transport lock is held only for the poll or the continuation
//! request, never across the sleep, so callers can interleave writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::codec::{Command, CommandBody};
use crate::error::Error;
use crate::session::assembler::ReplyAssembler;
use crate::transport::{
    write_envelope, EnvelopeReader, Transport, OPCODE_PROTOCOL_DATA,
};

/// Flags byte offset within a command frame
const FLAGS_OFFSET: usize = 4;
/// Continuation flag bit within the flags byte
const CONTINUE_BIT: u8 = crate::codec::FLAG_CONTINUE;

/// Events delivered by the reader thread
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A complete logical acknowledge reply
    Reply(Command),
    /// A non-protocol envelope (handshake markers)
    Marker { opcode: u32, payload: Vec<u8> },
    /// An inbound parse failure; frame-level errors leave the stream
    /// running, envelope-level errors are followed by `Closed`
    Error(String),
    /// End-of-stream or an unrecoverable envelope stream; the thread
    /// has exited
    Closed,
}

/// Reader thread body
///
/// Exits when `shutdown` is set, the transport closes, the envelope
/// stream becomes unrecoverable, or the event receiver is dropped.
pub fn reader_loop(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    events: Sender<SessionEvent>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    let mut envelopes = EnvelopeReader::new();
    let mut assembler = ReplyAssembler::new();

    debug!("Reader thread started");
    while !shutdown.load(Ordering::Relaxed) {
        // Lock, poll, unlock, then sleep without the lock.
        let polled = {
            let mut t = transport.lock();
            envelopes.poll(t.as_mut())
        };

        let envelope = match polled {
            Ok(Some(env)) => env,
            Ok(None) => {
                std::thread::sleep(poll_interval);
                continue;
            }
            Err(Error::ConnectionClosed) => {
                debug!("Transport closed, reader thread exiting");
                let _ = events.send(SessionEvent::Closed);
                return;
            }
            // A bad envelope length leaves no way to find the next
            // envelope boundary; the stream is unrecoverable.
            Err(e) => {
                warn!("Inbound envelope stream unrecoverable: {}", e);
                let _ = events.send(SessionEvent::Error(e.to_string()));
                let _ = events.send(SessionEvent::Closed);
                return;
            }
        };

        let event = if envelope.opcode == OPCODE_PROTOCOL_DATA {
            match handle_frame(&transport, &mut assembler, &envelope.payload) {
                Ok(Some(reply)) => SessionEvent::Reply(reply),
                Ok(None) => continue, // mid-series, nothing to deliver yet
                Err(e) => {
                    warn!("Inbound frame error: {}", e);
                    SessionEvent::Error(e.to_string())
                }
            }
        } else {
            trace!("Marker envelope, opcode 0x{:08X}", envelope.opcode);
            SessionEvent::Marker {
                opcode: envelope.opcode,
                payload: envelope.payload,
            }
        };

        if events.send(event).is_err() {
            debug!("Event receiver dropped, reader thread exiting");
            return;
        }
    }
    debug!("Reader thread shut down");
}

/// Route one protocol frame through the assembler
///
/// A frame with the continuation flag set is absorbed and acknowledged
/// with a continuation request; the closing frame yields the reply.
fn handle_frame(
    transport: &Mutex<Box<dyn Transport>>,
    assembler: &mut ReplyAssembler,
    frame: &[u8],
) -> crate::error::Result<Option<Command>> {
    if frame.len() <= FLAGS_OFFSET {
        return Err(Error::Truncated {
            needed: FLAGS_OFFSET + 1,
            available: frame.len(),
        });
    }

    if frame[FLAGS_OFFSET] & CONTINUE_BIT != 0 {
        assembler.push(frame)?;
        request_continuation(transport)?;
        return Ok(None);
    }

    assembler.finish(frame).map(Some)
}

/// Ask the device for the next frame of the open reply series
fn request_continuation(transport: &Mutex<Box<dyn Transport>>) -> crate::error::Result<()> {
    trace!("Requesting reply continuation");
    let request = Command::new(CommandBody::NoOperation { data: vec![] })
        .with_acknowledgment()
        .with_long_reply()
        .with_continuation()
        .encode()?;
    let mut t = transport.lock();
    write_envelope(t.as_mut(), OPCODE_PROTOCOL_DATA, &request)
}
