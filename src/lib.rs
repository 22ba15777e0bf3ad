//! Host-side control library for channel-attached page printers
//!
//! Speaks the printer's binary command stream over a length-prefixed
//! transport envelope: commands go out as self-describing records, the
//! device answers with acknowledge replies, and a session state machine
//! walks the handshake and capability negotiation before any page data
//! flows.
//!
//! # Architecture
//!
//! - [`cursor`] - bounds-checked big-endian readers and writers
//! - [`text`] - EBCDIC and UCS-2 string codecs
//! - [`codec`] - the three nested record kinds (commands, triplets,
//!   self-defining fields) and acknowledge replies
//! - [`transport`] - the [`transport::Transport`] trait, TCP and mock
//!   implementations, and the envelope parser
//! - [`session`] - reply reassembly, the reader thread, and the
//!   [`Session`] state machine
//! - [`config`] - session settings with TOML persistence
//!
//! Inbound traffic is handled entirely by a background reader thread;
//! callers interact with a [`Session`] and block on an event channel
//! rather than on the socket.
//!
//! # Example
//!
//! ```no_run
//! use ipdslink::{Command, CommandBody, Session, SessionConfig};
//!
//! fn main() -> ipdslink::Result<()> {
//!     let config = SessionConfig {
//!         printer_address: "192.168.1.40:5001".to_string(),
//!         ..Default::default()
//!     };
//!     let mut session = Session::connect(config)?;
//!
//!     session.send(Command::new(CommandBody::BeginPage), false)?;
//!     session.send(
//!         Command::new(CommandBody::EndPage).with_acknowledgment(),
//!         true,
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod session;
pub mod text;
pub mod transport;

pub use codec::{AckData, AckReply, Command, CommandBody, CommandFlags, SelfDefiningField, Triplet};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::{Session, SessionEvent, SessionState};
pub use transport::{MockTransport, TcpTransport, Transport};
