//! Reassembly of multi-frame acknowledge replies
//!
//! A reply larger than one frame arrives as a series of acknowledge frames
//! with the continuation flag set, each carrying a 2-byte sequence counter
//! at the front of its payload, followed by a closing frame with the flag
//! clear. The assembler concatenates the payloads (counters stripped) under
//! the first frame's header and produces one logical reply whose length
//! field covers the whole concatenation and whose continuation flag is
//! clear.

use crate::codec::{Command, CommandFlags, CMD_ACKNOWLEDGE_REPLY, FLAG_CONTINUE};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Accumulates continuation frames into one logical acknowledge reply
///
/// Any parse failure resets the accumulator: a desynchronized reply series
/// is not recoverable frame-by-frame.
pub struct ReplyAssembler {
    buf: ByteWriter,
    in_progress: bool,
}

/// Parsed frame header fields needed for reassembly
struct FrameHead {
    flags: CommandFlags,
    correlation_id: Option<u16>,
    /// Offset of the first payload byte (after header and counter)
    payload_start: usize,
}

impl ReplyAssembler {
    pub fn new() -> Self {
        Self {
            buf: ByteWriter::new(),
            in_progress: false,
        }
    }

    /// Whether a reply series is currently open
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    fn reset(&mut self) {
        self.buf = ByteWriter::new();
        self.in_progress = false;
    }

    /// Validate the frame header and locate the payload
    ///
    /// The sequence counter is stripped from any frame whose continuation
    /// flag is set; the closing frame carries none.
    fn parse_head(&mut self, frame: &[u8]) -> Result<FrameHead> {
        let mut r = ByteReader::new(frame);
        let declared = match r.read_u16() {
            Ok(d) => d as usize,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        if declared != frame.len() {
            self.reset();
            return Err(Error::InconsistentLength {
                declared,
                actual: frame.len(),
            });
        }
        let parse = || -> Result<FrameHead> {
            let mut r = ByteReader::new(frame);
            r.skip(2)?;
            let id = r.read_u16()?;
            if id != CMD_ACKNOWLEDGE_REPLY {
                return Err(Error::ProtocolViolation(format!(
                    "command 0x{:04X} in the middle of a reply series",
                    id
                )));
            }
            let flags = CommandFlags(r.read_u8()?);
            let correlation_id = if flags.has_correlation_id() {
                Some(r.read_u16()?)
            } else {
                None
            };
            if flags.continuation_requested() {
                r.read_u16()?; // sequence counter
            }
            Ok(FrameHead {
                flags,
                correlation_id,
                payload_start: r.position(),
            })
        };
        match parse() {
            Ok(head) => Ok(head),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Seed the accumulator with the first frame's header, continuation
    /// flag already cleared
    fn seed(&mut self, head: &FrameHead) {
        self.buf.mark_u16();
        self.buf.write_u16(CMD_ACKNOWLEDGE_REPLY);
        let mut flags = head.flags;
        flags.set(FLAG_CONTINUE, false);
        self.buf.write_u8(flags.0);
        if let Some(cid) = head.correlation_id {
            self.buf.write_u16(cid);
        }
        self.in_progress = true;
    }

    /// Absorb one continuation frame (continuation flag set)
    pub fn push(&mut self, frame: &[u8]) -> Result<()> {
        let head = self.parse_head(frame)?;
        if !self.in_progress {
            self.seed(&head);
        }
        self.buf.write_bytes(&frame[head.payload_start..]);
        Ok(())
    }

    /// Absorb the closing frame and produce the logical reply
    ///
    /// With no series open the frame is decoded on its own.
    pub fn finish(&mut self, frame: &[u8]) -> Result<Command> {
        if !self.in_progress {
            // Still validate through parse_head so a bad length resets
            // nothing but reports consistently.
            self.parse_head(frame)?;
            return Command::decode(frame);
        }
        let head = self.parse_head(frame)?;
        self.buf.write_bytes(&frame[head.payload_start..]);

        let total = self.buf.len();
        if total > u16::MAX as usize {
            self.reset();
            return Err(Error::ProtocolViolation(format!(
                "reassembled reply of {} bytes exceeds the 2-byte length field",
                total
            )));
        }
        self.buf.patch_u16(0, total as u16);
        let bytes = std::mem::replace(&mut self.buf, ByteWriter::new()).into_bytes();
        self.in_progress = false;
        Command::decode(&bytes)
    }
}

impl Default for ReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}
