//! Acknowledge reply payloads
//!
//! An acknowledge reply is a command (id X'D6FF') whose payload is one
//! ack-type byte followed by type-specific data. A negative acknowledgment
//! is a valid protocol outcome, not a framing failure: NACKs decode into
//! sense data values and are surfaced to the caller as data. Only genuine
//! framing errors use the error channel.

use super::field::{CommandSetLevel, SelfDefiningField};
use super::{
    ACK_TYPE_CHARACTERISTICS, ACK_TYPE_CHARACTERISTICS_LONG, ACK_TYPE_NEGATIVE_BIT,
    ACK_TYPE_POSITIVE, ACK_TYPE_STM_REPLY, EXCEPTION_NORMAL_RESET,
};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::Result;

/// A decoded acknowledge reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckReply {
    /// Raw ack-type byte (high bit set means negative)
    pub ack_type: u8,
    pub data: AckData,
}

/// Type-specific acknowledge data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckData {
    /// Positive acknowledgment; any trailing bytes kept verbatim
    Positive(Vec<u8>),
    /// Sense Type and Model reply
    Stm(StmReply),
    /// Printer characteristics batch (short or long type code)
    Characteristics(Vec<SelfDefiningField>),
    /// Negative acknowledgment sense data
    Sense(SenseData),
    /// Unrecognized positive ack type, preserved verbatim
    Opaque(Vec<u8>),
}

/// Sense Type and Model reply data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StmReply {
    pub device_type: u16,
    pub model: u8,
    /// Supported command sets with their levels, repeated to end of payload
    pub command_sets: Vec<CommandSetLevel>,
}

/// Sense data carried by a negative acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseData {
    /// Machine-readable exception id
    pub exception_id: u16,
    pub action_code: u8,
    /// Device-specific detail bytes
    pub detail: Vec<u8>,
}

impl SenseData {
    /// Whether this NACK reports the device's normal power-on/reset
    pub fn is_normal_reset(&self) -> bool {
        self.exception_id == EXCEPTION_NORMAL_RESET
    }
}

impl AckReply {
    /// Whether this reply is a negative acknowledgment
    pub fn is_negative(&self) -> bool {
        self.ack_type & ACK_TYPE_NEGATIVE_BIT != 0
    }

    /// Sense data, if this is a NACK
    pub fn sense(&self) -> Option<&SenseData> {
        match &self.data {
            AckData::Sense(s) => Some(s),
            _ => None,
        }
    }

    /// Decode an ack payload (the command payload after flags/correlation id)
    pub fn decode(r: &mut ByteReader<'_>) -> Result<AckReply> {
        let ack_type = r.read_u8()?;
        let data = if ack_type & ACK_TYPE_NEGATIVE_BIT != 0 {
            AckData::Sense(SenseData {
                exception_id: r.read_u16()?,
                action_code: r.read_u8()?,
                detail: r.read_remaining().to_vec(),
            })
        } else {
            match ack_type {
                ACK_TYPE_POSITIVE => AckData::Positive(r.read_remaining().to_vec()),
                ACK_TYPE_STM_REPLY => {
                    let device_type = r.read_u16()?;
                    let model = r.read_u8()?;
                    let mut command_sets = Vec::new();
                    while r.remaining() > 0 {
                        command_sets.push(CommandSetLevel {
                            set_id: r.read_u16()?,
                            level: r.read_u16()?,
                        });
                    }
                    AckData::Stm(StmReply {
                        device_type,
                        model,
                        command_sets,
                    })
                }
                ACK_TYPE_CHARACTERISTICS | ACK_TYPE_CHARACTERISTICS_LONG => {
                    AckData::Characteristics(SelfDefiningField::read_sequence(r)?)
                }
                _ => AckData::Opaque(r.read_remaining().to_vec()),
            }
        };
        Ok(AckReply { ack_type, data })
    }

    /// Append the ack payload bytes to the writer
    pub fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        w.write_u8(self.ack_type);
        match &self.data {
            AckData::Positive(bytes) | AckData::Opaque(bytes) => w.write_bytes(bytes),
            AckData::Stm(stm) => {
                w.write_u16(stm.device_type);
                w.write_u8(stm.model);
                for set in &stm.command_sets {
                    w.write_u16(set.set_id);
                    w.write_u16(set.level);
                }
            }
            AckData::Characteristics(fields) => {
                for f in fields {
                    f.encode(w)?;
                }
            }
            AckData::Sense(sense) => {
                w.write_u16(sense.exception_id);
                w.write_u8(sense.action_code);
                w.write_bytes(&sense.detail);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::MediaSource;

    fn roundtrip(ack: &AckReply) -> AckReply {
        let mut w = ByteWriter::new();
        ack.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let decoded = AckReply::decode(&mut r).unwrap();
        assert_eq!(r.remaining(), 0);
        decoded
    }

    #[test]
    fn test_positive_ack_roundtrip() {
        let ack = AckReply {
            ack_type: ACK_TYPE_POSITIVE,
            data: AckData::Positive(vec![]),
        };
        assert_eq!(roundtrip(&ack), ack);
        assert!(!ack.is_negative());
    }

    #[test]
    fn test_stm_reply_roundtrip() {
        let ack = AckReply {
            ack_type: ACK_TYPE_STM_REPLY,
            data: AckData::Stm(StmReply {
                device_type: 0x3812,
                model: 0x01,
                command_sets: vec![
                    CommandSetLevel {
                        set_id: 0xC0DE,
                        level: 1,
                    },
                    CommandSetLevel {
                        set_id: 0xC0DF,
                        level: 3,
                    },
                ],
            }),
        };
        assert_eq!(roundtrip(&ack), ack);
    }

    #[test]
    fn test_characteristics_short_and_long_forms() {
        let fields = vec![SelfDefiningField::MediaSources {
            sources: vec![MediaSource {
                source_id: 1,
                flags: 0,
            }],
        }];
        for ack_type in [ACK_TYPE_CHARACTERISTICS, ACK_TYPE_CHARACTERISTICS_LONG] {
            let ack = AckReply {
                ack_type,
                data: AckData::Characteristics(fields.clone()),
            };
            assert_eq!(roundtrip(&ack), ack);
        }
    }

    #[test]
    fn test_nack_is_data_not_error() {
        let ack = AckReply {
            ack_type: 0x82,
            data: AckData::Sense(SenseData {
                exception_id: 0x0C15,
                action_code: 0x01,
                detail: vec![0x00, 0x00, 0x7F],
            }),
        };
        let decoded = roundtrip(&ack);
        assert!(decoded.is_negative());
        assert!(!decoded.sense().unwrap().is_normal_reset());
    }

    #[test]
    fn test_normal_reset_detection() {
        let sense = SenseData {
            exception_id: EXCEPTION_NORMAL_RESET,
            action_code: 0x00,
            detail: vec![],
        };
        assert!(sense.is_normal_reset());
    }

    #[test]
    fn test_unknown_positive_type_preserved() {
        let bytes = [0x17, 0xDE, 0xAD];
        let mut r = ByteReader::new(&bytes);
        let ack = AckReply::decode(&mut r).unwrap();
        assert_eq!(ack.data, AckData::Opaque(vec![0xDE, 0xAD]));
        let mut w = ByteWriter::new();
        ack.encode(&mut w).unwrap();
        assert_eq!(w.into_bytes(), bytes);
    }
}
