//! Commands - the top-level protocol records
//!
//! A command frame is `u16 length | u16 id | u8 flags | [u16 correlation id
//! if the CID flag is set] | payload`, with the length counting the whole
//! frame including its own header. The top-level decode entry point
//! additionally validates that the supplied buffer length equals the
//! declared length - the primary defense against desynchronized framing.

use super::ack::AckReply;
use super::triplet::Triplet;
use super::{
    CMD_ACKNOWLEDGE_REPLY, CMD_ACTIVATE_RESOURCE, CMD_BEGIN_PAGE, CMD_DEACTIVATE_RESOURCE,
    CMD_END_PAGE, CMD_EXECUTE_ORDER_ANYSTATE, CMD_EXECUTE_ORDER_HOME_STATE,
    CMD_LOAD_FONT_EQUIVALENCE, CMD_LOGICAL_PAGE_DESCRIPTOR, CMD_LOGICAL_PAGE_POSITION,
    CMD_NO_OPERATION, CMD_SENSE_TYPE_AND_MODEL, CMD_SET_HOME_STATE, CMD_WRITE_TEXT, FLAG_ARQ,
    FLAG_CID, FLAG_CONTINUE, FLAG_LONG_REPLY, ORDER_DISCARD_BUFFERED_DATA,
    ORDER_EJECT_TO_FRONT_FACING, ORDER_OBTAIN_PRINTER_CHARACTERISTICS,
    ORDER_REQUEST_RESOURCE_LIST, ORDER_SELECT_INPUT_MEDIA_SOURCE, ORDER_SET_MEDIA_SIZE,
};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Minimum command frame: length(2) + id(2) + flags(1)
const COMMAND_HEADER: usize = 5;

/// Command flag byte
///
/// Kept as the raw byte so reserved bits survive a decode/encode round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFlags(pub u8);

impl CommandFlags {
    pub fn acknowledgment_required(self) -> bool {
        self.0 & FLAG_ARQ != 0
    }

    pub fn has_correlation_id(self) -> bool {
        self.0 & FLAG_CID != 0
    }

    pub fn continuation_requested(self) -> bool {
        self.0 & FLAG_CONTINUE != 0
    }

    pub fn long_reply_accepted(self) -> bool {
        self.0 & FLAG_LONG_REPLY != 0
    }

    pub fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// One protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub flags: CommandFlags,
    pub correlation_id: Option<u16>,
    pub body: CommandBody,
}

/// Command payload variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBody {
    /// X'D603' - no operation; payload bytes are ignored but preserved
    NoOperation { data: Vec<u8> },
    /// X'D6E4' - sense type and model (capability query)
    SenseTypeAndModel,
    /// X'D697' - return the device to home state
    SetHomeState,
    /// X'D6AF' - begin a page
    BeginPage,
    /// X'D6BF' - end the current page
    EndPage,
    /// X'D62D' - text-positioning control sequences, opaque at this layer
    WriteText { data: Vec<u8> },
    /// X'D6CF' - logical page geometry plus trailing triplets
    LogicalPageDescriptor {
        unit_base: u8,
        x_units_per_base: u16,
        y_units_per_base: u16,
        x_extent: u32,
        y_extent: u32,
        triplets: Vec<Triplet>,
    },
    /// X'D66D' - logical page placement on the medium
    LogicalPagePosition { x_offset: u32, y_offset: u32 },
    /// X'D63F' - font equivalence entries, fixed 12-byte records
    LoadFontEquivalence { entries: Vec<FontEquivalence> },
    /// X'D62E' - resource activation entries, each with trailing triplets
    ActivateResource { entries: Vec<ResourceActivation> },
    /// X'D64F' - deactivate one resource
    DeactivateResource { resource_type: u8, local_id: u8 },
    /// X'D633' - execute order, any state
    ExecuteOrderAnystate { order: AnystateOrder },
    /// X'D68F' - execute order, home state only
    ExecuteOrderHomeState { order: HomeStateOrder },
    /// X'D6FF' - acknowledge reply (device to host)
    Acknowledge(AckReply),
    /// Any identifier not in the registry, preserved verbatim
    Opaque { id: u16, data: Vec<u8> },
}

/// One font equivalence entry (12 bytes on the wire)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEquivalence {
    pub local_id: u16,
    /// 8-byte EBCDIC global name
    pub global_name: String,
    pub section: u8,
    pub reserved: u8,
}

/// One resource activation entry
///
/// Wire layout: `u16 entry length (self-inclusive) | u8 resource type |
/// u8 id format | u8 flags | u8 local id | trailing triplets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceActivation {
    pub resource_type: u8,
    pub id_format: u8,
    pub flags: u8,
    pub local_id: u8,
    pub triplets: Vec<Triplet>,
}

/// Orders hosted by Execute Order Anystate (X'D633')
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnystateOrder {
    /// X'F200' - discard all buffered page data
    DiscardBufferedData,
    /// X'F600' - request a resource list
    RequestResourceList { resource_type: u8, id_format: u8 },
    /// Unknown order code, preserved verbatim
    Opaque { code: u16, data: Vec<u8> },
}

/// Orders hosted by Execute Order Home State (X'D68F')
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeStateOrder {
    /// X'F300' - obtain printer characteristics (capability query)
    ObtainPrinterCharacteristics,
    /// X'F400' - eject to front facing
    EjectToFrontFacing,
    /// X'F500' - select input media source
    SelectInputMediaSource { source: u8 },
    /// X'F700' - set media size
    SetMediaSize {
        unit_base: u8,
        units_per_base: u16,
        x_extent: u32,
        y_extent: u32,
    },
    /// Unknown order code, preserved verbatim
    Opaque { code: u16, data: Vec<u8> },
}

impl Command {
    /// Construct an outbound command with clear flags
    pub fn new(body: CommandBody) -> Self {
        Self {
            flags: CommandFlags::default(),
            correlation_id: None,
            body,
        }
    }

    /// Request an acknowledgment for this command
    pub fn with_acknowledgment(mut self) -> Self {
        self.flags.set(FLAG_ARQ, true);
        self
    }

    /// Accept a long reply
    pub fn with_long_reply(mut self) -> Self {
        self.flags.set(FLAG_LONG_REPLY, true);
        self
    }

    /// Request continuation
    pub fn with_continuation(mut self) -> Self {
        self.flags.set(FLAG_CONTINUE, true);
        self
    }

    /// Tag with a correlation id
    pub fn with_correlation_id(mut self, cid: u16) -> Self {
        self.correlation_id = Some(cid);
        self
    }

    /// Identifier for this command
    pub fn id(&self) -> u16 {
        match &self.body {
            CommandBody::NoOperation { .. } => CMD_NO_OPERATION,
            CommandBody::SenseTypeAndModel => CMD_SENSE_TYPE_AND_MODEL,
            CommandBody::SetHomeState => CMD_SET_HOME_STATE,
            CommandBody::BeginPage => CMD_BEGIN_PAGE,
            CommandBody::EndPage => CMD_END_PAGE,
            CommandBody::WriteText { .. } => CMD_WRITE_TEXT,
            CommandBody::LogicalPageDescriptor { .. } => CMD_LOGICAL_PAGE_DESCRIPTOR,
            CommandBody::LogicalPagePosition { .. } => CMD_LOGICAL_PAGE_POSITION,
            CommandBody::LoadFontEquivalence { .. } => CMD_LOAD_FONT_EQUIVALENCE,
            CommandBody::ActivateResource { .. } => CMD_ACTIVATE_RESOURCE,
            CommandBody::DeactivateResource { .. } => CMD_DEACTIVATE_RESOURCE,
            CommandBody::ExecuteOrderAnystate { .. } => CMD_EXECUTE_ORDER_ANYSTATE,
            CommandBody::ExecuteOrderHomeState { .. } => CMD_EXECUTE_ORDER_HOME_STATE,
            CommandBody::Acknowledge(_) => CMD_ACKNOWLEDGE_REPLY,
            CommandBody::Opaque { id, .. } => *id,
        }
    }

    /// Whether this command is an acknowledge reply
    pub fn is_acknowledge(&self) -> bool {
        matches!(self.body, CommandBody::Acknowledge(_))
    }

    /// Decode one command occupying the whole buffer
    ///
    /// Fails with `InconsistentLength` when the declared length disagrees
    /// with the buffer length.
    pub fn decode(buf: &[u8]) -> Result<Command> {
        let mut r = ByteReader::new(buf);
        let declared = r.read_u16()? as usize;
        if declared != buf.len() {
            return Err(Error::InconsistentLength {
                declared,
                actual: buf.len(),
            });
        }
        if declared < COMMAND_HEADER {
            return Err(Error::InconsistentLength {
                declared,
                actual: COMMAND_HEADER,
            });
        }
        let id = r.read_u16()?;
        let flags = CommandFlags(r.read_u8()?);
        let correlation_id = if flags.has_correlation_id() {
            Some(r.read_u16()?)
        } else {
            None
        };
        let body = CommandBody::decode(id, &mut r)?;
        Ok(Command {
            flags,
            correlation_id,
            body,
        })
    }

    /// Encode this command to its wire bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        let mark = w.mark_u16();
        w.write_u16(self.id());
        let mut flags = self.flags;
        flags.set(FLAG_CID, self.correlation_id.is_some());
        w.write_u8(flags.0);
        if let Some(cid) = self.correlation_id {
            w.write_u16(cid);
        }
        self.body.encode(&mut w)?;
        let total = w.len();
        if total > u16::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "command 0x{:04X} frame of {} bytes exceeds the 2-byte length field",
                self.id(),
                total
            )));
        }
        w.patch_u16(mark, total as u16);
        Ok(w.into_bytes())
    }
}

impl CommandBody {
    fn decode(id: u16, r: &mut ByteReader<'_>) -> Result<CommandBody> {
        let body = match id {
            CMD_NO_OPERATION => CommandBody::NoOperation {
                data: r.read_remaining().to_vec(),
            },
            CMD_SENSE_TYPE_AND_MODEL => CommandBody::SenseTypeAndModel,
            CMD_SET_HOME_STATE => CommandBody::SetHomeState,
            CMD_BEGIN_PAGE => CommandBody::BeginPage,
            CMD_END_PAGE => CommandBody::EndPage,
            CMD_WRITE_TEXT => CommandBody::WriteText {
                data: r.read_remaining().to_vec(),
            },
            CMD_LOGICAL_PAGE_DESCRIPTOR => CommandBody::LogicalPageDescriptor {
                unit_base: r.read_u8()?,
                x_units_per_base: r.read_u16()?,
                y_units_per_base: r.read_u16()?,
                x_extent: r.read_u24()?,
                y_extent: r.read_u24()?,
                triplets: Triplet::read_sequence(r)?,
            },
            CMD_LOGICAL_PAGE_POSITION => CommandBody::LogicalPagePosition {
                x_offset: r.read_u24()?,
                y_offset: r.read_u24()?,
            },
            CMD_LOAD_FONT_EQUIVALENCE => {
                let mut entries = Vec::new();
                while r.remaining() > 0 {
                    entries.push(FontEquivalence {
                        local_id: r.read_u16()?,
                        global_name: r.read_ebcdic(8)?,
                        section: r.read_u8()?,
                        reserved: r.read_u8()?,
                    });
                }
                CommandBody::LoadFontEquivalence { entries }
            }
            CMD_ACTIVATE_RESOURCE => {
                let mut entries = Vec::new();
                while r.remaining() > 0 {
                    entries.push(ResourceActivation::decode(r)?);
                }
                CommandBody::ActivateResource { entries }
            }
            CMD_DEACTIVATE_RESOURCE => CommandBody::DeactivateResource {
                resource_type: r.read_u8()?,
                local_id: r.read_u8()?,
            },
            CMD_EXECUTE_ORDER_ANYSTATE => CommandBody::ExecuteOrderAnystate {
                order: AnystateOrder::decode(r)?,
            },
            CMD_EXECUTE_ORDER_HOME_STATE => CommandBody::ExecuteOrderHomeState {
                order: HomeStateOrder::decode(r)?,
            },
            CMD_ACKNOWLEDGE_REPLY => CommandBody::Acknowledge(AckReply::decode(r)?),
            _ => CommandBody::Opaque {
                id,
                data: r.read_remaining().to_vec(),
            },
        };
        if r.remaining() > 0 {
            return Err(Error::InconsistentLength {
                declared: r.position(),
                actual: r.position() + r.remaining(),
            });
        }
        Ok(body)
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        match self {
            CommandBody::NoOperation { data } | CommandBody::WriteText { data } => {
                w.write_bytes(data);
            }
            CommandBody::SenseTypeAndModel
            | CommandBody::SetHomeState
            | CommandBody::BeginPage
            | CommandBody::EndPage => {}
            CommandBody::LogicalPageDescriptor {
                unit_base,
                x_units_per_base,
                y_units_per_base,
                x_extent,
                y_extent,
                triplets,
            } => {
                w.write_u8(*unit_base);
                w.write_u16(*x_units_per_base);
                w.write_u16(*y_units_per_base);
                w.write_u24(*x_extent);
                w.write_u24(*y_extent);
                for t in triplets {
                    t.encode(w)?;
                }
            }
            CommandBody::LogicalPagePosition { x_offset, y_offset } => {
                w.write_u24(*x_offset);
                w.write_u24(*y_offset);
            }
            CommandBody::LoadFontEquivalence { entries } => {
                for e in entries {
                    w.write_u16(e.local_id);
                    w.write_ebcdic(&e.global_name, 8)?;
                    w.write_u8(e.section);
                    w.write_u8(e.reserved);
                }
            }
            CommandBody::ActivateResource { entries } => {
                for e in entries {
                    e.encode(w)?;
                }
            }
            CommandBody::DeactivateResource {
                resource_type,
                local_id,
            } => {
                w.write_u8(*resource_type);
                w.write_u8(*local_id);
            }
            CommandBody::ExecuteOrderAnystate { order } => order.encode(w),
            CommandBody::ExecuteOrderHomeState { order } => order.encode(w),
            CommandBody::Acknowledge(ack) => ack.encode(w)?,
            CommandBody::Opaque { data, .. } => w.write_bytes(data),
        }
        Ok(())
    }
}

impl ResourceActivation {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let entry_len = r.read_u16()? as usize;
        if entry_len < 6 {
            return Err(Error::InconsistentLength {
                declared: entry_len,
                actual: 6,
            });
        }
        let mut sub = r.sub_reader(entry_len - 2)?;
        Ok(Self {
            resource_type: sub.read_u8()?,
            id_format: sub.read_u8()?,
            flags: sub.read_u8()?,
            local_id: sub.read_u8()?,
            triplets: Triplet::read_sequence(&mut sub)?,
        })
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        let mut body = ByteWriter::new();
        body.write_u8(self.resource_type);
        body.write_u8(self.id_format);
        body.write_u8(self.flags);
        body.write_u8(self.local_id);
        for t in &self.triplets {
            t.encode(&mut body)?;
        }
        let entry_len = 2 + body.len();
        if entry_len > u16::MAX as usize {
            return Err(Error::InvalidParameter(
                "resource activation entry exceeds the 2-byte length field".to_string(),
            ));
        }
        w.write_u16(entry_len as u16);
        w.write_bytes(body.as_bytes());
        Ok(())
    }
}

impl AnystateOrder {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let code = r.read_u16()?;
        Ok(match code {
            ORDER_DISCARD_BUFFERED_DATA => AnystateOrder::DiscardBufferedData,
            ORDER_REQUEST_RESOURCE_LIST => AnystateOrder::RequestResourceList {
                resource_type: r.read_u8()?,
                id_format: r.read_u8()?,
            },
            _ => AnystateOrder::Opaque {
                code,
                data: r.read_remaining().to_vec(),
            },
        })
    }

    fn encode(&self, w: &mut ByteWriter) {
        match self {
            AnystateOrder::DiscardBufferedData => w.write_u16(ORDER_DISCARD_BUFFERED_DATA),
            AnystateOrder::RequestResourceList {
                resource_type,
                id_format,
            } => {
                w.write_u16(ORDER_REQUEST_RESOURCE_LIST);
                w.write_u8(*resource_type);
                w.write_u8(*id_format);
            }
            AnystateOrder::Opaque { code, data } => {
                w.write_u16(*code);
                w.write_bytes(data);
            }
        }
    }
}

impl HomeStateOrder {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let code = r.read_u16()?;
        Ok(match code {
            ORDER_OBTAIN_PRINTER_CHARACTERISTICS => HomeStateOrder::ObtainPrinterCharacteristics,
            ORDER_EJECT_TO_FRONT_FACING => HomeStateOrder::EjectToFrontFacing,
            ORDER_SELECT_INPUT_MEDIA_SOURCE => HomeStateOrder::SelectInputMediaSource {
                source: r.read_u8()?,
            },
            ORDER_SET_MEDIA_SIZE => HomeStateOrder::SetMediaSize {
                unit_base: r.read_u8()?,
                units_per_base: r.read_u16()?,
                x_extent: r.read_u24()?,
                y_extent: r.read_u24()?,
            },
            _ => HomeStateOrder::Opaque {
                code,
                data: r.read_remaining().to_vec(),
            },
        })
    }

    fn encode(&self, w: &mut ByteWriter) {
        match self {
            HomeStateOrder::ObtainPrinterCharacteristics => {
                w.write_u16(ORDER_OBTAIN_PRINTER_CHARACTERISTICS)
            }
            HomeStateOrder::EjectToFrontFacing => w.write_u16(ORDER_EJECT_TO_FRONT_FACING),
            HomeStateOrder::SelectInputMediaSource { source } => {
                w.write_u16(ORDER_SELECT_INPUT_MEDIA_SOURCE);
                w.write_u8(*source);
            }
            HomeStateOrder::SetMediaSize {
                unit_base,
                units_per_base,
                x_extent,
                y_extent,
            } => {
                w.write_u16(ORDER_SET_MEDIA_SIZE);
                w.write_u8(*unit_base);
                w.write_u16(*units_per_base);
                w.write_u24(*x_extent);
                w.write_u24(*y_extent);
            }
            HomeStateOrder::Opaque { code, data } => {
                w.write_u16(*code);
                w.write_bytes(data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ack::{AckData, SenseData};
    use crate::codec::triplet::{CharacterSetId, Triplet};

    fn roundtrip(cmd: &Command) -> Command {
        let bytes = cmd.encode().unwrap();
        Command::decode(&bytes).unwrap()
    }

    #[test]
    fn test_nop_frame_layout() {
        let cmd = Command::new(CommandBody::NoOperation { data: vec![] });
        let bytes = cmd.encode().unwrap();
        // length=5, id=D603, flags=00
        assert_eq!(bytes, vec![0x00, 0x05, 0xD6, 0x03, 0x00]);
    }

    #[test]
    fn test_correlation_id_layout() {
        let cmd = Command::new(CommandBody::SenseTypeAndModel)
            .with_acknowledgment()
            .with_correlation_id(0x1234);
        let bytes = cmd.encode().unwrap();
        // length=7, id=D6E4, flags=ARQ|CID, cid=1234
        assert_eq!(bytes, vec![0x00, 0x07, 0xD6, 0xE4, 0xC0, 0x12, 0x34]);
        let decoded = Command::decode(&bytes).unwrap();
        assert_eq!(decoded.correlation_id, Some(0x1234));
        assert!(decoded.flags.acknowledgment_required());
    }

    #[test]
    fn test_inconsistent_length_rejected() {
        let mut bytes = Command::new(CommandBody::SetHomeState).encode().unwrap();
        bytes.push(0xEE); // buffer longer than declared
        assert!(matches!(
            Command::decode(&bytes),
            Err(Error::InconsistentLength { .. })
        ));

        let short = [0x00, 0x09, 0xD6, 0x97, 0x00]; // declares 9, only 5 present
        assert!(matches!(
            Command::decode(&short),
            Err(Error::InconsistentLength { .. })
        ));
    }

    #[test]
    fn test_logical_page_descriptor_with_triplets() {
        let cmd = Command::new(CommandBody::LogicalPageDescriptor {
            unit_base: 0x00,
            x_units_per_base: 14400,
            y_units_per_base: 14400,
            x_extent: 0x002000,
            y_extent: 0x003000,
            triplets: vec![
                Triplet::CodedGraphicCharacterSet(CharacterSetId::Ccsid(500)),
                Triplet::ResourceLocalId {
                    resource_type: 2,
                    local_id: 9,
                },
            ],
        });
        assert_eq!(roundtrip(&cmd), cmd);
    }

    #[test]
    fn test_nested_exhaustion() {
        // Payload of two triplets (lengths 4 and 4) and no remainder
        let mut w = ByteWriter::new();
        w.write_u16(0); // patched below
        w.write_u16(CMD_LOGICAL_PAGE_DESCRIPTOR);
        w.write_u8(0);
        w.write_u8(0x00);
        w.write_u16(1);
        w.write_u16(1);
        w.write_u24(1);
        w.write_u24(1);
        w.write_bytes(&[0x04, 0x24, 0x01, 0x02]);
        w.write_bytes(&[0x04, 0x50, 0x00, 0x41]);
        let total = w.len() as u16;
        w.patch_u16(0, total);
        let cmd = Command::decode(w.as_bytes()).unwrap();
        match cmd.body {
            CommandBody::LogicalPageDescriptor { ref triplets, .. } => {
                assert_eq!(triplets.len(), 2);
            }
            ref other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_load_font_equivalence_roundtrip() {
        let cmd = Command::new(CommandBody::LoadFontEquivalence {
            entries: vec![
                FontEquivalence {
                    local_id: 1,
                    global_name: "C0D0GT10".to_string(),
                    section: 0,
                    reserved: 0,
                },
                FontEquivalence {
                    local_id: 0xFFFF,
                    global_name: "C0D0GB12".to_string(),
                    section: 1,
                    reserved: 0,
                },
            ],
        });
        assert_eq!(roundtrip(&cmd), cmd);

        let empty = Command::new(CommandBody::LoadFontEquivalence { entries: vec![] });
        assert_eq!(roundtrip(&empty), empty);
    }

    #[test]
    fn test_activate_resource_entry_triplets() {
        let cmd = Command::new(CommandBody::ActivateResource {
            entries: vec![ResourceActivation {
                resource_type: 0x01,
                id_format: 0x00,
                flags: 0x00,
                local_id: 0x05,
                triplets: vec![Triplet::EncodingScheme { esid: 0x0841 }],
            }],
        });
        assert_eq!(roundtrip(&cmd), cmd);
    }

    #[test]
    fn test_execute_orders_roundtrip() {
        let orders = [
            Command::new(CommandBody::ExecuteOrderAnystate {
                order: AnystateOrder::DiscardBufferedData,
            }),
            Command::new(CommandBody::ExecuteOrderAnystate {
                order: AnystateOrder::RequestResourceList {
                    resource_type: 1,
                    id_format: 0,
                },
            }),
            Command::new(CommandBody::ExecuteOrderHomeState {
                order: HomeStateOrder::ObtainPrinterCharacteristics,
            }),
            Command::new(CommandBody::ExecuteOrderHomeState {
                order: HomeStateOrder::SetMediaSize {
                    unit_base: 0,
                    units_per_base: 2400,
                    x_extent: 0x1000,
                    y_extent: 0x2000,
                },
            }),
        ];
        for cmd in &orders {
            assert_eq!(&roundtrip(cmd), cmd);
        }
    }

    #[test]
    fn test_unknown_order_preserved() {
        let cmd = Command::new(CommandBody::ExecuteOrderHomeState {
            order: HomeStateOrder::Opaque {
                code: 0xFA99,
                data: vec![0x01, 0x02],
            },
        });
        assert_eq!(roundtrip(&cmd), cmd);
    }

    #[test]
    fn test_opaque_command_byte_exact() {
        let bytes = [0x00, 0x08, 0xD6, 0x77, 0x00, 0xAA, 0xBB, 0xCC];
        let cmd = Command::decode(&bytes).unwrap();
        assert_eq!(cmd.id(), 0xD677);
        assert_eq!(cmd.encode().unwrap(), bytes);
    }

    #[test]
    fn test_acknowledge_decode() {
        // NACK with exception 0x0100 (normal reset)
        let mut w = ByteWriter::new();
        w.write_u16(9);
        w.write_u16(CMD_ACKNOWLEDGE_REPLY);
        w.write_u8(0x80);
        w.write_u8(0x82); // negative ack type
        w.write_u16(0x0100);
        w.write_u8(0x00);
        let cmd = Command::decode(w.as_bytes()).unwrap();
        match &cmd.body {
            CommandBody::Acknowledge(ack) => {
                assert!(ack.is_negative());
                assert_eq!(
                    ack.data,
                    AckData::Sense(SenseData {
                        exception_id: 0x0100,
                        action_code: 0x00,
                        detail: vec![],
                    })
                );
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_write_text_opaque_payload() {
        let cmd = Command::new(CommandBody::WriteText {
            data: vec![0x2B, 0xD3, 0x04, 0xC6, 0x00, 0x01],
        });
        assert_eq!(roundtrip(&cmd), cmd);
    }
}
