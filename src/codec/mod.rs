//! Record codecs for the printer data stream
//!
//! The protocol layers three nested self-describing record kinds, all
//! sharing one TLV discipline (read a length field, an identifier field,
//! and exactly `length - header` payload bytes through an isolated
//! sub-reader):
//!
//! ```text
//! Command:             u16 length | u16 id | u8 flags | [u16 correlation] | payload
//! Triplet:             u8 length  | u8 id  | payload(length - 2)
//! Self-defining field: u16 length | u16 id | payload(length - 4)
//! ```
//!
//! Each record kind is a closed tagged union with an `Opaque` fallback arm
//! that preserves unrecognized identifiers byte-for-byte, so any capture can
//! be decoded and re-encoded losslessly. Commands host trailing triplet
//! sequences; acknowledge replies host batches of self-defining fields;
//! a few triplets carry their own one-byte-selector inner unions.

pub mod ack;
pub mod command;
pub mod field;
pub mod triplet;

pub use ack::{AckData, AckReply, SenseData, StmReply};
pub use command::{
    AnystateOrder, Command, CommandBody, CommandFlags, FontEquivalence, HomeStateOrder,
    ResourceActivation,
};
pub use field::SelfDefiningField;
pub use triplet::Triplet;

// ============================================================================
// Command identifiers
// ============================================================================

pub const CMD_NO_OPERATION: u16 = 0xD603;
pub const CMD_WRITE_TEXT: u16 = 0xD62D;
pub const CMD_ACTIVATE_RESOURCE: u16 = 0xD62E;
pub const CMD_EXECUTE_ORDER_ANYSTATE: u16 = 0xD633;
pub const CMD_LOAD_FONT_EQUIVALENCE: u16 = 0xD63F;
pub const CMD_DEACTIVATE_RESOURCE: u16 = 0xD64F;
pub const CMD_LOGICAL_PAGE_POSITION: u16 = 0xD66D;
pub const CMD_EXECUTE_ORDER_HOME_STATE: u16 = 0xD68F;
pub const CMD_SET_HOME_STATE: u16 = 0xD697;
pub const CMD_BEGIN_PAGE: u16 = 0xD6AF;
pub const CMD_END_PAGE: u16 = 0xD6BF;
pub const CMD_LOGICAL_PAGE_DESCRIPTOR: u16 = 0xD6CF;
pub const CMD_SENSE_TYPE_AND_MODEL: u16 = 0xD6E4;
pub const CMD_ACKNOWLEDGE_REPLY: u16 = 0xD6FF;

// ============================================================================
// Command flag bits
// ============================================================================

/// Acknowledgment required
pub const FLAG_ARQ: u8 = 0x80;
/// Correlation id present
pub const FLAG_CID: u8 = 0x40;
/// Continuation requested
pub const FLAG_CONTINUE: u8 = 0x20;
/// Long reply accepted
pub const FLAG_LONG_REPLY: u8 = 0x10;
/// Additional information available
pub const FLAG_ADDITIONAL_INFO: u8 = 0x08;
/// Persistent NACK
pub const FLAG_PERSISTENT_NACK: u8 = 0x04;

// ============================================================================
// Order codes (inner unions of the two Execute Order commands)
// ============================================================================

pub const ORDER_DISCARD_BUFFERED_DATA: u16 = 0xF200;
pub const ORDER_OBTAIN_PRINTER_CHARACTERISTICS: u16 = 0xF300;
pub const ORDER_EJECT_TO_FRONT_FACING: u16 = 0xF400;
pub const ORDER_SELECT_INPUT_MEDIA_SOURCE: u16 = 0xF500;
pub const ORDER_REQUEST_RESOURCE_LIST: u16 = 0xF600;
pub const ORDER_SET_MEDIA_SIZE: u16 = 0xF700;

// ============================================================================
// Acknowledge reply types
// ============================================================================

/// Positive acknowledgment with no typed data
pub const ACK_TYPE_POSITIVE: u8 = 0x00;
/// Sense Type and Model reply data
pub const ACK_TYPE_STM_REPLY: u8 = 0x05;
/// Printer characteristics reply, short form
pub const ACK_TYPE_CHARACTERISTICS: u8 = 0x06;
/// Printer characteristics reply, long form (same semantics as short)
pub const ACK_TYPE_CHARACTERISTICS_LONG: u8 = 0x46;
/// High bit marks a negative acknowledgment carrying sense data
pub const ACK_TYPE_NEGATIVE_BIT: u8 = 0x80;

/// Exception id reported after a normal device power-on or reset.
///
/// The only NACK that triggers the automatic (single) handshake retry.
pub const EXCEPTION_NORMAL_RESET: u16 = 0x0100;

// ============================================================================
// Triplet identifiers
// ============================================================================

pub const TRIPLET_GROUP_ID: u8 = 0x00;
pub const TRIPLET_CODED_GRAPHIC_CHARACTER_SET: u8 = 0x01;
pub const TRIPLET_FULLY_QUALIFIED_NAME: u8 = 0x02;
pub const TRIPLET_RESOURCE_LOCAL_ID: u8 = 0x24;
pub const TRIPLET_COLOR_SPECIFICATION: u8 = 0x4E;
pub const TRIPLET_ENCODING_SCHEME: u8 = 0x50;
pub const TRIPLET_GROUP_INFORMATION: u8 = 0x6E;

// ============================================================================
// Self-defining field identifiers (printer characteristics)
// ============================================================================

pub const FIELD_PRINTABLE_AREA: u16 = 0x0001;
pub const FIELD_MEDIA_SOURCES: u16 = 0x0002;
pub const FIELD_PRODUCT_IDENTIFIER: u16 = 0x0003;
pub const FIELD_STORAGE_POOLS: u16 = 0x0006;
pub const FIELD_INSTALLED_FEATURES: u16 = 0x000B;
pub const FIELD_RESIDENT_SYMBOL_SETS: u16 = 0x000C;
pub const FIELD_SUPPORTED_GROUP_OPERATIONS: u16 = 0x0010;
pub const FIELD_COMMAND_SET_SUPPORT: u16 = 0x0018;
