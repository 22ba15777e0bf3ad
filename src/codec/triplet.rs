//! Triplets - the small nested TLV records
//!
//! A triplet is `u8 length | u8 id | payload(length - 2)` and only ever
//! appears inside the trailing payload region of a command or a
//! self-defining field. Its length byte covers itself only, so a trailing
//! triplet sequence is parsed by looping until the enclosing sub-reader is
//! exhausted.
//!
//! Two triplets (Group Id and Group Information) carry a one-byte format
//! selector followed by a format-specific payload - a second level of tagged
//! dispatch nested inside a single record. Unknown formats are preserved the
//! same way unknown triplet ids are.

use super::{
    TRIPLET_CODED_GRAPHIC_CHARACTER_SET, TRIPLET_COLOR_SPECIFICATION, TRIPLET_ENCODING_SCHEME,
    TRIPLET_FULLY_QUALIFIED_NAME, TRIPLET_GROUP_ID, TRIPLET_GROUP_INFORMATION,
    TRIPLET_RESOURCE_LOCAL_ID,
};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::text;

/// Triplet header size: length byte + id byte
const TRIPLET_HEADER: usize = 2;

/// One triplet record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Triplet {
    /// X'00' - grouping triplet with a format-selected payload
    GroupId(GroupIdData),
    /// X'01' - coded graphic character set global id
    CodedGraphicCharacterSet(CharacterSetId),
    /// X'02' - fully qualified name in a format-selected encoding
    FullyQualifiedName {
        /// What the name designates
        fqn_type: u8,
        /// Name text, encoding chosen by the wire format selector
        name: NameData,
    },
    /// X'24' - resource local id
    ResourceLocalId { resource_type: u8, local_id: u8 },
    /// X'4E' - color specification
    ColorSpecification {
        color_space: u8,
        /// Component bytes, layout defined by the color space
        components: Vec<u8>,
    },
    /// X'50' - encoding scheme id
    EncodingScheme { esid: u16 },
    /// X'6E' - group information with a format-selected payload
    GroupInformation(GroupInfoData),
    /// Any identifier not in the registry, preserved verbatim
    Opaque { id: u8, data: Vec<u8> },
}

/// Group Id (X'00') format-selected payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupIdData {
    /// Format X'01' - print job name, variable-length EBCDIC
    PrintJobName { name: String },
    /// Format X'03' - queue name plus job name, both 8-byte EBCDIC
    QueuedJob { queue: String, job: String },
    /// Format X'06' - class, 8-byte forms name, variable EBCDIC job name
    ExtendedJob {
        class: u8,
        forms: String,
        name: String,
    },
    /// Unknown format selector, preserved verbatim
    Opaque { format: u8, data: Vec<u8> },
}

/// Group Information (X'6E') format-selected payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupInfoData {
    /// Format X'02' - copy set number within the group
    CopySetNumber { number: u32 },
    /// Format X'03' - group name, variable-length EBCDIC
    GroupName { name: String },
    /// Format X'04' - page count within the group
    PageCount { pages: u32 },
    /// Unknown format selector, preserved verbatim
    Opaque { format: u8, data: Vec<u8> },
}

/// Character set identification, in either of its two wire forms
///
/// The pair form carries a GCSGID/CPGID pair; when the first word is zero
/// the second word is a CCSID instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterSetId {
    GcsgidCpgid { gcsgid: u16, cpgid: u16 },
    Ccsid(u16),
}

/// Fully-qualified-name text in its wire encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameData {
    /// Format X'00': EBCDIC code page 500
    Ebcdic(String),
    /// Format X'10': UCS-2 big-endian
    Ucs2(String),
    /// Unknown format selector, preserved verbatim
    Opaque { format: u8, data: Vec<u8> },
}

impl Triplet {
    /// Identifier byte for this triplet
    pub fn id(&self) -> u8 {
        match self {
            Triplet::GroupId(_) => TRIPLET_GROUP_ID,
            Triplet::CodedGraphicCharacterSet(_) => TRIPLET_CODED_GRAPHIC_CHARACTER_SET,
            Triplet::FullyQualifiedName { .. } => TRIPLET_FULLY_QUALIFIED_NAME,
            Triplet::ResourceLocalId { .. } => TRIPLET_RESOURCE_LOCAL_ID,
            Triplet::ColorSpecification { .. } => TRIPLET_COLOR_SPECIFICATION,
            Triplet::EncodingScheme { .. } => TRIPLET_ENCODING_SCHEME,
            Triplet::GroupInformation(_) => TRIPLET_GROUP_INFORMATION,
            Triplet::Opaque { id, .. } => *id,
        }
    }

    /// Read one triplet from the reader
    pub fn decode_one(r: &mut ByteReader<'_>) -> Result<Triplet> {
        let length = r.read_u8()? as usize;
        if length < TRIPLET_HEADER {
            return Err(Error::InconsistentLength {
                declared: length,
                actual: TRIPLET_HEADER,
            });
        }
        let id = r.read_u8()?;
        let mut sub = r.sub_reader(length - TRIPLET_HEADER)?;
        Self::decode_payload(id, &mut sub)
    }

    /// Read a trailing triplet sequence until the reader is exhausted
    ///
    /// The sequence is complete exactly when zero bytes remain; a partial
    /// record at the tail surfaces as `Truncated` from the record's own
    /// reads.
    pub fn read_sequence(r: &mut ByteReader<'_>) -> Result<Vec<Triplet>> {
        let mut out = Vec::new();
        while r.remaining() > 0 {
            out.push(Self::decode_one(r)?);
        }
        Ok(out)
    }

    fn decode_payload(id: u8, r: &mut ByteReader<'_>) -> Result<Triplet> {
        let t = match id {
            TRIPLET_GROUP_ID => Triplet::GroupId(GroupIdData::decode(r)?),
            TRIPLET_CODED_GRAPHIC_CHARACTER_SET => {
                let first = r.read_u16()?;
                let second = r.read_u16()?;
                let set = if first == 0 {
                    CharacterSetId::Ccsid(second)
                } else {
                    CharacterSetId::GcsgidCpgid {
                        gcsgid: first,
                        cpgid: second,
                    }
                };
                Triplet::CodedGraphicCharacterSet(set)
            }
            TRIPLET_FULLY_QUALIFIED_NAME => {
                let fqn_type = r.read_u8()?;
                let format = r.read_u8()?;
                let name = match format {
                    0x00 => NameData::Ebcdic(r.read_ebcdic(r.remaining())?),
                    0x10 => NameData::Ucs2(r.read_ucs2(r.remaining())?),
                    _ => NameData::Opaque {
                        format,
                        data: r.read_remaining().to_vec(),
                    },
                };
                Triplet::FullyQualifiedName { fqn_type, name }
            }
            TRIPLET_RESOURCE_LOCAL_ID => Triplet::ResourceLocalId {
                resource_type: r.read_u8()?,
                local_id: r.read_u8()?,
            },
            TRIPLET_COLOR_SPECIFICATION => Triplet::ColorSpecification {
                color_space: r.read_u8()?,
                components: r.read_remaining().to_vec(),
            },
            TRIPLET_ENCODING_SCHEME => Triplet::EncodingScheme { esid: r.read_u16()? },
            TRIPLET_GROUP_INFORMATION => Triplet::GroupInformation(GroupInfoData::decode(r)?),
            _ => Triplet::Opaque {
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
        Ok(t)
    }

    /// Append this triplet's wire bytes to the writer
    pub fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        let mut body = ByteWriter::new();
        self.encode_payload(&mut body)?;
        let length = TRIPLET_HEADER + body.len();
        if length > u8::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "triplet 0x{:02X} payload of {} bytes exceeds the 1-byte length field",
                self.id(),
                body.len()
            )));
        }
        w.write_u8(length as u8);
        w.write_u8(self.id());
        w.write_bytes(body.as_bytes());
        Ok(())
    }

    fn encode_payload(&self, w: &mut ByteWriter) -> Result<()> {
        match self {
            Triplet::GroupId(data) => data.encode(w)?,
            Triplet::CodedGraphicCharacterSet(set) => match set {
                CharacterSetId::GcsgidCpgid { gcsgid, cpgid } => {
                    w.write_u16(*gcsgid);
                    w.write_u16(*cpgid);
                }
                CharacterSetId::Ccsid(ccsid) => {
                    w.write_u16(0);
                    w.write_u16(*ccsid);
                }
            },
            Triplet::FullyQualifiedName { fqn_type, name } => {
                w.write_u8(*fqn_type);
                match name {
                    NameData::Ebcdic(s) => {
                        w.write_u8(0x00);
                        let bytes = text::string_to_ebcdic(s)?;
                        w.write_bytes(&bytes);
                    }
                    NameData::Ucs2(s) => {
                        w.write_u8(0x10);
                        w.write_ucs2(s)?;
                    }
                    NameData::Opaque { format, data } => {
                        w.write_u8(*format);
                        w.write_bytes(data);
                    }
                }
            }
            Triplet::ResourceLocalId {
                resource_type,
                local_id,
            } => {
                w.write_u8(*resource_type);
                w.write_u8(*local_id);
            }
            Triplet::ColorSpecification {
                color_space,
                components,
            } => {
                w.write_u8(*color_space);
                w.write_bytes(components);
            }
            Triplet::EncodingScheme { esid } => w.write_u16(*esid),
            Triplet::GroupInformation(data) => data.encode(w)?,
            Triplet::Opaque { data, .. } => w.write_bytes(data),
        }
        Ok(())
    }
}

impl GroupIdData {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let format = r.read_u8()?;
        Ok(match format {
            0x01 => GroupIdData::PrintJobName {
                name: r.read_ebcdic(r.remaining())?,
            },
            0x03 => GroupIdData::QueuedJob {
                queue: r.read_ebcdic(8)?,
                job: r.read_ebcdic(8)?,
            },
            0x06 => GroupIdData::ExtendedJob {
                class: r.read_u8()?,
                forms: r.read_ebcdic(8)?,
                name: r.read_ebcdic(r.remaining())?,
            },
            _ => GroupIdData::Opaque {
                format,
                data: r.read_remaining().to_vec(),
            },
        })
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        match self {
            GroupIdData::PrintJobName { name } => {
                w.write_u8(0x01);
                let bytes = text::string_to_ebcdic(name)?;
                w.write_bytes(&bytes);
            }
            GroupIdData::QueuedJob { queue, job } => {
                w.write_u8(0x03);
                w.write_ebcdic(queue, 8)?;
                w.write_ebcdic(job, 8)?;
            }
            GroupIdData::ExtendedJob { class, forms, name } => {
                w.write_u8(0x06);
                w.write_u8(*class);
                w.write_ebcdic(forms, 8)?;
                let bytes = text::string_to_ebcdic(name)?;
                w.write_bytes(&bytes);
            }
            GroupIdData::Opaque { format, data } => {
                w.write_u8(*format);
                w.write_bytes(data);
            }
        }
        Ok(())
    }
}

impl GroupInfoData {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let format = r.read_u8()?;
        Ok(match format {
            0x02 => GroupInfoData::CopySetNumber {
                number: r.read_u32()?,
            },
            0x03 => GroupInfoData::GroupName {
                name: r.read_ebcdic(r.remaining())?,
            },
            0x04 => GroupInfoData::PageCount { pages: r.read_u32()? },
            _ => GroupInfoData::Opaque {
                format,
                data: r.read_remaining().to_vec(),
            },
        })
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        match self {
            GroupInfoData::CopySetNumber { number } => {
                w.write_u8(0x02);
                w.write_u32(*number);
            }
            GroupInfoData::GroupName { name } => {
                w.write_u8(0x03);
                let bytes = text::string_to_ebcdic(name)?;
                w.write_bytes(&bytes);
            }
            GroupInfoData::PageCount { pages } => {
                w.write_u8(0x04);
                w.write_u32(*pages);
            }
            GroupInfoData::Opaque { format, data } => {
                w.write_u8(*format);
                w.write_bytes(data);
            }
        }
        Ok(())
    }
}
