//! Self-defining fields - printer characteristics records
//!
//! A self-defining field is `u16 length | u16 id | payload(length - 4)`.
//! Fields arrive in batches inside the printer-characteristics acknowledge
//! reply; the batch is parsed with the same trailing-sequence loop used for
//! triplets.

use super::{
    FIELD_COMMAND_SET_SUPPORT, FIELD_INSTALLED_FEATURES, FIELD_MEDIA_SOURCES,
    FIELD_PRINTABLE_AREA, FIELD_PRODUCT_IDENTIFIER, FIELD_RESIDENT_SYMBOL_SETS,
    FIELD_STORAGE_POOLS, FIELD_SUPPORTED_GROUP_OPERATIONS,
};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Self-defining field header size: u16 length + u16 id
const FIELD_HEADER: usize = 4;

/// One self-defining field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfDefiningField {
    /// X'0001' - printable area geometry
    PrintableArea {
        unit_base: u8,
        units_per_base: u16,
        x_extent: u32,
        y_extent: u32,
    },
    /// X'0002' - installed input media sources
    MediaSources { sources: Vec<MediaSource> },
    /// X'0003' - device type, model and manufacturer
    ProductIdentifier {
        device_type: u16,
        model: u8,
        manufacturer: String,
    },
    /// X'0006' - resource storage pools
    StoragePools { pools: Vec<StoragePool> },
    /// X'000B' - installed feature ids
    InstalledFeatures { features: Vec<u16> },
    /// X'000C' - resident symbol sets
    ///
    /// The per-entry layout is provisional: the entry length is
    /// self-inclusive and the tail is a run of 16-bit typeface ids. Validate
    /// against captured traffic before relying on it.
    ResidentSymbolSets { entries: Vec<SymbolSetEntry> },
    /// X'0010' - supported group operation codes
    SupportedGroupOperations { operations: Vec<u8> },
    /// X'0018' - supported command sets and their levels
    CommandSetSupport { sets: Vec<CommandSetLevel> },
    /// Any identifier not in the registry, preserved verbatim
    Opaque { id: u16, data: Vec<u8> },
}

/// One input media source entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSource {
    pub source_id: u8,
    pub flags: u8,
}

/// One resource storage pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePool {
    pub pool_id: u8,
    /// Pool size in bytes
    pub size: u32,
}

/// One resident symbol set entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSetEntry {
    pub gcsgid: u16,
    pub cpgid: u16,
    /// Typeface ids resident for this character set
    pub typefaces: Vec<u16>,
}

/// A command set id with its support level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSetLevel {
    pub set_id: u16,
    pub level: u16,
}

impl SelfDefiningField {
    /// Identifier for this field
    pub fn id(&self) -> u16 {
        match self {
            SelfDefiningField::PrintableArea { .. } => FIELD_PRINTABLE_AREA,
            SelfDefiningField::MediaSources { .. } => FIELD_MEDIA_SOURCES,
            SelfDefiningField::ProductIdentifier { .. } => FIELD_PRODUCT_IDENTIFIER,
            SelfDefiningField::StoragePools { .. } => FIELD_STORAGE_POOLS,
            SelfDefiningField::InstalledFeatures { .. } => FIELD_INSTALLED_FEATURES,
            SelfDefiningField::ResidentSymbolSets { .. } => FIELD_RESIDENT_SYMBOL_SETS,
            SelfDefiningField::SupportedGroupOperations { .. } => FIELD_SUPPORTED_GROUP_OPERATIONS,
            SelfDefiningField::CommandSetSupport { .. } => FIELD_COMMAND_SET_SUPPORT,
            SelfDefiningField::Opaque { id, .. } => *id,
        }
    }

    /// Read one field from the reader
    pub fn decode_one(r: &mut ByteReader<'_>) -> Result<SelfDefiningField> {
        let length = r.read_u16()? as usize;
        if length < FIELD_HEADER {
            return Err(Error::InconsistentLength {
                declared: length,
                actual: FIELD_HEADER,
            });
        }
        let id = r.read_u16()?;
        let mut sub = r.sub_reader(length - FIELD_HEADER)?;
        Self::decode_payload(id, &mut sub)
    }

    /// Read a batch of fields until the reader is exhausted
    pub fn read_sequence(r: &mut ByteReader<'_>) -> Result<Vec<SelfDefiningField>> {
        let mut out = Vec::new();
        while r.remaining() > 0 {
            out.push(Self::decode_one(r)?);
        }
        Ok(out)
    }

    fn decode_payload(id: u16, r: &mut ByteReader<'_>) -> Result<SelfDefiningField> {
        let field = match id {
            FIELD_PRINTABLE_AREA => SelfDefiningField::PrintableArea {
                unit_base: r.read_u8()?,
                units_per_base: r.read_u16()?,
                x_extent: r.read_u24()?,
                y_extent: r.read_u24()?,
            },
            FIELD_MEDIA_SOURCES => {
                let mut sources = Vec::new();
                while r.remaining() > 0 {
                    sources.push(MediaSource {
                        source_id: r.read_u8()?,
                        flags: r.read_u8()?,
                    });
                }
                SelfDefiningField::MediaSources { sources }
            }
            FIELD_PRODUCT_IDENTIFIER => SelfDefiningField::ProductIdentifier {
                device_type: r.read_u16()?,
                model: r.read_u8()?,
                manufacturer: r.read_ebcdic(10)?,
            },
            FIELD_STORAGE_POOLS => {
                let mut pools = Vec::new();
                while r.remaining() > 0 {
                    pools.push(StoragePool {
                        pool_id: r.read_u8()?,
                        size: r.read_u32()?,
                    });
                }
                SelfDefiningField::StoragePools { pools }
            }
            FIELD_INSTALLED_FEATURES => {
                let mut features = Vec::new();
                while r.remaining() > 0 {
                    features.push(r.read_u16()?);
                }
                SelfDefiningField::InstalledFeatures { features }
            }
            FIELD_RESIDENT_SYMBOL_SETS => {
                let mut entries = Vec::new();
                while r.remaining() > 0 {
                    entries.push(SymbolSetEntry::decode(r)?);
                }
                SelfDefiningField::ResidentSymbolSets { entries }
            }
            FIELD_SUPPORTED_GROUP_OPERATIONS => SelfDefiningField::SupportedGroupOperations {
                operations: r.read_remaining().to_vec(),
            },
            FIELD_COMMAND_SET_SUPPORT => {
                let mut sets = Vec::new();
                while r.remaining() > 0 {
                    sets.push(CommandSetLevel {
                        set_id: r.read_u16()?,
                        level: r.read_u16()?,
                    });
                }
                SelfDefiningField::CommandSetSupport { sets }
            }
            _ => SelfDefiningField::Opaque {
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
        Ok(field)
    }

    /// Append this field's wire bytes to the writer
    pub fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        let mut body = ByteWriter::new();
        self.encode_payload(&mut body)?;
        let length = FIELD_HEADER + body.len();
        if length > u16::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "self-defining field 0x{:04X} payload of {} bytes exceeds the 2-byte length field",
                self.id(),
                body.len()
            )));
        }
        w.write_u16(length as u16);
        w.write_u16(self.id());
        w.write_bytes(body.as_bytes());
        Ok(())
    }

    fn encode_payload(&self, w: &mut ByteWriter) -> Result<()> {
        match self {
            SelfDefiningField::PrintableArea {
                unit_base,
                units_per_base,
                x_extent,
                y_extent,
            } => {
                w.write_u8(*unit_base);
                w.write_u16(*units_per_base);
                w.write_u24(*x_extent);
                w.write_u24(*y_extent);
            }
            SelfDefiningField::MediaSources { sources } => {
                for s in sources {
                    w.write_u8(s.source_id);
                    w.write_u8(s.flags);
                }
            }
            SelfDefiningField::ProductIdentifier {
                device_type,
                model,
                manufacturer,
            } => {
                w.write_u16(*device_type);
                w.write_u8(*model);
                w.write_ebcdic(manufacturer, 10)?;
            }
            SelfDefiningField::StoragePools { pools } => {
                for p in pools {
                    w.write_u8(p.pool_id);
                    w.write_u32(p.size);
                }
            }
            SelfDefiningField::InstalledFeatures { features } => {
                for f in features {
                    w.write_u16(*f);
                }
            }
            SelfDefiningField::ResidentSymbolSets { entries } => {
                for e in entries {
                    e.encode(w);
                }
            }
            SelfDefiningField::SupportedGroupOperations { operations } => {
                w.write_bytes(operations);
            }
            SelfDefiningField::CommandSetSupport { sets } => {
                for s in sets {
                    w.write_u16(s.set_id);
                    w.write_u16(s.level);
                }
            }
            SelfDefiningField::Opaque { data, .. } => w.write_bytes(data),
        }
        Ok(())
    }
}

impl SymbolSetEntry {
    /// Entry wire layout: `u16 entry length (self-inclusive) | u16 GCSGID |
    /// u16 CPGID | (length - 6) / 2 typeface ids`.
    fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let entry_len = r.read_u16()? as usize;
        if entry_len < 6 || (entry_len - 6) % 2 != 0 {
            return Err(Error::InconsistentLength {
                declared: entry_len,
                actual: 6,
            });
        }
        let mut sub = r.sub_reader(entry_len - 2)?;
        let gcsgid = sub.read_u16()?;
        let cpgid = sub.read_u16()?;
        let mut typefaces = Vec::with_capacity((entry_len - 6) / 2);
        while sub.remaining() > 0 {
            typefaces.push(sub.read_u16()?);
        }
        Ok(Self {
            gcsgid,
            cpgid,
            typefaces,
        })
    }

    fn encode(&self, w: &mut ByteWriter) {
        let entry_len = 6 + self.typefaces.len() * 2;
        w.write_u16(entry_len as u16);
        w.write_u16(self.gcsgid);
        w.write_u16(self.cpgid);
        for t in &self.typefaces {
            w.write_u16(*t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(f: &SelfDefiningField) -> SelfDefiningField {
        let mut w = ByteWriter::new();
        f.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let decoded = SelfDefiningField::decode_one(&mut r).unwrap();
        assert_eq!(r.remaining(), 0);
        decoded
    }

    #[test]
    fn test_printable_area_roundtrip() {
        let f = SelfDefiningField::PrintableArea {
            unit_base: 0x00,
            units_per_base: 14400,
            x_extent: 0x00_2D00,
            y_extent: 0xFF_FFFF, // max for the 24-bit width
        };
        assert_eq!(roundtrip(&f), f);
    }

    #[test]
    fn test_media_sources_roundtrip() {
        let f = SelfDefiningField::MediaSources {
            sources: vec![
                MediaSource {
                    source_id: 0x01,
                    flags: 0x80,
                },
                MediaSource {
                    source_id: 0x02,
                    flags: 0x00,
                },
            ],
        };
        assert_eq!(roundtrip(&f), f);

        // Empty list is a valid (empty) payload
        let empty = SelfDefiningField::MediaSources { sources: vec![] };
        assert_eq!(roundtrip(&empty), empty);
    }

    #[test]
    fn test_product_identifier_roundtrip() {
        let f = SelfDefiningField::ProductIdentifier {
            device_type: 0x3812,
            model: 0x01,
            manufacturer: "IBM       ".to_string(),
        };
        assert_eq!(roundtrip(&f), f);
    }

    #[test]
    fn test_storage_pools_roundtrip() {
        let f = SelfDefiningField::StoragePools {
            pools: vec![
                StoragePool {
                    pool_id: 1,
                    size: 1 << 20,
                },
                StoragePool {
                    pool_id: 2,
                    size: u32::MAX,
                },
            ],
        };
        assert_eq!(roundtrip(&f), f);
    }

    #[test]
    fn test_resident_symbol_sets_roundtrip() {
        let f = SelfDefiningField::ResidentSymbolSets {
            entries: vec![
                SymbolSetEntry {
                    gcsgid: 0x0267,
                    cpgid: 0x01F4,
                    typefaces: vec![0x000B, 0x0055],
                },
                SymbolSetEntry {
                    gcsgid: 0x0115,
                    cpgid: 0x0025,
                    typefaces: vec![],
                },
            ],
        };
        assert_eq!(roundtrip(&f), f);
    }

    #[test]
    fn test_symbol_set_odd_tail_rejected() {
        // Entry declares 7 bytes: (7 - 6) is odd, no whole typeface id fits
        let bytes = [0x00, 0x0B, 0x00, 0x0C, 0x00, 0x07, 0x02, 0x67, 0x01, 0xF4, 0xAA];
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            SelfDefiningField::decode_one(&mut r),
            Err(Error::InconsistentLength { .. })
        ));
    }

    #[test]
    fn test_symbol_set_entry_overrun_rejected() {
        // Entry length runs past the field payload
        let bytes = [0x00, 0x0A, 0x00, 0x0C, 0x00, 0x08, 0x02, 0x67, 0x01, 0xF4];
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            SelfDefiningField::decode_one(&mut r),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_installed_features_and_command_sets() {
        let f = SelfDefiningField::InstalledFeatures {
            features: vec![0x0001, 0x00FF, u16::MAX],
        };
        assert_eq!(roundtrip(&f), f);

        let s = SelfDefiningField::CommandSetSupport {
            sets: vec![CommandSetLevel {
                set_id: 0xC0DE,
                level: 0x0002,
            }],
        };
        assert_eq!(roundtrip(&s), s);
    }

    #[test]
    fn test_opaque_field_byte_exact() {
        let bytes = [0x00, 0x07, 0xBE, 0xEF, 0x01, 0x02, 0x03];
        let mut r = ByteReader::new(&bytes);
        let f = SelfDefiningField::decode_one(&mut r).unwrap();
        assert_eq!(f.id(), 0xBEEF);
        let mut w = ByteWriter::new();
        f.encode(&mut w).unwrap();
        assert_eq!(w.into_bytes(), bytes);
    }

    #[test]
    fn test_batch_sequence() {
        let mut w = ByteWriter::new();
        SelfDefiningField::InstalledFeatures { features: vec![1] }
            .encode(&mut w)
            .unwrap();
        SelfDefiningField::Opaque {
            id: 0x7777,
            data: vec![0xAB],
        }
        .encode(&mut w)
        .unwrap();
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let batch = SelfDefiningField::read_sequence(&mut r).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_declared_length_below_header() {
        let mut r = ByteReader::new(&[0x00, 0x02, 0x00, 0x01]);
        assert!(matches!(
            SelfDefiningField::decode_one(&mut r),
            Err(Error::InconsistentLength { .. })
        ));
    }
}
