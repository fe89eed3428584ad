//! Struct property shapes.
//!
//! A struct payload's layout is keyed by its shape name. Shapes with a
//! dedicated binary layout form the closed set below; every other name
//! decodes through the format's self-describing property-list path, which
//! the owning record's declared-size cross-check still validates. Names on
//! the modded allowlist are retained as raw bytes for exact reproduction.

use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::types::ObjectReference;

use super::decode::decode_properties;
use super::encode::encode_properties;
use super::Property;

/// Struct shape names known to appear only in modded saves, preserved as raw
/// bytes rather than parsed.
pub const MODDED_STRUCT_SHAPES: &[&str] = &[
    "FINNetworkTrace",
    "FINLuaProcessorStateStorage",
    "FIRInstancedStruct",
    "FICFrameRange",
];

/// Resolved struct shape, matched exhaustively by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructShape {
    Vector,
    Rotator,
    Quat,
    Vector2D,
    Vector4,
    LinearColor,
    Color,
    IntVector,
    IntPoint,
    Box,
    Guid,
    FluidBox,
    DateTime,
    RailroadTrackPosition,
    InventoryItem,
    ClientIdentityInfo,
    /// Modded-save shape: raw bytes retained verbatim.
    Modded,
    /// No dedicated binary layout: a self-describing property list.
    PropertyList,
}

impl StructShape {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Vector" => Self::Vector,
            "Rotator" => Self::Rotator,
            "Quat" => Self::Quat,
            "Vector2D" => Self::Vector2D,
            "Vector4" => Self::Vector4,
            "LinearColor" => Self::LinearColor,
            "Color" => Self::Color,
            "IntVector" => Self::IntVector,
            "IntPoint" => Self::IntPoint,
            "Box" => Self::Box,
            "Guid" => Self::Guid,
            "FluidBox" => Self::FluidBox,
            "DateTime" => Self::DateTime,
            "RailroadTrackPosition" => Self::RailroadTrackPosition,
            "InventoryItem" => Self::InventoryItem,
            "ClientIdentityInfo" => Self::ClientIdentityInfo,
            _ if MODDED_STRUCT_SHAPES.contains(&name) => Self::Modded,
            _ => Self::PropertyList,
        }
    }
}

/// A decoded struct body.
#[derive(Debug, Clone, PartialEq)]
pub enum StructValue {
    /// Also used for Rotator (same three doubles on the wire).
    Vector { x: f64, y: f64, z: f64 },
    Quat { x: f64, y: f64, z: f64, w: f64 },
    Vector2D { x: f64, y: f64 },
    Vector4 { x: f64, y: f64, z: f64, w: f64 },
    LinearColor { r: f32, g: f32, b: f32, a: f32 },
    Color { r: u8, g: u8, b: u8, a: u8 },
    IntVector { x: i32, y: i32, z: i32 },
    IntPoint { x: i32, y: i32 },
    Box { min: [f64; 3], max: [f64; 3], is_valid: u8 },
    Guid([u8; 16]),
    FluidBox { content: f32 },
    DateTime { ticks: i64 },
    RailroadTrackPosition {
        track: ObjectReference,
        offset: f32,
        forward: f32,
    },
    InventoryItem(InventoryItemValue),
    ClientIdentityInfo {
        offline_id: String,
        accounts: Vec<(u8, Vec<u8>)>,
    },
    /// Self-describing property-list struct.
    Properties(Vec<Property>),
    /// Modded-save shape, kept byte-for-byte.
    Raw(Vec<u8>),
}

/// An inventory item slot.
///
/// Two legacy encodings survive in real files and the format carries no
/// explicit discriminator: the variant is inferred from the bytes remaining
/// in the declared record size. `LegacyReserved` replaces the structured
/// item properties with one reserved 32-bit word. Neither variant is
/// normalized to the other; each re-encodes its own layout.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryItemValue {
    Properties {
        item_type: String,
        properties: Vec<Property>,
    },
    LegacyReserved {
        item_type: String,
        reserved: u32,
    },
}

impl StructValue {
    /// Decode one struct body of the given shape.
    ///
    /// `end` is the absolute payload end of the owning record, used both to
    /// size `Raw` bodies and to disambiguate the legacy inventory-item
    /// encoding. Inside struct arrays no per-element end exists: callers
    /// pass `None` and the size-dependent shapes fall back accordingly
    /// (modded shapes become a hard error, inventory items take the
    /// self-terminating property-list variant).
    pub fn decode(c: &mut Cursor, shape_name: &str, end: Option<usize>) -> Result<Self> {
        match StructShape::from_name(shape_name) {
            StructShape::Vector | StructShape::Rotator => Ok(Self::Vector {
                x: c.read_f64()?,
                y: c.read_f64()?,
                z: c.read_f64()?,
            }),
            StructShape::Quat => Ok(Self::Quat {
                x: c.read_f64()?,
                y: c.read_f64()?,
                z: c.read_f64()?,
                w: c.read_f64()?,
            }),
            StructShape::Vector2D => Ok(Self::Vector2D {
                x: c.read_f64()?,
                y: c.read_f64()?,
            }),
            StructShape::Vector4 => Ok(Self::Vector4 {
                x: c.read_f64()?,
                y: c.read_f64()?,
                z: c.read_f64()?,
                w: c.read_f64()?,
            }),
            StructShape::LinearColor => Ok(Self::LinearColor {
                r: c.read_f32()?,
                g: c.read_f32()?,
                b: c.read_f32()?,
                a: c.read_f32()?,
            }),
            StructShape::Color => Ok(Self::Color {
                r: c.read_u8()?,
                g: c.read_u8()?,
                b: c.read_u8()?,
                a: c.read_u8()?,
            }),
            StructShape::IntVector => Ok(Self::IntVector {
                x: c.read_i32()?,
                y: c.read_i32()?,
                z: c.read_i32()?,
            }),
            StructShape::IntPoint => Ok(Self::IntPoint {
                x: c.read_i32()?,
                y: c.read_i32()?,
            }),
            StructShape::Box => {
                let mut min = [0.0f64; 3];
                for v in &mut min {
                    *v = c.read_f64()?;
                }
                let mut max = [0.0f64; 3];
                for v in &mut max {
                    *v = c.read_f64()?;
                }
                let is_valid = c.read_u8()?;
                Ok(Self::Box { min, max, is_valid })
            }
            StructShape::Guid => {
                let bytes = c.read_bytes(16)?;
                let mut guid = [0u8; 16];
                guid.copy_from_slice(bytes);
                Ok(Self::Guid(guid))
            }
            StructShape::FluidBox => Ok(Self::FluidBox {
                content: c.read_f32()?,
            }),
            StructShape::DateTime => Ok(Self::DateTime {
                ticks: c.read_i64()?,
            }),
            StructShape::RailroadTrackPosition => Ok(Self::RailroadTrackPosition {
                track: ObjectReference::decode(c)?,
                offset: c.read_f32()?,
                forward: c.read_f32()?,
            }),
            StructShape::InventoryItem => {
                Ok(Self::InventoryItem(decode_inventory_item(c, end)?))
            }
            StructShape::ClientIdentityInfo => {
                let offline_id = c.read_string()?;
                let account_count = c.read_u32()? as usize;
                let mut accounts = Vec::with_capacity(account_count.min(16));
                for _ in 0..account_count {
                    let kind = c.read_u8()?;
                    let size = c.read_u32()? as usize;
                    accounts.push((kind, c.read_bytes(size)?.to_vec()));
                }
                Ok(Self::ClientIdentityInfo {
                    offline_id,
                    accounts,
                })
            }
            StructShape::Modded => {
                let offset = c.position();
                let end = end.ok_or_else(|| Error::UnknownType {
                    category: "struct shape (modded, size-less context)",
                    name: shape_name.to_string(),
                    offset,
                })?;
                let remaining = end.saturating_sub(c.position());
                Ok(Self::Raw(c.read_bytes(remaining)?.to_vec()))
            }
            StructShape::PropertyList => Ok(Self::Properties(decode_properties(c)?)),
        }
    }

    pub fn encode(&self, w: &mut Writer) {
        match self {
            Self::Vector { x, y, z } => {
                w.write_f64(*x);
                w.write_f64(*y);
                w.write_f64(*z);
            }
            Self::Quat { x, y, z, w: qw } | Self::Vector4 { x, y, z, w: qw } => {
                w.write_f64(*x);
                w.write_f64(*y);
                w.write_f64(*z);
                w.write_f64(*qw);
            }
            Self::Vector2D { x, y } => {
                w.write_f64(*x);
                w.write_f64(*y);
            }
            Self::LinearColor { r, g, b, a } => {
                w.write_f32(*r);
                w.write_f32(*g);
                w.write_f32(*b);
                w.write_f32(*a);
            }
            Self::Color { r, g, b, a } => {
                w.write_u8(*r);
                w.write_u8(*g);
                w.write_u8(*b);
                w.write_u8(*a);
            }
            Self::IntVector { x, y, z } => {
                w.write_i32(*x);
                w.write_i32(*y);
                w.write_i32(*z);
            }
            Self::IntPoint { x, y } => {
                w.write_i32(*x);
                w.write_i32(*y);
            }
            Self::Box { min, max, is_valid } => {
                for v in min {
                    w.write_f64(*v);
                }
                for v in max {
                    w.write_f64(*v);
                }
                w.write_u8(*is_valid);
            }
            Self::Guid(guid) => w.write_bytes(guid),
            Self::FluidBox { content } => w.write_f32(*content),
            Self::DateTime { ticks } => w.write_i64(*ticks),
            Self::RailroadTrackPosition {
                track,
                offset,
                forward,
            } => {
                track.encode(w);
                w.write_f32(*offset);
                w.write_f32(*forward);
            }
            Self::InventoryItem(item) => match item {
                InventoryItemValue::Properties {
                    item_type,
                    properties,
                } => {
                    w.write_string(item_type);
                    encode_properties(w, properties);
                }
                InventoryItemValue::LegacyReserved {
                    item_type,
                    reserved,
                } => {
                    w.write_string(item_type);
                    w.write_u32(*reserved);
                }
            },
            Self::ClientIdentityInfo {
                offline_id,
                accounts,
            } => {
                w.write_string(offline_id);
                w.write_u32(accounts.len() as u32);
                for (kind, data) in accounts {
                    w.write_u8(*kind);
                    w.write_u32(data.len() as u32);
                    w.write_bytes(data);
                }
            }
            Self::Properties(props) => encode_properties(w, props),
            Self::Raw(bytes) => w.write_bytes(bytes),
        }
    }
}

/// Decode an inventory item, inferring which legacy encoding is present.
///
/// With a known record end: exactly four bytes left after the item type
/// string means the reserved-word variant, anything else the property-list
/// variant. Without one (struct-array elements) the property-list variant is
/// assumed; the legacy shape has only been observed at the top level.
fn decode_inventory_item(c: &mut Cursor, end: Option<usize>) -> Result<InventoryItemValue> {
    let item_type = c.read_string()?;
    if let Some(end) = end {
        if end.saturating_sub(c.position()) == 4 {
            return Ok(InventoryItemValue::LegacyReserved {
                item_type,
                reserved: c.read_u32()?,
            });
        }
    }
    Ok(InventoryItemValue::Properties {
        item_type,
        properties: decode_properties(c)?,
    })
}
