use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::types::ObjectReference;

use super::structs::StructValue;
use super::{
    ArrayValue, ByteValue, MapKey, MapKeyKind, MapVal, MapValue, MapValueKind, Property,
    PropertyTag, PropertyValue, SetValue, SoftObjectReference, StructArray, TextValue,
    TextVariant, STREAM_END,
};

/// Decode a None-terminated property stream.
pub fn decode_properties(c: &mut Cursor) -> Result<Vec<Property>> {
    let mut properties = Vec::new();
    while let Some(property) = decode_property(c)? {
        properties.push(property);
    }
    Ok(properties)
}

/// Decode one record, or `None` at the stream-end sentinel.
fn decode_property(c: &mut Cursor) -> Result<Option<Property>> {
    let name = c.read_string()?;
    if name == STREAM_END {
        return Ok(None);
    }

    let tag_offset = c.position();
    let tag_name = c.read_string()?;
    let tag = PropertyTag::from_name(&tag_name).ok_or_else(|| Error::UnknownType {
        category: "property type",
        name: tag_name.clone(),
        offset: tag_offset,
    })?;

    let raw_size = c.read_i32()?;
    let declared_size = u64::try_from(raw_size).map_err(|_| Error::Parse {
        context: "property",
        message: format!("negative declared size {raw_size}"),
    })?;
    let index = c.read_i32()?;

    // Metadata (outside the declared size), then the guard byte, then the
    // payload whose length must match the declaration exactly.
    let value = match tag {
        PropertyTag::Bool => {
            let value = c.read_bool_u8()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            check_size(c, "bool property", declared_size, payload_start)?;
            PropertyValue::Bool(value)
        }
        PropertyTag::Byte => {
            let enum_type = c.read_string()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            let value = if enum_type == "None" {
                ByteValue::Plain(c.read_u8()?)
            } else {
                ByteValue::Enum {
                    enum_type,
                    value: c.read_string()?,
                }
            };
            check_size(c, "byte property", declared_size, payload_start)?;
            PropertyValue::Byte(value)
        }
        PropertyTag::Enum => {
            let enum_type = c.read_string()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            let value = c.read_string()?;
            check_size(c, "enum property", declared_size, payload_start)?;
            PropertyValue::Enum { enum_type, value }
        }
        PropertyTag::Int8 => scalar(c, declared_size, "int8 property", |c| {
            Ok(PropertyValue::Int8(c.read_i8()?))
        })?,
        PropertyTag::Int => scalar(c, declared_size, "int property", |c| {
            Ok(PropertyValue::Int(c.read_i32()?))
        })?,
        PropertyTag::Int64 => scalar(c, declared_size, "int64 property", |c| {
            Ok(PropertyValue::Int64(c.read_i64()?))
        })?,
        PropertyTag::UInt32 => scalar(c, declared_size, "uint32 property", |c| {
            Ok(PropertyValue::UInt32(c.read_u32()?))
        })?,
        PropertyTag::Float => scalar(c, declared_size, "float property", |c| {
            Ok(PropertyValue::Float(c.read_f32()?))
        })?,
        PropertyTag::Double => scalar(c, declared_size, "double property", |c| {
            Ok(PropertyValue::Double(c.read_f64()?))
        })?,
        PropertyTag::Str => scalar(c, declared_size, "string property", |c| {
            Ok(PropertyValue::Str(c.read_string()?))
        })?,
        PropertyTag::Name => scalar(c, declared_size, "name property", |c| {
            Ok(PropertyValue::Name(c.read_string()?))
        })?,
        PropertyTag::Object => scalar(c, declared_size, "object property", |c| {
            Ok(PropertyValue::Object(ObjectReference::decode(c)?))
        })?,
        PropertyTag::Interface => scalar(c, declared_size, "interface property", |c| {
            Ok(PropertyValue::Interface(ObjectReference::decode(c)?))
        })?,
        PropertyTag::SoftObject => scalar(c, declared_size, "soft object property", |c| {
            Ok(PropertyValue::SoftObject(SoftObjectReference {
                reference: ObjectReference::decode(c)?,
                pie_instance: c.read_u32()?,
            }))
        })?,
        PropertyTag::Text => scalar(c, declared_size, "text property", decode_text)?,
        PropertyTag::Struct => {
            let shape_name = c.read_string()?;
            for _ in 0..4 {
                c.expect_u32(0, "struct reserved")?;
            }
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            let end = payload_start + declared_size as usize;
            let value = StructValue::decode(c, &shape_name, Some(end))?;
            check_size(c, "struct property", declared_size, payload_start)?;
            PropertyValue::Struct { shape_name, value }
        }
        PropertyTag::Array => {
            let element_offset = c.position();
            let element_tag = c.read_string()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            let value = decode_array(c, &element_tag, element_offset)?;
            check_size(c, "array property", declared_size, payload_start)?;
            PropertyValue::Array(value)
        }
        PropertyTag::Set => {
            let element_offset = c.position();
            let element_tag = c.read_string()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            c.expect_u32(0, "set reserved")?;
            let value = decode_set(c, &element_tag, element_offset)?;
            check_size(c, "set property", declared_size, payload_start)?;
            PropertyValue::Set(value)
        }
        PropertyTag::Map => {
            let kinds_offset = c.position();
            let key_tag = c.read_string()?;
            let value_tag = c.read_string()?;
            c.expect_u8(0, "property guard")?;
            let payload_start = c.position();
            let value = decode_map(c, &key_tag, &value_tag, kinds_offset)?;
            check_size(c, "map property", declared_size, payload_start)?;
            PropertyValue::Map(value)
        }
    };

    Ok(Some(Property { name, index, value }))
}

/// Guard byte + payload for the scalar-shaped tags (the ones with no
/// metadata beyond the guard).
fn scalar(
    c: &mut Cursor,
    declared_size: u64,
    context: &'static str,
    read: impl FnOnce(&mut Cursor) -> Result<PropertyValue>,
) -> Result<PropertyValue> {
    c.expect_u8(0, "property guard")?;
    let payload_start = c.position();
    let value = read(c)?;
    check_size(c, context, declared_size, payload_start)?;
    Ok(value)
}

fn check_size(
    c: &Cursor,
    context: &'static str,
    declared: u64,
    payload_start: usize,
) -> Result<()> {
    let actual = (c.position() - payload_start) as u64;
    if actual != declared {
        return Err(Error::SizeMismatch {
            context,
            declared,
            actual,
            offset: c.position(),
        });
    }
    Ok(())
}

fn decode_text(c: &mut Cursor) -> Result<PropertyValue> {
    let flags = c.read_u32()?;
    let history_offset = c.position();
    let history = c.read_u8()?;
    let variant = match history {
        0 => TextVariant::Base {
            namespace: c.read_string()?,
            key: c.read_string()?,
            source: c.read_string()?,
        },
        255 => {
            let has_invariant = c.read_bool_u32()?;
            let invariant = if has_invariant {
                Some(c.read_string()?)
            } else {
                None
            };
            TextVariant::NoHistory { invariant }
        }
        other => {
            return Err(Error::UnknownType {
                category: "text history",
                name: other.to_string(),
                offset: history_offset,
            })
        }
    };
    Ok(PropertyValue::Text(TextValue { flags, variant }))
}

fn decode_array(c: &mut Cursor, element_tag: &str, tag_offset: usize) -> Result<ArrayValue> {
    let count = c.read_u32()? as usize;
    Ok(match element_tag {
        "ByteProperty" => ArrayValue::Byte(c.read_bytes(count)?.to_vec()),
        "Int8Property" => {
            ArrayValue::Int8(c.read_bytes(count)?.iter().map(|&b| b as i8).collect())
        }
        "IntProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_i32()?);
            }
            ArrayValue::Int(v)
        }
        "Int64Property" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_i64()?);
            }
            ArrayValue::Int64(v)
        }
        "FloatProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_f32()?);
            }
            ArrayValue::Float(v)
        }
        "DoubleProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_f64()?);
            }
            ArrayValue::Double(v)
        }
        "BoolProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_bool_u8()?);
            }
            ArrayValue::Bool(v)
        }
        "StrProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_string()?);
            }
            ArrayValue::Str(v)
        }
        "NameProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_string()?);
            }
            ArrayValue::Name(v)
        }
        "EnumProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_string()?);
            }
            ArrayValue::Enum(v)
        }
        "ObjectProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(ObjectReference::decode(c)?);
            }
            ArrayValue::Object(v)
        }
        "InterfaceProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(ObjectReference::decode(c)?);
            }
            ArrayValue::Interface(v)
        }
        "SoftObjectProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(SoftObjectReference {
                    reference: ObjectReference::decode(c)?,
                    pie_instance: c.read_u32()?,
                });
            }
            ArrayValue::SoftObject(v)
        }
        "StructProperty" => ArrayValue::Struct(decode_struct_array(c, count)?),
        other => {
            return Err(Error::UnknownType {
                category: "array element type",
                name: other.to_string(),
                offset: tag_offset,
            })
        }
    })
}

/// Struct arrays wrap their elements in an inner record header whose
/// declared size covers all element bodies together.
fn decode_struct_array(c: &mut Cursor, count: usize) -> Result<StructArray> {
    let inner_name = c.read_string()?;
    let inner_tag_offset = c.position();
    let inner_tag = c.read_string()?;
    if inner_tag != "StructProperty" {
        return Err(Error::UnknownType {
            category: "struct array inner tag",
            name: inner_tag,
            offset: inner_tag_offset,
        });
    }
    let raw_inner_size = c.read_i32()?;
    let inner_size = u64::try_from(raw_inner_size).map_err(|_| Error::Parse {
        context: "struct array",
        message: format!("negative declared size {raw_inner_size}"),
    })?;
    let inner_index = c.read_i32()?;
    let shape_name = c.read_string()?;
    for _ in 0..4 {
        c.expect_u32(0, "struct array reserved")?;
    }
    c.expect_u8(0, "property guard")?;

    let elements_start = c.position();
    let mut elements = Vec::with_capacity(count.min(65536));
    for _ in 0..count {
        // No per-element size exists; size-dependent shapes fall back.
        elements.push(StructValue::decode(c, &shape_name, None)?);
    }
    let actual = (c.position() - elements_start) as u64;
    if actual != inner_size {
        return Err(Error::SizeMismatch {
            context: "struct array",
            declared: inner_size,
            actual,
            offset: c.position(),
        });
    }

    Ok(StructArray {
        inner_name,
        inner_index,
        shape_name,
        elements,
    })
}

fn decode_set(c: &mut Cursor, element_tag: &str, tag_offset: usize) -> Result<SetValue> {
    let count = c.read_u32()? as usize;
    Ok(match element_tag {
        "IntProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(c.read_u32()?);
            }
            SetValue::UInt32(v)
        }
        "StructProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push((c.read_u64()?, c.read_u64()?));
            }
            SetValue::StructPair(v)
        }
        "ObjectProperty" => {
            let mut v = Vec::with_capacity(count.min(65536));
            for _ in 0..count {
                v.push(ObjectReference::decode(c)?);
            }
            SetValue::Object(v)
        }
        other => {
            return Err(Error::UnknownType {
                category: "set element type",
                name: other.to_string(),
                offset: tag_offset,
            })
        }
    })
}

fn decode_map(
    c: &mut Cursor,
    key_tag: &str,
    value_tag: &str,
    kinds_offset: usize,
) -> Result<MapValue> {
    let key_kind = MapKeyKind::from_tag(key_tag).ok_or_else(|| Error::UnknownType {
        category: "map key type",
        name: key_tag.to_string(),
        offset: kinds_offset,
    })?;
    let value_kind = MapValueKind::from_tag(value_tag).ok_or_else(|| Error::UnknownType {
        category: "map value type",
        name: value_tag.to_string(),
        offset: kinds_offset,
    })?;

    c.expect_u32(0, "map mode")?;
    let count = c.read_u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(65536));
    for _ in 0..count {
        let key = match key_kind {
            MapKeyKind::Int => MapKey::Int(c.read_i32()?),
            MapKeyKind::IntTriple => {
                MapKey::IntTriple(c.read_i32()?, c.read_i32()?, c.read_i32()?)
            }
            MapKeyKind::Name => MapKey::Name(c.read_string()?),
            MapKeyKind::Enum => MapKey::Enum(c.read_string()?),
            MapKeyKind::Object => MapKey::Object(ObjectReference::decode(c)?),
        };
        let value = match value_kind {
            MapValueKind::Properties => MapVal::Properties(decode_properties(c)?),
            MapValueKind::Int => MapVal::Int(c.read_i32()?),
            MapValueKind::Int64 => MapVal::Int64(c.read_i64()?),
            MapValueKind::Byte => MapVal::Byte(c.read_u8()?),
            MapValueKind::Object => MapVal::Object(ObjectReference::decode(c)?),
        };
        entries.push((key, value));
    }

    Ok(MapValue {
        key_kind,
        value_kind,
        entries,
    })
}
