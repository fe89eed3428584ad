use crate::cursor::Writer;
use crate::types::ObjectReference;

use super::{
    ArrayValue, ByteValue, MapKey, MapVal, Property, PropertyValue, SetValue, SoftObjectReference,
    TextVariant, STREAM_END,
};

/// Encode a property stream, terminated by the "None" sentinel.
///
/// The structural inverse of `decode_properties`: every tag string, reserved
/// zero, guard byte and declared size is reproduced, with sizes backpatched
/// from the bytes actually written.
pub fn encode_properties(w: &mut Writer, properties: &[Property]) {
    for property in properties {
        encode_property(w, property);
    }
    w.write_string(STREAM_END);
}

fn encode_property(w: &mut Writer, property: &Property) {
    w.write_string(&property.name);
    w.write_string(property.value.tag().name());
    let size_pos = w.position();
    w.write_i32(0); // patched below
    w.write_i32(property.index);

    let payload_start = match &property.value {
        PropertyValue::Bool(value) => {
            w.write_bool_u8(*value);
            w.write_u8(0);
            w.position()
        }
        PropertyValue::Byte(value) => {
            match value {
                ByteValue::Plain(_) => w.write_string("None"),
                ByteValue::Enum { enum_type, .. } => w.write_string(enum_type),
            }
            w.write_u8(0);
            let start = w.position();
            match value {
                ByteValue::Plain(byte) => w.write_u8(*byte),
                ByteValue::Enum { value, .. } => w.write_string(value),
            }
            start
        }
        PropertyValue::Enum { enum_type, value } => {
            w.write_string(enum_type);
            w.write_u8(0);
            let start = w.position();
            w.write_string(value);
            start
        }
        PropertyValue::Int8(v) => scalar(w, |w| w.write_i8(*v)),
        PropertyValue::Int(v) => scalar(w, |w| w.write_i32(*v)),
        PropertyValue::Int64(v) => scalar(w, |w| w.write_i64(*v)),
        PropertyValue::UInt32(v) => scalar(w, |w| w.write_u32(*v)),
        PropertyValue::Float(v) => scalar(w, |w| w.write_f32(*v)),
        PropertyValue::Double(v) => scalar(w, |w| w.write_f64(*v)),
        PropertyValue::Str(v) | PropertyValue::Name(v) => scalar(w, |w| w.write_string(v)),
        PropertyValue::Object(r) | PropertyValue::Interface(r) => scalar(w, |w| r.encode(w)),
        PropertyValue::SoftObject(soft) => scalar(w, |w| encode_soft_object(w, soft)),
        PropertyValue::Text(text) => scalar(w, |w| {
            w.write_u32(text.flags);
            match &text.variant {
                TextVariant::Base {
                    namespace,
                    key,
                    source,
                } => {
                    w.write_u8(0);
                    w.write_string(namespace);
                    w.write_string(key);
                    w.write_string(source);
                }
                TextVariant::NoHistory { invariant } => {
                    w.write_u8(255);
                    w.write_bool_u32(invariant.is_some());
                    if let Some(invariant) = invariant {
                        w.write_string(invariant);
                    }
                }
            }
        }),
        PropertyValue::Struct { shape_name, value } => {
            w.write_string(shape_name);
            for _ in 0..4 {
                w.write_u32(0);
            }
            w.write_u8(0);
            let start = w.position();
            value.encode(w);
            start
        }
        PropertyValue::Array(array) => {
            w.write_string(array.element_tag());
            w.write_u8(0);
            let start = w.position();
            encode_array(w, array);
            start
        }
        PropertyValue::Set(set) => {
            w.write_string(set.element_tag());
            w.write_u8(0);
            let start = w.position();
            w.write_u32(0);
            encode_set(w, set);
            start
        }
        PropertyValue::Map(map) => {
            w.write_string(map.key_kind.tag());
            w.write_string(map.value_kind.tag());
            w.write_u8(0);
            let start = w.position();
            w.write_u32(0);
            encode_map_entries(w, map);
            start
        }
    };

    w.patch_i32(size_pos, (w.position() - payload_start) as i32);
}

/// Guard byte, then the payload; returns the payload start position.
fn scalar(w: &mut Writer, write: impl FnOnce(&mut Writer)) -> usize {
    w.write_u8(0);
    let start = w.position();
    write(w);
    start
}

fn encode_soft_object(w: &mut Writer, soft: &SoftObjectReference) {
    soft.reference.encode(w);
    w.write_u32(soft.pie_instance);
}

fn encode_array(w: &mut Writer, array: &ArrayValue) {
    w.write_u32(array.len() as u32);
    match array {
        ArrayValue::Byte(v) => w.write_bytes(v),
        ArrayValue::Int8(v) => {
            for x in v {
                w.write_i8(*x);
            }
        }
        ArrayValue::Int(v) => {
            for x in v {
                w.write_i32(*x);
            }
        }
        ArrayValue::Int64(v) => {
            for x in v {
                w.write_i64(*x);
            }
        }
        ArrayValue::Float(v) => {
            for x in v {
                w.write_f32(*x);
            }
        }
        ArrayValue::Double(v) => {
            for x in v {
                w.write_f64(*x);
            }
        }
        ArrayValue::Bool(v) => {
            for x in v {
                w.write_bool_u8(*x);
            }
        }
        ArrayValue::Str(v) | ArrayValue::Name(v) | ArrayValue::Enum(v) => {
            for s in v {
                w.write_string(s);
            }
        }
        ArrayValue::Object(v) | ArrayValue::Interface(v) => {
            for r in v {
                r.encode(w);
            }
        }
        ArrayValue::SoftObject(v) => {
            for soft in v {
                encode_soft_object(w, soft);
            }
        }
        ArrayValue::Struct(sa) => {
            w.write_string(&sa.inner_name);
            w.write_string("StructProperty");
            let inner_size_pos = w.position();
            w.write_i32(0); // patched below
            w.write_i32(sa.inner_index);
            w.write_string(&sa.shape_name);
            for _ in 0..4 {
                w.write_u32(0);
            }
            w.write_u8(0);
            let elements_start = w.position();
            for element in &sa.elements {
                element.encode(w);
            }
            w.patch_i32(inner_size_pos, (w.position() - elements_start) as i32);
        }
    }
}

fn encode_set(w: &mut Writer, set: &SetValue) {
    w.write_u32(set.len() as u32);
    match set {
        SetValue::UInt32(v) => {
            for x in v {
                w.write_u32(*x);
            }
        }
        SetValue::StructPair(v) => {
            for (a, b) in v {
                w.write_u64(*a);
                w.write_u64(*b);
            }
        }
        SetValue::Object(v) => {
            for r in v {
                r.encode(w);
            }
        }
    }
}

fn encode_map_entries(w: &mut Writer, map: &super::MapValue) {
    w.write_u32(map.entries.len() as u32);
    for (key, value) in &map.entries {
        match key {
            MapKey::Int(v) => w.write_i32(*v),
            MapKey::IntTriple(a, b, c) => {
                w.write_i32(*a);
                w.write_i32(*b);
                w.write_i32(*c);
            }
            MapKey::Name(s) | MapKey::Enum(s) => w.write_string(s),
            MapKey::Object(r) => r.encode(w),
        }
        match value {
            MapVal::Properties(props) => encode_properties(w, props),
            MapVal::Int(v) => w.write_i32(*v),
            MapVal::Int64(v) => w.write_i64(*v),
            MapVal::Byte(v) => w.write_u8(*v),
            MapVal::Object(r) => r.encode(w),
        }
    }
}
