//! Self-describing property stream codec.
//!
//! Entity bodies carry a None-terminated sequence of records:
//!
//! ```text
//! name: string          ("None" ends the stream)
//! type: string          (e.g. "BoolProperty", "ArrayProperty")
//! size: i32             (declared payload byte count)
//! index: i32
//! <type-specific metadata + one reserved guard byte>
//! <payload: exactly `size` bytes>
//! ```
//!
//! The declared size covers the payload only; metadata is outside it. After
//! every payload the decoder cross-checks consumed-vs-declared bytes. This
//! is the primary structural self-check that catches dispatch mistakes
//! before they desync the rest of the stream.
//!
//! Type-tag strings are resolved to [`PropertyTag`] once at the boundary;
//! all internal dispatch matches exhaustively on the enum.

mod decode;
mod encode;
mod structs;

pub use decode::decode_properties;
pub use encode::encode_properties;
pub use structs::{InventoryItemValue, StructShape, StructValue, MODDED_STRUCT_SHAPES};

use crate::types::ObjectReference;

/// One named, typed field inside an entity's data.
///
/// Insertion order is significant: the encoder writes properties in the
/// order they were decoded (or inserted), and round-trip identity depends
/// on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub index: i32,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            index: 0,
            value,
        }
    }
}

/// Closed set of property type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTag {
    Bool,
    Int8,
    Int,
    Int64,
    UInt32,
    Float,
    Double,
    Byte,
    Enum,
    Str,
    Name,
    Text,
    Object,
    Interface,
    SoftObject,
    Struct,
    Array,
    Set,
    Map,
}

impl PropertyTag {
    /// Resolve a wire tag string. `None` means the tag is unknown (fatal to
    /// the caller).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "BoolProperty" => Self::Bool,
            "Int8Property" => Self::Int8,
            "IntProperty" => Self::Int,
            "Int64Property" => Self::Int64,
            "UInt32Property" => Self::UInt32,
            "FloatProperty" => Self::Float,
            "DoubleProperty" => Self::Double,
            "ByteProperty" => Self::Byte,
            "EnumProperty" => Self::Enum,
            "StrProperty" => Self::Str,
            "NameProperty" => Self::Name,
            "TextProperty" => Self::Text,
            "ObjectProperty" => Self::Object,
            "InterfaceProperty" => Self::Interface,
            "SoftObjectProperty" => Self::SoftObject,
            "StructProperty" => Self::Struct,
            "ArrayProperty" => Self::Array,
            "SetProperty" => Self::Set,
            "MapProperty" => Self::Map,
            _ => return None,
        })
    }

    /// The wire tag string for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BoolProperty",
            Self::Int8 => "Int8Property",
            Self::Int => "IntProperty",
            Self::Int64 => "Int64Property",
            Self::UInt32 => "UInt32Property",
            Self::Float => "FloatProperty",
            Self::Double => "DoubleProperty",
            Self::Byte => "ByteProperty",
            Self::Enum => "EnumProperty",
            Self::Str => "StrProperty",
            Self::Name => "NameProperty",
            Self::Text => "TextProperty",
            Self::Object => "ObjectProperty",
            Self::Interface => "InterfaceProperty",
            Self::SoftObject => "SoftObjectProperty",
            Self::Struct => "StructProperty",
            Self::Array => "ArrayProperty",
            Self::Set => "SetProperty",
            Self::Map => "MapProperty",
        }
    }
}

/// A property value carrying its own wire shape.
///
/// There is deliberately no separate "type descriptor" list: the variant is
/// the type descriptor, so value and type can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int(i32),
    Int64(i64),
    UInt32(u32),
    Float(f32),
    Double(f64),
    Byte(ByteValue),
    Enum {
        enum_type: String,
        value: String,
    },
    Str(String),
    Name(String),
    Text(TextValue),
    Object(ObjectReference),
    Interface(ObjectReference),
    SoftObject(SoftObjectReference),
    Struct {
        shape_name: String,
        value: StructValue,
    },
    Array(ArrayValue),
    Set(SetValue),
    Map(MapValue),
}

impl PropertyValue {
    pub fn tag(&self) -> PropertyTag {
        match self {
            Self::Bool(_) => PropertyTag::Bool,
            Self::Int8(_) => PropertyTag::Int8,
            Self::Int(_) => PropertyTag::Int,
            Self::Int64(_) => PropertyTag::Int64,
            Self::UInt32(_) => PropertyTag::UInt32,
            Self::Float(_) => PropertyTag::Float,
            Self::Double(_) => PropertyTag::Double,
            Self::Byte(_) => PropertyTag::Byte,
            Self::Enum { .. } => PropertyTag::Enum,
            Self::Str(_) => PropertyTag::Str,
            Self::Name(_) => PropertyTag::Name,
            Self::Text(_) => PropertyTag::Text,
            Self::Object(_) => PropertyTag::Object,
            Self::Interface(_) => PropertyTag::Interface,
            Self::SoftObject(_) => PropertyTag::SoftObject,
            Self::Struct { .. } => PropertyTag::Struct,
            Self::Array(_) => PropertyTag::Array,
            Self::Set(_) => PropertyTag::Set,
            Self::Map(_) => PropertyTag::Map,
        }
    }
}

/// A byte property: either a plain octet (enum name "None" on the wire) or a
/// named enum constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ByteValue {
    Plain(u8),
    Enum { enum_type: String, value: String },
}

/// A rich-text property. Two historical sub-encodings survive in real files.
#[derive(Debug, Clone, PartialEq)]
pub struct TextValue {
    pub flags: u32,
    pub variant: TextVariant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextVariant {
    /// History type 0: localized text with namespace/key/source.
    Base {
        namespace: String,
        key: String,
        source: String,
    },
    /// History type 255: culture-invariant (or absent) plain string.
    NoHistory { invariant: Option<String> },
}

/// A soft object reference: a weak path plus a play-in-editor instance id.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftObjectReference {
    pub reference: ObjectReference,
    pub pie_instance: u32,
}

/// A homogeneous array. The variant fixes the element wire tag, so an empty
/// array still re-encodes with the element type it was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Byte(Vec<u8>),
    Int8(Vec<i8>),
    Int(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
    Name(Vec<String>),
    Enum(Vec<String>),
    Object(Vec<ObjectReference>),
    Interface(Vec<ObjectReference>),
    SoftObject(Vec<SoftObjectReference>),
    Struct(StructArray),
}

impl ArrayValue {
    pub fn element_tag(&self) -> &'static str {
        match self {
            Self::Byte(_) => "ByteProperty",
            Self::Int8(_) => "Int8Property",
            Self::Int(_) => "IntProperty",
            Self::Int64(_) => "Int64Property",
            Self::Float(_) => "FloatProperty",
            Self::Double(_) => "DoubleProperty",
            Self::Bool(_) => "BoolProperty",
            Self::Str(_) => "StrProperty",
            Self::Name(_) => "NameProperty",
            Self::Enum(_) => "EnumProperty",
            Self::Object(_) => "ObjectProperty",
            Self::Interface(_) => "InterfaceProperty",
            Self::SoftObject(_) => "SoftObjectProperty",
            Self::Struct(_) => "StructProperty",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Name(v) => v.len(),
            Self::Enum(v) => v.len(),
            Self::Object(v) => v.len(),
            Self::Interface(v) => v.len(),
            Self::SoftObject(v) => v.len(),
            Self::Struct(s) => s.elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Array of struct elements. Carries the inner record header the wire
/// format wraps struct arrays in.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    /// Inner record name (repeats the owning property's name in practice).
    pub inner_name: String,
    pub inner_index: i32,
    pub shape_name: String,
    pub elements: Vec<StructValue>,
}

/// A homogeneous set. The variant fixes the element wire tag.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    UInt32(Vec<u32>),
    /// Observed only as two opaque 64-bit words per element.
    StructPair(Vec<(u64, u64)>),
    Object(Vec<ObjectReference>),
}

impl SetValue {
    pub fn element_tag(&self) -> &'static str {
        match self {
            Self::UInt32(_) => "IntProperty",
            Self::StructPair(_) => "StructProperty",
            Self::Object(_) => "ObjectProperty",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::UInt32(v) => v.len(),
            Self::StructPair(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A typed map. Key and value kinds are stored explicitly so an empty map
/// still re-encodes its original tags.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub key_kind: MapKeyKind,
    pub value_kind: MapValueKind,
    pub entries: Vec<(MapKey, MapVal)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKeyKind {
    Int,
    /// Three packed i32s (a spatial cell key on the wire, tagged "StructProperty").
    IntTriple,
    Name,
    Enum,
    Object,
}

impl MapKeyKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "IntProperty" => Self::Int,
            "StructProperty" => Self::IntTriple,
            "NameProperty" => Self::Name,
            "EnumProperty" => Self::Enum,
            "ObjectProperty" => Self::Object,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Int => "IntProperty",
            Self::IntTriple => "StructProperty",
            Self::Name => "NameProperty",
            Self::Enum => "EnumProperty",
            Self::Object => "ObjectProperty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapValueKind {
    /// A nested None-terminated property list, tagged "StructProperty".
    Properties,
    Int,
    Int64,
    Byte,
    Object,
}

impl MapValueKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "StructProperty" => Self::Properties,
            "IntProperty" => Self::Int,
            "Int64Property" => Self::Int64,
            "ByteProperty" => Self::Byte,
            "ObjectProperty" => Self::Object,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Properties => "StructProperty",
            Self::Int => "IntProperty",
            Self::Int64 => "Int64Property",
            Self::Byte => "ByteProperty",
            Self::Object => "ObjectProperty",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    Int(i32),
    IntTriple(i32, i32, i32),
    Name(String),
    Enum(String),
    Object(ObjectReference),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapVal {
    Properties(Vec<Property>),
    Int(i32),
    Int64(i64),
    Byte(u8),
    Object(ObjectReference),
}

/// Sentinel property name ending every property stream.
pub(crate) const STREAM_END: &str = "None";
