use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::object::ObjectHeader;
use crate::property::{decode_properties, encode_properties, Property};
use crate::save::Diagnostics;
use crate::trailing::{TrailingData, TrailingKind};
use crate::types::ObjectReference;

/// Parent/component association carried by actor-backed entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActorOwnership {
    pub parent: ObjectReference,
    pub components: Vec<ObjectReference>,
}

/// The property-bearing data record paired 1:1 with an actor or component
/// header. The pairing (and the instance name) lives in the header; an
/// entity is meaningless without it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub save_version: i32,
    pub should_migrate_refs: bool,
    /// Present exactly when the paired header is an actor header.
    pub actor: Option<ActorOwnership>,
    pub properties: Vec<Property>,
    pub trailing: TrailingData,
}

impl Entity {
    /// A minimal entity body for the given header kind.
    pub fn empty(is_actor: bool, save_version: i32) -> Self {
        Self {
            save_version,
            should_migrate_refs: false,
            actor: is_actor.then(ActorOwnership::default),
            properties: Vec::new(),
            trailing: TrailingData::None,
        }
    }

    /// Decode one entity body against its paired header.
    ///
    /// The declared body size is enforced exactly: over-consumption means a
    /// dispatch case read too much, leftover bytes on a known type mean one
    /// is missing or wrong. Both are fatal. The single tolerance is leftover
    /// bytes on a type with no known trailing shape, which are preserved
    /// verbatim and reported through `diag` (third-party tools are known to
    /// append harmless padding).
    pub fn decode(c: &mut Cursor, header: &ObjectHeader, diag: &mut Diagnostics) -> Result<Self> {
        let save_version = c.read_i32()?;
        let should_migrate_refs = c.read_bool_u32()?;
        let raw_size = c.read_i32()?;
        let declared_size = usize::try_from(raw_size).map_err(|_| Error::Parse {
            context: "entity body",
            message: format!("negative declared size {raw_size}"),
        })?;
        let body_start = c.position();
        let body_end = body_start + declared_size;

        let actor = if header.is_actor() {
            let parent = ObjectReference::decode(c)?;
            let count = c.read_u32()? as usize;
            let mut components = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                components.push(ObjectReference::decode(c)?);
            }
            Some(ActorOwnership { parent, components })
        } else {
            None
        };

        let properties = decode_properties(c)?;
        c.expect_u32(0, "entity property sentinel")?;

        let kind = TrailingKind::classify(header.type_path());
        let trailing = if kind == TrailingKind::None && c.position() < body_end {
            let leftover = body_end - c.position();
            log::warn!(
                "entity {}: {} unmodeled trailing bytes for type {}",
                header.instance_name(),
                leftover,
                header.type_path()
            );
            diag.unmodeled_trailing.push(header.type_path().to_string());
            TrailingData::Unmodeled(c.read_bytes(leftover)?.to_vec())
        } else {
            TrailingData::decode(c, kind, body_end)?
        };

        let actual = c.position() - body_start;
        if actual != declared_size {
            return Err(Error::SizeMismatch {
                context: "entity body",
                declared: declared_size as u64,
                actual: actual as u64,
                offset: c.position(),
            });
        }

        Ok(Self {
            save_version,
            should_migrate_refs,
            actor,
            properties,
            trailing,
        })
    }

    /// Encode one entity body; the declared size is recomputed and
    /// backpatched from the bytes actually written.
    pub fn encode(&self, w: &mut Writer) {
        w.write_i32(self.save_version);
        w.write_bool_u32(self.should_migrate_refs);
        let size_pos = w.position();
        w.write_i32(0); // patched below
        let body_start = w.position();

        if let Some(ownership) = &self.actor {
            ownership.parent.encode(w);
            w.write_u32(ownership.components.len() as u32);
            for component in &ownership.components {
                component.encode(w);
            }
        }

        encode_properties(w, &self.properties);
        w.write_u32(0);
        self.trailing.encode(w);

        w.patch_i32(size_pos, (w.position() - body_start) as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ActorHeader;
    use crate::property::PropertyValue;
    use crate::trailing::ConveyorItem;

    fn actor_header(type_path: &str) -> ObjectHeader {
        ObjectHeader::Actor(ActorHeader::with_identity_transform(
            type_path,
            "Persistent_Level",
            "Persistent_Level:PersistentLevel.Test_1",
        ))
    }

    fn round_trip(entity: Entity, header: &ObjectHeader) -> (Entity, Diagnostics) {
        let mut w = Writer::new();
        entity.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        let back = Entity::decode(&mut c, header, &mut diag).unwrap();
        assert_eq!(c.remaining(), 0);
        (back, diag)
    }

    #[test]
    fn actor_entity_round_trip() {
        let header = actor_header("/Game/Build_Smelter.Build_Smelter_C");
        let entity = Entity {
            save_version: 46,
            should_migrate_refs: false,
            actor: Some(ActorOwnership {
                parent: ObjectReference::null(),
                components: vec![ObjectReference::new(
                    "Persistent_Level",
                    "Persistent_Level:PersistentLevel.Test_1.InputInventory",
                )],
            }),
            properties: vec![Property::new("mIsProducing", PropertyValue::Bool(true))],
            trailing: TrailingData::None,
        };
        let (back, diag) = round_trip(entity.clone(), &header);
        assert_eq!(back, entity);
        assert!(diag.unmodeled_trailing.is_empty());
    }

    #[test]
    fn conveyor_entity_carries_item_list() {
        let header = actor_header(
            "/Game/FactoryGame/Buildable/Factory/ConveyorBeltMk1/Build_ConveyorBeltMk1.Build_ConveyorBeltMk1_C",
        );
        let entity = Entity {
            save_version: 46,
            should_migrate_refs: false,
            actor: Some(ActorOwnership::default()),
            properties: vec![],
            trailing: TrailingData::ConveyorBelt {
                items: vec![ConveyorItem {
                    item_type: ObjectReference::new("", "/Game/Resource/Desc_IronPlate_C"),
                    position: 37.5,
                }],
            },
        };
        let (back, _) = round_trip(entity.clone(), &header);
        assert_eq!(back, entity);
    }

    #[test]
    fn unmodeled_trailing_bytes_are_preserved_and_reported() {
        let header = actor_header("/Mods/ThirdParty/Build_Widget.Build_Widget_C");
        let entity = Entity {
            save_version: 46,
            should_migrate_refs: false,
            actor: Some(ActorOwnership::default()),
            properties: vec![],
            trailing: TrailingData::Unmodeled(vec![0xAA, 0xBB, 0xCC]),
        };
        let (back, diag) = round_trip(entity.clone(), &header);
        assert_eq!(back, entity);
        assert_eq!(
            diag.unmodeled_trailing,
            vec!["/Mods/ThirdParty/Build_Widget.Build_Widget_C".to_string()]
        );
    }

    #[test]
    fn negative_body_size_is_fatal() {
        let header = actor_header("/Game/Build_Smelter.Build_Smelter_C");
        let entity = Entity::empty(true, 46);
        let mut w = Writer::new();
        entity.encode(&mut w);
        let mut bytes = w.into_bytes();
        // A negative declared size must be rejected outright, not
        // sign-extended into a huge body end.
        bytes[8..12].copy_from_slice(&(-1i32).to_le_bytes());
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        assert!(matches!(
            Entity::decode(&mut c, &header, &mut diag),
            Err(Error::Parse {
                context: "entity body",
                ..
            })
        ));
    }

    #[test]
    fn truncated_body_size_is_fatal() {
        let header = actor_header("/Game/Build_Smelter.Build_Smelter_C");
        let entity = Entity::empty(true, 46);
        let mut w = Writer::new();
        entity.encode(&mut w);
        let mut bytes = w.into_bytes();
        // Shrink the declared body size by one; the decoder must notice the
        // mismatch rather than silently desync.
        let declared = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
        bytes[8..12].copy_from_slice(&(declared - 1).to_le_bytes());
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        let err = Entity::decode(&mut c, &header, &mut diag).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                context: "entity body",
                ..
            }
        ));
    }
}
