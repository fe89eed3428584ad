use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};

/// Wire tag introducing an actor header.
const TAG_ACTOR: u32 = 1;
/// Wire tag introducing a component header.
const TAG_COMPONENT: u32 = 0;

/// Header of a placed, transform-bearing entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorHeader {
    /// Class identity, e.g. `/Game/FactoryGame/.../Build_ConveyorBeltMk1.Build_ConveyorBeltMk1_C`.
    pub type_path: String,
    /// Name of the level that owns this actor.
    pub root_object: String,
    /// Globally unique instance key.
    pub instance_name: String,
    pub needs_transform: bool,
    /// Rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub was_placed_in_level: bool,
}

/// Header of a sub-entity owned by a parent actor. No transform of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentHeader {
    pub class_name: String,
    pub root_object: String,
    pub instance_name: String,
    /// Instance name of the owning actor (a back-reference, not ownership).
    pub parent_actor_name: String,
}

/// A typed entity header. The wire tag selects the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectHeader {
    Actor(ActorHeader),
    Component(ComponentHeader),
}

impl ObjectHeader {
    pub fn decode(c: &mut Cursor) -> Result<Self> {
        let offset = c.position();
        let tag = c.read_u32()?;
        match tag {
            TAG_ACTOR => Ok(Self::Actor(ActorHeader::decode(c)?)),
            TAG_COMPONENT => Ok(Self::Component(ComponentHeader::decode(c)?)),
            other => Err(Error::UnknownType {
                category: "object header tag",
                name: other.to_string(),
                offset,
            }),
        }
    }

    pub fn encode(&self, w: &mut Writer) {
        match self {
            Self::Actor(actor) => {
                w.write_u32(TAG_ACTOR);
                actor.encode(w);
            }
            Self::Component(component) => {
                w.write_u32(TAG_COMPONENT);
                component.encode(w);
            }
        }
    }

    /// Class identity used for trailing-block dispatch.
    pub fn type_path(&self) -> &str {
        match self {
            Self::Actor(a) => &a.type_path,
            Self::Component(c) => &c.class_name,
        }
    }

    /// Globally unique instance key; must match the paired entity body.
    pub fn instance_name(&self) -> &str {
        match self {
            Self::Actor(a) => &a.instance_name,
            Self::Component(c) => &c.instance_name,
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self, Self::Actor(_))
    }
}

impl ActorHeader {
    fn decode(c: &mut Cursor) -> Result<Self> {
        let type_path = c.read_string()?;
        let root_object = c.read_string()?;
        let instance_name = c.read_string()?;
        let needs_transform = c.read_bool_u32()?;
        let mut rotation = [0.0f32; 4];
        for v in &mut rotation {
            *v = c.read_f32()?;
        }
        let mut position = [0.0f32; 3];
        for v in &mut position {
            *v = c.read_f32()?;
        }
        let mut scale = [0.0f32; 3];
        for v in &mut scale {
            *v = c.read_f32()?;
        }
        let was_placed_in_level = c.read_bool_u32()?;
        Ok(Self {
            type_path,
            root_object,
            instance_name,
            needs_transform,
            rotation,
            position,
            scale,
            was_placed_in_level,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.write_string(&self.type_path);
        w.write_string(&self.root_object);
        w.write_string(&self.instance_name);
        w.write_bool_u32(self.needs_transform);
        for v in self.rotation {
            w.write_f32(v);
        }
        for v in self.position {
            w.write_f32(v);
        }
        for v in self.scale {
            w.write_f32(v);
        }
        w.write_bool_u32(self.was_placed_in_level);
    }

    /// An actor at the origin with identity rotation and unit scale.
    pub fn with_identity_transform(
        type_path: impl Into<String>,
        root_object: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            type_path: type_path.into(),
            root_object: root_object.into(),
            instance_name: instance_name.into(),
            needs_transform: false,
            rotation: [0.0, 0.0, 0.0, 1.0],
            position: [0.0; 3],
            scale: [1.0; 3],
            was_placed_in_level: true,
        }
    }
}

impl ComponentHeader {
    fn decode(c: &mut Cursor) -> Result<Self> {
        let class_name = c.read_string()?;
        let root_object = c.read_string()?;
        let instance_name = c.read_string()?;
        let parent_actor_name = c.read_string()?;
        Ok(Self {
            class_name,
            root_object,
            instance_name,
            parent_actor_name,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.write_string(&self.class_name);
        w.write_string(&self.root_object);
        w.write_string(&self.instance_name);
        w.write_string(&self.parent_actor_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_header_round_trip() {
        let header = ObjectHeader::Actor(ActorHeader {
            type_path: "/Game/Build_Foundation.Build_Foundation_C".into(),
            root_object: "Persistent_Level".into(),
            instance_name: "Persistent_Level:PersistentLevel.Build_Foundation_C_1".into(),
            needs_transform: true,
            rotation: [0.0, 0.0, 0.7071, 0.7071],
            position: [100.0, -200.0, 300.0],
            scale: [1.0, 1.0, 1.0],
            was_placed_in_level: false,
        });
        let mut w = Writer::new();
        header.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(ObjectHeader::decode(&mut c).unwrap(), header);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn component_header_round_trip() {
        let header = ObjectHeader::Component(ComponentHeader {
            class_name: "/Script/FactoryGame.FGInventoryComponent".into(),
            root_object: "Persistent_Level".into(),
            instance_name: "Persistent_Level:PersistentLevel.Char_Player_C_0.inventory".into(),
            parent_actor_name: "Persistent_Level:PersistentLevel.Char_Player_C_0".into(),
        });
        let mut w = Writer::new();
        header.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(ObjectHeader::decode(&mut c).unwrap(), header);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let mut w = Writer::new();
        w.write_u32(2);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert!(matches!(
            ObjectHeader::decode(&mut c),
            Err(Error::UnknownType {
                category: "object header tag",
                ..
            })
        ));
    }
}
