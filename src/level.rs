use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::entity::Entity;
use crate::object::ObjectHeader;
use crate::save::Diagnostics;
use crate::types::{decode_reference_list, encode_reference_list, ObjectReference};

/// A named partition of entities.
///
/// `headers[i]` and `entities[i]` describe the same object; the codec
/// enforces equal counts on the wire and decodes them in lockstep. The
/// distinguished persistent level has no name of its own and no trailing
/// collectables list.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// `None` for the persistent level.
    pub name: Option<String>,
    pub headers: Vec<ObjectHeader>,
    /// First collectables list. Present on the wire only when the declared
    /// header-section size extends past the header list; `None` and
    /// `Some(vec![])` therefore encode differently.
    pub collectables: Option<Vec<ObjectReference>>,
    pub entities: Vec<Entity>,
    /// Second collectables list; always empty for the persistent level.
    pub collectables_post: Vec<ObjectReference>,
}

impl Level {
    pub fn is_persistent(&self) -> bool {
        self.name.is_none()
    }

    /// Decode one level section.
    ///
    /// Both declared section sizes are hard cross-checks: a mismatch in
    /// either means a header or entity decoder consumed the wrong number of
    /// bytes, and continuing would desync every level that follows.
    pub fn decode(c: &mut Cursor, persistent: bool, diag: &mut Diagnostics) -> Result<Self> {
        let name = if persistent {
            None
        } else {
            Some(c.read_string()?)
        };

        let header_section_size = c.read_u64()?;
        let section_start = c.position();
        // Bounds-check the declared size before using it in offset math so
        // a bogus u64 cannot wrap the section end.
        if header_section_size > c.remaining() as u64 {
            return Err(Error::UnexpectedEof {
                offset: section_start,
                need: header_section_size as usize,
                have: c.remaining(),
            });
        }
        let section_end = section_start + header_section_size as usize;

        let header_count = c.read_u32()? as usize;
        let mut headers = Vec::with_capacity(header_count.min(65536));
        for _ in 0..header_count {
            headers.push(ObjectHeader::decode(c)?);
        }

        // A section that extends past the header list signals a collectables
        // list (its count prefix plus content account for the delta).
        let collectables = if c.position() < section_end {
            Some(decode_reference_list(c)?)
        } else {
            None
        };

        let consumed = (c.position() - section_start) as u64;
        if consumed != header_section_size {
            return Err(Error::SizeMismatch {
                context: "level header section",
                declared: header_section_size,
                actual: consumed,
                offset: c.position(),
            });
        }

        let objects_section_size = c.read_u64()?;
        let objects_start = c.position();

        let object_count = c.read_u32()? as usize;
        if object_count != header_count {
            return Err(Error::Parse {
                context: "level",
                message: format!(
                    "object count {object_count} does not match header count {header_count}"
                ),
            });
        }
        let mut entities = Vec::with_capacity(object_count.min(65536));
        for header in &headers {
            entities.push(Entity::decode(c, header, diag)?);
        }

        let consumed = (c.position() - objects_start) as u64;
        if consumed != objects_section_size {
            return Err(Error::SizeMismatch {
                context: "level object section",
                declared: objects_section_size,
                actual: consumed,
                offset: c.position(),
            });
        }

        let collectables_post = if persistent {
            Vec::new()
        } else {
            decode_reference_list(c)?
        };

        Ok(Self {
            name,
            headers,
            collectables,
            entities,
            collectables_post,
        })
    }

    /// Encode one level section. Both section sizes are recomputed from the
    /// bytes actually written, never reused from decode, so structural edits
    /// stay self-consistent.
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        if self.headers.len() != self.entities.len() {
            return Err(Error::Parse {
                context: "level",
                message: format!(
                    "cannot encode level with {} headers but {} entities",
                    self.headers.len(),
                    self.entities.len()
                ),
            });
        }

        if let Some(name) = &self.name {
            w.write_string(name);
        }

        let header_size_pos = w.position();
        w.write_u64(0); // patched below
        let section_start = w.position();
        w.write_u32(self.headers.len() as u32);
        for header in &self.headers {
            header.encode(w);
        }
        if let Some(collectables) = &self.collectables {
            encode_reference_list(w, collectables);
        }
        w.patch_u64(header_size_pos, (w.position() - section_start) as u64);

        let objects_size_pos = w.position();
        w.write_u64(0); // patched below
        let objects_start = w.position();
        w.write_u32(self.entities.len() as u32);
        for entity in &self.entities {
            entity.encode(w);
        }
        w.patch_u64(objects_size_pos, (w.position() - objects_start) as u64);

        if self.name.is_some() {
            encode_reference_list(w, &self.collectables_post);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ActorHeader;
    use crate::property::{Property, PropertyValue};
    use crate::entity::ActorOwnership;
    use crate::trailing::TrailingData;

    fn sample_entity() -> Entity {
        Entity {
            save_version: 46,
            should_migrate_refs: false,
            actor: Some(ActorOwnership::default()),
            properties: vec![Property::new("mHealth", PropertyValue::Float(100.0))],
            trailing: TrailingData::None,
        }
    }

    fn sample_level(name: Option<&str>) -> Level {
        Level {
            name: name.map(str::to_string),
            headers: vec![ObjectHeader::Actor(ActorHeader::with_identity_transform(
                "/Game/Build_Foundation.Build_Foundation_C",
                "Persistent_Level",
                "Persistent_Level:PersistentLevel.Build_Foundation_C_1",
            ))],
            collectables: None,
            entities: vec![sample_entity()],
            collectables_post: Vec::new(),
        }
    }

    fn round_trip(level: Level, persistent: bool) -> Level {
        let mut w = Writer::new();
        level.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        let back = Level::decode(&mut c, persistent, &mut diag).unwrap();
        assert_eq!(c.remaining(), 0);
        back
    }

    #[test]
    fn named_level_round_trip() {
        let mut level = sample_level(Some("Level_Quarry"));
        level.collectables_post = vec![ObjectReference::new("Level_Quarry", "Pickup_3")];
        assert_eq!(round_trip(level.clone(), false), level);
    }

    #[test]
    fn persistent_level_has_no_name_and_no_post_collectables() {
        let level = sample_level(None);
        let mut w = Writer::new();
        level.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        // First field is the header section size, not a level name string.
        let first = u64::from_le_bytes(bytes[..8].try_into().unwrap());
        assert!(first > 0 && first < bytes.len() as u64);
        assert_eq!(round_trip(level.clone(), true), level);
    }

    #[test]
    fn oversized_header_section_signals_collectables() {
        // A declared header-section size extending past the header list
        // means a collectables list follows; decode parses it, not an error.
        let mut level = sample_level(Some("Level_Caves"));
        level.collectables = Some(vec![ObjectReference::new("Level_Caves", "Slug_1")]);
        let back = round_trip(level.clone(), false);
        assert_eq!(back.collectables, level.collectables);
    }

    #[test]
    fn empty_collectables_list_still_round_trips_as_present() {
        let mut level = sample_level(Some("Level_Dunes"));
        level.collectables = Some(Vec::new());
        assert_eq!(round_trip(level.clone(), false), level);
    }

    #[test]
    fn corrupt_header_section_size_is_fatal() {
        let level = sample_level(Some("Level_Quarry"));
        let mut w = Writer::new();
        level.encode(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        // The u64 section size sits right after the name string.
        let size_pos = 4 + "Level_Quarry".len() + 1;
        let declared = u64::from_le_bytes(bytes[size_pos..size_pos + 8].try_into().unwrap());
        bytes[size_pos..size_pos + 8].copy_from_slice(&(declared + 4).to_le_bytes());
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        // The inflated size makes the decoder read a bogus collectables
        // list, which either desyncs into a read error or fails the section
        // cross-check; it must never succeed silently.
        assert!(Level::decode(&mut c, false, &mut diag).is_err());
    }

    #[test]
    fn huge_header_section_size_is_eof_not_overflow() {
        let level = sample_level(Some("Level_Quarry"));
        let mut w = Writer::new();
        level.encode(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        let size_pos = 4 + "Level_Quarry".len() + 1;
        bytes[size_pos..size_pos + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let mut c = Cursor::new(&bytes);
        let mut diag = Diagnostics::default();
        assert!(matches!(
            Level::decode(&mut c, false, &mut diag),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn mismatched_counts_refuse_to_encode() {
        let mut level = sample_level(Some("Level_Quarry"));
        level.entities.push(sample_entity());
        let mut w = Writer::new();
        assert!(matches!(
            level.encode(&mut w),
            Err(Error::Parse { context: "level", .. })
        ));
    }
}
