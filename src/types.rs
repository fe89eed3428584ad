use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// A weak reference to another entity: owning level plus the entity's
/// globally unique path name. Both strings empty means "no reference".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectReference {
    pub level_name: String,
    pub path_name: String,
}

impl ObjectReference {
    pub fn new(level_name: impl Into<String>, path_name: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            path_name: path_name.into(),
        }
    }

    /// The null reference (both names empty).
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.level_name.is_empty() && self.path_name.is_empty()
    }

    pub fn decode(c: &mut Cursor) -> Result<Self> {
        let level_name = c.read_string()?;
        let path_name = c.read_string()?;
        Ok(Self {
            level_name,
            path_name,
        })
    }

    pub fn encode(&self, w: &mut Writer) {
        w.write_string(&self.level_name);
        w.write_string(&self.path_name);
    }
}

/// Decode a count-prefixed list of object references.
pub fn decode_reference_list(c: &mut Cursor) -> Result<Vec<ObjectReference>> {
    let count = c.read_u32()? as usize;
    let mut refs = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        refs.push(ObjectReference::decode(c)?);
    }
    Ok(refs)
}

/// Encode a count-prefixed list of object references.
pub fn encode_reference_list(w: &mut Writer, refs: &[ObjectReference]) {
    w.write_u32(refs.len() as u32);
    for r in refs {
        r.encode(w);
    }
}

/// Number of spatial grids in every save file.
pub const GRID_COUNT: usize = 5;

/// A named spatial index: an ordered list of (level name, opaque hex) pairs.
/// Grids are read, stored and rewritten verbatim; nothing interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub name: String,
    pub entries: Vec<(String, u32)>,
}

impl Grid {
    pub fn decode(c: &mut Cursor) -> Result<Self> {
        let name = c.read_string()?;
        let count = c.read_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let level_name = c.read_string()?;
            let hex = c.read_u32()?;
            entries.push((level_name, hex));
        }
        Ok(Self { name, entries })
    }

    pub fn encode(&self, w: &mut Writer) {
        w.write_string(&self.name);
        w.write_u32(self.entries.len() as u32);
        for (level_name, hex) in &self.entries {
            w.write_string(level_name);
            w.write_u32(*hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reference_is_two_empty_strings() {
        let mut w = Writer::new();
        ObjectReference::null().encode(&mut w);
        assert_eq!(w.into_bytes(), vec![0; 8]);
    }

    #[test]
    fn grid_round_trip() {
        let grid = Grid {
            name: "MainGrid".into(),
            entries: vec![("Level_1".into(), 0xDEAD_BEEF), ("Level_2".into(), 7)],
        };
        let mut w = Writer::new();
        grid.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(Grid::decode(&mut c).unwrap(), grid);
        assert_eq!(c.remaining(), 0);
    }
}
