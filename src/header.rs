use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};

/// Header type this build reads and writes. Anything else fails immediately.
pub const SUPPORTED_HEADER_TYPE: i32 = 13;
/// Save version this build reads and writes. Anything else fails immediately.
pub const SUPPORTED_SAVE_VERSION: i32 = 46;

/// Pinned values of the two reserved header words.
pub const HEADER_RESERVED_1: u32 = 1;
pub const HEADER_RESERVED_2: u32 = 0;

/// Timestamps are stored as 100 ns ticks since 0001-01-01 (proleptic
/// Gregorian). Seconds between that epoch and 1970-01-01.
pub const EPOCH_OFFSET_SECONDS: i64 = 62_135_596_800;
/// Ticks per second in the stored timestamp.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// The uncompressed save header.
///
/// Parsed before anything else; the header-type and save-version fields are a
/// hard compatibility gate. Collaborators may edit `session_name` and the
/// timestamp before re-encoding; everything else is treated as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveHeader {
    pub header_type: i32,
    pub save_version: i32,
    pub build_version: i32,
    pub map_name: String,
    pub map_options: String,
    pub session_name: String,
    pub play_duration_seconds: i32,
    /// 100 ns ticks since 0001-01-01. See [`SaveHeader::timestamp_unix_seconds`].
    pub save_timestamp_ticks: i64,
    pub session_visibility: bool,
    pub editor_object_version: i32,
    pub mod_metadata: String,
    pub is_modded: bool,
    pub save_identifier: String,
    pub creative_seed: u64,
    pub world_seed: u64,
    pub cheats_enabled: bool,
}

impl SaveHeader {
    /// Parse the header and enforce the version gate.
    ///
    /// The gate fires before any other field is touched, so an unsupported
    /// file never reaches the chunk or level layers.
    pub fn decode(c: &mut Cursor) -> Result<Self> {
        let header_type = c.read_i32()?;
        if header_type != SUPPORTED_HEADER_TYPE {
            return Err(Error::UnsupportedHeader {
                field: "header type",
                found: header_type,
                supported: SUPPORTED_HEADER_TYPE,
            });
        }
        let save_version = c.read_i32()?;
        if save_version != SUPPORTED_SAVE_VERSION {
            return Err(Error::UnsupportedHeader {
                field: "save version",
                found: save_version,
                supported: SUPPORTED_SAVE_VERSION,
            });
        }
        let build_version = c.read_i32()?;
        let map_name = c.read_string()?;
        let map_options = c.read_string()?;
        let session_name = c.read_string()?;
        let play_duration_seconds = c.read_i32()?;
        let save_timestamp_ticks = c.read_i64()?;
        let session_visibility = c.read_bool_u8()?;
        let editor_object_version = c.read_i32()?;
        let mod_metadata = c.read_string()?;
        let is_modded = c.read_bool_u32()?;
        let save_identifier = c.read_string()?;
        c.expect_u32(HEADER_RESERVED_1, "header reserved word 1")?;
        c.expect_u32(HEADER_RESERVED_2, "header reserved word 2")?;
        let creative_seed = c.read_u64()?;
        let world_seed = c.read_u64()?;
        let cheats_enabled = c.read_bool_u32()?;
        Ok(Self {
            header_type,
            save_version,
            build_version,
            map_name,
            map_options,
            session_name,
            play_duration_seconds,
            save_timestamp_ticks,
            session_visibility,
            editor_object_version,
            mod_metadata,
            is_modded,
            save_identifier,
            creative_seed,
            world_seed,
            cheats_enabled,
        })
    }

    pub fn encode(&self, w: &mut Writer) {
        w.write_i32(self.header_type);
        w.write_i32(self.save_version);
        w.write_i32(self.build_version);
        w.write_string(&self.map_name);
        w.write_string(&self.map_options);
        w.write_string(&self.session_name);
        w.write_i32(self.play_duration_seconds);
        w.write_i64(self.save_timestamp_ticks);
        w.write_bool_u8(self.session_visibility);
        w.write_i32(self.editor_object_version);
        w.write_string(&self.mod_metadata);
        w.write_bool_u32(self.is_modded);
        w.write_string(&self.save_identifier);
        w.write_u32(HEADER_RESERVED_1);
        w.write_u32(HEADER_RESERVED_2);
        w.write_u64(self.creative_seed);
        w.write_u64(self.world_seed);
        w.write_bool_u32(self.cheats_enabled);
    }

    /// The save timestamp as Unix seconds.
    pub fn timestamp_unix_seconds(&self) -> i64 {
        self.save_timestamp_ticks / TICKS_PER_SECOND - EPOCH_OFFSET_SECONDS
    }

    /// Set the save timestamp from Unix seconds.
    pub fn set_timestamp_unix_seconds(&mut self, unix_seconds: i64) {
        self.save_timestamp_ticks = (unix_seconds + EPOCH_OFFSET_SECONDS) * TICKS_PER_SECOND;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_header() -> SaveHeader {
        SaveHeader {
            header_type: SUPPORTED_HEADER_TYPE,
            save_version: SUPPORTED_SAVE_VERSION,
            build_version: 366_202,
            map_name: "Persistent_Level".into(),
            map_options: "?startloc=Grass".into(),
            session_name: "My Session".into(),
            play_duration_seconds: 3600,
            save_timestamp_ticks: (EPOCH_OFFSET_SECONDS + 1_700_000_000) * TICKS_PER_SECOND,
            session_visibility: false,
            editor_object_version: 46,
            mod_metadata: String::new(),
            is_modded: false,
            save_identifier: "ABC123".into(),
            creative_seed: 0x1234_5678_9ABC_DEF0,
            world_seed: 42,
            cheats_enabled: false,
        }
    }

    #[test]
    fn header_round_trip() {
        let header = sample_header();
        let mut w = Writer::new();
        header.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(SaveHeader::decode(&mut c).unwrap(), header);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn wrong_header_type_is_rejected_first() {
        let mut w = Writer::new();
        w.write_i32(12);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let err = SaveHeader::decode(&mut c).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedHeader {
                field: "header type",
                found: 12,
                supported: SUPPORTED_HEADER_TYPE,
            }
        ));
    }

    #[test]
    fn wrong_save_version_is_rejected() {
        let mut w = Writer::new();
        w.write_i32(SUPPORTED_HEADER_TYPE);
        w.write_i32(45);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let err = SaveHeader::decode(&mut c).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedHeader {
                field: "save version",
                found: 45,
                ..
            }
        ));
    }

    #[test]
    fn timestamp_conversion_is_inverse() {
        let mut header = sample_header();
        header.set_timestamp_unix_seconds(1_724_457_600);
        assert_eq!(header.timestamp_unix_seconds(), 1_724_457_600);
    }
}
