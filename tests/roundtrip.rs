//! Whole-file round-trips over synthetic saves built in code.

use factsave::entity::{ActorOwnership, Entity};
use factsave::header::{SaveHeader, SUPPORTED_HEADER_TYPE, SUPPORTED_SAVE_VERSION};
use factsave::level::Level;
use factsave::object::{ActorHeader, ObjectHeader};
use factsave::property::{Property, PropertyValue};
use factsave::trailing::TrailingData;
use factsave::types::{Grid, ObjectReference, GRID_COUNT};
use factsave::{Error, SaveFile};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample_header() -> SaveHeader {
    SaveHeader {
        header_type: SUPPORTED_HEADER_TYPE,
        save_version: SUPPORTED_SAVE_VERSION,
        build_version: 366_202,
        map_name: "Persistent_Level".into(),
        map_options: "?startloc=Grass".into(),
        session_name: "Round Trip".into(),
        play_duration_seconds: 7200,
        save_timestamp_ticks: 638_600_000_000_000_000,
        session_visibility: false,
        editor_object_version: 46,
        mod_metadata: String::new(),
        is_modded: false,
        save_identifier: "RT01".into(),
        creative_seed: 0xABCD,
        world_seed: 1337,
        cheats_enabled: false,
    }
}

fn sample_grids() -> Vec<Grid> {
    let names = [
        "MainGrid",
        "LandscapeGrid",
        "ExplorationGrid",
        "FoliageGrid",
        "HLOD0_256m_1023m",
    ];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Grid {
            name: (*name).into(),
            entries: vec![("Persistent_Level".into(), 0x1000 + i as u32)],
        })
        .collect()
}

fn actor(type_path: &str, instance: &str) -> ObjectHeader {
    ObjectHeader::Actor(ActorHeader::with_identity_transform(
        type_path,
        "Persistent_Level",
        instance,
    ))
}

fn entity_with(properties: Vec<Property>) -> Entity {
    Entity {
        save_version: SUPPORTED_SAVE_VERSION,
        should_migrate_refs: false,
        actor: Some(ActorOwnership::default()),
        properties,
        trailing: TrailingData::None,
    }
}

/// One actor "X"/"Inst1" with an identity transform and a single false bool
/// property, in the persistent level only.
fn minimal_save() -> SaveFile {
    SaveFile {
        header: sample_header(),
        validation: [0x2A, 0x3B],
        grids: sample_grids(),
        levels: vec![Level {
            name: None,
            headers: vec![actor("X", "Inst1")],
            collectables: None,
            entities: vec![entity_with(vec![Property::new(
                "IsUndefined",
                PropertyValue::Bool(false),
            )])],
            collectables_post: Vec::new(),
        }],
        extra_references: Vec::new(),
    }
}

#[test]
fn minimal_save_round_trip() {
    init_logging();
    let save = minimal_save();
    let bytes = save.to_bytes().unwrap();
    let (back, diag) = SaveFile::parse(&bytes).unwrap();

    assert_eq!(back.levels.len(), 1);
    let level = back.persistent_level().unwrap();
    assert_eq!(level.name, None);
    assert_eq!(level.headers.len(), 1);
    assert_eq!(level.headers[0].type_path(), "X");
    assert_eq!(level.headers[0].instance_name(), "Inst1");
    let prop = &level.entities[0].properties[0];
    assert_eq!(prop.name, "IsUndefined");
    assert_eq!(prop.value, PropertyValue::Bool(false));
    assert!(diag.unmodeled_trailing.is_empty());

    assert_eq!(back, save);
    // Same value, same bytes.
    assert_eq!(back.to_bytes().unwrap(), bytes);
}

#[test]
fn multi_level_save_round_trip() {
    init_logging();
    let mut save = minimal_save();
    save.levels.insert(
        0,
        Level {
            name: Some("Level_Quarry".into()),
            headers: vec![actor(
                "/Game/Build_Miner.Build_Miner_C",
                "Level_Quarry:PersistentLevel.Build_Miner_C_1",
            )],
            collectables: Some(vec![ObjectReference::new("Level_Quarry", "Slug_1")]),
            entities: vec![entity_with(vec![Property::new(
                "mExtractionRate",
                PropertyValue::Float(120.0),
            )])],
            collectables_post: vec![ObjectReference::new("Level_Quarry", "Slug_1")],
        },
    );
    save.extra_references = vec![ObjectReference::new(
        "Persistent_Level",
        "Persistent_Level:PersistentLevel.GameState",
    )];

    let bytes = save.to_bytes().unwrap();
    let (back, _) = SaveFile::parse(&bytes).unwrap();
    assert_eq!(back, save);
    // The oversized header section on the named level signals its
    // collectables list; it must come back parsed, not as an error.
    assert_eq!(
        back.levels[0].collectables,
        Some(vec![ObjectReference::new("Level_Quarry", "Slug_1")])
    );
    assert_eq!(back.to_bytes().unwrap(), bytes);
}

#[test]
fn write_verified_accepts_consistent_save() {
    let save = minimal_save();
    assert_eq!(save.write_verified().unwrap(), save.to_bytes().unwrap());
}

#[test]
fn wrong_header_type_fails_before_body() {
    let mut bytes = minimal_save().to_bytes().unwrap();
    bytes[0..4].copy_from_slice(&12i32.to_le_bytes());
    // Also stomp the compressed body so any attempt to read it would fail
    // loudly; the gate must fire first.
    let n = bytes.len();
    for b in &mut bytes[n - 16..] {
        *b = 0xFF;
    }
    assert!(matches!(
        SaveFile::parse(&bytes),
        Err(Error::UnsupportedHeader {
            field: "header type",
            found: 12,
            ..
        })
    ));
}

#[test]
fn wrong_save_version_fails_before_body() {
    let mut bytes = minimal_save().to_bytes().unwrap();
    bytes[4..8].copy_from_slice(&45i32.to_le_bytes());
    assert!(matches!(
        SaveFile::parse(&bytes),
        Err(Error::UnsupportedHeader {
            field: "save version",
            found: 45,
            ..
        })
    ));
}

#[test]
fn corrupt_body_size_is_fatal() {
    use factsave::chunk::{compress_chunks, decompress_chunks};
    use factsave::cursor::{Cursor, Writer};

    let save = minimal_save();
    let bytes = save.to_bytes().unwrap();

    // Split header from chunked body by re-decoding the header.
    let mut c = Cursor::new(&bytes);
    SaveHeader::decode(&mut c).unwrap();
    let header_len = c.position();

    let mut body = decompress_chunks(&bytes[header_len..]).unwrap();
    let declared = u64::from_le_bytes(body[..8].try_into().unwrap());
    body[..8].copy_from_slice(&(declared - 1).to_le_bytes());

    let mut w = Writer::new();
    w.write_bytes(&bytes[..header_len]);
    w.write_bytes(&compress_chunks(&body).unwrap());
    let err = SaveFile::parse(&w.into_bytes()).unwrap_err();
    // Truncating the declared body size chops the tail off the level data;
    // decode must fail with a size error somewhere, never succeed.
    assert!(matches!(
        err,
        Error::SizeMismatch { .. } | Error::UnexpectedEof { .. }
    ));
}

#[test]
fn encode_rejects_misplaced_persistent_level() {
    let mut save = minimal_save();
    // Give the persistent level a name so no level qualifies as persistent.
    save.levels[0].name = Some("Level_Oops".into());
    assert!(matches!(
        save.to_bytes(),
        Err(Error::Parse { context: "save", .. })
    ));
}

#[test]
fn encode_rejects_wrong_grid_count() {
    let mut save = minimal_save();
    save.grids.pop();
    assert_eq!(save.grids.len(), GRID_COUNT - 1);
    assert!(matches!(
        save.to_bytes(),
        Err(Error::Parse { context: "save", .. })
    ));
}
