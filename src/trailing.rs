//! Type-specific trailing blocks.
//!
//! After its property stream and zero sentinel, an entity may carry extra
//! binary data whose shape is keyed by the owning header's type path (for
//! actors) or class name (for components). The known shapes form a closed
//! dispatch table; a recognized type with leftover undeclared bytes is the
//! format's single tolerated irregularity and is preserved verbatim.

use crate::cursor::{Cursor, Writer};
use crate::error::Result;
use crate::types::ObjectReference;

/// Byte length of the opaque per-instance physics blob in vehicle trailing
/// data.
pub const VEHICLE_INSTANCE_BYTES: usize = 105;

/// Trailing-block shape selected from a type path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingKind {
    ConveyorBelt,
    ConveyorChainActor,
    WheeledVehicle,
    RailroadVehicle,
    PowerLine,
    CircuitSubsystem,
    LightweightBuildableSubsystem,
    PlayerState,
    /// Connection components write one reserved zero word.
    ReservedZero,
    /// No trailing block expected.
    None,
}

impl TrailingKind {
    /// Classify a header's type path / class name.
    ///
    /// Matching is by path fragment because blueprint class paths embed the
    /// asset folder; the fragments below are stable across game updates.
    pub fn classify(type_path: &str) -> Self {
        if type_path.contains("/Build_ConveyorBeltMk")
            || type_path.contains("/Build_ConveyorLiftMk")
        {
            Self::ConveyorBelt
        } else if type_path.contains("ConveyorChainActor") {
            Self::ConveyorChainActor
        } else if type_path.ends_with("/BP_Truck.BP_Truck_C")
            || type_path.ends_with("/BP_Tractor.BP_Tractor_C")
            || type_path.ends_with("/BP_Explorer.BP_Explorer_C")
            || type_path.ends_with("/BP_Golfcart.BP_Golfcart_C")
        {
            Self::WheeledVehicle
        } else if type_path.ends_with("BP_Locomotive_C") || type_path.ends_with("BP_FreightWagon_C")
        {
            Self::RailroadVehicle
        } else if type_path.contains("/Build_PowerLine") || type_path.contains("/Build_TrainDockingStation")
        {
            Self::PowerLine
        } else if type_path.ends_with(".FGCircuitSubsystem")
            || type_path.ends_with("CircuitSubsystem_C")
        {
            Self::CircuitSubsystem
        } else if type_path.ends_with(".FGLightweightBuildableSubsystem") {
            Self::LightweightBuildableSubsystem
        } else if type_path.ends_with("BP_PlayerState_C") {
            Self::PlayerState
        } else if type_path.ends_with(".FGFactoryConnectionComponent")
            || type_path.ends_with(".FGPipeConnectionComponent")
            || type_path.ends_with(".FGPowerConnectionComponent")
            || type_path.ends_with(".FGRailroadTrackConnectionComponent")
        {
            Self::ReservedZero
        } else {
            Self::None
        }
    }
}

/// One item riding a conveyor segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorItem {
    pub item_type: ObjectReference,
    /// Distance along the belt spline.
    pub position: f32,
}

/// One belt's slice of a conveyor chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSegment {
    pub belt: ObjectReference,
    pub starts_at_length: f32,
    pub ends_at_length: f32,
    pub first_item_index: i32,
    pub last_item_index: i32,
    pub index: i32,
}

/// One instanced lightweight buildable (no dedicated actor in the world).
#[derive(Debug, Clone, PartialEq)]
pub struct LightweightInstance {
    pub rotation: [f64; 4],
    pub position: [f64; 3],
    pub scale: [f64; 3],
    pub primary_color: [f32; 4],
    pub secondary_color: [f32; 4],
    pub swatch: ObjectReference,
    pub recipe: ObjectReference,
}

/// Decoded trailing block.
#[derive(Debug, Clone, PartialEq)]
pub enum TrailingData {
    ConveyorBelt {
        items: Vec<ConveyorItem>,
    },
    ConveyorChain {
        first_belt: ObjectReference,
        last_belt: ObjectReference,
        segments: Vec<ChainSegment>,
        total_length: f32,
        lead_item_index: i32,
        tail_item_index: i32,
    },
    WheeledVehicle {
        /// (instance name, opaque physics blob) pairs.
        instances: Vec<(String, Vec<u8>)>,
    },
    RailroadVehicle {
        coupled_front: ObjectReference,
        coupled_back: ObjectReference,
    },
    PowerLine {
        source: ObjectReference,
        target: ObjectReference,
    },
    CircuitSubsystem {
        circuits: Vec<(u32, ObjectReference)>,
    },
    LightweightBuildableSubsystem {
        instances: Vec<LightweightInstance>,
    },
    PlayerState {
        /// Opaque platform identity blob, size-delimited by the body size.
        blob: Vec<u8>,
    },
    ReservedZero,
    /// Recognized type with bytes the model doesn't cover: preserved
    /// verbatim and reported through the decode diagnostics.
    Unmodeled(Vec<u8>),
    None,
}

impl TrailingData {
    /// Decode the trailing block for `kind`. `body_end` is the absolute end
    /// of the entity body; size-delimited shapes consume up to it.
    pub fn decode(c: &mut Cursor, kind: TrailingKind, body_end: usize) -> Result<Self> {
        match kind {
            TrailingKind::ConveyorBelt => {
                let count = c.read_u32()? as usize;
                let mut items = Vec::with_capacity(count.min(65536));
                for _ in 0..count {
                    items.push(ConveyorItem {
                        item_type: ObjectReference::decode(c)?,
                        position: c.read_f32()?,
                    });
                }
                Ok(Self::ConveyorBelt { items })
            }
            TrailingKind::ConveyorChainActor => {
                let first_belt = ObjectReference::decode(c)?;
                let last_belt = ObjectReference::decode(c)?;
                let count = c.read_u32()? as usize;
                let mut segments = Vec::with_capacity(count.min(65536));
                for _ in 0..count {
                    segments.push(ChainSegment {
                        belt: ObjectReference::decode(c)?,
                        starts_at_length: c.read_f32()?,
                        ends_at_length: c.read_f32()?,
                        first_item_index: c.read_i32()?,
                        last_item_index: c.read_i32()?,
                        index: c.read_i32()?,
                    });
                }
                let total_length = c.read_f32()?;
                let lead_item_index = c.read_i32()?;
                let tail_item_index = c.read_i32()?;
                Ok(Self::ConveyorChain {
                    first_belt,
                    last_belt,
                    segments,
                    total_length,
                    lead_item_index,
                    tail_item_index,
                })
            }
            TrailingKind::WheeledVehicle => {
                let count = c.read_u32()? as usize;
                let mut instances = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    let name = c.read_string()?;
                    let blob = c.read_bytes(VEHICLE_INSTANCE_BYTES)?.to_vec();
                    instances.push((name, blob));
                }
                Ok(Self::WheeledVehicle { instances })
            }
            TrailingKind::RailroadVehicle => Ok(Self::RailroadVehicle {
                coupled_front: ObjectReference::decode(c)?,
                coupled_back: ObjectReference::decode(c)?,
            }),
            TrailingKind::PowerLine => Ok(Self::PowerLine {
                source: ObjectReference::decode(c)?,
                target: ObjectReference::decode(c)?,
            }),
            TrailingKind::CircuitSubsystem => {
                let count = c.read_u32()? as usize;
                let mut circuits = Vec::with_capacity(count.min(65536));
                for _ in 0..count {
                    let id = c.read_u32()?;
                    circuits.push((id, ObjectReference::decode(c)?));
                }
                Ok(Self::CircuitSubsystem { circuits })
            }
            TrailingKind::LightweightBuildableSubsystem => {
                c.expect_u32(0, "lightweight buildable reserved")?;
                let count = c.read_u32()? as usize;
                let mut instances = Vec::with_capacity(count.min(65536));
                for _ in 0..count {
                    let mut rotation = [0.0f64; 4];
                    for v in &mut rotation {
                        *v = c.read_f64()?;
                    }
                    let mut position = [0.0f64; 3];
                    for v in &mut position {
                        *v = c.read_f64()?;
                    }
                    let mut scale = [0.0f64; 3];
                    for v in &mut scale {
                        *v = c.read_f64()?;
                    }
                    let mut primary_color = [0.0f32; 4];
                    for v in &mut primary_color {
                        *v = c.read_f32()?;
                    }
                    let mut secondary_color = [0.0f32; 4];
                    for v in &mut secondary_color {
                        *v = c.read_f32()?;
                    }
                    let swatch = ObjectReference::decode(c)?;
                    let recipe = ObjectReference::decode(c)?;
                    instances.push(LightweightInstance {
                        rotation,
                        position,
                        scale,
                        primary_color,
                        secondary_color,
                        swatch,
                        recipe,
                    });
                }
                Ok(Self::LightweightBuildableSubsystem { instances })
            }
            TrailingKind::PlayerState => {
                let remaining = body_end.saturating_sub(c.position());
                Ok(Self::PlayerState {
                    blob: c.read_bytes(remaining)?.to_vec(),
                })
            }
            TrailingKind::ReservedZero => {
                c.expect_u32(0, "component trailing reserved")?;
                Ok(Self::ReservedZero)
            }
            TrailingKind::None => Ok(Self::None),
        }
    }

    pub fn encode(&self, w: &mut Writer) {
        match self {
            Self::ConveyorBelt { items } => {
                w.write_u32(items.len() as u32);
                for item in items {
                    item.item_type.encode(w);
                    w.write_f32(item.position);
                }
            }
            Self::ConveyorChain {
                first_belt,
                last_belt,
                segments,
                total_length,
                lead_item_index,
                tail_item_index,
            } => {
                first_belt.encode(w);
                last_belt.encode(w);
                w.write_u32(segments.len() as u32);
                for segment in segments {
                    segment.belt.encode(w);
                    w.write_f32(segment.starts_at_length);
                    w.write_f32(segment.ends_at_length);
                    w.write_i32(segment.first_item_index);
                    w.write_i32(segment.last_item_index);
                    w.write_i32(segment.index);
                }
                w.write_f32(*total_length);
                w.write_i32(*lead_item_index);
                w.write_i32(*tail_item_index);
            }
            Self::WheeledVehicle { instances } => {
                w.write_u32(instances.len() as u32);
                for (name, blob) in instances {
                    w.write_string(name);
                    w.write_bytes(blob);
                }
            }
            Self::RailroadVehicle {
                coupled_front,
                coupled_back,
            } => {
                coupled_front.encode(w);
                coupled_back.encode(w);
            }
            Self::PowerLine { source, target } => {
                source.encode(w);
                target.encode(w);
            }
            Self::CircuitSubsystem { circuits } => {
                w.write_u32(circuits.len() as u32);
                for (id, circuit) in circuits {
                    w.write_u32(*id);
                    circuit.encode(w);
                }
            }
            Self::LightweightBuildableSubsystem { instances } => {
                w.write_u32(0);
                w.write_u32(instances.len() as u32);
                for instance in instances {
                    for v in instance.rotation {
                        w.write_f64(v);
                    }
                    for v in instance.position {
                        w.write_f64(v);
                    }
                    for v in instance.scale {
                        w.write_f64(v);
                    }
                    for v in instance.primary_color {
                        w.write_f32(v);
                    }
                    for v in instance.secondary_color {
                        w.write_f32(v);
                    }
                    instance.swatch.encode(w);
                    instance.recipe.encode(w);
                }
            }
            Self::PlayerState { blob } => w.write_bytes(blob),
            Self::ReservedZero => w.write_u32(0),
            Self::Unmodeled(bytes) => w.write_bytes(bytes),
            Self::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_known_paths() {
        assert_eq!(
            TrailingKind::classify(
                "/Game/FactoryGame/Buildable/Factory/ConveyorBeltMk1/Build_ConveyorBeltMk1.Build_ConveyorBeltMk1_C"
            ),
            TrailingKind::ConveyorBelt
        );
        assert_eq!(
            TrailingKind::classify("/Script/FactoryGame.FGConveyorChainActor"),
            TrailingKind::ConveyorChainActor
        );
        assert_eq!(
            TrailingKind::classify("/Game/FactoryGame/Buildable/Vehicle/Truck/BP_Truck.BP_Truck_C"),
            TrailingKind::WheeledVehicle
        );
        assert_eq!(
            TrailingKind::classify("/Script/FactoryGame.FGFactoryConnectionComponent"),
            TrailingKind::ReservedZero
        );
        assert_eq!(
            TrailingKind::classify("/Game/FactoryGame/Buildable/Factory/StorageContainer/Build_StorageContainerMk1.Build_StorageContainerMk1_C"),
            TrailingKind::None
        );
    }

    fn round_trip(data: TrailingData, kind: TrailingKind) -> TrailingData {
        let mut w = Writer::new();
        data.encode(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let back = TrailingData::decode(&mut c, kind, bytes.len()).unwrap();
        assert_eq!(c.remaining(), 0);
        back
    }

    #[test]
    fn conveyor_belt_round_trip() {
        let data = TrailingData::ConveyorBelt {
            items: vec![
                ConveyorItem {
                    item_type: ObjectReference::new("", "/Game/Resource/Desc_IronOre_C"),
                    position: 125.0,
                },
                ConveyorItem {
                    item_type: ObjectReference::new("", "/Game/Resource/Desc_Coal_C"),
                    position: 250.5,
                },
            ],
        };
        assert_eq!(round_trip(data.clone(), TrailingKind::ConveyorBelt), data);
    }

    #[test]
    fn power_line_round_trip() {
        let data = TrailingData::PowerLine {
            source: ObjectReference::new("Persistent_Level", "PowerPole_1.PowerConnection"),
            target: ObjectReference::new("Persistent_Level", "PowerPole_2.PowerConnection"),
        };
        assert_eq!(round_trip(data.clone(), TrailingKind::PowerLine), data);
    }

    #[test]
    fn conveyor_chain_round_trip() {
        let data = TrailingData::ConveyorChain {
            first_belt: ObjectReference::new("Persistent_Level", "Belt_1"),
            last_belt: ObjectReference::new("Persistent_Level", "Belt_3"),
            segments: vec![ChainSegment {
                belt: ObjectReference::new("Persistent_Level", "Belt_1"),
                starts_at_length: 0.0,
                ends_at_length: 400.0,
                first_item_index: 0,
                last_item_index: 11,
                index: 0,
            }],
            total_length: 400.0,
            lead_item_index: 11,
            tail_item_index: 0,
        };
        assert_eq!(
            round_trip(data.clone(), TrailingKind::ConveyorChainActor),
            data
        );
    }

    #[test]
    fn lightweight_buildables_round_trip() {
        let data = TrailingData::LightweightBuildableSubsystem {
            instances: vec![LightweightInstance {
                rotation: [0.0, 0.0, 0.0, 1.0],
                position: [800.0, -400.0, 0.0],
                scale: [1.0, 1.0, 1.0],
                primary_color: [0.95, 0.3, 0.07, 1.0],
                secondary_color: [0.1, 0.1, 0.1, 1.0],
                swatch: ObjectReference::new("", "/Game/Swatches/Swatch_Custom_C"),
                recipe: ObjectReference::new("", "/Game/Recipes/Recipe_Foundation_C"),
            }],
        };
        assert_eq!(
            round_trip(data.clone(), TrailingKind::LightweightBuildableSubsystem),
            data
        );
    }
}
