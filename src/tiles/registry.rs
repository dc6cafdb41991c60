use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use super::types::{TileAnimation, TileDefinition, TileFlags, TileId, TileKind};

/// Tile registry: the static mapping from tile id to tile attributes.
/// Populated once at startup from a JSON descriptor file, read-only after.
#[derive(Resource, Debug, Clone, Default)]
pub struct TileRegistry {
    tiles: HashMap<TileId, TileDefinition>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse tile descriptors: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tile id {0} is negative; ids below zero are reserved for the empty sentinel")]
    NegativeId(TileId),

    #[error("unknown tile flag {0:?}")]
    UnknownFlag(String),

    #[error("unknown tile kind {0:?}")]
    UnknownKind(String),
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Re-registering an id overwrites the previous
    /// entry (last write wins), matching descriptor-reload behavior.
    pub fn define(&mut self, id: TileId, definition: TileDefinition) {
        if self.tiles.insert(id, definition).is_some() {
            debug!("Tile {} redefined, keeping the latest definition", id);
        }
    }

    /// Look up a definition. `None` means the id is unknown; renderers skip
    /// such cells rather than failing the bake.
    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Highest registered id, used to size the GPU-side definition table
    pub fn max_id(&self) -> Option<TileId> {
        self.tiles.keys().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileId, &TileDefinition)> {
        self.tiles.iter()
    }

    /// Build a registry from a JSON descriptor document.
    pub fn from_json(source: &str) -> Result<Self, RegistryError> {
        let document: DescriptorDocument = serde_json::from_str(source)?;
        let mut registry = Self::new();

        for descriptor in document.tiles {
            if descriptor.id < 0 {
                return Err(RegistryError::NegativeId(descriptor.id));
            }

            let kind = match descriptor.kind.as_str() {
                "Autotiled" => TileKind::Autotiled,
                "Monotiled" => TileKind::Monotiled,
                other => return Err(RegistryError::UnknownKind(other.to_string())),
            };

            let mut flags = TileFlags::NONE;
            for name in &descriptor.flags {
                flags.insert(parse_flag(name)?);
            }

            registry.define(
                descriptor.id,
                TileDefinition {
                    sprite: IVec2::new(descriptor.sprite[0], descriptor.sprite[1]),
                    kind,
                    animation: TileAnimation {
                        frame_count: descriptor.animation.frame_count,
                        frame_offset: IVec2::new(
                            descriptor.animation.frame_offset[0],
                            descriptor.animation.frame_offset[1],
                        ),
                        duration_ms: descriptor.animation.duration_ms,
                    },
                    flags,
                },
            );
        }

        Ok(registry)
    }
}

fn parse_flag(name: &str) -> Result<TileFlags, RegistryError> {
    match name {
        "EastBlocked" => Ok(TileFlags::EAST_BLOCKED),
        "WestBlocked" => Ok(TileFlags::WEST_BLOCKED),
        "NorthBlocked" => Ok(TileFlags::NORTH_BLOCKED),
        "SouthBlocked" => Ok(TileFlags::SOUTH_BLOCKED),
        "Obstacle" => Ok(TileFlags::OBSTACLE),
        other => Err(RegistryError::UnknownFlag(other.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct DescriptorDocument {
    tiles: Vec<TileDescriptor>,
}

#[derive(Debug, Deserialize)]
struct TileDescriptor {
    id: TileId,
    kind: String,
    sprite: [i32; 2],
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    animation: AnimationDescriptor,
}

#[derive(Debug, Deserialize, Default)]
struct AnimationDescriptor {
    #[serde(default)]
    frame_count: u32,
    #[serde(default)]
    frame_offset: [i32; 2],
    #[serde(default)]
    duration_ms: u32,
}
