//! Player control.
//!
//! Movement is read as held keys so a held direction chains steps back
//! to back; the motion component itself refuses inputs mid-step. Entry
//! into a cell is vetoed by the flags of any tile stacked in it.

use bevy::prelude::*;

use crate::tiles::{TileRegistry, CHUNK_DEPTH, TILE_EMPTY, TILE_WALL};
use crate::world::{world_to_tile, TileEdit, Tilemap};

use super::motion::Actor;

#[derive(Component)]
pub struct Player;

/// Layer the debug editor writes into, above the generated ground
const EDIT_LAYER: usize = 1;

/// Can an actor step by `delta` into the cell at `tile`? Every layer of
/// the stack gets a veto.
pub fn can_enter(tilemap: &Tilemap, registry: &TileRegistry, tile: IVec2, delta: IVec2) -> bool {
    for z in 0..CHUNK_DEPTH {
        let id = tilemap.tile_at(tile, z);
        if id == TILE_EMPTY {
            continue;
        }
        if let Some(def) = registry.get(id) {
            if def.flags.blocks_entry(delta) {
                return false;
            }
        }
    }
    true
}

pub fn player_input(
    keys: Res<ButtonInput<KeyCode>>,
    tilemap: Res<Tilemap>,
    registry: Res<TileRegistry>,
    mut edits: MessageWriter<TileEdit>,
    mut query: Query<&mut Actor, With<Player>>,
) {
    let Ok(mut actor) = query.single_mut() else {
        return;
    };

    let delta = if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        IVec2::new(0, 1)
    } else if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        IVec2::new(0, -1)
    } else if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        IVec2::new(-1, 0)
    } else if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        IVec2::new(1, 0)
    } else {
        IVec2::ZERO
    };

    if delta != IVec2::ZERO && !actor.is_moving() {
        let target = actor.tile() + delta;
        if can_enter(&tilemap, &registry, target, delta) {
            actor.move_by(delta);
        }
    }

    // Debug editing at the player's feet
    let tile = world_to_tile(actor.position);
    if keys.just_pressed(KeyCode::KeyE) {
        edits.write(TileEdit {
            tile,
            layer: EDIT_LAYER,
            id: TILE_WALL,
        });
    }
    if keys.just_pressed(KeyCode::KeyQ) {
        edits.write(TileEdit {
            tile,
            layer: EDIT_LAYER,
            id: TILE_EMPTY,
        });
    }
}

/// Keep the camera glued to the player as it glides between cells
pub fn camera_follow(
    player_query: Query<&Actor, (With<Player>, Changed<Actor>)>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(actor) = player_query.single() else {
        return;
    };
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };
    transform.translation.x = actor.position.x;
    transform.translation.y = actor.position.y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{ChunkPos, TILE_GROUND};

    fn world() -> (Tilemap, TileRegistry) {
        let mut tilemap = Tilemap::default();
        tilemap.request_chunk(ChunkPos::new(0, 0));

        let registry = TileRegistry::from_json(
            r#"{
                "tiles": [
                    { "id": 0, "kind": "Autotiled", "sprite": [0, 0] },
                    { "id": 1, "kind": "Autotiled", "sprite": [4, 0], "flags": ["Obstacle"] }
                ]
            }"#,
        )
        .unwrap();
        (tilemap, registry)
    }

    #[test]
    fn test_ground_is_enterable() {
        let (tilemap, registry) = world();
        assert_eq!(tilemap.tile_at(IVec2::new(5, 5), 0), TILE_GROUND);
        assert!(can_enter(&tilemap, &registry, IVec2::new(5, 5), IVec2::new(1, 0)));
    }

    #[test]
    fn test_axis_wall_blocks_entry() {
        let (tilemap, registry) = world();
        assert_eq!(tilemap.tile_at(IVec2::new(0, 5), 0), TILE_WALL);
        assert!(!can_enter(&tilemap, &registry, IVec2::new(0, 5), IVec2::new(-1, 0)));
    }

    #[test]
    fn test_any_layer_can_veto() {
        let (mut tilemap, registry) = world();
        tilemap.set_tile(IVec2::new(5, 5), 2, TILE_WALL);
        assert!(!can_enter(&tilemap, &registry, IVec2::new(5, 5), IVec2::new(1, 0)));
    }

    #[test]
    fn test_unloaded_terrain_is_open() {
        let (tilemap, registry) = world();
        assert!(can_enter(&tilemap, &registry, IVec2::new(500, 500), IVec2::new(0, 1)));
    }
}
