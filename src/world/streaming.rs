//! Chunk streaming systems.
//!
//! Each frame the camera's visible world rectangle decides which chunks
//! must be resident. Chunks entering the rectangle (plus a one-chunk
//! margin so autotile seams at the edge resolve) are loaded from disk or
//! generated; chunks that drift past the eviction margin are saved if
//! modified and despawned. Baking runs as a separate pass over whatever
//! chunks the frame left stale.

use bevy::prelude::*;
use std::path::PathBuf;

use crate::render::{bake_chunk, TileAtlas, TileMaterial};
use crate::tiles::{ChunkPos, TileId, TileRegistry};

use super::serialization;
use super::tilemap::Tilemap;

const AUTOSAVE_INTERVAL_SECS: f32 = 30.0;

/// A requested cell write, applied at a fixed point in the frame
#[derive(Message, Debug, Clone, Copy)]
pub struct TileEdit {
    pub tile: IVec2,
    pub layer: usize,
    pub id: TileId,
}

/// Mesh entity of one baked chunk.
#[derive(Component)]
pub struct BakedChunk {
    pub position: ChunkPos,
    pub mesh: Handle<Mesh>,
}

/// Shared handle of the single material all chunk meshes render with.
#[derive(Resource)]
pub struct TilemapRenderer {
    pub material: Handle<TileMaterial>,
}

/// Streaming bookkeeping carried across frames.
#[derive(Resource)]
pub struct StreamingState {
    /// Directory of the active save slot
    pub slot_dir: PathBuf,
    /// Chunks beyond the visible rectangle kept resident, so small
    /// camera oscillations do not thrash load/evict cycles
    margin: i32,
    /// Chunk the camera was in last frame
    camera_chunk: Option<ChunkPos>,
    /// Viewport size seen last frame, to catch window resizes
    viewport: Option<Vec2>,
    /// Orthographic scale seen last frame, to catch zoom
    projection_scale: Option<f32>,
    /// Chunk-space rectangle of the current visible area, inclusive
    visible_rect: Option<(ChunkPos, ChunkPos)>,
    autosave: Timer,
}

impl StreamingState {
    pub fn new(slot_dir: PathBuf, margin: i32) -> Self {
        Self {
            slot_dir,
            margin,
            camera_chunk: None,
            viewport: None,
            projection_scale: None,
            visible_rect: None,
            autosave: Timer::from_seconds(AUTOSAVE_INTERVAL_SECS, TimerMode::Repeating),
        }
    }

    pub fn visible_rect(&self) -> Option<(ChunkPos, ChunkPos)> {
        self.visible_rect
    }

    /// Record this frame's view parameters, reporting whether any of them
    /// moved since last frame and the visible rectangle must be rebuilt.
    fn view_changed(&mut self, camera_chunk: ChunkPos, viewport: Vec2, scale: f32) -> bool {
        let unchanged = self.camera_chunk == Some(camera_chunk)
            && self.viewport == Some(viewport)
            && self.projection_scale == Some(scale);
        self.camera_chunk = Some(camera_chunk);
        self.viewport = Some(viewport);
        self.projection_scale = Some(scale);
        !unchanged
    }

    /// Whether a chunk sits inside the visible rectangle grown by the
    /// eviction margin. With no rectangle yet, everything is retained.
    fn retains(&self, pos: ChunkPos) -> bool {
        let Some((min, max)) = self.visible_rect else {
            return true;
        };
        pos.x >= min.x - self.margin
            && pos.x <= max.x + self.margin
            && pos.y >= min.y - self.margin
            && pos.y <= max.y + self.margin
    }
}

/// Apply queued cell writes to the world. Edits landing in chunks that
/// are not resident are dropped with a warning.
pub fn apply_tile_edits(mut edits: MessageReader<TileEdit>, mut tilemap: ResMut<Tilemap>) {
    for edit in edits.read() {
        if tilemap.set_tile(edit.tile, edit.layer, edit.id) {
            debug!("Set tile {:?} layer {} to {}", edit.tile, edit.layer, edit.id);
        } else {
            warn!("Dropped edit at {:?}: chunk not resident", edit.tile);
        }
    }
}

/// Make every chunk overlapping the camera's view resident.
pub fn stream_visible_chunks(
    camera_query: Query<(&Camera, &GlobalTransform, &Projection), With<Camera2d>>,
    mut tilemap: ResMut<Tilemap>,
    mut state: ResMut<StreamingState>,
) {
    let Ok((camera, camera_transform, projection)) = camera_query.single() else {
        return;
    };
    let Some(viewport) = camera.logical_viewport_size() else {
        return;
    };
    // Zoom changes the projected world rect without touching the
    // viewport's pixel size
    let scale = match projection {
        Projection::Orthographic(ortho) => ortho.scale,
        _ => 1.0,
    };

    let camera_chunk = ChunkPos::from_world(camera_transform.translation().truncate());
    if !state.view_changed(camera_chunk, viewport, scale) {
        return;
    }

    let Ok(top_left) = camera.viewport_to_world_2d(camera_transform, Vec2::ZERO) else {
        return;
    };
    let Ok(bottom_right) = camera.viewport_to_world_2d(camera_transform, viewport) else {
        return;
    };

    let world_min = top_left.min(bottom_right);
    let world_max = top_left.max(bottom_right);

    // One extra ring so border cells can see their off-screen neighbors
    let min = ChunkPos::from_world(world_min).offset(-1, -1);
    let max = ChunkPos::from_world(world_max).offset(1, 1);
    state.visible_rect = Some((min, max));

    for cy in min.y..=max.y {
        for cx in min.x..=max.x {
            let pos = ChunkPos::new(cx, cy);
            if tilemap.contains(pos) {
                continue;
            }

            if serialization::chunk_exists(&state.slot_dir, pos) {
                let path = serialization::chunk_path(&state.slot_dir, pos);
                match serialization::load_chunk(&path, pos) {
                    Ok(data) => {
                        info!("Loaded chunk {:?} from disk", pos);
                        tilemap.insert_chunk(data);
                        continue;
                    }
                    Err(e) => {
                        warn!("Failed to load chunk {:?}: {}, regenerating", pos, e);
                    }
                }
            }
            tilemap.request_chunk(pos);
        }
    }
}

/// Rebuild geometry for every chunk whose bake flag is clear. Existing
/// mesh assets are replaced in place so the entity and material binding
/// survive a rebake.
pub fn bake_stale_chunks(
    mut commands: Commands,
    mut tilemap: ResMut<Tilemap>,
    mut meshes: ResMut<Assets<Mesh>>,
    registry: Res<TileRegistry>,
    atlas: Res<TileAtlas>,
    renderer: Res<TilemapRenderer>,
    baked_query: Query<&BakedChunk>,
) {
    for pos in tilemap.unbaked_positions() {
        let Some(block) = tilemap.neighbor_block(pos) else {
            continue;
        };
        let Some(chunk) = tilemap.chunk(pos) else {
            continue;
        };
        let mesh = bake_chunk(chunk, &block, &registry, &atlas).into_mesh();

        if let Some(existing) = baked_query.iter().find(|baked| baked.position == pos) {
            meshes.insert(existing.mesh.id(), mesh);
        } else {
            let handle = meshes.add(mesh);
            let origin = pos.to_world();
            commands.spawn((
                Mesh2d(handle.clone()),
                MeshMaterial2d(renderer.material.clone()),
                Transform::from_xyz(origin.x, origin.y, 0.0),
                BakedChunk {
                    position: pos,
                    mesh: handle,
                },
            ));
            debug!("Baked new chunk {:?}", pos);
        }

        tilemap.mark_baked(pos);
    }
}

/// Drop chunks far outside the visible rectangle, saving modified ones
/// first.
pub fn evict_distant_chunks(
    mut commands: Commands,
    mut tilemap: ResMut<Tilemap>,
    mut meshes: ResMut<Assets<Mesh>>,
    state: Res<StreamingState>,
    baked_query: Query<(Entity, &BakedChunk)>,
) {
    if state.visible_rect().is_none() {
        return;
    }

    for pos in tilemap.loaded_positions() {
        if state.retains(pos) {
            continue;
        }

        if tilemap.is_modified(pos) {
            if let Some(chunk) = tilemap.chunk(pos) {
                let path = serialization::chunk_path(&state.slot_dir, pos);
                match serialization::save_chunk(chunk, &path) {
                    Ok(()) => info!("Saved chunk {:?} before eviction", pos),
                    Err(e) => {
                        error!("Failed to save chunk {:?}: {}, keeping resident", pos, e);
                        continue;
                    }
                }
            }
        }

        tilemap.remove_chunk(pos);
        for (entity, baked) in baked_query.iter() {
            if baked.position == pos {
                meshes.remove(baked.mesh.id());
                commands.entity(entity).despawn();
            }
        }
        debug!("Evicted chunk {:?}", pos);
    }
}

/// Periodically flush modified chunks to disk so a crash loses little.
pub fn autosave_modified_chunks(
    time: Res<Time>,
    mut state: ResMut<StreamingState>,
    mut tilemap: ResMut<Tilemap>,
) {
    if !state.autosave.tick(time.delta()).just_finished() {
        return;
    }

    for pos in tilemap.modified_positions() {
        let Some(chunk) = tilemap.chunk(pos) else {
            continue;
        };
        let path = serialization::chunk_path(&state.slot_dir, pos);
        match serialization::save_chunk(chunk, &path) {
            Ok(()) => {
                debug!("Autosaved chunk {:?}", pos);
                tilemap.clear_modified(pos);
            }
            Err(e) => error!("Failed to autosave chunk {:?}: {}", pos, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::CHUNK_SIZE_F32;

    #[test]
    fn test_state_tracks_visible_rect() {
        let mut state = StreamingState::new(PathBuf::from("saves/test"), 2);
        assert!(state.visible_rect().is_none());
        state.visible_rect = Some((ChunkPos::new(-2, -1), ChunkPos::new(3, 2)));
        assert_eq!(
            state.visible_rect(),
            Some((ChunkPos::new(-2, -1), ChunkPos::new(3, 2)))
        );
    }

    #[test]
    fn test_zoom_alone_retriggers_streaming() {
        let mut state = StreamingState::new(PathBuf::from("saves/test"), 2);
        let chunk = ChunkPos::new(0, 0);
        let viewport = Vec2::new(1280.0, 720.0);

        assert!(state.view_changed(chunk, viewport, 1.0 / 32.0));
        assert!(!state.view_changed(chunk, viewport, 1.0 / 32.0));
        // Same chunk, same pixel viewport, wider ortho scale
        assert!(state.view_changed(chunk, viewport, 1.0 / 16.0));
        assert!(!state.view_changed(chunk, viewport, 1.0 / 16.0));
    }

    #[test]
    fn test_resize_and_chunk_crossing_retrigger_streaming() {
        let mut state = StreamingState::new(PathBuf::from("saves/test"), 2);
        let viewport = Vec2::new(1280.0, 720.0);

        assert!(state.view_changed(ChunkPos::new(0, 0), viewport, 1.0));
        assert!(state.view_changed(ChunkPos::new(1, 0), viewport, 1.0));
        assert!(state.view_changed(ChunkPos::new(1, 0), Vec2::new(1920.0, 1080.0), 1.0));
    }

    #[test]
    fn test_eviction_bounds_grow_with_margin() {
        let mut state = StreamingState::new(PathBuf::from("saves/test"), 1);
        assert!(state.retains(ChunkPos::new(100, 100)));

        state.visible_rect = Some((ChunkPos::new(0, 0), ChunkPos::new(2, 2)));
        assert!(state.retains(ChunkPos::new(3, 0)));
        assert!(!state.retains(ChunkPos::new(4, 0)));
        assert!(!state.retains(ChunkPos::new(0, -2)));

        state.margin = 3;
        assert!(state.retains(ChunkPos::new(4, 0)));
        assert!(state.retains(ChunkPos::new(0, -3)));
        assert!(!state.retains(ChunkPos::new(6, 0)));
    }

    #[test]
    fn test_camera_chunk_spans_whole_chunk() {
        // Any world point inside one chunk footprint maps to that chunk
        let a = ChunkPos::from_world(Vec2::new(0.1, 0.1));
        let b = ChunkPos::from_world(Vec2::new(CHUNK_SIZE_F32 - 0.1, 0.1));
        assert_eq!(a, b);
        let c = ChunkPos::from_world(Vec2::new(CHUNK_SIZE_F32 + 0.1, 0.1));
        assert_eq!(c, a.offset(1, 0));
    }
}
