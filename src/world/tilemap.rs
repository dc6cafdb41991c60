//! The loaded-world resource.
//!
//! `Tilemap` owns every streamed-in chunk together with its bake state
//! and modification flag. Edits and chunk arrivals never touch meshes
//! directly; they only clear bake flags, and a later pass in the frame
//! rebuilds whatever geometry became stale.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::tiles::{
    ChunkData, ChunkPos, NeighborBlock, TileId, CHUNK_DEPTH, CHUNK_SIZE_I32, TILE_EMPTY,
};

use super::generator::{BorderWallGenerator, ChunkGenerator};

struct ChunkEntry {
    data: ChunkData,
    baked: bool,
}

/// All chunks currently resident in memory, plus the generator used to
/// materialize ones that have never existed before.
#[derive(Resource)]
pub struct Tilemap {
    chunks: HashMap<ChunkPos, ChunkEntry>,
    modified: HashSet<ChunkPos>,
    generator: Box<dyn ChunkGenerator + Send + Sync>,
    seed: String,
}

impl Tilemap {
    pub fn new(generator: Box<dyn ChunkGenerator + Send + Sync>, seed: String) -> Self {
        Self {
            chunks: HashMap::new(),
            modified: HashSet::new(),
            generator,
            seed,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&ChunkData> {
        self.chunks.get(&pos).map(|entry| &entry.data)
    }

    pub fn loaded_positions(&self) -> Vec<ChunkPos> {
        self.chunks.keys().copied().collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// Ensure a chunk is resident, generating it if it has never been
    /// loaded or saved. A freshly generated chunk changes the neighbor
    /// context of everything around it, so the surrounding block is
    /// scheduled for rebake along with the chunk itself.
    pub fn request_chunk(&mut self, pos: ChunkPos) {
        if self.contains(pos) {
            return;
        }
        debug!("Generating chunk {:?}", pos);
        let data = self.generator.generate(pos);
        self.insert_chunk(data);
    }

    /// Make a chunk resident from already-materialized data, typically
    /// loaded from disk.
    pub fn insert_chunk(&mut self, data: ChunkData) {
        let pos = data.position;
        self.chunks.insert(pos, ChunkEntry { data, baked: false });
        self.unbake_around(pos);
    }

    /// Drop a chunk from memory, returning its data so the caller can
    /// persist it first. Clears the modification flag.
    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<ChunkData> {
        self.modified.remove(&pos);
        self.chunks.remove(&pos).map(|entry| entry.data)
    }

    /// Write one cell, identified by global tile coordinates. Returns
    /// false when the owning chunk is not resident or the layer is out
    /// of range. A successful edit marks the chunk modified and clears
    /// the bake flag of the full surrounding block, since autotile
    /// seams reach across chunk borders.
    pub fn set_tile(&mut self, tile: IVec2, z: usize, id: TileId) -> bool {
        let chunk_pos = ChunkPos::from_tile(tile, CHUNK_SIZE_I32);
        let local = local_in_chunk(tile);

        let Some(entry) = self.chunks.get_mut(&chunk_pos) else {
            return false;
        };
        if entry
            .data
            .set_tile(local.x as usize, local.y as usize, z, id)
            .is_err()
        {
            return false;
        }

        self.modified.insert(chunk_pos);
        self.unbake_around(chunk_pos);
        true
    }

    /// Read one cell by global tile coordinates. Non-resident chunks
    /// read as empty.
    pub fn tile_at(&self, tile: IVec2, z: usize) -> TileId {
        if z >= CHUNK_DEPTH {
            return TILE_EMPTY;
        }
        let chunk_pos = ChunkPos::from_tile(tile, CHUNK_SIZE_I32);
        let local = local_in_chunk(tile);
        match self.chunk(chunk_pos) {
            Some(data) => data.tile(local.x as usize, local.y as usize, z),
            None => TILE_EMPTY,
        }
    }

    /// Assemble the 3x3 neighborhood needed to bake `pos`. None when the
    /// center chunk itself is missing.
    pub fn neighbor_block(&self, pos: ChunkPos) -> Option<NeighborBlock<'_>> {
        self.chunk(pos)?;
        let mut slots: [[Option<&ChunkData>; 3]; 3] = Default::default();
        for (i, column) in slots.iter_mut().enumerate() {
            for (j, slot) in column.iter_mut().enumerate() {
                *slot = self.chunk(pos.offset(i as i32 - 1, j as i32 - 1));
            }
        }
        Some(NeighborBlock::new(slots))
    }

    pub fn mark_baked(&mut self, pos: ChunkPos) {
        if let Some(entry) = self.chunks.get_mut(&pos) {
            entry.baked = true;
        }
    }

    /// Chunks whose geometry is stale, in no particular order
    pub fn unbaked_positions(&self) -> Vec<ChunkPos> {
        self.chunks
            .iter()
            .filter(|(_, entry)| !entry.baked)
            .map(|(&pos, _)| pos)
            .collect()
    }

    pub fn is_modified(&self, pos: ChunkPos) -> bool {
        self.modified.contains(&pos)
    }

    pub fn clear_modified(&mut self, pos: ChunkPos) {
        self.modified.remove(&pos);
    }

    pub fn modified_positions(&self) -> Vec<ChunkPos> {
        self.modified.iter().copied().collect()
    }

    fn unbake_around(&mut self, pos: ChunkPos) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(entry) = self.chunks.get_mut(&pos.offset(dx, dy)) {
                    entry.baked = false;
                }
            }
        }
    }
}

impl Default for Tilemap {
    fn default() -> Self {
        Self::new(Box::new(BorderWallGenerator), String::from("0"))
    }
}

/// Global tile coordinates of the cell containing a world-space point
pub fn world_to_tile(world: Vec2) -> IVec2 {
    IVec2::new(world.x.floor() as i32, world.y.floor() as i32)
}

fn local_in_chunk(tile: IVec2) -> IVec2 {
    IVec2::new(
        tile.x.rem_euclid(CHUNK_SIZE_I32),
        tile.y.rem_euclid(CHUNK_SIZE_I32),
    )
}
