use bevy::prelude::*;
use thiserror::Error;

use super::{constants::*, types::*};

/// A tile coordinate fell outside the chunk volume. This is a caller bug,
/// not a recoverable condition: writes must stay inside the chunk.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("tile coordinate ({x}, {y}, {z}) outside chunk bounds {w}x{h}x{d}",
    w = CHUNK_SIZE, h = CHUNK_SIZE, d = CHUNK_DEPTH)]
pub struct OutOfRange {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Dense tile storage for one chunk: a 16x16 footprint of CHUNK_DEPTH
/// stacked layers, indexed by (x, y, z).
#[derive(Debug, Clone)]
pub struct ChunkData {
    pub position: ChunkPos,
    cells: Box<[TileId; CHUNK_VOLUME]>,
}

impl ChunkData {
    /// Create a chunk with every cell set to the empty sentinel
    pub fn empty(position: ChunkPos) -> Self {
        Self {
            position,
            cells: Box::new([TILE_EMPTY; CHUNK_VOLUME]),
        }
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        z * CHUNK_AREA + y * CHUNK_SIZE + x
    }

    fn in_bounds(x: usize, y: usize, z: usize) -> bool {
        x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_DEPTH
    }

    /// Read the tile at local coordinates. Out-of-bounds reads return the
    /// empty sentinel, matching what an unpopulated cell holds.
    pub fn tile(&self, x: usize, y: usize, z: usize) -> TileId {
        if !Self::in_bounds(x, y, z) {
            return TILE_EMPTY;
        }
        self.cells[Self::index(x, y, z)]
    }

    /// Read through a signed local coordinate; anything negative or past
    /// the chunk extent is the empty sentinel.
    pub fn tile_at(&self, pos: IVec3) -> TileId {
        if pos.x < 0 || pos.y < 0 || pos.z < 0 {
            return TILE_EMPTY;
        }
        self.tile(pos.x as usize, pos.y as usize, pos.z as usize)
    }

    /// Write a tile id. Rendering state is tracked by the tilemap that owns
    /// this chunk; callers editing through the tilemap get the chunk and its
    /// neighbors unbaked for them.
    pub fn set_tile(&mut self, x: usize, y: usize, z: usize, id: TileId) -> Result<(), OutOfRange> {
        if !Self::in_bounds(x, y, z) {
            return Err(OutOfRange { x, y, z });
        }
        self.cells[Self::index(x, y, z)] = id;
        Ok(())
    }

    /// Populate one whole layer from a function of local (x, y).
    /// Generators write full layers, so this path cannot go out of
    /// bounds. Panics on an invalid layer.
    pub fn fill_layer(&mut self, z: usize, mut tile_for: impl FnMut(usize, usize) -> TileId) {
        assert!(z < CHUNK_DEPTH, "layer {z} outside chunk depth");
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                self.cells[Self::index(x, y, z)] = tile_for(x, y);
            }
        }
    }

    /// Raw cell slice in (x, y, z) index order, for serialization
    pub fn cells(&self) -> &[TileId] {
        self.cells.as_slice()
    }

    /// Rebuild a chunk from a cell slice previously produced by `cells()`
    pub fn from_cells(position: ChunkPos, cells: &[TileId]) -> Option<Self> {
        if cells.len() != CHUNK_VOLUME {
            return None;
        }
        let mut chunk = Self::empty(position);
        chunk.cells.copy_from_slice(cells);
        Some(chunk)
    }

    /// Whether any cell holds a real tile
    pub fn is_populated(&self) -> bool {
        self.cells.iter().any(|&id| id != TILE_EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        assert_eq!(chunk.tile(5, 10, 0), TILE_EMPTY);

        chunk.set_tile(5, 10, 0, TILE_GROUND).unwrap();
        assert_eq!(chunk.tile(5, 10, 0), TILE_GROUND);

        // Layers are independent
        chunk.set_tile(5, 10, 2, TILE_WALL).unwrap();
        assert_eq!(chunk.tile(5, 10, 2), TILE_WALL);
        assert_eq!(chunk.tile(5, 10, 0), TILE_GROUND);
    }

    #[test]
    fn test_out_of_range_write_fails() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        assert_eq!(
            chunk.set_tile(CHUNK_SIZE, 0, 0, TILE_GROUND),
            Err(OutOfRange { x: CHUNK_SIZE, y: 0, z: 0 })
        );
        assert_eq!(
            chunk.set_tile(0, 0, CHUNK_DEPTH, TILE_GROUND),
            Err(OutOfRange { x: 0, y: 0, z: CHUNK_DEPTH })
        );
    }

    #[test]
    fn test_out_of_range_read_is_empty() {
        let chunk = ChunkData::empty(ChunkPos::new(0, 0));
        assert_eq!(chunk.tile(CHUNK_SIZE, 0, 0), TILE_EMPTY);
        assert_eq!(chunk.tile_at(IVec3::new(-1, 0, 0)), TILE_EMPTY);
        assert_eq!(chunk.tile_at(IVec3::new(0, 16, 0)), TILE_EMPTY);
    }

    #[test]
    fn test_fill_layer_writes_every_cell() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        chunk.fill_layer(1, |x, y| (y * CHUNK_SIZE + x) as TileId);

        assert_eq!(chunk.tile(0, 0, 1), 0);
        assert_eq!(chunk.tile(15, 15, 1), 255);
        // Other layers untouched
        assert_eq!(chunk.tile(8, 8, 0), TILE_EMPTY);
        assert_eq!(chunk.tile(8, 8, 2), TILE_EMPTY);
    }

    #[test]
    fn test_cells_round_trip() {
        let mut chunk = ChunkData::empty(ChunkPos::new(2, -3));
        chunk.set_tile(0, 0, 0, TILE_WALL).unwrap();
        chunk.set_tile(15, 15, 4, 7).unwrap();

        let rebuilt = ChunkData::from_cells(chunk.position, chunk.cells()).unwrap();
        assert_eq!(rebuilt.tile(0, 0, 0), TILE_WALL);
        assert_eq!(rebuilt.tile(15, 15, 4), 7);
        assert_eq!(rebuilt.tile(8, 8, 1), TILE_EMPTY);

        assert!(ChunkData::from_cells(chunk.position, &[0; 3]).is_none());
    }
}
