use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::CHUNK_SIZE_F32;

/// Type alias for tile IDs. Negative values are reserved for the empty
/// sentinel; every registered tile has a non-negative id.
pub type TileId = i32;

/// Chunk position in chunk coordinates (not world/tile coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert from a world position (in tile units) to a chunk position.
    /// Uses floor division so negative coordinates map correctly:
    /// world x = -0.5 belongs to chunk -1, not chunk 0.
    pub fn from_world(world_pos: Vec2) -> Self {
        Self {
            x: (world_pos.x / CHUNK_SIZE_F32).floor() as i32,
            y: (world_pos.y / CHUNK_SIZE_F32).floor() as i32,
        }
    }

    /// Convert from an integer tile position to a chunk position
    pub fn from_tile(tile_pos: IVec2, chunk_size: i32) -> Self {
        Self {
            x: tile_pos.x.div_euclid(chunk_size),
            y: tile_pos.y.div_euclid(chunk_size),
        }
    }

    /// World position of this chunk's bottom-left corner (in tile units)
    pub fn to_world(&self) -> Vec2 {
        Vec2::new(self.x as f32 * CHUNK_SIZE_F32, self.y as f32 * CHUNK_SIZE_F32)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance (square/max distance) between two chunk positions
    pub fn chebyshev_distance(&self, other: &ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<ChunkPos> for IVec2 {
    fn from(pos: ChunkPos) -> Self {
        IVec2::new(pos.x, pos.y)
    }
}

/// Whether a tile blends with same-typed neighbors or renders as one
/// uniform quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Autotiled,
    Monotiled,
}

/// Animation parameters resolved on the GPU every frame. A tile with
/// `frame_count <= 1` or `duration_ms == 0` is static.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileAnimation {
    /// Number of frames in the loop
    pub frame_count: u32,
    /// Atlas-cell offset from one frame to the next
    pub frame_offset: IVec2,
    /// Total duration of the loop, in milliseconds
    pub duration_ms: u32,
}

/// Passability bitset for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileFlags(pub u16);

impl TileFlags {
    pub const NONE: TileFlags = TileFlags(0);
    pub const EAST_BLOCKED: TileFlags = TileFlags(1 << 0);
    pub const WEST_BLOCKED: TileFlags = TileFlags(1 << 1);
    pub const NORTH_BLOCKED: TileFlags = TileFlags(1 << 2);
    pub const SOUTH_BLOCKED: TileFlags = TileFlags(1 << 3);
    pub const OBSTACLE: TileFlags = TileFlags(
        Self::EAST_BLOCKED.0 | Self::WEST_BLOCKED.0 | Self::NORTH_BLOCKED.0 | Self::SOUTH_BLOCKED.0,
    );

    pub fn contains(&self, other: TileFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TileFlags) {
        self.0 |= other.0;
    }

    /// Whether a mover stepping by `delta` (one cardinal cell) is blocked
    /// from entering a cell carrying these flags. Entry from the east is
    /// refused by `EAST_BLOCKED`, and so on for the other sides.
    pub fn blocks_entry(&self, delta: IVec2) -> bool {
        let side = match (delta.x, delta.y) {
            (1, 0) => Self::WEST_BLOCKED,
            (-1, 0) => Self::EAST_BLOCKED,
            (0, 1) => Self::SOUTH_BLOCKED,
            (0, -1) => Self::NORTH_BLOCKED,
            _ => return self.contains(Self::OBSTACLE),
        };
        self.contains(side)
    }
}

/// Static attributes of one tile id. Immutable once the registry is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDefinition {
    /// Atlas cell of the first frame. For autotiled tiles this is the
    /// top-left cell of the 4x6 variant block.
    pub sprite: IVec2,
    pub kind: TileKind,
    pub animation: TileAnimation,
    pub flags: TileFlags,
}

impl TileDefinition {
    pub fn is_autotiled(&self) -> bool {
        self.kind == TileKind::Autotiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world() {
        // Origin chunk
        let pos = ChunkPos::from_world(Vec2::new(0.0, 0.0));
        assert_eq!(pos, ChunkPos::new(0, 0));

        // Positive chunks
        let pos = ChunkPos::from_world(Vec2::new(16.0, 16.0));
        assert_eq!(pos, ChunkPos::new(1, 1));

        // Inside the first negative chunk: floor, not truncation
        let pos = ChunkPos::from_world(Vec2::new(-0.5, -0.5));
        assert_eq!(pos, ChunkPos::new(-1, -1));

        let pos = ChunkPos::from_world(Vec2::new(-1.0, -1.0));
        assert_eq!(pos, ChunkPos::new(-1, -1));

        let pos = ChunkPos::from_world(Vec2::new(-16.0, -16.0));
        assert_eq!(pos, ChunkPos::new(-1, -1));

        let pos = ChunkPos::from_world(Vec2::new(-16.5, 0.0));
        assert_eq!(pos, ChunkPos::new(-2, 0));
    }

    #[test]
    fn test_world_round_trip() {
        for pos in [
            ChunkPos::new(0, 0),
            ChunkPos::new(3, -4),
            ChunkPos::new(-1, -1),
            ChunkPos::new(-7, 12),
        ] {
            // Any world point strictly inside the chunk recovers it
            let inside = pos.to_world() + Vec2::new(0.25, 15.75);
            assert_eq!(ChunkPos::from_world(inside), pos);
        }
    }

    #[test]
    fn test_from_tile() {
        assert_eq!(ChunkPos::from_tile(IVec2::new(0, 0), 16), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_tile(IVec2::new(15, 15), 16), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_tile(IVec2::new(16, 0), 16), ChunkPos::new(1, 0));
        assert_eq!(ChunkPos::from_tile(IVec2::new(-1, -1), 16), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::from_tile(IVec2::new(-16, 0), 16), ChunkPos::new(-1, 0));
        assert_eq!(ChunkPos::from_tile(IVec2::new(-17, 0), 16), ChunkPos::new(-2, 0));
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkPos::new(0, 0);
        assert_eq!(a.chebyshev_distance(&ChunkPos::new(3, 4)), 4);
        assert_eq!(a.chebyshev_distance(&ChunkPos::new(5, 0)), 5);
        assert_eq!(a.chebyshev_distance(&ChunkPos::new(-3, 3)), 3);
    }

    #[test]
    fn test_flags_block_entry() {
        let wall = TileFlags::OBSTACLE;
        assert!(wall.blocks_entry(IVec2::new(1, 0)));
        assert!(wall.blocks_entry(IVec2::new(0, -1)));

        let cliff_edge = TileFlags::WEST_BLOCKED;
        // Stepping east enters through the west side
        assert!(cliff_edge.blocks_entry(IVec2::new(1, 0)));
        assert!(!cliff_edge.blocks_entry(IVec2::new(-1, 0)));
        assert!(!cliff_edge.blocks_entry(IVec2::new(0, 1)));

        assert!(!TileFlags::NONE.blocks_entry(IVec2::new(0, 1)));
    }
}
