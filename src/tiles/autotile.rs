//! Corner-based autotiling.
//!
//! Each autotiled cell renders as four half-cell quads. For every quad the
//! resolver probes the three neighbor cells touching that corner (two edge
//! neighbors plus the diagonal) and compares them against the cell's own
//! tile id. The resulting 3-bit "same" tuple indexes a fixed catalogue of
//! sprite-cell offsets authored to match the tileset's 4x6 autotile block.
//! Probes may cross into any of the 8 surrounding chunks; a chunk that is
//! not streamed in counts as "different tile".

use bevy::prelude::*;

use super::chunk::ChunkData;
use super::constants::{CHUNK_SIZE_I32, TILE_EMPTY};
use super::types::TileId;

/// The four visual quad corners of an autotiled cell, in bake order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest = 0,
    SouthWest = 1,
    SouthEast = 2,
    NorthEast = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::SouthWest,
        Corner::SouthEast,
        Corner::NorthEast,
    ];

    /// Anchor of this corner's half-cell quad within the cell
    pub fn anchor(&self) -> Vec2 {
        CORNER_ANCHORS[*self as usize]
    }
}

const CORNER_ANCHORS: [Vec2; 4] = [
    Vec2::new(0.0, 0.5), // NW
    Vec2::new(0.0, 0.0), // SW
    Vec2::new(0.5, 0.0), // SE
    Vec2::new(0.5, 0.5), // NE
];

/// Neighbor cells influencing each corner: edge, diagonal, edge.
const CORNER_PROBES: [[IVec2; 3]; 4] = [
    [IVec2::new(-1, 0), IVec2::new(-1, 1), IVec2::new(0, 1)], // NW
    [IVec2::new(-1, 0), IVec2::new(-1, -1), IVec2::new(0, -1)], // SW
    [IVec2::new(0, -1), IVec2::new(1, -1), IVec2::new(1, 0)], // SE
    [IVec2::new(1, 0), IVec2::new(1, 1), IVec2::new(0, 1)],   // NE
];

/// Sprite-cell offsets into the 4x6 autotile block, indexed by
/// [corner][same0][same1][same2]. Authored once against the tileset
/// layout: the interior 2x2 block is the all-same result, the top-left
/// 2x2 block the fully isolated one.
const SPRITE_OFFSETS: [[[[IVec2; 2]; 2]; 2]; 4] = [
    // NW
    [
        [
            [IVec2::new(0, 0), IVec2::new(0, 3)],
            [IVec2::new(0, 2), IVec2::new(0, 3)],
        ],
        [
            [IVec2::new(1, 2), IVec2::new(2, 0)],
            [IVec2::new(1, 2), IVec2::new(1, 3)],
        ],
    ],
    // SW
    [
        [
            [IVec2::new(0, 1), IVec2::new(0, 4)],
            [IVec2::new(0, 5), IVec2::new(0, 4)],
        ],
        [
            [IVec2::new(1, 5), IVec2::new(2, 1)],
            [IVec2::new(1, 5), IVec2::new(1, 4)],
        ],
    ],
    // SE
    [
        [
            [IVec2::new(1, 1), IVec2::new(2, 5)],
            [IVec2::new(3, 5), IVec2::new(2, 5)],
        ],
        [
            [IVec2::new(3, 4), IVec2::new(3, 1)],
            [IVec2::new(3, 4), IVec2::new(2, 4)],
        ],
    ],
    // NE
    [
        [
            [IVec2::new(1, 0), IVec2::new(3, 3)],
            [IVec2::new(3, 2), IVec2::new(3, 3)],
        ],
        [
            [IVec2::new(2, 2), IVec2::new(3, 0)],
            [IVec2::new(2, 2), IVec2::new(2, 3)],
        ],
    ],
];

/// The 3x3 block of chunks centered on the chunk being baked. Missing
/// slots are chunks that have not been generated or streamed in yet.
pub struct NeighborBlock<'a> {
    slots: [[Option<&'a ChunkData>; 3]; 3],
}

impl<'a> NeighborBlock<'a> {
    pub fn new(slots: [[Option<&'a ChunkData>; 3]; 3]) -> Self {
        Self { slots }
    }

    /// A block with only the center chunk present
    pub fn isolated(center: &'a ChunkData) -> Self {
        let mut slots: [[Option<&'a ChunkData>; 3]; 3] = Default::default();
        slots[1][1] = Some(center);
        Self { slots }
    }

    pub fn center(&self) -> Option<&'a ChunkData> {
        self.slots[1][1]
    }

    /// Which neighbor (signed chunk offset) owns a local position that may
    /// overflow the center chunk's footprint.
    fn owner_offset(pos: IVec3) -> IVec2 {
        let mut offset = IVec2::ZERO;
        if pos.x < 0 {
            offset.x = -1;
        } else if pos.x >= CHUNK_SIZE_I32 {
            offset.x = 1;
        }
        if pos.y < 0 {
            offset.y = -1;
        } else if pos.y >= CHUNK_SIZE_I32 {
            offset.y = 1;
        }
        offset
    }

    /// Read the tile at a center-chunk-relative position, following the
    /// overflow into the owning neighbor. Unstreamed neighbors read as
    /// empty, which never matches a real tile id.
    pub fn sample(&self, pos: IVec3) -> TileId {
        let offset = Self::owner_offset(pos);
        let Some(chunk) = self.slots[(offset.x + 1) as usize][(offset.y + 1) as usize] else {
            return TILE_EMPTY;
        };
        let local = pos - IVec3::new(offset.x * CHUNK_SIZE_I32, offset.y * CHUNK_SIZE_I32, 0);
        chunk.tile_at(local)
    }
}

/// Resolve the sprite-cell offset for one corner of the autotiled cell at
/// `cell` (center-chunk local coordinates) holding tile id `tile`.
pub fn corner_sprite_offset(
    block: &NeighborBlock,
    cell: IVec3,
    tile: TileId,
    corner: Corner,
) -> IVec2 {
    let probes = &CORNER_PROBES[corner as usize];
    let mut same = [false; 3];
    for (slot, probe) in probes.iter().enumerate() {
        let pos = cell + IVec3::new(probe.x, probe.y, 0);
        same[slot] = block.sample(pos) == tile;
    }
    SPRITE_OFFSETS[corner as usize][same[0] as usize][same[1] as usize][same[2] as usize]
}
