use super::types::TileId;

/// Size of each chunk in tiles (width and height)
pub const CHUNK_SIZE: usize = 16;

/// Number of stacked tile layers per chunk
pub const CHUNK_DEPTH: usize = 5;

/// Number of tiles in one layer of a chunk
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Total number of cells in a chunk across all layers
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_DEPTH;

/// Size of each chunk as i32 for coordinate calculations
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Size of each chunk in world units (one tile = one world unit)
pub const CHUNK_SIZE_F32: f32 = CHUNK_SIZE as f32;

/// Sentinel id meaning "no tile in this cell"
pub const TILE_EMPTY: TileId = -1;

/// Ground tile placed by the default generator
pub const TILE_GROUND: TileId = 0;

/// Wall tile placed on chunk borders by the default generator
pub const TILE_WALL: TileId = 1;

/// Z offset between consecutive tile layers, baked into vertex positions
pub const LAYER_Z_STEP: f32 = 0.1;
