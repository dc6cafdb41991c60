pub mod atlas;
pub mod baker;
pub mod material;

// Re-export commonly used items
pub use atlas::TileAtlas;
pub use baker::{bake_chunk, ChunkMeshData, ATTRIBUTE_TILE_INDEX};
pub use material::{build_tile_table, GpuTileData, TileMaterial};
