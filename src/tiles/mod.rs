pub mod autotile;
pub mod chunk;
pub mod constants;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use autotile::{corner_sprite_offset, Corner, NeighborBlock};
pub use chunk::ChunkData;
pub use constants::*;
pub use registry::TileRegistry;
pub use types::{ChunkPos, TileDefinition, TileId};
