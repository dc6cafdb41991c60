pub mod generator;
pub mod serialization;
pub mod streaming;
pub mod tilemap;

// Re-export commonly used items
pub use generator::{BorderWallGenerator, ChunkGenerator};
pub use serialization::{SaveError, SaveGame};
pub use streaming::{StreamingState, TileEdit, TilemapRenderer};
pub use tilemap::{world_to_tile, Tilemap};
