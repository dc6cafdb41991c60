use crate::tiles::{ChunkData, ChunkPos, CHUNK_SIZE_I32, TILE_GROUND, TILE_WALL};

/// Produces the initial contents of a chunk that has never been saved.
/// Generation is a pure function of the chunk position so revisiting an
/// unedited chunk always yields the same terrain.
pub trait ChunkGenerator {
    fn generate(&self, position: ChunkPos) -> ChunkData;
}

/// Fills the ground layer and raises walls along the world axes, marking
/// the origin so fresh worlds have a visible landmark.
pub struct BorderWallGenerator;

impl ChunkGenerator for BorderWallGenerator {
    fn generate(&self, position: ChunkPos) -> ChunkData {
        let mut chunk = ChunkData::empty(position);
        chunk.fill_layer(0, |x, y| {
            let tile_x = position.x * CHUNK_SIZE_I32 + x as i32;
            let tile_y = position.y * CHUNK_SIZE_I32 + y as i32;
            if tile_x == 0 || tile_y == 0 {
                TILE_WALL
            } else {
                TILE_GROUND
            }
        });
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::CHUNK_SIZE;

    #[test]
    fn test_origin_chunk_has_axis_walls() {
        let chunk = BorderWallGenerator.generate(ChunkPos::new(0, 0));
        assert_eq!(chunk.tile(0, 0, 0), TILE_WALL);
        assert_eq!(chunk.tile(5, 0, 0), TILE_WALL);
        assert_eq!(chunk.tile(0, 9, 0), TILE_WALL);
        assert_eq!(chunk.tile(3, 7, 0), TILE_GROUND);
    }

    #[test]
    fn test_off_axis_chunk_is_plain_ground() {
        let chunk = BorderWallGenerator.generate(ChunkPos::new(2, -3));
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                assert_eq!(chunk.tile(x, y, 0), TILE_GROUND);
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = BorderWallGenerator.generate(ChunkPos::new(-1, 4));
        let b = BorderWallGenerator.generate(ChunkPos::new(-1, 4));
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn test_upper_layers_stay_empty() {
        use crate::tiles::{CHUNK_DEPTH, TILE_EMPTY};
        let chunk = BorderWallGenerator.generate(ChunkPos::new(0, 0));
        for z in 1..CHUNK_DEPTH {
            assert_eq!(chunk.tile(8, 8, z), TILE_EMPTY);
        }
    }
}
