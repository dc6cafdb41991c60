//! Chunk geometry baking.
//!
//! Baking walks every populated cell of a chunk and emits textured quads
//! into a plain CPU-side buffer, which is then uploaded as a single mesh
//! per chunk. Autotiled cells contribute four half-cell quads resolved
//! against their neighbors; monotiled cells contribute one full quad.
//! All UVs point at frame zero of the tile; animation is a per-tile UV
//! shift applied in the shader.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, Mesh, MeshVertexAttribute, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::VertexFormat;

use crate::tiles::{
    corner_sprite_offset, ChunkData, Corner, NeighborBlock, TileRegistry, CHUNK_DEPTH, CHUNK_SIZE,
    LAYER_Z_STEP, TILE_EMPTY,
};

use super::atlas::TileAtlas;

/// Per-vertex tile id, used by the shader to index the tile table.
pub const ATTRIBUTE_TILE_INDEX: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_TileIndex", 988_540_917, VertexFormat::Uint32);

/// CPU-side vertex buffers for one baked chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkMeshData {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tile_indices: Vec<u32>,
    pub indices: Vec<u32>,
}

impl ChunkMeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Append one axis-aligned quad. `min`/`max` are chunk-local world
    /// coordinates, `uv_min`/`uv_max` an atlas rectangle with v growing
    /// downward, so the top edge of the quad samples `uv_min.y`.
    fn push_quad(&mut self, min: Vec2, max: Vec2, z: f32, uv_min: Vec2, uv_max: Vec2, tile: u32) {
        let base = self.positions.len() as u32;

        self.positions.push([min.x, max.y, z]);
        self.positions.push([max.x, max.y, z]);
        self.positions.push([min.x, min.y, z]);
        self.positions.push([max.x, min.y, z]);

        self.uvs.push([uv_min.x, uv_min.y]);
        self.uvs.push([uv_max.x, uv_min.y]);
        self.uvs.push([uv_min.x, uv_max.y]);
        self.uvs.push([uv_max.x, uv_max.y]);

        self.tile_indices.extend([tile; 4]);
        self.indices
            .extend([base, base + 1, base + 2, base + 2, base + 1, base + 3]);
    }

    /// Upload into a renderable mesh
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(ATTRIBUTE_TILE_INDEX, self.tile_indices);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Bake the center chunk of `block` into vertex buffers.
///
/// Cells holding [`TILE_EMPTY`] or an id absent from the registry emit
/// nothing. Output is fully determined by the chunk contents, its eight
/// neighbors, and the registry, so rebaking the same inputs yields
/// byte-identical buffers.
pub fn bake_chunk(
    chunk: &ChunkData,
    block: &NeighborBlock,
    registry: &TileRegistry,
    atlas: &TileAtlas,
) -> ChunkMeshData {
    let mut out = ChunkMeshData::default();

    for x in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_DEPTH {
                let id = chunk.tile(x, y, z);
                if id == TILE_EMPTY {
                    continue;
                }
                let Some(def) = registry.get(id) else {
                    continue;
                };

                let cell = IVec3::new(x as i32, y as i32, z as i32);
                let base = Vec2::new(x as f32, y as f32);
                let depth = z as f32 * LAYER_Z_STEP;

                if def.is_autotiled() {
                    for corner in Corner::ALL {
                        let offset = corner_sprite_offset(block, cell, id, corner);
                        let (uv_min, uv_max) = atlas.uv_rect(def.sprite + offset);
                        let anchor = base + corner.anchor();
                        out.push_quad(
                            anchor,
                            anchor + Vec2::splat(0.5),
                            depth,
                            uv_min,
                            uv_max,
                            id as u32,
                        );
                    }
                } else {
                    let (uv_min, uv_max) = atlas.uv_rect(def.sprite);
                    out.push_quad(base, base + Vec2::ONE, depth, uv_min, uv_max, id as u32);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::types::{ChunkPos, TileAnimation, TileDefinition, TileFlags, TileKind};

    fn registry() -> TileRegistry {
        let mut registry = TileRegistry::default();
        registry.define(
            0,
            TileDefinition {
                sprite: IVec2::new(0, 0),
                kind: TileKind::Autotiled,
                animation: TileAnimation::default(),
                flags: TileFlags::default(),
            },
        );
        registry.define(
            2,
            TileDefinition {
                sprite: IVec2::new(6, 0),
                kind: TileKind::Monotiled,
                animation: TileAnimation::default(),
                flags: TileFlags::default(),
            },
        );
        registry
    }

    #[test]
    fn test_empty_chunk_bakes_nothing() {
        let chunk = ChunkData::empty(ChunkPos::new(0, 0));
        let block = NeighborBlock::isolated(&chunk);
        let data = bake_chunk(&chunk, &block, &registry(), &TileAtlas::default());
        assert!(data.is_empty());
        assert!(data.positions.is_empty());
    }

    #[test]
    fn test_monotiled_cell_emits_one_quad() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        chunk.set_tile(3, 5, 1, 2).unwrap();
        let block = NeighborBlock::isolated(&chunk);
        let data = bake_chunk(&chunk, &block, &registry(), &TileAtlas::default());

        assert_eq!(data.quad_count(), 1);
        assert_eq!(data.positions.len(), 4);
        assert_eq!(data.tile_indices, vec![2; 4]);
        // Full-cell quad at the cell footprint, lifted by its layer
        assert_eq!(data.positions[2], [3.0, 5.0, LAYER_Z_STEP]);
        assert_eq!(data.positions[1], [4.0, 6.0, LAYER_Z_STEP]);
    }

    #[test]
    fn test_autotiled_cell_emits_four_quads() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        chunk.set_tile(8, 8, 0, 0).unwrap();
        let block = NeighborBlock::isolated(&chunk);
        let data = bake_chunk(&chunk, &block, &registry(), &TileAtlas::default());

        assert_eq!(data.quad_count(), 4);
        // The four half-cell quads tile the cell footprint
        let min_x = data
            .positions
            .iter()
            .map(|p| p[0])
            .fold(f32::INFINITY, f32::min);
        let max_x = data
            .positions
            .iter()
            .map(|p| p[0])
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!((min_x, max_x), (8.0, 9.0));
    }

    #[test]
    fn test_unknown_id_emits_nothing() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        chunk.set_tile(1, 1, 0, 99).unwrap();
        let block = NeighborBlock::isolated(&chunk);
        let data = bake_chunk(&chunk, &block, &registry(), &TileAtlas::default());
        assert!(data.is_empty());
    }

    #[test]
    fn test_bake_is_deterministic() {
        let mut chunk = ChunkData::empty(ChunkPos::new(2, -1));
        for x in 0..CHUNK_SIZE {
            chunk.set_tile(x, 0, 0, 0).unwrap();
            chunk.set_tile(x, 1, 2, 2).unwrap();
        }
        let block = NeighborBlock::isolated(&chunk);
        let registry = registry();
        let atlas = TileAtlas::default();

        let first = bake_chunk(&chunk, &block, &registry, &atlas);
        let second = bake_chunk(&chunk, &block, &registry, &atlas);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_quad_uvs_span_one_atlas_cell() {
        let mut chunk = ChunkData::empty(ChunkPos::new(0, 0));
        chunk.set_tile(0, 0, 0, 2).unwrap();
        let block = NeighborBlock::isolated(&chunk);
        let atlas = TileAtlas::default();
        let data = bake_chunk(&chunk, &block, &registry(), &atlas);

        let (uv_min, uv_max) = atlas.uv_rect(IVec2::new(6, 0));
        assert_eq!(data.uvs[0], [uv_min.x, uv_min.y]);
        assert_eq!(data.uvs[3], [uv_max.x, uv_max.y]);
    }
}
