//! Tilemap material.
//!
//! One material instance renders every baked chunk. The vertex stream
//! carries per-vertex tile ids; the shader looks each id up in a storage
//! buffer of animation parameters and shifts the baked frame-zero UVs to
//! the current frame using the running time, so animated water keeps
//! moving without any chunk ever rebaking.

use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::prelude::*;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderType, SpecializedMeshPipelineError,
};
use bevy::render::storage::ShaderStorageBuffer;
use bevy::shader::ShaderRef;
use bevy::sprite_render::{Material2d, Material2dKey};

use crate::tiles::TileRegistry;

use super::atlas::TileAtlas;
use super::baker::ATTRIBUTE_TILE_INDEX;

pub const TILEMAP_SHADER_PATH: &str = "shaders/tilemap.wgsl";

/// Per-tile animation parameters mirrored to the GPU.
#[derive(Debug, Clone, Copy, PartialEq, ShaderType)]
pub struct GpuTileData {
    /// Frames in the loop, 1 for static tiles
    pub frame_count: u32,
    /// Loop duration in milliseconds, 0 for static tiles
    pub duration_ms: u32,
    /// UV shift between consecutive frames
    pub frame_offset: Vec2,
}

impl GpuTileData {
    pub const STATIC: GpuTileData = GpuTileData {
        frame_count: 1,
        duration_ms: 0,
        frame_offset: Vec2::ZERO,
    };
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct TileMaterial {
    #[texture(0)]
    #[sampler(1)]
    pub tileset: Handle<Image>,
    /// Indexed by tile id; ids are small and dense so gaps are padded
    /// with static entries.
    #[storage(2, read_only)]
    pub tiles: Handle<ShaderStorageBuffer>,
}

impl Material2d for TileMaterial {
    fn vertex_shader() -> ShaderRef {
        TILEMAP_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        TILEMAP_SHADER_PATH.into()
    }

    fn specialize(
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: Material2dKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            ATTRIBUTE_TILE_INDEX.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        Ok(())
    }
}

/// Build the dense id-indexed animation table uploaded with the material.
pub fn build_tile_table(registry: &TileRegistry, atlas: &TileAtlas) -> Vec<GpuTileData> {
    let len = registry.max_id().map_or(0, |id| id as usize + 1);
    let mut table = vec![GpuTileData::STATIC; len];

    for (&id, def) in registry.iter() {
        let anim = def.animation;
        if anim.frame_count > 1 && anim.duration_ms > 0 {
            table[id as usize] = GpuTileData {
                frame_count: anim.frame_count,
                duration_ms: anim.duration_ms,
                frame_offset: atlas.frame_uv_offset(anim.frame_offset),
            };
        }
    }

    table
}
