//! Tileset atlas layout.
//!
//! The atlas is a uniform grid of sprite cells. All UV math happens at
//! bake time against frame zero of a tile; animation advances whole frames
//! in the shader by adding a per-tile UV offset.

use bevy::prelude::*;

/// Grid layout of the loaded tileset texture.
#[derive(Resource, Debug, Clone, Copy)]
pub struct TileAtlas {
    /// Number of sprite cells along each axis
    pub grid: IVec2,
}

impl TileAtlas {
    pub fn new(grid: IVec2) -> Self {
        debug_assert!(grid.x > 0 && grid.y > 0);
        Self { grid }
    }

    /// UV extent of a single sprite cell
    pub fn cell_uv_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.grid.x as f32, 1.0 / self.grid.y as f32)
    }

    /// UV rectangle of a sprite cell, as (min, max). Cell (0, 0) is the
    /// top-left of the texture.
    pub fn uv_rect(&self, cell: IVec2) -> (Vec2, Vec2) {
        let size = self.cell_uv_size();
        let min = Vec2::new(cell.x as f32, cell.y as f32) * size;
        (min, min + size)
    }

    /// UV offset between consecutive animation frames of a tile whose
    /// frames are laid out `frame_offset` sprite cells apart.
    pub fn frame_uv_offset(&self, frame_offset: IVec2) -> Vec2 {
        Vec2::new(frame_offset.x as f32, frame_offset.y as f32) * self.cell_uv_size()
    }
}

impl Default for TileAtlas {
    fn default() -> Self {
        Self::new(IVec2::new(8, 8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_rect_origin_cell() {
        let atlas = TileAtlas::new(IVec2::new(8, 8));
        let (min, max) = atlas.uv_rect(IVec2::new(0, 0));
        assert_eq!(min, Vec2::ZERO);
        assert_eq!(max, Vec2::new(0.125, 0.125));
    }

    #[test]
    fn test_uv_rect_interior_cell() {
        let atlas = TileAtlas::new(IVec2::new(4, 8));
        let (min, max) = atlas.uv_rect(IVec2::new(2, 3));
        assert_eq!(min, Vec2::new(0.5, 0.375));
        assert_eq!(max, Vec2::new(0.75, 0.5));
    }

    #[test]
    fn test_frame_uv_offset() {
        let atlas = TileAtlas::new(IVec2::new(8, 8));
        assert_eq!(
            atlas.frame_uv_offset(IVec2::new(1, 0)),
            Vec2::new(0.125, 0.0)
        );
    }
}
