//! Per-draw-request value types.
//!
//! One batch item describes one drawable unit. Items are plain `Copy`
//! values: the caller builds one per draw request, the batching service
//! stores it by value, and the slot is overwritten in place when the batch
//! empties. A default-valued item marks an empty slot, which is why every
//! kind is compared structurally against its default.

use glam::Vec2;
use lumen_core::bus::BatchKind;
use lumen_core::geometry::{Rect, Size};

use crate::color::Rgba8;
use crate::effects::RenderEffects;

/// Behavior shared by the four batch item kinds.
pub trait BatchItem: Copy + Default + PartialEq + 'static {
    /// The batch this kind accumulates into.
    const KIND: BatchKind;

    /// Identity used to coalesce consecutive items into one draw call.
    /// Kinds without a texture report 0.
    fn asset_id(&self) -> u32;

    /// Render layer; lower layers draw further back.
    fn layer(&self) -> i32;

    /// Whether this value marks an unused slot.
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One textured quad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureBatchItem {
    /// Identity of the texture, shared by items that can be drawn in one
    /// call.
    pub texture_id: u32,
    /// Full texture dimensions in texels, used to normalize `src_rect`.
    pub texture_size: Size<f32>,
    /// Region of the texture to sample, in texels.
    pub src_rect: Rect<f32>,
    /// Screen-space placement in pixels.
    pub dest_rect: Rect<f32>,
    /// Rotation about the destination center, in radians.
    pub angle: f32,
    /// Uniform scale applied about the destination center.
    pub size: f32,
    pub tint: Rgba8,
    pub effects: RenderEffects,
    pub layer: i32,
}

impl BatchItem for TextureBatchItem {
    const KIND: BatchKind = BatchKind::Texture;

    fn asset_id(&self) -> u32 {
        self.texture_id
    }

    fn layer(&self) -> i32 {
        self.layer
    }
}

/// One glyph quad sampled from a font atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontGlyphBatchItem {
    /// Identity of the font atlas texture.
    pub atlas_id: u32,
    /// Full atlas dimensions in texels.
    pub atlas_size: Size<f32>,
    /// The character this glyph renders. Not uploaded; kept for
    /// diagnostics.
    pub glyph: char,
    /// Glyph region within the atlas, in texels.
    pub src_rect: Rect<f32>,
    /// Screen-space placement in pixels.
    pub dest_rect: Rect<f32>,
    /// Rotation about the destination center, in radians.
    pub angle: f32,
    /// Uniform scale applied about the destination center.
    pub size: f32,
    pub tint: Rgba8,
    pub effects: RenderEffects,
    pub layer: i32,
}

impl Default for FontGlyphBatchItem {
    fn default() -> Self {
        Self {
            atlas_id: 0,
            atlas_size: Size::default(),
            glyph: '\0',
            src_rect: Rect::default(),
            dest_rect: Rect::default(),
            angle: 0.0,
            size: 0.0,
            tint: Rgba8::default(),
            effects: RenderEffects::default(),
            layer: 0,
        }
    }
}

impl BatchItem for FontGlyphBatchItem {
    const KIND: BatchKind = BatchKind::Font;

    fn asset_id(&self) -> u32 {
        self.atlas_id
    }

    fn layer(&self) -> i32 {
        self.layer
    }
}

/// One rectangle shape, filled or outlined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectShapeBatchItem {
    /// Center of the rectangle in pixels.
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub color: Rgba8,
    /// Filled when true; otherwise only the border is drawn.
    pub filled: bool,
    /// Border width in pixels, used when `filled` is false.
    pub border_thickness: f32,
    /// Corner rounding radius in pixels.
    pub corner_radius: f32,
    pub layer: i32,
}

impl BatchItem for RectShapeBatchItem {
    const KIND: BatchKind = BatchKind::Rect;

    fn asset_id(&self) -> u32 {
        0
    }

    fn layer(&self) -> i32 {
        self.layer
    }
}

/// One line segment with thickness.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineBatchItem {
    /// First endpoint in pixels.
    pub start: Vec2,
    /// Second endpoint in pixels.
    pub end: Vec2,
    pub color: Rgba8,
    /// Line width in pixels.
    pub thickness: f32,
    pub layer: i32,
}

impl BatchItem for LineBatchItem {
    const KIND: BatchKind = BatchKind::Line;

    fn asset_id(&self) -> u32 {
        0
    }

    fn layer(&self) -> i32 {
        self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_items_are_empty() {
        assert!(TextureBatchItem::default().is_empty());
        assert!(FontGlyphBatchItem::default().is_empty());
        assert!(RectShapeBatchItem::default().is_empty());
        assert!(LineBatchItem::default().is_empty());
    }

    #[test]
    fn populated_item_is_not_empty() {
        let item = TextureBatchItem {
            texture_id: 3,
            dest_rect: Rect::new(0.0, 0.0, 16.0, 16.0),
            size: 1.0,
            ..Default::default()
        };
        assert!(!item.is_empty());
    }

    #[test]
    fn shape_kinds_share_one_asset_id() {
        let rect = RectShapeBatchItem {
            width: 4.0,
            ..Default::default()
        };
        let line = LineBatchItem {
            thickness: 2.0,
            ..Default::default()
        };
        assert_eq!(rect.asset_id(), line.asset_id());
    }
}
