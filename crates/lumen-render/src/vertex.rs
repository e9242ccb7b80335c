//! CPU-side vertex generation.
//!
//! Every batch item expands to one quad of four vertices, in corner order
//! top-left, top-right, bottom-left, bottom-right, indexed as two
//! triangles `[0,1,2, 2,1,3]`. Positions are emitted in normalized device
//! coordinates (screen-space pixels mapped through
//! [`map_value`], y flipped), texture coordinates are normalized against
//! the owning texture's dimensions, and tint channels are mapped from
//! bytes to the unit interval. Rotation and scaling happen here, about the
//! destination center, so shaders receive final geometry.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use lumen_core::geometry::{Rect, Size};
use lumen_core::math::map_value;
use static_assertions::assert_eq_size;

use crate::batch_item::{
    BatchItem, FontGlyphBatchItem, LineBatchItem, RectShapeBatchItem, TextureBatchItem,
};
use crate::effects::RenderEffects;

/// Index pattern of one quad; every item occupies four vertices.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Vertices one item occupies in the vertex buffer.
pub const VERTICES_PER_ITEM: usize = 4;

/// Indices one item occupies in the index buffer.
pub const INDICES_PER_ITEM: usize = QUAD_INDICES.len();

/// Conversion of a batch item into the bytes its GPU buffer expects.
pub trait VertexSource: BatchItem {
    /// Per-vertex GPU layout for this kind.
    type Vertex: Pod;

    /// Name used in logs and error messages for this kind's buffer.
    const LABEL: &'static str;

    /// Whether draw runs of this kind bind a texture before drawing.
    const BINDS_TEXTURES: bool;

    /// Bytes one item occupies in the vertex buffer.
    const STRIDE: usize = std::mem::size_of::<Self::Vertex>() * VERTICES_PER_ITEM;

    /// The item's quad, in corner order TL, TR, BL, BR.
    fn vertices(&self, surface: Size<f32>) -> [Self::Vertex; VERTICES_PER_ITEM];
}

/// Vertex layout shared by texture and font glyph quads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Normalized texture coordinate.
    pub tex_coord: [f32; 2],
    /// Tint color, unit-interval channels.
    pub tint: [f32; 4],
}

assert_eq_size!(TexturedVertex, [f32; 8]);

/// Vertex layout for rectangle shapes. The quad covers the rectangle;
/// rounding and borders are resolved in the fragment shader from `shape`
/// and `params`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RectVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Fill/border color, unit-interval channels.
    pub color: [f32; 4],
    /// Center x, center y, half width, half height, all in pixels.
    pub shape: [f32; 4],
    /// Corner radius, border thickness, filled flag (0 or 1), unused.
    pub params: [f32; 4],
}

assert_eq_size!(RectVertex, [f32; 14]);

/// Vertex layout for line quads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Line color, unit-interval channels.
    pub color: [f32; 4],
}

assert_eq_size!(LineVertex, [f32; 6]);

/// Maps a screen-space point (pixels, top-left origin) to NDC.
fn to_ndc(point: Vec2, surface: Size<f32>) -> [f32; 2] {
    [
        map_value(point.x, 0.0, surface.width, -1.0, 1.0),
        map_value(point.y, 0.0, surface.height, 1.0, -1.0),
    ]
}

fn rotate_about(point: Vec2, center: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return point;
    }
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

/// Corners of `dest` scaled by `scale` and rotated by `angle` about its
/// center, in order TL, TR, BL, BR.
fn quad_corners(dest: Rect<f32>, scale: f32, angle: f32) -> [Vec2; 4] {
    let center = dest.center();
    let center = Vec2::new(center.x, center.y);
    let half = Vec2::new(dest.width, dest.height) * (scale / 2.0);

    [
        rotate_about(center + Vec2::new(-half.x, -half.y), center, angle),
        rotate_about(center + Vec2::new(half.x, -half.y), center, angle),
        rotate_about(center + Vec2::new(-half.x, half.y), center, angle),
        rotate_about(center + Vec2::new(half.x, half.y), center, angle),
    ]
}

#[allow(clippy::too_many_arguments)]
fn textured_quad(
    dest: Rect<f32>,
    scale: f32,
    angle: f32,
    src: Rect<f32>,
    texture_size: Size<f32>,
    effects: RenderEffects,
    tint: [f32; 4],
    surface: Size<f32>,
) -> [TexturedVertex; 4] {
    let corners = quad_corners(dest, scale, angle);

    let mut u0 = map_value(src.x, 0.0, texture_size.width, 0.0, 1.0);
    let mut u1 = map_value(src.right(), 0.0, texture_size.width, 0.0, 1.0);
    let mut v0 = map_value(src.y, 0.0, texture_size.height, 0.0, 1.0);
    let mut v1 = map_value(src.bottom(), 0.0, texture_size.height, 0.0, 1.0);

    if effects.contains(RenderEffects::FLIP_HORIZONTAL) {
        std::mem::swap(&mut u0, &mut u1);
    }
    if effects.contains(RenderEffects::FLIP_VERTICAL) {
        std::mem::swap(&mut v0, &mut v1);
    }

    let uvs = [[u0, v0], [u1, v0], [u0, v1], [u1, v1]];
    std::array::from_fn(|i| TexturedVertex {
        position: to_ndc(corners[i], surface),
        tex_coord: uvs[i],
        tint,
    })
}

impl VertexSource for TextureBatchItem {
    type Vertex = TexturedVertex;

    const LABEL: &'static str = "texture batch buffer";
    const BINDS_TEXTURES: bool = true;

    fn vertices(&self, surface: Size<f32>) -> [TexturedVertex; 4] {
        textured_quad(
            self.dest_rect,
            self.size,
            self.angle,
            self.src_rect,
            self.texture_size,
            self.effects,
            self.tint.to_unit_array(),
            surface,
        )
    }
}

impl VertexSource for FontGlyphBatchItem {
    type Vertex = TexturedVertex;

    const LABEL: &'static str = "font batch buffer";
    const BINDS_TEXTURES: bool = true;

    fn vertices(&self, surface: Size<f32>) -> [TexturedVertex; 4] {
        textured_quad(
            self.dest_rect,
            self.size,
            self.angle,
            self.src_rect,
            self.atlas_size,
            self.effects,
            self.tint.to_unit_array(),
            surface,
        )
    }
}

impl VertexSource for RectShapeBatchItem {
    type Vertex = RectVertex;

    const LABEL: &'static str = "rect batch buffer";
    const BINDS_TEXTURES: bool = false;

    fn vertices(&self, surface: Size<f32>) -> [RectVertex; 4] {
        let half = Vec2::new(self.width, self.height) / 2.0;
        let corners = [
            self.position + Vec2::new(-half.x, -half.y),
            self.position + Vec2::new(half.x, -half.y),
            self.position + Vec2::new(-half.x, half.y),
            self.position + Vec2::new(half.x, half.y),
        ];

        let color = self.color.to_unit_array();
        let shape = [self.position.x, self.position.y, half.x, half.y];
        let params = [
            self.corner_radius,
            self.border_thickness,
            if self.filled { 1.0 } else { 0.0 },
            0.0,
        ];

        std::array::from_fn(|i| RectVertex {
            position: to_ndc(corners[i], surface),
            color,
            shape,
            params,
        })
    }
}

impl VertexSource for LineBatchItem {
    type Vertex = LineVertex;

    const LABEL: &'static str = "line batch buffer";
    const BINDS_TEXTURES: bool = false;

    fn vertices(&self, surface: Size<f32>) -> [LineVertex; 4] {
        let dir = self.end - self.start;
        let length = dir.length();
        let normal = if length > 0.0 {
            Vec2::new(-dir.y, dir.x) / length * (self.thickness / 2.0)
        } else {
            Vec2::ZERO
        };

        let corners = [
            self.start + normal,
            self.end + normal,
            self.start - normal,
            self.end - normal,
        ];

        let color = self.color.to_unit_array();
        std::array::from_fn(|i| LineVertex {
            position: to_ndc(corners[i], surface),
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    const SURFACE: Size<f32> = Size {
        width: 100.0,
        height: 100.0,
    };

    #[test]
    fn surface_corners_map_to_ndc_extremes() {
        assert_eq!(to_ndc(Vec2::new(0.0, 0.0), SURFACE), [-1.0, 1.0]);
        assert_eq!(to_ndc(Vec2::new(100.0, 100.0), SURFACE), [1.0, -1.0]);
        assert_eq!(to_ndc(Vec2::new(50.0, 50.0), SURFACE), [0.0, 0.0]);
    }

    #[test]
    fn centered_quad_is_symmetric_in_ndc() {
        let item = TextureBatchItem {
            texture_id: 1,
            texture_size: Size::new(64.0, 64.0),
            src_rect: Rect::new(0.0, 0.0, 64.0, 64.0),
            dest_rect: Rect::new(25.0, 25.0, 50.0, 50.0),
            size: 1.0,
            tint: Rgba8::WHITE,
            ..Default::default()
        };

        let verts = item.vertices(SURFACE);
        // TL and BR mirror through the origin
        assert_eq!(verts[0].position[0], -verts[3].position[0]);
        assert_eq!(verts[0].position[1], -verts[3].position[1]);
        assert_eq!(verts[0].tex_coord, [0.0, 0.0]);
        assert_eq!(verts[3].tex_coord, [1.0, 1.0]);
        assert_eq!(verts[0].tint, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn horizontal_flip_swaps_u_coordinates() {
        let plain = TextureBatchItem {
            texture_id: 1,
            texture_size: Size::new(32.0, 32.0),
            src_rect: Rect::new(0.0, 0.0, 32.0, 32.0),
            dest_rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            size: 1.0,
            ..Default::default()
        };
        let flipped = TextureBatchItem {
            effects: RenderEffects::FLIP_HORIZONTAL,
            ..plain
        };

        let a = plain.vertices(SURFACE);
        let b = flipped.vertices(SURFACE);
        assert_eq!(a[0].tex_coord[0], b[1].tex_coord[0]);
        assert_eq!(a[1].tex_coord[0], b[0].tex_coord[0]);
        // positions are untouched by flips
        assert_eq!(a[0].position, b[0].position);
    }

    #[test]
    fn quarter_turn_rotates_corners() {
        let corners = quad_corners(
            Rect::new(-1.0, -1.0, 2.0, 2.0),
            1.0,
            std::f32::consts::FRAC_PI_2,
        );
        // TL (-1,-1) rotates to (1,-1) about the origin
        assert!((corners[0].x - 1.0).abs() < 1e-6);
        assert!((corners[0].y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn scale_factor_grows_the_quad_about_its_center() {
        let small = quad_corners(Rect::new(40.0, 40.0, 20.0, 20.0), 1.0, 0.0);
        let large = quad_corners(Rect::new(40.0, 40.0, 20.0, 20.0), 2.0, 0.0);

        // same center, doubled extent
        assert_eq!(small[0], Vec2::new(40.0, 40.0));
        assert_eq!(large[0], Vec2::new(30.0, 30.0));
        assert_eq!(large[3], Vec2::new(70.0, 70.0));
    }

    #[test]
    fn line_quad_spans_thickness() {
        let item = LineBatchItem {
            start: Vec2::new(0.0, 50.0),
            end: Vec2::new(100.0, 50.0),
            thickness: 10.0,
            color: Rgba8::RED,
            ..Default::default()
        };

        let verts = item.vertices(SURFACE);
        // horizontal line: normal points along y, half thickness each way
        let y_top = verts[0].position[1];
        let y_bottom = verts[2].position[1];
        assert!((y_top - y_bottom).abs() > 0.0);
        assert_eq!(verts[0].color, Rgba8::RED.to_unit_array());
    }

    #[test]
    fn degenerate_line_collapses_to_a_point() {
        let item = LineBatchItem {
            start: Vec2::new(10.0, 10.0),
            end: Vec2::new(10.0, 10.0),
            thickness: 4.0,
            ..Default::default()
        };

        let verts = item.vertices(SURFACE);
        assert_eq!(verts[0].position, verts[3].position);
    }

    #[test]
    fn rect_params_carry_shape_data_in_pixels() {
        let item = RectShapeBatchItem {
            position: Vec2::new(50.0, 50.0),
            width: 20.0,
            height: 10.0,
            color: Rgba8::GREEN,
            filled: true,
            corner_radius: 3.0,
            border_thickness: 0.0,
            ..Default::default()
        };

        let verts = item.vertices(SURFACE);
        assert_eq!(verts[0].shape, [50.0, 50.0, 10.0, 5.0]);
        assert_eq!(verts[0].params, [3.0, 0.0, 1.0, 0.0]);
    }
}
