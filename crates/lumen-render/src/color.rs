use lumen_core::math::map_byte;

/// An RGBA tint color with 8-bit channels.
///
/// Batch items carry colors as bytes; the unit-interval `f32` channels the
/// GPU expects are produced by [`to_unit_array`](Self::to_unit_array)
/// during vertex generation, using the engine's shared range mapping.
///
/// ```
/// use lumen_render::Rgba8;
///
/// let red = Rgba8::rgb(255, 0, 0);
/// let faded = Rgba8::rgba(255, 255, 255, 128);
/// assert_eq!(red.to_unit_array()[0], 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    pub const RED: Rgba8 = Rgba8::rgb(255, 0, 0);
    pub const GREEN: Rgba8 = Rgba8::rgb(0, 255, 0);
    pub const BLUE: Rgba8 = Rgba8::rgb(0, 0, 255);
    pub const TRANSPARENT: Rgba8 = Rgba8::rgba(0, 0, 0, 0);

    /// Create a color from RGB bytes with full opacity.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color from RGBA bytes.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels mapped from `0..=255` into `0.0..=1.0`.
    pub fn to_unit_array(self) -> [f32; 4] {
        [
            map_byte(self.r, 0.0, 1.0),
            map_byte(self.g, 0.0, 1.0),
            map_byte(self.b, 0.0, 1.0),
            map_byte(self.a, 0.0, 1.0),
        ]
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(arr: [u8; 4]) -> Self {
        Self {
            r: arr[0],
            g: arr[1],
            b: arr[2],
            a: arr[3],
        }
    }
}
