use bitflags::bitflags;

bitflags! {
    /// Mirroring applied to a texture or glyph when it is drawn.
    ///
    /// Flips are implemented by swapping texture coordinates during vertex
    /// generation; geometry is unaffected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderEffects: u8 {
        const FLIP_HORIZONTAL = 1 << 0;
        const FLIP_VERTICAL = 1 << 1;
    }
}

impl Default for RenderEffects {
    fn default() -> Self {
        RenderEffects::empty()
    }
}
