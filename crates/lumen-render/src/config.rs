/// Construction-time configuration for the rendering core.
///
/// Replaces the kind of metadata other engines bake in via attributes or
/// reflection: everything is an explicit value handed to constructors.
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Items each per-kind batch holds before an add forces a flush. Also
    /// spliced into shader source as `${BATCH_SIZE}`.
    pub batch_size: u32,
    /// Initial render-surface width in pixels.
    pub surface_width: u32,
    /// Initial render-surface height in pixels.
    pub surface_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            batch_size: 100,
            surface_width: 1280,
            surface_height: 720,
        }
    }
}
