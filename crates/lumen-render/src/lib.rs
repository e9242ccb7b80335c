//! Lumen batch rendering core.
//!
//! Draw requests accumulate in per-kind [`BatchingService`]s, are sorted
//! into a layer-consistent order at flush time, uploaded through per-kind
//! [`GpuBufferManager`]s, and submitted with one draw call per run of
//! items sharing a texture. Device lifecycle (context creation, capacity
//! changes, shutdown) arrives as notifications on the
//! [`EventBus`](lumen_core::bus::EventBus); every shader and buffer
//! manager reacts to those instead of being driven by direct calls.

pub mod batch_item;
pub mod batching;
pub mod buffer;
pub mod color;
pub mod config;
pub mod effects;
pub mod error;
pub mod render_item;
pub mod shader;
pub mod sprite_batch;
pub mod vertex;

pub use batch_item::{
    BatchItem, FontGlyphBatchItem, LineBatchItem, RectShapeBatchItem, TextureBatchItem,
};
pub use batching::{BatchAdd, BatchingService};
pub use buffer::GpuBufferManager;
pub use color::Rgba8;
pub use config::RenderConfig;
pub use effects::RenderEffects;
pub use error::{RenderError, RenderResult};
pub use render_item::RenderItem;
pub use shader::{ShaderKind, ShaderProgram, ShaderState};
pub use sprite_batch::{FrameStats, SpriteBatch};
pub use vertex::{LineVertex, RectVertex, TexturedVertex, VertexSource};
