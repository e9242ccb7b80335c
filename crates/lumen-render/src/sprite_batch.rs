//! Frame orchestration across the four batch kinds.
//!
//! [`SpriteBatch`] owns one batching service, buffer manager, and shader
//! program per kind. Draw requests queue until either a batch overflows
//! (that kind flushes immediately) or the frame ends. `end_frame` merges
//! every queued item into one globally layer-sorted sequence, so a rect on
//! layer 1 draws behind a texture on layer 2 even though they live in
//! different batches. Within a layer, submission order wins, and across
//! kinds sharing a layer the order is texture, font, rect, line.
//!
//! Consecutive items sharing an asset id collapse into a single indexed
//! draw call over the already-uploaded vertex range.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::bus::{BatchKind, EventBus};
use lumen_core::geometry::Size;
use lumen_test_utils::{GpuInvoker, ShaderSourceLoader};

use crate::batch_item::{
    FontGlyphBatchItem, LineBatchItem, RectShapeBatchItem, TextureBatchItem,
};
use crate::batching::{BatchAdd, BatchingService};
use crate::buffer::GpuBufferManager;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::render_item::RenderItem;
use crate::shader::{ShaderKind, ShaderProgram};
use crate::vertex::{INDICES_PER_ITEM, VertexSource};

/// Counters for one frame, returned by [`SpriteBatch::end_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Indexed draw submissions, after asset-id coalescing.
    pub draw_calls: u32,
    /// Items that reached the GPU.
    pub items_rendered: u32,
    /// Flush operations, overflow flushes included.
    pub batches_flushed: u32,
}

/// The rendering core's public entry point.
pub struct SpriteBatch {
    gpu: Rc<dyn GpuInvoker>,
    surface: Size<f32>,
    stats: FrameStats,

    textures: Rc<RefCell<BatchingService<TextureBatchItem>>>,
    fonts: Rc<RefCell<BatchingService<FontGlyphBatchItem>>>,
    rects: Rc<RefCell<BatchingService<RectShapeBatchItem>>>,
    lines: Rc<RefCell<BatchingService<LineBatchItem>>>,

    texture_buffer: GpuBufferManager<TextureBatchItem>,
    font_buffer: GpuBufferManager<FontGlyphBatchItem>,
    rect_buffer: GpuBufferManager<RectShapeBatchItem>,
    line_buffer: GpuBufferManager<LineBatchItem>,

    texture_shader: ShaderProgram,
    font_shader: ShaderProgram,
    rect_shader: ShaderProgram,
    line_shader: ShaderProgram,
}

impl SpriteBatch {
    /// Wires up every per-kind component against `bus`. Nothing touches
    /// the GPU until the context-initialized notification arrives.
    pub fn new(
        bus: &EventBus,
        gpu: Rc<dyn GpuInvoker>,
        loader: Rc<dyn ShaderSourceLoader>,
        config: RenderConfig,
    ) -> Self {
        let size = config.batch_size;
        tracing::info!(
            batch_size = size,
            surface_width = config.surface_width,
            surface_height = config.surface_height,
            "creating sprite batch"
        );

        Self {
            surface: Size::new(config.surface_width as f32, config.surface_height as f32),
            stats: FrameStats::default(),

            textures: BatchingService::new(bus, size),
            fonts: BatchingService::new(bus, size),
            rects: BatchingService::new(bus, size),
            lines: BatchingService::new(bus, size),

            texture_buffer: GpuBufferManager::new(bus, Rc::clone(&gpu), size),
            font_buffer: GpuBufferManager::new(bus, Rc::clone(&gpu), size),
            rect_buffer: GpuBufferManager::new(bus, Rc::clone(&gpu), size),
            line_buffer: GpuBufferManager::new(bus, Rc::clone(&gpu), size),

            texture_shader: ShaderProgram::new(
                bus,
                Rc::clone(&gpu),
                Rc::clone(&loader),
                ShaderKind::Texture,
                size,
            ),
            font_shader: ShaderProgram::new(
                bus,
                Rc::clone(&gpu),
                Rc::clone(&loader),
                ShaderKind::Font,
                size,
            ),
            rect_shader: ShaderProgram::new(
                bus,
                Rc::clone(&gpu),
                Rc::clone(&loader),
                ShaderKind::Rect,
                size,
            ),
            line_shader: ShaderProgram::new(bus, Rc::clone(&gpu), loader, ShaderKind::Line, size),

            gpu,
        }
    }

    /// Queues a textured quad, flushing the texture batch if it was full.
    pub fn render_texture(&mut self, item: TextureBatchItem) -> RenderResult<()> {
        if self.textures.borrow_mut().add(item) == BatchAdd::Overflowed {
            tracing::trace!("texture batch full, flushing");
            Self::flush_kind(
                &self.gpu,
                &self.textures,
                &self.texture_buffer,
                &self.texture_shader,
                self.surface,
                &mut self.stats,
            )?;
        }
        Ok(())
    }

    /// Queues a font glyph, flushing the font batch if it was full.
    pub fn render_glyph(&mut self, item: FontGlyphBatchItem) -> RenderResult<()> {
        if self.fonts.borrow_mut().add(item) == BatchAdd::Overflowed {
            tracing::trace!("font batch full, flushing");
            Self::flush_kind(
                &self.gpu,
                &self.fonts,
                &self.font_buffer,
                &self.font_shader,
                self.surface,
                &mut self.stats,
            )?;
        }
        Ok(())
    }

    /// Queues a rectangle shape, flushing the rect batch if it was full.
    pub fn render_rect(&mut self, item: RectShapeBatchItem) -> RenderResult<()> {
        if self.rects.borrow_mut().add(item) == BatchAdd::Overflowed {
            tracing::trace!("rect batch full, flushing");
            Self::flush_kind(
                &self.gpu,
                &self.rects,
                &self.rect_buffer,
                &self.rect_shader,
                self.surface,
                &mut self.stats,
            )?;
        }
        Ok(())
    }

    /// Queues a line segment, flushing the line batch if it was full.
    pub fn render_line(&mut self, item: LineBatchItem) -> RenderResult<()> {
        if self.lines.borrow_mut().add(item) == BatchAdd::Overflowed {
            tracing::trace!("line batch full, flushing");
            Self::flush_kind(
                &self.gpu,
                &self.lines,
                &self.line_buffer,
                &self.line_shader,
                self.surface,
                &mut self.stats,
            )?;
        }
        Ok(())
    }

    /// Draws everything still queued, empties every batch, and returns the
    /// frame's counters (overflow flushes included).
    pub fn end_frame(&mut self) -> RenderResult<FrameStats> {
        let textures = self.textures.borrow().snapshot();
        let fonts = self.fonts.borrow().snapshot();
        let rects = self.rects.borrow().snapshot();
        let lines = self.lines.borrow().snapshot();

        // one entry per queued item; push order fixes the cross-kind tie
        // order within a layer
        let mut entries: Vec<(i32, BatchKind, usize)> =
            Vec::with_capacity(textures.len() + fonts.len() + rects.len() + lines.len());
        entries.extend(index_entries(&textures, BatchKind::Texture));
        entries.extend(index_entries(&fonts, BatchKind::Font));
        entries.extend(index_entries(&rects, BatchKind::Rect));
        entries.extend(index_entries(&lines, BatchKind::Line));
        entries.sort_by_key(|&(layer, _, _)| layer);

        let mut start = 0;
        while start < entries.len() {
            let kind = entries[start].1;
            let mut end = start + 1;
            while end < entries.len() && entries[end].1 == kind {
                end += 1;
            }
            let run = &entries[start..end];

            match kind {
                BatchKind::Texture => {
                    let items: Vec<_> = run.iter().map(|&(_, _, i)| textures[i].item).collect();
                    Self::draw_items(
                        &self.gpu,
                        &self.texture_buffer,
                        &self.texture_shader,
                        &items,
                        self.surface,
                        &mut self.stats,
                    )?;
                }
                BatchKind::Font => {
                    let items: Vec<_> = run.iter().map(|&(_, _, i)| fonts[i].item).collect();
                    Self::draw_items(
                        &self.gpu,
                        &self.font_buffer,
                        &self.font_shader,
                        &items,
                        self.surface,
                        &mut self.stats,
                    )?;
                }
                BatchKind::Rect => {
                    let items: Vec<_> = run.iter().map(|&(_, _, i)| rects[i].item).collect();
                    Self::draw_items(
                        &self.gpu,
                        &self.rect_buffer,
                        &self.rect_shader,
                        &items,
                        self.surface,
                        &mut self.stats,
                    )?;
                }
                BatchKind::Line => {
                    let items: Vec<_> = run.iter().map(|&(_, _, i)| lines[i].item).collect();
                    Self::draw_items(
                        &self.gpu,
                        &self.line_buffer,
                        &self.line_shader,
                        &items,
                        self.surface,
                        &mut self.stats,
                    )?;
                }
            }
            start = end;
        }

        self.textures.borrow_mut().empty_batch();
        self.fonts.borrow_mut().empty_batch();
        self.rects.borrow_mut().empty_batch();
        self.lines.borrow_mut().empty_batch();

        let drained = [
            !textures.is_empty(),
            !fonts.is_empty(),
            !rects.is_empty(),
            !lines.is_empty(),
        ]
        .into_iter()
        .filter(|&occupied| occupied)
        .count();
        self.stats.batches_flushed += drained as u32;

        let stats = self.stats;
        self.stats = FrameStats::default();
        Ok(stats)
    }

    /// Resize hook for the frame driver; affects NDC mapping of later
    /// uploads.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface = Size::new(width as f32, height as f32);
    }

    pub fn surface_size(&self) -> Size<f32> {
        self.surface
    }

    /// Uploads `items` at slot 0 and submits one draw call per run of
    /// consecutive items sharing an asset id.
    fn draw_items<T: VertexSource>(
        gpu: &Rc<dyn GpuInvoker>,
        buffer: &GpuBufferManager<T>,
        shader: &ShaderProgram,
        items: &[T],
        surface: Size<f32>,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        buffer.upload(items, 0, surface)?;
        shader.use_program()?;

        let mut start = 0;
        while start < items.len() {
            let asset = items[start].asset_id();
            let mut end = start + 1;
            while end < items.len() && items[end].asset_id() == asset {
                end += 1;
            }

            if T::BINDS_TEXTURES {
                gpu.bind_texture(asset);
            }
            gpu.draw_elements(
                ((end - start) * INDICES_PER_ITEM) as u32,
                (start * INDICES_PER_ITEM) as u32,
            );
            stats.draw_calls += 1;
            start = end;
        }

        stats.items_rendered += items.len() as u32;
        Ok(())
    }

    /// Overflow path: drains one kind's batch on its own, layer-sorted
    /// within the kind.
    fn flush_kind<T: VertexSource>(
        gpu: &Rc<dyn GpuInvoker>,
        service: &Rc<RefCell<BatchingService<T>>>,
        buffer: &GpuBufferManager<T>,
        shader: &ShaderProgram,
        surface: Size<f32>,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        let mut snapshot = service.borrow().snapshot();
        if snapshot.is_empty() {
            return Ok(());
        }
        snapshot.sort_by_key(|entry| entry.layer);

        let items: Vec<T> = snapshot.iter().map(|entry| entry.item).collect();
        Self::draw_items(gpu, buffer, shader, &items, surface, stats)?;

        service.borrow_mut().empty_batch();
        stats.batches_flushed += 1;
        Ok(())
    }
}

fn index_entries<T>(
    items: &[RenderItem<T>],
    kind: BatchKind,
) -> impl Iterator<Item = (i32, BatchKind, usize)> + '_ {
    items
        .iter()
        .enumerate()
        .map(move |(i, entry)| (entry.layer, kind, i))
}
