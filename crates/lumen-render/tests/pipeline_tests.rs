//! End-to-end exercises of the batch rendering pipeline against the mock
//! GPU: queueing, overflow flushes, layer-merged frame ends, draw-call
//! coalescing, and notification-driven lifecycle.

use std::rc::Rc;

use lumen_core::bus::{BatchKind, BatchSizeChange, EventBus};
use lumen_core::geometry::{Rect, Size};
use lumen_render::{
    FontGlyphBatchItem, LineBatchItem, RectShapeBatchItem, RenderConfig, RenderError, SpriteBatch,
    TextureBatchItem,
};
use lumen_test_utils::{GpuInvoker, MockGpuInvoker, ShaderSourceLoader, TemplateShaderLoader};

fn pipeline(batch_size: u32) -> (EventBus, Rc<MockGpuInvoker>, SpriteBatch) {
    let bus = EventBus::new();
    let gpu = Rc::new(MockGpuInvoker::new());
    let loader = Rc::new(TemplateShaderLoader::new());
    for name in ["texture", "font", "rect", "line"] {
        loader.insert(name, "const N: u32 = ${BATCH_SIZE};", "void main() {}");
    }

    let batch = SpriteBatch::new(
        &bus,
        Rc::clone(&gpu) as Rc<dyn GpuInvoker>,
        loader as Rc<dyn ShaderSourceLoader>,
        RenderConfig {
            batch_size,
            surface_width: 640,
            surface_height: 480,
        },
    );
    (bus, gpu, batch)
}

fn texture(texture_id: u32, layer: i32) -> TextureBatchItem {
    TextureBatchItem {
        texture_id,
        texture_size: Size::new(32.0, 32.0),
        src_rect: Rect::new(0.0, 0.0, 32.0, 32.0),
        dest_rect: Rect::new(10.0, 10.0, 32.0, 32.0),
        size: 1.0,
        layer,
        ..Default::default()
    }
}

fn glyph(atlas_id: u32, glyph: char, layer: i32) -> FontGlyphBatchItem {
    FontGlyphBatchItem {
        atlas_id,
        atlas_size: Size::new(256.0, 256.0),
        glyph,
        src_rect: Rect::new(0.0, 0.0, 12.0, 16.0),
        dest_rect: Rect::new(50.0, 50.0, 12.0, 16.0),
        size: 1.0,
        layer,
        ..Default::default()
    }
}

fn rect(layer: i32) -> RectShapeBatchItem {
    RectShapeBatchItem {
        position: glam::Vec2::new(100.0, 100.0),
        width: 40.0,
        height: 20.0,
        filled: true,
        layer,
        ..Default::default()
    }
}

fn line(layer: i32) -> LineBatchItem {
    LineBatchItem {
        start: glam::Vec2::new(0.0, 0.0),
        end: glam::Vec2::new(50.0, 50.0),
        thickness: 2.0,
        layer,
        ..Default::default()
    }
}

#[test]
fn consecutive_same_texture_items_share_one_draw_call() {
    let (bus, gpu, mut batch) = pipeline(10);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    batch.render_texture(texture(7, 0)).unwrap();
    batch.render_texture(texture(7, 0)).unwrap();
    batch.render_texture(texture(9, 0)).unwrap();

    let stats = batch.end_frame().unwrap();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.items_rendered, 3);
    assert_eq!(stats.batches_flushed, 1);

    // two quads for texture 7, one for texture 9, drawn over the uploaded
    // vertex range
    assert_eq!(gpu.draw_calls(), vec![(12, 0), (6, 12)]);
    assert_eq!(gpu.bound_textures(), vec![7, 9]);
}

#[test]
fn interleaved_texture_ids_do_not_coalesce() {
    let (bus, gpu, mut batch) = pipeline(10);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    batch.render_texture(texture(1, 0)).unwrap();
    batch.render_texture(texture(2, 0)).unwrap();
    batch.render_texture(texture(1, 0)).unwrap();

    let stats = batch.end_frame().unwrap();
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(gpu.bound_textures(), vec![1, 2, 1]);
}

#[test]
fn layers_order_the_frame_across_kinds() {
    let (bus, gpu, mut batch) = pipeline(10);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    // distinct item counts per kind so draw sizes identify the kind:
    // 1 texture quad, 2 glyph quads, 3 rect quads, 4 line quads
    batch.render_line(line(0)).unwrap();
    batch.render_line(line(0)).unwrap();
    batch.render_line(line(0)).unwrap();
    batch.render_line(line(0)).unwrap();
    batch.render_rect(rect(-1)).unwrap();
    batch.render_rect(rect(-1)).unwrap();
    batch.render_rect(rect(-1)).unwrap();
    batch.render_glyph(glyph(5, 'a', -2)).unwrap();
    batch.render_glyph(glyph(5, 'b', -2)).unwrap();
    batch.render_texture(texture(1, -3)).unwrap();

    let stats = batch.end_frame().unwrap();
    assert_eq!(stats.items_rendered, 10);
    assert_eq!(stats.batches_flushed, 4);

    // lowest layer first: texture (-3), font (-2), rect (-1), line (0)
    assert_eq!(
        gpu.draw_calls(),
        vec![(6, 0), (12, 0), (18, 0), (24, 0)]
    );
}

#[test]
fn kinds_sharing_a_layer_draw_in_texture_font_rect_line_order() {
    let (bus, gpu, mut batch) = pipeline(10);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    // submission order deliberately scrambled; all on one layer
    batch.render_line(line(3)).unwrap();
    batch.render_rect(rect(3)).unwrap();
    batch.render_rect(rect(3)).unwrap();
    batch.render_glyph(glyph(5, 'x', 3)).unwrap();
    batch.render_glyph(glyph(5, 'y', 3)).unwrap();
    batch.render_glyph(glyph(5, 'z', 3)).unwrap();
    batch.render_texture(texture(1, 3)).unwrap();
    batch.render_texture(texture(1, 3)).unwrap();
    batch.render_texture(texture(1, 3)).unwrap();
    batch.render_texture(texture(1, 3)).unwrap();

    batch.end_frame().unwrap();

    // 4 texture quads, 3 glyph quads, 2 rect quads, 1 line quad
    assert_eq!(
        gpu.draw_calls(),
        vec![(24, 0), (18, 0), (12, 0), (6, 0)]
    );
}

#[test]
fn items_sharing_a_layer_keep_submission_order() {
    let (bus, gpu, mut batch) = pipeline(10);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    batch.render_texture(texture(4, 1)).unwrap();
    batch.render_texture(texture(8, 1)).unwrap();
    batch.render_texture(texture(4, 1)).unwrap();
    batch.render_texture(texture(8, 0)).unwrap();

    batch.end_frame().unwrap();

    // layer 0 first, then layer 1 in submission order
    assert_eq!(gpu.bound_textures(), vec![8, 4, 8, 4]);
}

#[test]
fn overflowing_a_batch_flushes_it_immediately() {
    let (bus, gpu, mut batch) = pipeline(2);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    batch.render_texture(texture(1, 0)).unwrap();
    batch.render_texture(texture(2, 0)).unwrap();
    // overflow: the oldest slot is overwritten, then the batch drains
    batch.render_texture(texture(3, 0)).unwrap();

    assert_eq!(gpu.count_draw_calls(), 2);
    assert_eq!(gpu.bound_textures(), vec![3, 2]);

    // the overflow flush emptied the batch; the frame has nothing left
    let stats = batch.end_frame().unwrap();
    assert_eq!(stats.items_rendered, 2);
    assert_eq!(stats.batches_flushed, 1);
    assert_eq!(gpu.count_draw_calls(), 2);
}

#[test]
fn overflow_in_one_kind_leaves_other_kinds_queued() {
    let (bus, gpu, mut batch) = pipeline(2);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    batch.render_rect(rect(0)).unwrap();
    batch.render_texture(texture(1, 0)).unwrap();
    batch.render_texture(texture(2, 0)).unwrap();
    batch.render_texture(texture(3, 0)).unwrap();

    // only the texture overflow has drawn so far
    assert_eq!(gpu.count_draw_calls(), 2);

    let stats = batch.end_frame().unwrap();
    assert_eq!(stats.items_rendered, 3);
    assert_eq!(stats.batches_flushed, 2);
}

#[test]
fn rendering_before_context_init_fails() {
    let (_bus, _gpu, mut batch) = pipeline(4);

    batch.render_texture(texture(1, 0)).unwrap();
    let err = batch.end_frame().unwrap_err();
    assert!(matches!(err, RenderError::NotInitialized { .. }));
}

#[test]
fn empty_frame_touches_nothing() {
    let (bus, gpu, mut batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();
    gpu.clear_calls();

    let stats = batch.end_frame().unwrap();
    assert_eq!(stats, Default::default());
    assert_eq!(gpu.call_count(), 0);
}

#[test]
fn stats_reset_between_frames() {
    let (bus, _gpu, mut batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();

    batch.render_texture(texture(1, 0)).unwrap();
    let first = batch.end_frame().unwrap();
    assert_eq!(first.items_rendered, 1);

    let second = batch.end_frame().unwrap();
    assert_eq!(second, Default::default());
}

#[test]
fn context_init_builds_every_per_kind_resource() {
    let (bus, gpu, _batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();

    // four buffer managers, a vertex and an index buffer each
    assert_eq!(gpu.count_buffer_creates(), 8);
    // one linked program per kind
    assert_eq!(gpu.count_program_creates(), 4);
}

#[test]
fn context_reinit_rebuilds_without_deleting_stale_handles() {
    let (bus, gpu, _batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();
    bus.gl_init.publish(&()).unwrap();

    assert_eq!(gpu.count_buffer_creates(), 16);
    assert_eq!(gpu.count_program_creates(), 8);
    assert_eq!(gpu.count_buffer_deletes(), 0);
    assert_eq!(gpu.count_program_deletes(), 0);
}

#[test]
fn shutdown_releases_everything_exactly_once() {
    let (bus, gpu, batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();

    bus.shutdown.publish(&()).unwrap();
    bus.shutdown.publish(&()).unwrap();

    assert_eq!(gpu.count_buffer_deletes(), 8);
    assert_eq!(gpu.count_program_deletes(), 4);

    drop(batch);
    assert_eq!(gpu.count_buffer_deletes(), 8);
    assert_eq!(gpu.count_program_deletes(), 4);
}

#[test]
fn rendering_after_shutdown_fails() {
    let (bus, _gpu, mut batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();
    bus.shutdown.publish(&()).unwrap();

    batch.render_texture(texture(1, 0)).unwrap();
    let err = batch.end_frame().unwrap_err();
    assert!(matches!(err, RenderError::ShutDown { .. }));
}

#[test]
fn batch_size_notification_resizes_one_kind() {
    let (bus, gpu, mut batch) = pipeline(4);
    bus.gl_init.publish(&()).unwrap();

    bus.batch_size
        .publish(&BatchSizeChange {
            size: 2,
            kind: BatchKind::Texture,
        })
        .unwrap();
    gpu.clear_calls();

    // the texture batch now overflows on the third add
    batch.render_texture(texture(1, 0)).unwrap();
    batch.render_texture(texture(2, 0)).unwrap();
    batch.render_texture(texture(3, 0)).unwrap();
    assert_eq!(gpu.count_draw_calls(), 2);

    // other kinds kept their original capacity
    batch.render_rect(rect(0)).unwrap();
    batch.render_rect(rect(0)).unwrap();
    batch.render_rect(rect(0)).unwrap();
    assert_eq!(gpu.count_draw_calls(), 2);
}

#[test]
fn shader_sources_receive_the_configured_batch_size() {
    let (bus, gpu, _batch) = pipeline(77);
    bus.gl_init.publish(&()).unwrap();

    let sources = gpu.shader_sources();
    assert_eq!(sources.len(), 8);
    assert!(sources.iter().all(|s| s.contains("77") || s == "void main() {}"));
}
