//! GPU buffer lifecycle, one manager per batch item kind.
//!
//! A [`GpuBufferManager`] owns the vertex and index buffers that a batch of
//! one kind uploads into. It creates nothing until the context-initialized
//! notification arrives, reallocates when its kind's batch size changes,
//! and releases everything on the shutdown notification. Repeated
//! context-initialized notifications mean the previous context is gone:
//! the stale handles are discarded without delete calls and fresh buffers
//! are created.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use lumen_core::bus::{BatchSizeChange, EventBus, Subscription};
use lumen_core::geometry::Size;
use lumen_test_utils::{BufferHandle, BufferKind, GpuInvoker};

use crate::error::{RenderError, RenderResult};
use crate::vertex::{INDICES_PER_ITEM, QUAD_INDICES, VertexSource};

/// Owns the vertex/index buffer pair for one batch kind.
pub struct GpuBufferManager<T: VertexSource> {
    inner: Rc<RefCell<BufferInner<T>>>,
}

struct BufferInner<T: VertexSource> {
    gpu: Rc<dyn GpuInvoker>,
    batch_size: u32,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    initialized: bool,
    shut_down: bool,
    subs: Vec<Subscription>,
    _kind: PhantomData<T>,
}

impl<T: VertexSource> GpuBufferManager<T> {
    /// Creates an uninitialized manager subscribed to the
    /// context-initialized, batch-size, and shutdown streams.
    pub fn new(bus: &EventBus, gpu: Rc<dyn GpuInvoker>, batch_size: u32) -> Self {
        let inner = Rc::new(RefCell::new(BufferInner {
            gpu,
            batch_size,
            vertex_buffer: None,
            index_buffer: None,
            initialized: false,
            shut_down: false,
            subs: Vec::new(),
            _kind: PhantomData,
        }));

        let init_sub = bus.gl_init.subscribe({
            let inner = Rc::clone(&inner);
            move |_: &()| {
                inner.borrow_mut().initialize();
                Ok(())
            }
        });
        let resize_sub = bus.batch_size.subscribe({
            let inner = Rc::clone(&inner);
            move |change: &BatchSizeChange| {
                if change.kind != T::KIND {
                    return Ok(());
                }
                if change.size == 0 {
                    return Err(RenderError::InvalidNotification {
                        stream: "batch-size-changed",
                        reason: format!("batch size of 0 for {}", T::LABEL),
                    }
                    .into());
                }
                inner.borrow_mut().apply_batch_size(change.size);
                Ok(())
            }
        });
        let shutdown_sub = bus.shutdown.subscribe({
            let inner = Rc::clone(&inner);
            move |_: &()| {
                inner.borrow_mut().shut_down();
                Ok(())
            }
        });
        inner
            .borrow_mut()
            .subs
            .extend([init_sub, resize_sub, shutdown_sub]);

        Self { inner }
    }

    /// Generates vertices for `items` and writes them into the vertex
    /// buffer starting at slot `start_slot`.
    pub fn upload(&self, items: &[T], start_slot: u32, surface: Size<f32>) -> RenderResult<()> {
        let inner = self.inner.borrow();
        if inner.shut_down {
            return Err(RenderError::ShutDown { resource: T::LABEL });
        }
        let Some(vertex_buffer) = inner.vertex_buffer else {
            return Err(RenderError::NotInitialized { resource: T::LABEL });
        };

        debug_assert!(start_slot as usize + items.len() <= inner.batch_size as usize);

        let quads: Vec<[T::Vertex; 4]> = items.iter().map(|item| item.vertices(surface)).collect();
        let offset = start_slot as u64 * T::STRIDE as u64;
        inner
            .gpu
            .update_buffer(vertex_buffer, offset, bytemuck::cast_slice(&quads));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.borrow().initialized
    }

    pub fn batch_size(&self) -> u32 {
        self.inner.borrow().batch_size
    }
}

impl<T: VertexSource> Drop for GpuBufferManager<T> {
    fn drop(&mut self) {
        self.inner.borrow_mut().shut_down();
    }
}

impl<T: VertexSource> BufferInner<T> {
    fn initialize(&mut self) {
        if self.shut_down {
            return;
        }
        // any handles from a previous context are dead, not deletable
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.create_buffers();
        self.initialized = true;
        tracing::debug!(
            buffer = T::LABEL,
            batch_size = self.batch_size,
            "buffers allocated"
        );
    }

    fn apply_batch_size(&mut self, size: u32) {
        self.batch_size = size;
        if self.initialized && !self.shut_down {
            self.release_buffers();
            self.create_buffers();
        }
    }

    fn shut_down(&mut self) {
        if self.shut_down {
            return;
        }
        self.release_buffers();
        self.subs.clear();
        self.initialized = false;
        self.shut_down = true;
        tracing::debug!(buffer = T::LABEL, "buffers released");
    }

    fn create_buffers(&mut self) {
        let vertex_buffer = self.gpu.create_buffer(BufferKind::Vertex);
        self.gpu
            .allocate_buffer(vertex_buffer, self.batch_size as u64 * T::STRIDE as u64);

        // the index pattern never changes, so it is written once per
        // allocation
        let index_buffer = self.gpu.create_buffer(BufferKind::Index);
        let indices: Vec<u32> = (0..self.batch_size)
            .flat_map(|quad| QUAD_INDICES.map(|i| quad * 4 + i))
            .collect();
        self.gpu.allocate_buffer(
            index_buffer,
            self.batch_size as u64 * INDICES_PER_ITEM as u64 * size_of::<u32>() as u64,
        );
        self.gpu
            .update_buffer(index_buffer, 0, bytemuck::cast_slice(&indices));

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }

    fn release_buffers(&mut self) {
        if let Some(buffer) = self.vertex_buffer.take() {
            self.gpu.delete_buffer(buffer);
        }
        if let Some(buffer) = self.index_buffer.take() {
            self.gpu.delete_buffer(buffer);
        }
    }
}
