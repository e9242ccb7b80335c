//! Shader program lifecycle, one program per batch kind.
//!
//! A [`ShaderProgram`] starts uninitialized and moves through exactly two
//! transitions: the context-initialized notification compiles and links
//! it, and the shutdown notification releases it for good. Shut down is
//! terminal; a later context-initialized notification does not revive the
//! program. Compile and link failures follow the info-log convention, a
//! non-empty log is the backend's error text.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lumen_core::bus::{EventBus, Subscription};
use lumen_test_utils::{GpuInvoker, ProgramHandle, ShaderSourceLoader, ShaderStage};

use crate::error::{RenderError, RenderResult};

/// Which batch kind a shader program draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Texture,
    Font,
    Rect,
    Line,
}

impl ShaderKind {
    /// Name the source loader resolves, also used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ShaderKind::Texture => "texture",
            ShaderKind::Font => "font",
            ShaderKind::Rect => "rect",
            ShaderKind::Line => "line",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            ShaderKind::Texture => "texture shader program",
            ShaderKind::Font => "font shader program",
            ShaderKind::Rect => "rect shader program",
            ShaderKind::Line => "line shader program",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of a [`ShaderProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderState {
    /// Created, waiting for the context-initialized notification.
    Uninitialized,
    /// Compiled and linked against the current context.
    Initialized,
    /// Released. Terminal.
    ShutDown,
}

/// One linked GPU program, driven by bus notifications.
pub struct ShaderProgram {
    inner: Rc<RefCell<ShaderInner>>,
}

struct ShaderInner {
    gpu: Rc<dyn GpuInvoker>,
    loader: Rc<dyn ShaderSourceLoader>,
    kind: ShaderKind,
    batch_size: u32,
    state: ShaderState,
    program: Option<ProgramHandle>,
    subs: Vec<Subscription>,
}

impl ShaderProgram {
    /// Creates an uninitialized program subscribed to the
    /// context-initialized and shutdown streams.
    pub fn new(
        bus: &EventBus,
        gpu: Rc<dyn GpuInvoker>,
        loader: Rc<dyn ShaderSourceLoader>,
        kind: ShaderKind,
        batch_size: u32,
    ) -> Self {
        let inner = Rc::new(RefCell::new(ShaderInner {
            gpu,
            loader,
            kind,
            batch_size,
            state: ShaderState::Uninitialized,
            program: None,
            subs: Vec::new(),
        }));

        let init_sub = bus.gl_init.subscribe({
            let inner = Rc::clone(&inner);
            move |_: &()| {
                inner.borrow_mut().initialize()?;
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
        inner.borrow_mut().subs.extend([init_sub, shutdown_sub]);

        Self { inner }
    }

    /// Makes this the active program for subsequent draw calls.
    pub fn use_program(&self) -> RenderResult<()> {
        let inner = self.inner.borrow();
        match (inner.state, inner.program) {
            (ShaderState::Initialized, Some(program)) => {
                inner.gpu.use_program(program);
                Ok(())
            }
            (ShaderState::ShutDown, _) => Err(RenderError::ShutDown {
                resource: inner.kind.label(),
            }),
            _ => Err(RenderError::NotInitialized {
                resource: inner.kind.label(),
            }),
        }
    }

    pub fn state(&self) -> ShaderState {
        self.inner.borrow().state
    }

    pub fn kind(&self) -> ShaderKind {
        self.inner.borrow().kind
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.inner.borrow_mut().shut_down();
    }
}

impl ShaderInner {
    fn initialize(&mut self) -> RenderResult<()> {
        if self.state == ShaderState::ShutDown {
            return Ok(());
        }
        // a prior program belongs to the dead context
        self.program = None;

        let substitutions = [("BATCH_SIZE", self.batch_size.to_string())];
        let vertex_src = self.loader.load_vertex(self.kind.name(), &substitutions)?;
        let fragment_src = self.loader.load_fragment(self.kind.name(), &substitutions)?;

        let vertex = self.compile(ShaderStage::Vertex, &vertex_src)?;
        let fragment = self.compile(ShaderStage::Fragment, &fragment_src)?;

        let program = self.gpu.create_program();
        self.gpu.attach_shader(program, vertex);
        self.gpu.attach_shader(program, fragment);
        self.gpu.link_program(program);

        let log = self.gpu.program_info_log(program);
        if !log.is_empty() {
            return Err(RenderError::LinkFailed {
                shader: self.kind.name(),
                log,
            });
        }

        // shader objects are only needed until the link completes
        self.gpu.delete_shader(vertex);
        self.gpu.delete_shader(fragment);

        self.program = Some(program);
        self.state = ShaderState::Initialized;
        tracing::info!(shader = self.kind.name(), "program linked");
        Ok(())
    }

    fn compile(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> RenderResult<lumen_test_utils::ShaderHandle> {
        let shader = self.gpu.create_shader(stage);
        self.gpu.shader_source(shader, source);
        self.gpu.compile_shader(shader);

        let log = self.gpu.shader_info_log(shader);
        if !log.is_empty() {
            return Err(RenderError::CompileFailed {
                shader: self.kind.name(),
                stage,
                log,
            });
        }
        Ok(shader)
    }

    fn shut_down(&mut self) {
        if self.state == ShaderState::ShutDown {
            return;
        }
        if let Some(program) = self.program.take() {
            self.gpu.delete_program(program);
        }
        self.subs.clear();
        self.state = ShaderState::ShutDown;
        tracing::debug!(shader = self.kind.name(), "program released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_test_utils::{MockGpuInvoker, TemplateShaderLoader};

    fn setup(kind: ShaderKind) -> (EventBus, Rc<MockGpuInvoker>, ShaderProgram) {
        let bus = EventBus::new();
        let gpu = Rc::new(MockGpuInvoker::new());
        let loader = Rc::new(TemplateShaderLoader::new());
        for name in ["texture", "font", "rect", "line"] {
            loader.insert(
                name,
                "const BATCH: u32 = ${BATCH_SIZE};",
                "void main() {}",
            );
        }
        let program = ShaderProgram::new(
            &bus,
            Rc::clone(&gpu) as Rc<dyn GpuInvoker>,
            loader as Rc<dyn ShaderSourceLoader>,
            kind,
            100,
        );
        (bus, gpu, program)
    }

    #[test]
    fn starts_uninitialized() {
        let (_bus, gpu, program) = setup(ShaderKind::Texture);
        assert_eq!(program.state(), ShaderState::Uninitialized);
        assert_eq!(gpu.call_count(), 0);
    }

    #[test]
    fn use_before_init_fails() {
        let (_bus, _gpu, program) = setup(ShaderKind::Texture);
        let err = program.use_program().unwrap_err();
        assert!(matches!(err, RenderError::NotInitialized { .. }));
    }

    #[test]
    fn context_init_compiles_links_and_discards_shader_objects() {
        let (bus, gpu, program) = setup(ShaderKind::Rect);
        bus.gl_init.publish(&()).unwrap();

        assert_eq!(program.state(), ShaderState::Initialized);
        assert_eq!(gpu.count_shader_creates(), 2);
        assert_eq!(gpu.count_shader_deletes(), 2);
        assert_eq!(gpu.count_program_creates(), 1);

        program.use_program().unwrap();
        assert_eq!(gpu.count_use_program(), 1);
    }

    #[test]
    fn batch_size_is_spliced_into_the_source() {
        let (bus, gpu, _program) = setup(ShaderKind::Texture);
        bus.gl_init.publish(&()).unwrap();

        let sources = gpu.shader_sources();
        assert_eq!(sources[0], "const BATCH: u32 = 100;");
    }

    #[test]
    fn compile_failure_carries_the_backend_log() {
        let (bus, gpu, program) = setup(ShaderKind::Line);
        gpu.set_shader_log("0:3: undeclared identifier");

        let err = bus.gl_init.publish(&()).unwrap_err();
        let err = err.into_inner();
        let err = err.downcast::<RenderError>().unwrap();
        match *err {
            RenderError::CompileFailed { shader, stage, ref log } => {
                assert_eq!(shader, "line");
                assert_eq!(stage, ShaderStage::Vertex);
                assert_eq!(log, "0:3: undeclared identifier");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(program.state(), ShaderState::Uninitialized);
    }

    #[test]
    fn link_failure_carries_the_backend_log() {
        let (bus, gpu, program) = setup(ShaderKind::Font);
        gpu.set_program_log("varying mismatch");

        let err = bus.gl_init.publish(&()).unwrap_err();
        let err = err.into_inner();
        let err = err.downcast::<RenderError>().unwrap();
        assert!(matches!(*err, RenderError::LinkFailed { shader: "font", .. }));
        assert_eq!(program.state(), ShaderState::Uninitialized);
    }

    #[test]
    fn reinit_builds_a_fresh_program_without_deleting_the_stale_one() {
        let (bus, gpu, program) = setup(ShaderKind::Texture);
        bus.gl_init.publish(&()).unwrap();
        bus.gl_init.publish(&()).unwrap();

        assert_eq!(program.state(), ShaderState::Initialized);
        assert_eq!(gpu.count_program_creates(), 2);
        assert_eq!(gpu.count_program_deletes(), 0);
    }

    #[test]
    fn shutdown_is_terminal_and_idempotent() {
        let (bus, gpu, program) = setup(ShaderKind::Texture);
        bus.gl_init.publish(&()).unwrap();

        bus.shutdown.publish(&()).unwrap();
        bus.shutdown.publish(&()).unwrap();
        assert_eq!(program.state(), ShaderState::ShutDown);
        assert_eq!(gpu.count_program_deletes(), 1);

        // a new context does not revive a shut-down program
        bus.gl_init.publish(&()).unwrap();
        assert_eq!(program.state(), ShaderState::ShutDown);

        let err = program.use_program().unwrap_err();
        assert!(matches!(err, RenderError::ShutDown { .. }));
    }

    #[test]
    fn shutdown_before_init_deletes_nothing() {
        let (bus, gpu, program) = setup(ShaderKind::Texture);
        bus.shutdown.publish(&()).unwrap();

        assert_eq!(program.state(), ShaderState::ShutDown);
        assert_eq!(gpu.count_program_deletes(), 0);
    }

    #[test]
    fn drop_releases_the_program() {
        let (bus, gpu, program) = setup(ShaderKind::Texture);
        bus.gl_init.publish(&()).unwrap();

        drop(program);
        assert_eq!(gpu.count_program_deletes(), 1);
    }
}
