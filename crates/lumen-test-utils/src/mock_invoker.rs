//! Mock collaborators for testing without a GPU.
//!
//! [`MockGpuInvoker`] records every capability call for verification and
//! hands out sequential handles. [`TemplateShaderLoader`] serves shader
//! templates from memory, applying `${NAME}` substitutions.

use crate::invoker::*;
use crate::loader::{ShaderLoadError, ShaderSourceLoader};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Records one GPU capability call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateShader {
        stage: ShaderStage,
        handle: ShaderHandle,
    },
    ShaderSource {
        shader: ShaderHandle,
        source: String,
    },
    CompileShader {
        shader: ShaderHandle,
    },
    DeleteShader {
        shader: ShaderHandle,
    },
    CreateProgram {
        handle: ProgramHandle,
    },
    AttachShader {
        program: ProgramHandle,
        shader: ShaderHandle,
    },
    LinkProgram {
        program: ProgramHandle,
    },
    UseProgram {
        program: ProgramHandle,
    },
    DeleteProgram {
        program: ProgramHandle,
    },
    CreateBuffer {
        kind: BufferKind,
        handle: BufferHandle,
    },
    AllocateBuffer {
        buffer: BufferHandle,
        size: u64,
    },
    UpdateBuffer {
        buffer: BufferHandle,
        offset: u64,
        size: usize,
    },
    DeleteBuffer {
        buffer: BufferHandle,
    },
    BindTexture {
        texture_id: u32,
    },
    DrawElements {
        index_count: u32,
        first_index: u32,
    },
}

/// Mock [`GpuInvoker`] that records operations instead of performing them.
///
/// Methods take `&self` but must mutate internal state, so recorded calls
/// live behind a `parking_lot::Mutex`. Compile and link diagnostics can be
/// forced with [`set_shader_log`](Self::set_shader_log) and
/// [`set_program_log`](Self::set_program_log); the default (empty) log
/// means every compile and link succeeds.
///
/// # Example
///
/// ```
/// use lumen_test_utils::{GpuInvoker, MockGpuInvoker, BufferKind};
///
/// let gpu = MockGpuInvoker::new();
/// let buffer = gpu.create_buffer(BufferKind::Vertex);
/// gpu.allocate_buffer(buffer, 1024);
///
/// assert_eq!(gpu.count_buffer_creates(), 1);
/// assert_eq!(gpu.count_buffer_allocates(), 1);
/// ```
pub struct MockGpuInvoker {
    calls: Mutex<Vec<GpuCall>>,
    next_handle: Mutex<u32>,
    shader_log: Mutex<String>,
    program_log: Mutex<String>,
}

impl MockGpuInvoker {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_handle: Mutex::new(1),
            shader_log: Mutex::new(String::new()),
            program_log: Mutex::new(String::new()),
        }
    }

    /// Text every subsequent [`GpuInvoker::shader_info_log`] returns.
    pub fn set_shader_log(&self, log: impl Into<String>) {
        *self.shader_log.lock() = log.into();
    }

    /// Text every subsequent [`GpuInvoker::program_info_log`] returns.
    pub fn set_program_log(&self, log: impl Into<String>) {
        *self.program_log.lock() = log.into();
    }

    /// A copy of all recorded calls, in issue order.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn count_shader_creates(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::CreateShader { .. }))
    }

    pub fn count_shader_deletes(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::DeleteShader { .. }))
    }

    pub fn count_program_creates(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::CreateProgram { .. }))
    }

    pub fn count_program_deletes(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::DeleteProgram { .. }))
    }

    pub fn count_use_program(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::UseProgram { .. }))
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::CreateBuffer { .. }))
    }

    pub fn count_buffer_allocates(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::AllocateBuffer { .. }))
    }

    pub fn count_buffer_updates(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::UpdateBuffer { .. }))
    }

    pub fn count_buffer_deletes(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::DeleteBuffer { .. }))
    }

    pub fn count_draw_calls(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::DrawElements { .. }))
    }

    /// Every `(index_count, first_index)` pair submitted, in order.
    pub fn draw_calls(&self) -> Vec<(u32, u32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GpuCall::DrawElements {
                    index_count,
                    first_index,
                } => Some((*index_count, *first_index)),
                _ => None,
            })
            .collect()
    }

    /// Every `(buffer, offset, size)` write issued, in order.
    pub fn buffer_updates(&self) -> Vec<(BufferHandle, u64, usize)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GpuCall::UpdateBuffer {
                    buffer,
                    offset,
                    size,
                } => Some((*buffer, *offset, *size)),
                _ => None,
            })
            .collect()
    }

    /// Every texture id bound, in order.
    pub fn bound_textures(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GpuCall::BindTexture { texture_id } => Some(*texture_id),
                _ => None,
            })
            .collect()
    }

    /// Sources handed to [`GpuInvoker::shader_source`], in order.
    pub fn shader_sources(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GpuCall::ShaderSource { source, .. } => Some(source.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn next(&self) -> u32 {
        let mut next = self.next_handle.lock();
        let handle = *next;
        *next += 1;
        handle
    }

    fn record(&self, call: GpuCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockGpuInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuInvoker for MockGpuInvoker {
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        let handle = ShaderHandle(self.next());
        self.record(GpuCall::CreateShader { stage, handle });
        handle
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        self.record(GpuCall::ShaderSource {
            shader,
            source: source.to_string(),
        });
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        self.record(GpuCall::CompileShader { shader });
    }

    fn shader_info_log(&self, _shader: ShaderHandle) -> String {
        self.shader_log.lock().clone()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.record(GpuCall::DeleteShader { shader });
    }

    fn create_program(&self) -> ProgramHandle {
        let handle = ProgramHandle(self.next());
        self.record(GpuCall::CreateProgram { handle });
        handle
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        self.record(GpuCall::AttachShader { program, shader });
    }

    fn link_program(&self, program: ProgramHandle) {
        self.record(GpuCall::LinkProgram { program });
    }

    fn program_info_log(&self, _program: ProgramHandle) -> String {
        self.program_log.lock().clone()
    }

    fn use_program(&self, program: ProgramHandle) {
        self.record(GpuCall::UseProgram { program });
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.record(GpuCall::DeleteProgram { program });
    }

    fn create_buffer(&self, kind: BufferKind) -> BufferHandle {
        let handle = BufferHandle(self.next());
        self.record(GpuCall::CreateBuffer { kind, handle });
        handle
    }

    fn allocate_buffer(&self, buffer: BufferHandle, size: u64) {
        self.record(GpuCall::AllocateBuffer { buffer, size });
    }

    fn update_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        self.record(GpuCall::UpdateBuffer {
            buffer,
            offset,
            size: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.record(GpuCall::DeleteBuffer { buffer });
    }

    fn bind_texture(&self, texture_id: u32) {
        self.record(GpuCall::BindTexture { texture_id });
    }

    fn draw_elements(&self, index_count: u32, first_index: u32) {
        self.record(GpuCall::DrawElements {
            index_count,
            first_index,
        });
    }
}

/// In-memory [`ShaderSourceLoader`] keyed by shader name.
pub struct TemplateShaderLoader {
    sources: Mutex<HashMap<String, (String, String)>>,
}

impl TemplateShaderLoader {
    pub fn new() -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the vertex and fragment templates for `name`.
    pub fn insert(&self, name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) {
        self.sources
            .lock()
            .insert(name.into(), (vertex.into(), fragment.into()));
    }

    fn load(
        &self,
        name: &str,
        substitutions: &[(&str, String)],
        fragment: bool,
    ) -> Result<String, ShaderLoadError> {
        let sources = self.sources.lock();
        let (vert, frag) = sources.get(name).ok_or_else(|| ShaderLoadError {
            name: name.to_string(),
            reason: "no template registered".to_string(),
        })?;

        let template = if fragment { frag } else { vert };
        Ok(Self::apply(template, substitutions))
    }

    fn apply(template: &str, substitutions: &[(&str, String)]) -> String {
        let mut out = template.to_string();
        for (key, value) in substitutions {
            out = out.replace(&format!("${{{key}}}"), value);
        }
        out
    }
}

impl Default for TemplateShaderLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderSourceLoader for TemplateShaderLoader {
    fn load_vertex(
        &self,
        name: &str,
        substitutions: &[(&str, String)],
    ) -> Result<String, ShaderLoadError> {
        self.load(name, substitutions, false)
    }

    fn load_fragment(
        &self,
        name: &str,
        substitutions: &[(&str, String)],
    ) -> Result<String, ShaderLoadError> {
        self.load(name, substitutions, true)
    }
}
