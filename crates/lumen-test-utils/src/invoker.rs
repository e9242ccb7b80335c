//! The injected GPU capability surface.
//!
//! [`GpuInvoker`] is the only way the rendering core reaches the graphics
//! backend: shader object compilation, program linking, buffer lifecycle,
//! texture binding, and draw submission. Real bindings live outside this
//! repository; tests use the mock in [`crate::mock_invoker`].

use std::fmt;

/// Opaque handle to a native shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque handle to a linked native program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to a native buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// What a buffer stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Capability set the rendering core calls through.
///
/// Methods take `&self` and return owned handles; implementations are free
/// to use interior mutability. Diagnostics follow the info-log convention:
/// an empty string from [`shader_info_log`](Self::shader_info_log) or
/// [`program_info_log`](Self::program_info_log) means success, anything
/// else is the backend's error text.
pub trait GpuInvoker {
    // Shader objects

    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle;

    fn shader_source(&self, shader: ShaderHandle, source: &str);

    fn compile_shader(&self, shader: ShaderHandle);

    fn shader_info_log(&self, shader: ShaderHandle) -> String;

    fn delete_shader(&self, shader: ShaderHandle);

    // Programs

    fn create_program(&self) -> ProgramHandle;

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);

    fn link_program(&self, program: ProgramHandle);

    fn program_info_log(&self, program: ProgramHandle) -> String;

    fn use_program(&self, program: ProgramHandle);

    fn delete_program(&self, program: ProgramHandle);

    // Buffers

    fn create_buffer(&self, kind: BufferKind) -> BufferHandle;

    /// Reserves `size` bytes of backing storage, discarding prior contents.
    fn allocate_buffer(&self, buffer: BufferHandle, size: u64);

    /// Writes `data` into the buffer starting at byte `offset`.
    fn update_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]);

    fn delete_buffer(&self, buffer: BufferHandle);

    // Draw state

    fn bind_texture(&self, texture_id: u32);

    /// Draws `index_count` indices starting at index `first_index` of the
    /// bound index buffer.
    fn draw_elements(&self, index_count: u32, first_index: u32);
}
