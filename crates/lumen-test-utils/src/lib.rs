//! Collaborator abstractions for the Lumen rendering core.
//!
//! The rendering core never talks to a graphics API directly; it calls
//! through the [`GpuInvoker`] capability trait, and fetches shader text
//! through [`ShaderSourceLoader`]. This crate hosts those traits plus,
//! behind the `mock` feature, call-recording implementations used by the
//! engine's test suites.
//!
//! # Design notes
//!
//! - All handles ([`BufferHandle`], [`ProgramHandle`], [`ShaderHandle`])
//!   are owned opaque values, so no lifetime parameters propagate through
//!   the renderer.
//! - Trait methods take `&self`; mock implementations use interior
//!   mutability (`parking_lot::Mutex`) to record calls.
//! - Both traits are object-safe and consumed as `Rc<dyn ...>`.

pub mod invoker;
pub mod loader;
#[cfg(feature = "mock")]
pub mod mock_invoker;

pub use invoker::*;
pub use loader::*;
#[cfg(feature = "mock")]
pub use mock_invoker::*;
