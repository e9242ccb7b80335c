//! Error types for the rendering core.
//!
//! Every error here is unrecoverable at the point of detection: it aborts
//! the current frame's rendering attempt and propagates to the frame
//! driver. There are no retry semantics.

use std::fmt;

use lumen_test_utils::{ShaderLoadError, ShaderStage};

/// Errors raised by the batch rendering core.
#[derive(Debug)]
pub enum RenderError {
    /// A GPU-dependent operation ran before the context-initialized
    /// notification arrived.
    NotInitialized {
        /// The resource that was not ready.
        resource: &'static str,
    },

    /// An operation ran after the owning component was shut down.
    ShutDown {
        /// The resource that was already released.
        resource: &'static str,
    },

    /// The backend reported a non-empty compile log.
    CompileFailed {
        /// Shader name the source was loaded under.
        shader: &'static str,
        /// Which shader object failed.
        stage: ShaderStage,
        /// Raw backend diagnostic text.
        log: String,
    },

    /// The backend reported a non-empty link log.
    LinkFailed {
        /// Shader name the program belongs to.
        shader: &'static str,
        /// Raw backend diagnostic text.
        log: String,
    },

    /// The loader could not produce shader source.
    ShaderLoad(ShaderLoadError),

    /// A notification carried data the subscriber cannot act on.
    InvalidNotification {
        /// Well-known identifier of the stream.
        stream: &'static str,
        /// Description of what was wrong with the payload.
        reason: String,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized { resource } => {
                write!(f, "{} is not initialized", resource)
            }
            RenderError::ShutDown { resource } => {
                write!(f, "{} has been shut down", resource)
            }
            RenderError::CompileFailed { shader, stage, log } => {
                write!(f, "compiling {} shader for '{}' failed: {}", stage, shader, log)
            }
            RenderError::LinkFailed { shader, log } => {
                write!(f, "linking program for '{}' failed: {}", shader, log)
            }
            RenderError::ShaderLoad(err) => {
                write!(f, "{}", err)
            }
            RenderError::InvalidNotification { stream, reason } => {
                write!(f, "invalid notification on '{}': {}", stream, reason)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ShaderLoad(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderLoadError> for RenderError {
    fn from(err: ShaderLoadError) -> Self {
        RenderError::ShaderLoad(err)
    }
}

/// Result type alias for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
