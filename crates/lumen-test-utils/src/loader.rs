//! Shader source loading.
//!
//! Shader text lives outside the rendering core; the core asks a loader
//! for it by name, together with a substitution table spliced into the
//! source before compilation (for example `BATCH_SIZE` becoming `100`).
//! Placeholders use the `${NAME}` form.

use std::fmt;

/// A shader source could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderLoadError {
    /// The shader name that was requested.
    pub name: String,
    /// Description of the failure.
    pub reason: String,
}

impl fmt::Display for ShaderLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load shader '{}': {}", self.name, self.reason)
    }
}

impl std::error::Error for ShaderLoadError {}

/// Provides shader source text by name.
///
/// `substitutions` are `(placeholder, value)` pairs; every `${placeholder}`
/// occurrence in the stored source is replaced by the value before the text
/// is returned.
pub trait ShaderSourceLoader {
    fn load_vertex(
        &self,
        name: &str,
        substitutions: &[(&str, String)],
    ) -> Result<String, ShaderLoadError>;

    fn load_fragment(
        &self,
        name: &str,
        substitutions: &[(&str, String)],
    ) -> Result<String, ShaderLoadError>;
}
