use std::path::Path;

use serde_json::{Map, Value};

use vigil_shared::Runtime;

use super::error::ConfigError;

/// Evaluation scope for a single compiled expression.
#[derive(Default)]
pub struct ScriptFrame {
    pub locals: Map<String, Value>,
}

impl ScriptFrame {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A compiled config expression. Evaluating it registers config items for
/// the objects the source text declares.
pub trait ConfigExpression: Send {
    fn evaluate(&self, runtime: &Runtime, frame: &mut ScriptFrame) -> Result<(), ConfigError>;
}

/// The declarative-config compiler. Grammar and evaluation live outside the
/// core; errors come back opaque.
pub trait ConfigCompiler: Send + Sync {
    fn compile_file(
        &self,
        runtime: &Runtime,
        path: &Path,
        module: &str,
    ) -> Result<Box<dyn ConfigExpression>, ConfigError>;
}

/// The config-item subsystem: commits evaluated items into live objects and
/// activates them. Failures queue diagnostics retrievable via
/// `take_errors`.
pub trait ConfigItems: Send + Sync {
    fn commit_items(&self, runtime: &Runtime) -> bool;

    fn activate_items(&self, runtime: &Runtime) -> bool;

    /// Drains the queued diagnostics of the last failed commit/activate.
    fn take_errors(&self) -> Vec<String>;

    /// Unregisters the config item owning the object, when one exists.
    /// Returns false when the object is not item-backed.
    fn unregister_item(&self, runtime: &Runtime, type_name: &str, name: &str) -> bool;
}
