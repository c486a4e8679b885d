use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vigil_cluster::configgen::staging::unescape_name;
use vigil_cluster::{ConfigCompiler, ConfigError, ConfigExpression, ConfigItems, ScriptFrame};
use vigil_cluster::API_MODULE;
use vigil_shared::{Host, ReplicatedObject, Runtime};

/// A compiler double. The happy path materializes the staged host object
/// directly from the config file path (type directory + escaped file stem),
/// standing in for the real compile/evaluate pipeline.
#[derive(Default)]
pub struct MockCompiler {
    pub fail_compile: Option<String>,
    pub fail_evaluate: Option<String>,
}

impl MockCompiler {
    pub fn new() -> MockCompiler {
        MockCompiler::default()
    }

    pub fn failing_compile(message: &str) -> MockCompiler {
        MockCompiler {
            fail_compile: Some(message.to_string()),
            ..MockCompiler::default()
        }
    }

    pub fn failing_evaluate(message: &str) -> MockCompiler {
        MockCompiler {
            fail_evaluate: Some(message.to_string()),
            ..MockCompiler::default()
        }
    }
}

impl ConfigCompiler for MockCompiler {
    fn compile_file(
        &self,
        _runtime: &Runtime,
        path: &Path,
        _module: &str,
    ) -> Result<Box<dyn ConfigExpression>, ConfigError> {
        if let Some(message) = &self.fail_compile {
            return Err(ConfigError::Compile(message.clone()));
        }
        Ok(Box::new(MockExpression {
            path: path.to_path_buf(),
            fail_evaluate: self.fail_evaluate.clone(),
        }))
    }
}

struct MockExpression {
    path: PathBuf,
    fail_evaluate: Option<String>,
}

impl ConfigExpression for MockExpression {
    fn evaluate(&self, runtime: &Runtime, _frame: &mut ScriptFrame) -> Result<(), ConfigError> {
        if let Some(message) = &self.fail_evaluate {
            return Err(ConfigError::Evaluate(message.clone()));
        }

        let type_dir = self
            .path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let stem = self
            .path
            .file_stem()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let full_name = unescape_name(stem);

        // only host definitions are understood by this double
        if type_dir != "hosts" {
            return Err(ConfigError::Evaluate(format!(
                "unsupported type directory '{}'",
                type_dir
            )));
        }

        let host = Host::new(&runtime.types, &full_name);
        host.core().set_module(API_MODULE);

        runtime
            .register_object(host.clone() as Arc<dyn ReplicatedObject>)
            .map_err(|err| ConfigError::Evaluate(err.to_string()))?;
        host.activate();
        Ok(())
    }
}

/// A config-items double with scriptable commit/activate outcomes.
#[derive(Default)]
pub struct MockItems {
    pub fail_commit: bool,
    pub fail_activate: bool,
    errors: Mutex<Vec<String>>,
}

impl MockItems {
    pub fn passing() -> MockItems {
        MockItems::default()
    }

    pub fn failing_commit(errors: Vec<String>) -> MockItems {
        let items = MockItems {
            fail_commit: true,
            ..MockItems::default()
        };
        *items.errors.lock().expect("error queue poisoned") = errors;
        items
    }
}

impl ConfigItems for MockItems {
    fn commit_items(&self, _runtime: &Runtime) -> bool {
        !self.fail_commit
    }

    fn activate_items(&self, _runtime: &Runtime) -> bool {
        !self.fail_activate
    }

    fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut self.errors.lock().expect("error queue poisoned"))
    }

    fn unregister_item(&self, _runtime: &Runtime, _type_name: &str, _name: &str) -> bool {
        false
    }
}
