use std::sync::{Arc, Mutex};

use serde_json::Value;

use vigil_shared::{CheckEngine, CommandError, Host, ReplicatedObject, Runtime};

/// A check-engine double recording what it was asked to execute.
#[derive(Default)]
pub struct MockCheckEngine {
    pub fail_with: Option<String>,
    executed: Mutex<Vec<(String, &'static str)>>,
}

impl MockCheckEngine {
    pub fn new() -> Arc<MockCheckEngine> {
        Arc::new(MockCheckEngine::default())
    }

    pub fn failing(message: &str) -> Arc<MockCheckEngine> {
        Arc::new(MockCheckEngine {
            fail_with: Some(message.to_string()),
            executed: Mutex::new(Vec::new()),
        })
    }

    /// Executions as (host name, kind) with kind `check` or `event`.
    pub fn executed(&self) -> Vec<(String, &'static str)> {
        self.executed.lock().expect("execution log poisoned").clone()
    }

    fn record(&self, host: &Arc<Host>, kind: &'static str) -> Result<(), CommandError> {
        self.executed
            .lock()
            .expect("execution log poisoned")
            .push((host.core().name().to_string(), kind));

        match &self.fail_with {
            Some(message) => Err(CommandError(message.clone())),
            None => Ok(()),
        }
    }
}

impl CheckEngine for MockCheckEngine {
    fn execute_remote_check(
        &self,
        _runtime: &Runtime,
        host: &Arc<Host>,
        _macros: Option<&Value>,
    ) -> Result<(), CommandError> {
        self.record(host, "check")
    }

    fn execute_event_handler(
        &self,
        _runtime: &Runtime,
        host: &Arc<Host>,
        _macros: Option<&Value>,
        _resolved_macros: bool,
    ) -> Result<(), CommandError> {
        self.record(host, "event")
    }
}
