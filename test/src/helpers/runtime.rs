use std::path::Path;
use std::sync::Arc;

use vigil_shared::{Endpoint, MessageOrigin, Runtime, RuntimeConfig};

/// A runtime with default test configuration rooted in a scratch directory.
pub fn test_runtime_at(dir: &Path) -> Arc<Runtime> {
    Runtime::new(RuntimeConfig {
        state_dir: dir.join("state"),
        module_dir: dir.join("modules"),
        concurrency: 2,
        accept_commands: false,
        product: "vigil".to_string(),
    })
}

/// A runtime whose filesystem paths point nowhere useful; fine for tests
/// that never touch disk.
pub fn test_runtime() -> Arc<Runtime> {
    test_runtime_at(Path::new("/nonexistent/vigil-test"))
}

/// An origin as the dispatcher sees it for a message arriving from the
/// given endpoint: identity string, endpoint and the endpoint's home zone.
pub fn local_origin_from(endpoint: &Arc<dyn Endpoint>) -> Arc<MessageOrigin> {
    MessageOrigin::new(
        endpoint.name().to_string(),
        Some(Arc::clone(endpoint)),
        endpoint.zone(),
    )
}
