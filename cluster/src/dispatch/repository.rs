use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use vigil_shared::{MessageOrigin, RelayScope, Runtime, RuntimeConfig};

use crate::relay::messages::rpc_message;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{call} failed for '{}': {source}", .path.display())]
    Io {
        call: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encoding repository content: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_error(call: &'static str, path: &Path) -> impl FnOnce(io::Error) -> RepositoryError {
    let path = path.to_path_buf();
    move |source| RepositoryError::Io { call, path, source }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Directory holding one `.repo` file per known endpoint.
pub fn repository_dir(config: &RuntimeConfig) -> PathBuf {
    config
        .state_dir
        .join("lib")
        .join(&config.product)
        .join("api")
        .join("repository")
}

/// Path of the repository file for an endpoint, keyed by the SHA-256 of its
/// name.
pub fn repository_file(config: &RuntimeConfig, endpoint_name: &str) -> PathBuf {
    repository_dir(config).join(format!("{}.repo", sha256_hex(endpoint_name)))
}

/// Persists received repository params for an endpoint. The file is written
/// next to its final path and renamed into place.
pub fn persist_repository(
    config: &RuntimeConfig,
    endpoint_name: &str,
    params: &Value,
) -> Result<PathBuf, RepositoryError> {
    let path = repository_file(config, endpoint_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error("mkdir", parent))?;
    }

    let mut temp = path.clone().into_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let content = serde_json::to_vec(params)?;
    fs::write(&temp, content).map_err(io_error("write", &temp))?;

    #[cfg(windows)]
    let _ = fs::remove_file(&path);

    fs::rename(&temp, &path).map_err(io_error("rename", &temp))?;
    Ok(path)
}

/// Inbound `event::UpdateRepository`: persist the sender's inventory and
/// re-relay it into the local zone so sibling endpoints observe it too.
pub fn handle_update_repository(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(params) = params else {
        return;
    };

    let Some(repository) = params.get("repository") else {
        return;
    };
    if !repository.is_object() {
        return;
    }

    let endpoint_name = params
        .get("endpoint")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match persist_repository(&runtime.config, endpoint_name, params) {
        Ok(path) => debug!(
            "stored repository for endpoint '{}' at '{}'",
            endpoint_name,
            path.display()
        ),
        Err(err) => {
            warn!(
                "failed to persist repository for endpoint '{}': {}",
                endpoint_name, err
            );
            return;
        }
    }

    let Some(listener) = runtime.peer_listener() else {
        return;
    };
    let Some(zone) = runtime.local_zone() else {
        return;
    };

    let message = rpc_message("event::UpdateRepository", params.clone());
    listener.relay_message(Some(Arc::clone(origin)), RelayScope::Zone(zone), message, true);
}
