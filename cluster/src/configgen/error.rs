use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::writer::WriteError;

/// Errors raised by the config staging layout and the object-config
/// service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{call} failed for '{}': {source}", .path.display())]
    Io {
        call: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration compile error: {0}")]
    Compile(String),

    #[error("configuration evaluation error: {0}")]
    Evaluate(String),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("no active stage for config module '{0}'")]
    NoActiveStage(String),
}

pub(super) fn io_error(call: &'static str, path: &std::path::Path) -> impl FnOnce(io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::Io { call, path, source }
}
