//! # Vigil Cluster
//! Zone-scoped event replication, the remote-command protocol, the
//! repository beacon and the object-config service.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod api;
pub mod beacon;
pub mod configgen;
pub mod dispatch;
pub mod relay;

pub use api::handle_create_object;
pub use beacon::{RepositoryBeacon, REPOSITORY_INTERVAL};
pub use configgen::{
    create_object, create_object_config, delete_object, ConfigCompiler, ConfigError,
    ConfigExpression, ConfigItems, ConfigWriter, ScriptFrame, WriteError, API_MODULE,
};
pub use dispatch::repository::{persist_repository, repository_dir, repository_file};
pub use dispatch::EventDispatcher;
pub use relay::messages::{make_check_result_message, rpc_message};
pub use relay::EventRelay;
