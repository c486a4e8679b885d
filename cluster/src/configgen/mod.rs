pub mod compiler;
pub mod error;
pub mod service;
pub mod staging;
pub mod writer;

pub use compiler::{ConfigCompiler, ConfigExpression, ConfigItems, ScriptFrame};
pub use error::ConfigError;
pub use service::{create_object, create_object_config, delete_object};
pub use staging::{escape_name, object_config_path, unescape_name, API_MODULE};
pub use writer::{ConfigWriter, WriteError, KEYWORDS};
