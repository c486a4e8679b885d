use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use vigil_shared::{RuntimeConfig, TypeDescriptor};

use super::error::{io_error, ConfigError};

/// The config module owned by the object-config service. Objects created
/// through the API live in this module and only they may be deleted through
/// it.
pub const API_MODULE: &str = "_api";

const ACTIVE_STAGE_MARKER: &str = "active-stage";

/// Characters that cannot appear in file names; escaped reversibly.
const RESERVED_NAME_CHARS: &str = "<>:\"/\\|?*";

pub fn module_dir(config: &RuntimeConfig) -> PathBuf {
    config.module_dir.join(API_MODULE)
}

pub fn module_exists(config: &RuntimeConfig) -> bool {
    module_dir(config).is_dir()
}

pub fn create_module(config: &RuntimeConfig) -> Result<(), ConfigError> {
    let dir = module_dir(config);
    fs::create_dir_all(&dir).map_err(io_error("mkdir", &dir))
}

/// Mints a new stage under the module and returns its id.
pub fn create_stage(config: &RuntimeConfig) -> Result<String, ConfigError> {
    let stage = stage_id();
    let dir = module_dir(config).join(&stage).join("conf.d");
    fs::create_dir_all(&dir).map_err(io_error("mkdir", &dir))?;
    Ok(stage)
}

fn stage_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    format!("{:x}", nanos)
}

/// Records the stage as the module's active one.
pub fn activate_stage(config: &RuntimeConfig, stage: &str) -> Result<(), ConfigError> {
    let marker = module_dir(config).join(ACTIVE_STAGE_MARKER);
    fs::write(&marker, stage).map_err(io_error("write", &marker))
}

pub fn active_stage(config: &RuntimeConfig) -> Result<String, ConfigError> {
    let marker = module_dir(config).join(ACTIVE_STAGE_MARKER);
    let stage = fs::read_to_string(&marker).map_err(io_error("open", &marker))?;
    let stage = stage.trim().to_string();
    if stage.is_empty() {
        return Err(ConfigError::NoActiveStage(API_MODULE.to_string()));
    }
    Ok(stage)
}

/// Root of the active stage's config tree.
pub fn config_dir(config: &RuntimeConfig) -> Result<PathBuf, ConfigError> {
    Ok(module_dir(config).join(active_stage(config)?))
}

/// Reversible file-name escape: reserved characters and the escape
/// character itself become `%XX`.
pub fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '%' || RESERVED_NAME_CHARS.contains(ch) {
            let _ = write!(escaped, "%{:02X}", ch as u32);
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

pub fn unescape_name(escaped: &str) -> String {
    let chars: Vec<char> = escaped.chars().collect();
    let mut name = String::with_capacity(escaped.len());
    let mut index = 0;

    while index < chars.len() {
        if chars[index] == '%' && index + 2 < chars.len() {
            let hex: String = chars[index + 1..=index + 2].iter().collect();
            if let Ok(code) = u8::from_str_radix(&hex, 16) {
                name.push(code as char);
                index += 3;
                continue;
            }
        }
        name.push(chars[index]);
        index += 1;
    }
    name
}

/// On-disk location of one object's config file inside the active stage.
pub fn object_config_path(
    config: &RuntimeConfig,
    descriptor: &TypeDescriptor,
    full_name: &str,
) -> Result<PathBuf, ConfigError> {
    Ok(config_dir(config)?
        .join("conf.d")
        .join(descriptor.plural().to_lowercase())
        .join(format!("{}.conf", escape_name(full_name))))
}
