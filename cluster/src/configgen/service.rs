use std::fs;
use std::sync::Arc;

use log::info;
use serde_json::{Map, Value};

use vigil_shared::{ReplicatedObject, Runtime, TypeDescriptor};

use super::compiler::{ConfigCompiler, ConfigItems, ScriptFrame};
use super::error::{io_error, ConfigError};
use super::staging::{
    activate_stage, create_module, create_stage, module_exists, object_config_path, API_MODULE,
};
use super::writer::ConfigWriter;

/// Renders the declarative definition for a new object: the full name is
/// decomposed via the type's name composer and the structural parts merged
/// into the attributes.
pub fn create_object_config(
    descriptor: &TypeDescriptor,
    full_name: &str,
    templates: &[String],
    attrs: &Map<String, Value>,
) -> Result<String, ConfigError> {
    let parts = descriptor
        .parse_name(full_name)
        .map_err(|err| ConfigError::Compile(err.to_string()))?;

    let name = parts
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(full_name)
        .to_string();

    let mut all_attrs = attrs.clone();
    for (key, value) in parts {
        all_attrs.insert(key, value);
    }
    all_attrs.remove("name");

    let mut config = String::new();
    ConfigWriter::emit_config_item(
        &mut config,
        descriptor.name(),
        &name,
        false,
        templates,
        &all_attrs,
    )?;
    ConfigWriter::emit_raw(&mut config, "\n");
    Ok(config)
}

fn ensure_api_module(runtime: &Runtime) -> Result<(), ConfigError> {
    if module_exists(&runtime.config) {
        return Ok(());
    }

    create_module(&runtime.config)?;
    let stage = create_stage(&runtime.config)?;
    activate_stage(&runtime.config, &stage)
}

/// Materializes a declarative object: stages its config file, compiles and
/// evaluates it, then commits and activates the resulting items.
///
/// Returns false with the collected diagnostics in `errors` when any stage
/// of the pipeline fails; the call only returns after activation finished
/// or failed.
#[allow(clippy::too_many_arguments)]
pub fn create_object(
    runtime: &Runtime,
    compiler: &dyn ConfigCompiler,
    items: &dyn ConfigItems,
    descriptor: &Arc<TypeDescriptor>,
    full_name: &str,
    templates: &[String],
    attrs: &Map<String, Value>,
    errors: &mut Vec<String>,
) -> bool {
    let config = match create_object_config(descriptor, full_name, templates, attrs) {
        Ok(config) => config,
        Err(err) => {
            errors.push(err.to_string());
            return false;
        }
    };

    if let Err(err) = ensure_api_module(runtime) {
        errors.push(err.to_string());
        return false;
    }

    let path = match object_config_path(&runtime.config, descriptor, full_name) {
        Ok(path) => path,
        Err(err) => {
            errors.push(err.to_string());
            return false;
        }
    };

    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent).map_err(io_error("mkdir", parent)) {
            errors.push(err.to_string());
            return false;
        }
    }
    if let Err(err) = fs::write(&path, &config).map_err(io_error("write", &path)) {
        errors.push(err.to_string());
        return false;
    }

    let expression = match compiler.compile_file(runtime, &path, API_MODULE) {
        Ok(expression) => expression,
        Err(err) => {
            errors.push(err.to_string());
            return false;
        }
    };

    let mut frame = ScriptFrame::new();
    if let Err(err) = expression.evaluate(runtime, &mut frame) {
        errors.push(err.to_string());
        return false;
    }

    if !items.commit_items(runtime) || !items.activate_items(runtime) {
        errors.extend(items.take_errors());
        return false;
    }

    info!(
        "created {} '{}' through the object-config service",
        descriptor.name(),
        full_name
    );
    true
}

/// Deactivates and removes an API-created object together with its staged
/// config file.
///
/// Objects from any other module are refused. I/O failures while unlinking
/// surface as errors; a missing file is fine.
pub fn delete_object(
    runtime: &Runtime,
    items: &dyn ConfigItems,
    object: &Arc<dyn ReplicatedObject>,
    errors: &mut Vec<String>,
) -> Result<bool, ConfigError> {
    if object.core().module() != API_MODULE {
        errors.push("Object cannot be deleted because it was not created using the API.".to_string());
        return Ok(false);
    }

    let core = object.core();
    let descriptor = Arc::clone(core.descriptor());
    let name = core.name().to_string();

    object.deactivate();

    if !items.unregister_item(runtime, descriptor.name(), &name) {
        runtime.unregister_object(object);
    }

    let path = object_config_path(&runtime.config, &descriptor, &name)?;
    if path.exists() {
        fs::remove_file(&path).map_err(io_error("unlink", &path))?;
    }

    Ok(true)
}
