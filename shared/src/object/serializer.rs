use log::debug;
use serde_json::{Map, Value};

use super::attribute::AttrClass;
use super::error::ObjectError;
use super::replicated::ReplicatedObject;

/// Converts an object into a field-name → value tree, including only fields
/// whose attribute class intersects `mask`. Unset (`Null`) fields are
/// omitted. Returns `None` when no field matched.
pub fn serialize_object(
    object: &dyn ReplicatedObject,
    mask: AttrClass,
) -> Option<Map<String, Value>> {
    let core = object.core();
    let descriptor = core.descriptor();

    let mut tree = Map::new();
    for (fid, field) in descriptor.fields().iter().enumerate() {
        if !field.class.intersects(mask) {
            continue;
        }
        let value = core.field(fid);
        if value.is_null() {
            continue;
        }
        tree.insert(field.name.to_string(), value);
    }

    if tree.is_empty() {
        None
    } else {
        Some(tree)
    }
}

/// Applies a serialized field tree back onto an object.
///
/// `safe` marks the tree as untrusted: unknown fields and shape-invalid
/// values are skipped silently instead of raising. Field writes bypass
/// modification tracking and change signals.
pub fn deserialize_object(
    object: &dyn ReplicatedObject,
    tree: &Map<String, Value>,
    safe: bool,
    mask: AttrClass,
) -> Result<(), ObjectError> {
    let core = object.core();
    let descriptor = core.descriptor();

    for (key, value) in tree {
        let Some(fid) = descriptor.field_id(key) else {
            if safe {
                debug!(
                    "ignoring unknown field '{}' on {} '{}'",
                    key,
                    descriptor.name(),
                    core.name()
                );
                continue;
            }
            return Err(ObjectError::UnknownField {
                type_name: descriptor.name(),
                field: key.clone(),
            });
        };

        let field = descriptor.field(fid);
        if !field.class.intersects(mask) {
            continue;
        }

        if let Err(err) = field.kind.validate_shape(field.name, value) {
            if safe {
                debug!(
                    "rejecting field '{}' on {} '{}': {}",
                    key,
                    descriptor.name(),
                    core.name(),
                    err
                );
                continue;
            }
            return Err(err);
        }

        core.set_field(fid, value.clone());
    }

    Ok(())
}
