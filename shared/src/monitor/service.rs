use std::any::Any;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};
use crate::object::core::ObjectCore;
use crate::object::error::ObjectError;
use crate::object::registry::ObjectTypes;
use crate::object::replicated::ReplicatedObject;
use crate::runtime::Runtime;

use super::checkable::{checkable_fid, checkable_fields};

pub mod service_fid {
    use super::checkable_fid;

    pub const HOST_NAME: usize = checkable_fid::COUNT;
    pub const SHORT_NAME: usize = checkable_fid::COUNT + 1;
    pub const DISPLAY_NAME: usize = checkable_fid::COUNT + 2;
}

pub static SERVICE_FIELDS: &[FieldInfo] = checkable_fields![
    FieldInfo::new("host_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("short_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("display_name", FieldKind::Text, AttrClass::CONFIG),
];

/// A monitored service. Its full name is `<host>!<short name>`; the name
/// composer splits it back into the structural parts.
pub struct Service {
    core: ObjectCore,
}

impl Service {
    pub const TYPE: &'static str = "Service";

    pub fn new(types: &ObjectTypes, host_name: &str, short_name: &str) -> Arc<Service> {
        let descriptor = types
            .type_by_name(Self::TYPE)
            .expect("Service type descriptor not registered");
        let full_name = format!("{}!{}", host_name, short_name);
        let service = Service {
            core: ObjectCore::new(&descriptor, full_name),
        };
        service
            .core
            .set_field(service_fid::HOST_NAME, json!(host_name));
        service
            .core
            .set_field(service_fid::SHORT_NAME, json!(short_name));
        Arc::new(service)
    }

    pub fn by_name(runtime: &Runtime, full_name: &str) -> Option<Arc<Service>> {
        let object = runtime.types.object(Self::TYPE, full_name)?;
        object.as_any_arc().downcast::<Service>().ok()
    }

    pub fn host_name(&self) -> String {
        self.core
            .field(service_fid::HOST_NAME)
            .as_str()
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn short_name(&self) -> String {
        self.core
            .field(service_fid::SHORT_NAME)
            .as_str()
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Name composer for services: `host!service` becomes `{host_name, name}`.
pub fn service_name_parts(full_name: &str) -> Result<Map<String, Value>, ObjectError> {
    let mut tokens = full_name.splitn(2, '!');
    let host = tokens.next().unwrap_or_default();
    let name = tokens.next().ok_or_else(|| ObjectError::MalformedName {
        type_name: Service::TYPE,
        name: full_name.to_string(),
    })?;

    let mut parts = Map::new();
    parts.insert("host_name".to_string(), json!(host));
    parts.insert("name".to_string(), json!(name));
    Ok(parts)
}

impl ReplicatedObject for Service {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn vars_field_id(&self) -> Option<usize> {
        Some(checkable_fid::VARS)
    }
}
