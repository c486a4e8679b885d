use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};
use crate::object::core::ObjectCore;
use crate::object::registry::ObjectTypes;
use crate::object::replicated::ReplicatedObject;
use crate::runtime::Runtime;

use super::checkable::{checkable_fid, checkable_fields};
use super::service::Service;

pub mod host_fid {
    use super::checkable_fid;

    pub const DISPLAY_NAME: usize = checkable_fid::COUNT;
    pub const ADDRESS: usize = checkable_fid::COUNT + 1;
}

pub static HOST_FIELDS: &[FieldInfo] = checkable_fields![
    FieldInfo::new("display_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("address", FieldKind::Text, AttrClass::CONFIG),
];

/// A monitored host. Owns the index of its services, keyed by short name.
pub struct Host {
    core: ObjectCore,
    services: RwLock<HashMap<String, Arc<Service>>>,
}

impl Host {
    pub const TYPE: &'static str = "Host";

    /// Builds an unregistered host. The `Host` type descriptor must already
    /// be registered.
    pub fn new(types: &ObjectTypes, name: &str) -> Arc<Host> {
        let descriptor = types
            .type_by_name(Self::TYPE)
            .expect("Host type descriptor not registered");
        Arc::new(Host {
            core: ObjectCore::new(&descriptor, name),
            services: RwLock::new(HashMap::new()),
        })
    }

    pub fn by_name(runtime: &Runtime, name: &str) -> Option<Arc<Host>> {
        let object = runtime.types.object(Self::TYPE, name)?;
        object.as_any_arc().downcast::<Host>().ok()
    }

    pub fn display_name(&self) -> String {
        self.core
            .field(host_fid::DISPLAY_NAME)
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.core.name().to_string())
    }

    pub fn address(&self) -> Option<String> {
        self.core
            .field(host_fid::ADDRESS)
            .as_str()
            .map(str::to_string)
    }

    pub fn add_service(&self, service: &Arc<Service>) {
        let mut services = self.services.write().expect("service index poisoned");
        services.insert(service.short_name(), Arc::clone(service));
    }

    pub fn remove_service(&self, short_name: &str) {
        let mut services = self.services.write().expect("service index poisoned");
        services.remove(short_name);
    }

    pub fn service_by_short_name(&self, short_name: &str) -> Option<Arc<Service>> {
        let services = self.services.read().expect("service index poisoned");
        services.get(short_name).cloned()
    }

    pub fn services(&self) -> Vec<Arc<Service>> {
        let services = self.services.read().expect("service index poisoned");
        services.values().cloned().collect()
    }
}

impl ReplicatedObject for Host {
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
