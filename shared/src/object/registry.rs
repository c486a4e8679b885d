use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::attribute::NameLookup;
use super::descriptor::TypeDescriptor;
use super::replicated::ReplicatedObject;

/// Process-wide table of type descriptors.
///
/// Descriptors are added while the runtime is being built and never removed;
/// lookups take a read lock, registration a write lock.
pub struct ObjectTypes {
    types: RwLock<HashMap<&'static str, Arc<TypeDescriptor>>>,
}

impl ObjectTypes {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_type(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        let mut types = self.types.write().expect("type table poisoned");
        if types
            .insert(descriptor.name(), Arc::clone(&descriptor))
            .is_some()
        {
            panic!("type '{}' registered twice", descriptor.name());
        }
        descriptor
    }

    pub fn type_by_name(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        let types = self.types.read().expect("type table poisoned");
        types.get(name).cloned()
    }

    /// Plural lookup is case-insensitive; it serves the HTTP surface where
    /// type names arrive lowercased in paths.
    pub fn type_by_plural(&self, plural: &str) -> Option<Arc<TypeDescriptor>> {
        let types = self.types.read().expect("type table poisoned");
        types
            .values()
            .find(|descriptor| descriptor.plural().eq_ignore_ascii_case(plural))
            .cloned()
    }

    pub fn all(&self) -> Vec<Arc<TypeDescriptor>> {
        let types = self.types.read().expect("type table poisoned");
        types.values().cloned().collect()
    }

    pub fn object(&self, type_name: &str, name: &str) -> Option<Arc<dyn ReplicatedObject>> {
        self.type_by_name(type_name)?.object(name)
    }

    /// Hands every tracked original-attribute path to the callback, together
    /// with the current value of the path's top-level field.
    pub fn dump_modified_attributes(
        &self,
        mut callback: impl FnMut(&Arc<dyn ReplicatedObject>, &str, Value),
    ) {
        for descriptor in self.all() {
            for object in descriptor.objects() {
                for (path, _saved) in object.core().original_attributes() {
                    let head = path.split('.').next().unwrap_or(&path);
                    let Some(fid) = descriptor.field_id(head) else {
                        continue;
                    };
                    let value = object.core().field(fid);
                    callback(&object, &path, value);
                }
            }
        }
    }
}

impl Default for ObjectTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl NameLookup for ObjectTypes {
    fn validate_name(&self, type_name: &str, name: &str) -> bool {
        match self.type_by_name(type_name) {
            Some(descriptor) => descriptor.object(name).is_some(),
            None => false,
        }
    }
}
