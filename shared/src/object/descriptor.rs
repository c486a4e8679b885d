use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use super::attribute::FieldInfo;
use super::error::ObjectError;
use super::replicated::ReplicatedObject;

/// Decomposes a fully-qualified name into its structural parts.
///
/// The returned map must contain a `name` entry; the remaining entries
/// become implicit attributes during config emission.
pub type NameComposer = fn(&str) -> Result<Map<String, Value>, ObjectError>;

/// Per-type descriptor: field table, plural name, optional name composer and
/// the index of live instances keyed by fully-qualified name.
///
/// Descriptors are created once during runtime construction and live for the
/// whole process.
pub struct TypeDescriptor {
    name: &'static str,
    plural: &'static str,
    fields: &'static [FieldInfo],
    composer: Option<NameComposer>,
    objects: RwLock<HashMap<String, Arc<dyn ReplicatedObject>>>,
}

impl TypeDescriptor {
    pub fn new(name: &'static str, plural: &'static str, fields: &'static [FieldInfo]) -> Self {
        Self {
            name,
            plural,
            fields,
            composer: None,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_composer(mut self, composer: NameComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn plural(&self) -> &'static str {
        self.plural
    }

    pub fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    pub fn field_id(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// # Panics
    ///
    /// Panics when `fid` is out of range; field ids come from `field_id` or
    /// the per-type constants, so a bad id is a programming error.
    pub fn field(&self, fid: usize) -> &'static FieldInfo {
        &self.fields[fid]
    }

    /// Splits a full name into its structural parts. Without a composer the
    /// full name is the only part.
    pub fn parse_name(&self, full_name: &str) -> Result<Map<String, Value>, ObjectError> {
        match self.composer {
            Some(composer) => composer(full_name),
            None => {
                let mut parts = Map::new();
                parts.insert("name".to_string(), Value::String(full_name.to_string()));
                Ok(parts)
            }
        }
    }

    pub fn register_object(&self, object: Arc<dyn ReplicatedObject>) -> Result<(), ObjectError> {
        let name = object.core().name().to_string();
        let mut objects = self.objects.write().expect("type index poisoned");
        if objects.contains_key(&name) {
            return Err(ObjectError::DuplicateName {
                type_name: self.name,
                name,
            });
        }
        objects.insert(name, object);
        Ok(())
    }

    pub fn unregister_object(&self, name: &str) -> Option<Arc<dyn ReplicatedObject>> {
        let mut objects = self.objects.write().expect("type index poisoned");
        objects.remove(name)
    }

    pub fn object(&self, name: &str) -> Option<Arc<dyn ReplicatedObject>> {
        let objects = self.objects.read().expect("type index poisoned");
        objects.get(name).cloned()
    }

    /// Point-in-time copy of the live instance index.
    pub fn objects(&self) -> Vec<Arc<dyn ReplicatedObject>> {
        let objects = self.objects.read().expect("type index poisoned");
        objects.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("type index poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
