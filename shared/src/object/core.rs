use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use super::attribute::{AttrClass, NameLookup};
use super::descriptor::TypeDescriptor;
use super::error::ObjectError;

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

fn thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

struct ObjectState {
    fields: Vec<Value>,
    version: u64,
    active: bool,
    paused: bool,
    start_called: bool,
    stop_called: bool,
    pause_called: bool,
    resume_called: bool,
    state_loaded: bool,
    module: String,
    extensions: HashMap<String, Value>,
    original_attributes: BTreeMap<String, Value>,
}

struct StateGuard<'a> {
    owner: &'a AtomicU64,
    guard: MutexGuard<'a, ObjectState>,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.owner.store(0, Ordering::Release);
    }
}

impl std::ops::Deref for StateGuard<'_> {
    type Target = ObjectState;

    fn deref(&self) -> &ObjectState {
        &self.guard
    }
}

impl std::ops::DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut ObjectState {
        &mut self.guard
    }
}

/// Shared behavior of every replicated entity: the reflective field table,
/// the version counter, activation/pause flags, extensions and
/// original-attribute tracking. All of it sits behind one per-instance
/// monitor; change signals are emitted by the typed setters only after this
/// monitor is released.
pub struct ObjectCore {
    descriptor: Arc<TypeDescriptor>,
    name: String,
    owner: AtomicU64,
    state: Mutex<ObjectState>,
}

impl ObjectCore {
    pub fn new(descriptor: &Arc<TypeDescriptor>, name: impl Into<String>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            name: name.into(),
            owner: AtomicU64::new(0),
            state: Mutex::new(ObjectState {
                fields: vec![Value::Null; descriptor.fields().len()],
                version: 0,
                active: false,
                paused: true,
                start_called: false,
                stop_called: false,
                pause_called: false,
                resume_called: false,
                state_loaded: false,
                module: String::new(),
                extensions: HashMap::new(),
                original_attributes: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> StateGuard<'_> {
        let guard = self.state.lock().expect("object monitor poisoned");
        self.owner.store(thread_token(), Ordering::Release);
        StateGuard {
            owner: &self.owner,
            guard,
        }
    }

    /// Whether the calling thread currently holds this object's monitor.
    pub fn owns_lock(&self) -> bool {
        self.owner.load(Ordering::Acquire) == thread_token()
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, fid: usize) -> Value {
        self.lock().fields[fid].clone()
    }

    /// Writes a field value. Does not touch the version counter; only
    /// tracked attribute modification does.
    pub fn set_field(&self, fid: usize, value: Value) {
        self.lock().fields[fid] = value;
    }

    /// Read-modify-write of one field under a single monitor acquisition.
    pub fn update_field(&self, fid: usize, update: impl FnOnce(&mut Value)) {
        let mut state = self.lock();
        update(&mut state.fields[fid]);
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn set_active(&self, active: bool) {
        self.lock().active = active;
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    pub fn start_called(&self) -> bool {
        self.lock().start_called
    }

    pub fn stop_called(&self) -> bool {
        self.lock().stop_called
    }

    pub fn pause_called(&self) -> bool {
        self.lock().pause_called
    }

    pub fn resume_called(&self) -> bool {
        self.lock().resume_called
    }

    pub fn mark_start_called(&self) {
        self.lock().start_called = true;
    }

    pub fn mark_stop_called(&self) {
        self.lock().stop_called = true;
    }

    pub fn mark_pause_called(&self) {
        self.lock().pause_called = true;
    }

    pub fn mark_resume_called(&self) {
        self.lock().resume_called = true;
    }

    pub fn state_loaded(&self) -> bool {
        self.lock().state_loaded
    }

    pub fn set_state_loaded(&self, loaded: bool) {
        self.lock().state_loaded = loaded;
    }

    /// Source config module this object was defined in; empty for objects
    /// that did not come from a config file.
    pub fn module(&self) -> String {
        self.lock().module.clone()
    }

    pub fn set_module(&self, module: &str) {
        self.lock().module = module.to_string();
    }

    pub fn set_extension(&self, key: &str, value: Value) {
        self.lock().extensions.insert(key.to_string(), value);
    }

    pub fn extension(&self, key: &str) -> Option<Value> {
        self.lock().extensions.get(key).cloned()
    }

    pub fn clear_extension(&self, key: &str) {
        self.lock().extensions.remove(key);
    }

    /// Applies a dotted-path attribute modification.
    ///
    /// The head of the path names a top-level field; the tail walks into
    /// nested dictionaries, creating empty ones where missing. The previous
    /// top-level value is recorded in the original-attributes map the first
    /// time a `Config`-class path is touched. The version counter increases
    /// on every successful call.
    ///
    /// Returns whether the original-attributes map gained an entry, so the
    /// caller can fire the matching change signal.
    pub fn modify_attribute(
        &self,
        names: &dyn NameLookup,
        path: &str,
        value: Value,
    ) -> Result<bool, ObjectError> {
        let tokens: Vec<&str> = path.split('.').collect();
        let head = tokens[0];

        let fid = self
            .descriptor
            .field_id(head)
            .ok_or_else(|| ObjectError::UnknownField {
                type_name: self.descriptor.name(),
                field: head.to_string(),
            })?;
        let field = self.descriptor.field(fid);

        let mut state = self.lock();
        let old_value = state.fields[fid].clone();

        let mut tracked = false;
        if field.class.intersects(AttrClass::CONFIG)
            && !state.original_attributes.contains_key(path)
        {
            state
                .original_attributes
                .insert(path.to_string(), old_value.clone());
            tracked = true;
        }

        let new_value = if tokens.len() == 1 {
            value
        } else {
            let mut root = old_value;
            if root.is_null() {
                root = Value::Object(Map::new());
            }
            {
                let mut current = &mut root;
                for key in &tokens[1..tokens.len() - 1] {
                    let map =
                        current
                            .as_object_mut()
                            .ok_or_else(|| ObjectError::NotADictionary {
                                path: path.to_string(),
                            })?;
                    current = map
                        .entry((*key).to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                }
                let map = current
                    .as_object_mut()
                    .ok_or_else(|| ObjectError::NotADictionary {
                        path: path.to_string(),
                    })?;
                map.insert(tokens[tokens.len() - 1].to_string(), value);
            }
            root
        };

        field.kind.validate(field.name, &new_value, names)?;

        state.fields[fid] = new_value;
        state.version += 1;
        Ok(tracked)
    }

    /// Writes the saved pre-modification value back and stops tracking the
    /// path. The value recorded for a nested path is the whole top-level
    /// field, and that is what gets restored.
    // TODO: restore the exact nested entry for paths like "vars.os" once the
    // original-attributes map records subtree values
    pub fn restore_attribute(&self, path: &str) {
        let head = path.split('.').next().unwrap_or(path);
        let Some(fid) = self.descriptor.field_id(head) else {
            return;
        };

        let mut state = self.lock();
        let Some(saved) = state.original_attributes.remove(path) else {
            return;
        };
        state.fields[fid] = saved;
    }

    pub fn is_attribute_modified(&self, path: &str) -> bool {
        self.lock().original_attributes.contains_key(path)
    }

    pub fn original_attributes(&self) -> BTreeMap<String, Value> {
        self.lock().original_attributes.clone()
    }
}
