use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::monitor::command::{CheckCommand, EventCommand, NotificationCommand, COMMAND_FIELDS};
use crate::monitor::host::{Host, HOST_FIELDS};
use crate::monitor::notification::{notification_name_parts, Notification, NOTIFICATION_FIELDS};
use crate::monitor::service::{service_name_parts, Service, SERVICE_FIELDS};
use crate::monitor::time_period::{TimePeriod, TIME_PERIOD_FIELDS};
use crate::monitor::user::{User, USER_FIELDS};
use crate::object::descriptor::TypeDescriptor;
use crate::object::error::ObjectError;
use crate::object::registry::ObjectTypes;
use crate::object::replicated::ReplicatedObject;
use crate::peer::{CheckEngine, Endpoint, PeerListener, Zone};
use crate::signal::{ChangeEvent, SignalHub};

/// Configuration injected by the host application.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Root of the writable state tree (repository files, snapshots).
    pub state_dir: PathBuf,
    /// Root of the config-module tree the object-config service stages into.
    pub module_dir: PathBuf,
    /// Worker count for parallel state restoration.
    pub concurrency: usize,
    /// Whether this endpoint executes commands on behalf of its parents.
    pub accept_commands: bool,
    /// Product name used in state paths.
    pub product: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("/var"),
            module_dir: PathBuf::from("/etc/vigil/modules"),
            concurrency: 4,
            accept_commands: false,
            product: "vigil".to_string(),
        }
    }
}

/// The context object threaded through every operation: type registry,
/// signal hub, injected configuration and the pluggable collaborators
/// (peer listener, local endpoint, check engine).
pub struct Runtime {
    pub types: ObjectTypes,
    pub signals: SignalHub,
    pub config: RuntimeConfig,
    peer_listener: RwLock<Option<Arc<dyn PeerListener>>>,
    local_endpoint: RwLock<Option<Arc<dyn Endpoint>>>,
    check_engine: RwLock<Option<Arc<dyn CheckEngine>>>,
}

impl Runtime {
    /// Builds a runtime with the built-in type descriptors registered.
    pub fn new(config: RuntimeConfig) -> Arc<Runtime> {
        let types = ObjectTypes::new();

        types.register_type(TypeDescriptor::new(Host::TYPE, "Hosts", HOST_FIELDS));
        types.register_type(
            TypeDescriptor::new(Service::TYPE, "Services", SERVICE_FIELDS)
                .with_composer(service_name_parts),
        );
        types.register_type(
            TypeDescriptor::new(Notification::TYPE, "Notifications", NOTIFICATION_FIELDS)
                .with_composer(notification_name_parts),
        );
        types.register_type(TypeDescriptor::new(
            CheckCommand::TYPE,
            "CheckCommands",
            COMMAND_FIELDS,
        ));
        types.register_type(TypeDescriptor::new(
            EventCommand::TYPE,
            "EventCommands",
            COMMAND_FIELDS,
        ));
        types.register_type(TypeDescriptor::new(
            NotificationCommand::TYPE,
            "NotificationCommands",
            COMMAND_FIELDS,
        ));
        types.register_type(TypeDescriptor::new(User::TYPE, "Users", USER_FIELDS));
        types.register_type(TypeDescriptor::new(
            TimePeriod::TYPE,
            "TimePeriods",
            TIME_PERIOD_FIELDS,
        ));

        Arc::new(Runtime {
            types,
            signals: SignalHub::new(),
            config,
            peer_listener: RwLock::new(None),
            local_endpoint: RwLock::new(None),
            check_engine: RwLock::new(None),
        })
    }

    pub fn peer_listener(&self) -> Option<Arc<dyn PeerListener>> {
        self.peer_listener
            .read()
            .expect("peer listener poisoned")
            .clone()
    }

    pub fn set_peer_listener(&self, listener: Option<Arc<dyn PeerListener>>) {
        *self.peer_listener.write().expect("peer listener poisoned") = listener;
    }

    pub fn local_endpoint(&self) -> Option<Arc<dyn Endpoint>> {
        self.local_endpoint
            .read()
            .expect("local endpoint poisoned")
            .clone()
    }

    pub fn set_local_endpoint(&self, endpoint: Option<Arc<dyn Endpoint>>) {
        *self.local_endpoint.write().expect("local endpoint poisoned") = endpoint;
    }

    pub fn local_zone(&self) -> Option<Arc<dyn Zone>> {
        self.local_endpoint()?.zone()
    }

    pub fn check_engine(&self) -> Option<Arc<dyn CheckEngine>> {
        self.check_engine
            .read()
            .expect("check engine poisoned")
            .clone()
    }

    pub fn set_check_engine(&self, engine: Option<Arc<dyn CheckEngine>>) {
        *self.check_engine.write().expect("check engine poisoned") = engine;
    }

    /// Adds the object to its type index. Services are additionally linked
    /// into their host's service index.
    pub fn register_object(&self, object: Arc<dyn ReplicatedObject>) -> Result<(), ObjectError> {
        debug_assert!(!object.core().owns_lock());

        object
            .core()
            .descriptor()
            .register_object(Arc::clone(&object))?;

        if let Ok(service) = Arc::clone(&object).as_any_arc().downcast::<Service>() {
            if let Some(host) = Host::by_name(self, &service.host_name()) {
                host.add_service(&service);
            }
        }

        Ok(())
    }

    /// Removes the object from its type index and, for services, from the
    /// owning host's service index.
    pub fn unregister_object(&self, object: &Arc<dyn ReplicatedObject>) {
        debug_assert!(!object.core().owns_lock());

        let core = object.core();
        core.descriptor().unregister_object(core.name());

        if let Ok(service) = Arc::clone(object).as_any_arc().downcast::<Service>() {
            if let Some(host) = Host::by_name(self, &service.host_name()) {
                host.remove_service(&service.short_name());
            }
        }
    }

    pub fn object(&self, type_name: &str, name: &str) -> Option<Arc<dyn ReplicatedObject>> {
        self.types.object(type_name, name)
    }

    /// Deactivates every registered object, in arbitrary order.
    pub fn stop_objects(&self) {
        for descriptor in self.types.all() {
            for object in descriptor.objects() {
                object.deactivate();
            }
        }
    }

    /// Applies a dotted-path attribute modification and fires the
    /// original-attributes signal when the path became tracked.
    pub fn modify_object_attribute(
        &self,
        object: &Arc<dyn ReplicatedObject>,
        path: &str,
        value: Value,
    ) -> Result<(), ObjectError> {
        let tracked = object.core().modify_attribute(&self.types, path, value)?;

        if tracked {
            self.signals.emit(
                self,
                &ChangeEvent::OriginalAttributesChanged {
                    object: Arc::clone(object),
                    path: path.to_string(),
                },
                None,
            );
        }

        Ok(())
    }
}
