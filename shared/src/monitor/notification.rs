use std::any::Any;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};
use crate::object::core::ObjectCore;
use crate::object::error::ObjectError;
use crate::object::registry::ObjectTypes;
use crate::object::replicated::ReplicatedObject;
use crate::peer::MessageOrigin;
use crate::runtime::Runtime;
use crate::signal::ChangeEvent;

pub mod notification_fid {
    pub const HOST_NAME: usize = 0;
    pub const SERVICE_NAME: usize = 1;
    pub const VARS: usize = 2;
    pub const NEXT_NOTIFICATION: usize = 3;
}

pub static NOTIFICATION_FIELDS: &[FieldInfo] = &[
    FieldInfo::new("host_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("service_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("vars", FieldKind::Map, AttrClass::CONFIG),
    FieldInfo::new("next_notification", FieldKind::Number, AttrClass::STATE),
];

/// A notification rule attached to a checkable. Replication only cares
/// about its schedule and custom variables.
pub struct Notification {
    core: ObjectCore,
}

impl Notification {
    pub const TYPE: &'static str = "Notification";

    pub fn new(types: &ObjectTypes, full_name: &str) -> Arc<Notification> {
        let descriptor = types
            .type_by_name(Self::TYPE)
            .expect("Notification type descriptor not registered");
        Arc::new(Notification {
            core: ObjectCore::new(&descriptor, full_name),
        })
    }

    pub fn by_name(runtime: &Runtime, full_name: &str) -> Option<Arc<Notification>> {
        let object = runtime.types.object(Self::TYPE, full_name)?;
        object.as_any_arc().downcast::<Notification>().ok()
    }

    pub fn next_notification(&self) -> f64 {
        self.core
            .field(notification_fid::NEXT_NOTIFICATION)
            .as_f64()
            .unwrap_or(0.0)
    }

    pub fn set_next_notification(
        self: &Arc<Self>,
        runtime: &Runtime,
        next_notification: f64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core
            .set_field(notification_fid::NEXT_NOTIFICATION, json!(next_notification));
        runtime.signals.emit(
            runtime,
            &ChangeEvent::NextNotificationChanged {
                notification: Arc::clone(self),
            },
            origin,
        );
    }
}

/// Name composer for notifications: `host!notification` or
/// `host!service!notification`.
pub fn notification_name_parts(full_name: &str) -> Result<Map<String, Value>, ObjectError> {
    let tokens: Vec<&str> = full_name.splitn(3, '!').collect();

    let mut parts = Map::new();
    match tokens.as_slice() {
        [host, name] => {
            parts.insert("host_name".to_string(), json!(host));
            parts.insert("name".to_string(), json!(name));
        }
        [host, service, name] => {
            parts.insert("host_name".to_string(), json!(host));
            parts.insert("service_name".to_string(), json!(service));
            parts.insert("name".to_string(), json!(name));
        }
        _ => {
            return Err(ObjectError::MalformedName {
                type_name: Notification::TYPE,
                name: full_name.to_string(),
            })
        }
    }
    Ok(parts)
}

impl ReplicatedObject for Notification {
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
        Some(notification_fid::VARS)
    }
}
