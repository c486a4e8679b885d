use std::sync::Arc;

use serde_json::Value;

use crate::object::replicated::ReplicatedObject;
use crate::peer::MessageOrigin;
use crate::runtime::Runtime;
use crate::signal::ChangeEvent;

pub mod check_result;
pub mod checkable;
pub mod command;
pub mod comment;
pub mod downtime;
pub mod host;
pub mod notification;
pub mod service;
pub mod time_period;
pub mod user;

pub use check_result::{AcknowledgementType, CheckResult, PerfdataValue, ServiceState};
pub use checkable::{checkable_fid, Checkable};
pub use command::{CheckCommand, EventCommand, NotificationCommand};
pub use comment::Comment;
pub use downtime::Downtime;
pub use host::Host;
pub use notification::Notification;
pub use service::Service;
pub use time_period::TimePeriod;
pub use user::User;

/// Expands to a registry-backed object type that carries custom variables
/// and nothing else replication needs to know about.
macro_rules! custom_var_object {
    ($(#[$meta:meta])* $ty:ident, $type_name:literal, vars: $vars_fid:expr) => {
        $(#[$meta])*
        pub struct $ty {
            core: $crate::object::core::ObjectCore,
        }

        impl $ty {
            pub const TYPE: &'static str = $type_name;

            pub fn new(
                types: &$crate::object::registry::ObjectTypes,
                name: &str,
            ) -> std::sync::Arc<$ty> {
                let descriptor = types
                    .type_by_name(Self::TYPE)
                    .expect(concat!($type_name, " type descriptor not registered"));
                std::sync::Arc::new($ty {
                    core: $crate::object::core::ObjectCore::new(&descriptor, name),
                })
            }

            pub fn by_name(
                runtime: &$crate::runtime::Runtime,
                name: &str,
            ) -> Option<std::sync::Arc<$ty>> {
                let object = runtime.types.object(Self::TYPE, name)?;
                object.as_any_arc().downcast::<$ty>().ok()
            }
        }

        impl $crate::object::replicated::ReplicatedObject for $ty {
            fn core(&self) -> &$crate::object::core::ObjectCore {
                &self.core
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_arc(
                self: std::sync::Arc<Self>,
            ) -> std::sync::Arc<dyn std::any::Any + Send + Sync> {
                self
            }

            fn vars_field_id(&self) -> Option<usize> {
                Some($vars_fid)
            }
        }
    };
}
pub(crate) use custom_var_object;

/// Replaces an object's custom-variables field and announces the change.
/// Returns false when the type carries no vars field.
pub fn set_object_vars(
    runtime: &Runtime,
    object: &Arc<dyn ReplicatedObject>,
    vars: Value,
    origin: Option<&Arc<MessageOrigin>>,
) -> bool {
    let Some(fid) = object.vars_field_id() else {
        return false;
    };

    object.core().set_field(fid, vars);
    runtime.signals.emit(
        runtime,
        &ChangeEvent::VarsChanged {
            object: Arc::clone(object),
        },
        origin,
    );
    true
}

/// The object's custom variables, empty when unset or not carried.
pub fn object_vars(object: &dyn ReplicatedObject) -> Value {
    match object.vars_field_id() {
        Some(fid) => {
            let value = object.core().field(fid);
            if value.is_null() {
                Value::Object(serde_json::Map::new())
            } else {
                value
            }
        }
        None => Value::Object(serde_json::Map::new()),
    }
}
