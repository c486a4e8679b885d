use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::object::core::ObjectCore;
use crate::object::replicated::ReplicatedObject;
use crate::peer::MessageOrigin;
use crate::runtime::Runtime;
use crate::signal::ChangeEvent;

use super::check_result::{AcknowledgementType, CheckResult};
use super::comment::Comment;
use super::downtime::Downtime;
use super::host::Host;
use super::service::Service;

/// Field ids shared by every checkable type. Host and Service field tables
/// start with the same prefix (see [`checkable_fields!`]), so these ids are
/// valid on both.
pub mod checkable_fid {
    pub const CHECK_COMMAND: usize = 0;
    pub const EVENT_COMMAND: usize = 1;
    pub const CHECK_PERIOD: usize = 2;
    pub const CHECK_INTERVAL: usize = 3;
    pub const RETRY_INTERVAL: usize = 4;
    pub const MAX_CHECK_ATTEMPTS: usize = 5;
    pub const ENABLE_ACTIVE_CHECKS: usize = 6;
    pub const ENABLE_PASSIVE_CHECKS: usize = 7;
    pub const ENABLE_NOTIFICATIONS: usize = 8;
    pub const ENABLE_FLAPPING: usize = 9;
    pub const ENABLE_EVENT_HANDLER: usize = 10;
    pub const ENABLE_PERFDATA: usize = 11;
    pub const VARS: usize = 12;
    pub const COMMAND_ENDPOINT: usize = 13;
    pub const NEXT_CHECK: usize = 14;
    pub const FORCE_NEXT_CHECK: usize = 15;
    pub const FORCE_NEXT_NOTIFICATION: usize = 16;
    pub const ACKNOWLEDGEMENT: usize = 17;
    pub const ACKNOWLEDGEMENT_EXPIRY: usize = 18;
    pub const LAST_CHECK_RESULT: usize = 19;
    pub const COMMENTS: usize = 20;
    pub const DOWNTIMES: usize = 21;
    pub const COUNT: usize = 22;
}

/// Expands to a checkable field table with the given type-specific fields
/// appended after the shared prefix. Keep the prefix in sync with
/// [`checkable_fid`].
macro_rules! checkable_fields {
    ($($extra:expr),* $(,)?) => {
        &[
            FieldInfo::new("check_command", FieldKind::ObjectName("CheckCommand"), AttrClass::CONFIG),
            FieldInfo::new("event_command", FieldKind::ObjectName("EventCommand"), AttrClass::CONFIG),
            FieldInfo::new("check_period", FieldKind::ObjectName("TimePeriod"), AttrClass::CONFIG),
            FieldInfo::new("check_interval", FieldKind::Number, AttrClass::CONFIG),
            FieldInfo::new("retry_interval", FieldKind::Number, AttrClass::CONFIG),
            FieldInfo::new("max_check_attempts", FieldKind::Number, AttrClass::CONFIG),
            FieldInfo::new("enable_active_checks", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("enable_passive_checks", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("enable_notifications", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("enable_flapping", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("enable_event_handler", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("enable_perfdata", FieldKind::Bool, AttrClass::CONFIG),
            FieldInfo::new("vars", FieldKind::Map, AttrClass::CONFIG),
            FieldInfo::new("command_endpoint", FieldKind::Text, AttrClass::CONFIG),
            FieldInfo::new("next_check", FieldKind::Number, AttrClass::STATE),
            FieldInfo::new("force_next_check", FieldKind::Bool, AttrClass::STATE),
            FieldInfo::new("force_next_notification", FieldKind::Bool, AttrClass::STATE),
            FieldInfo::new("acknowledgement", FieldKind::Number, AttrClass::STATE),
            FieldInfo::new("acknowledgement_expiry", FieldKind::Number, AttrClass::STATE),
            FieldInfo::new("last_check_result", FieldKind::Map, AttrClass::STATE),
            FieldInfo::new("comments", FieldKind::Map, AttrClass::STATE),
            FieldInfo::new("downtimes", FieldKind::Map, AttrClass::STATE),
            $($extra),*
        ]
    };
}
pub(crate) use checkable_fields;

static NEXT_TRACKING_ID: AtomicU64 = AtomicU64::new(1);

fn next_tracking_id(owner: &str) -> String {
    let seq = NEXT_TRACKING_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", owner, seq)
}

/// Any object that can produce check results: a host, or one of its
/// services. All replicated setters live here; each takes the origin of the
/// mutation and emits its change signal after the field write.
#[derive(Clone)]
pub enum Checkable {
    Host(Arc<Host>),
    Service(Arc<Service>),
}

impl Checkable {
    pub fn core(&self) -> &ObjectCore {
        match self {
            Checkable::Host(host) => host.core(),
            Checkable::Service(service) => service.core(),
        }
    }

    pub fn as_object(&self) -> Arc<dyn ReplicatedObject> {
        match self {
            Checkable::Host(host) => Arc::clone(host) as Arc<dyn ReplicatedObject>,
            Checkable::Service(service) => Arc::clone(service) as Arc<dyn ReplicatedObject>,
        }
    }

    pub fn from_object(object: &Arc<dyn ReplicatedObject>) -> Option<Checkable> {
        let any = Arc::clone(object).as_any_arc();
        if let Ok(host) = any.clone().downcast::<Host>() {
            return Some(Checkable::Host(host));
        }
        if let Ok(service) = any.downcast::<Service>() {
            return Some(Checkable::Service(service));
        }
        None
    }

    /// Resolves the `(host, service?)` identity used in event params.
    pub fn host_identity(&self) -> (String, Option<String>) {
        match self {
            Checkable::Host(host) => (host.core().name().to_string(), None),
            Checkable::Service(service) => (service.host_name(), Some(service.short_name())),
        }
    }

    fn emit(&self, runtime: &Runtime, event: ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
        runtime.signals.emit(runtime, &event, origin);
    }

    // Scheduling

    pub fn next_check(&self) -> f64 {
        self.core()
            .field(checkable_fid::NEXT_CHECK)
            .as_f64()
            .unwrap_or(0.0)
    }

    pub fn set_next_check(
        &self,
        runtime: &Runtime,
        next_check: f64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::NEXT_CHECK, json!(next_check));
        self.emit(
            runtime,
            ChangeEvent::NextCheckChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn force_next_check(&self) -> bool {
        self.core()
            .field(checkable_fid::FORCE_NEXT_CHECK)
            .as_bool()
            .unwrap_or(false)
    }

    pub fn set_force_next_check(
        &self,
        runtime: &Runtime,
        forced: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::FORCE_NEXT_CHECK, json!(forced));
        self.emit(
            runtime,
            ChangeEvent::ForceNextCheckChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn force_next_notification(&self) -> bool {
        self.core()
            .field(checkable_fid::FORCE_NEXT_NOTIFICATION)
            .as_bool()
            .unwrap_or(false)
    }

    pub fn set_force_next_notification(
        &self,
        runtime: &Runtime,
        forced: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::FORCE_NEXT_NOTIFICATION, json!(forced));
        self.emit(
            runtime,
            ChangeEvent::ForceNextNotificationChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn check_interval(&self) -> f64 {
        self.core()
            .field(checkable_fid::CHECK_INTERVAL)
            .as_f64()
            .unwrap_or(0.0)
    }

    pub fn set_check_interval(
        &self,
        runtime: &Runtime,
        interval: f64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::CHECK_INTERVAL, json!(interval));
        self.emit(
            runtime,
            ChangeEvent::CheckIntervalChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn retry_interval(&self) -> f64 {
        self.core()
            .field(checkable_fid::RETRY_INTERVAL)
            .as_f64()
            .unwrap_or(0.0)
    }

    pub fn set_retry_interval(
        &self,
        runtime: &Runtime,
        interval: f64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::RETRY_INTERVAL, json!(interval));
        self.emit(
            runtime,
            ChangeEvent::RetryIntervalChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn max_check_attempts(&self) -> i64 {
        self.core()
            .field(checkable_fid::MAX_CHECK_ATTEMPTS)
            .as_i64()
            .unwrap_or(0)
    }

    pub fn set_max_check_attempts(
        &self,
        runtime: &Runtime,
        attempts: i64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::MAX_CHECK_ATTEMPTS, json!(attempts));
        self.emit(
            runtime,
            ChangeEvent::MaxCheckAttemptsChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    // Enable flags

    pub fn enable_active_checks(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_ACTIVE_CHECKS)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_active_checks(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_ACTIVE_CHECKS, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnableActiveChecksChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn enable_passive_checks(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_PASSIVE_CHECKS)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_passive_checks(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_PASSIVE_CHECKS, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnablePassiveChecksChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn enable_notifications(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_NOTIFICATIONS)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_notifications(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_NOTIFICATIONS, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnableNotificationsChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn enable_flapping(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_FLAPPING)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_flapping(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_FLAPPING, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnableFlappingChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn enable_event_handler(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_EVENT_HANDLER)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_event_handler(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_EVENT_HANDLER, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnableEventHandlerChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn enable_perfdata(&self) -> bool {
        self.core()
            .field(checkable_fid::ENABLE_PERFDATA)
            .as_bool()
            .unwrap_or(true)
    }

    pub fn set_enable_perfdata(
        &self,
        runtime: &Runtime,
        enabled: bool,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ENABLE_PERFDATA, json!(enabled));
        self.emit(
            runtime,
            ChangeEvent::EnablePerfdataChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    // Command and period references (raw names; resolution happens in the
    // inbound handlers)

    pub fn check_command(&self) -> Option<String> {
        self.core()
            .field(checkable_fid::CHECK_COMMAND)
            .as_str()
            .map(str::to_string)
    }

    pub fn set_check_command_raw(
        &self,
        runtime: &Runtime,
        command: &str,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::CHECK_COMMAND, json!(command));
        self.emit(
            runtime,
            ChangeEvent::CheckCommandChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn event_command(&self) -> Option<String> {
        self.core()
            .field(checkable_fid::EVENT_COMMAND)
            .as_str()
            .map(str::to_string)
    }

    pub fn set_event_command_raw(
        &self,
        runtime: &Runtime,
        command: &str,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::EVENT_COMMAND, json!(command));
        self.emit(
            runtime,
            ChangeEvent::EventCommandChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn check_period(&self) -> Option<String> {
        self.core()
            .field(checkable_fid::CHECK_PERIOD)
            .as_str()
            .map(str::to_string)
    }

    pub fn set_check_period_raw(
        &self,
        runtime: &Runtime,
        period: &str,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::CHECK_PERIOD, json!(period));
        self.emit(
            runtime,
            ChangeEvent::CheckPeriodChanged {
                checkable: self.clone(),
            },
            origin,
        );
    }

    /// The endpoint this checkable delegates check execution to.
    pub fn command_endpoint_name(&self) -> Option<String> {
        self.core()
            .field(checkable_fid::COMMAND_ENDPOINT)
            .as_str()
            .map(str::to_string)
    }

    // Check results

    pub fn last_check_result(&self) -> Option<CheckResult> {
        let value = self.core().field(checkable_fid::LAST_CHECK_RESULT);
        serde_json::from_value(value).ok()
    }

    pub fn process_check_result(
        &self,
        runtime: &Runtime,
        result: CheckResult,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        let serialized = serde_json::to_value(&result).unwrap_or(Value::Null);
        self.core()
            .set_field(checkable_fid::LAST_CHECK_RESULT, serialized);
        self.emit(
            runtime,
            ChangeEvent::NewCheckResult {
                checkable: self.clone(),
                result,
            },
            origin,
        );
    }

    // Comments

    pub fn comments(&self) -> Vec<Comment> {
        let value = self.core().field(checkable_fid::COMMENTS);
        match value.as_object() {
            Some(map) => map
                .values()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn add_comment(
        &self,
        runtime: &Runtime,
        entry_type: i64,
        author: &str,
        text: &str,
        expire_time: f64,
        id: Option<String>,
        origin: Option<&Arc<MessageOrigin>>,
    ) -> String {
        let id = id.unwrap_or_else(|| next_tracking_id(self.core().name()));
        let comment = Comment {
            id: id.clone(),
            entry_type,
            author: author.to_string(),
            text: text.to_string(),
            expire_time,
        };

        let serialized = serde_json::to_value(&comment).unwrap_or(Value::Null);
        self.core().update_field(checkable_fid::COMMENTS, |value| {
            if !value.is_object() {
                *value = Value::Object(Map::new());
            }
            if let Some(map) = value.as_object_mut() {
                map.insert(id.clone(), serialized);
            }
        });

        self.emit(
            runtime,
            ChangeEvent::CommentAdded {
                checkable: self.clone(),
                comment,
            },
            origin,
        );
        id
    }

    pub fn remove_comment(&self, runtime: &Runtime, id: &str, origin: Option<&Arc<MessageOrigin>>) {
        let mut removed = false;
        self.core().update_field(checkable_fid::COMMENTS, |value| {
            if let Some(map) = value.as_object_mut() {
                removed = map.remove(id).is_some();
            }
        });

        if removed {
            self.emit(
                runtime,
                ChangeEvent::CommentRemoved {
                    checkable: self.clone(),
                    id: id.to_string(),
                },
                origin,
            );
        }
    }

    // Downtimes

    pub fn downtimes(&self) -> Vec<Downtime> {
        let value = self.core().field(checkable_fid::DOWNTIMES);
        match value.as_object() {
            Some(map) => map
                .values()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect(),
            None => Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_downtime(
        &self,
        runtime: &Runtime,
        author: &str,
        comment: &str,
        start_time: f64,
        end_time: f64,
        fixed: bool,
        triggered_by: Option<String>,
        duration: f64,
        scheduled_by: Option<String>,
        id: Option<String>,
        origin: Option<&Arc<MessageOrigin>>,
    ) -> String {
        let id = id.unwrap_or_else(|| next_tracking_id(self.core().name()));
        let downtime = Downtime {
            id: id.clone(),
            author: author.to_string(),
            comment: comment.to_string(),
            start_time,
            end_time,
            fixed,
            duration,
            triggered_by,
            scheduled_by,
        };

        let serialized = serde_json::to_value(&downtime).unwrap_or(Value::Null);
        self.core().update_field(checkable_fid::DOWNTIMES, |value| {
            if !value.is_object() {
                *value = Value::Object(Map::new());
            }
            if let Some(map) = value.as_object_mut() {
                map.insert(id.clone(), serialized);
            }
        });

        self.emit(
            runtime,
            ChangeEvent::DowntimeAdded {
                checkable: self.clone(),
                downtime,
            },
            origin,
        );
        id
    }

    pub fn remove_downtime(&self, runtime: &Runtime, id: &str, origin: Option<&Arc<MessageOrigin>>) {
        let mut removed = false;
        self.core().update_field(checkable_fid::DOWNTIMES, |value| {
            if let Some(map) = value.as_object_mut() {
                removed = map.remove(id).is_some();
            }
        });

        if removed {
            self.emit(
                runtime,
                ChangeEvent::DowntimeRemoved {
                    checkable: self.clone(),
                    id: id.to_string(),
                },
                origin,
            );
        }
    }

    // Acknowledgements

    pub fn acknowledgement(&self) -> AcknowledgementType {
        let value = self
            .core()
            .field(checkable_fid::ACKNOWLEDGEMENT)
            .as_i64()
            .unwrap_or(0);
        AcknowledgementType::from_value(value)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn acknowledge_problem(
        &self,
        runtime: &Runtime,
        author: &str,
        comment: &str,
        ack_type: AcknowledgementType,
        notify: bool,
        expiry: f64,
        origin: Option<&Arc<MessageOrigin>>,
    ) {
        self.core()
            .set_field(checkable_fid::ACKNOWLEDGEMENT, json!(ack_type.to_value()));
        self.core()
            .set_field(checkable_fid::ACKNOWLEDGEMENT_EXPIRY, json!(expiry));
        self.emit(
            runtime,
            ChangeEvent::AcknowledgementSet {
                checkable: self.clone(),
                author: author.to_string(),
                comment: comment.to_string(),
                ack_type: ack_type.to_value(),
                notify,
                expiry,
            },
            origin,
        );
    }

    pub fn clear_acknowledgement(&self, runtime: &Runtime, origin: Option<&Arc<MessageOrigin>>) {
        self.core().set_field(
            checkable_fid::ACKNOWLEDGEMENT,
            json!(AcknowledgementType::None.to_value()),
        );
        self.core()
            .set_field(checkable_fid::ACKNOWLEDGEMENT_EXPIRY, json!(0.0));
        self.emit(
            runtime,
            ChangeEvent::AcknowledgementCleared {
                checkable: self.clone(),
            },
            origin,
        );
    }

    pub fn vars(&self) -> Map<String, Value> {
        self.core()
            .field(checkable_fid::VARS)
            .as_object()
            .cloned()
            .unwrap_or_default()
    }
}
