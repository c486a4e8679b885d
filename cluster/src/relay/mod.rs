use std::sync::Arc;

use log::debug;
use serde_json::{json, Map, Value};

use vigil_shared::monitor::object_vars;
use vigil_shared::{
    ChangeEvent, ChangeKind, Checkable, MessageOrigin, RelayScope, ReplicatedObject, Runtime,
};

pub mod messages;

use messages::{checkable_params, make_check_result_message, rpc_message};

/// The outbound half of event replication.
///
/// One subscriber per change kind turns local signals into `event::<Name>`
/// messages and hands them to the peer listener, scoped to the changed
/// object. Without a listener (standalone mode) every handler is a no-op.
///
/// A change that carries a wire origin was just applied by the inbound
/// dispatcher; relaying it again would echo it back into the cluster, so
/// those are dropped here.
pub struct EventRelay;

impl EventRelay {
    pub fn subscribe(runtime: &Runtime) {
        let signals = &runtime.signals;

        signals.subscribe(ChangeKind::NewCheckResult, on_check_result);
        signals.subscribe(ChangeKind::NextCheckChanged, on_next_check_changed);
        signals.subscribe(
            ChangeKind::NextNotificationChanged,
            on_next_notification_changed,
        );
        signals.subscribe(ChangeKind::ForceNextCheckChanged, on_force_next_check_changed);
        signals.subscribe(
            ChangeKind::ForceNextNotificationChanged,
            on_force_next_notification_changed,
        );
        signals.subscribe(
            ChangeKind::EnableActiveChecksChanged,
            on_enable_active_checks_changed,
        );
        signals.subscribe(
            ChangeKind::EnablePassiveChecksChanged,
            on_enable_passive_checks_changed,
        );
        signals.subscribe(
            ChangeKind::EnableNotificationsChanged,
            on_enable_notifications_changed,
        );
        signals.subscribe(ChangeKind::EnableFlappingChanged, on_enable_flapping_changed);
        signals.subscribe(
            ChangeKind::EnableEventHandlerChanged,
            on_enable_event_handler_changed,
        );
        signals.subscribe(ChangeKind::EnablePerfdataChanged, on_enable_perfdata_changed);
        signals.subscribe(ChangeKind::CheckIntervalChanged, on_check_interval_changed);
        signals.subscribe(ChangeKind::RetryIntervalChanged, on_retry_interval_changed);
        signals.subscribe(
            ChangeKind::MaxCheckAttemptsChanged,
            on_max_check_attempts_changed,
        );
        signals.subscribe(ChangeKind::EventCommandChanged, on_event_command_changed);
        signals.subscribe(ChangeKind::CheckCommandChanged, on_check_command_changed);
        signals.subscribe(ChangeKind::CheckPeriodChanged, on_check_period_changed);
        signals.subscribe(ChangeKind::VarsChanged, on_vars_changed);
        signals.subscribe(ChangeKind::CommentAdded, on_comment_added);
        signals.subscribe(ChangeKind::CommentRemoved, on_comment_removed);
        signals.subscribe(ChangeKind::DowntimeAdded, on_downtime_added);
        signals.subscribe(ChangeKind::DowntimeRemoved, on_downtime_removed);
        signals.subscribe(ChangeKind::AcknowledgementSet, on_acknowledgement_set);
        signals.subscribe(ChangeKind::AcknowledgementCleared, on_acknowledgement_cleared);
    }
}

/// Common tail of every checkable relay handler: build the envelope and
/// relay it scoped to the object, unless the change came off the wire.
fn relay_checkable_event(
    runtime: &Runtime,
    checkable: &Checkable,
    method: &str,
    extra: Vec<(&str, Value)>,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let Some(listener) = runtime.peer_listener() else {
        return;
    };
    if origin.is_some() {
        return;
    }

    let mut params = checkable_params(checkable);
    for (key, value) in extra {
        params.insert(key.to_string(), value);
    }

    let message = rpc_message(method, Value::Object(params));
    listener.relay_message(
        None,
        RelayScope::Object(checkable.as_object()),
        message,
        true,
    );
}

fn on_check_result(runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
    let ChangeEvent::NewCheckResult { checkable, result } = event else {
        return;
    };
    let Some(listener) = runtime.peer_listener() else {
        return;
    };
    if origin.is_some() {
        return;
    }

    let message = make_check_result_message(checkable, result);
    listener.relay_message(
        None,
        RelayScope::Object(checkable.as_object()),
        message,
        true,
    );
}

fn on_next_check_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::NextCheckChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetNextCheck",
        vec![("next_check", json!(checkable.next_check()))],
        origin,
    );
}

fn on_next_notification_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::NextNotificationChanged { notification } = event else {
        return;
    };
    let Some(listener) = runtime.peer_listener() else {
        return;
    };
    if origin.is_some() {
        return;
    }

    let mut params = Map::new();
    params.insert(
        "notification".to_string(),
        json!(notification.core().name()),
    );
    params.insert(
        "next_notification".to_string(),
        json!(notification.next_notification()),
    );

    let message = rpc_message("event::SetNextNotification", Value::Object(params));
    let scope = RelayScope::Object(Arc::clone(notification) as Arc<dyn ReplicatedObject>);
    listener.relay_message(None, scope, message, true);
}

fn on_force_next_check_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::ForceNextCheckChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetForceNextCheck",
        vec![("forced", json!(checkable.force_next_check()))],
        origin,
    );
}

fn on_force_next_notification_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::ForceNextNotificationChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetForceNextNotification",
        vec![("forced", json!(checkable.force_next_notification()))],
        origin,
    );
}

fn on_enable_active_checks_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnableActiveChecksChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnableActiveChecks",
        vec![("enabled", json!(checkable.enable_active_checks()))],
        origin,
    );
}

fn on_enable_passive_checks_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnablePassiveChecksChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnablePassiveChecks",
        vec![("enabled", json!(checkable.enable_passive_checks()))],
        origin,
    );
}

fn on_enable_notifications_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnableNotificationsChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnableNotifications",
        vec![("enabled", json!(checkable.enable_notifications()))],
        origin,
    );
}

fn on_enable_flapping_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnableFlappingChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnableFlapping",
        vec![("enabled", json!(checkable.enable_flapping()))],
        origin,
    );
}

fn on_enable_event_handler_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnableEventHandlerChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnableEventHandler",
        vec![("enabled", json!(checkable.enable_event_handler()))],
        origin,
    );
}

fn on_enable_perfdata_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EnablePerfdataChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEnablePerfdata",
        vec![("enabled", json!(checkable.enable_perfdata()))],
        origin,
    );
}

fn on_check_interval_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::CheckIntervalChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetCheckInterval",
        vec![("interval", json!(checkable.check_interval()))],
        origin,
    );
}

fn on_retry_interval_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::RetryIntervalChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetRetryInterval",
        vec![("interval", json!(checkable.retry_interval()))],
        origin,
    );
}

fn on_max_check_attempts_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::MaxCheckAttemptsChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetMaxCheckAttempts",
        vec![("attempts", json!(checkable.max_check_attempts()))],
        origin,
    );
}

fn on_event_command_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::EventCommandChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetEventCommand",
        vec![("command", json!(checkable.event_command()))],
        origin,
    );
}

fn on_check_command_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::CheckCommandChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetCheckCommand",
        vec![("command", json!(checkable.check_command()))],
        origin,
    );
}

fn on_check_period_changed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::CheckPeriodChanged { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetCheckPeriod",
        vec![("timeperiod", json!(checkable.check_period()))],
        origin,
    );
}

fn on_vars_changed(runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
    let ChangeEvent::VarsChanged { object } = event else {
        return;
    };
    let Some(listener) = runtime.peer_listener() else {
        return;
    };
    if origin.is_some() {
        return;
    }

    let core = object.core();
    debug!(
        "relaying vars for object '{}' of type '{}'",
        core.name(),
        core.type_name()
    );

    let mut params = Map::new();
    params.insert("object".to_string(), json!(core.name()));
    params.insert("object_type".to_string(), json!(core.type_name()));
    params.insert("vars".to_string(), object_vars(object.as_ref()));

    let message = rpc_message("event::SetVars", Value::Object(params));
    listener.relay_message(None, RelayScope::Object(Arc::clone(object)), message, true);
}

fn on_comment_added(runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
    let ChangeEvent::CommentAdded { checkable, comment } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::AddComment",
        vec![(
            "comment",
            serde_json::to_value(comment).unwrap_or(Value::Null),
        )],
        origin,
    );
}

fn on_comment_removed(runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
    let ChangeEvent::CommentRemoved { checkable, id } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::RemoveComment",
        vec![("id", json!(id))],
        origin,
    );
}

fn on_downtime_added(runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
    let ChangeEvent::DowntimeAdded {
        checkable,
        downtime,
    } = event
    else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::AddDowntime",
        vec![(
            "downtime",
            serde_json::to_value(downtime).unwrap_or(Value::Null),
        )],
        origin,
    );
}

fn on_downtime_removed(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::DowntimeRemoved { checkable, id } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::RemoveDowntime",
        vec![("id", json!(id))],
        origin,
    );
}

fn on_acknowledgement_set(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::AcknowledgementSet {
        checkable,
        author,
        comment,
        ack_type,
        notify,
        expiry,
    } = event
    else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::SetAcknowledgement",
        vec![
            ("author", json!(author)),
            ("comment", json!(comment)),
            ("acktype", json!(ack_type)),
            ("notify", json!(notify)),
            ("expiry", json!(expiry)),
        ],
        origin,
    );
}

fn on_acknowledgement_cleared(
    runtime: &Runtime,
    event: &ChangeEvent,
    origin: Option<&Arc<MessageOrigin>>,
) {
    let ChangeEvent::AcknowledgementCleared { checkable } = event else {
        return;
    };
    relay_checkable_event(
        runtime,
        checkable,
        "event::ClearAcknowledgement",
        Vec::new(),
        origin,
    );
}
