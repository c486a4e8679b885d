use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use vigil_shared::monitor::set_object_vars;
use vigil_shared::{
    AcknowledgementType, CheckCommand, CheckResult, Checkable, Comment, Downtime, Endpoint,
    EventCommand, Host, MessageOrigin, Notification, NotificationCommand, PerfdataValue,
    ReplicatedObject, Runtime, Service, TimePeriod, User,
};

/// Resolves the sending endpoint, logging and discarding when the client is
/// not a trusted peer.
pub(super) fn sender_endpoint(
    origin: &Arc<MessageOrigin>,
    what: &str,
) -> Option<Arc<dyn Endpoint>> {
    match &origin.endpoint {
        Some(endpoint) => Some(Arc::clone(endpoint)),
        None => {
            warn!(
                "discarding '{}' message from '{}': invalid endpoint origin (client not allowed)",
                what, origin.client_identity
            );
            None
        }
    }
}

/// Resolves `params.host` / optional `params.service` to the target
/// checkable. Unknown targets are dropped silently.
pub(super) fn resolve_checkable(runtime: &Runtime, params: &Value) -> Option<Checkable> {
    let host = Host::by_name(runtime, params.get("host")?.as_str()?)?;

    match params.get("service").and_then(Value::as_str) {
        Some(short_name) => host
            .service_by_short_name(short_name)
            .map(Checkable::Service),
        None => Some(Checkable::Host(host)),
    }
}

/// Zone authorization common to every handler: the sending zone, when known,
/// must have access to the target object.
pub(super) fn authorized(
    origin: &Arc<MessageOrigin>,
    target: &dyn ReplicatedObject,
    what: &str,
) -> bool {
    if let Some(zone) = &origin.zone {
        if !zone.can_access_object(target) {
            warn!(
                "discarding '{}' message from '{}': unauthorized access",
                what, origin.client_identity
            );
            return false;
        }
    }
    true
}

fn resolve_authorized_checkable(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
    what: &str,
) -> Option<Checkable> {
    sender_endpoint(origin, what)?;
    let params = params?;
    let checkable = resolve_checkable(runtime, params)?;

    if !authorized(origin, checkable.as_object().as_ref(), what) {
        return None;
    }
    Some(checkable)
}

pub fn handle_check_result(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(endpoint) = sender_endpoint(origin, "check result") else {
        return;
    };
    let Some(params) = params else {
        return;
    };

    let Some(wire_result) = params.get("cr").and_then(Value::as_object) else {
        return;
    };

    // perfdata entries travel inline; dictionaries become structured samples
    // again, anything else is preserved verbatim
    let mut wire_result = wire_result.clone();
    let wire_perf = wire_result.remove("performance_data");

    let mut result: CheckResult =
        match serde_json::from_value(Value::Object(wire_result)) {
            Ok(result) => result,
            Err(err) => {
                debug!("discarding malformed check result: {}", err);
                return;
            }
        };

    let mut performance_data = Vec::new();
    if let Some(Value::Array(entries)) = wire_perf {
        for entry in entries {
            if entry.is_object() {
                match serde_json::from_value::<PerfdataValue>(entry.clone()) {
                    Ok(sample) => performance_data
                        .push(serde_json::to_value(sample).unwrap_or(entry)),
                    Err(_) => performance_data.push(entry),
                }
            } else {
                performance_data.push(entry);
            }
        }
    }
    result.performance_data = performance_data;

    let Some(checkable) = resolve_checkable(runtime, params) else {
        return;
    };

    let command_endpoint = checkable.command_endpoint_name();
    let is_command_endpoint = command_endpoint.as_deref() == Some(endpoint.name());

    if let Some(zone) = &origin.zone {
        if !zone.can_access_object(checkable.as_object().as_ref()) && !is_command_endpoint {
            warn!(
                "discarding 'check result' message from '{}': unauthorized access",
                origin.client_identity
            );
            return;
        }
    }

    if is_command_endpoint {
        // the agent we delegated this check to is answering; process it as a
        // local result so it gets relayed onward
        checkable.process_check_result(runtime, result, None);
    } else {
        checkable.process_check_result(runtime, result, Some(origin));
    }
}

pub fn handle_set_next_check(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "next check changed")
    else {
        return;
    };
    let Some(next_check) = params.and_then(|p| p.get("next_check")).and_then(Value::as_f64) else {
        return;
    };

    checkable.set_next_check(runtime, next_check, Some(origin));
}

pub fn handle_set_next_notification(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let what = "next notification changed";
    if sender_endpoint(origin, what).is_none() {
        return;
    }
    let Some(params) = params else {
        return;
    };

    let Some(name) = params.get("notification").and_then(Value::as_str) else {
        return;
    };
    let Some(notification) = Notification::by_name(runtime, name) else {
        return;
    };

    if !authorized(origin, notification.as_ref(), what) {
        return;
    }

    let Some(next_notification) = params.get("next_notification").and_then(Value::as_f64) else {
        return;
    };
    notification.set_next_notification(runtime, next_notification, Some(origin));
}

pub fn handle_set_force_next_check(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "force next check changed")
    else {
        return;
    };
    let Some(forced) = params.and_then(|p| p.get("forced")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_force_next_check(runtime, forced, Some(origin));
}

pub fn handle_set_force_next_notification(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) = resolve_authorized_checkable(
        runtime,
        origin,
        params,
        "force next notification changed",
    ) else {
        return;
    };
    let Some(forced) = params.and_then(|p| p.get("forced")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_force_next_notification(runtime, forced, Some(origin));
}

pub fn handle_set_enable_active_checks(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable active checks changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_active_checks(runtime, enabled, Some(origin));
}

pub fn handle_set_enable_passive_checks(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable passive checks changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_passive_checks(runtime, enabled, Some(origin));
}

pub fn handle_set_enable_notifications(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable notifications changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_notifications(runtime, enabled, Some(origin));
}

pub fn handle_set_enable_flapping(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable flapping changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_flapping(runtime, enabled, Some(origin));
}

pub fn handle_set_enable_event_handler(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable event handler changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_event_handler(runtime, enabled, Some(origin));
}

pub fn handle_set_enable_perfdata(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "enable perfdata changed")
    else {
        return;
    };
    let Some(enabled) = params.and_then(|p| p.get("enabled")).and_then(Value::as_bool) else {
        return;
    };

    checkable.set_enable_perfdata(runtime, enabled, Some(origin));
}

pub fn handle_set_check_interval(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "check interval changed")
    else {
        return;
    };
    let Some(interval) = params.and_then(|p| p.get("interval")).and_then(Value::as_f64) else {
        return;
    };

    checkable.set_check_interval(runtime, interval, Some(origin));
}

pub fn handle_set_retry_interval(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "retry interval changed")
    else {
        return;
    };
    let Some(interval) = params.and_then(|p| p.get("interval")).and_then(Value::as_f64) else {
        return;
    };

    checkable.set_retry_interval(runtime, interval, Some(origin));
}

pub fn handle_set_max_check_attempts(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "max check attempts changed")
    else {
        return;
    };
    let Some(attempts) = params.and_then(|p| p.get("attempts")).and_then(Value::as_i64) else {
        return;
    };

    checkable.set_max_check_attempts(runtime, attempts, Some(origin));
}

pub fn handle_set_event_command(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let what = "event command changed";
    if sender_endpoint(origin, what).is_none() {
        return;
    }
    let Some(params) = params else {
        return;
    };
    let Some(checkable) = resolve_checkable(runtime, params) else {
        return;
    };

    // the named command must exist locally before the reference is applied
    let Some(name) = params.get("command").and_then(Value::as_str) else {
        return;
    };
    let Some(command) = EventCommand::by_name(runtime, name) else {
        return;
    };

    if !authorized(origin, checkable.as_object().as_ref(), what) {
        return;
    }

    checkable.set_event_command_raw(runtime, command.core().name(), Some(origin));
}

pub fn handle_set_check_command(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let what = "check command changed";
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, what) else {
        return;
    };

    let Some(name) = params
        .and_then(|p| p.get("command"))
        .and_then(Value::as_str)
    else {
        return;
    };
    let Some(command) = CheckCommand::by_name(runtime, name) else {
        return;
    };

    checkable.set_check_command_raw(runtime, command.core().name(), Some(origin));
}

pub fn handle_set_check_period(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let what = "check period changed";
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, what) else {
        return;
    };

    let Some(name) = params
        .and_then(|p| p.get("timeperiod"))
        .and_then(Value::as_str)
    else {
        return;
    };
    let Some(period) = TimePeriod::by_name(runtime, name) else {
        return;
    };

    checkable.set_check_period_raw(runtime, period.core().name(), Some(origin));
}

pub fn handle_set_vars(runtime: &Runtime, origin: &Arc<MessageOrigin>, params: Option<&Value>) {
    let what = "vars changed";
    if sender_endpoint(origin, what).is_none() {
        return;
    }
    let Some(params) = params else {
        return;
    };

    let object_name = params
        .get("object")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let object_type = params
        .get("object_type")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if object_name.is_empty() {
        return;
    }

    let object: Option<Arc<dyn ReplicatedObject>> = if object_type.is_empty() {
        // pre-object_type peers: keep the old fallback chain as-is
        runtime
            .object(Host::TYPE, object_name)
            .or_else(|| runtime.object(Service::TYPE, object_name))
            .or_else(|| runtime.object(User::TYPE, object_name))
            .or_else(|| runtime.object(Service::TYPE, object_name))
            .or_else(|| runtime.object(EventCommand::TYPE, object_name))
            .or_else(|| runtime.object(CheckCommand::TYPE, object_name))
            .or_else(|| runtime.object(NotificationCommand::TYPE, object_name))
    } else {
        runtime.object(object_type, object_name)
    };

    let Some(object) = object else {
        return;
    };

    debug!(
        "processing vars for object '{}' of type '{}'",
        object.core().name(),
        object.core().type_name()
    );

    if !authorized(origin, object.as_ref(), what) {
        return;
    }

    let Some(vars) = params.get("vars") else {
        return;
    };
    if !vars.is_object() {
        return;
    }

    set_object_vars(runtime, &object, vars.clone(), Some(origin));
}

pub fn handle_add_comment(runtime: &Runtime, origin: &Arc<MessageOrigin>, params: Option<&Value>) {
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, "comment added")
    else {
        return;
    };

    let Some(body) = params.and_then(|p| p.get("comment")) else {
        return;
    };
    let comment: Comment = match serde_json::from_value(body.clone()) {
        Ok(comment) => comment,
        Err(err) => {
            debug!("discarding malformed comment: {}", err);
            return;
        }
    };

    checkable.add_comment(
        runtime,
        comment.entry_type,
        &comment.author,
        &comment.text,
        comment.expire_time,
        Some(comment.id),
        Some(origin),
    );
}

pub fn handle_remove_comment(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, "comment removed")
    else {
        return;
    };
    let Some(id) = params.and_then(|p| p.get("id")).and_then(Value::as_str) else {
        return;
    };

    checkable.remove_comment(runtime, id, Some(origin));
}

pub fn handle_add_downtime(runtime: &Runtime, origin: &Arc<MessageOrigin>, params: Option<&Value>) {
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, "downtime added")
    else {
        return;
    };

    let Some(body) = params.and_then(|p| p.get("downtime")) else {
        return;
    };
    let downtime: Downtime = match serde_json::from_value(body.clone()) {
        Ok(downtime) => downtime,
        Err(err) => {
            debug!("discarding malformed downtime: {}", err);
            return;
        }
    };

    checkable.add_downtime(
        runtime,
        &downtime.author,
        &downtime.comment,
        downtime.start_time,
        downtime.end_time,
        downtime.fixed,
        downtime.triggered_by.clone(),
        downtime.duration,
        downtime.scheduled_by.clone(),
        Some(downtime.id),
        Some(origin),
    );
}

pub fn handle_remove_downtime(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) = resolve_authorized_checkable(runtime, origin, params, "downtime removed")
    else {
        return;
    };
    let Some(id) = params.and_then(|p| p.get("id")).and_then(Value::as_str) else {
        return;
    };

    checkable.remove_downtime(runtime, id, Some(origin));
}

pub fn handle_set_acknowledgement(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "acknowledgement set")
    else {
        return;
    };
    let Some(params) = params else {
        return;
    };

    let author = params
        .get("author")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let comment = params
        .get("comment")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let ack_type = AcknowledgementType::from_value(
        params.get("acktype").and_then(Value::as_i64).unwrap_or(0),
    );
    let notify = params
        .get("notify")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let expiry = params.get("expiry").and_then(Value::as_f64).unwrap_or(0.0);

    checkable.acknowledge_problem(
        runtime,
        author,
        comment,
        ack_type,
        notify,
        expiry,
        Some(origin),
    );
}

pub fn handle_clear_acknowledgement(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let Some(checkable) =
        resolve_authorized_checkable(runtime, origin, params, "acknowledgement cleared")
    else {
        return;
    };

    checkable.clear_acknowledgement(runtime, Some(origin));
}
