use std::sync::Arc;

use log::{error, warn};
use serde_json::{json, Value};

use vigil_shared::{
    checkable_fid, current_time, CheckCommand, CheckResult, Checkable, EventCommand, Host,
    MessageOrigin, ReplicatedObject, Runtime, ServiceState,
};

use crate::relay::messages::make_check_result_message;

/// Builds the transient host object a remote command executes against. It is
/// never registered; the requested identity and delegation metadata ride on
/// its fields and extensions.
fn make_virtual_host(runtime: &Runtime, params: &Value) -> Option<Arc<Host>> {
    let name = params.get("host").and_then(Value::as_str)?;
    let host = Host::new(&runtime.types, name);

    if let Some(service) = params.get("service").and_then(Value::as_str) {
        host.core()
            .set_extension("agent_service_name", json!(service));
    }

    Some(host)
}

fn send_synthetic_result(
    runtime: &Runtime,
    source_endpoint: &Arc<dyn vigil_shared::Endpoint>,
    host: &Arc<Host>,
    output: String,
) {
    let Some(listener) = runtime.peer_listener() else {
        return;
    };

    let mut result = CheckResult::new(ServiceState::Unknown, output);
    let now = current_time();
    result.schedule_start = now;
    result.schedule_end = now;
    result.execution_start = now;
    result.execution_end = now;

    let checkable = Checkable::Host(Arc::clone(host));
    let message = make_check_result_message(&checkable, &result);
    listener.sync_send_message(source_endpoint, message);
}

/// Inbound `event::ExecuteCommand`: a parent endpoint asks this one to run a
/// check or event handler and report back.
///
/// Authorization is stricter than for replication events: the sending zone
/// must be an ancestor of the local zone. Refusals, unknown commands and
/// execution failures all answer with a synthetic `Unknown` check result
/// delivered point-to-point.
pub fn handle_execute_command(
    runtime: &Runtime,
    origin: &Arc<MessageOrigin>,
    params: Option<&Value>,
) {
    let source_endpoint = match &origin.endpoint {
        Some(endpoint) => Arc::clone(endpoint),
        None => {
            warn!(
                "discarding 'execute command' message from '{}': invalid endpoint origin (client not allowed)",
                origin.client_identity
            );
            return;
        }
    };

    if let Some(sender_zone) = &origin.zone {
        let allowed = runtime
            .local_zone()
            .map(|local| local.is_child_of(sender_zone.as_ref()))
            .unwrap_or(false);
        if !allowed {
            warn!(
                "discarding 'execute command' message from '{}': invalid endpoint origin (client not allowed)",
                origin.client_identity
            );
            return;
        }
    }

    if runtime.peer_listener().is_none() {
        error!("no peer listener available");
        return;
    }

    let Some(params) = params else {
        return;
    };
    let Some(host) = make_virtual_host(runtime, params) else {
        return;
    };

    if !runtime.config.accept_commands {
        let endpoint_name = runtime
            .local_endpoint()
            .map(|endpoint| endpoint.name().to_string())
            .unwrap_or_default();
        warn!(
            "ignoring command, endpoint '{}' does not accept commands",
            endpoint_name
        );

        send_synthetic_result(
            runtime,
            &source_endpoint,
            &host,
            format!("Endpoint '{}' does not accept commands.", endpoint_name),
        );
        return;
    }

    let command = params
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let command_type = params
        .get("command_type")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match command_type {
        "check_command" => {
            if CheckCommand::by_name(runtime, command).is_none() {
                send_synthetic_result(
                    runtime,
                    &source_endpoint,
                    &host,
                    format!("Check command '{}' does not exist.", command),
                );
                return;
            }
            host.core()
                .set_field(checkable_fid::CHECK_COMMAND, json!(command));
        }
        "event_command" => {
            if EventCommand::by_name(runtime, command).is_none() {
                warn!("event command '{}' does not exist", command);
                return;
            }
            host.core()
                .set_field(checkable_fid::EVENT_COMMAND, json!(command));
        }
        _ => return,
    }

    host.core().set_field(
        checkable_fid::COMMAND_ENDPOINT,
        json!(source_endpoint.name()),
    );
    host.core().set_extension("agent_check", json!(true));

    let macros = params.get("macros");

    let Some(engine) = runtime.check_engine() else {
        send_synthetic_result(
            runtime,
            &source_endpoint,
            &host,
            "No check engine is available on this endpoint.".to_string(),
        );
        return;
    };

    match command_type {
        "check_command" => {
            if let Err(err) = engine.execute_remote_check(runtime, &host, macros) {
                let output = format!(
                    "Exception occurred while checking '{}': {}",
                    host.core().name(),
                    err
                );
                error!("{}", output);
                send_synthetic_result(runtime, &source_endpoint, &host, output);
            }
        }
        "event_command" => {
            if let Err(err) = engine.execute_event_handler(runtime, &host, macros, true) {
                warn!(
                    "event handler for '{}' failed: {}",
                    host.core().name(),
                    err
                );
            }
        }
        _ => {}
    }
}
