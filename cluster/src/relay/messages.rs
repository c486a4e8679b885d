use serde_json::{json, Map, Value};

use vigil_shared::{CheckResult, Checkable};

/// Wraps params into a JSON-RPC 2.0 event envelope.
pub fn rpc_message(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    })
}

/// The `host` / optional `service` identity every checkable event carries.
pub fn checkable_params(checkable: &Checkable) -> Map<String, Value> {
    let (host, service) = checkable.host_identity();

    let mut params = Map::new();
    params.insert("host".to_string(), json!(host));
    if let Some(service) = service {
        params.insert("service".to_string(), json!(service));
    }
    params
}

/// Builds the `event::CheckResult` message for a checkable.
///
/// A host standing in for an agent-checked service carries the service's
/// short name in the `agent_service_name` extension; it is used when no real
/// service identity exists.
pub fn make_check_result_message(checkable: &Checkable, result: &CheckResult) -> Value {
    let (host, service) = checkable.host_identity();

    let mut params = Map::new();
    params.insert("host".to_string(), json!(host));

    match service {
        Some(service) => {
            params.insert("service".to_string(), json!(service));
        }
        None => {
            if let Some(agent_service) = checkable.core().extension("agent_service_name") {
                if !agent_service.is_null() {
                    params.insert("service".to_string(), agent_service);
                }
            }
        }
    }

    params.insert(
        "cr".to_string(),
        serde_json::to_value(result).unwrap_or(Value::Null),
    );

    rpc_message("event::CheckResult", Value::Object(params))
}
