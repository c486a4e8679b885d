//! The remote-command execution protocol: ancestor-only authorization,
//! refusal and failure paths answering with synthetic check results.

use std::sync::Arc;

use serde_json::{json, Value};

use vigil_cluster::{rpc_message, EventDispatcher};
use vigil_shared::{
    CheckCommand, CheckEngine, Endpoint, EventCommand, MessageOrigin, PeerListener,
    ReplicatedObject, Runtime, RuntimeConfig, Zone,
};
use vigil_test::{AccessPolicy, MockCheckEngine, MockListener, StaticEndpoint, StaticZone};

struct Fixture {
    runtime: Arc<Runtime>,
    listener: Arc<MockListener>,
    dispatcher: EventDispatcher,
    origin: Arc<MessageOrigin>,
}

/// A child endpoint ("agent-ep" in zone "agent") receiving commands from its
/// parent zone ("master").
fn fixture(accept_commands: bool) -> Fixture {
    let runtime = Runtime::new(RuntimeConfig {
        accept_commands,
        ..RuntimeConfig::default()
    });

    let master_zone = StaticZone::new("master", None, AccessPolicy::All);
    let agent_zone = StaticZone::new(
        "agent",
        Some(master_zone.clone() as Arc<dyn Zone>),
        AccessPolicy::All,
    );
    let agent_endpoint = StaticEndpoint::new("agent-ep", Some(agent_zone as Arc<dyn Zone>));
    runtime.set_local_endpoint(Some(agent_endpoint as Arc<dyn Endpoint>));

    let listener = MockListener::new();
    runtime.set_peer_listener(Some(listener.clone() as Arc<dyn PeerListener>));

    let master_endpoint = StaticEndpoint::new("master-ep", Some(master_zone.clone() as Arc<dyn Zone>));
    let origin = MessageOrigin::new(
        "master-ep",
        Some(master_endpoint as Arc<dyn Endpoint>),
        Some(master_zone as Arc<dyn Zone>),
    );

    Fixture {
        runtime,
        listener,
        dispatcher: EventDispatcher::new(),
        origin,
    }
}

fn execute_message(command_type: &str) -> Value {
    rpc_message(
        "event::ExecuteCommand",
        json!({
            "host": "h",
            "service": "s",
            "command": "c",
            "command_type": command_type,
            "macros": {"HOSTNAME": "h"}
        }),
    )
}

#[test]
fn refusing_endpoint_answers_with_synthetic_unknown_result() {
    let fx = fixture(false);

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("check_command"));

    let sent = fx.listener.sent();
    assert_eq!(sent.len(), 1);
    let (destination, message) = &sent[0];
    assert_eq!(destination, "master-ep");
    assert_eq!(message["method"], json!("event::CheckResult"));
    assert_eq!(message["params"]["host"], json!("h"));
    assert_eq!(message["params"]["service"], json!("s"));
    assert_eq!(message["params"]["cr"]["state"], json!(3));
    assert_eq!(
        message["params"]["cr"]["output"],
        json!("Endpoint 'agent-ep' does not accept commands.")
    );
}

#[test]
fn unknown_check_command_answers_with_synthetic_unknown_result() {
    let fx = fixture(true);

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("check_command"));

    let sent = fx.listener.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].1["params"]["cr"]["output"],
        json!("Check command 'c' does not exist.")
    );
}

#[test]
fn known_check_command_is_executed_without_a_reply() {
    let fx = fixture(true);
    let command = CheckCommand::new(&fx.runtime.types, "c");
    fx.runtime
        .register_object(command as Arc<dyn ReplicatedObject>)
        .expect("command registers");

    let engine = MockCheckEngine::new();
    fx.runtime
        .set_check_engine(Some(engine.clone() as Arc<dyn CheckEngine>));

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("check_command"));

    assert_eq!(engine.executed(), vec![("h".to_string(), "check")]);
    assert!(fx.listener.sent().is_empty());
}

#[test]
fn check_execution_failure_reports_the_diagnostic() {
    let fx = fixture(true);
    let command = CheckCommand::new(&fx.runtime.types, "c");
    fx.runtime
        .register_object(command as Arc<dyn ReplicatedObject>)
        .expect("command registers");

    let engine = MockCheckEngine::failing("plugin timed out");
    fx.runtime
        .set_check_engine(Some(engine.clone() as Arc<dyn CheckEngine>));

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("check_command"));

    let sent = fx.listener.sent();
    assert_eq!(sent.len(), 1);
    let output = sent[0].1["params"]["cr"]["output"]
        .as_str()
        .expect("output string");
    assert!(output.contains("Exception occurred while checking 'h'"));
    assert!(output.contains("plugin timed out"));
    assert_eq!(sent[0].1["params"]["cr"]["state"], json!(3));
}

#[test]
fn unknown_event_command_is_dropped_without_a_reply() {
    let fx = fixture(true);
    let engine = MockCheckEngine::new();
    fx.runtime
        .set_check_engine(Some(engine.clone() as Arc<dyn CheckEngine>));

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("event_command"));

    assert!(fx.listener.sent().is_empty());
    assert!(engine.executed().is_empty());
}

#[test]
fn known_event_command_runs_the_event_handler() {
    let fx = fixture(true);
    let command = EventCommand::new(&fx.runtime.types, "c");
    fx.runtime
        .register_object(command as Arc<dyn ReplicatedObject>)
        .expect("command registers");

    let engine = MockCheckEngine::new();
    fx.runtime
        .set_check_engine(Some(engine.clone() as Arc<dyn CheckEngine>));

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("event_command"));

    assert_eq!(engine.executed(), vec![("h".to_string(), "event")]);
}

#[test]
fn non_ancestor_zones_may_not_command_this_endpoint() {
    let fx = fixture(true);
    let command = CheckCommand::new(&fx.runtime.types, "c");
    fx.runtime
        .register_object(command as Arc<dyn ReplicatedObject>)
        .expect("command registers");
    let engine = MockCheckEngine::new();
    fx.runtime
        .set_check_engine(Some(engine.clone() as Arc<dyn CheckEngine>));

    // a sibling zone, not an ancestor of "agent"
    let sibling_zone = StaticZone::new("sibling", None, AccessPolicy::All);
    let sibling_endpoint =
        StaticEndpoint::new("sibling-ep", Some(sibling_zone.clone() as Arc<dyn Zone>));
    let origin = MessageOrigin::new(
        "sibling-ep",
        Some(sibling_endpoint as Arc<dyn Endpoint>),
        Some(sibling_zone as Arc<dyn Zone>),
    );

    fx.dispatcher
        .dispatch(&fx.runtime, &origin, &execute_message("check_command"));

    assert!(engine.executed().is_empty());
    assert!(fx.listener.sent().is_empty());
}

#[test]
fn commands_without_trusted_endpoint_are_discarded() {
    let fx = fixture(true);
    let origin = MessageOrigin::new("anonymous", None, None);

    fx.dispatcher
        .dispatch(&fx.runtime, &origin, &execute_message("check_command"));

    assert!(fx.listener.sent().is_empty());
}

#[test]
fn unknown_command_type_is_ignored() {
    let fx = fixture(true);

    fx.dispatcher
        .dispatch(&fx.runtime, &fx.origin, &execute_message("notification_command"));

    assert!(fx.listener.sent().is_empty());
}
