//! End-to-end replication behavior: authorization, application and echo
//! suppression between the outbound relay and the inbound dispatcher.

use std::sync::Arc;

use serde_json::{json, Value};

use vigil_cluster::{rpc_message, EventDispatcher, EventRelay};
use vigil_shared::{
    checkable_fid, set_object_vars, Checkable, Endpoint, Host, MessageOrigin, Notification,
    PeerListener, ReplicatedObject, Runtime, ServiceState, Service, Zone,
};
use vigil_test::{test_runtime, AccessPolicy, MockListener, StaticEndpoint, StaticZone};

fn setup() -> (Arc<Runtime>, Arc<MockListener>, EventDispatcher) {
    let runtime = test_runtime();
    let listener = MockListener::new();
    runtime.set_peer_listener(Some(listener.clone() as Arc<dyn PeerListener>));
    EventRelay::subscribe(&runtime);
    (runtime, listener, EventDispatcher::new())
}

fn registered_host(runtime: &Runtime, name: &str) -> Arc<Host> {
    let host = Host::new(&runtime.types, name);
    runtime
        .register_object(host.clone() as Arc<dyn ReplicatedObject>)
        .expect("host registers");
    host
}

fn origin_from(endpoint_name: &str, policy: AccessPolicy) -> Arc<MessageOrigin> {
    let zone = StaticZone::new("sender-zone", None, policy);
    let endpoint = StaticEndpoint::new(endpoint_name, Some(zone.clone() as Arc<dyn Zone>));
    MessageOrigin::new(
        endpoint_name,
        Some(endpoint as Arc<dyn Endpoint>),
        Some(zone as Arc<dyn Zone>),
    )
}

#[test]
fn unauthorized_relay_is_discarded() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    let message = rpc_message(
        "event::SetCheckInterval",
        json!({"host": "h1", "interval": 60.0}),
    );
    let origin = origin_from("e1", AccessPolicy::Nothing);
    dispatcher.dispatch(&runtime, &origin, &message);

    assert_eq!(Checkable::Host(host).check_interval(), 0.0);
    assert!(listener.relayed().is_empty());
}

#[test]
fn authorized_relay_applies_without_echo() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    let message = rpc_message(
        "event::SetCheckInterval",
        json!({"host": "h1", "interval": 60.0}),
    );
    let origin = origin_from("e1", AccessPolicy::All);
    dispatcher.dispatch(&runtime, &origin, &message);

    assert_eq!(Checkable::Host(host).check_interval(), 60.0);
    // applying a replicated mutation must not schedule another relay
    assert!(listener.relayed_methods().is_empty());
}

#[test]
fn local_mutation_is_relayed_scoped_to_the_object() {
    let (runtime, listener, _dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    Checkable::Host(host).set_check_interval(&runtime, 120.0, None);

    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::SetCheckInterval");
    assert_eq!(relayed[0].scope, "object:h1");
    assert!(relayed[0].logged);
    assert!(relayed[0].origin_identity.is_none());
    assert_eq!(
        relayed[0].message["params"],
        json!({"host": "h1", "interval": 120.0})
    );
}

#[test]
fn service_events_carry_host_and_short_name() {
    let (runtime, listener, _dispatcher) = setup();
    registered_host(&runtime, "h1");
    let service = Service::new(&runtime.types, "h1", "disk");
    runtime
        .register_object(service.clone() as Arc<dyn ReplicatedObject>)
        .expect("service registers");

    Checkable::Service(service).set_enable_active_checks(&runtime, false, None);

    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::SetEnableActiveChecks");
    assert_eq!(
        relayed[0].message["params"],
        json!({"host": "h1", "service": "disk", "enabled": false})
    );
}

#[test]
fn inbound_service_event_resolves_by_short_name() {
    let (runtime, _listener, dispatcher) = setup();
    registered_host(&runtime, "h1");
    let service = Service::new(&runtime.types, "h1", "disk");
    runtime
        .register_object(service.clone() as Arc<dyn ReplicatedObject>)
        .expect("service registers");

    let message = rpc_message(
        "event::SetMaxCheckAttempts",
        json!({"host": "h1", "service": "disk", "attempts": 5}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert_eq!(Checkable::Service(service).max_check_attempts(), 5);
}

#[test]
fn delegated_check_result_bypasses_zone_access_and_relays_onward() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");
    host.core()
        .set_field(checkable_fid::COMMAND_ENDPOINT, json!("agent1"));

    let message = rpc_message(
        "event::CheckResult",
        json!({
            "host": "h1",
            "cr": {
                "state": 2,
                "output": "critical load",
                "performance_data": [
                    {"label": "load", "value": 1.5},
                    "raw=1"
                ]
            }
        }),
    );
    // the agent's zone cannot access the host, but it is the command
    // endpoint answering a delegated check
    let origin = origin_from("agent1", AccessPolicy::Nothing);
    dispatcher.dispatch(&runtime, &origin, &message);

    let checkable = Checkable::Host(host);
    let result = checkable.last_check_result().expect("result applied");
    assert_eq!(result.state, ServiceState::Critical);
    assert_eq!(result.output, "critical load");
    assert_eq!(result.performance_data.len(), 2);
    assert_eq!(result.performance_data[0]["label"], json!("load"));
    assert_eq!(result.performance_data[1], json!("raw=1"));

    // processed as a local result, so it travels onward
    assert_eq!(listener.relayed_methods(), vec!["event::CheckResult"]);
}

#[test]
fn replicated_check_result_is_not_relayed_again() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    let message = rpc_message(
        "event::CheckResult",
        json!({"host": "h1", "cr": {"state": 0, "output": "fine"}}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert!(Checkable::Host(host).last_check_result().is_some());
    assert!(listener.relayed_methods().is_empty());
}

#[test]
fn messages_without_trusted_endpoint_are_discarded() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    let origin = MessageOrigin::new("anonymous", None, None);
    let message = rpc_message(
        "event::SetCheckInterval",
        json!({"host": "h1", "interval": 60.0}),
    );
    dispatcher.dispatch(&runtime, &origin, &message);

    assert_eq!(Checkable::Host(host).check_interval(), 0.0);
    assert!(listener.relayed().is_empty());
}

#[test]
fn unknown_targets_are_dropped_silently() {
    let (runtime, listener, dispatcher) = setup();

    let message = rpc_message(
        "event::SetCheckInterval",
        json!({"host": "missing", "interval": 60.0}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert!(listener.relayed().is_empty());
}

#[test]
fn comments_replicate_in_both_directions() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");
    let checkable = Checkable::Host(host);

    // local comment goes out
    checkable.add_comment(&runtime, 1, "admin", "looking into it", 0.0, None, None);
    assert_eq!(listener.relayed_methods(), vec!["event::AddComment"]);
    let body = listener.relayed()[0].message["params"]["comment"].clone();
    assert_eq!(body["author"], json!("admin"));
    listener.clear();

    // replicated comment comes in without echo
    let message = rpc_message(
        "event::AddComment",
        json!({
            "host": "h1",
            "comment": {
                "id": "peer-1",
                "entry_type": 1,
                "author": "operator",
                "text": "ack pending",
                "expire_time": 0.0
            }
        }),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    let comments = checkable.comments();
    assert!(comments.iter().any(|comment| comment.id == "peer-1"));
    assert!(listener.relayed().is_empty());

    // removal replicates too
    let message = rpc_message("event::RemoveComment", json!({"host": "h1", "id": "peer-1"}));
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);
    assert!(!checkable
        .comments()
        .iter()
        .any(|comment| comment.id == "peer-1"));
    assert!(listener.relayed().is_empty());
}

#[test]
fn downtimes_replicate_in_both_directions() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");
    let checkable = Checkable::Host(host);

    let id = checkable.add_downtime(
        &runtime,
        "admin",
        "maintenance",
        100.0,
        200.0,
        true,
        None,
        0.0,
        None,
        None,
        None,
    );
    assert_eq!(listener.relayed_methods(), vec!["event::AddDowntime"]);
    listener.clear();

    let message = rpc_message("event::RemoveDowntime", json!({"host": "h1", "id": id}));
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert!(checkable.downtimes().is_empty());
    assert!(listener.relayed().is_empty());
}

#[test]
fn acknowledgements_replicate_without_echo() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");
    let checkable = Checkable::Host(host);

    let message = rpc_message(
        "event::SetAcknowledgement",
        json!({
            "host": "h1",
            "author": "admin",
            "comment": "known",
            "acktype": 2,
            "notify": false,
            "expiry": 0.0
        }),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert_eq!(
        checkable.acknowledgement(),
        vigil_shared::AcknowledgementType::Sticky
    );
    assert!(listener.relayed().is_empty());

    let message = rpc_message("event::ClearAcknowledgement", json!({"host": "h1"}));
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);
    assert_eq!(
        checkable.acknowledgement(),
        vigil_shared::AcknowledgementType::None
    );
    assert!(listener.relayed().is_empty());
}

#[test]
fn vars_replicate_with_polymorphic_resolution() {
    let (runtime, listener, dispatcher) = setup();
    let host = registered_host(&runtime, "h1");

    // local change announces object and type
    let object = host.clone() as Arc<dyn ReplicatedObject>;
    set_object_vars(&runtime, &object, json!({"os": "linux"}), None);

    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::SetVars");
    assert_eq!(relayed[0].message["params"]["object"], json!("h1"));
    assert_eq!(relayed[0].message["params"]["object_type"], json!("Host"));
    listener.clear();

    // typed resolution
    let message = rpc_message(
        "event::SetVars",
        json!({"object": "h1", "object_type": "Host", "vars": {"os": "bsd"}}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);
    assert_eq!(Checkable::Host(host.clone()).vars().get("os"), Some(&json!("bsd")));
    assert!(listener.relayed().is_empty());

    // legacy resolution without object_type falls back through known types
    let message = rpc_message(
        "event::SetVars",
        json!({"object": "h1", "vars": {"os": "illumos"}}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);
    assert_eq!(
        Checkable::Host(host).vars().get("os"),
        Some(&json!("illumos"))
    );
}

#[test]
fn notification_schedule_replicates() {
    let (runtime, listener, dispatcher) = setup();
    let notification = Notification::new(&runtime.types, "h1!ping");
    runtime
        .register_object(notification.clone() as Arc<dyn ReplicatedObject>)
        .expect("notification registers");

    notification.set_next_notification(&runtime, 500.0, None);
    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::SetNextNotification");
    assert_eq!(
        relayed[0].message["params"],
        json!({"notification": "h1!ping", "next_notification": 500.0})
    );
    listener.clear();

    let message = rpc_message(
        "event::SetNextNotification",
        json!({"notification": "h1!ping", "next_notification": 900.0}),
    );
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert_eq!(notification.next_notification(), 900.0);
    assert!(listener.relayed().is_empty());
}

#[test]
fn standalone_mode_swallows_local_changes() {
    let runtime = test_runtime();
    EventRelay::subscribe(&runtime);
    let host = registered_host(&runtime, "h1");

    // no peer listener configured; the relay must be a silent no-op
    Checkable::Host(host.clone()).set_check_interval(&runtime, 30.0, None);
    assert_eq!(Checkable::Host(host).check_interval(), 30.0);
}

#[test]
fn messages_without_params_are_ignored() {
    let (runtime, listener, dispatcher) = setup();
    registered_host(&runtime, "h1");

    let message: Value = json!({"jsonrpc": "2.0", "method": "event::SetCheckInterval"});
    dispatcher.dispatch(&runtime, &origin_from("e1", AccessPolicy::All), &message);

    assert!(listener.relayed().is_empty());
}
