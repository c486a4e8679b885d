//! The repository beacon and the inbound repository persistence path.

use std::fs;
use std::sync::Arc;

use serde_json::{json, Value};

use vigil_cluster::{repository_file, rpc_message, EventDispatcher, RepositoryBeacon};
use vigil_shared::{
    Endpoint, Host, MessageOrigin, PeerListener, ReplicatedObject, Runtime, Service, Zone,
};
use vigil_test::{test_runtime_at, AccessPolicy, MockListener, StaticEndpoint, StaticZone};

fn wired_runtime(dir: &tempfile::TempDir, parent: bool) -> (Arc<Runtime>, Arc<MockListener>) {
    let runtime = test_runtime_at(dir.path());

    let parent_zone = parent.then(|| StaticZone::new("master", None, AccessPolicy::All));
    let zone = StaticZone::new(
        "agent",
        parent_zone.map(|zone| zone as Arc<dyn Zone>),
        AccessPolicy::All,
    );
    let endpoint = StaticEndpoint::new("agent-ep", Some(zone as Arc<dyn Zone>));
    runtime.set_local_endpoint(Some(endpoint as Arc<dyn Endpoint>));

    let listener = MockListener::new();
    runtime.set_peer_listener(Some(listener.clone() as Arc<dyn PeerListener>));

    (runtime, listener)
}

#[test]
fn beacon_publishes_the_local_inventory() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let (runtime, listener) = wired_runtime(&dir, true);

    let host = Host::new(&runtime.types, "h1");
    runtime
        .register_object(host as Arc<dyn ReplicatedObject>)
        .expect("host registers");
    let service = Service::new(&runtime.types, "h1", "disk");
    runtime
        .register_object(service as Arc<dyn ReplicatedObject>)
        .expect("service registers");

    RepositoryBeacon::publish(&runtime);

    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::UpdateRepository");
    assert_eq!(relayed[0].scope, "zone:agent");
    // best-effort: the beacon skips the replay log
    assert!(!relayed[0].logged);

    let params = &relayed[0].message["params"];
    assert_eq!(params["endpoint"], json!("agent-ep"));
    assert_eq!(params["zone"], json!("agent"));
    assert_eq!(params["parent_zone"], json!("master"));
    assert_eq!(params["repository"], json!({"h1": ["disk"]}));
    assert!(params["seen"].as_f64().expect("seen timestamp") > 0.0);
}

#[test]
fn beacon_omits_parent_zone_at_the_tree_root() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let (runtime, listener) = wired_runtime(&dir, false);

    RepositoryBeacon::publish(&runtime);

    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert!(relayed[0].message["params"].get("parent_zone").is_none());
}

#[test]
fn beacon_without_local_endpoint_skips_the_tick() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let listener = MockListener::new();
    runtime.set_peer_listener(Some(listener.clone() as Arc<dyn PeerListener>));

    RepositoryBeacon::publish(&runtime);

    assert!(listener.relayed().is_empty());
}

#[test]
fn received_repository_is_persisted_and_rerelayed() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let (runtime, listener) = wired_runtime(&dir, true);
    let dispatcher = EventDispatcher::new();

    let params = json!({
        "seen": 123.0,
        "endpoint": "remote-ep",
        "zone": "child",
        "repository": {"rh": ["rs"]}
    });
    let message = rpc_message("event::UpdateRepository", params.clone());

    let origin = MessageOrigin::new("remote-ep", None, None);
    dispatcher.dispatch(&runtime, &origin, &message);

    let path = repository_file(&runtime.config, "remote-ep");
    let stored: Value =
        serde_json::from_slice(&fs::read(&path).expect("repository file")).expect("valid json");
    assert_eq!(stored, params);

    // siblings observe the update through a local-zone re-relay
    let relayed = listener.relayed();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].method, "event::UpdateRepository");
    assert_eq!(relayed[0].scope, "zone:agent");
    assert!(relayed[0].logged);
    assert_eq!(relayed[0].origin_identity.as_deref(), Some("remote-ep"));
}

#[test]
fn repository_messages_without_inventory_are_ignored() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let (runtime, listener) = wired_runtime(&dir, true);
    let dispatcher = EventDispatcher::new();

    let message = rpc_message(
        "event::UpdateRepository",
        json!({"endpoint": "remote-ep", "repository": "not a map"}),
    );
    let origin = MessageOrigin::new("remote-ep", None, None);
    dispatcher.dispatch(&runtime, &origin, &message);

    assert!(listener.relayed().is_empty());
    assert!(!repository_file(&runtime.config, "remote-ep").exists());
}

#[test]
fn repository_files_are_keyed_by_endpoint_digest() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let (runtime, _listener) = wired_runtime(&dir, true);

    let first = repository_file(&runtime.config, "ep-a");
    let second = repository_file(&runtime.config, "ep-b");

    assert_ne!(first, second);
    assert!(first
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name")
        .ends_with(".repo"));
    // sha256 hex digest plus extension
    assert_eq!(
        first.file_name().and_then(|name| name.to_str()).expect("file name").len(),
        64 + ".repo".len()
    );
}
