//! Creating and deleting declarative objects through the object-config
//! service and its HTTP-shaped handler.

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use vigil_cluster::configgen::object_config_path;
use vigil_cluster::{delete_object, handle_create_object};
use vigil_shared::{Host, ReplicatedObject, Runtime};
use vigil_test::{test_runtime_at, MockCompiler, MockItems};

fn create_h2(runtime: &Runtime, compiler: &MockCompiler, items: &MockItems) -> (u16, serde_json::Value) {
    handle_create_object(
        runtime,
        compiler,
        items,
        "hosts",
        "h2",
        &json!({"attrs": {"address": "1.2.3.4"}}),
    )
    .expect("hosts is a known plural")
}

#[test]
fn create_object_stages_compiles_and_activates() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::new();
    let items = MockItems::passing();

    let (code, body) = create_h2(&runtime, &compiler, &items);

    assert_eq!(code, 200);
    assert_eq!(body["results"][0]["code"], json!(200));
    assert_eq!(body["results"][0]["status"], json!("Object was created."));
    assert!(body["results"][0].get("errors").is_none());

    // the staged config file exists and carries the rendered definition
    let descriptor = runtime.types.type_by_name("Host").expect("host type");
    let path = object_config_path(&runtime.config, &descriptor, "h2").expect("config path");
    let content = fs::read_to_string(&path).expect("staged file");
    assert!(content.starts_with("object Host \"h2\" {"));
    assert!(content.contains("\taddress = \"1.2.3.4\"\n"));

    // the object is live
    let host = Host::by_name(&runtime, "h2").expect("host registered");
    assert!(host.core().is_active());
    assert_eq!(host.core().module(), "_api");
}

#[test]
fn delete_object_removes_file_and_registration() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::new();
    let items = MockItems::passing();
    create_h2(&runtime, &compiler, &items);

    let descriptor = runtime.types.type_by_name("Host").expect("host type");
    let path = object_config_path(&runtime.config, &descriptor, "h2").expect("config path");
    assert!(path.exists());

    let object = runtime.object("Host", "h2").expect("object present");
    let mut errors = Vec::new();
    let deleted = delete_object(&runtime, &items, &object, &mut errors).expect("delete runs");

    assert!(deleted);
    assert!(errors.is_empty());
    assert!(!path.exists());
    assert!(runtime.object("Host", "h2").is_none());
    assert!(!object.core().is_active());
}

#[test]
fn delete_refuses_objects_from_other_modules() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let items = MockItems::passing();

    let host = Host::new(&runtime.types, "h3");
    runtime
        .register_object(host.clone() as Arc<dyn ReplicatedObject>)
        .expect("host registers");
    host.activate();

    let object = runtime.object("Host", "h3").expect("object present");
    let mut errors = Vec::new();
    let deleted = delete_object(&runtime, &items, &object, &mut errors).expect("delete runs");

    assert!(!deleted);
    assert_eq!(
        errors,
        vec!["Object cannot be deleted because it was not created using the API.".to_string()]
    );
    // the refusal leaves the object untouched
    assert!(runtime.object("Host", "h3").is_some());
    assert!(host.core().is_active());
}

#[test]
fn evaluation_failures_are_collected_into_the_response() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::failing_evaluate("no such template");
    let items = MockItems::passing();

    let (code, body) = create_h2(&runtime, &compiler, &items);

    assert_eq!(code, 500);
    assert_eq!(
        body["results"][0]["status"],
        json!("Object could not be created.")
    );
    let errors = body["results"][0]["errors"]
        .as_array()
        .expect("errors present");
    assert!(errors[0].as_str().expect("string").contains("no such template"));
    assert!(runtime.object("Host", "h2").is_none());
}

#[test]
fn compile_failures_are_collected_into_the_response() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::failing_compile("syntax error");
    let items = MockItems::passing();

    let (code, body) = create_h2(&runtime, &compiler, &items);

    assert_eq!(code, 500);
    let errors = body["results"][0]["errors"]
        .as_array()
        .expect("errors present");
    assert!(errors[0].as_str().expect("string").contains("syntax error"));
}

#[test]
fn commit_failures_surface_the_queued_diagnostics() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::new();
    let items = MockItems::failing_commit(vec!["conflicting object".to_string()]);

    let (code, body) = handle_create_object(
        &runtime,
        &compiler,
        &items,
        "hosts",
        "h9",
        &json!({}),
    )
    .expect("hosts is a known plural");

    assert_eq!(code, 500);
    assert_eq!(
        body["results"][0]["errors"],
        json!(["conflicting object"])
    );
}

#[test]
fn unknown_plural_falls_through() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());
    let compiler = MockCompiler::new();
    let items = MockItems::passing();

    let response = handle_create_object(&runtime, &compiler, &items, "widgets", "w1", &json!({}));
    assert!(response.is_none());
}

#[test]
fn composite_names_are_decomposed_into_attributes() {
    let dir = TempDir::new().expect("temp dir");
    let runtime = test_runtime_at(dir.path());

    let descriptor = runtime.types.type_by_name("Service").expect("service type");
    let config = vigil_cluster::create_object_config(
        &descriptor,
        "h1!disk",
        &[],
        &serde_json::Map::new(),
    )
    .expect("config renders");

    assert!(config.starts_with("object Service \"disk\" {"));
    assert!(config.contains("\thost_name = \"h1\"\n"));
}
