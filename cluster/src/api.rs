use serde_json::{json, Map, Value};

use vigil_shared::Runtime;

use crate::configgen::compiler::{ConfigCompiler, ConfigItems};
use crate::configgen::service::create_object;

/// Transport-free `PUT /v1/<typePlural>/<fullName>` handler.
///
/// The HTTP layer parses the request and passes the plural type segment,
/// the full object name and the decoded JSON body
/// (`{templates?: [string], attrs?: object}`). Returns `None` when the
/// plural does not name a known type, so the router can fall through;
/// otherwise the status code and the `{results: [...]}` body.
pub fn handle_create_object(
    runtime: &Runtime,
    compiler: &dyn ConfigCompiler,
    items: &dyn ConfigItems,
    type_plural: &str,
    full_name: &str,
    body: &Value,
) -> Option<(u16, Value)> {
    let descriptor = runtime.types.type_by_plural(type_plural)?;

    let templates: Vec<String> = body
        .get("templates")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let attrs: Map<String, Value> = body
        .get("attrs")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut errors = Vec::new();
    let created = create_object(
        runtime,
        compiler,
        items,
        &descriptor,
        full_name,
        &templates,
        &attrs,
        &mut errors,
    );

    let (code, status) = if created {
        (200, "Object was created.")
    } else {
        (500, "Object could not be created.")
    };

    let mut result = Map::new();
    result.insert("code".to_string(), json!(code));
    result.insert("status".to_string(), json!(status));
    if !created {
        result.insert("errors".to_string(), json!(errors));
    }

    Some((code, json!({ "results": [result] })))
}
