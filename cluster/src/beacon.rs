use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;
use serde_json::{json, Map, Value};

use vigil_shared::{current_time, Host, RelayScope, ReplicatedObject, Runtime};

use crate::relay::messages::rpc_message;

/// Cadence of the repository beacon.
pub const REPOSITORY_INTERVAL: Duration = Duration::from_secs(30);

const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Periodically advertises the local endpoint's host/service inventory to
/// its parent zone via `event::UpdateRepository`. Best-effort: beacon
/// messages skip the replay log.
pub struct RepositoryBeacon {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RepositoryBeacon {
    /// One beacon tick. Public so tests and embedders can publish
    /// deterministically.
    pub fn publish(runtime: &Runtime) {
        let Some(listener) = runtime.peer_listener() else {
            return;
        };

        let Some(endpoint) = runtime.local_endpoint() else {
            warn!("no local endpoint defined, skipping repository update");
            return;
        };
        let Some(zone) = endpoint.zone() else {
            return;
        };

        let mut repository = Map::new();
        if let Some(descriptor) = runtime.types.type_by_name(Host::TYPE) {
            for object in descriptor.objects() {
                let Ok(host) = object.as_any_arc().downcast::<Host>() else {
                    continue;
                };
                let services: Vec<String> = host
                    .services()
                    .iter()
                    .map(|service| service.short_name())
                    .collect();
                repository.insert(host.core().name().to_string(), json!(services));
            }
        }

        let mut params = Map::new();
        params.insert("seen".to_string(), json!(current_time()));
        params.insert("endpoint".to_string(), json!(endpoint.name()));
        params.insert("zone".to_string(), json!(zone.name()));
        if let Some(parent) = zone.parent() {
            params.insert("parent_zone".to_string(), json!(parent.name()));
        }
        params.insert("repository".to_string(), Value::Object(repository));

        let message = rpc_message("event::UpdateRepository", Value::Object(params));
        listener.relay_message(None, RelayScope::Zone(zone), message, false);
    }

    /// Spawns the beacon thread: one immediate publish, then one per
    /// interval until stopped.
    pub fn spawn(runtime: Arc<Runtime>) -> RepositoryBeacon {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("repository-beacon".to_string())
            .spawn(move || loop {
                Self::publish(&runtime);

                let mut slept = Duration::ZERO;
                while slept < REPOSITORY_INTERVAL {
                    if flag.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(SHUTDOWN_POLL);
                    slept += SHUTDOWN_POLL;
                }
            })
            .expect("failed to spawn repository beacon thread");

        RepositoryBeacon {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RepositoryBeacon {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
