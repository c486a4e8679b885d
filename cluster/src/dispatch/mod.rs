use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use vigil_shared::{MessageOrigin, Runtime};

pub mod command;
pub mod handlers;
pub mod repository;

/// An inbound event handler. Handlers never answer; protocol errors are
/// logged and the message is dropped.
pub type ApiHandler = fn(&Runtime, &Arc<MessageOrigin>, Option<&Value>);

/// The inbound half of event replication: a table keyed on JSON-RPC method
/// name, demultiplexing received messages to their handlers.
pub struct EventDispatcher {
    handlers: HashMap<&'static str, ApiHandler>,
}

impl EventDispatcher {
    /// Builds a dispatcher with every `event::<Name>` handler registered.
    pub fn new() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
        };

        dispatcher.register("event::CheckResult", handlers::handle_check_result);
        dispatcher.register("event::SetNextCheck", handlers::handle_set_next_check);
        dispatcher.register(
            "event::SetNextNotification",
            handlers::handle_set_next_notification,
        );
        dispatcher.register(
            "event::SetForceNextCheck",
            handlers::handle_set_force_next_check,
        );
        dispatcher.register(
            "event::SetForceNextNotification",
            handlers::handle_set_force_next_notification,
        );
        dispatcher.register(
            "event::SetEnableActiveChecks",
            handlers::handle_set_enable_active_checks,
        );
        dispatcher.register(
            "event::SetEnablePassiveChecks",
            handlers::handle_set_enable_passive_checks,
        );
        dispatcher.register(
            "event::SetEnableNotifications",
            handlers::handle_set_enable_notifications,
        );
        dispatcher.register(
            "event::SetEnableFlapping",
            handlers::handle_set_enable_flapping,
        );
        dispatcher.register(
            "event::SetEnableEventHandler",
            handlers::handle_set_enable_event_handler,
        );
        dispatcher.register(
            "event::SetEnablePerfdata",
            handlers::handle_set_enable_perfdata,
        );
        dispatcher.register("event::SetCheckInterval", handlers::handle_set_check_interval);
        dispatcher.register("event::SetRetryInterval", handlers::handle_set_retry_interval);
        dispatcher.register(
            "event::SetMaxCheckAttempts",
            handlers::handle_set_max_check_attempts,
        );
        dispatcher.register("event::SetEventCommand", handlers::handle_set_event_command);
        dispatcher.register("event::SetCheckCommand", handlers::handle_set_check_command);
        dispatcher.register("event::SetCheckPeriod", handlers::handle_set_check_period);
        dispatcher.register("event::SetVars", handlers::handle_set_vars);
        dispatcher.register("event::AddComment", handlers::handle_add_comment);
        dispatcher.register("event::RemoveComment", handlers::handle_remove_comment);
        dispatcher.register("event::AddDowntime", handlers::handle_add_downtime);
        dispatcher.register("event::RemoveDowntime", handlers::handle_remove_downtime);
        dispatcher.register(
            "event::SetAcknowledgement",
            handlers::handle_set_acknowledgement,
        );
        dispatcher.register(
            "event::ClearAcknowledgement",
            handlers::handle_clear_acknowledgement,
        );
        dispatcher.register(
            "event::UpdateRepository",
            repository::handle_update_repository,
        );
        dispatcher.register("event::ExecuteCommand", command::handle_execute_command);

        dispatcher
    }

    pub fn register(&mut self, method: &'static str, handler: ApiHandler) {
        self.handlers.insert(method, handler);
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Demultiplexes one received message by method name.
    pub fn dispatch(&self, runtime: &Runtime, origin: &Arc<MessageOrigin>, message: &Value) {
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            debug!(
                "discarding message without method from '{}'",
                origin.client_identity
            );
            return;
        };

        let Some(handler) = self.handlers.get(method) else {
            debug!("no handler for method '{}'", method);
            return;
        };

        handler(runtime, origin, message.get("params"));
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
