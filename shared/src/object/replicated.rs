use std::any::Any;
use std::sync::Arc;

use super::core::ObjectCore;

/// Behavior shared by every replicated entity.
///
/// Concrete types embed an [`ObjectCore`] and override the lifecycle hooks
/// they care about. The provided lifecycle methods drive the activation
/// state machine and must not be overridden; they run the matching hook and
/// record the `*_called` flag afterwards.
///
/// Lifecycle preconditions are programming errors and abort the process.
pub trait ReplicatedObject: Send + Sync {
    fn core(&self) -> &ObjectCore;

    fn as_any(&self) -> &dyn Any;

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    // Subtype hooks, run by the provided lifecycle methods below.

    fn on_start(&self) {}

    fn on_stop(&self) {}

    fn on_pause(&self) {}

    fn on_resume(&self) {}

    /// Called once per object after a state restore pass, whether or not the
    /// snapshot contained a record for it.
    fn on_state_loaded(&self) {}

    /// Index of the custom-variables field, for types that carry one.
    fn vars_field_id(&self) -> Option<usize> {
        None
    }

    /// Starts the object (first activation only) and takes authority.
    ///
    /// # Panics
    ///
    /// Panics when the object is already active or when the caller holds the
    /// object monitor.
    fn activate(&self) {
        let core = self.core();
        assert!(
            !core.owns_lock(),
            "activate called while holding the object monitor"
        );
        assert!(
            !core.is_active(),
            "object '{}' of type {} is already active",
            core.name(),
            core.type_name()
        );

        if !core.start_called() {
            self.on_start();
            core.mark_start_called();
        }

        core.set_active(true);
        self.set_authority(true);
    }

    /// Drops authority and stops the object. Returns silently when the
    /// object is already inactive.
    ///
    /// # Panics
    ///
    /// Panics when the caller holds the object monitor.
    fn deactivate(&self) {
        let core = self.core();
        assert!(
            !core.owns_lock(),
            "deactivate called while holding the object monitor"
        );

        self.set_authority(false);

        if !core.is_active() {
            return;
        }
        core.set_active(false);

        if !core.stop_called() {
            self.on_stop();
            core.mark_stop_called();
        }
    }

    /// Flips the paused sub-state. A paused object keeps its registration
    /// but suppresses side-effects; resuming restores them. Idempotent.
    fn set_authority(&self, authority: bool) {
        let core = self.core();

        if authority && core.is_paused() {
            self.on_resume();
            core.mark_resume_called();
            core.set_paused(false);
        } else if !authority && !core.is_paused() {
            self.on_pause();
            core.mark_pause_called();
            core.set_paused(true);
        }
    }
}
