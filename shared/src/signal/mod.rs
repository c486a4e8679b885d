use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::monitor::{Checkable, CheckResult, Comment, Downtime, Notification};
use crate::object::replicated::ReplicatedObject;
use crate::peer::MessageOrigin;
use crate::runtime::Runtime;

/// The kinds of state changes replicated entities announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    NewCheckResult,
    NextCheckChanged,
    NextNotificationChanged,
    ForceNextCheckChanged,
    ForceNextNotificationChanged,
    EnableActiveChecksChanged,
    EnablePassiveChecksChanged,
    EnableNotificationsChanged,
    EnableFlappingChanged,
    EnableEventHandlerChanged,
    EnablePerfdataChanged,
    CheckIntervalChanged,
    RetryIntervalChanged,
    MaxCheckAttemptsChanged,
    EventCommandChanged,
    CheckCommandChanged,
    CheckPeriodChanged,
    VarsChanged,
    CommentAdded,
    CommentRemoved,
    DowntimeAdded,
    DowntimeRemoved,
    AcknowledgementSet,
    AcknowledgementCleared,
    OriginalAttributesChanged,
}

/// A state change, carrying the affected object and the change payload.
#[derive(Clone)]
pub enum ChangeEvent {
    NewCheckResult {
        checkable: Checkable,
        result: CheckResult,
    },
    NextCheckChanged {
        checkable: Checkable,
    },
    NextNotificationChanged {
        notification: Arc<Notification>,
    },
    ForceNextCheckChanged {
        checkable: Checkable,
    },
    ForceNextNotificationChanged {
        checkable: Checkable,
    },
    EnableActiveChecksChanged {
        checkable: Checkable,
    },
    EnablePassiveChecksChanged {
        checkable: Checkable,
    },
    EnableNotificationsChanged {
        checkable: Checkable,
    },
    EnableFlappingChanged {
        checkable: Checkable,
    },
    EnableEventHandlerChanged {
        checkable: Checkable,
    },
    EnablePerfdataChanged {
        checkable: Checkable,
    },
    CheckIntervalChanged {
        checkable: Checkable,
    },
    RetryIntervalChanged {
        checkable: Checkable,
    },
    MaxCheckAttemptsChanged {
        checkable: Checkable,
    },
    EventCommandChanged {
        checkable: Checkable,
    },
    CheckCommandChanged {
        checkable: Checkable,
    },
    CheckPeriodChanged {
        checkable: Checkable,
    },
    VarsChanged {
        object: Arc<dyn ReplicatedObject>,
    },
    CommentAdded {
        checkable: Checkable,
        comment: Comment,
    },
    CommentRemoved {
        checkable: Checkable,
        id: String,
    },
    DowntimeAdded {
        checkable: Checkable,
        downtime: Downtime,
    },
    DowntimeRemoved {
        checkable: Checkable,
        id: String,
    },
    AcknowledgementSet {
        checkable: Checkable,
        author: String,
        comment: String,
        ack_type: i64,
        notify: bool,
        expiry: f64,
    },
    AcknowledgementCleared {
        checkable: Checkable,
    },
    OriginalAttributesChanged {
        object: Arc<dyn ReplicatedObject>,
        path: String,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::NewCheckResult { .. } => ChangeKind::NewCheckResult,
            ChangeEvent::NextCheckChanged { .. } => ChangeKind::NextCheckChanged,
            ChangeEvent::NextNotificationChanged { .. } => ChangeKind::NextNotificationChanged,
            ChangeEvent::ForceNextCheckChanged { .. } => ChangeKind::ForceNextCheckChanged,
            ChangeEvent::ForceNextNotificationChanged { .. } => {
                ChangeKind::ForceNextNotificationChanged
            }
            ChangeEvent::EnableActiveChecksChanged { .. } => ChangeKind::EnableActiveChecksChanged,
            ChangeEvent::EnablePassiveChecksChanged { .. } => {
                ChangeKind::EnablePassiveChecksChanged
            }
            ChangeEvent::EnableNotificationsChanged { .. } => {
                ChangeKind::EnableNotificationsChanged
            }
            ChangeEvent::EnableFlappingChanged { .. } => ChangeKind::EnableFlappingChanged,
            ChangeEvent::EnableEventHandlerChanged { .. } => ChangeKind::EnableEventHandlerChanged,
            ChangeEvent::EnablePerfdataChanged { .. } => ChangeKind::EnablePerfdataChanged,
            ChangeEvent::CheckIntervalChanged { .. } => ChangeKind::CheckIntervalChanged,
            ChangeEvent::RetryIntervalChanged { .. } => ChangeKind::RetryIntervalChanged,
            ChangeEvent::MaxCheckAttemptsChanged { .. } => ChangeKind::MaxCheckAttemptsChanged,
            ChangeEvent::EventCommandChanged { .. } => ChangeKind::EventCommandChanged,
            ChangeEvent::CheckCommandChanged { .. } => ChangeKind::CheckCommandChanged,
            ChangeEvent::CheckPeriodChanged { .. } => ChangeKind::CheckPeriodChanged,
            ChangeEvent::VarsChanged { .. } => ChangeKind::VarsChanged,
            ChangeEvent::CommentAdded { .. } => ChangeKind::CommentAdded,
            ChangeEvent::CommentRemoved { .. } => ChangeKind::CommentRemoved,
            ChangeEvent::DowntimeAdded { .. } => ChangeKind::DowntimeAdded,
            ChangeEvent::DowntimeRemoved { .. } => ChangeKind::DowntimeRemoved,
            ChangeEvent::AcknowledgementSet { .. } => ChangeKind::AcknowledgementSet,
            ChangeEvent::AcknowledgementCleared { .. } => ChangeKind::AcknowledgementCleared,
            ChangeEvent::OriginalAttributesChanged { .. } => ChangeKind::OriginalAttributesChanged,
        }
    }
}

type SignalHandler = Box<dyn Fn(&Runtime, &ChangeEvent, Option<&Arc<MessageOrigin>>) + Send + Sync>;

/// Synchronous in-process change-notification bus, keyed by change kind.
///
/// Emission happens on the mutating thread, after the object monitor is
/// released; subscribers must assume arbitrary threads. The origin argument
/// carries the peer a replicated mutation came from, so subscribers can tell
/// local changes from applied ones.
pub struct SignalHub {
    slots: RwLock<HashMap<ChangeKind, Vec<SignalHandler>>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(
        &self,
        kind: ChangeKind,
        handler: impl Fn(&Runtime, &ChangeEvent, Option<&Arc<MessageOrigin>>) + Send + Sync + 'static,
    ) {
        let mut slots = self.slots.write().expect("signal hub poisoned");
        slots.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn emit(&self, runtime: &Runtime, event: &ChangeEvent, origin: Option<&Arc<MessageOrigin>>) {
        let slots = self.slots.read().expect("signal hub poisoned");
        if let Some(handlers) = slots.get(&event.kind()) {
            for handler in handlers {
                handler(runtime, event, origin);
            }
        }
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}
