//! # Vigil Shared
//! The replicated object model, state snapshotting and peer contracts shared
//! by every vigil cluster component.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod monitor;
pub mod object;
pub mod peer;
pub mod runtime;
pub mod signal;
pub mod time;

pub use monitor::{
    checkable_fid, set_object_vars, AcknowledgementType, CheckCommand, CheckResult, Checkable,
    Comment, Downtime, EventCommand, Host, Notification, NotificationCommand, PerfdataValue,
    Service, ServiceState, TimePeriod, User,
};
pub use object::attribute::{AttrClass, FieldInfo, FieldKind, NameLookup};
pub use object::core::ObjectCore;
pub use object::descriptor::{NameComposer, TypeDescriptor};
pub use object::error::{ObjectError, SnapshotError};
pub use object::registry::ObjectTypes;
pub use object::replicated::ReplicatedObject;
pub use object::serializer::{deserialize_object, serialize_object};
pub use object::snapshot::{
    dump_objects, restore_objects, write_netstring, NetstringReader, RestoreStats,
};
pub use peer::{
    CheckEngine, CommandError, Endpoint, MessageOrigin, PeerListener, RelayScope, Zone,
};
pub use runtime::{Runtime, RuntimeConfig};
pub use signal::{ChangeEvent, ChangeKind, SignalHub};
pub use time::current_time;
