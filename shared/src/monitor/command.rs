use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};

use super::custom_var_object;

pub mod command_fid {
    pub const COMMAND_LINE: usize = 0;
    pub const VARS: usize = 1;
    pub const TIMEOUT: usize = 2;
}

pub static COMMAND_FIELDS: &[FieldInfo] = &[
    FieldInfo::new("command_line", FieldKind::Any, AttrClass::CONFIG),
    FieldInfo::new("vars", FieldKind::Map, AttrClass::CONFIG),
    FieldInfo::new("timeout", FieldKind::Number, AttrClass::CONFIG),
];

custom_var_object!(
    /// A command template used for active checks.
    CheckCommand,
    "CheckCommand",
    vars: command_fid::VARS
);

custom_var_object!(
    /// A command template run by event handlers.
    EventCommand,
    "EventCommand",
    vars: command_fid::VARS
);

custom_var_object!(
    /// A command template used to deliver notifications.
    NotificationCommand,
    "NotificationCommand",
    vars: command_fid::VARS
);
