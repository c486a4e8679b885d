use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};

use super::custom_var_object;

pub mod user_fid {
    pub const DISPLAY_NAME: usize = 0;
    pub const EMAIL: usize = 1;
    pub const VARS: usize = 2;
}

pub static USER_FIELDS: &[FieldInfo] = &[
    FieldInfo::new("display_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("email", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("vars", FieldKind::Map, AttrClass::CONFIG),
];

custom_var_object!(
    /// A notification recipient.
    User,
    "User",
    vars: user_fid::VARS
);
