use crate::object::attribute::{AttrClass, FieldInfo, FieldKind};

use super::custom_var_object;

pub mod time_period_fid {
    pub const DISPLAY_NAME: usize = 0;
    pub const RANGES: usize = 1;
    pub const VARS: usize = 2;
}

pub static TIME_PERIOD_FIELDS: &[FieldInfo] = &[
    FieldInfo::new("display_name", FieldKind::Text, AttrClass::CONFIG),
    FieldInfo::new("ranges", FieldKind::Map, AttrClass::CONFIG),
    FieldInfo::new("vars", FieldKind::Map, AttrClass::CONFIG),
];

custom_var_object!(
    /// A recurring time window checks and notifications are confined to.
    TimePeriod,
    "TimePeriod",
    vars: time_period_fid::VARS
);
