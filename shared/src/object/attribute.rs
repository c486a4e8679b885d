use std::ops::BitOr;

use serde_json::Value;

use super::error::ObjectError;

/// Bitmask identifying which serialization classes a field belongs to.
///
/// The snapshot writer and the serializer accept a mask and only touch
/// fields whose class intersects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrClass(u8);

impl AttrClass {
    pub const NONE: AttrClass = AttrClass(0);
    /// Declared in a source file; survives a full restart via config.
    /// Mutations of these fields are tracked in the original-attributes map.
    pub const CONFIG: AttrClass = AttrClass(1 << 0);
    /// Runtime-only, persisted across restarts via the state snapshot.
    pub const STATE: AttrClass = AttrClass(1 << 1);
    /// Never serialized.
    pub const INTERNAL: AttrClass = AttrClass(1 << 2);

    pub fn intersects(self, other: AttrClass) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: AttrClass) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AttrClass {
    type Output = AttrClass;

    fn bitor(self, rhs: AttrClass) -> AttrClass {
        AttrClass(self.0 | rhs.0)
    }
}

/// Resolves cross-object name references during field validation.
///
/// `validate_name` must only return true when the type exists *and* an
/// object of that name is registered for it.
pub trait NameLookup {
    fn validate_name(&self, type_name: &str, name: &str) -> bool;
}

/// Schema of a single reflective field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Number,
    Text,
    List,
    Map,
    /// A string naming a registered object of the given type.
    ObjectName(&'static str),
    /// Unconstrained value.
    Any,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Bool => "boolean",
            FieldKind::Number => "number",
            FieldKind::Text => "string",
            FieldKind::List => "array",
            FieldKind::Map => "dictionary",
            FieldKind::ObjectName(_) => "object name",
            FieldKind::Any => "value",
        }
    }

    /// Structural validation only. `Null` is always accepted; it stands for
    /// an unset field.
    pub fn validate_shape(self, field: &'static str, value: &Value) -> Result<(), ObjectError> {
        if value.is_null() {
            return Ok(());
        }

        let ok = match self {
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Number => value.is_number(),
            FieldKind::Text | FieldKind::ObjectName(_) => value.is_string(),
            FieldKind::List => value.is_array(),
            FieldKind::Map => value.is_object(),
            FieldKind::Any => true,
        };

        if ok {
            Ok(())
        } else {
            Err(ObjectError::InvalidValue {
                field,
                expected: self.expected(),
            })
        }
    }

    /// Full validation: shape plus cross-object reference resolution.
    pub fn validate(
        self,
        field: &'static str,
        value: &Value,
        names: &dyn NameLookup,
    ) -> Result<(), ObjectError> {
        self.validate_shape(field, value)?;

        if let FieldKind::ObjectName(type_name) = self {
            if let Some(name) = value.as_str() {
                if !names.validate_name(type_name, name) {
                    return Err(ObjectError::DanglingReference {
                        field,
                        ref_type: type_name,
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Metadata of one reflective field.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
    pub class: AttrClass,
}

impl FieldInfo {
    pub const fn new(name: &'static str, kind: FieldKind, class: AttrClass) -> FieldInfo {
        FieldInfo { name, kind, class }
    }
}
