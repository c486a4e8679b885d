use std::fmt::Write as _;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Reserved words of the config dialect. Identifiers colliding with one are
/// emitted with an `@` prefix.
pub const KEYWORDS: &[&str] = &[
    "object",
    "template",
    "include",
    "include_recursive",
    "library",
    "null",
    "true",
    "false",
    "const",
    "var",
    "this",
    "globals",
    "locals",
    "use",
    "apply",
    "to",
    "where",
    "import",
    "assign",
    "ignore",
    "function",
    "return",
    "break",
    "continue",
    "for",
    "if",
    "else",
    "while",
    "throw",
    "in",
];

/// Emits grammar-faithful text for the declarative config dialect.
pub struct ConfigWriter;

impl ConfigWriter {
    pub fn emit_boolean(out: &mut String, value: bool) {
        out.push_str(if value { "true" } else { "false" });
    }

    pub fn emit_number(out: &mut String, value: f64) {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            let _ = write!(out, "{}", value as i64);
        } else {
            let _ = write!(out, "{}", value);
        }
    }

    pub fn emit_string(out: &mut String, value: &str) {
        out.push('"');
        out.push_str(&Self::escape_string(value));
        out.push('"');
    }

    pub fn emit_empty(out: &mut String) {
        out.push_str("null");
    }

    pub fn emit_array(out: &mut String, items: &[Value]) -> Result<(), WriteError> {
        out.push_str("[ ");
        Self::emit_array_items(out, items)?;
        out.push_str(" ]");
        Ok(())
    }

    fn emit_array_items(out: &mut String, items: &[Value]) -> Result<(), WriteError> {
        let mut first = true;
        for item in items {
            if first {
                first = false;
            } else {
                out.push_str(", ");
            }
            Self::emit_value(out, 0, item)?;
        }
        Ok(())
    }

    /// Emits a `{ ... }` scope. Keys containing dots render as indexed
    /// assignments (`a["b"]["c"] = ...`). Items are indented with tabs at
    /// `indent`, the closing brace at `indent - 1`.
    pub fn emit_scope(
        out: &mut String,
        indent: usize,
        scope: &Map<String, Value>,
        imports: Option<&[String]>,
    ) -> Result<(), WriteError> {
        out.push('{');

        if let Some(imports) = imports {
            if !imports.is_empty() {
                for import in imports {
                    out.push('\n');
                    Self::emit_indent(out, indent);
                    out.push_str("import \"");
                    out.push_str(import);
                    out.push('"');
                }
                out.push('\n');
            }
        }

        for (key, value) in scope {
            out.push('\n');
            Self::emit_indent(out, indent);

            let mut tokens = key.split('.');
            let head = tokens.next().unwrap_or_default();
            Self::emit_identifier(out, head, true)?;

            for token in tokens {
                out.push('[');
                Self::emit_string(out, token);
                out.push(']');
            }

            out.push_str(" = ");
            Self::emit_value(out, indent + 1, value)?;
        }

        out.push('\n');
        Self::emit_indent(out, indent.saturating_sub(1));
        out.push('}');
        Ok(())
    }

    pub fn emit_value(out: &mut String, indent: usize, value: &Value) -> Result<(), WriteError> {
        match value {
            Value::Array(items) => Self::emit_array(out, items),
            Value::Object(scope) => Self::emit_scope(out, indent, scope, None),
            Value::String(text) => {
                Self::emit_string(out, text);
                Ok(())
            }
            Value::Number(number) => {
                Self::emit_number(out, number.as_f64().unwrap_or(0.0));
                Ok(())
            }
            Value::Bool(flag) => {
                Self::emit_boolean(out, *flag);
                Ok(())
            }
            Value::Null => {
                Self::emit_empty(out);
                Ok(())
            }
        }
    }

    pub fn emit_raw(out: &mut String, text: &str) {
        out.push_str(text);
    }

    fn emit_indent(out: &mut String, indent: usize) {
        for _ in 0..indent {
            out.push('\t');
        }
    }

    fn valid_identifier(identifier: &str) -> bool {
        let mut chars = identifier.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    /// Emits an identifier: bare when well-formed, `@`-prefixed when it
    /// collides with a keyword, quoted in assignment position otherwise.
    /// Malformed identifiers outside assignment position are rejected.
    pub fn emit_identifier(
        out: &mut String,
        identifier: &str,
        in_assignment: bool,
    ) -> Result<(), WriteError> {
        if KEYWORDS.contains(&identifier) {
            out.push('@');
            out.push_str(identifier);
            return Ok(());
        }

        if Self::valid_identifier(identifier) {
            out.push_str(identifier);
            Ok(())
        } else if in_assignment {
            Self::emit_string(out, identifier);
            Ok(())
        } else {
            Err(WriteError::InvalidIdentifier(identifier.to_string()))
        }
    }

    /// Emits a top-level `object`/`template` item.
    pub fn emit_config_item(
        out: &mut String,
        type_name: &str,
        name: &str,
        is_template: bool,
        imports: &[String],
        attrs: &Map<String, Value>,
    ) -> Result<(), WriteError> {
        out.push_str(if is_template { "template " } else { "object " });
        Self::emit_identifier(out, type_name, false)?;
        out.push(' ');
        Self::emit_string(out, name);
        out.push(' ');
        Self::emit_scope(out, 1, attrs, Some(imports))
    }

    pub fn emit_comment(out: &mut String, text: &str) {
        out.push_str("/* ");
        out.push_str(text);
        out.push_str(" */\n");
    }

    pub fn emit_function_call(
        out: &mut String,
        name: &str,
        arguments: &[Value],
    ) -> Result<(), WriteError> {
        Self::emit_identifier(out, name, false)?;
        out.push('(');
        Self::emit_array_items(out, arguments)?;
        out.push(')');
        Ok(())
    }

    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                '\t' => escaped.push_str("\\t"),
                '\r' => escaped.push_str("\\r"),
                '\u{8}' => escaped.push_str("\\b"),
                '\u{c}' => escaped.push_str("\\f"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}
