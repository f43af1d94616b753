//! Inline-function ("protfunc") parser trait.
//!
//! Prototype values may embed calls such as `$add(1, 2)` that are resolved
//! when an object is spawned. The wizard runs the parser in testing mode to
//! show users what a value will turn into.

use protoforge_types::prototype::{FieldValue, Prototype};

/// Result of parsing one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub value: serde_json::Value,
    /// Non-fatal problem found while parsing (bad literal, unknown function).
    pub warning: Option<String>,
}

pub trait ProtfuncParser: Send + Sync {
    /// Parse a single string value.
    ///
    /// `prototype` supplies the fields `$protkey()` reads. In `testing` mode
    /// no world state is consulted.
    fn parse(&self, value: &str, prototype: Option<&Prototype>, testing: bool) -> ParseOutcome;

    /// Parse a field value; lists are parsed element by element and the
    /// first warning is kept.
    fn parse_field(
        &self,
        value: &FieldValue,
        prototype: Option<&Prototype>,
        testing: bool,
    ) -> ParseOutcome {
        match value {
            FieldValue::Text(s) => self.parse(s, prototype, testing),
            FieldValue::List(items) => {
                let mut warning = None;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let outcome = self.parse(item, prototype, testing);
                    if warning.is_none() {
                        warning = outcome.warning;
                    }
                    values.push(outcome.value);
                }
                ParseOutcome {
                    value: serde_json::Value::Array(values),
                    warning,
                }
            }
        }
    }
}

/// Short type name of a parsed value, shown next to it in the wizard.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "none",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "text",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dict",
    }
}
