//! Prototype documents: the reusable templates objects are spawned from.
//!
//! A `Prototype` is edited field by field in the OLC wizard. Scalar and list
//! fields are addressed through `PrototypeField` and written with
//! `FieldValue`; attributes and tags have their own structured entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named, reusable template of key/attribute/tag/lock values used to
/// instantiate game objects.
///
/// Every field is optional. `prototype_*` fields organize and protect the
/// prototype itself; the rest are applied to spawned objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype_parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prototype_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype_locks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typeclass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<AttrSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locks: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// An attribute to set on spawned objects.
///
/// `value` is kept as entered; inline functions in it are resolved by the
/// protfunc parser at spawn time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub locks: String,
}

/// A tag to set on spawned objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub data: String,
}

/// The scalar and list fields of a prototype that are edited as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrototypeField {
    PrototypeKey,
    PrototypeParent,
    PrototypeDesc,
    PrototypeTags,
    PrototypeLocks,
    Typeclass,
    Key,
    Aliases,
    Locks,
    Permissions,
    Location,
    Home,
    Destination,
}

impl PrototypeField {
    /// Storage name, as used in the serialized prototype.
    pub fn as_str(self) -> &'static str {
        match self {
            PrototypeField::PrototypeKey => "prototype_key",
            PrototypeField::PrototypeParent => "prototype_parent",
            PrototypeField::PrototypeDesc => "prototype_desc",
            PrototypeField::PrototypeTags => "prototype_tags",
            PrototypeField::PrototypeLocks => "prototype_locks",
            PrototypeField::Typeclass => "typeclass",
            PrototypeField::Key => "key",
            PrototypeField::Aliases => "aliases",
            PrototypeField::Locks => "locks",
            PrototypeField::Permissions => "permissions",
            PrototypeField::Location => "location",
            PrototypeField::Home => "home",
            PrototypeField::Destination => "destination",
        }
    }

    /// Human-facing name ("Prototype-key", "Typeclass", ...).
    pub fn display_name(self) -> String {
        let dashed = self.as_str().replace('_', "-");
        let mut chars = dashed.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Whether the field holds a list of strings rather than a single string.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            PrototypeField::PrototypeTags | PrototypeField::Aliases | PrototypeField::Permissions
        )
    }
}

impl fmt::Display for PrototypeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrototypeField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "prototype_key" => Ok(PrototypeField::PrototypeKey),
            "prototype_parent" | "prototype" => Ok(PrototypeField::PrototypeParent),
            "prototype_desc" => Ok(PrototypeField::PrototypeDesc),
            "prototype_tags" => Ok(PrototypeField::PrototypeTags),
            "prototype_locks" => Ok(PrototypeField::PrototypeLocks),
            "typeclass" => Ok(PrototypeField::Typeclass),
            "key" => Ok(PrototypeField::Key),
            "aliases" => Ok(PrototypeField::Aliases),
            "locks" => Ok(PrototypeField::Locks),
            "permissions" => Ok(PrototypeField::Permissions),
            "location" => Ok(PrototypeField::Location),
            "home" => Ok(PrototypeField::Home),
            "destination" | "dest" => Ok(PrototypeField::Destination),
            other => Err(format!("unknown prototype field: '{other}'")),
        }
    }
}

/// A value written into a `PrototypeField`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// True for an empty string, or a list whose entries are all empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.iter().all(|item| item.is_empty()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
        }
    }

    /// JSON representation, used when echoing a newly set value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| serde_json::Value::String(item.clone()))
                    .collect(),
            ),
        }
    }

    fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::List(items) => items.join(", "),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s],
            FieldValue::List(items) => items.into_iter().filter(|item| !item.is_empty()).collect(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl Prototype {
    /// Current value of a field, or `None` when unset/empty.
    pub fn get_field(&self, field: PrototypeField) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let list = |v: &Vec<String>| {
            if v.is_empty() {
                None
            } else {
                Some(FieldValue::List(v.clone()))
            }
        };
        match field {
            PrototypeField::PrototypeKey => text(&self.prototype_key),
            PrototypeField::PrototypeParent => text(&self.prototype_parent),
            PrototypeField::PrototypeDesc => text(&self.prototype_desc),
            PrototypeField::PrototypeTags => list(&self.prototype_tags),
            PrototypeField::PrototypeLocks => text(&self.prototype_locks),
            PrototypeField::Typeclass => text(&self.typeclass),
            PrototypeField::Key => text(&self.key),
            PrototypeField::Aliases => list(&self.aliases),
            PrototypeField::Locks => text(&self.locks),
            PrototypeField::Permissions => list(&self.permissions),
            PrototypeField::Location => text(&self.location),
            PrototypeField::Home => text(&self.home),
            PrototypeField::Destination => text(&self.destination),
        }
    }

    /// Write a field. Returns `false` (and leaves the prototype untouched)
    /// when `value` is empty.
    ///
    /// `typeclass` and `prototype_parent` are mutually exclusive: setting one
    /// clears the other.
    pub fn set_field(&mut self, field: PrototypeField, value: FieldValue) -> bool {
        if value.is_empty() {
            return false;
        }
        match field {
            PrototypeField::PrototypeKey => self.prototype_key = Some(value.into_text()),
            PrototypeField::PrototypeParent => {
                self.prototype_parent = Some(value.into_text());
                self.typeclass = None;
            }
            PrototypeField::PrototypeDesc => self.prototype_desc = Some(value.into_text()),
            PrototypeField::PrototypeTags => self.prototype_tags = value.into_list(),
            PrototypeField::PrototypeLocks => self.prototype_locks = Some(value.into_text()),
            PrototypeField::Typeclass => {
                self.typeclass = Some(value.into_text());
                self.prototype_parent = None;
            }
            PrototypeField::Key => self.key = Some(value.into_text()),
            PrototypeField::Aliases => self.aliases = value.into_list(),
            PrototypeField::Locks => self.locks = Some(value.into_text()),
            PrototypeField::Permissions => self.permissions = value.into_list(),
            PrototypeField::Location => self.location = Some(value.into_text()),
            PrototypeField::Home => self.home = Some(value.into_text()),
            PrototypeField::Destination => self.destination = Some(value.into_text()),
        }
        true
    }

    /// Add an attribute, replacing any existing one with the same key.
    /// Returns `true` if an existing attribute was replaced.
    pub fn upsert_attr(&mut self, attr: AttrSpec) -> bool {
        match self.attrs.iter_mut().find(|a| a.key == attr.key) {
            Some(existing) => {
                *existing = attr;
                true
            }
            None => {
                self.attrs.push(attr);
                false
            }
        }
    }

    /// Remove an attribute by key. Returns `true` if one was removed.
    pub fn remove_attr(&mut self, key: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| a.key != key);
        self.attrs.len() != before
    }

    /// Add a tag, replacing any existing tag with the same name.
    /// Returns `true` if an existing tag was replaced.
    pub fn upsert_tag(&mut self, tag: TagSpec) -> bool {
        match self.tags.iter_mut().find(|t| t.tag == tag.tag) {
            Some(existing) => {
                *existing = tag;
                true
            }
            None => {
                self.tags.push(tag);
                false
            }
        }
    }

    /// Remove a tag by name. Returns `true` if one was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.tag != tag);
        self.tags.len() != before
    }

    /// The prototype key, or `"<unset>"` for display.
    pub fn key_or_unset(&self) -> &str {
        self.prototype_key.as_deref().unwrap_or("<unset>")
    }
}
