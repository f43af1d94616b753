//! Callers (the entity driving the wizard) and spawned game objects.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The account or character using the wizard.
///
/// `location` is the dbref of the room the caller stands in, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub superuser: bool,
}

impl Caller {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: Vec::new(),
            location: None,
            superuser: false,
        }
    }

    /// Database reference in `#<id>` form.
    pub fn dbref(&self) -> String {
        format!("#{}", self.id)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An object instantiated from a prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedObject {
    pub id: i64,
    pub key: String,
    pub typeclass: String,
    pub prototype_key: Option<String>,
    pub location: Option<String>,
    pub home: Option<String>,
    pub destination: Option<String>,
    /// Aliases, attributes (with parsed values), tags, locks and permissions.
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl SpawnedObject {
    pub fn dbref(&self) -> String {
        format!("#{}", self.id)
    }
}
