//! Wizard navigation identifiers and per-session scratch state.
//!
//! `MenuState` is serializable so a session can be auto-saved as a draft and
//! resumed later. Lifecycle methods live in `protoforge-core` as an extension
//! trait.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prototype::Prototype;

/// One screen of the prototype wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Index,
    ViewPrototype,
    PrototypeKey,
    PrototypeParent,
    Typeclass,
    Key,
    Aliases,
    Attrs,
    Tags,
    Locks,
    Permissions,
    Location,
    Home,
    Destination,
    PrototypeDesc,
    PrototypeTags,
    PrototypeLocks,
    PrototypeSave,
    PrototypeSpawn,
    PrototypeLoad,
}

impl NodeId {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeId::Index => "index",
            NodeId::ViewPrototype => "view_prototype",
            NodeId::PrototypeKey => "prototype_key",
            NodeId::PrototypeParent => "prototype_parent",
            NodeId::Typeclass => "typeclass",
            NodeId::Key => "key",
            NodeId::Aliases => "aliases",
            NodeId::Attrs => "attrs",
            NodeId::Tags => "tags",
            NodeId::Locks => "locks",
            NodeId::Permissions => "permissions",
            NodeId::Location => "location",
            NodeId::Home => "home",
            NodeId::Destination => "destination",
            NodeId::PrototypeDesc => "prototype_desc",
            NodeId::PrototypeTags => "prototype_tags",
            NodeId::PrototypeLocks => "prototype_locks",
            NodeId::PrototypeSave => "prototype_save",
            NodeId::PrototypeSpawn => "prototype_spawn",
            NodeId::PrototypeLoad => "prototype_load",
        }
    }

    /// Name as shown in navigation hints ("prototype-key").
    pub fn label(self) -> String {
        self.as_str().replace('_', "-")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let name = normalized.strip_prefix("node_").unwrap_or(&normalized);
        match name {
            "index" => Ok(NodeId::Index),
            "view_prototype" => Ok(NodeId::ViewPrototype),
            "prototype_key" => Ok(NodeId::PrototypeKey),
            "prototype_parent" => Ok(NodeId::PrototypeParent),
            "typeclass" => Ok(NodeId::Typeclass),
            "key" => Ok(NodeId::Key),
            "aliases" => Ok(NodeId::Aliases),
            "attrs" => Ok(NodeId::Attrs),
            "tags" => Ok(NodeId::Tags),
            "locks" => Ok(NodeId::Locks),
            "permissions" => Ok(NodeId::Permissions),
            "location" => Ok(NodeId::Location),
            "home" => Ok(NodeId::Home),
            "destination" => Ok(NodeId::Destination),
            "prototype_desc" => Ok(NodeId::PrototypeDesc),
            "prototype_tags" => Ok(NodeId::PrototypeTags),
            "prototype_locks" => Ok(NodeId::PrototypeLocks),
            "prototype_save" => Ok(NodeId::PrototypeSave),
            "prototype_spawn" => Ok(NodeId::PrototypeSpawn),
            "prototype_load" => Ok(NodeId::PrototypeLoad),
            other => Err(format!("unknown wizard node: '{other}'")),
        }
    }
}

/// Scratch state of one wizard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuState {
    pub session_id: Uuid,
    /// Dbref number of the caller that owns this session.
    pub caller_id: i64,
    /// The prototype being edited.
    pub prototype: Prototype,
    /// `false` once the prototype was loaded from (or matched) a saved one.
    pub is_new: bool,
    /// Screen currently shown.
    pub node: NodeId,
    /// Where the view/validate screen returns to.
    pub back: Option<NodeId>,
    /// Zero-based page of the current list screen.
    pub page: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_roundtrip_through_str() {
        for node in [NodeId::Index, NodeId::PrototypeSpawn, NodeId::ViewPrototype] {
            assert_eq!(node.as_str().parse::<NodeId>().unwrap(), node);
        }
    }

    #[test]
    fn test_node_id_accepts_prefixed_and_dashed_names() {
        assert_eq!("node_prototype_key".parse::<NodeId>().unwrap(), NodeId::PrototypeKey);
        assert_eq!("prototype-desc".parse::<NodeId>().unwrap(), NodeId::PrototypeDesc);
        assert!("node_spawn".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_label_uses_dashes() {
        assert_eq!(NodeId::PrototypeLocks.label(), "prototype-locks");
    }
}
