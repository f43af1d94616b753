//! Global configuration types for Protoforge.
//!
//! `OlcConfig` represents the top-level `config.toml` that controls wizard
//! display, the default object settings shown in the wizard, and the set of
//! typeclasses prototypes may be based on.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the prototype wizard.
///
/// Loaded from `~/.protoforge/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlcConfig {
    /// Typeclass used for objects whose prototype does not name one.
    #[serde(default = "default_base_object_typeclass")]
    pub base_object_typeclass: String,

    /// Home location given to spawned objects with no `home`.
    #[serde(default = "default_home")]
    pub default_home: String,

    /// Width values are cropped to in the wizard index.
    #[serde(default = "default_crop_width")]
    pub crop_width: usize,

    /// Number of entries per page on list screens.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,

    /// Run newly entered values through the inline-function parser and
    /// report the result.
    #[serde(default = "default_test_parse")]
    pub test_parse: bool,

    /// Typeclasses prototypes may reference.
    #[serde(default = "default_typeclasses")]
    pub typeclasses: Vec<TypeclassDef>,
}

/// A typeclass path plus its documentation, as shown by the typeclass screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeclassDef {
    pub path: String,
    #[serde(default)]
    pub doc: String,
}

fn default_base_object_typeclass() -> String {
    "typeclasses.objects.Object".to_string()
}

fn default_home() -> String {
    "#2".to_string()
}

fn default_crop_width() -> usize {
    15
}

fn default_list_page_size() -> usize {
    10
}

fn default_test_parse() -> bool {
    true
}

fn default_typeclasses() -> Vec<TypeclassDef> {
    let def = |path: &str, doc: &str| TypeclassDef {
        path: path.to_string(),
        doc: doc.to_string(),
    };
    vec![
        def(
            "typeclasses.objects.Object",
            "This is the root typeclass object, representing all entities that\n\
             have an actual presence in-game.\n\n\
             Objects generally have a location and can be picked up.",
        ),
        def(
            "typeclasses.characters.Character",
            "The Character is the in-game entity controlled by a player.\n\n\
             It cannot be picked up and is always located in a room.",
        ),
        def(
            "typeclasses.rooms.Room",
            "Rooms are simple containers that have no location of their own.",
        ),
        def(
            "typeclasses.exits.Exit",
            "Exits are connectors between rooms. An exit has a destination\n\
             and traversing it moves the traverser there.",
        ),
    ]
}

impl Default for OlcConfig {
    fn default() -> Self {
        Self {
            base_object_typeclass: default_base_object_typeclass(),
            default_home: default_home(),
            crop_width: default_crop_width(),
            list_page_size: default_list_page_size(),
            test_parse: default_test_parse(),
            typeclasses: default_typeclasses(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_olc_config_default_values() {
        let config = OlcConfig::default();
        assert_eq!(config.base_object_typeclass, "typeclasses.objects.Object");
        assert_eq!(config.default_home, "#2");
        assert_eq!(config.crop_width, 15);
        assert_eq!(config.list_page_size, 10);
        assert!(config.test_parse);
        assert_eq!(config.typeclasses.len(), 4);
    }

    #[test]
    fn test_olc_config_deserialize_with_defaults() {
        let config: OlcConfig = toml::from_str("").unwrap();
        assert_eq!(config.crop_width, 15);
        assert!(config
            .typeclasses
            .iter()
            .any(|t| t.path == "typeclasses.rooms.Room"));
    }

    #[test]
    fn test_olc_config_deserialize_with_values() {
        let toml_str = r##"
default_home = "#5"
list_page_size = 3
test_parse = false

[[typeclasses]]
path = "typeclasses.weapons.Sword"
doc = "A sharp thing."
"##;
        let config: OlcConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_home, "#5");
        assert_eq!(config.list_page_size, 3);
        assert!(!config.test_parse);
        assert_eq!(config.typeclasses.len(), 1);
        assert_eq!(config.typeclasses[0].path, "typeclasses.weapons.Sword");
    }
}
