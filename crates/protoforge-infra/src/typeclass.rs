//! Typeclass registry backed by the `typeclasses` list in `config.toml`.

use std::collections::BTreeMap;

use protoforge_core::service::typeclass::TypeclassRegistry;
use protoforge_types::config::OlcConfig;

/// Registered typeclasses keyed by path. `BTreeMap` keeps them sorted.
#[derive(Debug, Clone, Default)]
pub struct ConfigTypeclassRegistry {
    typeclasses: BTreeMap<String, String>,
}

impl ConfigTypeclassRegistry {
    pub fn from_config(config: &OlcConfig) -> Self {
        let typeclasses = config
            .typeclasses
            .iter()
            .map(|t| (t.path.trim().to_string(), t.doc.clone()))
            .filter(|(path, _)| !path.is_empty())
            .collect();
        Self { typeclasses }
    }
}

impl TypeclassRegistry for ConfigTypeclassRegistry {
    fn all_typeclasses(&self) -> Vec<String> {
        self.typeclasses.keys().cloned().collect()
    }

    fn docstring(&self, path: &str) -> Option<String> {
        self.typeclasses.get(path).cloned()
    }

    fn contains(&self, path: &str) -> bool {
        self.typeclasses.contains_key(path)
    }
}
