//! Spawner that instantiates prototypes into the `objects` table.
//!
//! A prototype is validated, flattened over its parent chain, and its values
//! run through the inline-function parser before the object is stored.
//! Validation warnings (mixin-only prototypes) block spawning.

use std::sync::Arc;

use serde_json::{Value, json};

use protoforge_core::service::protfunc::ProtfuncParser;
use protoforge_core::service::spawner::{
    Spawner, flatten_prototype, resolve_parents, validate_prototype,
};
use protoforge_core::service::typeclass::TypeclassRegistry;
use protoforge_types::config::OlcConfig;
use protoforge_types::error::SpawnError;
use protoforge_types::object::SpawnedObject;
use protoforge_types::prototype::Prototype;

use crate::sqlite::object::{NewObject, SqliteObjectRepository};
use crate::sqlite::prototype::SqlitePrototypeRepository;

pub struct SqliteSpawner {
    prototypes: SqlitePrototypeRepository,
    objects: SqliteObjectRepository,
    parser: Arc<dyn ProtfuncParser>,
    typeclasses: Arc<dyn TypeclassRegistry>,
    base_typeclass: String,
    default_home: String,
}

impl SqliteSpawner {
    pub fn new(
        prototypes: SqlitePrototypeRepository,
        objects: SqliteObjectRepository,
        parser: Arc<dyn ProtfuncParser>,
        typeclasses: Arc<dyn TypeclassRegistry>,
        config: &OlcConfig,
    ) -> Self {
        Self {
            prototypes,
            objects,
            parser,
            typeclasses,
            base_typeclass: config.base_object_typeclass.clone(),
            default_home: config.default_home.clone(),
        }
    }

    /// Validate and flatten. Warnings are returned as errors here.
    async fn resolve(&self, prototype: &Prototype) -> Result<Prototype, SpawnError> {
        let parents = resolve_parents(&self.prototypes, prototype).await?;
        validate_prototype(prototype, &parents, self.typeclasses.as_ref())?;
        Ok(flatten_prototype(prototype, &parents))
    }

    /// Parse a value for storage. Parser warnings are logged, not fatal.
    fn parse_value(&self, raw: &str, flat: &Prototype) -> Value {
        let outcome = self.parser.parse(raw, Some(flat), false);
        if let Some(warning) = outcome.warning {
            tracing::warn!(
                prototype_key = flat.key_or_unset(),
                value = raw,
                "inline function warning: {warning}"
            );
        }
        outcome.value
    }

    fn parse_text(&self, raw: &str, flat: &Prototype) -> String {
        match self.parse_value(raw, flat) {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    fn build(&self, flat: &Prototype, location: Option<&str>) -> NewObject {
        let text = |value: &Option<String>| value.as_deref().map(|v| self.parse_text(v, flat));

        let attrs: Vec<Value> = flat
            .attrs
            .iter()
            .map(|attr| {
                json!({
                    "key": attr.key,
                    "value": self.parse_value(&attr.value, flat),
                    "category": attr.category,
                    "locks": attr.locks,
                })
            })
            .collect();
        let tags: Vec<Value> = flat
            .tags
            .iter()
            .map(|tag| json!({"tag": tag.tag, "category": tag.category, "data": tag.data}))
            .collect();

        NewObject {
            key: text(&flat.key)
                .or_else(|| flat.prototype_key.clone())
                .unwrap_or_default(),
            typeclass: flat
                .typeclass
                .clone()
                .unwrap_or_else(|| self.base_typeclass.clone()),
            prototype_key: flat.prototype_key.as_ref().map(|k| k.to_lowercase()),
            location: location.map(str::to_string).or_else(|| text(&flat.location)),
            home: text(&flat.home).or_else(|| Some(self.default_home.clone())),
            destination: text(&flat.destination),
            data: json!({
                "aliases": flat.aliases,
                "attrs": attrs,
                "tags": tags,
                "locks": flat.locks,
                "permissions": flat.permissions,
            }),
        }
    }
}

impl Spawner for SqliteSpawner {
    async fn validate(&self, prototype: &Prototype) -> Result<(), SpawnError> {
        let parents = resolve_parents(&self.prototypes, prototype).await?;
        validate_prototype(prototype, &parents, self.typeclasses.as_ref())
    }

    async fn spawn(
        &self,
        prototype: &Prototype,
        location: Option<&str>,
    ) -> Result<SpawnedObject, SpawnError> {
        let flat = self.resolve(prototype).await?;
        let object = self.objects.insert(self.build(&flat, location)).await?;

        tracing::info!(
            prototype_key = flat.key_or_unset(),
            object = %object.dbref(),
            location = object.location.as_deref().unwrap_or(""),
            "spawned object"
        );
        Ok(object)
    }

    async fn objects_with_prototype(
        &self,
        prototype_key: &str,
    ) -> Result<Vec<SpawnedObject>, SpawnError> {
        Ok(self.objects.find_by_prototype(prototype_key).await?)
    }

    async fn update_objects_with_prototype(&self, prototype: &Prototype) -> Result<usize, SpawnError> {
        let flat = self.resolve(prototype).await?;
        let Some(key) = flat.prototype_key.as_deref() else {
            return Ok(0);
        };

        let existing = self.objects.find_by_prototype(key).await?;
        for mut object in existing.iter().cloned() {
            // Objects keep their current location.
            let fresh = self.build(&flat, object.location.as_deref());
            object.key = fresh.key;
            object.typeclass = fresh.typeclass;
            object.home = fresh.home;
            object.destination = fresh.destination;
            object.data = fresh.data;
            self.objects.update(&object).await?;
        }

        tracing::info!(prototype_key = key, count = existing.len(), "updated spawned objects");
        Ok(existing.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoforge_core::repository::prototype::PrototypeRepository;
    use protoforge_types::prototype::{AttrSpec, TagSpec};

    use crate::protfunc::InlineProtfuncParser;
    use crate::sqlite::pool::test_pool;
    use crate::typeclass::ConfigTypeclassRegistry;

    async fn setup() -> (SqliteSpawner, SqlitePrototypeRepository) {
        let pool = test_pool().await;
        let config = OlcConfig::default();
        let prototypes = SqlitePrototypeRepository::new(pool.clone());
        let spawner = SqliteSpawner::new(
            prototypes.clone(),
            SqliteObjectRepository::new(pool),
            Arc::new(InlineProtfuncParser::new()),
            Arc::new(ConfigTypeclassRegistry::from_config(&config)),
            &config,
        );
        (spawner, prototypes)
    }

    fn lamp() -> Prototype {
        Prototype {
            prototype_key: Some("lamp".to_string()),
            typeclass: Some("typeclasses.objects.Object".to_string()),
            key: Some("brass lamp".to_string()),
            location: Some("#5".to_string()),
            attrs: vec![AttrSpec {
                key: "fuel".to_string(),
                value: "$add(5, 5)".to_string(),
                category: None,
                locks: String::new(),
            }],
            tags: vec![TagSpec {
                tag: "light".to_string(),
                category: Some("kind".to_string()),
                data: String::new(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_spawn_parses_values_and_applies_defaults() {
        let (spawner, _) = setup().await;

        let obj = spawner.spawn(&lamp(), None).await.unwrap();
        assert_eq!(obj.key, "brass lamp");
        assert_eq!(obj.location.as_deref(), Some("#5"));
        assert_eq!(obj.home.as_deref(), Some("#2"));
        assert_eq!(obj.prototype_key.as_deref(), Some("lamp"));
        assert_eq!(obj.data["attrs"][0]["value"], 10);
        assert_eq!(obj.data["tags"][0]["category"], "kind");
    }

    #[tokio::test]
    async fn test_spawn_location_override_and_key_fallback() {
        let (spawner, _) = setup().await;
        let mut proto = lamp();
        proto.key = None;

        let obj = spawner.spawn(&proto, Some("#9")).await.unwrap();
        assert_eq!(obj.key, "lamp");
        assert_eq!(obj.location.as_deref(), Some("#9"));
    }

    #[tokio::test]
    async fn test_spawn_inherits_from_saved_parent() {
        let (spawner, prototypes) = setup().await;
        prototypes.save_prototype(&lamp()).await.unwrap();

        let child = Prototype {
            prototype_key: Some("oil_lamp".to_string()),
            prototype_parent: Some("lamp".to_string()),
            key: Some("oil lamp".to_string()),
            ..Default::default()
        };
        let obj = spawner.spawn(&child, None).await.unwrap();
        assert_eq!(obj.key, "oil lamp");
        assert_eq!(obj.typeclass, "typeclasses.objects.Object");
        assert_eq!(obj.data["attrs"][0]["key"], "fuel");
        assert_eq!(obj.prototype_key.as_deref(), Some("oil_lamp"));
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_and_mixin() {
        let (spawner, prototypes) = setup().await;

        let bare = Prototype {
            prototype_key: Some("bare".to_string()),
            ..Default::default()
        };
        assert!(matches!(spawner.spawn(&bare, None).await, Err(SpawnError::Invalid(_))));

        prototypes
            .save_prototype(&Prototype {
                prototype_key: Some("glow".to_string()),
                key: Some("glowing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let mixin = Prototype {
            prototype_key: Some("shiny".to_string()),
            prototype_parent: Some("glow".to_string()),
            ..Default::default()
        };
        assert!(matches!(spawner.validate(&mixin).await, Err(SpawnError::Warning(_))));
        assert!(matches!(spawner.spawn(&mixin, None).await, Err(SpawnError::Warning(_))));
    }

    #[tokio::test]
    async fn test_update_objects_with_prototype() {
        let (spawner, _) = setup().await;
        let first = spawner.spawn(&lamp(), Some("#7")).await.unwrap();
        spawner.spawn(&lamp(), None).await.unwrap();

        let mut changed = lamp();
        changed.key = Some("silver lamp".to_string());
        let count = spawner.update_objects_with_prototype(&changed).await.unwrap();
        assert_eq!(count, 2);

        let objects = spawner.objects_with_prototype("lamp").await.unwrap();
        assert!(objects.iter().all(|o| o.key == "silver lamp"));
        let moved = objects.iter().find(|o| o.id == first.id).unwrap();
        assert_eq!(moved.location.as_deref(), Some("#7"));
    }
}
