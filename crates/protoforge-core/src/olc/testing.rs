//! In-memory port implementations for wizard tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use protoforge_types::config::OlcConfig;
use protoforge_types::error::{RepositoryError, SpawnError};
use protoforge_types::object::{Caller, SpawnedObject};
use protoforge_types::prototype::Prototype;

use crate::repository::prototype::PrototypeRepository;
use crate::service::lock::LockChecker;
use crate::service::protfunc::{ParseOutcome, ProtfuncParser};
use crate::service::spawner::{Spawner, flatten_prototype, resolve_parents, validate_prototype};
use crate::service::typeclass::TypeclassRegistry;

use super::wizard::OlcWizard;

#[derive(Clone, Default)]
pub struct MemoryRepo(Arc<Mutex<BTreeMap<String, Prototype>>>);

impl MemoryRepo {
    pub fn insert(&self, prototype: Prototype) {
        let key = prototype.prototype_key.clone().unwrap_or_default().to_lowercase();
        self.0.lock().unwrap().insert(key, prototype);
    }

    pub fn get(&self, key: &str) -> Option<Prototype> {
        self.0.lock().unwrap().get(&key.to_lowercase()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

impl PrototypeRepository for MemoryRepo {
    async fn save_prototype(&self, prototype: &Prototype) -> Result<Prototype, RepositoryError> {
        if prototype.prototype_key.is_none() {
            return Err(RepositoryError::Query("missing prototype_key".to_string()));
        }
        self.insert(prototype.clone());
        Ok(prototype.clone())
    }

    async fn find_prototype(&self, key: &str) -> Result<Option<Prototype>, RepositoryError> {
        Ok(self.get(key))
    }

    async fn list_prototypes(&self) -> Result<Vec<Prototype>, RepositoryError> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }

    async fn delete_prototype(&self, key: &str) -> Result<bool, RepositoryError> {
        Ok(self.0.lock().unwrap().remove(&key.to_lowercase()).is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemoryObjects(Arc<Mutex<Vec<SpawnedObject>>>);

impl MemoryObjects {
    pub fn all(&self) -> Vec<SpawnedObject> {
        self.0.lock().unwrap().clone()
    }
}

pub struct MemorySpawner {
    repo: MemoryRepo,
    objects: MemoryObjects,
    typeclasses: Arc<dyn TypeclassRegistry>,
}

impl Spawner for MemorySpawner {
    async fn validate(&self, prototype: &Prototype) -> Result<(), SpawnError> {
        let parents = resolve_parents(&self.repo, prototype).await?;
        validate_prototype(prototype, &parents, self.typeclasses.as_ref())
    }

    async fn spawn(
        &self,
        prototype: &Prototype,
        location: Option<&str>,
    ) -> Result<SpawnedObject, SpawnError> {
        let parents = resolve_parents(&self.repo, prototype).await?;
        let flat = flatten_prototype(prototype, &parents);
        let mut objects = self.objects.0.lock().unwrap();
        let obj = SpawnedObject {
            id: objects.len() as i64 + 1,
            key: flat.key.clone().unwrap_or_default(),
            typeclass: flat.typeclass.clone().unwrap_or_default(),
            prototype_key: flat.prototype_key.clone(),
            location: location.map(str::to_string).or(flat.location.clone()),
            home: flat.home.clone(),
            destination: flat.destination.clone(),
            data: serde_json::Value::Null,
            created_at: Utc::now(),
        };
        objects.push(obj.clone());
        Ok(obj)
    }

    async fn objects_with_prototype(
        &self,
        prototype_key: &str,
    ) -> Result<Vec<SpawnedObject>, SpawnError> {
        Ok(self
            .objects
            .all()
            .into_iter()
            .filter(|o| o.prototype_key.as_deref() == Some(prototype_key))
            .collect())
    }

    async fn update_objects_with_prototype(&self, prototype: &Prototype) -> Result<usize, SpawnError> {
        let key = prototype.prototype_key.as_deref();
        let mut objects = self.objects.0.lock().unwrap();
        let mut count = 0;
        for obj in objects.iter_mut().filter(|o| o.prototype_key.as_deref() == key) {
            obj.key = prototype.key.clone().unwrap_or_default();
            count += 1;
        }
        Ok(count)
    }
}

/// Parses JSON literals; anything else stays a string. Unclosed brackets
/// produce a warning.
pub struct LiteralParser;

impl ProtfuncParser for LiteralParser {
    fn parse(&self, value: &str, _prototype: Option<&Prototype>, _testing: bool) -> ParseOutcome {
        match serde_json::from_str(value) {
            Ok(parsed) => ParseOutcome {
                value: parsed,
                warning: None,
            },
            Err(err) => ParseOutcome {
                value: serde_json::Value::String(value.to_string()),
                warning: value
                    .trim_start()
                    .starts_with(['[', '{'])
                    .then(|| err.to_string()),
            },
        }
    }
}

/// Understands `all()`, `none()` and `id(n)` per access type.
pub struct SimpleLocks;

impl LockChecker for SimpleLocks {
    fn check(&self, caller: &Caller, lockstring: &str, access_type: &str) -> bool {
        if lockstring.trim().is_empty() {
            return true;
        }
        lockstring
            .split(';')
            .filter_map(|part| part.split_once(':'))
            .filter(|(access, _)| access.trim() == access_type)
            .any(|(_, expr)| {
                expr.split(" or ").any(|func| {
                    let func = func.trim();
                    func == "all()" || func == format!("id({})", caller.id)
                })
            })
    }

    fn validate(&self, lockstring: &str) -> Result<(), String> {
        for part in lockstring.split(';').filter(|p| !p.trim().is_empty()) {
            if !part.contains(':') {
                return Err(format!("missing access type in '{}'", part.trim()));
            }
        }
        Ok(())
    }
}

pub struct ConfigTypeclasses(OlcConfig);

impl TypeclassRegistry for ConfigTypeclasses {
    fn all_typeclasses(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.0.typeclasses.iter().map(|t| t.path.clone()).collect();
        paths.sort();
        paths
    }

    fn docstring(&self, path: &str) -> Option<String> {
        self.0
            .typeclasses
            .iter()
            .find(|t| t.path == path)
            .map(|t| t.doc.clone())
    }
}

pub fn test_wizard() -> (OlcWizard<MemoryRepo, MemorySpawner>, MemoryRepo) {
    test_wizard_with(OlcConfig::default())
}

pub fn test_wizard_with(config: OlcConfig) -> (OlcWizard<MemoryRepo, MemorySpawner>, MemoryRepo) {
    build(config, MemoryObjects::default())
}

pub fn test_wizard_with_objects(
    objects: MemoryObjects,
) -> (OlcWizard<MemoryRepo, MemorySpawner>, MemoryRepo) {
    build(OlcConfig::default(), objects)
}

fn build(
    config: OlcConfig,
    objects: MemoryObjects,
) -> (OlcWizard<MemoryRepo, MemorySpawner>, MemoryRepo) {
    let repo = MemoryRepo::default();
    let typeclasses: Arc<dyn TypeclassRegistry> = Arc::new(ConfigTypeclasses(config.clone()));
    let spawner = MemorySpawner {
        repo: repo.clone(),
        objects,
        typeclasses: typeclasses.clone(),
    };
    let wizard = OlcWizard::new(
        repo.clone(),
        spawner,
        Arc::new(LiteralParser),
        Arc::new(SimpleLocks),
        typeclasses,
        config,
    );
    (wizard, repo)
}
