//! Spawner trait plus the prototype validation and inheritance rules that
//! every spawner implementation shares.

use std::collections::HashSet;
use std::future::Future;

use protoforge_types::error::SpawnError;
use protoforge_types::object::SpawnedObject;
use protoforge_types::prototype::Prototype;

use crate::repository::prototype::PrototypeRepository;
use crate::service::typeclass::TypeclassRegistry;

/// Instantiates objects from prototypes.
pub trait Spawner: Send + Sync {
    /// Check that a prototype could be spawned, without spawning it.
    ///
    /// Returns `SpawnError::Invalid` for blocking errors and
    /// `SpawnError::Warning` for usable-with-caveats prototypes.
    fn validate(
        &self,
        prototype: &Prototype,
    ) -> impl Future<Output = Result<(), SpawnError>> + Send;

    /// Spawn one object. `location` overrides the prototype's own location.
    fn spawn(
        &self,
        prototype: &Prototype,
        location: Option<&str>,
    ) -> impl Future<Output = Result<SpawnedObject, SpawnError>> + Send;

    /// All objects previously spawned from the prototype with this key.
    fn objects_with_prototype(
        &self,
        prototype_key: &str,
    ) -> impl Future<Output = Result<Vec<SpawnedObject>, SpawnError>> + Send;

    /// Re-apply a prototype to every object spawned from it.
    ///
    /// Returns the number of objects changed.
    fn update_objects_with_prototype(
        &self,
        prototype: &Prototype,
    ) -> impl Future<Output = Result<usize, SpawnError>> + Send;
}

/// Walk the `prototype_parent` chain, nearest parent first.
///
/// Fails on a parent that is not saved or on a cycle.
pub async fn resolve_parents<R: PrototypeRepository>(
    repo: &R,
    prototype: &Prototype,
) -> Result<Vec<Prototype>, SpawnError> {
    let key = prototype.key_or_unset().to_string();
    let mut seen = HashSet::new();
    if let Some(own) = &prototype.prototype_key {
        seen.insert(own.to_lowercase());
    }

    let mut chain = Vec::new();
    let mut next = prototype.prototype_parent.clone();
    while let Some(parent_key) = next {
        let parent_key = parent_key.to_lowercase();
        if !seen.insert(parent_key.clone()) {
            return Err(SpawnError::Invalid(format!(
                "Prototype {key} has infinite nesting of prototypes."
            )));
        }
        let parent = repo.find_prototype(&parent_key).await?.ok_or_else(|| {
            SpawnError::Invalid(format!(
                "Prototype {key}'s prototype_parent '{parent_key}' was not found."
            ))
        })?;
        next = parent.prototype_parent.clone();
        chain.push(parent);
    }
    Ok(chain)
}

/// Validate a prototype given its resolved parent chain.
pub fn validate_prototype(
    prototype: &Prototype,
    parents: &[Prototype],
    typeclasses: &dyn TypeclassRegistry,
) -> Result<(), SpawnError> {
    let Some(key) = prototype.prototype_key.as_deref() else {
        return Err(SpawnError::Invalid(
            "Prototype lacks a `prototype_key`.".to_string(),
        ));
    };

    if prototype.typeclass.is_none() && prototype.prototype_parent.is_none() {
        return Err(SpawnError::Invalid(format!(
            "Prototype {key} requires `typeclass` or `prototype_parent`."
        )));
    }

    let typeclass = std::iter::once(prototype)
        .chain(parents.iter())
        .find_map(|p| p.typeclass.as_deref());

    match typeclass {
        Some(path) if !typeclasses.contains(path) => Err(SpawnError::Invalid(format!(
            "Prototype {key} is based on typeclass {path}, which is not registered."
        ))),
        Some(_) => Ok(()),
        None => Err(SpawnError::Warning(format!(
            "Prototype {key} can only be used as a mixin since it lacks a typeclass or a \
             prototype_parent that is not itself a mixin."
        ))),
    }
}

/// Overlay `child` on `parent`.
///
/// Set child values win; empty child lists inherit the parent's; attributes
/// and tags merge by name with the child's entry taking precedence.
/// `prototype_*` fields always come from the child.
pub fn merge_prototypes(parent: &Prototype, child: &Prototype) -> Prototype {
    let pick = |c: &Option<String>, p: &Option<String>| c.clone().or_else(|| p.clone());
    let pick_list = |c: &Vec<String>, p: &Vec<String>| {
        if c.is_empty() { p.clone() } else { c.clone() }
    };

    let mut merged = Prototype {
        prototype_key: child.prototype_key.clone(),
        prototype_parent: child.prototype_parent.clone(),
        prototype_desc: child.prototype_desc.clone(),
        prototype_tags: child.prototype_tags.clone(),
        prototype_locks: child.prototype_locks.clone(),
        typeclass: pick(&child.typeclass, &parent.typeclass),
        key: pick(&child.key, &parent.key),
        aliases: pick_list(&child.aliases, &parent.aliases),
        attrs: parent.attrs.clone(),
        tags: parent.tags.clone(),
        locks: pick(&child.locks, &parent.locks),
        permissions: pick_list(&child.permissions, &parent.permissions),
        location: pick(&child.location, &parent.location),
        home: pick(&child.home, &parent.home),
        destination: pick(&child.destination, &parent.destination),
    };
    for attr in &child.attrs {
        merged.upsert_attr(attr.clone());
    }
    for tag in &child.tags {
        merged.upsert_tag(tag.clone());
    }
    merged
}

/// Apply a resolved parent chain (nearest first) to a prototype.
pub fn flatten_prototype(prototype: &Prototype, parents: &[Prototype]) -> Prototype {
    let mut base: Option<Prototype> = None;
    for parent in parents.iter().rev() {
        base = Some(match base {
            Some(b) => merge_prototypes(&b, parent),
            None => parent.clone(),
        });
    }
    match base {
        Some(b) => merge_prototypes(&b, prototype),
        None => prototype.clone(),
    }
}
