//! Model registry: the arena every relation resolver points into.
//!
//! Models are declared into a [`ModelRegistry`] and stored as `Arc<Model>`.
//! Relations reach their targets through [`ModelResolver`]s holding a `Weak`
//! handle to the registry, so cyclic model graphs never form reference
//! cycles and never require a declaration order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, trace};

use super::model::ModelDef;
use super::relation::ModelResolver;
use crate::builder::{build_scalar_schemas, Operation, ScalarSchemas, SchemaBundle};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::schema::{Schema, ValidationFailure};

/// Lifecycle of a model or of the whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Declared; some relation targets were never dereferenced.
    Declared,
    /// Every relation target dereferenced successfully at least once.
    Resolved,
}

/// A declared model together with its lazily built schemas.
pub struct Model {
    def: ModelDef,
    config: Arc<EngineConfig>,
    scalar: OnceLock<Arc<ScalarSchemas>>,
    bundle: OnceLock<Arc<SchemaBundle>>,
    create_variants: DashMap<String, Schema>,
    resolved: AtomicBool,
}

impl Model {
    pub(crate) fn new(def: ModelDef, config: Arc<EngineConfig>) -> Self {
        let resolved = def.relations.is_empty();
        Self {
            def,
            config,
            scalar: OnceLock::new(),
            bundle: OnceLock::new(),
            create_variants: DashMap::new(),
            resolved: AtomicBool::new(resolved),
        }
    }

    /// The declaration.
    pub fn def(&self) -> &ModelDef {
        &self.def
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Engine configuration the model was declared with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModelState {
        if self.resolved.load(Ordering::Acquire) {
            ModelState::Resolved
        } else {
            ModelState::Declared
        }
    }

    /// Phase-1 schemas, built from the model's own fields only.
    pub fn scalar_schemas(&self) -> Arc<ScalarSchemas> {
        Arc::clone(
            self.scalar
                .get_or_init(|| Arc::new(build_scalar_schemas(&self.def, &self.config))),
        )
    }

    /// The schema bundle. The first call builds it; concurrent first calls
    /// wait for that single build, and every call returns the same `Arc`.
    pub fn bundle(&self) -> Arc<SchemaBundle> {
        let bundle = Arc::clone(self.bundle.get_or_init(|| {
            let scalar = self.scalar_schemas();
            Arc::new(SchemaBundle::build(&self.def, &scalar, &self.config))
        }));
        if self.state() == ModelState::Declared {
            if let Err(e) = self.try_resolve() {
                trace!(model = %self.def.name, error = %e, "model not yet resolved");
            }
        }
        bundle
    }

    /// Whether the bundle has been built.
    pub fn is_built(&self) -> bool {
        self.bundle.get().is_some()
    }

    /// Dereference every relation target once. On success the model moves
    /// to `Resolved`; returns the number of relations dereferenced.
    pub fn try_resolve(&self) -> Result<usize, Error> {
        for relation in &self.def.relations {
            if relation.target.resolve().is_none() {
                return Err(Error::UnresolvedRelation {
                    model: self.def.name.clone(),
                    relation: relation.name.clone(),
                    target: relation.target_name().to_string(),
                });
            }
        }
        if !self.resolved.swap(true, Ordering::AcqRel) {
            debug!(model = %self.def.name, "model resolved");
        }
        Ok(self.def.relations.len())
    }

    /// Relation-aware create input without the given foreign-key field and
    /// the relations backed by it. Used for nested creates where the parent
    /// supplies the key. Variants are cached per field.
    pub fn create_input_without(&self, foreign_key: &str) -> Schema {
        if let Some(schema) = self.create_variants.get(foreign_key) {
            return schema.clone();
        }
        let bundle = self.bundle();
        self.create_variants
            .entry(foreign_key.to_string())
            .or_insert_with(|| bundle.create_input_without(foreign_key))
            .clone()
    }

    /// Validate a payload for an operation on this model.
    pub fn validate(&self, operation: Operation, payload: &Value) -> Result<Value, ValidationFailure> {
        self.bundle().validate(operation, payload)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.def.name)
            .field("state", &self.state())
            .field("built", &self.is_built())
            .finish()
    }
}

/// Summary of a successful hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationReport {
    /// Number of models in the graph.
    pub models: usize,
    /// Number of relations dereferenced.
    pub relations: usize,
    /// Bundles built by this hydration (excludes already cached ones).
    pub bundles_built: usize,
}

struct RegistryInner {
    models: RwLock<IndexMap<String, Arc<Model>>>,
    config: Arc<EngineConfig>,
    sealed: AtomicBool,
}

/// Process-wide model graph.
#[derive(Clone)]
pub struct ModelRegistry {
    inner: Arc<RegistryInner>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                models: RwLock::new(IndexMap::new()),
                config: Arc::new(config),
                sealed: AtomicBool::new(false),
            }),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// A deferred reference to a model that may not be declared yet.
    pub fn resolver(&self, name: impl Into<String>) -> ModelResolver {
        let name = name.into();
        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let key = name.clone();
        ModelResolver::new(name, move || {
            let inner = registry.upgrade()?;
            let models = inner.models.read();
            models.get(&key).cloned()
        })
    }

    /// Declare a model. Structural violations fail here, immediately.
    pub fn declare(&self, def: ModelDef) -> Result<Arc<Model>, Error> {
        if self.is_sealed() {
            return Err(Error::RegistrySealed);
        }
        def.validate(&self.inner.config)
            .map_err(|source| Error::Declaration {
                model: def.name.clone(),
                source,
            })?;

        let mut models = self.inner.models.write();
        if models.contains_key(&def.name) {
            return Err(Error::DuplicateModel(def.name));
        }
        let name = def.name.clone();
        let model = Arc::new(Model::new(def, Arc::clone(&self.inner.config)));
        models.insert(name.clone(), Arc::clone(&model));
        debug!(model = %name, "model declared");
        Ok(model)
    }

    /// Get a model by name.
    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        self.inner.models.read().get(name).cloned()
    }

    /// Get a model by name, failing if it is not declared.
    pub fn model(&self, name: &str) -> Result<Arc<Model>, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Declared model names, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.models.read().keys().cloned().collect()
    }

    /// Number of declared models.
    pub fn len(&self) -> usize {
        self.inner.models.read().len()
    }

    /// Whether no model is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether hydration sealed the registry.
    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }

    /// `Resolved` once every declared model is resolved.
    pub fn state(&self) -> ModelState {
        let models = self.snapshot();
        if !models.is_empty() && models.iter().all(|m| m.state() == ModelState::Resolved) {
            ModelState::Resolved
        } else {
            ModelState::Declared
        }
    }

    /// Dereference every relation, build every bundle and seal the registry.
    /// Run once the whole graph is declared.
    pub fn hydrate(&self) -> Result<HydrationReport, Error> {
        let models = self.snapshot();

        let mut relations = 0;
        for model in &models {
            relations += model.try_resolve()?;
        }

        let mut bundles_built = 0;
        for model in &models {
            if !model.is_built() {
                bundles_built += 1;
            }
            model.bundle();
        }

        self.inner.sealed.store(true, Ordering::Release);
        info!(
            models = models.len(),
            relations, bundles_built, "model graph hydrated"
        );

        Ok(HydrationReport {
            models: models.len(),
            relations,
            bundles_built,
        })
    }

    fn snapshot(&self) -> Vec<Arc<Model>> {
        self.inner.models.read().values().cloned().collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
