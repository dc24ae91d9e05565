//! relschema client API.
//!
//! The client owns a model registry: declare every model, hydrate once, then
//! validate request payloads by model name and operation.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use relschema_core::catalog::Model;
use relschema_core::{
    EngineConfig, HydrationReport, ModelDef, ModelRegistry, ModelResolver, Operation,
};

use crate::error::Error;

/// Validates request payloads against a declared model graph.
#[derive(Debug, Clone, Default)]
pub struct Client {
    registry: ModelRegistry,
}

impl Client {
    /// Create a client with an empty model graph.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: ModelRegistry::new(config),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// A deferred reference to a model, for relation targets.
    pub fn resolver(&self, model: impl Into<String>) -> ModelResolver {
        self.registry.resolver(model)
    }

    /// Declare a model.
    pub fn declare(&self, def: ModelDef) -> Result<Arc<Model>, Error> {
        Ok(self.registry.declare(def)?)
    }

    /// Resolve the whole graph and build every bundle. Call once after the
    /// last declaration.
    pub fn hydrate(&self) -> Result<HydrationReport, Error> {
        Ok(self.registry.hydrate()?)
    }

    /// Look up a declared model.
    pub fn model(&self, name: &str) -> Result<Arc<Model>, Error> {
        Ok(self.registry.model(name)?)
    }

    /// Validate the arguments of `operation` on `model`, returning them
    /// normalized.
    pub fn validate(
        &self,
        model: &str,
        operation: Operation,
        payload: &Value,
    ) -> Result<Value, Error> {
        let target = self.model(model)?;
        target.validate(operation, payload).map_err(|failure| {
            debug!(
                model,
                operation = %operation,
                issues = failure.issues().len(),
                "payload rejected"
            );
            Error::Validation {
                model: model.to_string(),
                operation,
                failure,
            }
        })
    }

    /// Like [`Client::validate`], with the operation given by name
    /// (`"findMany"`, `"groupBy"`, ...).
    pub fn validate_named(
        &self,
        model: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, Error> {
        let operation: Operation = operation.parse()?;
        self.validate(model, operation, payload)
    }
}
