//! Model definitions.

use std::collections::HashSet;

use super::field::FieldDef;
use super::relation::{DeleteBehavior, RelationDef, RelationType};
use crate::builder::where_unique::collect_unique_slots;
use crate::config::EngineConfig;
use crate::error::DeclarationError;

/// A uniqueness constraint or index spanning an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundConstraint {
    /// Member field names, in order.
    pub fields: Vec<String>,
    /// Explicit name.
    pub name: Option<String>,
}

impl CompoundConstraint {
    /// Create an unnamed constraint.
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            name: None,
        }
    }

    /// Create a named constraint.
    pub fn named<S: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            name: Some(name.into()),
        }
    }

    /// The explicit name, else the member fields joined by `_`.
    pub fn effective_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.fields.join("_"),
        }
    }
}

/// A model definition.
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model name (unique within a registry).
    pub name: String,
    /// Scalar fields, in declaration order.
    pub fields: Vec<FieldDef>,
    /// Relations, in declaration order.
    pub relations: Vec<RelationDef>,
    /// Identifier spanning several fields.
    pub compound_id: Option<CompoundConstraint>,
    /// Uniqueness constraints spanning several fields.
    pub compound_uniques: Vec<CompoundConstraint>,
    /// Secondary indexes.
    pub indexes: Vec<CompoundConstraint>,
    /// Fields left out of results by default.
    pub omit: Vec<String>,
}

impl ModelDef {
    /// Create a new model definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            compound_id: None,
            compound_uniques: Vec::new(),
            indexes: Vec::new(),
            omit: Vec::new(),
        }
    }

    /// Add a field to the model.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a relation.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Set the compound identifier.
    pub fn with_compound_id(mut self, constraint: CompoundConstraint) -> Self {
        self.compound_id = Some(constraint);
        self
    }

    /// Add a compound uniqueness constraint.
    pub fn with_compound_unique(mut self, constraint: CompoundConstraint) -> Self {
        self.compound_uniques.push(constraint);
        self
    }

    /// Add an index.
    pub fn with_index(mut self, index: CompoundConstraint) -> Self {
        self.indexes.push(index);
        self
    }

    /// Omit a field from results by default.
    pub fn with_omit(mut self, field: impl Into<String>) -> Self {
        self.omit.push(field.into());
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a relation by name.
    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Scalar field names in declaration order.
    pub fn scalar_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Names of non-list numeric fields.
    pub fn numeric_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.kind.is_numeric() && !f.array)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Check the structural rules of a declaration.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), DeclarationError> {
        if self.name.trim().is_empty() {
            return Err(DeclarationError::EmptyModelName);
        }

        let mut field_names = HashSet::new();
        for field in &self.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(DeclarationError::DuplicateField(field.name.clone()));
            }
        }

        let mut relation_names = HashSet::new();
        for relation in &self.relations {
            if field_names.contains(relation.name.as_str()) {
                return Err(DeclarationError::RelationShadowsField(relation.name.clone()));
            }
            if !relation_names.insert(relation.name.as_str()) {
                return Err(DeclarationError::DuplicateRelation(relation.name.clone()));
            }
        }

        let mut ids: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.id)
            .map(|f| f.name.clone())
            .collect();
        if let Some(compound) = &self.compound_id {
            ids.push(compound.effective_name());
        }
        if ids.len() > 1 {
            return Err(DeclarationError::MultipleIds(ids));
        }
        if let Some(field) = self.fields.iter().find(|f| f.id && f.nullable) {
            return Err(DeclarationError::NullableId(field.name.clone()));
        }

        let constraints = self
            .compound_id
            .iter()
            .map(|c| ("compound id", c))
            .chain(self.compound_uniques.iter().map(|c| ("compound unique", c)))
            .chain(self.indexes.iter().map(|c| ("index", c)));
        for (kind, constraint) in constraints {
            let context = format!("{} '{}'", kind, constraint.effective_name());
            if constraint.fields.is_empty() {
                return Err(DeclarationError::EmptyConstraint(context));
            }
            for field in &constraint.fields {
                if !field_names.contains(field.as_str()) {
                    return Err(DeclarationError::UnknownField {
                        context,
                        field: field.clone(),
                    });
                }
            }
        }

        for field in &self.omit {
            if !field_names.contains(field.as_str()) {
                return Err(DeclarationError::UnknownField {
                    context: "omit list".into(),
                    field: field.clone(),
                });
            }
        }

        for relation in &self.relations {
            let Some(fk) = relation.foreign_key.as_deref() else {
                continue;
            };
            if relation.relation_type == RelationType::ManyToOne && !field_names.contains(fk) {
                return Err(DeclarationError::UnknownField {
                    context: format!("foreign key of relation '{}'", relation.name),
                    field: fk.to_string(),
                });
            }
        }

        for relation in &self.relations {
            if relation.on_delete != DeleteBehavior::SetNull {
                continue;
            }
            let local_key = relation
                .foreign_key
                .as_deref()
                .and_then(|fk| self.get_field(fk));
            if let Some(field) = local_key {
                if !field.nullable {
                    return Err(DeclarationError::SetNullOnRequired {
                        relation: relation.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        if config.reject_compound_name_collisions {
            if let Some(name) = collect_unique_slots(self).collisions.into_iter().next() {
                return Err(DeclarationError::CompoundNameCollision(name));
            }
        }

        Ok(())
    }
}
