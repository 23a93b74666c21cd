//! Catalog: Schema management for relations
//!
//! Tracks schemas (column names and types) for all relations in the database.
//! Used by IR builder to resolve variable positions and for schema validation.

use std::collections::HashMap;
use crate::value::{TupleSchema, DataType, Tuple, SchemaValidationError};

/// Catalog tracks schemas for all relations
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Map from relation name to schema (column names only - for backward compatibility)
    schemas: HashMap<String, Vec<String>>,
    /// Map from relation name to typed schema (column names + types)
    typed_schemas: HashMap<String, TupleSchema>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Catalog {
            schemas: HashMap::new(),
            typed_schemas: HashMap::new(),
        }
    }

    /// Register a relation with its schema (column names only)
    /// For backward compatibility - types will default to Int32
    pub fn register_relation(&mut self, relation: String, schema: Vec<String>) {
        // Also create a typed schema with default Int32 types
        let typed_schema = TupleSchema::from_names(schema.clone());
        self.typed_schemas.insert(relation.clone(), typed_schema);
        self.schemas.insert(relation, schema);
    }

    /// Register a relation with a fully typed schema
    pub fn register_typed_relation(&mut self, relation: String, typed_schema: TupleSchema) {
        // Extract column names for backward compatibility
        let names: Vec<String> = typed_schema.field_names().iter().map(|s| s.to_string()).collect();
        self.schemas.insert(relation.clone(), names);
        self.typed_schemas.insert(relation, typed_schema);
    }

    /// Get schema for a relation (column names only)
    pub fn get_schema(&self, relation: &str) -> Option<&[String]> {
        self.schemas.get(relation).map(|v| v.as_slice())
    }

    /// Get typed schema for a relation
    pub fn get_typed_schema(&self, relation: &str) -> Option<&TupleSchema> {
        self.typed_schemas.get(relation)
    }

    /// Check if a relation exists
    pub fn has_relation(&self, relation: &str) -> bool {
        self.schemas.contains_key(relation)
    }

    /// Get all registered relations
    pub fn all_relations(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    /// Find position of a variable in a schema
    pub fn find_variable_position(&self, relation: &str, var: &str) -> Option<usize> {
        self.get_schema(relation)?
            .iter()
            .position(|v| v == var)
    }

    /// Get the type of a column in a relation
    pub fn get_column_type(&self, relation: &str, column: &str) -> Option<&DataType> {
        let schema = self.typed_schemas.get(relation)?;
        let idx = schema.field_index(column)?;
        schema.field_type(idx)
    }

    /// Validate a tuple against a relation's schema
    pub fn validate_tuple(&self, relation: &str, tuple: &Tuple) -> Result<(), SchemaValidationError> {
        if let Some(schema) = self.typed_schemas.get(relation) {
            schema.validate(tuple)
        } else {
            // No schema registered - allow any tuple
            Ok(())
        }
    }

    /// Validate multiple tuples against a relation's schema
    pub fn validate_tuples(&self, relation: &str, tuples: &[Tuple]) -> Result<(), SchemaValidationError> {
        if let Some(schema) = self.typed_schemas.get(relation) {
            for tuple in tuples {
                schema.validate(tuple)?;
            }
        }
        Ok(())
    }

    /// Infer and update schema types from actual data
    /// Useful when schema was created with default types
    pub fn infer_types_from_tuples(&mut self, relation: &str, tuples: &[Tuple]) {
        if tuples.is_empty() {
            return;
        }

        // Infer types from first tuple
        let first = &tuples[0];
        let fields: Vec<(String, DataType)> = if let Some(names) = self.schemas.get(relation) {
            names.iter().enumerate().map(|(i, name)| {
                let dtype = first.get(i)
                    .map(|v| v.data_type())
                    .unwrap_or(DataType::Null);
                (name.clone(), dtype)
            }).collect()
        } else {
            // No schema - create anonymous column names
            (0..first.arity()).map(|i| {
                let dtype = first.get(i)
                    .map(|v| v.data_type())
                    .unwrap_or(DataType::Null);
                (format!("col{}", i), dtype)
            }).collect()
        };

        let typed_schema = TupleSchema::new(fields);
        self.typed_schemas.insert(relation.to_string(), typed_schema);
    }

    /// Infer join keys between two relations based on shared variables
    pub fn infer_join_keys(
        &self,
        left_schema: &[String],
        right_schema: &[String],
        shared_vars: &[String],
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left_keys = Vec::new();
        let mut right_keys = Vec::new();

        for var in shared_vars {
            if let Some(left_pos) = left_schema.iter().position(|v| v == var) {
                if let Some(right_pos) = right_schema.iter().position(|v| v == var) {
                    left_keys.push(left_pos);
                    right_keys.push(right_pos);
                }
            }
        }

        (left_keys, right_keys)
    }

    /// Clear all registered schemas
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.typed_schemas.clear();
    }

    /// Remove a specific relation from the catalog
    pub fn unregister_relation(&mut self, relation: &str) {
        self.schemas.remove(relation);
        self.typed_schemas.remove(relation);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
