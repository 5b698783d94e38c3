//! Schema cache keyed by record type

use super::record::{Record, TableSchema};
use crate::Result;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type CachedSchema = Arc<dyn Any + Send + Sync>;

/// Derives and caches [`TableSchema`]s.
///
/// Safe to share between threads. Derivation happens outside the lock and is
/// published first-writer-wins, so racing first accesses for one type all
/// observe the same schema instance.
#[derive(Default)]
pub struct Registry {
    tables: RwLock<HashMap<TypeId, CachedSchema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the schema for `T`, deriving it on first use
    pub fn model<T: Record>(&self) -> Result<Arc<TableSchema<T>>> {
        let key = TypeId::of::<T>();
        if let Some(schema) = self.lookup::<T>(&key) {
            return Ok(schema);
        }

        let derived: CachedSchema = Arc::new(TableSchema::<T>::derive()?);
        let published = {
            // The map is insert-only, so a poisoned lock still holds valid entries.
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(tables.entry(key).or_insert(derived))
        };

        let schema = downcast::<T>(published);
        if let Some(schema) = &schema {
            tracing::debug!(
                table = schema.name(),
                columns = schema.len(),
                "registered table schema"
            );
        }
        schema.ok_or_else(|| crate::Error::InvalidModel {
            model: std::any::type_name::<T>().to_string(),
            reason: "cached schema has a different type".to_string(),
        })
    }

    /// Get the schema for the type of `value`
    pub fn model_of<T: Record>(&self, _value: &T) -> Result<Arc<TableSchema<T>>> {
        self.model::<T>()
    }

    /// Whether `T` has already been derived
    pub fn contains<T: Record>(&self) -> bool {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Number of cached schemas
    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T: Record>(&self, key: &TypeId) -> Option<Arc<TableSchema<T>>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(key).cloned().and_then(downcast::<T>)
    }
}

fn downcast<T: Record>(schema: CachedSchema) -> Option<Arc<TableSchema<T>>> {
    schema.downcast::<TableSchema<T>>().ok()
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("tables", &self.len()).finish()
    }
}
