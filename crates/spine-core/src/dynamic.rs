//! Schema-driven resource with map-backed field storage.
//!
//! Used for resource types declared at runtime (e.g. from a schema file)
//! rather than as Rust structs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::field::ResourceSchema;
use crate::resource::{check_value, Resource, ResourceCore, Value};

#[derive(Debug, Clone)]
pub struct DynamicResource {
    schema: Arc<ResourceSchema>,
    core: ResourceCore,
    values: HashMap<String, Value>,
}

impl DynamicResource {
    #[must_use]
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        Self {
            schema,
            core: ResourceCore::default(),
            values: HashMap::new(),
        }
    }

    /// Set values in bulk; convenient for building resources in code.
    ///
    /// # Errors
    ///
    /// Fails on the first value that does not fit its field.
    pub fn with_values<I, K>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (field, value) in values {
            self.set_value(field.as_ref(), Some(value))?;
        }
        Ok(self)
    }
}

impl Resource for DynamicResource {
    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn core(&self) -> &ResourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ResourceCore {
        &mut self.core
    }

    fn value(&self, field: &str) -> Option<Value> {
        self.values.get(field).cloned()
    }

    fn set_value(&mut self, field: &str, value: Option<Value>) -> Result<()> {
        match value {
            Some(value) => {
                check_value(&self.schema, field, &value)?;
                self.values.insert(field.to_string(), value);
            }
            None => {
                self.values.remove(field);
            }
        }
        Ok(())
    }
}
