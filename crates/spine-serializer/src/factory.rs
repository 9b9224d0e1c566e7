//! Resource factory: type registry and pool-aware dispensing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spine_core::Resource;
use tracing::debug;

use crate::error::{Result, SerializerError};
use crate::pool::{ResourceHandle, ResourcePool};

/// Builds an empty instance of one resource type.
pub type Constructor = Arc<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// Maps resource type names to constructors.
///
/// Populate it once before deserializing; lookups take `&self` and are safe
/// to share across threads.
#[derive(Clone, Default)]
pub struct ResourceFactory {
    constructors: HashMap<String, Constructor>,
}

impl fmt::Debug for ResourceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceFactory")
            .field("types", &self.registered_types())
            .finish()
    }
}

impl ResourceFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statically typed resource under the type name its
    /// default instance reports.
    pub fn register_resource<T>(&mut self)
    where
        T: Resource + Default,
    {
        let resource_type = T::default().resource_type().to_string();
        self.register(resource_type, || Box::new(T::default()));
    }

    /// Register a constructor for `resource_type`, replacing any previous one.
    pub fn register<F>(&mut self, resource_type: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
    {
        let resource_type = resource_type.into();
        if self
            .constructors
            .insert(resource_type.clone(), Arc::new(constructor))
            .is_some()
        {
            debug!(%resource_type, "replaced resource constructor");
        }
    }

    #[must_use]
    pub fn is_registered(&self, resource_type: &str) -> bool {
        self.constructors.contains_key(resource_type)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Construct an empty instance of `resource_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::ResourceTypeUnregistered`] for unknown types.
    pub fn instantiate(&self, resource_type: &str) -> Result<Box<dyn Resource>> {
        let constructor = self
            .constructors
            .get(resource_type)
            .ok_or_else(|| SerializerError::ResourceTypeUnregistered(resource_type.to_string()))?;
        Ok(constructor())
    }

    /// Return the pooled instance for `(resource_type, id)`, creating it if needed.
    ///
    /// Lookup order:
    /// 1. a pooled resource with the same type and id
    /// 2. with `index`, the `index`-th mapping target of that type, as long as
    ///    it has no id yet (it is then identified as `id`)
    /// 3. a fresh instance with `id`, appended to the pool
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::ResourceTypeUnregistered`] when a fresh
    /// instance is needed for an unknown type.
    pub fn dispense(
        &self,
        resource_type: &str,
        id: &str,
        pool: &mut ResourcePool,
        index: Option<usize>,
    ) -> Result<ResourceHandle> {
        if let Some(handle) = pool.find(resource_type, id) {
            return Ok(handle);
        }

        if let Some(handle) = index.and_then(|i| pool.mapping_target(resource_type, i)) {
            debug!(resource_type, id, ?index, "dispensing mapping target");
            if let Some(target) = pool.get_mut(handle) {
                target.set_id(Some(id.to_string()));
            }
            return Ok(handle);
        }

        let mut resource = self.instantiate(resource_type)?;
        resource.set_id(Some(id.to_string()));
        Ok(pool.push(resource))
    }
}
