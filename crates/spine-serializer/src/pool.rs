//! Resource pool: the arena that owns every resource of one deserialization.
//!
//! Each `(type, id)` pair occupies at most one slot. Relationships refer to
//! pooled resources by [`ResourceIdentifier`], so shared references and
//! cycles need no shared ownership.

use std::ops::{Index, IndexMut};

use spine_core::{Resource, ResourceIdentifier};

/// Index of a resource inside its [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(usize);

impl ResourceHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct ResourcePool {
    resources: Vec<Box<dyn Resource>>,
    /// The first `mapping_targets` slots hold caller-supplied instances.
    mapping_targets: usize,
}

impl ResourcePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pool with caller-owned instances to populate in place.
    #[must_use]
    pub fn with_mapping_targets(targets: Vec<Box<dyn Resource>>) -> Self {
        Self {
            mapping_targets: targets.len(),
            resources: targets,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn push(&mut self, resource: Box<dyn Resource>) -> ResourceHandle {
        self.resources.push(resource);
        ResourceHandle(self.resources.len() - 1)
    }

    #[must_use]
    pub fn get(&self, handle: ResourceHandle) -> Option<&dyn Resource> {
        self.resources.get(handle.0).map(|r| &**r as &dyn Resource)
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut dyn Resource> {
        self.resources
            .get_mut(handle.0)
            .map(|r| &mut **r as &mut dyn Resource)
    }

    /// Downcast a pooled resource to its concrete type.
    #[must_use]
    pub fn get_as<T: Resource>(&self, handle: ResourceHandle) -> Option<&T> {
        self.get(handle)?.as_any().downcast_ref::<T>()
    }

    pub fn get_as_mut<T: Resource>(&mut self, handle: ResourceHandle) -> Option<&mut T> {
        self.get_mut(handle)?.as_any_mut().downcast_mut::<T>()
    }

    /// Handle of the resource with this type and id.
    #[must_use]
    pub fn find(&self, resource_type: &str, id: &str) -> Option<ResourceHandle> {
        self.resources
            .iter()
            .position(|r| r.resource_type() == resource_type && r.id() == Some(id))
            .map(ResourceHandle)
    }

    #[must_use]
    pub fn find_identifier(&self, identifier: &ResourceIdentifier) -> Option<ResourceHandle> {
        self.find(&identifier.resource_type, &identifier.id)
    }

    /// Resolve linkage to the pooled resource.
    #[must_use]
    pub fn resolve(&self, identifier: &ResourceIdentifier) -> Option<&dyn Resource> {
        self.find_identifier(identifier).and_then(|h| self.get(h))
    }

    /// The `index`-th caller-supplied mapping target of `resource_type`, if
    /// it is still unclaimed.
    ///
    /// A target that carries an id has been claimed already, either by the
    /// caller or by an earlier dispense in this pass, and is never
    /// re-identified.
    #[must_use]
    pub fn mapping_target(&self, resource_type: &str, index: usize) -> Option<ResourceHandle> {
        self.resources[..self.mapping_targets]
            .iter()
            .enumerate()
            .filter(|(_, r)| r.resource_type() == resource_type)
            .nth(index)
            .filter(|(_, r)| r.id().is_none())
            .map(|(i, _)| ResourceHandle(i))
    }

    pub fn handles(&self) -> impl Iterator<Item = ResourceHandle> {
        (0..self.resources.len()).map(ResourceHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle, &dyn Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceHandle(i), &**r as &dyn Resource))
    }

    /// Give up the pool, returning every resource in slot order.
    #[must_use]
    pub fn into_resources(self) -> Vec<Box<dyn Resource>> {
        self.resources
    }
}

/// Handles are only minted by the pool that owns the slot, so indexing
/// with one never goes out of bounds.
impl Index<ResourceHandle> for ResourcePool {
    type Output = dyn Resource;

    fn index(&self, handle: ResourceHandle) -> &Self::Output {
        &*self.resources[handle.0]
    }
}

impl IndexMut<ResourceHandle> for ResourcePool {
    fn index_mut(&mut self, handle: ResourceHandle) -> &mut Self::Output {
        &mut *self.resources[handle.0]
    }
}
