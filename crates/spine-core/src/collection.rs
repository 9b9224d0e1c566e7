//! Resource collections: list responses and to-many relationships.
//!
//! Members are held by [`ResourceIdentifier`] and resolved against the
//! resource pool that produced them, so a collection never owns the
//! resources it lists.

use url::Url;

use crate::resource::ResourceIdentifier;

/// An ordered, identity-aware set of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCollection {
    /// True once the member list reflects the server state.
    pub is_loaded: bool,
    /// Where the members can be fetched from.
    pub resources_url: Option<Url>,
    pub next_url: Option<Url>,
    pub previous_url: Option<Url>,
    resources: Vec<ResourceIdentifier>,
}

impl ResourceCollection {
    #[must_use]
    pub fn new(resources: Vec<ResourceIdentifier>, resources_url: Option<Url>) -> Self {
        let mut collection = Self {
            resources_url,
            ..Self::default()
        };
        for resource in resources {
            collection.append(resource);
        }
        collection
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceIdentifier] {
        &self.resources
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceIdentifier> {
        self.resources.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[must_use]
    pub fn contains(&self, resource: &ResourceIdentifier) -> bool {
        self.resources.contains(resource)
    }

    /// Append a member unless it is already present.
    pub fn append(&mut self, resource: ResourceIdentifier) {
        if !self.contains(&resource) {
            self.resources.push(resource);
        }
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove(&mut self, resource: &ResourceIdentifier) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r != resource);
        self.resources.len() != before
    }

    /// Replace the member list with a fully resolved one and mark it loaded.
    pub fn set_resources(&mut self, resources: Vec<ResourceIdentifier>) {
        self.resources.clear();
        for resource in resources {
            self.append(resource);
        }
        self.is_loaded = true;
    }
}

/// The collection behind a to-many relationship.
///
/// Besides its members it keeps the raw linkage from the server and two
/// mutation logs used to build relationship-only updates:
/// - `added ∩ removed` is always empty
/// - every added member is in `resources`, no removed member is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedResourceCollection {
    collection: ResourceCollection,
    /// URL of the relationship itself, target of relationship-only updates.
    pub link_url: Option<Url>,
    /// Linkage as received, present even when members are not fetched.
    pub linkage: Option<Vec<ResourceIdentifier>>,
    added: Vec<ResourceIdentifier>,
    removed: Vec<ResourceIdentifier>,
}

impl LinkedResourceCollection {
    #[must_use]
    pub fn new(
        resources_url: Option<Url>,
        link_url: Option<Url>,
        linkage: Option<Vec<ResourceIdentifier>>,
    ) -> Self {
        Self {
            collection: ResourceCollection::new(Vec::new(), resources_url),
            link_url,
            linkage,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn collection(&self) -> &ResourceCollection {
        &self.collection
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceIdentifier] {
        self.collection.resources()
    }

    #[must_use]
    pub fn resources_url(&self) -> Option<&Url> {
        self.collection.resources_url.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.collection.is_loaded
    }

    #[must_use]
    pub fn contains(&self, resource: &ResourceIdentifier) -> bool {
        self.collection.contains(resource)
    }

    #[must_use]
    pub fn added_resources(&self) -> &[ResourceIdentifier] {
        &self.added
    }

    #[must_use]
    pub fn removed_resources(&self) -> &[ResourceIdentifier] {
        &self.removed
    }

    /// True if the collection changed since it was loaded.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Add `resource` to the relationship, recording the addition.
    ///
    /// Re-adding a member that was removed cancels the removal instead.
    /// Members that already exist, including ones only known through the
    /// received linkage, are not logged.
    pub fn link_resource(&mut self, resource: ResourceIdentifier) {
        if let Some(pos) = self.removed.iter().position(|r| r == &resource) {
            self.removed.remove(pos);
        } else if !self.collection.contains(&resource)
            && !self.in_linkage(&resource)
            && !self.added.contains(&resource)
        {
            self.added.push(resource.clone());
        }
        self.collection.append(resource);
    }

    /// Remove `resource` from the relationship, recording the removal.
    ///
    /// Removing a member that was added since load cancels the addition.
    /// Resources that were never members leave no trace.
    pub fn unlink_resource(&mut self, resource: &ResourceIdentifier) {
        if let Some(pos) = self.added.iter().position(|r| r == resource) {
            self.added.remove(pos);
        } else if (self.collection.contains(resource) || self.in_linkage(resource))
            && !self.removed.contains(resource)
        {
            self.removed.push(resource.clone());
        }
        self.collection.remove(resource);
    }

    fn in_linkage(&self, resource: &ResourceIdentifier) -> bool {
        self.linkage.as_ref().is_some_and(|l| l.contains(resource))
    }

    /// Append a member that already exists server-side, clearing any
    /// pending addition or removal for it.
    pub fn append_existing(&mut self, resource: ResourceIdentifier) {
        self.added.retain(|r| r != &resource);
        self.removed.retain(|r| r != &resource);
        self.collection.append(resource);
    }

    /// The full current member list, as far as it is known.
    ///
    /// Loaded collections report their members. Unloaded ones replay the
    /// mutation logs over the received linkage. An empty list is a real
    /// state; `None` only for an untouched collection that was received as
    /// links alone, whose members were never seen.
    #[must_use]
    pub fn known_members(&self) -> Option<Vec<ResourceIdentifier>> {
        if self.is_loaded() {
            return Some(self.resources().to_vec());
        }
        let Some(linkage) = &self.linkage else {
            let unseen = self.collection.is_empty()
                && !self.has_changes()
                && (self.resources_url().is_some() || self.link_url.is_some());
            return (!unseen).then(|| self.resources().to_vec());
        };

        let mut members: Vec<ResourceIdentifier> = linkage
            .iter()
            .filter(|r| !self.removed.contains(r))
            .cloned()
            .collect();
        for member in self.resources() {
            if !members.contains(member) {
                members.push(member.clone());
            }
        }
        Some(members)
    }

    /// Install the resolved member list and mark the collection loaded.
    ///
    /// Resolved members are existing members, so the mutation logs are cleared.
    pub fn resolve(&mut self, resources: Vec<ResourceIdentifier>) {
        self.added.clear();
        self.removed.clear();
        self.collection.set_resources(resources);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rid(id: &str) -> ResourceIdentifier {
        ResourceIdentifier::new("tags", id)
    }

    #[test]
    fn collection_append_is_identity_aware() {
        let mut collection = ResourceCollection::new(vec![rid("1"), rid("1"), rid("2")], None);
        assert_eq!(collection.len(), 2);
        collection.append(rid("2"));
        assert_eq!(collection.resources(), &[rid("1"), rid("2")]);
        assert!(collection.remove(&rid("1")));
        assert!(!collection.remove(&rid("1")));
        assert!(!collection.is_loaded);
    }

    #[test]
    fn link_then_unlink_cancels_out() {
        let mut collection = LinkedResourceCollection::default();
        collection.link_resource(rid("x"));
        assert_eq!(collection.added_resources(), &[rid("x")]);
        assert!(collection.contains(&rid("x")));

        collection.unlink_resource(&rid("x"));
        assert!(collection.added_resources().is_empty());
        assert!(collection.removed_resources().is_empty());
        assert!(!collection.contains(&rid("x")));
        assert!(!collection.has_changes());
    }

    #[test]
    fn unlink_then_link_existing_member_cancels_out() {
        let mut collection = LinkedResourceCollection::default();
        collection.append_existing(rid("x"));
        assert!(!collection.has_changes());

        collection.unlink_resource(&rid("x"));
        assert_eq!(collection.removed_resources(), &[rid("x")]);
        assert!(!collection.contains(&rid("x")));

        collection.link_resource(rid("x"));
        assert!(collection.added_resources().is_empty());
        assert!(collection.removed_resources().is_empty());
        assert!(collection.contains(&rid("x")));
    }

    #[test]
    fn linking_an_existing_member_is_not_logged() {
        let mut collection = LinkedResourceCollection::default();
        collection.append_existing(rid("x"));
        collection.link_resource(rid("x"));
        assert!(collection.added_resources().is_empty());
        assert_eq!(collection.resources().len(), 1);
    }

    #[test]
    fn append_existing_clears_pending_logs() {
        let mut collection = LinkedResourceCollection::default();
        collection.link_resource(rid("a"));
        collection.append_existing(rid("b"));
        collection.unlink_resource(&rid("b"));
        assert_eq!(collection.removed_resources(), &[rid("b")]);
        collection.append_existing(rid("a"));
        collection.append_existing(rid("b"));
        assert!(!collection.has_changes());
        assert_eq!(collection.resources(), &[rid("a"), rid("b")]);
    }

    #[test]
    fn resolve_marks_loaded() {
        let mut collection =
            LinkedResourceCollection::new(None, None, Some(vec![rid("1"), rid("2")]));
        assert!(!collection.is_loaded());
        collection.resolve(vec![rid("1"), rid("2")]);
        assert!(collection.is_loaded());
        assert_eq!(collection.resources().len(), 2);
        assert_eq!(collection.linkage.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn known_members_replays_logs_over_linkage() {
        let mut collection =
            LinkedResourceCollection::new(None, None, Some(vec![rid("1"), rid("2")]));
        collection.unlink_resource(&rid("1"));
        collection.link_resource(rid("3"));
        assert_eq!(collection.known_members(), Some(vec![rid("2"), rid("3")]));

        collection.resolve(vec![rid("2")]);
        assert_eq!(collection.known_members(), Some(vec![rid("2")]));

    }

    #[test]
    fn empty_collections_still_have_known_members() {
        assert_eq!(LinkedResourceCollection::default().known_members(), Some(vec![]));

        let mut emptied = LinkedResourceCollection::default();
        emptied.append_existing(rid("1"));
        emptied.unlink_resource(&rid("1"));
        assert_eq!(emptied.known_members(), Some(vec![]));

        let mut cleared = LinkedResourceCollection::new(None, None, Some(vec![rid("1")]));
        cleared.unlink_resource(&rid("1"));
        assert_eq!(cleared.known_members(), Some(vec![]));

        let related = Url::parse("https://example.com/posts/1/tags").unwrap();
        let unseen = LinkedResourceCollection::new(Some(related), None, None);
        assert_eq!(unseen.known_members(), None);
    }

    #[test]
    fn linkage_members_count_as_existing() {
        let mut collection = LinkedResourceCollection::new(None, None, Some(vec![rid("1")]));
        collection.link_resource(rid("1"));
        assert!(collection.added_resources().is_empty());
        assert!(collection.contains(&rid("1")));

        collection.unlink_resource(&rid("1"));
        assert_eq!(collection.removed_resources(), &[rid("1")]);
        collection.link_resource(rid("1"));
        assert!(!collection.has_changes());

        collection.unlink_resource(&rid("never"));
        assert!(collection.removed_resources().is_empty());
        assert_eq!(collection.known_members(), Some(vec![rid("1")]));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Link(u8),
        Unlink(u8),
        Existing(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..5).prop_map(Op::Link),
            (0u8..5).prop_map(Op::Unlink),
            (0u8..5).prop_map(Op::Existing),
        ]
    }

    proptest! {
        #[test]
        fn mutation_logs_stay_consistent(
            linkage in proptest::option::of(proptest::collection::btree_set(0u8..5, 0..4)),
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let linkage: Option<Vec<ResourceIdentifier>> =
                linkage.map(|ids| ids.iter().map(|n| rid(&n.to_string())).collect());
            let mut existing: Vec<ResourceIdentifier> = linkage.clone().unwrap_or_default();
            let mut collection = LinkedResourceCollection::new(None, None, linkage.clone());
            for op in ops {
                match op {
                    Op::Link(n) => collection.link_resource(rid(&n.to_string())),
                    Op::Unlink(n) => collection.unlink_resource(&rid(&n.to_string())),
                    Op::Existing(n) => {
                        existing.push(rid(&n.to_string()));
                        collection.append_existing(rid(&n.to_string()));
                    }
                }

                for added in collection.added_resources() {
                    prop_assert!(!linkage.iter().flatten().any(|l| l == added));
                    prop_assert!(!collection.removed_resources().contains(added));
                    prop_assert!(collection.contains(added));
                }
                for removed in collection.removed_resources() {
                    prop_assert!(existing.contains(removed));
                    prop_assert!(!collection.contains(removed));
                }

                let mut members = collection.resources().to_vec();
                members.sort();
                members.dedup();
                prop_assert_eq!(members.len(), collection.resources().len());
            }
        }
    }
}
