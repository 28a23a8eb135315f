//! Collaborator seams: what the engine needs from an object, a cluster, and an output sink.

use orka_core::{LabelMap, ObjectRef};

use crate::AccessError;

/// An object carrying a label map and an optional version token.
pub trait Labeled {
    /// Current labels. `None` and an empty map read the same.
    fn label_map(&self) -> Option<&LabelMap>;
    /// Labels for mutation; an absent map is materialized empty first.
    fn label_map_mut(&mut self) -> &mut LabelMap;
    fn version_token(&self) -> Option<&str>;
    fn set_version_token(&mut self, version: &str);
}

impl<K: kube::Resource> Labeled for K {
    fn label_map(&self) -> Option<&LabelMap> { self.meta().labels.as_ref() }

    fn label_map_mut(&mut self) -> &mut LabelMap { self.meta_mut().labels.get_or_insert_with(LabelMap::new) }

    fn version_token(&self) -> Option<&str> { self.meta().resource_version.as_deref() }

    fn set_version_token(&mut self, version: &str) {
        self.meta_mut().resource_version = Some(version.to_string());
    }
}

/// Fetch, persist and enumerate objects by reference.
#[async_trait::async_trait]
pub trait ResourceAccessor: Send + Sync {
    type Object: Labeled + Clone + Send + Sync;

    /// References to every object of `kind`, in `namespace` when given.
    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<ObjectRef>, AccessError>;

    async fn fetch(&self, target: &ObjectRef) -> Result<Self::Object, AccessError>;

    /// Store `obj`. With `expected_version`, the write must fail with
    /// [`AccessError::VersionConflict`] when the stored version differs.
    async fn persist(
        &self,
        target: &ObjectRef,
        obj: Self::Object,
        expected_version: Option<&str>,
    ) -> Result<Self::Object, AccessError>;
}

/// Receives every successfully labeled object.
pub trait ObjectPrinter<K> {
    fn print(&mut self, target: &ObjectRef, obj: &K);
}
