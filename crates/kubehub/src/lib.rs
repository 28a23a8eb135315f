//! Orka kubehub: discovery and a kube-rs backed resource accessor for the label engine.

#![forbid(unsafe_code)]

use std::time::Instant;

use anyhow::{Context, Result};
use kube::{
    api::{Api, ListParams, PostParams},
    core::{ApiResource, DynamicObject, GroupVersionKind},
    discovery::{Discovery, Scope},
    Client,
};
use metrics::histogram;
use orka_core::ObjectRef;
use orka_label::{AccessError, ResourceAccessor};
use tracing::{debug, info};

/// Well-known short names for builtin kinds; discovery does not report them.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("cm", "configmaps"),
    ("cj", "cronjobs"),
    ("deploy", "deployments"),
    ("ds", "daemonsets"),
    ("ing", "ingresses"),
    ("no", "nodes"),
    ("ns", "namespaces"),
    ("po", "pods"),
    ("pv", "persistentvolumes"),
    ("pvc", "persistentvolumeclaims"),
    ("rs", "replicasets"),
    ("sa", "serviceaccounts"),
    ("sts", "statefulsets"),
    ("svc", "services"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
}

impl DiscoveredResource {
    pub fn gvk_key(&self) -> String {
        if self.group.is_empty() {
            format!("{}/{}", self.version, self.kind)
        } else {
            format!("{}/{}/{}", self.group, self.version, self.kind)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        ApiResource::from_gvk_with_plural(&gvk, &self.plural)
    }

    /// Does a user-typed resource type name this resource?
    ///
    /// Accepts `pods`, `pod`, `Pod`, `po`, `deployments.apps`, `v1/Pod` and `apps/v1/Deployment`.
    pub fn matches(&self, query: &str) -> bool {
        if query.contains('/') {
            return match parse_gvk_key(query) {
                Ok(gvk) => gvk.group == self.group && gvk.version == self.version && gvk.kind.eq_ignore_ascii_case(&self.kind),
                Err(_) => false,
            };
        }
        let q = query.to_ascii_lowercase();
        let (name, group) = match q.split_once('.') {
            Some((n, g)) => (n, Some(g)),
            None => (q.as_str(), None),
        };
        if let Some(g) = group {
            if g != self.group { return false; }
        }
        let name = SHORT_NAMES.iter().find(|(short, _)| *short == name).map(|(_, long)| *long).unwrap_or(name);
        name == self.plural || name == self.kind.to_ascii_lowercase()
    }
}

/// Pick the resource a user-typed type refers to. Earlier entries win, so the core group
/// shadows same-named kinds from other groups.
pub fn resolve_kind<'a>(resources: &'a [DiscoveredResource], query: &str) -> Option<&'a DiscoveredResource> {
    resources.iter().find(|r| r.matches(query))
}

pub async fn get_kube_client() -> Result<Client> {
    Client::try_default().await.context("building kube client from kubeconfig/in-cluster env")
}

/// Discover served resources (incl. CRDs) using kube Discovery.
pub async fn discover(client: Client) -> Result<Vec<DiscoveredResource>> {
    let started = Instant::now();
    let discovery = Discovery::new(client).run().await.context("running api discovery")?;
    let mut out = Vec::new();
    for group in discovery.groups() {
        for (ar, caps) in group.recommended_resources() {
            let namespaced = matches!(caps.scope, Scope::Namespaced);
            out.push(DiscoveredResource {
                group: ar.group.clone(),
                version: ar.version.clone(),
                kind: ar.kind.clone(),
                plural: ar.plural.clone(),
                namespaced,
            });
        }
    }
    // Stable order with the core group first
    out.sort_by(|a, b| a.group.cmp(&b.group).then(a.version.cmp(&b.version)).then(a.kind.cmp(&b.kind)));
    histogram!("kube_discovery_ms", started.elapsed().as_secs_f64() * 1000.0);
    debug!(count = out.len(), "discovery finished");
    Ok(out)
}

fn parse_gvk_key(key: &str) -> Result<GroupVersionKind, AccessError> {
    let parts: Vec<_> = key.split('/').collect();
    match parts.as_slice() {
        [version, kind] => Ok(GroupVersionKind::gvk("", version, kind)),
        [group, version, kind] => Ok(GroupVersionKind::gvk(group, version, kind)),
        _ => Err(AccessError::NotFound(format!("invalid gvk key: {} (expect v1/Kind or group/v1/Kind)", key))),
    }
}

/// Map kube client errors onto the accessor taxonomy. `what` names the object or listing.
pub fn map_kube_error(what: impl std::fmt::Display, err: kube::Error) -> AccessError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => AccessError::NotFound(format!("{} ({})", what, ae.message)),
        kube::Error::Api(ae) if ae.code == 409 => AccessError::VersionConflict { target: what.to_string(), message: ae.message },
        other => AccessError::Transport(other.to_string()),
    }
}

/// Resource accessor talking to the cluster through `DynamicObject`s.
pub struct KubeAccessor {
    client: Client,
    resources: Vec<DiscoveredResource>,
}

impl KubeAccessor {
    /// Build an accessor; runs discovery once up front.
    pub async fn connect(client: Client) -> Result<Self> {
        let resources = discover(client.clone()).await?;
        info!(resources = resources.len(), ns = %client.default_namespace(), "kube accessor ready");
        Ok(Self { client, resources })
    }

    fn api_for(&self, kind: &str, namespace: Option<&str>) -> Result<(Api<DynamicObject>, bool), AccessError> {
        let res = resolve_kind(&self.resources, kind)
            .ok_or_else(|| AccessError::NotFound(format!("the server doesn't have a resource type {:?}", kind)))?;
        debug!(query = %kind, gvk = %res.gvk_key(), "resolved resource type");
        let ar = res.api_resource();
        let api = if res.namespaced {
            let ns = namespace.unwrap_or_else(|| self.client.default_namespace());
            Api::namespaced_with(self.client.clone(), ns, &ar)
        } else {
            Api::all_with(self.client.clone(), &ar)
        };
        Ok((api, res.namespaced))
    }
}

#[async_trait::async_trait]
impl ResourceAccessor for KubeAccessor {
    type Object = DynamicObject;

    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<ObjectRef>, AccessError> {
        let (api, namespaced) = self.api_for(kind, namespace)?;
        let list = api.list(&ListParams::default()).await.map_err(|e| map_kube_error(kind, e))?;
        let ns = if namespaced { Some(namespace.unwrap_or_else(|| self.client.default_namespace())) } else { None };
        Ok(list
            .items
            .into_iter()
            .filter_map(|o| o.metadata.name)
            .map(|name| ObjectRef::new(kind, ns, name))
            .collect())
    }

    async fn fetch(&self, target: &ObjectRef) -> Result<DynamicObject, AccessError> {
        let (api, _) = self.api_for(&target.kind, target.namespace.as_deref())?;
        api.get(&target.name).await.map_err(|e| map_kube_error(target, e))
    }

    async fn persist(
        &self,
        target: &ObjectRef,
        mut obj: DynamicObject,
        expected_version: Option<&str>,
    ) -> Result<DynamicObject, AccessError> {
        let (api, _) = self.api_for(&target.kind, target.namespace.as_deref())?;
        // PUT carries metadata.resourceVersion; the server rejects it with 409 when stale
        if let Some(v) = expected_version {
            obj.metadata.resource_version = Some(v.to_string());
        }
        api.replace(&target.name, &PostParams::default(), &obj).await.map_err(|e| map_kube_error(target, e))
    }
}
