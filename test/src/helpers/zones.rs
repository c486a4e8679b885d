use std::collections::HashSet;
use std::sync::Arc;

use vigil_shared::{Endpoint, ReplicatedObject, Zone};

/// Which objects a [`StaticZone`] may access, keyed by full object name.
#[derive(Debug, Clone)]
pub enum AccessPolicy {
    All,
    Nothing,
    Names(HashSet<String>),
}

impl AccessPolicy {
    pub fn names<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> AccessPolicy {
        AccessPolicy::Names(names.into_iter().map(Into::into).collect())
    }
}

/// A zone fixture with a fixed parent link and access policy.
pub struct StaticZone {
    name: String,
    parent: Option<Arc<dyn Zone>>,
    policy: AccessPolicy,
}

impl StaticZone {
    pub fn new(
        name: &str,
        parent: Option<Arc<dyn Zone>>,
        policy: AccessPolicy,
    ) -> Arc<StaticZone> {
        Arc::new(StaticZone {
            name: name.to_string(),
            parent,
            policy,
        })
    }
}

impl Zone for StaticZone {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<Arc<dyn Zone>> {
        self.parent.clone()
    }

    fn can_access_object(&self, object: &dyn ReplicatedObject) -> bool {
        match &self.policy {
            AccessPolicy::All => true,
            AccessPolicy::Nothing => false,
            AccessPolicy::Names(names) => names.contains(object.core().name()),
        }
    }
}

/// An endpoint fixture bound to an optional home zone.
pub struct StaticEndpoint {
    name: String,
    zone: Option<Arc<dyn Zone>>,
}

impl StaticEndpoint {
    pub fn new(name: &str, zone: Option<Arc<dyn Zone>>) -> Arc<StaticEndpoint> {
        Arc::new(StaticEndpoint {
            name: name.to_string(),
            zone,
        })
    }
}

impl Endpoint for StaticEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn zone(&self) -> Option<Arc<dyn Zone>> {
        self.zone.clone()
    }
}
