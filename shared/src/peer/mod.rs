use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::monitor::Host;
use crate::object::replicated::ReplicatedObject;
use crate::runtime::Runtime;

/// An authorization and routing unit. Zones form a tree; the transport layer
/// provides the concrete implementation.
pub trait Zone: Send + Sync {
    fn name(&self) -> &str;

    fn parent(&self) -> Option<Arc<dyn Zone>>;

    /// Whether endpoints of this zone may observe and mutate the object.
    fn can_access_object(&self, object: &dyn ReplicatedObject) -> bool;

    /// Walks the parent chain. A zone is not a child of itself.
    fn is_child_of(&self, other: &dyn Zone) -> bool {
        let mut parent = self.parent();
        while let Some(zone) = parent {
            if zone.name() == other.name() {
                return true;
            }
            parent = zone.parent();
        }
        false
    }
}

/// A named peer process.
pub trait Endpoint: Send + Sync {
    fn name(&self) -> &str;

    fn zone(&self) -> Option<Arc<dyn Zone>>;
}

/// Identity of the peer whose message caused a mutation. Local mutations
/// carry no origin.
pub struct MessageOrigin {
    /// Identity string of the connection the message arrived on, for logs.
    pub client_identity: String,
    /// The sending endpoint; absent when the client is not a trusted peer.
    pub endpoint: Option<Arc<dyn Endpoint>>,
    /// The sending zone; absent for zone-less connections.
    pub zone: Option<Arc<dyn Zone>>,
}

impl MessageOrigin {
    pub fn new(
        client_identity: impl Into<String>,
        endpoint: Option<Arc<dyn Endpoint>>,
        zone: Option<Arc<dyn Zone>>,
    ) -> Arc<MessageOrigin> {
        Arc::new(MessageOrigin {
            client_identity: client_identity.into(),
            endpoint,
            zone,
        })
    }
}

/// Routing scope of a relayed message: the peers that can access a single
/// object, or every endpoint of a zone.
#[derive(Clone)]
pub enum RelayScope {
    Object(Arc<dyn ReplicatedObject>),
    Zone(Arc<dyn Zone>),
}

/// The peer link. Transport, framing and replay logging live outside the
/// core; this is the surface the core talks to.
pub trait PeerListener: Send + Sync {
    /// Routes a message to the peers selected by `scope`, excluding the
    /// origin. `log` requests the transport's replay log.
    fn relay_message(
        &self,
        origin: Option<Arc<MessageOrigin>>,
        scope: RelayScope,
        message: Value,
        log: bool,
    );

    /// Point-to-point delivery to a single endpoint, bypassing routing.
    fn sync_send_message(&self, destination: &Arc<dyn Endpoint>, message: Value);
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CommandError(pub String);

/// The check execution engine. The core fabricates the virtual host and
/// surfaces results; running the actual command is external.
pub trait CheckEngine: Send + Sync {
    fn execute_remote_check(
        &self,
        runtime: &Runtime,
        host: &Arc<Host>,
        macros: Option<&Value>,
    ) -> Result<(), CommandError>;

    fn execute_event_handler(
        &self,
        runtime: &Runtime,
        host: &Arc<Host>,
        macros: Option<&Value>,
        resolved_macros: bool,
    ) -> Result<(), CommandError>;
}
