// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Opaque descriptors handed to subsystem launchers. Spawning and driving
//! the actual DNS/DHT subscriber workers is outside this crate's scope —
//! only the interface they are constructed from, and the interface they
//! call back into (`PeerModel::add_known_peers` / `remove_peer`), lives
//! here.

use crate::peer::NodeClass;

/// A worker the node's launcher should spawn to keep the peer model fed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoveryWorker {
    /// Periodically re-resolves the given DNS domains and reports the
    /// resulting addresses into the peer model as `NodeClass::Relay` peers
    /// (a `BehindNAT` node only ever discovers relays this way).
    Dns {
        /// Domains to resolve, one per alternative group.
        domains: Vec<String>,
    },
    /// Subscribes to the Kademlia DHT to discover peers of the given class.
    Dht {
        /// The class newly-discovered peers are reported under.
        subscriber_class: NodeClass,
    },
}

/// Resolves a single `host:port` pair to a connectable peer identity.
///
/// The real implementation is a DNS client; this crate consumes only this
/// narrow synchronous callback.
pub trait HostResolver {
    /// Resolve `host` (connecting on `port`) to a peer identity, or `None`
    /// if resolution failed. Resolution failures are never panics: the
    /// caller (`topology::interpret`) collects the failing domain into
    /// `Projection::dns_failures` and continues with the rest of the
    /// document.
    fn resolve(&self, host: &str, port: u16) -> Option<String>;
}

/// A resolver that treats `host` as already being a connectable address
/// (useful for tests and for environments where DNS is resolved upstream).
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityResolver;

impl HostResolver for IdentityResolver {
    fn resolve(&self, host: &str, port: u16) -> Option<String> {
        Some(format!("{}:{}", host, port))
    }
}
