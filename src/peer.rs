// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote node. Host + port suffices as identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    /// Builds a `PeerId` from a literal `host:port` string.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// The `host:port` string this identity is built from.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Closed enumeration of node classes. Determines trust, routing and policy tier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    /// Trusted, fully-connected node. Highest routing priority.
    Core,
    /// Intermediate relay node.
    Relay,
    /// Leaf node, e.g. a light wallet.
    Edge,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeClass::Core => "core",
            NodeClass::Relay => "relay",
            NodeClass::Edge => "edge",
        };
        write!(f, "{}", s)
    }
}

/// Immutable record of a known peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Peer {
    /// The peer's identity.
    pub id: PeerId,
    /// The peer's node class.
    pub class: NodeClass,
}

impl Peer {
    /// Creates a new peer record.
    pub fn new(id: PeerId, class: NodeClass) -> Self {
        Self { id, class }
    }
}
