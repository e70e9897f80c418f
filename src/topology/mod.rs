// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

pub mod document;
mod interpreter;

pub use interpreter::{interpret, Projection};

use crate::peer::{NodeClass, PeerId};

/// The current node's view of its place in the overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyView {
    /// The full peer set is known; used by Core and Relay nodes.
    Static {
        /// This node's own class.
        self_class: NodeClass,
    },
    /// Peers discovered by periodic DNS resolution.
    BehindNAT {
        /// How many alternative groups to maintain.
        valency: u16,
        /// Alternative group size minus one.
        fallbacks: u16,
        /// Domains to resolve, one per alternative group.
        dns_domains: Vec<String>,
    },
    /// Peers discovered via DHT; self classified as Relay in membership decisions.
    P2P {
        /// How many alternative groups to maintain.
        valency: u16,
        /// Alternative group size minus one.
        fallbacks: u16,
    },
    /// Peers via DHT; all nodes treated as Core.
    Traditional {
        /// How many alternative groups to maintain.
        valency: u16,
        /// Alternative group size minus one.
        fallbacks: u16,
    },
    /// Static list of Relay peers; self is Edge; subscribes-only.
    LightWallet {
        /// The statically configured relay peers (flattened across groups).
        relays: Vec<PeerId>,
    },
}

impl TopologyView {
    /// This node's own class, per the self-class derivation table.
    pub fn self_class(&self) -> NodeClass {
        match self {
            TopologyView::Static { self_class } => *self_class,
            TopologyView::BehindNAT { .. } => NodeClass::Edge,
            TopologyView::P2P { .. } => NodeClass::Edge,
            TopologyView::Traditional { .. } => NodeClass::Core,
            TopologyView::LightWallet { .. } => NodeClass::Edge,
        }
    }
}
