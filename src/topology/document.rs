// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Serde shapes for the ingested topology document. Parsing
//! only validates document *shape*; projection-time validation (duplicate
//! node names, unknown routes, etc.) happens in `interpreter`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level topology document. Exactly one of `nodes`, `wallet`, `p2p`
/// must be present — enforced by the interpreter, not by serde, so that
/// the rejection reason can be worded precisely.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Static node table, keyed by node name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<BTreeMap<String, NodeEntry>>,
    /// Light wallet configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletDoc>,
    /// P2P (DHT-discovered) configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p2p: Option<P2pDoc>,
}

/// One entry of the static node table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeEntry {
    /// The node's class.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Free-form deployment region, not interpreted by this crate.
    pub region: String,
    /// Sequence of alternative groups; each inner list is (primary, fallback-1, …).
    #[serde(rename = "static-routes")]
    pub static_routes: Vec<Vec<String>>,
    /// Literal network address. Mutually exclusive with `host`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    /// DNS name to resolve. Mutually exclusive with `addr`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port to connect on, used together with `host` (and with `addr` if
    /// `addr` doesn't already carry one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Whether to spawn the DHT discovery worker for this node's entry.
    /// Defaults per node class: `false` for Core/Edge, `true` for Relay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kademlia: Option<bool>,
}

/// `wallet` top-level document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletDoc {
    /// Alternative groups of relay addresses.
    pub relays: Vec<Vec<WalletPeer>>,
    /// How many alternative groups to maintain. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valency: Option<u16>,
    /// Alternative group size minus one. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<u16>,
}

/// One relay address entry under `wallet.relays`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletPeer {
    /// Literal network address. Mutually exclusive with `host`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    /// DNS name to resolve. Mutually exclusive with `addr`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port to connect on.
    pub port: u16,
}

/// `p2p` top-level document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct P2pDoc {
    /// Either `"traditional"` or `"normal"`.
    pub variant: String,
    /// How many alternative groups to maintain. Defaults to 3.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valency: Option<u16>,
    /// Alternative group size minus one. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<u16>,
}
