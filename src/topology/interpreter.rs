// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Translates the declarative topology document into a concrete
//! `(TopologyView, initial PeerTiers, discovery worker descriptors)`.

use crate::discovery::{DiscoveryWorker, HostResolver};
use crate::error::{Error, Result};
use crate::peer::{NodeClass, Peer, PeerId};
use crate::peer_model::{AlternativeGroup, PeerTiers};
use crate::topology::document::{NodeEntry, TopologyDocument, WalletPeer};
use crate::topology::TopologyView;
use std::collections::HashMap;

/// Default alternative-group size (fallbacks + 1 primary) used when the
/// document doesn't specify valency/fallbacks explicitly.
const DEFAULT_WALLET_VALENCY: u16 = 1;
const DEFAULT_WALLET_FALLBACKS: u16 = 1;
const DEFAULT_P2P_VALENCY: u16 = 3;
const DEFAULT_P2P_FALLBACKS: u16 = 1;

/// Result of projecting a topology document into this node's starting state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    /// This node's view of its place in the overlay.
    pub view: TopologyView,
    /// This node's own class.
    pub self_class: NodeClass,
    /// The initial peer tiers to seed the `PeerModel` with.
    pub initial_peers: PeerTiers,
    /// Discovery workers the launcher should spawn.
    pub discovery: Vec<DiscoveryWorker>,
    /// Domains/hosts whose resolution failed during projection. Non-fatal;
    /// reported as data, not an `Error`.
    pub dns_failures: Vec<String>,
}

/// Parses and projects a topology document.
///
/// `self_name` identifies this node's entry in `nodes` and is required
/// (and only meaningful) for the `Static` topology.
pub fn interpret(
    doc: &TopologyDocument,
    self_name: Option<&str>,
    resolver: &dyn HostResolver,
) -> Result<Projection> {
    let present = [doc.nodes.is_some(), doc.wallet.is_some(), doc.p2p.is_some()]
        .iter()
        .filter(|b| **b)
        .count();
    if present != 1 {
        return Err(Error::BadTopology {
            reason: "expected exactly one of 'nodes', 'wallet', 'p2p'".to_string(),
        });
    }

    if let Some(nodes) = &doc.nodes {
        return interpret_static(nodes, self_name, resolver);
    }
    if let Some(wallet) = &doc.wallet {
        return interpret_wallet(wallet, resolver);
    }
    if let Some(p2p) = &doc.p2p {
        return interpret_p2p(p2p);
    }
    unreachable!("exactly one of nodes/wallet/p2p was checked present above")
}

fn parse_node_type(s: &str) -> Result<NodeClass> {
    match s {
        "core" => Ok(NodeClass::Core),
        "relay" => Ok(NodeClass::Relay),
        "edge" => Ok(NodeClass::Edge),
        other => Err(Error::BadTopology {
            reason: format!("node type must be one of core|relay|edge, got {:?}", other),
        }),
    }
}

fn resolve_entry(
    name: &str,
    entry: &NodeEntry,
    resolver: &dyn HostResolver,
    dns_failures: &mut Vec<String>,
) -> Option<PeerId> {
    match (&entry.addr, &entry.host) {
        (Some(addr), None) => Some(PeerId::new(addr.clone())),
        (None, Some(host)) => {
            let port = entry.port.unwrap_or(0);
            match resolver.resolve(host, port) {
                Some(resolved) => Some(PeerId::new(resolved)),
                None => {
                    dns_failures.push(host.clone());
                    None
                }
            }
        }
        _ => {
            tracing::warn!(node = name, "node entry has neither addr nor host after validation");
            None
        }
    }
}

fn interpret_static(
    nodes: &std::collections::BTreeMap<String, NodeEntry>,
    self_name: Option<&str>,
    resolver: &dyn HostResolver,
) -> Result<Projection> {
    for (name, entry) in nodes {
        if entry.addr.is_some() == entry.host.is_some() {
            return Err(Error::BadTopology {
                reason: format!(
                    "node {:?} must specify exactly one of addr or host",
                    name
                ),
            });
        }
        // Validate node type up front so later routing work can trust it.
        parse_node_type(&entry.node_type)?;
        for group in &entry.static_routes {
            for route_name in group {
                if !nodes.contains_key(route_name) {
                    return Err(Error::BadTopology {
                        reason: format!(
                            "static route from {:?} names unknown node {:?}",
                            name, route_name
                        ),
                    });
                }
            }
        }
    }

    let self_name = self_name.ok_or_else(|| Error::BadTopology {
        reason: "static topology requires this node's own name".to_string(),
    })?;
    let self_entry = nodes.get(self_name).ok_or_else(|| Error::BadTopology {
        reason: format!("this node's name {:?} is not present in 'nodes'", self_name),
    })?;
    let self_class = parse_node_type(&self_entry.node_type)?;

    let mut dns_failures = Vec::new();
    let mut initial_peers: PeerTiers = HashMap::new();

    for group in &self_entry.static_routes {
        let mut resolved: Vec<(NodeClass, PeerId)> = Vec::new();
        for route_name in group {
            let entry = &nodes[route_name];
            let class = parse_node_type(&entry.node_type)?;
            if let Some(id) = resolve_entry(route_name, entry, resolver, &mut dns_failures) {
                resolved.push((class, id));
            }
        }
        if resolved.is_empty() {
            continue;
        }
        let tier_class = resolved[0].0;
        let alt_group: AlternativeGroup = resolved
            .into_iter()
            .map(|(class, id)| Peer::new(id, class))
            .collect();
        initial_peers
            .entry(tier_class)
            .or_insert_with(Vec::new)
            .push(alt_group);
    }

    let run_dht = self_entry.kademlia.unwrap_or(self_class == NodeClass::Relay);
    let discovery = if run_dht {
        let subscriber_class = if self_class == NodeClass::Relay {
            NodeClass::Edge
        } else {
            self_class
        };
        vec![DiscoveryWorker::Dht { subscriber_class }]
    } else {
        vec![]
    };

    let view = TopologyView::Static { self_class };
    Ok(Projection {
        self_class: view.self_class(),
        view,
        initial_peers,
        discovery,
        dns_failures,
    })
}

fn resolve_wallet_peer(
    peer: &WalletPeer,
    resolver: &dyn HostResolver,
    dns_failures: &mut Vec<String>,
) -> Result<Option<PeerId>> {
    match (&peer.addr, &peer.host) {
        (Some(addr), None) => Ok(Some(PeerId::new(format!("{}:{}", addr, peer.port)))),
        (None, Some(host)) => Ok(match resolver.resolve(host, peer.port) {
            Some(resolved) => Some(PeerId::new(resolved)),
            None => {
                dns_failures.push(host.clone());
                None
            }
        }),
        _ => Err(Error::BadTopology {
            reason: "wallet relay entry must specify exactly one of addr or host".to_string(),
        }),
    }
}

fn interpret_wallet(
    wallet: &crate::topology::document::WalletDoc,
    resolver: &dyn HostResolver,
) -> Result<Projection> {
    let _valency = wallet.valency.unwrap_or(DEFAULT_WALLET_VALENCY);
    let _fallbacks = wallet.fallbacks.unwrap_or(DEFAULT_WALLET_FALLBACKS);

    let mut dns_failures = Vec::new();
    let mut initial_peers: PeerTiers = HashMap::new();
    let mut flattened = Vec::new();

    for group in &wallet.relays {
        let mut alt_group: AlternativeGroup = Vec::new();
        for peer in group {
            if let Some(id) = resolve_wallet_peer(peer, resolver, &mut dns_failures)? {
                alt_group.push(Peer::new(id, NodeClass::Relay));
            }
        }
        if alt_group.is_empty() {
            continue;
        }
        flattened.push(alt_group[0].id.clone());
        initial_peers
            .entry(NodeClass::Relay)
            .or_insert_with(Vec::new)
            .push(alt_group);
    }

    let view = TopologyView::LightWallet { relays: flattened };
    Ok(Projection {
        self_class: view.self_class(),
        view,
        initial_peers,
        discovery: vec![],
        dns_failures,
    })
}

fn interpret_p2p(p2p: &crate::topology::document::P2pDoc) -> Result<Projection> {
    let valency = p2p.valency.unwrap_or(DEFAULT_P2P_VALENCY);
    let fallbacks = p2p.fallbacks.unwrap_or(DEFAULT_P2P_FALLBACKS);

    match p2p.variant.as_str() {
        "normal" => {
            let view = TopologyView::P2P { valency, fallbacks };
            Ok(Projection {
                self_class: view.self_class(),
                view,
                initial_peers: HashMap::new(),
                discovery: vec![DiscoveryWorker::Dht {
                    subscriber_class: NodeClass::Relay,
                }],
                dns_failures: vec![],
            })
        }
        "traditional" => {
            let view = TopologyView::Traditional { valency, fallbacks };
            Ok(Projection {
                self_class: view.self_class(),
                view,
                initial_peers: HashMap::new(),
                discovery: vec![DiscoveryWorker::Dht {
                    subscriber_class: NodeClass::Core,
                }],
                dns_failures: vec![],
            })
        }
        other => Err(Error::BadTopology {
            reason: format!(
                "p2p.variant must be one of traditional|normal, got {:?}",
                other
            ),
        }),
    }
}
