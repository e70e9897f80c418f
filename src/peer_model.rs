// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Maintains the current routing tiers and exposes stable read views.
//!
//! Within one `PeerModel`, no `PeerId` occurs in more than one alternative
//! group (deduplication at insertion, first wins).

use crate::peer::{NodeClass, Peer, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An ordered list where position 0 is the primary and 1..k are fallbacks.
pub type AlternativeGroup = Vec<Peer>;

/// For each `NodeClass`, the list of alternative groups of that class.
pub type PeerTiers = HashMap<NodeClass, Vec<AlternativeGroup>>;

struct Inner {
    tiers: PeerTiers,
    // Fast classify()/remove_peer() lookup: which (class, group index) owns a peer.
    index: HashMap<PeerId, (NodeClass, usize)>,
}

impl Inner {
    fn new() -> Self {
        Self {
            tiers: HashMap::new(),
            index: HashMap::new(),
        }
    }
}

/// Holds the current routing tiers for this node's view of the network.
#[derive(Clone)]
pub struct PeerModel {
    inner: Arc<RwLock<Inner>>,
}

impl Default for PeerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerModel {
    /// Creates an empty peer model.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new())),
        }
    }

    /// Creates a peer model seeded with the given tiers (e.g. from the
    /// topology interpreter). Duplicate peer ids are deduplicated, first
    /// wins, exactly like `add_known_peers`.
    pub async fn seeded(tiers: PeerTiers) -> Self {
        let model = Self::new();
        model.add_known_peers(tiers).await;
        model
    }

    /// Union-merges `groups` into the model. Insertion order is preserved;
    /// a `PeerId` already present anywhere in the model is dropped from any
    /// later group (first wins). Returns the ids that were newly added.
    pub async fn add_known_peers(&self, groups: PeerTiers) -> Vec<PeerId> {
        let mut inner = self.inner.write().await;
        let mut added = Vec::new();

        for (class, new_groups) in groups {
            let existing = inner.tiers.entry(class).or_insert_with(Vec::new);
            for group in new_groups {
                let mut kept: AlternativeGroup = Vec::with_capacity(group.len());
                for peer in group {
                    if inner.index.contains_key(&peer.id) {
                        continue;
                    }
                    added.push(peer.id.clone());
                    kept.push(peer);
                }
                if kept.is_empty() {
                    continue;
                }
                let group_index = existing.len();
                for peer in &kept {
                    inner
                        .index
                        .insert(peer.id.clone(), (class, group_index));
                }
                existing.push(kept);
            }
        }

        added
    }

    /// Removes a single peer from whichever alternative group contains it.
    /// If this empties the group, the group is dropped and subsequent
    /// groups in that tier shift down (their recorded index is updated).
    pub async fn remove_peer(&self, id: &PeerId) {
        let mut inner = self.inner.write().await;
        let (class, group_index) = match inner.index.remove(id) {
            Some(loc) => loc,
            None => return,
        };

        let groups = match inner.tiers.get_mut(&class) {
            Some(g) => g,
            None => return,
        };
        if group_index >= groups.len() {
            return;
        }
        groups[group_index].retain(|p| &p.id != id);

        if groups[group_index].is_empty() {
            groups.remove(group_index);
            // Every peer in a later group has its recorded group index shifted down by one.
            for (_, (c, idx)) in inner.index.iter_mut() {
                if *c == class && *idx > group_index {
                    *idx -= 1;
                }
            }
        }
    }

    /// Cheap read of the current tiers. Callers must not rely on
    /// cross-snapshot consistency during concurrent mutation: a snapshot
    /// reflects either the pre- or post-state of any single mutation,
    /// never a torn mix.
    pub async fn snapshot(&self) -> PeerTiers {
        self.inner.read().await.tiers.clone()
    }

    /// Returns the class of a known peer, or `None` if it isn't known.
    pub async fn classify(&self, id: &PeerId) -> Option<NodeClass> {
        self.inner.read().await.index.get(id).map(|(c, _)| *c)
    }

    /// True if the model currently holds no peers.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.index.is_empty()
    }

    /// Number of known peers across all tiers.
    pub async fn len(&self) -> usize {
        self.inner.read().await.index.len()
    }
}
