// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The outbound queue itself: owns the peer model, the policy, the
//! transport, and the per-link scheduling state, and drives dispatch.

use crate::message::{classify, Submission};
use crate::omq::link::{Link, PendingEntry, SubmitOrderCounter};
use crate::omq::report::EnqueueReport;
use crate::peer::{Peer, PeerId};
use crate::peer_model::{PeerModel, PeerTiers};
use crate::policy::{EnqueueRule, PolicyModel};
use crate::transport::{SendOutcome, Transport};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time;

enum AdmitOutcome {
    Accepted,
    Denied,
    Suspended,
    Unknown,
}

/// Holds the mutable scheduling state and drives dispatch against a
/// [`Transport`]. Cheaply `Clone`-able; every clone shares the same state.
#[derive(Clone)]
pub struct OutboundQueue {
    peer_model: PeerModel,
    policy: Arc<PolicyModel>,
    transport: Arc<dyn Transport>,
    links: Arc<RwLock<HashMap<PeerId, Mutex<Link>>>>,
    submit_order: Arc<SubmitOrderCounter>,
    notify: Arc<Notify>,
}

impl OutboundQueue {
    /// Builds a queue over an already-seeded peer model.
    pub fn new(peer_model: PeerModel, policy: PolicyModel, transport: Arc<dyn Transport>) -> Self {
        Self {
            peer_model,
            policy: Arc::new(policy),
            transport,
            links: Arc::new(RwLock::new(HashMap::new())),
            submit_order: Arc::new(SubmitOrderCounter::new()),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Adds peers to both the peer model and the link table, creating idle
    /// link state for each newly admitted peer.
    pub async fn add_known_peers(&self, groups: PeerTiers) -> Vec<PeerId> {
        let mut to_link: Vec<Peer> = Vec::new();
        for group_list in groups.values() {
            for group in group_list {
                to_link.extend(group.iter().cloned());
            }
        }

        let added = self.peer_model.add_known_peers(groups).await;
        let added_set: std::collections::HashSet<&PeerId> = added.iter().collect();

        let mut links = self.links.write().await;
        for peer in to_link {
            if !added_set.contains(&peer.id) {
                continue;
            }
            let rule = self.policy.dequeue_rule(peer.class);
            links.entry(peer.id.clone()).or_insert_with(|| Mutex::new(Link::new(peer, rule)));
        }
        drop(links);

        self.notify.notify_waiters();
        added
    }

    /// Removes a peer from the peer model and drains its pending entries
    /// (reported only via a debug log — pending entries have no caller to
    /// report `Cancelled` back to once enqueue has already returned).
    pub async fn remove_peer(&self, id: &PeerId) {
        self.peer_model.remove_peer(id).await;
        let mut links = self.links.write().await;
        if let Some(mutex) = links.remove(id) {
            let mut link = mutex.into_inner();
            let cancelled = link.drain();
            if !cancelled.is_empty() {
                tracing::debug!(peer = %id, count = cancelled.len(), "peer removed, cancelling pending entries");
            }
        }
    }

    /// Classifies and admits a submission, applying each enqueue pass in order.
    pub async fn enqueue(&self, submission: Submission) -> EnqueueReport {
        let msg_class = classify(&submission);
        let passes = self.policy.enqueue_rule(&msg_class);
        let excluded = msg_class.excluded_peer().cloned();
        let kind = msg_class.kind;
        let tiers = self.peer_model.snapshot().await;
        let mut report = EnqueueReport::empty();

        for rule in passes {
            let mut pass_report = EnqueueReport::empty();
            match rule {
                EnqueueRule::EnqueueAll {
                    node_class,
                    max_ahead,
                    precedence,
                } => {
                    if let Some(groups) = tiers.get(&node_class) {
                        for group in groups {
                            for peer in group {
                                if excluded.as_ref() == Some(&peer.id) {
                                    continue;
                                }
                                match self
                                    .attempt_admit(&peer.id, kind, precedence, max_ahead, &submission.payload)
                                    .await
                                {
                                    AdmitOutcome::Accepted => pass_report.accepted.push(peer.id.clone()),
                                    AdmitOutcome::Denied => pass_report.denied.push(peer.id.clone()),
                                    AdmitOutcome::Suspended | AdmitOutcome::Unknown => {}
                                }
                            }
                        }
                    }
                }
                EnqueueRule::EnqueueOne {
                    node_classes,
                    max_ahead,
                    precedence,
                } => {
                    for node_class in &node_classes {
                        if let Some(groups) = tiers.get(node_class) {
                            for (group_index, group) in groups.iter().enumerate() {
                                let mut routed = false;
                                for peer in group {
                                    if excluded.as_ref() == Some(&peer.id) {
                                        continue;
                                    }
                                    if let AdmitOutcome::Accepted = self
                                        .attempt_admit(&peer.id, kind, precedence, max_ahead, &submission.payload)
                                        .await
                                    {
                                        pass_report.accepted.push(peer.id.clone());
                                        routed = true;
                                        break;
                                    }
                                }
                                if !routed {
                                    pass_report.no_route.push(group_index);
                                }
                            }
                        }
                    }
                }
            }
            report.merge(pass_report);
        }

        self.notify.notify_waiters();
        report
    }

    async fn attempt_admit(
        &self,
        peer_id: &PeerId,
        kind: crate::message::MessageKind,
        precedence: crate::message::Precedence,
        max_ahead: usize,
        payload: &Bytes,
    ) -> AdmitOutcome {
        let links = self.links.read().await;
        let mutex = match links.get(peer_id) {
            Some(m) => m,
            None => return AdmitOutcome::Unknown,
        };
        let mut link = mutex.lock().await;
        if link.is_suspended(kind, Instant::now()) {
            return AdmitOutcome::Suspended;
        }
        if link.count_ahead(precedence) > max_ahead {
            tracing::debug!(
                peer = %peer_id,
                ?kind,
                pending = link.pending_len(),
                max_ahead,
                "admission denied, link is backed up with higher-precedence traffic"
            );
            return AdmitOutcome::Denied;
        }
        let submit_order = self.submit_order.next();
        link.push(PendingEntry {
            kind,
            precedence,
            submit_order,
            payload: payload.clone(),
        });
        AdmitOutcome::Accepted
    }

    /// Applies the outcome of one completed send: frees the in-flight slot
    /// and, on failure, opens the per-(peer, kind) suspension window.
    pub async fn on_send_complete(&self, peer_id: &PeerId, kind: crate::message::MessageKind, outcome: SendOutcome) {
        let links = self.links.read().await;
        let mutex = match links.get(peer_id) {
            Some(m) => m,
            None => return, // PeerGone: the peer was removed; discard silently.
        };
        let mut link = mutex.lock().await;
        link.complete();
        if let SendOutcome::Failed(cause) = outcome {
            let cooldown = self.policy.failure_rule(link.peer.class, kind).0;
            link.suspend(kind, Instant::now() + cooldown);
            tracing::warn!(peer = %peer_id, ?kind, %cause, "send failed, entering suspend window");
        }
        drop(link);
        drop(links);
        self.notify.notify_waiters();
    }

    /// Scans every link once, dispatching every entry each link currently
    /// has capacity, tokens and pending work for. Each dispatched send is
    /// driven to completion by a spawned task, mirroring the per-recipient
    /// `tokio::spawn` fan-out pattern used elsewhere for non-blocking sends.
    pub async fn tick(&self) {
        let peer_ids: Vec<PeerId> = self.links.read().await.keys().cloned().collect();
        for peer_id in peer_ids {
            loop {
                let entry = {
                    let links = self.links.read().await;
                    let mutex = match links.get(&peer_id) {
                        Some(m) => m,
                        None => break,
                    };
                    mutex.lock().await.pop_ready()
                };
                let entry = match entry {
                    Some(e) => e,
                    None => break,
                };
                self.spawn_send(peer_id.clone(), entry);
            }
        }
    }

    fn spawn_send(&self, peer_id: PeerId, entry: PendingEntry) {
        let transport = self.transport.clone();
        let queue = self.clone();
        tokio::spawn(async move {
            let handle = transport.submit(&peer_id, entry.payload).await;
            let outcome = handle.await;
            queue.on_send_complete(&peer_id, entry.kind, outcome).await;
        });
    }

    /// Runs the dispatcher forever: wakes on every `enqueue`/peer-model
    /// change via `Notify`, with a slow fallback tick so rate-limiter
    /// token replenishment and suspension expiry are observed even
    /// without new traffic.
    pub async fn run(self) {
        let mut sweep = time::interval(Duration::from_millis(200));
        loop {
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = sweep.tick() => {}
            }
            self.tick().await;
        }
    }
}
