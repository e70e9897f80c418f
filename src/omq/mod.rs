// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The Outbound Message Queue: the node's cross-traffic scheduler.

mod link;
mod queue;
pub mod report;

pub use link::{PendingEntry, SubmitOrderCounter};
pub use queue::OutboundQueue;
pub use report::EnqueueReport;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageKind, Origin, Precedence, Submission};
    use crate::peer::{NodeClass, Peer, PeerId};
    use crate::peer_model::{PeerModel, PeerTiers};
    use crate::policy::{DequeueRule, EnqueueRule, PolicyModel, RateLimit};
    use crate::transport::fake::ScriptedTransport;
    use crate::transport::SendOutcome;
    use bytes::Bytes;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn policy_with(
        enqueue: Vec<(MessageKind, bool, EnqueueRule)>,
        dequeue: Vec<(NodeClass, DequeueRule)>,
        failure: Vec<(NodeClass, MessageKind, Duration)>,
    ) -> PolicyModel {
        use crate::policy::document::*;

        let mut enqueue_doc: BTreeMap<String, EnqueueEntryDoc> = BTreeMap::new();
        for (kind, is_forward, rule) in enqueue {
            let kind_str = kind_to_str(kind).to_string();
            let rule_doc = rule_to_doc(&rule);
            let entry = enqueue_doc.entry(kind_str).or_insert_with(|| {
                if kind.carries_origin() {
                    EnqueueEntryDoc::SendForward {
                        send: vec![],
                        forward: vec![],
                    }
                } else {
                    EnqueueEntryDoc::Flat(vec![])
                }
            });
            match entry {
                EnqueueEntryDoc::Flat(v) => v.push(rule_doc),
                EnqueueEntryDoc::SendForward { send, forward } => {
                    if is_forward {
                        forward.push(rule_doc);
                    } else {
                        send.push(rule_doc);
                    }
                }
            }
        }

        let mut dequeue_doc = BTreeMap::new();
        for (class, rule) in dequeue {
            dequeue_doc.insert(
                class_to_str(class).to_string(),
                DequeueRuleDoc {
                    max_in_flight: rule.max_in_flight,
                    rate_limit: match rule.rate_limit {
                        RateLimit::NoRateLimiting => None,
                        RateLimit::MaxMsgPerSec(n) => Some(n),
                    },
                },
            );
        }

        let mut failure_doc: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for (class, kind, duration) in failure {
            failure_doc
                .entry(class_to_str(class).to_string())
                .or_insert_with(BTreeMap::new)
                .insert(kind_to_str(kind).to_string(), duration.as_secs());
        }

        let doc = PolicyDocument {
            enqueue: enqueue_doc,
            dequeue: dequeue_doc,
            failure: failure_doc,
        };
        PolicyModel::from_document(&doc).unwrap()
    }

    fn kind_to_str(kind: MessageKind) -> &'static str {
        match kind {
            MessageKind::AnnounceBlockHeader => "announceBlockHeader",
            MessageKind::RequestBlockHeaders => "requestBlockHeaders",
            MessageKind::RequestBlocks => "requestBlocks",
            MessageKind::Transaction => "transaction",
            MessageKind::MPC => "mpc",
        }
    }

    fn class_to_str(class: NodeClass) -> &'static str {
        match class {
            NodeClass::Core => "core",
            NodeClass::Relay => "relay",
            NodeClass::Edge => "edge",
        }
    }

    fn precedence_to_str(p: Precedence) -> &'static str {
        match p {
            Precedence::Lowest => "lowest",
            Precedence::Low => "low",
            Precedence::Medium => "medium",
            Precedence::High => "high",
            Precedence::Highest => "highest",
        }
    }

    fn rule_to_doc(rule: &EnqueueRule) -> crate::policy::document::EnqueueRuleDoc {
        use crate::policy::document::*;
        match rule {
            EnqueueRule::EnqueueAll {
                node_class,
                max_ahead,
                precedence,
            } => EnqueueRuleDoc {
                all: Some(EnqueueAllDoc {
                    node_type: class_to_str(*node_class).to_string(),
                    max_ahead: *max_ahead,
                    precedence: precedence_to_str(*precedence).to_string(),
                }),
                one: None,
            },
            EnqueueRule::EnqueueOne {
                node_classes,
                max_ahead,
                precedence,
            } => EnqueueRuleDoc {
                all: None,
                one: Some(EnqueueOneDoc {
                    node_types: node_classes.iter().map(|c| class_to_str(*c).to_string()).collect(),
                    max_ahead: *max_ahead,
                    precedence: precedence_to_str(*precedence).to_string(),
                }),
            },
        }
    }

    fn group(peers: &[(&str, NodeClass)]) -> Vec<Peer> {
        peers
            .iter()
            .map(|(id, class)| Peer::new(PeerId::new(*id), *class))
            .collect()
    }

    async fn queue_with(tiers: PeerTiers, policy: PolicyModel, transport: Arc<ScriptedTransport>) -> OutboundQueue {
        let peer_model = PeerModel::new();
        let queue = OutboundQueue::new(peer_model, policy, transport);
        queue.add_known_peers(tiers).await;
        queue
    }

    #[tokio::test]
    async fn static_relay_fan_out_creates_one_entry_per_peer() {
        let mut tiers = PeerTiers::new();
        tiers.insert(
            NodeClass::Core,
            vec![group(&[("a:1", NodeClass::Core), ("b:1", NodeClass::Core), ("c:1", NodeClass::Core)])],
        );
        let policy = policy_with(
            vec![(
                MessageKind::Transaction,
                false,
                EnqueueRule::EnqueueAll {
                    node_class: NodeClass::Core,
                    max_ahead: 0,
                    precedence: Precedence::Medium,
                },
            )],
            vec![(
                NodeClass::Core,
                DequeueRule {
                    max_in_flight: 4,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            )],
            vec![],
        );
        let transport = Arc::new(ScriptedTransport::new());
        let queue = queue_with(tiers, policy, transport).await;

        let report = queue
            .enqueue(Submission {
                kind: MessageKind::Transaction,
                origin: Origin::Sender,
                payload: Bytes::from_static(b"txn"),
            })
            .await;

        assert_eq!(report.accepted.len(), 3);
        assert!(report.denied.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_second_peer_when_primary_suspended() {
        let mut tiers = PeerTiers::new();
        tiers.insert(
            NodeClass::Relay,
            vec![group(&[("p1:1", NodeClass::Relay), ("p2:1", NodeClass::Relay)])],
        );
        let policy = policy_with(
            vec![(
                MessageKind::RequestBlocks,
                false,
                EnqueueRule::EnqueueOne {
                    node_classes: vec![NodeClass::Relay],
                    max_ahead: 1,
                    precedence: Precedence::High,
                },
            )],
            vec![(
                NodeClass::Relay,
                DequeueRule {
                    max_in_flight: 4,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            )],
            vec![(NodeClass::Relay, MessageKind::RequestBlocks, Duration::from_secs(5))],
        );
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .script(PeerId::new("p1:1"), vec![SendOutcome::Failed(crate::transport::TransportError::Timeout)])
            .await;
        let queue = queue_with(tiers, policy, Arc::clone(&transport)).await;

        // Drive a failing send to p1 to put it in suspend, then submit again.
        let first = queue
            .enqueue(Submission {
                kind: MessageKind::RequestBlocks,
                origin: Origin::Sender,
                payload: Bytes::from_static(b"req"),
            })
            .await;
        assert_eq!(first.accepted, vec![PeerId::new("p1:1")]);
        queue.tick().await;
        // allow the spawned completion task to run
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = queue
            .enqueue(Submission {
                kind: MessageKind::RequestBlocks,
                origin: Origin::Sender,
                payload: Bytes::from_static(b"req2"),
            })
            .await;
        assert_eq!(second.accepted, vec![PeerId::new("p2:1")]);
    }

    #[tokio::test]
    async fn admission_denied_when_higher_precedence_entries_exceed_max_ahead() {
        let mut tiers = PeerTiers::new();
        tiers.insert(NodeClass::Relay, vec![group(&[("q:1", NodeClass::Relay)])]);
        // `RequestBlockHeaders` seeds two High-precedence entries ahead of `q:1`.
        // `RequestBlocks` is admitted at Medium with max_ahead=1 (should be denied,
        // since 2 > 1). `AnnounceBlockHeader` is admitted at High with max_ahead=0
        // (should succeed, since max_ahead counts *strictly greater* precedence only,
        // and two other High-precedence entries don't count against a High arrival).
        let policy = policy_with(
            vec![
                (
                    MessageKind::RequestBlockHeaders,
                    false,
                    EnqueueRule::EnqueueAll {
                        node_class: NodeClass::Relay,
                        max_ahead: 100,
                        precedence: Precedence::High,
                    },
                ),
                (
                    MessageKind::RequestBlocks,
                    false,
                    EnqueueRule::EnqueueAll {
                        node_class: NodeClass::Relay,
                        max_ahead: 1,
                        precedence: Precedence::Medium,
                    },
                ),
                (
                    MessageKind::AnnounceBlockHeader,
                    false,
                    EnqueueRule::EnqueueAll {
                        node_class: NodeClass::Relay,
                        max_ahead: 0,
                        precedence: Precedence::High,
                    },
                ),
            ],
            vec![(
                NodeClass::Relay,
                DequeueRule {
                    max_in_flight: 100,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            )],
            vec![],
        );
        let transport = Arc::new(ScriptedTransport::new());
        let queue = queue_with(tiers, policy, transport).await;

        for _ in 0..2 {
            queue
                .enqueue(Submission {
                    kind: MessageKind::RequestBlockHeaders,
                    origin: Origin::Sender,
                    payload: Bytes::from_static(b"h"),
                })
                .await;
        }

        let report = queue
            .enqueue(Submission {
                kind: MessageKind::RequestBlocks,
                origin: Origin::Sender,
                payload: Bytes::from_static(b"m"),
            })
            .await;
        assert_eq!(report.denied, vec![PeerId::new("q:1")]);

        let report_high = queue
            .enqueue(Submission {
                kind: MessageKind::AnnounceBlockHeader,
                origin: Origin::Sender,
                payload: Bytes::from_static(b"h2"),
            })
            .await;
        assert_eq!(report_high.accepted, vec![PeerId::new("q:1")]);
    }

    #[tokio::test]
    async fn origin_exclusion_skips_the_forwarding_source() {
        let mut tiers = PeerTiers::new();
        tiers.insert(
            NodeClass::Relay,
            vec![group(&[("s:1", NodeClass::Relay)]), group(&[("t:1", NodeClass::Relay)]), group(&[("u:1", NodeClass::Relay)])],
        );
        let policy = policy_with(
            vec![(
                MessageKind::Transaction,
                true,
                EnqueueRule::EnqueueAll {
                    node_class: NodeClass::Relay,
                    max_ahead: 10,
                    precedence: Precedence::Low,
                },
            )],
            vec![(
                NodeClass::Relay,
                DequeueRule {
                    max_in_flight: 4,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            )],
            vec![],
        );
        let transport = Arc::new(ScriptedTransport::new());
        let queue = queue_with(tiers, policy, transport).await;

        let report = queue
            .enqueue(Submission {
                kind: MessageKind::Transaction,
                origin: Origin::Forward(PeerId::new("s:1")),
                payload: Bytes::from_static(b"fwd"),
            })
            .await;

        assert_eq!(report.accepted.len(), 2);
        assert!(!report.accepted.contains(&PeerId::new("s:1")));
    }

    // Uses a short real cooldown rather than paused virtual time: the
    // suspend window is read from a real `Instant`, so exercising it
    // deterministically without flakiness needs the wall clock to
    // actually move.
    #[tokio::test]
    async fn suspend_window_blocks_until_reconsider_after_elapses() {
        let mut tiers = PeerTiers::new();
        tiers.insert(NodeClass::Core, vec![group(&[("r:1", NodeClass::Core)])]);
        let cooldown = Duration::from_millis(120);
        let policy = policy_with(
            vec![(
                MessageKind::AnnounceBlockHeader,
                false,
                EnqueueRule::EnqueueAll {
                    node_class: NodeClass::Core,
                    max_ahead: 100,
                    precedence: Precedence::Highest,
                },
            )],
            vec![(
                NodeClass::Core,
                DequeueRule {
                    max_in_flight: 4,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            )],
            vec![(NodeClass::Core, MessageKind::AnnounceBlockHeader, cooldown)],
        );
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .script(
                PeerId::new("r:1"),
                vec![SendOutcome::Failed(crate::transport::TransportError::Timeout)],
            )
            .await;
        let queue = queue_with(tiers, policy, Arc::clone(&transport)).await;

        async fn send(queue: &OutboundQueue) -> EnqueueReport {
            queue
                .enqueue(Submission {
                    kind: MessageKind::AnnounceBlockHeader,
                    origin: Origin::Sender,
                    payload: Bytes::from_static(b"h"),
                })
                .await
        }

        // t=0: the send fails, opening the suspend window for (r:1, AnnounceBlockHeader).
        let first = send(&queue).await;
        assert_eq!(first.accepted, vec![PeerId::new("r:1")]);
        queue.tick().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Still within the window: r:1 is skipped.
        let mid_window = send(&queue).await;
        assert!(mid_window.accepted.is_empty());

        // After the window elapses: r:1 receives the message again.
        tokio::time::sleep(cooldown).await;
        let after_window = send(&queue).await;
        assert_eq!(after_window.accepted, vec![PeerId::new("r:1")]);
    }
}
