// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Pure functions from classification inputs to policy values. Constructed
//! once at startup; immutable thereafter.

use crate::error::{Error, Result};
use crate::message::{MessageKind, MsgClass, Origin, Precedence};
use crate::peer::NodeClass;
use crate::policy::document::{
    DequeueRuleDoc, EnqueueAllDoc, EnqueueEntryDoc, EnqueueOneDoc, EnqueueRuleDoc, PolicyDocument,
};
use std::collections::HashMap;
use std::time::Duration;

/// One admission pass of the Enqueue policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnqueueRule {
    /// Enqueue to every peer of `node_class` across all alternative groups.
    EnqueueAll {
        /// Target node class.
        node_class: NodeClass,
        /// Admission limit (strictly-higher-precedence pending count).
        max_ahead: usize,
        /// Precedence assigned to admitted entries.
        precedence: Precedence,
    },
    /// For each alternative group whose primary's class is in `node_classes`,
    /// enqueue to one member (primary if healthy, else fallbacks in order).
    EnqueueOne {
        /// Eligible primary classes.
        node_classes: Vec<NodeClass>,
        /// Admission limit, as in `EnqueueAll`.
        max_ahead: usize,
        /// Precedence assigned to admitted entries.
        precedence: Precedence,
    },
}

/// Per-`NodeClass` dequeue concurrency and rate-limit policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DequeueRule {
    /// Per-link concurrency limit.
    pub max_in_flight: usize,
    /// Per-link rate limit.
    pub rate_limit: RateLimit,
}

/// Per-link send rate limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimit {
    /// No rate limiting.
    NoRateLimiting,
    /// At most this many messages per second.
    MaxMsgPerSec(u32),
}

/// Per-(`NodeClass`, `MessageKind`) cooldown applied after a send failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconsiderAfter(pub Duration);

fn parse_node_class(s: &str) -> Result<NodeClass> {
    match s {
        "core" => Ok(NodeClass::Core),
        "relay" => Ok(NodeClass::Relay),
        "edge" => Ok(NodeClass::Edge),
        other => Err(Error::BadPolicy {
            reason: format!("node type must be one of core|relay|edge, got {:?}", other),
        }),
    }
}

/// Parses one of the five precedence names.
pub fn parse_precedence(s: &str) -> Result<Precedence> {
    match s {
        "lowest" => Ok(Precedence::Lowest),
        "low" => Ok(Precedence::Low),
        "medium" => Ok(Precedence::Medium),
        "high" => Ok(Precedence::High),
        "highest" => Ok(Precedence::Highest),
        other => Err(Error::BadPolicy {
            reason: format!(
                "precedence must be one of lowest|low|medium|high|highest, got {:?}",
                other
            ),
        }),
    }
}

fn parse_message_kind(s: &str) -> Result<MessageKind> {
    match s {
        "announceBlockHeader" => Ok(MessageKind::AnnounceBlockHeader),
        "requestBlockHeaders" => Ok(MessageKind::RequestBlockHeaders),
        "requestBlocks" => Ok(MessageKind::RequestBlocks),
        "transaction" => Ok(MessageKind::Transaction),
        "mpc" => Ok(MessageKind::MPC),
        other => Err(Error::BadPolicy {
            reason: format!("unknown message kind {:?}", other),
        }),
    }
}

fn parse_enqueue_rule(doc: &EnqueueRuleDoc) -> Result<EnqueueRule> {
    match (&doc.all, &doc.one) {
        (Some(all), None) => parse_enqueue_all(all),
        (None, Some(one)) => parse_enqueue_one(one),
        _ => Err(Error::BadPolicy {
            reason: "enqueue rule must have exactly one of 'all' or 'one'".to_string(),
        }),
    }
}

fn parse_enqueue_all(doc: &EnqueueAllDoc) -> Result<EnqueueRule> {
    Ok(EnqueueRule::EnqueueAll {
        node_class: parse_node_class(&doc.node_type)?,
        max_ahead: doc.max_ahead,
        precedence: parse_precedence(&doc.precedence)?,
    })
}

fn parse_enqueue_one(doc: &EnqueueOneDoc) -> Result<EnqueueRule> {
    let node_classes = doc
        .node_types
        .iter()
        .map(|s| parse_node_class(s))
        .collect::<Result<Vec<_>>>()?;
    Ok(EnqueueRule::EnqueueOne {
        node_classes,
        max_ahead: doc.max_ahead,
        precedence: parse_precedence(&doc.precedence)?,
    })
}

fn parse_enqueue_passes(docs: &[EnqueueRuleDoc]) -> Result<Vec<EnqueueRule>> {
    docs.iter().map(parse_enqueue_rule).collect()
}

fn parse_dequeue_rule(doc: &DequeueRuleDoc) -> DequeueRule {
    DequeueRule {
        max_in_flight: doc.max_in_flight,
        rate_limit: match doc.rate_limit {
            Some(n) => RateLimit::MaxMsgPerSec(n),
            None => RateLimit::NoRateLimiting,
        },
    }
}

/// Three orthogonal policies keyed by message kind and peer class.
#[derive(Clone, Debug)]
pub struct PolicyModel {
    enqueue: HashMap<(MessageKind, bool), Vec<EnqueueRule>>,
    dequeue: HashMap<NodeClass, DequeueRule>,
    failure: HashMap<(NodeClass, MessageKind), ReconsiderAfter>,
}

impl PolicyModel {
    /// Parses a policy document into an immutable `PolicyModel`.
    pub fn from_document(doc: &PolicyDocument) -> Result<Self> {
        let mut enqueue = HashMap::new();
        for (kind_str, entry) in &doc.enqueue {
            let kind = parse_message_kind(kind_str)?;
            match entry {
                EnqueueEntryDoc::Flat(passes) => {
                    enqueue.insert((kind, false), parse_enqueue_passes(passes)?);
                }
                EnqueueEntryDoc::SendForward { send, forward } => {
                    enqueue.insert((kind, false), parse_enqueue_passes(send)?);
                    enqueue.insert((kind, true), parse_enqueue_passes(forward)?);
                }
            }
        }

        let mut dequeue = HashMap::new();
        for (class_str, rule) in &doc.dequeue {
            let class = parse_node_class(class_str)?;
            dequeue.insert(class, parse_dequeue_rule(rule));
        }

        let mut failure = HashMap::new();
        for (class_str, by_kind) in &doc.failure {
            let class = parse_node_class(class_str)?;
            for (kind_str, seconds) in by_kind {
                let kind = parse_message_kind(kind_str)?;
                failure.insert((class, kind), ReconsiderAfter(Duration::from_secs(*seconds)));
            }
        }

        Ok(Self {
            enqueue,
            dequeue,
            failure,
        })
    }

    /// The default policy derived from this node's own class, used when no
    /// explicit policy document is provided.
    pub fn defaults_for(self_class: NodeClass) -> Self {
        let mut enqueue = HashMap::new();
        let mut dequeue = HashMap::new();
        let mut failure = HashMap::new();

        for class in [NodeClass::Core, NodeClass::Relay, NodeClass::Edge] {
            dequeue.insert(
                class,
                DequeueRule {
                    max_in_flight: 8,
                    rate_limit: RateLimit::NoRateLimiting,
                },
            );
            for kind in [
                MessageKind::AnnounceBlockHeader,
                MessageKind::RequestBlockHeaders,
                MessageKind::RequestBlocks,
                MessageKind::Transaction,
                MessageKind::MPC,
            ] {
                failure.insert((class, kind), ReconsiderAfter(Duration::from_secs(30)));
            }
        }

        let block_kinds = [
            MessageKind::AnnounceBlockHeader,
            MessageKind::RequestBlockHeaders,
            MessageKind::RequestBlocks,
        ];

        match self_class {
            NodeClass::Core => {
                for kind in block_kinds {
                    enqueue.insert(
                        (kind, false),
                        vec![EnqueueRule::EnqueueAll {
                            node_class: NodeClass::Core,
                            max_ahead: 0,
                            precedence: Precedence::Highest,
                        }],
                    );
                }
                for kind in [MessageKind::Transaction, MessageKind::MPC] {
                    let pass = vec![EnqueueRule::EnqueueAll {
                        node_class: NodeClass::Relay,
                        max_ahead: 0,
                        precedence: Precedence::Medium,
                    }];
                    enqueue.insert((kind, false), pass.clone());
                    enqueue.insert((kind, true), pass);
                }
            }
            NodeClass::Relay | NodeClass::Edge => {
                for kind in block_kinds {
                    enqueue.insert(
                        (kind, false),
                        vec![EnqueueRule::EnqueueAll {
                            node_class: NodeClass::Relay,
                            max_ahead: 0,
                            precedence: Precedence::Medium,
                        }],
                    );
                }
                for kind in [MessageKind::Transaction, MessageKind::MPC] {
                    let pass = vec![EnqueueRule::EnqueueAll {
                        node_class: NodeClass::Relay,
                        max_ahead: 0,
                        precedence: Precedence::Medium,
                    }];
                    enqueue.insert((kind, false), pass.clone());
                    enqueue.insert((kind, true), pass);
                }
            }
        }

        Self {
            enqueue,
            dequeue,
            failure,
        }
    }

    /// The enqueue passes to apply for a classified message.
    pub fn enqueue_rule(&self, msg_class: &MsgClass) -> Vec<EnqueueRule> {
        let forward = matches!(msg_class.origin, Origin::Forward(_));
        self.enqueue
            .get(&(msg_class.kind, forward))
            .cloned()
            .unwrap_or_default()
    }

    /// The dequeue concurrency/rate policy for a node class.
    pub fn dequeue_rule(&self, class: NodeClass) -> DequeueRule {
        self.dequeue.get(&class).copied().unwrap_or(DequeueRule {
            max_in_flight: 1,
            rate_limit: RateLimit::NoRateLimiting,
        })
    }

    /// The failure cooldown for a (class, kind) pair.
    pub fn failure_rule(&self, class: NodeClass, kind: MessageKind) -> ReconsiderAfter {
        self.failure
            .get(&(class, kind))
            .copied()
            .unwrap_or(ReconsiderAfter(Duration::from_secs(30)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::document::EnqueueEntryDoc;
    use std::collections::BTreeMap;

    #[test]
    fn roundtrips_enqueue_dequeue_failure_from_document() {
        let mut enqueue = BTreeMap::new();
        enqueue.insert(
            "requestBlocks".to_string(),
            EnqueueEntryDoc::Flat(vec![EnqueueRuleDoc {
                all: Some(EnqueueAllDoc {
                    node_type: "core".to_string(),
                    max_ahead: 2,
                    precedence: "high".to_string(),
                }),
                one: None,
            }]),
        );
        enqueue.insert(
            "transaction".to_string(),
            EnqueueEntryDoc::SendForward {
                send: vec![EnqueueRuleDoc {
                    all: None,
                    one: Some(EnqueueOneDoc {
                        node_types: vec!["relay".to_string()],
                        max_ahead: 1,
                        precedence: "low".to_string(),
                    }),
                }],
                forward: vec![],
            },
        );

        let mut dequeue = BTreeMap::new();
        dequeue.insert(
            "core".to_string(),
            DequeueRuleDoc {
                max_in_flight: 4,
                rate_limit: Some(10),
            },
        );

        let mut failure = BTreeMap::new();
        let mut by_kind = BTreeMap::new();
        by_kind.insert("requestBlocks".to_string(), 5u64);
        failure.insert("core".to_string(), by_kind);

        let doc = PolicyDocument {
            enqueue,
            dequeue,
            failure,
        };
        let model = PolicyModel::from_document(&doc).unwrap();

        let class = MsgClass {
            kind: MessageKind::RequestBlocks,
            origin: Origin::Sender,
        };
        assert_eq!(
            model.enqueue_rule(&class),
            vec![EnqueueRule::EnqueueAll {
                node_class: NodeClass::Core,
                max_ahead: 2,
                precedence: Precedence::High,
            }]
        );

        let txn_forward = MsgClass {
            kind: MessageKind::Transaction,
            origin: Origin::Forward(crate::peer::PeerId::new("s:1")),
        };
        assert!(model.enqueue_rule(&txn_forward).is_empty());

        assert_eq!(
            model.dequeue_rule(NodeClass::Core),
            DequeueRule {
                max_in_flight: 4,
                rate_limit: RateLimit::MaxMsgPerSec(10),
            }
        );
        assert_eq!(
            model.failure_rule(NodeClass::Core, MessageKind::RequestBlocks),
            ReconsiderAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn rejects_enqueue_rule_with_both_all_and_one() {
        let doc = EnqueueRuleDoc {
            all: Some(EnqueueAllDoc {
                node_type: "core".to_string(),
                max_ahead: 0,
                precedence: "high".to_string(),
            }),
            one: Some(EnqueueOneDoc {
                node_types: vec!["core".to_string()],
                max_ahead: 0,
                precedence: "high".to_string(),
            }),
        };
        assert!(matches!(parse_enqueue_rule(&doc), Err(Error::BadPolicy { .. })));
    }

    #[test]
    fn defaults_for_core_sends_blocks_all_core_and_txns_to_relay() {
        let model = PolicyModel::defaults_for(NodeClass::Core);
        let block_class = MsgClass {
            kind: MessageKind::AnnounceBlockHeader,
            origin: Origin::Sender,
        };
        let rules = model.enqueue_rule(&block_class);
        assert_eq!(
            rules,
            vec![EnqueueRule::EnqueueAll {
                node_class: NodeClass::Core,
                max_ahead: 0,
                precedence: Precedence::Highest,
            }]
        );
    }
}
