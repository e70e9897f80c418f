// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Serde shapes for the ingested policy document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level policy document: three independent tables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Enqueue rules, keyed by message kind.
    #[serde(default)]
    pub enqueue: BTreeMap<String, EnqueueEntryDoc>,
    /// Dequeue rules, keyed by node class (core|relay|edge).
    #[serde(default)]
    pub dequeue: BTreeMap<String, DequeueRuleDoc>,
    /// Failure rules, keyed by node class, then by message kind.
    #[serde(default)]
    pub failure: BTreeMap<String, BTreeMap<String, u64>>,
}

/// An enqueue entry: either a flat list of passes (for kinds with no
/// origin distinction) or a `{send, forward}` pair (for `transaction` and
/// `mpc`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnqueueEntryDoc {
    /// Used by kinds that don't carry an origin distinction.
    Flat(Vec<EnqueueRuleDoc>),
    /// Used by `transaction` and `mpc`.
    SendForward {
        /// Passes applied when this node authored the message.
        send: Vec<EnqueueRuleDoc>,
        /// Passes applied when the message was forwarded from another node.
        forward: Vec<EnqueueRuleDoc>,
    },
}

/// One enqueue pass: exactly one of `all` or `one`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnqueueRuleDoc {
    /// Send to every peer of the given class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<EnqueueAllDoc>,
    /// Send to one peer per eligible alternative group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one: Option<EnqueueOneDoc>,
}

/// `{all: {nodeType, maxAhead, precedence}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnqueueAllDoc {
    /// The node class to fan out to.
    #[serde(rename = "nodeType")]
    pub node_type: String,
    /// Admission limit: reject if more than this many higher-precedence
    /// entries are already pending on the link.
    #[serde(rename = "maxAhead")]
    pub max_ahead: usize,
    /// Precedence assigned to admitted entries.
    pub precedence: String,
}

/// `{one: {nodeTypes, maxAhead, precedence}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnqueueOneDoc {
    /// Node classes whose alternative groups are eligible.
    #[serde(rename = "nodeTypes")]
    pub node_types: Vec<String>,
    /// Admission limit, as in `EnqueueAllDoc`.
    #[serde(rename = "maxAhead")]
    pub max_ahead: usize,
    /// Precedence assigned to admitted entries.
    pub precedence: String,
}

/// `{maxInFlight, rateLimit?}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DequeueRuleDoc {
    /// Per-link concurrency limit.
    #[serde(rename = "maxInFlight")]
    pub max_in_flight: usize,
    /// Absent = no rate limiting; present = max messages per second.
    #[serde(rename = "rateLimit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
}
