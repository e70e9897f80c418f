// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::peer::PeerId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Closed set of outbound message kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Announce a new block header to the network.
    AnnounceBlockHeader,
    /// Request block headers from a peer.
    RequestBlockHeaders,
    /// Request full blocks from a peer.
    RequestBlocks,
    /// A transaction, authored locally or forwarded from a prior hop.
    Transaction,
    /// A multi-party-computation protocol message, authored locally or forwarded.
    MPC,
}

impl MessageKind {
    /// Whether this kind distinguishes `Sender` from `Forward` origin.
    pub fn carries_origin(self) -> bool {
        matches!(self, MessageKind::Transaction | MessageKind::MPC)
    }
}

/// Whether a relay-eligible message was authored here or forwarded from another node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// This node authored the message.
    Sender,
    /// Relayed from a prior hop.
    Forward(PeerId),
}

/// Five-level total order controlling dispatch order on one link.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Precedence {
    /// Lowest precedence.
    Lowest,
    /// Low precedence.
    Low,
    /// Medium precedence.
    Medium,
    /// High precedence.
    High,
    /// Highest precedence.
    Highest,
}

/// The pair used to look up policy. `Origin` only varies for `Transaction`
/// and `MPC`; for other kinds it is fixed to `Sender`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MsgClass {
    /// The message kind.
    pub kind: MessageKind,
    /// The message's origin.
    pub origin: Origin,
}

impl MsgClass {
    /// If this message was forwarded, the peer it must not be echoed back to.
    pub fn excluded_peer(&self) -> Option<&PeerId> {
        match &self.origin {
            Origin::Forward(src) => Some(src),
            Origin::Sender => None,
        }
    }
}

/// A message submitted to the outbound queue.
#[derive(Clone, Debug)]
pub struct Submission {
    /// The message kind.
    pub kind: MessageKind,
    /// The message's origin. Must be `Origin::Sender` for kinds that don't
    /// carry an origin distinction (`classify` normalizes this).
    pub origin: Origin,
    /// Opaque wire payload. Encoding is outside this crate's scope.
    pub payload: Bytes,
}

/// Maps a submitted message to its `MsgClass`.
///
/// For kinds that don't carry an origin distinction, the origin is
/// normalized to `Sender` regardless of what the submitter supplied.
pub fn classify(submission: &Submission) -> MsgClass {
    let origin = if submission.kind.carries_origin() {
        submission.origin.clone()
    } else {
        Origin::Sender
    };
    MsgClass {
        kind: submission.kind,
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_origin_kinds_normalize_to_sender() {
        let submission = Submission {
            kind: MessageKind::RequestBlocks,
            origin: Origin::Forward(PeerId::new("x:1")),
            payload: Bytes::new(),
        };
        let class = classify(&submission);
        assert_eq!(class.origin, Origin::Sender);
        assert_eq!(class.excluded_peer(), None);
    }

    #[test]
    fn forwarded_transaction_keeps_its_source() {
        let submission = Submission {
            kind: MessageKind::Transaction,
            origin: Origin::Forward(PeerId::new("s:1")),
            payload: Bytes::new(),
        };
        let class = classify(&submission);
        assert_eq!(class.excluded_peer(), Some(&PeerId::new("s:1")));
    }

    #[test]
    fn precedence_orders_lowest_to_highest() {
        assert!(Precedence::Lowest < Precedence::Low);
        assert!(Precedence::Low < Precedence::Medium);
        assert!(Precedence::Medium < Precedence::High);
        assert!(Precedence::High < Precedence::Highest);
    }
}
