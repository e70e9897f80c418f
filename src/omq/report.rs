// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Outcome of one `OutboundQueue::enqueue` call. Admission denial and
//! no-route are ordinary data, never an `Error`.

use crate::peer::PeerId;

/// What happened to each candidate recipient of one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnqueueReport {
    /// Peers for which an entry was pushed onto their link queue.
    pub accepted: Vec<PeerId>,
    /// Peers skipped because admission arithmetic rejected them.
    pub denied: Vec<PeerId>,
    /// Alternative groups (by index within their tier) for which no member
    /// passed suspension and admission checks (`EnqueueOne` only).
    pub no_route: Vec<usize>,
}

impl EnqueueReport {
    /// An empty report. A submission that matches no enqueue rule, or whose
    /// rules name no currently-known peers, yields this — not an error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merges another report's entries into this one.
    pub fn merge(&mut self, other: EnqueueReport) {
        self.accepted.extend(other.accepted);
        self.denied.extend(other.denied);
        self.no_route.extend(other.no_route);
    }
}
