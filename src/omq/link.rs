// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Per-peer scheduling state: the pending heap, in-flight counter, rate
//! limiter and per-kind suspension timers.

use crate::message::{MessageKind, Precedence};
use crate::peer::Peer;
use crate::policy::{DequeueRule, RateLimit};
use bytes::Bytes;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Instant;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One queued send, ordered by (precedence desc, submit_order asc).
#[derive(Clone, Debug)]
pub struct PendingEntry {
    /// The message kind, needed by `on_send_complete` to apply the failure policy.
    pub kind: MessageKind,
    /// Dispatch priority.
    pub precedence: Precedence,
    /// FIFO tie-break among equal precedence; assigned at enqueue time.
    pub submit_order: u64,
    /// Opaque wire payload.
    pub payload: Bytes,
}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.precedence == other.precedence && self.submit_order == other.submit_order
    }
}
impl Eq for PendingEntry {}

impl Ord for PendingEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher precedence must sort greater so
        // it's popped first; among equal precedence, the *smaller*
        // submit_order must sort greater (earlier entries dispatch first).
        self.precedence
            .cmp(&other.precedence)
            .then_with(|| other.submit_order.cmp(&self.submit_order))
    }
}

impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Process-wide monotonically increasing submit-order counter.
#[derive(Default)]
pub struct SubmitOrderCounter(AtomicU64);

impl SubmitOrderCounter {
    /// A fresh counter starting at zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Allocates the next submit order.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, AtomicOrdering::Relaxed)
    }
}

fn build_limiter(rate_limit: RateLimit) -> Option<Limiter> {
    match rate_limit {
        RateLimit::NoRateLimiting => None,
        RateLimit::MaxMsgPerSec(n) => {
            NonZeroU32::new(n).map(|n| RateLimiter::direct(Quota::per_second(n)))
        }
    }
}

/// Per-link scheduling state.
pub struct Link {
    /// The peer this link addresses.
    pub peer: Peer,
    pending: BinaryHeap<PendingEntry>,
    in_flight: usize,
    max_in_flight: usize,
    limiter: Option<Limiter>,
    suspend_until: HashMap<MessageKind, Instant>,
}

impl Link {
    /// Creates an idle link for `peer`, configured by its class's dequeue rule.
    pub fn new(peer: Peer, dequeue_rule: DequeueRule) -> Self {
        Self {
            peer,
            pending: BinaryHeap::new(),
            in_flight: 0,
            max_in_flight: dequeue_rule.max_in_flight,
            limiter: build_limiter(dequeue_rule.rate_limit),
            suspend_until: HashMap::new(),
        }
    }

    /// Whether `kind` is currently suspended on this link.
    pub fn is_suspended(&self, kind: MessageKind, now: Instant) -> bool {
        self.suspend_until
            .get(&kind)
            .map(|until| *until > now)
            .unwrap_or(false)
    }

    /// Suspends `kind` until `now + cooldown`.
    pub fn suspend(&mut self, kind: MessageKind, until: Instant) {
        self.suspend_until.insert(kind, until);
    }

    /// Count of pending entries with precedence strictly greater than `precedence`.
    pub fn count_ahead(&self, precedence: Precedence) -> usize {
        self.pending.iter().filter(|e| e.precedence > precedence).count()
    }

    /// Pushes an admitted entry onto the link's heap.
    pub fn push(&mut self, entry: PendingEntry) {
        self.pending.push(entry);
    }

    /// True if there is spare concurrency, a rate-limit token, and
    /// something pending to send.
    pub fn ready(&self) -> bool {
        self.in_flight < self.max_in_flight
            && !self.pending.is_empty()
            && self.limiter.as_ref().map(|l| l.check().is_ok()).unwrap_or(true)
    }

    /// Pops the next entry to dispatch, incrementing the in-flight counter.
    /// Returns `None` if `ready()` would be false.
    pub fn pop_ready(&mut self) -> Option<PendingEntry> {
        if !self.ready() {
            return None;
        }
        let entry = self.pending.pop()?;
        self.in_flight += 1;
        Some(entry)
    }

    /// Records a completion, freeing the in-flight slot.
    pub fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Drains all pending entries (used when the peer is being removed).
    pub fn drain(&mut self) -> Vec<PendingEntry> {
        self.pending.drain().collect()
    }

    /// Number of entries awaiting dispatch.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
