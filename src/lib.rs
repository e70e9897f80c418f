// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Network topology model and outbound message queue for a permissionless
//! node: translates a declarative description of this node's place in the
//! peer-to-peer overlay into a concrete peer set, then schedules outbound
//! message delivery across peer links under per-link concurrency,
//! per-message-kind admission, and per-destination failure backoff.
//!
//! Binary wire encoding, block/transaction validation, UTXO storage, the
//! DHT implementation, and DNS resolution are external collaborators —
//! this crate only consumes their narrow interfaces (see [`transport`] and
//! [`discovery`]).

pub mod config;
pub mod discovery;
pub mod document_io;
pub mod error;
pub mod message;
pub mod omq;
pub mod peer;
pub mod peer_model;
pub mod policy;
pub mod topology;
pub mod transport;

pub use error::{Error, Result};
