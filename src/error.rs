// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use std::result;
use thiserror::Error;

/// A specialised `Result` type for this crate.
pub type Result<T> = result::Result<T, Error>;

/// Main error type for the crate.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The topology document was rejected at parse/projection time. Fatal to startup.
    #[error("bad topology: {reason}")]
    BadTopology {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// The policy document was rejected at parse time. Fatal to startup.
    #[error("bad policy: {reason}")]
    BadPolicy {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// The underlying transport could not be constructed at startup.
    #[error("failed to construct transport: {0}")]
    TransportInit(String),
    /// A topology or policy document could not be read from disk.
    #[error("failed to read document at {path}: {source}")]
    DocumentIo {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O message.
        source: String,
    },
}
