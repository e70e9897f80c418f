// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The "send one message to one peer" primitive the OMQ dispatches against.
//! Binary encoding, retries above the per-link level, and connection
//! management policy beyond reconnect-on-failure are all out of scope —
//! the OMQ only ever calls [`Transport::submit`] and awaits the handle it
//! returns.

use crate::peer::PeerId;
use async_trait::async_trait;
use bytes::Bytes;
use futures::lock::Mutex;
use lru_time_cache::LruCache;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;

/// Why a submitted send did not reach `Delivered`.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The transport's own completion timeout fired. Treated identically
    /// to every other failure by the OMQ.
    #[error("send timed out")]
    Timeout,
    /// The peer address could not be parsed or connected to.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Any other transport-level failure.
    #[error("send failed: {0}")]
    Other(String),
}

/// What a submitted send resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The transport confirmed delivery.
    Delivered,
    /// The transport gave up.
    Failed(TransportError),
}

/// A non-blocking send in flight. Resolves to the outcome once the
/// transport's own future completes; the OMQ awaits this from a spawned
/// task rather than a literal callback.
pub struct InFlightHandle {
    inner: Pin<Box<dyn Future<Output = SendOutcome> + Send>>,
}

impl InFlightHandle {
    /// Wraps any future resolving to a `SendOutcome`.
    pub fn new(fut: impl Future<Output = SendOutcome> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(fut),
        }
    }

    /// An already-resolved handle, useful for fakes in tests.
    pub fn ready(outcome: SendOutcome) -> Self {
        Self::new(async move { outcome })
    }
}

impl Future for InFlightHandle {
    type Output = SendOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// A transport capable of delivering one opaque payload to one peer.
///
/// Implementations must not block on network completion inside `submit`
/// itself — `submit` hands back a handle; the caller awaits it separately.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begins sending `payload` to `peer`. Returns immediately with a
    /// handle that resolves once the transport knows the outcome.
    async fn submit(&self, peer: &PeerId, payload: Bytes) -> InFlightHandle;
}

impl fmt::Debug for InFlightHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightHandle").finish_non_exhaustive()
    }
}

const CONNECTIONS_CACHE_SIZE: usize = 1024;

/// Reference `Transport` built on `qp2p`, adapted from the routing layer's
/// connection-caching comms component: cache connections by address, try
/// the cached one first, reconnect on failure.
pub struct QuicTransport {
    // Kept alive alongside `endpoint`, which borrows its networking context;
    // never read directly, but dropping it would tear the endpoint down.
    _quic_p2p: qp2p::QuicP2p,
    endpoint: qp2p::Endpoint,
    conns: Mutex<LruCache<SocketAddr, Arc<qp2p::Connection>>>,
}

impl QuicTransport {
    /// Creates a transport bound to a fresh local endpoint. The only fatal
    /// condition in this crate's error model: failure here aborts startup.
    pub async fn new(config: qp2p::Config) -> crate::error::Result<Self> {
        let quic_p2p = qp2p::QuicP2p::with_config(Some(config), Default::default(), true)
            .map_err(|e| crate::error::Error::TransportInit(e.to_string()))?;
        let endpoint = quic_p2p
            .new_endpoint()
            .map_err(|e| crate::error::Error::TransportInit(e.to_string()))?;
        Ok(Self {
            _quic_p2p: quic_p2p,
            endpoint,
            conns: Mutex::new(LruCache::with_capacity(CONNECTIONS_CACHE_SIZE)),
        })
    }

    async fn send_to(&self, addr: SocketAddr, payload: Bytes) -> Result<(), qp2p::Error> {
        let cached = self.conns.lock().await.get(&addr).cloned();
        if let Some(conn) = cached {
            if conn.send_uni(payload.clone()).await.is_ok() {
                return Ok(());
            }
            let _ = self.conns.lock().await.remove(&addr);
        }

        let conn = self.endpoint.connect_to(&addr).await?;
        conn.send_uni(payload).await?;
        let _ = self.conns.lock().await.insert(addr, Arc::new(conn));
        Ok(())
    }
}

#[async_trait]
impl Transport for QuicTransport {
    async fn submit(&self, peer: &PeerId, payload: Bytes) -> InFlightHandle {
        let addr: Result<SocketAddr, _> = peer.as_str().parse();
        let addr = match addr {
            Ok(addr) => addr,
            Err(e) => {
                return InFlightHandle::ready(SendOutcome::Failed(TransportError::ConnectionFailed(
                    e.to_string(),
                )))
            }
        };

        match self.send_to(addr, payload).await {
            Ok(()) => InFlightHandle::ready(SendOutcome::Delivered),
            Err(e) => InFlightHandle::ready(SendOutcome::Failed(TransportError::Other(e.to_string()))),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod fake {
    //! A scriptable transport for deterministic tests.

    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex as AsyncMutex;

    /// A `Transport` whose per-peer outcome is fixed in advance.
    pub struct ScriptedTransport {
        outcomes: AsyncMutex<HashMap<PeerId, Vec<SendOutcome>>>,
        default: SendOutcome,
        pub sends: AsyncMutex<Vec<PeerId>>,
    }

    impl ScriptedTransport {
        /// A transport that delivers every send unless scripted otherwise.
        pub fn new() -> Self {
            Self {
                outcomes: AsyncMutex::new(HashMap::new()),
                default: SendOutcome::Delivered,
                sends: AsyncMutex::new(Vec::new()),
            }
        }

        /// Scripts the outcomes for a given peer, consumed in order, one
        /// per `submit` call; once exhausted, `default` applies.
        pub async fn script(&self, peer: PeerId, outcomes: Vec<SendOutcome>) {
            self.outcomes.lock().await.insert(peer, outcomes);
        }
    }

    impl Default for ScriptedTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn submit(&self, peer: &PeerId, _payload: Bytes) -> InFlightHandle {
            self.sends.lock().await.push(peer.clone());
            let outcome = {
                let mut outcomes = self.outcomes.lock().await;
                match outcomes.get_mut(peer) {
                    Some(queue) if !queue.is_empty() => queue.remove(0),
                    _ => self.default.clone(),
                }
            };
            InFlightHandle::ready(outcome)
        }
    }
}
