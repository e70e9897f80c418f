// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Throughput of the hot admission path: one `enqueue` fanning out across a
//! growing number of Core links, each under the `EnqueueAll` pass that the
//! default Core policy uses for block-related traffic.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use omq_node::message::{MessageKind, Origin, Submission};
use omq_node::omq::OutboundQueue;
use omq_node::peer::{NodeClass, Peer, PeerId};
use omq_node::peer_model::{PeerModel, PeerTiers};
use omq_node::policy::PolicyModel;
use omq_node::transport::fake::ScriptedTransport;
use std::sync::Arc;
use tokio::runtime::Runtime;

async fn build_queue(peer_count: usize) -> OutboundQueue {
    let mut tiers = PeerTiers::new();
    let groups = (0..peer_count)
        .map(|i| vec![Peer::new(PeerId::new(format!("peer-{}:1", i)), NodeClass::Core)])
        .collect();
    tiers.insert(NodeClass::Core, groups);

    let peer_model = PeerModel::new();
    let policy = PolicyModel::defaults_for(NodeClass::Core);
    let transport = Arc::new(ScriptedTransport::new());
    let queue = OutboundQueue::new(peer_model, policy, transport);
    queue.add_known_peers(tiers).await;
    queue
}

fn enqueue_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("enqueue_fan_out");

    for peer_count in [8usize, 64, 256] {
        let queue = rt.block_on(build_queue(peer_count));
        group.bench_with_input(BenchmarkId::from_parameter(peer_count), &peer_count, |b, _| {
            b.to_async(&rt).iter(|| async {
                queue
                    .enqueue(Submission {
                        kind: MessageKind::AnnounceBlockHeader,
                        origin: Origin::Sender,
                        payload: Bytes::from_static(b"header"),
                    })
                    .await
            });
        });
    }

    group.finish();
}

criterion_group!(benches, enqueue_fan_out);
criterion_main!(benches);
