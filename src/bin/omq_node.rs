// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Loads a topology document and an optional policy document, builds the
//! outbound queue over a QUIC transport, and runs the dispatcher until the
//! process is killed. Binary encoding, discovery-worker execution, and
//! everything downstream of "a message is ready to be sent" are outside
//! this crate — this binary only wires the pieces together.
#![forbid(unsafe_code)]

use color_eyre::Result;
use omq_node::config::Config;
use omq_node::discovery::IdentityResolver;
use omq_node::document_io;
use omq_node::omq::OutboundQueue;
use omq_node::peer_model::PeerModel;
use omq_node::policy::PolicyModel;
use omq_node::topology::{self, document::TopologyDocument};
use omq_node::transport::QuicTransport;
use std::sync::Arc;
use structopt::StructOpt;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

const MODULE_NAME: &str = "omq_node";

fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::from_args();
    // Held for the rest of `main`: dropping it shuts down the non-blocking
    // writer's background thread, which would silence every log line the
    // node emits for the remainder of its run.
    let _guard = init_logging(&config);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={}", MODULE_NAME, config.verbose.as_level_str()))
    });

    if let Some(log_dir) = &config.log_dir {
        let file_appender = tracing_appender::rolling::hourly(log_dir, "omq_node.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let builder = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_env_filter(filter)
            .with_ansi(false);
        if config.json_logs {
            builder.json().init();
        } else {
            builder.compact().init();
        }
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

async fn run(config: Config) -> Result<()> {
    let topology_doc: TopologyDocument = document_io::load(&config.topology)?;
    let projection = topology::interpret(&topology_doc, config.node_name.as_deref(), &IdentityResolver)?;

    for domain in &projection.dns_failures {
        tracing::warn!(%domain, "DNS resolution failed during topology projection");
    }

    let policy = match &config.policy {
        Some(path) => {
            let doc = document_io::load(path)?;
            PolicyModel::from_document(&doc)?
        }
        None => PolicyModel::defaults_for(projection.self_class),
    };

    let transport = QuicTransport::new(qp2p::Config::default()).await?;

    let peer_model = PeerModel::seeded(projection.initial_peers).await;
    let queue = OutboundQueue::new(peer_model, policy, Arc::new(transport));

    info!(
        self_class = %projection.self_class,
        discovery_workers = projection.discovery.len(),
        "omq_node starting"
    );

    queue.run().await;
    Ok(())
}
