// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Command-line / environment configuration surface. Launch scripts and
//! configuration-file discovery beyond this are out of this crate's scope.

use std::path::PathBuf;
use structopt::StructOpt;

/// Verbosity, independent of `RUST_LOG`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Errors, warnings and info (the default).
    Info,
    /// Also debug.
    Debug,
    /// Everything, including trace.
    Trace,
}

impl Verbosity {
    /// The `tracing`/`EnvFilter` level-filter string this verbosity maps to.
    pub fn as_level_str(self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    fn from_occurrences(count: u64) -> Self {
        match count {
            0 => Verbosity::Error,
            1 => Verbosity::Warn,
            2 => Verbosity::Info,
            3 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

/// Launch configuration for the node binary.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "omq-node", rename_all = "kebab-case")]
pub struct Config {
    /// Path to the topology document.
    #[structopt(long, parse(from_os_str))]
    pub topology: PathBuf,

    /// Path to the policy document. When absent, `PolicyModel::defaults_for`
    /// is used instead.
    #[structopt(long, parse(from_os_str))]
    pub policy: Option<PathBuf>,

    /// This node's own name within the topology document's node table
    /// (required for `Static` topologies; ignored otherwise).
    #[structopt(long)]
    pub node_name: Option<String>,

    /// Increase logging verbosity; may be repeated (-vv, -vvv, ...).
    #[structopt(short, long, parse(from_occurrences = Verbosity::from_occurrences))]
    pub verbose: Verbosity,

    /// Directory to write rolling log files to. Logs to stdout if absent.
    #[structopt(long, parse(from_os_str))]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON instead of the compact human format.
    #[structopt(long)]
    pub json_logs: bool,
}

impl Config {
    /// Parses configuration from the process's command-line arguments.
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }
}
