//! Worker startup configuration.
//!
//! [`WorkerDirectives`] records which bootstrap steps a worker runs. It is
//! assembled once from the verified parameters and rendered into the same
//! startup command for every worker.

use crate::address::ClusterSubnet;
use crate::error::Result;
use crate::params::ClusterParams;
use crate::script_traits::{DirectiveScript, StartupScript};
use crate::scripts::cluster::{ConfigureArgs, IsolateCpusArgs, K8sJoinArgs, NoRebootMarker};

/// CPU handling on a worker: isolate cores, or mark that no reboot is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuDirective {
    Isolate(IsolateCpusArgs),
    NoReboot(NoRebootMarker),
}

impl CpuDirective {
    fn script(&self) -> &dyn DirectiveScript {
        match self {
            Self::Isolate(args) => args,
            Self::NoReboot(marker) => marker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerDirectives {
    pub cluster_join: Option<K8sJoinArgs>,
    pub cpu: CpuDirective,
}

impl WorkerDirectives {
    /// Derive the directives for `params`.
    ///
    /// The Kubernetes and CPU families are independent; either, both or only
    /// the CPU directive may be present.
    pub fn from_params(params: &ClusterParams, subnet: &ClusterSubnet) -> Result<Self> {
        let cluster_join = if params.k8s {
            Some(K8sJoinArgs {
                master: subnet.host(0)?,
            })
        } else {
            None
        };

        let cpu = match params.isolcpus {
            0 => CpuDirective::NoReboot(NoRebootMarker),
            count => CpuDirective::Isolate(IsolateCpusArgs { count }),
        };

        Ok(Self { cluster_join, cpu })
    }

    /// `KEY="command"` tokens in execution order
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(2);
        if let Some(join) = &self.cluster_join {
            tokens.push(join.to_directive());
        }
        tokens.push(self.cpu.script().to_directive());
        tokens
    }

    /// Full worker startup command: directives followed by the configure script.
    pub fn startup_command(&self) -> String {
        let mut parts = self.tokens();
        parts.push(ConfigureArgs.command_line());
        parts.join(" ")
    }
}
