//! Type-safe arguments for the cluster bootstrap scripts.
//!
//! | Struct            | Directive key | Command |
//! |-------------------|---------------|---------|
//! | `K8sMasterArgs`   | none          | `scripts/k8s_master.sh` |
//! | `K8sJoinArgs`     | `K8S_JOIN`    | `scripts/k8s_join.sh <master-ip>` |
//! | `IsolateCpusArgs` | `ISOLCPUS`    | `scripts/isolcpus.sh <count>` |
//! | `NoRebootMarker`  | `NOREBOOT`    | `touch /local/repository/.noreboot` |
//! | `ConfigureArgs`   | none          | `scripts/configure.sh` |
//!
//! The master and configure scripts run directly as a node's startup
//! command; the others are handed to `configure.sh` as directives.

use std::net::Ipv4Addr;

use crate::script_traits::{script_path, DirectiveScript, StartupScript, REPOSITORY_DIR};

// ============================================================================
// Kubernetes
// ============================================================================

/// Control-plane setup, run on the master node only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct K8sMasterArgs;

impl StartupScript for K8sMasterArgs {
    fn program(&self) -> String {
        script_path("k8s_master.sh")
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![]
    }
}

/// Joins a worker to the cluster run by the control-plane node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct K8sJoinArgs {
    /// Cluster-network address of the control-plane node.
    pub master: Ipv4Addr,
}

impl StartupScript for K8sJoinArgs {
    fn program(&self) -> String {
        script_path("k8s_join.sh")
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.master.to_string()]
    }
}

impl DirectiveScript for K8sJoinArgs {
    fn directive_key(&self) -> &'static str {
        "K8S_JOIN"
    }
}

// ============================================================================
// CPU isolation
// ============================================================================

/// Reserves `count` cores from the scheduler. Requires a reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolateCpusArgs {
    pub count: u32,
}

impl StartupScript for IsolateCpusArgs {
    fn program(&self) -> String {
        script_path("isolcpus.sh")
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.count.to_string()]
    }
}

impl DirectiveScript for IsolateCpusArgs {
    fn directive_key(&self) -> &'static str {
        "ISOLCPUS"
    }
}

/// Leaves a marker telling the configure script no reboot is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRebootMarker;

impl NoRebootMarker {
    pub fn marker_path() -> String {
        format!("{}/.noreboot", REPOSITORY_DIR)
    }
}

impl StartupScript for NoRebootMarker {
    fn program(&self) -> String {
        "touch".to_string()
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![Self::marker_path()]
    }
}

impl DirectiveScript for NoRebootMarker {
    fn directive_key(&self) -> &'static str {
        "NOREBOOT"
    }
}

// ============================================================================
// Configure
// ============================================================================

/// Final step on every worker; runs the directives it is handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureArgs;

impl StartupScript for ConfigureArgs {
    fn program(&self) -> String {
        script_path("configure.sh")
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k8s_join_passes_master_address() {
        let args = K8sJoinArgs {
            master: Ipv4Addr::new(192, 168, 1, 1),
        };
        assert_eq!(args.to_cli_args(), vec!["192.168.1.1".to_string()]);
        assert_eq!(
            args.to_directive(),
            "K8S_JOIN=\"/local/repository/scripts/k8s_join.sh 192.168.1.1\""
        );
    }

    #[test]
    fn test_isolcpus_count() {
        let args = IsolateCpusArgs { count: 6 };
        assert!(args.command_line().ends_with("isolcpus.sh 6"));
        assert_eq!(args.directive_key(), "ISOLCPUS");
    }

    #[test]
    fn test_noreboot_marker() {
        assert_eq!(
            NoRebootMarker.command_line(),
            "touch /local/repository/.noreboot"
        );
    }

    #[test]
    fn test_directive_keys() {
        let join = K8sJoinArgs {
            master: Ipv4Addr::new(192, 168, 1, 1),
        };
        let scripts: [&dyn DirectiveScript; 3] =
            [&join, &IsolateCpusArgs { count: 1 }, &NoRebootMarker];
        let keys: Vec<&str> = scripts.iter().map(|s| s.directive_key()).collect();
        assert_eq!(keys, vec!["K8S_JOIN", "ISOLCPUS", "NOREBOOT"]);
    }

    #[test]
    fn test_master_and_configure_take_no_args() {
        assert!(K8sMasterArgs.to_cli_args().is_empty());
        assert_eq!(
            ConfigureArgs.command_line(),
            "/local/repository/scripts/configure.sh"
        );
    }
}
