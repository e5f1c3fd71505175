//! Cluster request builder.
//!
//! Turns verified [`ClusterParams`] into a complete [`Request`]:
//!
//! 1. derive the worker directives,
//! 2. add the control-plane node when Kubernetes is requested,
//! 3. add one worker per machine,
//! 4. add the USRP-attached node when a location is chosen,
//! 5. put every addressed node on the shared `Network` LAN.
//!
//! The builder does not validate parameters; see [`crate::params::verify`].

use tracing::{debug, info};

use crate::address::ClusterSubnet;
use crate::directives::WorkerDirectives;
use crate::error::Result;
use crate::params::ClusterParams;
use crate::rspec::{raw_pc, shared_lan, ComponentBinding, Node, NodeSpec, Request, Tour};
use crate::script_traits::StartupScript;
use crate::scripts::cluster::K8sMasterArgs;
use crate::types::ProfileKind;

pub const NETWORK_LINK: &str = "Network";
pub const MASTER_NODE: &str = "master";
pub const USRP_NODE: &str = "b210";
/// NUC wired to the B210 at every POWDER fixed endpoint
pub const USRP_COMPONENT: &str = "nuc2";

pub fn worker_name(index: u32) -> String {
    format!("node{}", index)
}

/// Portal tour text for a profile
pub fn tour(profile: ProfileKind) -> Tour {
    match profile {
        ProfileKind::Compute => Tour {
            description: "Compute Cluster".to_string(),
            instructions: "Not instructions yet".to_string(),
        },
        ProfileKind::Kubernetes => Tour {
            description: "Compute cluster with optional Kubernetes, CPU isolation and USRP B210"
                .to_string(),
            instructions: concat!(
                "Workers are `node0`, `node1`, ... on 192.168.1.0/24.\n\n",
                "With Kubernetes enabled, `master` runs the control plane at 192.168.1.1 ",
                "and workers join it on boot. Nodes configured with isolated CPUs reboot ",
                "once after setup."
            )
            .to_string(),
        },
    }
}

fn control_plane(params: &ClusterParams, subnet: &ClusterSubnet) -> Result<Node> {
    let address = subnet.host(0)?;
    let hardware = params.hardware.to_string();
    debug!("Control-plane node {} at {}", MASTER_NODE, address);
    Ok(raw_pc(NodeSpec {
        client_id: MASTER_NODE,
        disk_image: &params.os,
        hardware_type: Some(&hardware),
        address: Some((address, subnet.netmask())),
        startup_command: Some(K8sMasterArgs.command_line()),
        routable_control_ip: true,
        component: None,
    }))
}

fn workers(
    params: &ClusterParams,
    subnet: &ClusterSubnet,
    startup: Option<&str>,
) -> Result<Vec<Node>> {
    let hardware = params.hardware.to_string();
    let offset = params.control_plane_offset();

    (0..params.machine_num)
        .map(|i| -> Result<Node> {
            let name = worker_name(i);
            let address = subnet.host(i + offset)?;
            Ok(raw_pc(NodeSpec {
                client_id: &name,
                disk_image: &params.os,
                hardware_type: Some(&hardware),
                address: Some((address, subnet.netmask())),
                startup_command: startup.map(str::to_string),
                ..NodeSpec::default()
            }))
        })
        .collect()
}

fn usrp_node(params: &ClusterParams) -> Option<Node> {
    let authority = params.usrp.authority()?;
    debug!("USRP B210 node bound to {}", authority);
    Some(raw_pc(NodeSpec {
        client_id: USRP_NODE,
        disk_image: &params.os,
        component: Some(ComponentBinding {
            manager_id: authority,
            component_id: USRP_COMPONENT.to_string(),
        }),
        ..NodeSpec::default()
    }))
}

/// Build the request for verified parameters.
pub fn build_request(params: &ClusterParams) -> Result<Request> {
    let subnet = ClusterSubnet::default();

    let startup = if params.profile.runs_startup_scripts() {
        Some(WorkerDirectives::from_params(params, &subnet)?.startup_command())
    } else {
        None
    };

    let mut nodes = Vec::new();
    if params.k8s {
        nodes.push(control_plane(params, &subnet)?);
    }
    nodes.extend(workers(params, &subnet, startup.as_deref())?);

    let lan = shared_lan(NETWORK_LINK, &nodes);

    if let Some(node) = usrp_node(params) {
        nodes.push(node);
    }

    info!(
        "Built {} request: {} nodes, {} on {}",
        params.profile,
        nodes.len(),
        lan.interface_refs.len(),
        NETWORK_LINK
    );

    Ok(Request {
        tour: Some(tour(params.profile)),
        nodes,
        links: vec![lan],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use crate::types::{Hardware, UsrpLocation};
    use std::net::Ipv4Addr;

    fn kube(machine_num: u32, k8s: bool, isolcpus: u32) -> ClusterParams {
        ClusterParams {
            profile: ProfileKind::Kubernetes,
            machine_num,
            k8s,
            isolcpus,
            ..ClusterParams::default()
        }
    }

    fn address(node: &Node) -> Ipv4Addr {
        node.interface.as_ref().unwrap().address
    }

    #[test]
    fn test_compute_profile_has_no_startup() {
        let params = ClusterParams {
            machine_num: 2,
            hardware: Hardware::Pc3000,
            ..ClusterParams::default()
        };
        let request = build_request(&params).unwrap();
        assert_eq!(request.nodes.len(), 2);
        for node in &request.nodes {
            assert!(node.startup_command.is_none());
            assert_eq!(node.hardware_type.as_deref(), Some("pc3000"));
        }
        assert_eq!(request.tour.unwrap().description, "Compute Cluster");
    }

    #[test]
    fn test_master_first_address() {
        let request = build_request(&kube(2, true, 0)).unwrap();
        let master = request.node(MASTER_NODE).unwrap();
        assert_eq!(address(master), Ipv4Addr::new(192, 168, 1, 1));
        assert!(master.routable_control_ip);
        assert_eq!(
            master.startup_command.as_deref(),
            Some("/local/repository/scripts/k8s_master.sh")
        );
        assert_eq!(address(request.node("node0").unwrap()), Ipv4Addr::new(192, 168, 1, 2));
    }

    #[test]
    fn test_zero_machines() {
        let request = build_request(&kube(0, false, 0)).unwrap();
        assert!(request.nodes.is_empty());
        assert!(request.links[0].interface_refs.is_empty());
    }

    #[test]
    fn test_usrp_node_not_on_link() {
        let params = ClusterParams {
            usrp: UsrpLocation::Ebc,
            ..kube(1, false, 0)
        };
        let request = build_request(&params).unwrap();
        let radio = request.node(USRP_NODE).unwrap();
        assert!(radio.interface.is_none());
        assert!(radio.hardware_type.is_none());
        assert_eq!(radio.component.as_ref().unwrap().component_id, USRP_COMPONENT);
        assert!(!request.links[0].interface_refs.iter().any(|r| r.starts_with(USRP_NODE)));
    }

    #[test]
    fn test_full_subnet() {
        let request = build_request(&kube(253, true, 0)).unwrap();
        let last = request.node("node252").unwrap();
        assert_eq!(address(last), Ipv4Addr::new(192, 168, 1, 254));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(build_request(&kube(254, true, 0)).is_err());
    }

    #[test]
    fn test_unverified_huge_count_is_an_address_error() {
        let err = build_request(&kube(u32::MAX, false, 0)).unwrap_err();
        assert!(matches!(err, ProfileError::Address(_)));
    }
}
