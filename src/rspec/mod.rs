//! GENI request RSpec model.
//!
//! Nodes, links and the tour are plain immutable values produced by the
//! constructor functions here. Serialization lives in [`xml`].

pub mod xml;

use std::net::Ipv4Addr;

/// Sliver type requested for every node
pub const RAW_PC: &str = "raw-pc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub client_id: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

/// Binding of a node to a specific machine at a remote aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentBinding {
    pub manager_id: String,
    pub component_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub client_id: String,
    pub disk_image: String,
    pub hardware_type: Option<String>,
    pub interface: Option<Interface>,
    pub startup_command: Option<String>,
    pub routable_control_ip: bool,
    pub component: Option<ComponentBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub client_id: String,
    pub interface_refs: Vec<String>,
    pub link_multiplexing: bool,
    pub vlan_tagging: bool,
    pub best_effort: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    pub description: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub tour: Option<Tour>,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Request {
    pub fn node(&self, client_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.client_id == client_id)
    }
}

/// Fields shared by [`raw_pc`] callers
#[derive(Debug, Clone, Default)]
pub struct NodeSpec<'a> {
    pub client_id: &'a str,
    pub disk_image: &'a str,
    pub hardware_type: Option<&'a str>,
    pub address: Option<(Ipv4Addr, Ipv4Addr)>,
    pub startup_command: Option<String>,
    pub routable_control_ip: bool,
    pub component: Option<ComponentBinding>,
}

/// Build an exclusive raw-PC node.
///
/// When an address is given the node gets a single interface named
/// `<client_id>:if0`.
pub fn raw_pc(spec: NodeSpec<'_>) -> Node {
    let interface = spec.address.map(|(address, netmask)| Interface {
        client_id: format!("{}:if0", spec.client_id),
        address,
        netmask,
    });

    Node {
        client_id: spec.client_id.to_string(),
        disk_image: spec.disk_image.to_string(),
        hardware_type: spec.hardware_type.map(str::to_string),
        interface,
        startup_command: spec.startup_command,
        routable_control_ip: spec.routable_control_ip,
        component: spec.component,
    }
}

/// Build a best-effort multiplexed LAN over the interfaces of `nodes`.
///
/// Nodes without an interface are skipped.
pub fn shared_lan<'a>(client_id: &str, nodes: impl IntoIterator<Item = &'a Node>) -> Link {
    Link {
        client_id: client_id.to_string(),
        interface_refs: nodes
            .into_iter()
            .filter_map(|n| n.interface.as_ref())
            .map(|i| i.client_id.clone())
            .collect(),
        link_multiplexing: true,
        vlan_tagging: true,
        best_effort: true,
    }
}
