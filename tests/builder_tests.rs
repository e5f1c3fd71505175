//! End-to-end scenarios: parameters in, request graph and RSpec out.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde_json::{json, Value};

use clusterspec::builder::{MASTER_NODE, NETWORK_LINK, USRP_NODE};
use clusterspec::rspec::xml::to_xml;
use clusterspec::{build_request, evaluate, render, Node, ProfileKind, Request};

fn request_for(profile: ProfileKind, pairs: &[(&str, Value)]) -> Request {
    let input: BTreeMap<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let verified = evaluate(profile, &input).expect("parameters should verify");
    build_request(&verified.params).expect("request should build")
}

fn addr(node: &Node) -> Ipv4Addr {
    node.interface.as_ref().expect("node has an interface").address
}

fn startup(node: &Node) -> &str {
    node.startup_command.as_deref().expect("node has a startup command")
}

#[test]
fn test_three_plain_workers() {
    let request = request_for(
        ProfileKind::Kubernetes,
        &[
            ("machineNum", json!(3)),
            ("Hardware", json!("d430")),
            ("k8s", json!(false)),
            ("isolcpusNumber", json!(0)),
            ("usrpb210", json!("none")),
        ],
    );

    assert_eq!(request.nodes.len(), 3);
    assert!(request.node(MASTER_NODE).is_none());
    assert!(request.node(USRP_NODE).is_none());

    for (i, node) in request.nodes.iter().enumerate() {
        assert_eq!(node.client_id, format!("node{}", i));
        assert_eq!(addr(node), Ipv4Addr::new(192, 168, 1, i as u8 + 1));
        assert_eq!(node.hardware_type.as_deref(), Some("d430"));
        assert!(startup(node).contains("NOREBOOT=\"touch /local/repository/.noreboot\""));
        assert!(!startup(node).contains("ISOLCPUS"));
        assert!(!startup(node).contains("K8S_JOIN"));
    }

    assert_eq!(request.links.len(), 1);
    assert_eq!(request.links[0].client_id, NETWORK_LINK);
    assert_eq!(
        request.links[0].interface_refs,
        vec!["node0:if0", "node1:if0", "node2:if0"]
    );
}

#[test]
fn test_kubernetes_with_isolated_cpus() {
    let request = request_for(
        ProfileKind::Kubernetes,
        &[
            ("machineNum", json!(2)),
            ("k8s", json!(true)),
            ("isolcpusNumber", json!(4)),
        ],
    );

    assert_eq!(request.nodes.len(), 3);
    let master = request.node(MASTER_NODE).unwrap();
    assert_eq!(addr(master), Ipv4Addr::new(192, 168, 1, 1));

    let node0 = request.node("node0").unwrap();
    let node1 = request.node("node1").unwrap();
    assert_eq!(addr(node0), Ipv4Addr::new(192, 168, 1, 2));
    assert_eq!(addr(node1), Ipv4Addr::new(192, 168, 1, 3));

    for node in [node0, node1] {
        let cmd = startup(node);
        assert!(cmd.contains("K8S_JOIN=\"/local/repository/scripts/k8s_join.sh 192.168.1.1\""));
        assert!(cmd.contains("ISOLCPUS=\"/local/repository/scripts/isolcpus.sh 4\""));
        assert!(!cmd.contains("NOREBOOT"));
        assert!(cmd.ends_with("/local/repository/scripts/configure.sh"));
    }

    assert_eq!(request.links[0].interface_refs.len(), 3);
    assert_eq!(request.links[0].interface_refs[0], "master:if0");
}

#[test]
fn test_usrp_node_bound_to_location() {
    let request = request_for(
        ProfileKind::Kubernetes,
        &[("machineNum", json!(1)), ("usrpb210", json!("humanities"))],
    );

    assert_eq!(request.nodes.len(), 2);
    let radio = request.node(USRP_NODE).unwrap();
    let binding = radio.component.as_ref().unwrap();
    assert_eq!(
        binding.manager_id,
        "urn:publicid:IDN+humanities.powderwireless.net+authority+cm"
    );
    assert!(radio.interface.is_none());
    assert_eq!(request.links[0].interface_refs, vec!["node0:if0"]);
}

#[test]
fn test_custom_os_applies_everywhere() {
    let image = "urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU20-64-STD";
    let request = request_for(
        ProfileKind::Kubernetes,
        &[
            ("OS", json!(image)),
            ("k8s", json!(true)),
            ("usrpb210", json!("ebc")),
        ],
    );
    assert!(request.nodes.iter().all(|n| n.disk_image == image));
}

#[test]
fn test_compute_profile_document() {
    let input: BTreeMap<String, Value> = [
        ("machineNum".to_string(), json!("2")),
        ("Hardware".to_string(), json!("d820")),
    ]
    .into_iter()
    .collect();
    let verified = evaluate(ProfileKind::Compute, &input).unwrap();
    let xml = render(&verified.params).unwrap();

    assert!(xml.contains("<description type=\"text\">Compute Cluster</description>"));
    assert!(xml.contains(
        "<disk_image name=\"urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU18-64-STD\"/>"
    ));
    assert!(xml.contains("<hardware_type name=\"d820\"/>"));
    assert!(xml.contains("address=\"192.168.1.2\""));
    assert!(!xml.contains("<services>"));
    assert!(!xml.contains("192.168.1.3"));
}

#[test]
fn test_kubernetes_document() {
    let request = request_for(
        ProfileKind::Kubernetes,
        &[("machineNum", json!(1)), ("k8s", json!(true))],
    );
    let xml = to_xml(&request).unwrap();

    assert!(xml.contains("<emulab:routable_control_ip/>"));
    assert_eq!(xml.matches("<emulab:routable_control_ip/>").count(), 1);
    assert!(xml.contains(
        "<execute shell=\"bash\" command=\"/local/repository/scripts/k8s_master.sh\"/>"
    ));
    assert!(xml.contains("K8S_JOIN=&quot;/local/repository/scripts/k8s_join.sh 192.168.1.1&quot;"));
    assert_eq!(xml.matches("<node ").count(), 2);
}
