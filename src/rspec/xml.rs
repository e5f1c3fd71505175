//! Request RSpec (GENI v3) XML serialization.
//!
//! Element order inside a node follows the request schema: sliver type,
//! hardware type, services, interface, then Emulab extensions.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use super::{Link, Node, Request, Tour, RAW_PC};
use crate::error::{ProfileError, Result};

const GENI_NS: &str = "http://www.geni.net/resources/rspec/3";
const EMULAB_NS: &str = "http://www.protogeni.net/resources/rspec/ext/emulab/1";
const CLIENT_NS: &str = "http://www.protogeni.net/resources/rspec/ext/client/1";
const TOUR_NS: &str = "http://www.protogeni.net/resources/rspec/ext/apt-tour/1";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.geni.net/resources/rspec/3 http://www.geni.net/resources/rspec/3/request.xsd";

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ProfileError::xml(e.to_string()))
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    emit(writer, Event::Start(element))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn empty(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    emit(writer, Event::Empty(element))
}

fn text_element(writer: &mut XmlWriter, element: BytesStart<'_>, text: &str) -> Result<()> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    start(writer, element)?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    end(writer, &name)
}

fn enabled_flag(writer: &mut XmlWriter, name: &str) -> Result<()> {
    empty(writer, BytesStart::new(name).with_attributes([("enabled", "true")]))
}

fn write_tour(writer: &mut XmlWriter, tour: &Tour) -> Result<()> {
    start(
        writer,
        BytesStart::new("rspec_tour").with_attributes([("xmlns", TOUR_NS)]),
    )?;
    text_element(
        writer,
        BytesStart::new("description").with_attributes([("type", "text")]),
        &tour.description,
    )?;
    text_element(
        writer,
        BytesStart::new("instructions").with_attributes([("type", "markdown")]),
        &tour.instructions,
    )?;
    end(writer, "rspec_tour")
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> Result<()> {
    let mut element = BytesStart::new("node")
        .with_attributes([("client_id", node.client_id.as_str()), ("exclusive", "true")]);
    if let Some(component) = &node.component {
        element.push_attribute(("component_manager_id", component.manager_id.as_str()));
        element.push_attribute(("component_id", component.component_id.as_str()));
    }
    start(writer, element)?;

    start(writer, BytesStart::new("sliver_type").with_attributes([("name", RAW_PC)]))?;
    empty(
        writer,
        BytesStart::new("disk_image").with_attributes([("name", node.disk_image.as_str())]),
    )?;
    end(writer, "sliver_type")?;

    if let Some(hardware) = &node.hardware_type {
        empty(
            writer,
            BytesStart::new("hardware_type").with_attributes([("name", hardware.as_str())]),
        )?;
    }

    if let Some(command) = &node.startup_command {
        start(writer, BytesStart::new("services"))?;
        empty(
            writer,
            BytesStart::new("execute")
                .with_attributes([("shell", "bash"), ("command", command.as_str())]),
        )?;
        end(writer, "services")?;
    }

    if let Some(iface) = &node.interface {
        let address = iface.address.to_string();
        let netmask = iface.netmask.to_string();
        start(
            writer,
            BytesStart::new("interface").with_attributes([("client_id", iface.client_id.as_str())]),
        )?;
        empty(
            writer,
            BytesStart::new("ip").with_attributes([
                ("address", address.as_str()),
                ("type", "ipv4"),
                ("netmask", netmask.as_str()),
            ]),
        )?;
        end(writer, "interface")?;
    }

    if node.routable_control_ip {
        empty(writer, BytesStart::new("emulab:routable_control_ip"))?;
    }

    end(writer, "node")
}

fn write_link(writer: &mut XmlWriter, link: &Link) -> Result<()> {
    start(
        writer,
        BytesStart::new("link").with_attributes([("client_id", link.client_id.as_str())]),
    )?;
    for iface in &link.interface_refs {
        empty(
            writer,
            BytesStart::new("interface_ref").with_attributes([("client_id", iface.as_str())]),
        )?;
    }
    if link.link_multiplexing {
        enabled_flag(writer, "emulab:link_multiplexing")?;
    }
    if link.vlan_tagging {
        enabled_flag(writer, "emulab:vlan_tagging")?;
    }
    if link.best_effort {
        enabled_flag(writer, "emulab:best_effort")?;
    }
    end(writer, "link")
}

/// Serialize a request to an indented RSpec document.
pub fn to_xml(request: &Request) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    start(
        &mut writer,
        BytesStart::new("rspec").with_attributes([
            ("xmlns", GENI_NS),
            ("xmlns:emulab", EMULAB_NS),
            ("xmlns:client", CLIENT_NS),
            ("xmlns:xsi", XSI_NS),
            ("xsi:schemaLocation", SCHEMA_LOCATION),
            ("type", "request"),
        ]),
    )?;

    if let Some(tour) = &request.tour {
        write_tour(&mut writer, tour)?;
    }
    for node in &request.nodes {
        write_node(&mut writer, node)?;
    }
    for link in &request.links {
        write_link(&mut writer, link)?;
    }

    end(&mut writer, "rspec")?;

    let document = String::from_utf8(writer.into_inner())
        .map_err(|e| ProfileError::xml(format!("non UTF-8 output: {}", e)))?;
    debug!("Serialized RSpec: {} bytes", document.len());
    Ok(document + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rspec::{raw_pc, shared_lan, ComponentBinding, NodeSpec};
    use std::net::Ipv4Addr;

    fn sample() -> Request {
        let mask = Ipv4Addr::new(255, 255, 255, 0);
        let worker = raw_pc(NodeSpec {
            client_id: "node0",
            disk_image: "urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU18-64-STD",
            hardware_type: Some("d430"),
            address: Some((Ipv4Addr::new(192, 168, 1, 1), mask)),
            startup_command: Some("K=\"a & b\" /x.sh".to_string()),
            ..NodeSpec::default()
        });
        let radio = raw_pc(NodeSpec {
            client_id: "b210",
            disk_image: "urn:img",
            component: Some(ComponentBinding {
                manager_id: "urn:publicid:IDN+ebc.powderwireless.net+authority+cm".to_string(),
                component_id: "nuc2".to_string(),
            }),
            ..NodeSpec::default()
        });
        let lan = shared_lan("Network", [&worker, &radio]);
        Request {
            tour: Some(Tour {
                description: "Compute Cluster".to_string(),
                instructions: "None <yet>".to_string(),
            }),
            nodes: vec![worker, radio],
            links: vec![lan],
        }
    }

    #[test]
    fn test_document_header() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("type=\"request\""));
        assert!(xml.trim_end().ends_with("</rspec>"));
    }

    #[test]
    fn test_node_elements() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.contains("<node client_id=\"node0\" exclusive=\"true\">"));
        assert!(xml.contains("<sliver_type name=\"raw-pc\">"));
        assert!(xml.contains("<hardware_type name=\"d430\"/>"));
        assert!(xml.contains(
            "<ip address=\"192.168.1.1\" type=\"ipv4\" netmask=\"255.255.255.0\"/>"
        ));
        assert!(xml.contains("component_id=\"nuc2\""));
    }

    #[test]
    fn test_special_characters_escaped() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.contains("None &lt;yet&gt;"));
        assert!(xml.contains("K=&quot;a &amp; b&quot; /x.sh"));
    }

    #[test]
    fn test_link_elements() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.contains("<interface_ref client_id=\"node0:if0\"/>"));
        assert!(!xml.contains("<interface_ref client_id=\"b210:if0\"/>"));
        assert!(xml.contains("<emulab:vlan_tagging enabled=\"true\"/>"));
        assert!(xml.contains("<emulab:link_multiplexing enabled=\"true\"/>"));
        assert!(xml.contains("<emulab:best_effort enabled=\"true\"/>"));
    }
}
