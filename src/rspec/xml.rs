//! RSpec v3 request serialization.
//!
//! Nodes are written in creation order, then links, then the tour, so the
//! same request always produces the same bytes.

use super::request::Request;
use super::types::{Link, LinkKind, Node, NodeKind, Tour};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::string::FromUtf8Error;

pub const RSPEC_NS: &str = "http://www.geni.net/resources/rspec/3";
pub const EMULAB_NS: &str = "http://www.protogeni.net/resources/rspec/ext/emulab/1";
pub const CLIENT_NS: &str = "http://www.protogeni.net/resources/rspec/ext/client/1";
pub const TOUR_NS: &str = "http://www.protogeni.net/resources/rspec/ext/apt-tour/1";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const REQUEST_XSD: &str = "http://www.geni.net/resources/rspec/3/request.xsd";

/// Errors raised while rendering a request document
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("XML write failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Rendered document is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

type XmlWriter = Writer<Vec<u8>>;

/// Render a request as an RSpec v3 request document
pub fn to_xml(request: &Request) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let schema_location = format!("{} {}", RSPEC_NS, REQUEST_XSD);
    let mut rspec = BytesStart::new("rspec");
    rspec.push_attribute(("xmlns", RSPEC_NS));
    rspec.push_attribute(("xmlns:client", CLIENT_NS));
    rspec.push_attribute(("xmlns:emulab", EMULAB_NS));
    rspec.push_attribute(("xmlns:xsi", XSI_NS));
    rspec.push_attribute(("xsi:schemaLocation", schema_location.as_str()));
    rspec.push_attribute(("type", "request"));
    writer.write_event(Event::Start(rspec))?;

    for node in request.nodes() {
        write_node(&mut writer, node)?;
    }

    for link in request.links() {
        write_link(&mut writer, link)?;
    }

    if let Some(tour) = request.tour() {
        write_tour(&mut writer, tour)?;
    }

    writer.write_event(Event::End(BytesEnd::new("rspec")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("node");
    start.push_attribute(("client_id", node.client_id.as_str()));
    if let Some(exclusive) = node.exclusive {
        start.push_attribute(("exclusive", if exclusive { "true" } else { "false" }));
    }
    writer.write_event(Event::Start(start))?;

    let sliver =
        BytesStart::new("sliver_type").with_attributes([("name", node.kind.sliver_type())]);
    match (&node.kind, &node.disk_image) {
        (NodeKind::RawPc, None) => writer.write_event(Event::Empty(sliver))?,
        (NodeKind::RawPc, Some(image)) => {
            writer.write_event(Event::Start(sliver))?;
            writer.write_event(Event::Empty(
                BytesStart::new("disk_image").with_attributes([("name", image.as_str())]),
            ))?;
            writer.write_event(Event::End(BytesEnd::new("sliver_type")))?;
        }
        (NodeKind::RemoteBlockstore(bs), _) => {
            writer.write_event(Event::Start(sliver))?;
            let mut blockstore = BytesStart::new("emulab:blockstore").with_attributes([
                ("name", bs.name.as_str()),
                ("mountpoint", bs.mount_point.as_str()),
                ("class", bs.class.as_str()),
            ]);
            if let Some(dataset) = &bs.dataset {
                blockstore.push_attribute(("dataset", dataset.as_str()));
            }
            writer.write_event(Event::Empty(blockstore))?;
            writer.write_event(Event::End(BytesEnd::new("sliver_type")))?;
        }
    }

    if let Some(hardware_type) = &node.hardware_type {
        let hardware = BytesStart::new("hardware_type")
            .with_attributes([("name", hardware_type.as_str())]);
        writer.write_event(Event::Empty(hardware))?;
    }

    for iface in &node.interfaces {
        let interface = BytesStart::new("interface")
            .with_attributes([("client_id", iface.client_id.as_str())]);
        writer.write_event(Event::Empty(interface))?;
    }

    if !node.services.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("services")))?;
        for service in &node.services {
            writer.write_event(Event::Empty(BytesStart::new("execute").with_attributes([
                ("shell", service.shell.as_str()),
                ("command", service.command.as_str()),
            ])))?;
        }
        writer.write_event(Event::End(BytesEnd::new("services")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("node")))?;
    Ok(())
}

fn write_link(writer: &mut XmlWriter, link: &Link) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(
        BytesStart::new("link").with_attributes([("client_id", link.client_id.as_str())]),
    ))?;

    for iface in &link.interfaces {
        writer.write_event(Event::Empty(
            BytesStart::new("interface_ref").with_attributes([("client_id", iface.as_str())]),
        ))?;
    }

    for (flag, enabled) in link.flags.entries() {
        if enabled {
            let name = format!("emulab:{}", flag);
            writer.write_event(Event::Empty(
                BytesStart::new(name.as_str()).with_attributes([("enabled", "true")]),
            ))?;
        }
    }

    if link.kind == LinkKind::Lan {
        writer.write_event(Event::Empty(
            BytesStart::new("link_type").with_attributes([("name", "lan")]),
        ))?;
    }

    writer.write_event(Event::End(BytesEnd::new("link")))?;
    Ok(())
}

fn write_markdown(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(
        BytesStart::new(tag).with_attributes([("type", "markdown")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_tour(writer: &mut XmlWriter, tour: &Tour) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(
        BytesStart::new("rspec_tour").with_attributes([("xmlns", TOUR_NS)]),
    ))?;
    write_markdown(writer, "description", &tour.description)?;
    write_markdown(writer, "instructions", &tour.instructions)?;
    writer.write_event(Event::End(BytesEnd::new("rspec_tour")))?;
    Ok(())
}

impl Request {
    /// Render this request as an RSpec v3 request document
    pub fn to_xml(&self) -> Result<String, RenderError> {
        to_xml(self)
    }
}
