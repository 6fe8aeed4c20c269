//! Conformance checks for a built NFS request.
//!
//! Each check corresponds to a structural rule the provisioning platform
//! relies on: one server, one dataset link, every client on the NFS LAN,
//! the shared-fabric flags on both links and a single disk image.

use crate::profile::{NFS_LAN_NAME, NFS_SERVER_NAME};
use crate::rspec::{Link, LinkKind, Node, Request};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static URN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^urn:publicid:IDN\+[^+\s]+\+[^+\s]+\+[^+\s]+$").unwrap());

/// Structural rule violations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConformanceError {
    #[error("Expected exactly one server node '{name}', found {found}")]
    ServerCount { name: String, found: usize },
    #[error("Expected exactly one dataset blockstore, found {0}")]
    DatasetCount(usize),
    #[error("Dataset identifier '{0}' is not a valid URN")]
    InvalidUrn(String),
    #[error("Expected exactly one link between the dataset and the server, found {0}")]
    DatasetLinkCount(usize),
    #[error("Dataset link '{link}' must have 2 interfaces, has {found}")]
    DatasetLinkEndpoints { link: String, found: usize },
    #[error("LAN '{0}' is missing")]
    MissingLan(String),
    #[error("Node '{node}' is not attached to LAN '{lan}'")]
    NodeNotOnLan { node: String, lan: String },
    #[error("Link '{link}' is missing required flag '{flag}'")]
    MissingLinkFlag { link: String, flag: String },
    #[error("Node '{0}' has no disk image")]
    MissingDiskImage(String),
    #[error("Node '{node}' uses image '{image}' but the server uses '{expected}'")]
    MixedDiskImages { node: String, image: String, expected: String },
    #[error("Link '{link}' references unknown interface '{interface}'")]
    DanglingInterface { link: String, interface: String },
}

/// Run every conformance check against a request
pub fn check_request(request: &Request) -> Result<(), ConformanceError> {
    check_interfaces_resolve(request)?;

    let server = find_server(request)?;
    let dslink = check_dataset(request, server)?;
    check_link_flags(dslink)?;

    let lan = check_lan_membership(request)?;
    check_link_flags(lan)?;

    check_disk_images(request, server)?;

    debug!("Request passed conformance checks");
    Ok(())
}

fn check_interfaces_resolve(request: &Request) -> Result<(), ConformanceError> {
    for link in request.links() {
        for interface in &link.interfaces {
            if request.interface_owner(interface).is_none() {
                return Err(ConformanceError::DanglingInterface {
                    link: link.client_id.clone(),
                    interface: interface.clone(),
                });
            }
        }
    }
    Ok(())
}

fn find_server(request: &Request) -> Result<&Node, ConformanceError> {
    let servers: Vec<&Node> = request
        .nodes()
        .iter()
        .filter(|n| n.is_raw_pc() && n.client_id == NFS_SERVER_NAME)
        .collect();

    match servers.as_slice() {
        [server] => Ok(*server),
        _ => Err(ConformanceError::ServerCount {
            name: NFS_SERVER_NAME.to_string(),
            found: servers.len(),
        }),
    }
}

/// Check the dataset blockstore and return the link joining it to the server
fn check_dataset<'a>(request: &'a Request, server: &Node) -> Result<&'a Link, ConformanceError> {
    let datasets: Vec<&Node> = request
        .nodes()
        .iter()
        .filter(|n| n.blockstore().map_or(false, |bs| bs.dataset.is_some()))
        .collect();

    let dsnode = match datasets.as_slice() {
        [dsnode] => *dsnode,
        _ => return Err(ConformanceError::DatasetCount(datasets.len())),
    };

    if let Some(dataset) = dsnode.blockstore().and_then(|bs| bs.dataset.as_deref()) {
        if !URN_PATTERN.is_match(dataset) {
            return Err(ConformanceError::InvalidUrn(dataset.to_string()));
        }
    }

    let links: Vec<&Link> = request
        .links()
        .iter()
        .filter(|l| {
            l.interfaces.iter().any(|i| dsnode.has_interface(i))
                && l.interfaces.iter().any(|i| server.has_interface(i))
        })
        .collect();

    let dslink = match links.as_slice() {
        [dslink] => *dslink,
        _ => return Err(ConformanceError::DatasetLinkCount(links.len())),
    };

    if dslink.interfaces.len() != 2 {
        return Err(ConformanceError::DatasetLinkEndpoints {
            link: dslink.client_id.clone(),
            found: dslink.interfaces.len(),
        });
    }

    Ok(dslink)
}

fn check_lan_membership(request: &Request) -> Result<&Link, ConformanceError> {
    let lan = request
        .find_link(NFS_LAN_NAME)
        .filter(|l| l.kind == LinkKind::Lan)
        .ok_or_else(|| ConformanceError::MissingLan(NFS_LAN_NAME.to_string()))?;

    // The server and every client are raw PCs
    for node in request.nodes().iter().filter(|n| n.is_raw_pc()) {
        if !lan.interfaces.iter().any(|i| node.has_interface(i)) {
            return Err(ConformanceError::NodeNotOnLan {
                node: node.client_id.clone(),
                lan: lan.client_id.clone(),
            });
        }
    }

    Ok(lan)
}

fn check_link_flags(link: &Link) -> Result<(), ConformanceError> {
    if let Some(flag) = link.flags.missing().first() {
        return Err(ConformanceError::MissingLinkFlag {
            link: link.client_id.clone(),
            flag: flag.to_string(),
        });
    }
    Ok(())
}

fn check_disk_images(request: &Request, server: &Node) -> Result<(), ConformanceError> {
    let expected = server
        .disk_image
        .as_deref()
        .ok_or_else(|| ConformanceError::MissingDiskImage(server.client_id.clone()))?;

    for node in request.nodes().iter().filter(|n| n.is_raw_pc()) {
        match node.disk_image.as_deref() {
            None => return Err(ConformanceError::MissingDiskImage(node.client_id.clone())),
            Some(image) if image != expected => {
                return Err(ConformanceError::MixedDiskImages {
                    node: node.client_id.clone(),
                    image: image.to_string(),
                    expected: expected.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}
