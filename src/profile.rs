//! NFS topology descriptor.
//!
//! Builds the request for one NFS server and `clientCount` clients on a
//! shared LAN. The server exports a long-term dataset that lives on remote
//! storage and reaches it over a dedicated link.

use crate::conformance::{check_request, ConformanceError};
use crate::params::{ParameterError, ParameterSet};
use crate::rspec::{Execute, LinkFlags, RenderError, Request, RequestError, Tour};
use color_eyre::eyre::WrapErr;
use log::{debug, info};
use std::fs;
use std::path::Path;

// Do not change these unless the setup scripts change too.
pub const NFS_SERVER_NAME: &str = "nfs";
pub const NFS_LAN_NAME: &str = "nfsLan";
pub const NFS_DIRECTORY: &str = "/nfs";

pub const DATASET_NODE_NAME: &str = "dsnode";
pub const DATASET_LINK_NAME: &str = "dslink";
pub const DATASET_URN: &str = "urn:publicid:IDN+wisc.cloudlab.us:powerbound-pg0+ltdataset+zou_data";

/// Interface name used by clients on the NFS LAN
pub const CLIENT_INTERFACE: &str = "eth1";

pub const SETUP_SHELL: &str = "sh";
pub const SERVER_SETUP_COMMAND: &str = "sudo /bin/bash /local/repository/nfs-server.sh";
pub const CLIENT_SETUP_COMMAND: &str = "sudo /bin/bash /local/repository/nfs-client.sh";

pub const PROFILE_DESCRIPTION: &str = "This profile sets up a simple NFS server and a network of clients. \
The NFS server uses a long term dataset that is persistent across experiments. In order to use this \
profile, you will need to create your own dataset and use that instead of the demonstration dataset \
below. If you do not need persistent storage, we have another profile that uses temporary storage \
(removed when your experiment ends) that you can use.";

pub const PROFILE_INSTRUCTIONS: &str = "Click on any node in the topology and choose the `shell` menu item. \
Your shared NFS directory is mounted at `/nfs` on all nodes.";

/// Errors raised while building the NFS topology
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid parameters: {0}")]
    Parameters(#[from] ParameterError),
    #[error("Failed to build request: {0}")]
    Request(#[from] RequestError),
    #[error("Request failed conformance checks: {0}")]
    Conformance(#[from] ConformanceError),
    #[error("Failed to render request: {0}")]
    Render(#[from] RenderError),
}

/// Name of the client with the given 1-based index
pub fn client_name(index: u32) -> String {
    format!("node{}", index)
}

/// Build the NFS request graph for a parameter set
pub fn build_request(params: &ParameterSet) -> Result<Request, ProfileError> {
    params.validate()?;

    let image = params.os_image.urn();
    let mut request = Request::new();

    // The NFS network. All three flags are required by the fabric.
    let nfs_lan = request.lan(NFS_LAN_NAME)?;
    request.set_link_flags(nfs_lan, LinkFlags::SHARED_FABRIC)?;

    let server = request.raw_pc(NFS_SERVER_NAME)?;
    request.set_disk_image(server, image)?;
    let server_lan_iface = request.add_interface(server, None)?;
    request.attach(nfs_lan, server_lan_iface)?;
    request.add_service(server, Execute::new(SETUP_SHELL, SERVER_SETUP_COMMAND))?;

    // Stand-in node for the iSCSI device holding the dataset
    let (dsnode, ds_iface) = request.remote_blockstore(DATASET_NODE_NAME, NFS_DIRECTORY)?;
    request.set_dataset(dsnode, DATASET_URN)?;

    let dslink = request.link(DATASET_LINK_NAME)?;
    request.attach(dslink, ds_iface)?;
    let server_ds_iface = request.add_interface(server, None)?;
    request.attach(dslink, server_ds_iface)?;
    request.set_link_flags(dslink, LinkFlags::SHARED_FABRIC)?;

    for index in 1..=params.client_count {
        let name = client_name(index);
        debug!("Adding NFS client '{}'", name);

        let node = request.raw_pc(&name)?;
        request.set_disk_image(node, image)?;
        if let Some(hardware_type) = params.hardware_type() {
            request.set_hardware_type(node, hardware_type)?;
        }
        let iface = request.add_interface(node, Some(CLIENT_INTERFACE))?;
        request.attach(nfs_lan, iface)?;
        request.add_service(node, Execute::new(SETUP_SHELL, CLIENT_SETUP_COMMAND))?;
    }

    request.set_tour(Tour {
        description: PROFILE_DESCRIPTION.to_string(),
        instructions: PROFILE_INSTRUCTIONS.to_string(),
    });

    info!(
        "Built NFS request: {} nodes, {} links, {} clients",
        request.nodes().len(),
        request.links().len(),
        params.client_count
    );

    Ok(request)
}

/// Build, check and render the request document for a parameter set
pub fn generate_rspec(params: &ParameterSet) -> Result<String, ProfileError> {
    let request = build_request(params)?;
    check_request(&request)?;
    Ok(request.to_xml()?)
}

/// Generate the request document and write it to `output_path`
pub fn write_rspec(params: &ParameterSet, output_path: &Path) -> color_eyre::Result<()> {
    let xml = generate_rspec(params)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create output directory '{}'", parent.display())
            })?;
        }
    }

    fs::write(output_path, xml)
        .wrap_err_with(|| format!("Failed to write RSpec to '{}'", output_path.display()))?;

    info!("Wrote RSpec to {:?}", output_path);
    Ok(())
}
