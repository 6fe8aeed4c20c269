//! # nfs-rspec - RSpec generator for a persistent-storage NFS testbed
//!
//! This library builds the request RSpec for a CloudLab/Emulab experiment
//! made of one NFS server and a configurable number of NFS clients. The
//! server mounts a long-term dataset from remote block storage and exports
//! it to the clients over a shared LAN.
//!
//! ## Architecture
//!
//! - `params`: bound profile parameters, the image allow-list and parameter declarations
//! - `params_loader`: YAML parameter files and CLI overrides
//! - `rspec`: request object model and RSpec v3 XML serialization
//! - `profile`: the NFS topology built on top of `rspec`
//! - `conformance`: structural checks run before a request is rendered
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nfs_rspec::{params::ParameterSet, profile};
//!
//! let params = ParameterSet {
//!     client_count: 4,
//!     ..Default::default()
//! };
//! let xml = profile::generate_rspec(&params)?;
//! println!("{}", xml);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Parameter Format
//!
//! Parameter files use the portal parameter names:
//!
//! ```yaml
//! clientCount: 2
//! phystype: "c240g5"
//! osImage: "MPI+CUDA"
//! ```
//!
//! ## Error Handling
//!
//! Library operations return `thiserror` enums. The loader and CLI wrap them
//! in `color_eyre` reports with file context.

pub mod conformance;
pub mod params;
pub mod params_loader;
pub mod profile;
pub mod rspec;
