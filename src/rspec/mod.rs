//! # Request RSpec Module
//!
//! Typed object model and serializer for GENI/Emulab request RSpecs.
//!
//! ## Key Components
//!
//! - `types.rs`: nodes, interfaces, links, LAN flags, blockstores and the tour
//! - `request.rs`: the [`Request`] builder that owns the graph and hands out handles
//! - `xml.rs`: RSpec v3 XML rendering with the Emulab extension namespace
//!
//! ## Data Flow
//!
//! 1. **Construction**: a profile adds nodes, links and LANs to a [`Request`]
//! 2. **Wiring**: interfaces are created on nodes and attached to links
//! 3. **Serialization**: [`Request::to_xml`] renders the finished graph

pub mod request;
pub mod types;
pub mod xml;

pub use request::{Request, RequestError};
pub use types::{
    Blockstore, Execute, Interface, InterfaceRef, Link, LinkFlags, LinkId, LinkKind, Node, NodeId,
    NodeKind, Tour,
};
pub use xml::{to_xml, RenderError};
