//! The request builder.
//!
//! A [`Request`] owns every entity of a topology and hands out typed
//! handles for them. Construction steps take the request by `&mut` and
//! return handles, so the whole graph is threaded through one explicit
//! value instead of a global portal context.

use super::types::{
    Blockstore, Execute, Interface, InterfaceRef, Link, LinkFlags, LinkId, LinkKind, Node, NodeId,
    NodeKind, Tour,
};
use log::debug;
use std::collections::HashSet;

/// Errors raised while building a request graph
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RequestError {
    #[error("Duplicate client id '{0}'")]
    DuplicateClientId(String),
    #[error("Unknown node handle {0:?}")]
    UnknownNode(NodeId),
    #[error("Unknown link handle {0:?}")]
    UnknownLink(LinkId),
    #[error("Unknown interface handle {0:?}")]
    UnknownInterface(InterfaceRef),
    #[error("Node '{0}' is not a remote blockstore")]
    NotABlockstore(String),
    #[error("Interface '{interface}' is already attached to '{link}'")]
    AlreadyAttached { link: String, interface: String },
}

/// A request RSpec under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    nodes: Vec<Node>,
    links: Vec<Link>,
    tour: Option<Tour>,
    client_ids: HashSet<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_client_id(&mut self, client_id: &str) -> Result<(), RequestError> {
        if !self.client_ids.insert(client_id.to_string()) {
            return Err(RequestError::DuplicateClientId(client_id.to_string()));
        }
        Ok(())
    }

    fn push_node(&mut self, node: Node) -> Result<NodeId, RequestError> {
        self.claim_client_id(&node.client_id)?;
        debug!("Adding {} node '{}'", node.kind.sliver_type(), node.client_id);
        self.nodes.push(node);
        Ok(NodeId(self.nodes.len() - 1))
    }

    fn push_link(&mut self, link: Link) -> Result<LinkId, RequestError> {
        self.claim_client_id(&link.client_id)?;
        debug!("Adding {:?} '{}'", link.kind, link.client_id);
        self.links.push(link);
        Ok(LinkId(self.links.len() - 1))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, RequestError> {
        self.nodes.get_mut(id.0).ok_or(RequestError::UnknownNode(id))
    }

    fn link_mut(&mut self, id: LinkId) -> Result<&mut Link, RequestError> {
        self.links.get_mut(id.0).ok_or(RequestError::UnknownLink(id))
    }

    /// Add a dedicated bare-metal node
    pub fn raw_pc(&mut self, name: &str) -> Result<NodeId, RequestError> {
        self.push_node(Node::new(name.to_string(), NodeKind::RawPc))
    }

    /// Add a node standing in for remote storage mounted at `mount_point`.
    ///
    /// The node has a single interface `if0`, returned alongside the node.
    pub fn remote_blockstore(
        &mut self,
        name: &str,
        mount_point: &str,
    ) -> Result<(NodeId, InterfaceRef), RequestError> {
        let blockstore = Blockstore {
            name: format!("{}-bs", name),
            mount_point: mount_point.to_string(),
            class: "remote".to_string(),
            dataset: None,
        };
        let node = Node::new(name.to_string(), NodeKind::RemoteBlockstore(blockstore));
        let id = self.push_node(node)?;
        let iface = self.add_interface(id, None)?;
        Ok((id, iface))
    }

    /// Add a shared LAN
    pub fn lan(&mut self, name: &str) -> Result<LinkId, RequestError> {
        self.push_link(Link::new(name.to_string(), LinkKind::Lan))
    }

    /// Add a point-to-point link
    pub fn link(&mut self, name: &str) -> Result<LinkId, RequestError> {
        self.push_link(Link::new(name.to_string(), LinkKind::Link))
    }

    /// Add an interface to a node.
    ///
    /// Without a name the interface is called `if<k>`, k being the number
    /// of interfaces the node already has.
    pub fn add_interface(
        &mut self,
        node: NodeId,
        name: Option<&str>,
    ) -> Result<InterfaceRef, RequestError> {
        let (client_id, index) = {
            let n = self.nodes.get(node.0).ok_or(RequestError::UnknownNode(node))?;
            let ifname = match name {
                Some(name) => name.to_string(),
                None => format!("if{}", n.interfaces.len()),
            };
            (format!("{}:{}", n.client_id, ifname), n.interfaces.len())
        };

        self.claim_client_id(&client_id)?;
        self.node_mut(node)?.interfaces.push(Interface { client_id });
        Ok(InterfaceRef { node, index })
    }

    /// Client id of an interface
    pub fn interface_id(&self, iface: InterfaceRef) -> Result<&str, RequestError> {
        self.nodes
            .get(iface.node.0)
            .and_then(|n| n.interfaces.get(iface.index))
            .map(|i| i.client_id.as_str())
            .ok_or(RequestError::UnknownInterface(iface))
    }

    /// Attach a node interface to a link or LAN
    pub fn attach(&mut self, link: LinkId, iface: InterfaceRef) -> Result<(), RequestError> {
        let interface = self.interface_id(iface)?.to_string();
        let l = self.link_mut(link)?;
        if l.contains(&interface) {
            return Err(RequestError::AlreadyAttached {
                link: l.client_id.clone(),
                interface,
            });
        }
        l.interfaces.push(interface);
        Ok(())
    }

    pub fn add_service(&mut self, node: NodeId, service: Execute) -> Result<(), RequestError> {
        self.node_mut(node)?.services.push(service);
        Ok(())
    }

    pub fn set_disk_image(&mut self, node: NodeId, image: &str) -> Result<(), RequestError> {
        self.node_mut(node)?.disk_image = Some(image.to_string());
        Ok(())
    }

    pub fn set_hardware_type(
        &mut self,
        node: NodeId,
        hardware_type: &str,
    ) -> Result<(), RequestError> {
        self.node_mut(node)?.hardware_type = Some(hardware_type.to_string());
        Ok(())
    }

    /// Bind a blockstore node to a long-term dataset
    pub fn set_dataset(&mut self, node: NodeId, dataset: &str) -> Result<(), RequestError> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            NodeKind::RemoteBlockstore(bs) => {
                bs.dataset = Some(dataset.to_string());
                Ok(())
            }
            NodeKind::RawPc => Err(RequestError::NotABlockstore(n.client_id.clone())),
        }
    }

    pub fn set_link_flags(&mut self, link: LinkId, flags: LinkFlags) -> Result<(), RequestError> {
        self.link_mut(link)?.flags = flags;
        Ok(())
    }

    pub fn set_tour(&mut self, tour: Tour) {
        self.tour = Some(tour);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn link_by_id(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn tour(&self) -> Option<&Tour> {
        self.tour.as_ref()
    }

    pub fn find_node(&self, client_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.client_id == client_id)
    }

    pub fn find_link(&self, client_id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.client_id == client_id)
    }

    /// Node owning the interface with the given client id
    pub fn interface_owner(&self, interface_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.has_interface(interface_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_naming() {
        let mut request = Request::new();
        let node = request.raw_pc("nfs").unwrap();

        let if0 = request.add_interface(node, None).unwrap();
        let if1 = request.add_interface(node, None).unwrap();
        let eth1 = request.add_interface(node, Some("eth1")).unwrap();

        assert_eq!(request.interface_id(if0).unwrap(), "nfs:if0");
        assert_eq!(request.interface_id(if1).unwrap(), "nfs:if1");
        assert_eq!(request.interface_id(eth1).unwrap(), "nfs:eth1");
        assert_eq!(if0.node(), node);
    }

    #[test]
    fn test_remote_blockstore_has_interface() {
        let mut request = Request::new();
        let (ds, iface) = request.remote_blockstore("dsnode", "/nfs").unwrap();

        assert_eq!(iface.node(), ds);
        assert_eq!(request.node(ds).unwrap().interfaces.len(), 1);
        assert_eq!(request.interface_id(iface).unwrap(), "dsnode:if0");

        request.set_dataset(ds, "urn:publicid:IDN+example+ltdataset+data").unwrap();
        let bs = request.node(ds).unwrap().blockstore().unwrap();
        assert_eq!(bs.name, "dsnode-bs");
        assert_eq!(bs.mount_point, "/nfs");
        assert_eq!(bs.class, "remote");
        assert_eq!(bs.dataset.as_deref(), Some("urn:publicid:IDN+example+ltdataset+data"));
    }

    #[test]
    fn test_duplicate_client_ids() {
        let mut request = Request::new();
        request.raw_pc("node1").unwrap();
        assert_eq!(
            request.raw_pc("node1"),
            Err(RequestError::DuplicateClientId("node1".to_string()))
        );
        // Links share the namespace with nodes
        assert!(request.lan("node1").is_err());

        let node = request.raw_pc("node2").unwrap();
        request.add_interface(node, Some("eth1")).unwrap();
        assert!(request.add_interface(node, Some("eth1")).is_err());
    }

    #[test]
    fn test_attach_twice() {
        let mut request = Request::new();
        let lan = request.lan("lan").unwrap();
        let node = request.raw_pc("pc").unwrap();
        let iface = request.add_interface(node, None).unwrap();

        request.attach(lan, iface).unwrap();
        assert_eq!(
            request.attach(lan, iface),
            Err(RequestError::AlreadyAttached {
                link: "lan".to_string(),
                interface: "pc:if0".to_string(),
            })
        );
        assert_eq!(request.link_by_id(lan).unwrap().interfaces, vec!["pc:if0".to_string()]);
    }

    #[test]
    fn test_dataset_on_raw_pc() {
        let mut request = Request::new();
        let node = request.raw_pc("pc").unwrap();
        assert_eq!(
            request.set_dataset(node, "urn:x"),
            Err(RequestError::NotABlockstore("pc".to_string()))
        );
    }

    #[test]
    fn test_foreign_handles() {
        let mut other = Request::new();
        let node = other.raw_pc("a").unwrap();
        other.raw_pc("b").unwrap();
        let foreign = other.raw_pc("c").unwrap();

        let mut request = Request::new();
        request.raw_pc("only").unwrap();
        assert!(request.node(node).is_some());
        assert_eq!(request.set_disk_image(foreign, "img"), Err(RequestError::UnknownNode(foreign)));
    }
}
