//! Request graph type definitions.
//!
//! These types describe the entities a request RSpec is made of: nodes
//! (raw PCs and remote blockstores), their interfaces and boot services,
//! and the links and LANs that join interfaces together.

/// Handle to a node owned by a [`super::Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Handle to a link or LAN owned by a [`super::Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) usize);

/// Handle to one interface of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceRef {
    pub(crate) node: NodeId,
    pub(crate) index: usize,
}

impl InterfaceRef {
    /// Node the interface belongs to
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// A network interface on a node, named `<node>:<ifname>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub client_id: String,
}

/// Shell command run by the node when it boots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    pub shell: String,
    pub command: String,
}

impl Execute {
    pub fn new(shell: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
        }
    }
}

/// Persistent storage volume exposed through a blockstore node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockstore {
    /// Blockstore name, `<node>-bs`
    pub name: String,
    /// Where the volume is mounted on the node it is linked to
    pub mount_point: String,
    /// Storage class; remote blockstores are always `remote`
    pub class: String,
    /// URN of the long-term dataset backing the volume
    pub dataset: Option<String>,
}

/// What kind of machine a node requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Dedicated bare-metal machine
    RawPc,
    /// Stand-in node for remote (iSCSI) storage
    RemoteBlockstore(Blockstore),
}

impl NodeKind {
    /// Sliver type name used in the request document
    pub fn sliver_type(&self) -> &'static str {
        match self {
            NodeKind::RawPc => "raw-pc",
            NodeKind::RemoteBlockstore(_) => "emulab-blockstore",
        }
    }
}

/// A node in the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub client_id: String,
    pub kind: NodeKind,
    pub exclusive: Option<bool>,
    pub disk_image: Option<String>,
    pub hardware_type: Option<String>,
    pub interfaces: Vec<Interface>,
    pub services: Vec<Execute>,
}

impl Node {
    pub(crate) fn new(client_id: String, kind: NodeKind) -> Self {
        let exclusive = match kind {
            NodeKind::RawPc => Some(true),
            NodeKind::RemoteBlockstore(_) => None,
        };
        Self {
            client_id,
            kind,
            exclusive,
            disk_image: None,
            hardware_type: None,
            interfaces: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn is_raw_pc(&self) -> bool {
        matches!(self.kind, NodeKind::RawPc)
    }

    /// Blockstore details if this is a remote blockstore node
    pub fn blockstore(&self) -> Option<&Blockstore> {
        match &self.kind {
            NodeKind::RemoteBlockstore(bs) => Some(bs),
            NodeKind::RawPc => None,
        }
    }

    pub fn has_interface(&self, client_id: &str) -> bool {
        self.interfaces.iter().any(|iface| iface.client_id == client_id)
    }
}

/// Whether a link is a point-to-point link or a shared LAN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Link,
    Lan,
}

/// Switching flags a link needs on the shared physical fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkFlags {
    pub best_effort: bool,
    pub vlan_tagging: bool,
    pub link_multiplexing: bool,
}

impl LinkFlags {
    /// All three flags set
    pub const SHARED_FABRIC: LinkFlags = LinkFlags {
        best_effort: true,
        vlan_tagging: true,
        link_multiplexing: true,
    };

    /// Flag names paired with their values, in document order
    pub fn entries(&self) -> [(&'static str, bool); 3] {
        [
            ("best_effort", self.best_effort),
            ("vlan_tagging", self.vlan_tagging),
            ("link_multiplexing", self.link_multiplexing),
        ]
    }

    /// Names of the flags that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, enabled)| !enabled)
            .map(|(name, _)| name)
            .collect()
    }
}

/// A link or LAN joining interfaces by client id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub client_id: String,
    pub kind: LinkKind,
    pub interfaces: Vec<String>,
    pub flags: LinkFlags,
}

impl Link {
    pub(crate) fn new(client_id: String, kind: LinkKind) -> Self {
        Self {
            client_id,
            kind,
            interfaces: Vec::new(),
            flags: LinkFlags::default(),
        }
    }

    pub fn contains(&self, interface_id: &str) -> bool {
        self.interfaces.iter().any(|id| id == interface_id)
    }
}

/// Description and instructions shown by the portal alongside the topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    pub description: String,
    pub instructions: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_flags_missing() {
        assert!(LinkFlags::SHARED_FABRIC.missing().is_empty());
        assert_eq!(
            LinkFlags::default().missing(),
            vec!["best_effort", "vlan_tagging", "link_multiplexing"]
        );

        let flags = LinkFlags {
            vlan_tagging: false,
            ..LinkFlags::SHARED_FABRIC
        };
        assert_eq!(flags.missing(), vec!["vlan_tagging"]);
    }

    #[test]
    fn test_node_kinds() {
        let pc = Node::new("nfs".to_string(), NodeKind::RawPc);
        assert!(pc.is_raw_pc());
        assert_eq!(pc.exclusive, Some(true));
        assert_eq!(pc.kind.sliver_type(), "raw-pc");
        assert!(pc.blockstore().is_none());

        let bs = Blockstore {
            name: "dsnode-bs".to_string(),
            mount_point: "/nfs".to_string(),
            class: "remote".to_string(),
            dataset: None,
        };
        let ds = Node::new("dsnode".to_string(), NodeKind::RemoteBlockstore(bs));
        assert!(!ds.is_raw_pc());
        assert_eq!(ds.exclusive, None);
        assert_eq!(ds.kind.sliver_type(), "emulab-blockstore");
    }
}
