//! Profile parameters.
//!
//! The portal binds three user-supplied values before the topology is
//! built: the number of NFS clients, an optional physical node type and
//! the OS image. This module holds the bound parameter set, the closed
//! image allow-list and the portal-style parameter declarations.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Default number of NFS clients (there is always a server)
pub const DEFAULT_CLIENT_COUNT: u32 = 2;

/// Default physical node type
pub const DEFAULT_PHYSTYPE: &str = "c240g5";

static PHYSTYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]*$").unwrap());

/// Disk images allowed for the server and clients.
///
/// Only one image is offered by this profile. Values outside the list are
/// rejected when parameters are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OsImage {
    /// Ubuntu image with MPI and CUDA preinstalled
    #[default]
    #[serde(rename = "urn:publicid:IDN+wisc.cloudlab.us+image+powerbound-PG0:gpu.node0")]
    #[serde(alias = "MPI+CUDA")]
    MpiCuda,
}

impl OsImage {
    /// Every image in the allow-list, in declaration order
    pub const ALL: [OsImage; 1] = [OsImage::MpiCuda];

    /// Image URN as understood by the provisioning platform
    pub fn urn(&self) -> &'static str {
        match self {
            OsImage::MpiCuda => "urn:publicid:IDN+wisc.cloudlab.us+image+powerbound-PG0:gpu.node0",
        }
    }

    /// Human readable label shown by the portal
    pub fn label(&self) -> &'static str {
        match self {
            OsImage::MpiCuda => "MPI+CUDA",
        }
    }
}

impl fmt::Display for OsImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.urn())
    }
}

impl FromStr for OsImage {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OsImage::ALL
            .iter()
            .copied()
            .find(|image| image.urn() == s || image.label() == s)
            .ok_or_else(|| ParameterError::UnknownImage(s.to_string()))
    }
}

/// Bound profile parameters.
///
/// Field names follow the portal parameter names so that a parameter file
/// written for the portal can be loaded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSet {
    /// Number of NFS clients
    #[serde(rename = "clientCount", default = "default_client_count")]
    pub client_count: u32,
    /// Physical node type for the clients; empty means no constraint
    #[serde(default = "default_phystype")]
    pub phystype: String,
    /// Disk image used by every node
    #[serde(rename = "osImage", default)]
    pub os_image: OsImage,
}

fn default_client_count() -> u32 {
    DEFAULT_CLIENT_COUNT
}

fn default_phystype() -> String {
    DEFAULT_PHYSTYPE.to_string()
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            client_count: DEFAULT_CLIENT_COUNT,
            phystype: DEFAULT_PHYSTYPE.to_string(),
            os_image: OsImage::default(),
        }
    }
}

impl ParameterSet {
    /// Validate the bound values against the declared types
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !PHYSTYPE_PATTERN.is_match(&self.phystype) {
            return Err(ParameterError::InvalidPhystype(self.phystype.clone()));
        }

        Ok(())
    }

    /// Hardware type to request, or None when the user left it blank
    pub fn hardware_type(&self) -> Option<&str> {
        if self.phystype.is_empty() {
            None
        } else {
            Some(&self.phystype)
        }
    }
}

/// Parameter binding errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParameterError {
    #[error("Invalid physical node type '{0}'")]
    InvalidPhystype(String),
    #[error("Image '{0}' is not in the allowed image list")]
    UnknownImage(String),
}

/// Value types understood by the portal parameter form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Integer,
    String,
    Image,
}

/// A legal value for an enumerated parameter: the value and its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalValue {
    pub value: String,
    pub label: String,
}

/// Declaration of a single profile parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legal_values: Vec<LegalValue>,
}

/// Declarations of all parameters this profile accepts, in form order
pub fn declared_parameters() -> Vec<ParameterDeclaration> {
    vec![
        ParameterDeclaration {
            name: "clientCount",
            description: "Number of NFS clients",
            kind: ParameterType::Integer,
            default: serde_json::Value::from(DEFAULT_CLIENT_COUNT),
            legal_values: Vec::new(),
        },
        ParameterDeclaration {
            name: "phystype",
            description: "Optional physical node type",
            kind: ParameterType::String,
            default: serde_json::Value::from(DEFAULT_PHYSTYPE),
            legal_values: Vec::new(),
        },
        ParameterDeclaration {
            name: "osImage",
            description: "Select OS image",
            kind: ParameterType::Image,
            default: serde_json::Value::from(OsImage::default().urn()),
            legal_values: OsImage::ALL
                .iter()
                .map(|image| LegalValue {
                    value: image.urn().to_string(),
                    label: image.label().to_string(),
                })
                .collect(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ParameterSet::default();
        assert_eq!(params.client_count, 2);
        assert_eq!(params.phystype, "c240g5");
        assert_eq!(params.os_image, OsImage::MpiCuda);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_os_image_parsing() {
        assert_eq!(
            "urn:publicid:IDN+wisc.cloudlab.us+image+powerbound-PG0:gpu.node0".parse::<OsImage>(),
            Ok(OsImage::MpiCuda)
        );
        assert_eq!("MPI+CUDA".parse::<OsImage>(), Ok(OsImage::MpiCuda));
        assert_eq!(
            "urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU22-64-STD".parse::<OsImage>(),
            Err(ParameterError::UnknownImage(
                "urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU22-64-STD".to_string()
            ))
        );
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
clientCount: 5
phystype: "d430"
osImage: "MPI+CUDA"
"#;
        let params: ParameterSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.client_count, 5);
        assert_eq!(params.phystype, "d430");
        assert_eq!(params.os_image, OsImage::MpiCuda);

        // Missing keys fall back to defaults
        let params: ParameterSet = serde_yaml::from_str("clientCount: 0").unwrap();
        assert_eq!(params.client_count, 0);
        assert_eq!(params.phystype, "c240g5");

        // Images outside the allow-list do not deserialize
        let yaml = "osImage: \"urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU22-64-STD\"";
        assert!(serde_yaml::from_str::<ParameterSet>(yaml).is_err());

        // Neither do unknown keys
        assert!(serde_yaml::from_str::<ParameterSet>("clients: 3").is_err());
    }

    #[test]
    fn test_validation_errors() {
        // Any client count is accepted
        let mut params = ParameterSet::default();
        params.client_count = 1000;
        assert!(params.validate().is_ok());

        params.phystype = "c240g5; rm -rf /".to_string();
        assert!(matches!(params.validate(), Err(ParameterError::InvalidPhystype(_))));

        // Surrounding whitespace is not stripped, it is rejected
        params.phystype = " d430 ".to_string();
        assert!(matches!(params.validate(), Err(ParameterError::InvalidPhystype(_))));

        params.phystype = "d430".to_string();
        assert_eq!(params.hardware_type(), Some("d430"));

        // An empty node type is allowed and means "any"
        params.phystype = String::new();
        assert!(params.validate().is_ok());
        assert_eq!(params.hardware_type(), None);
    }

    #[test]
    fn test_declared_parameters() {
        let decls = declared_parameters();
        let names: Vec<&str> = decls.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["clientCount", "phystype", "osImage"]);

        let json = serde_json::to_value(&decls).unwrap();
        assert_eq!(json[0]["type"], "integer");
        assert_eq!(json[0]["default"], 2);
        assert!(json[0].get("legal_values").is_none());
        assert_eq!(json[2]["legal_values"][0]["label"], "MPI+CUDA");
    }
}
