//! Resource declarations
//!
//! A declaration is an idempotent desired-state record: the core decides
//! what should exist, an external enactment engine makes it so.

use crate::types::{AttrValue, Ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Package,
    Service,
    File,
    Monitor,
    Firewall,
    Integration,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Package,
        ResourceKind::Service,
        ResourceKind::File,
        ResourceKind::Monitor,
        ResourceKind::Firewall,
        ResourceKind::Integration,
    ];

    /// Lowercase name, as used in target filters and JSON
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Service => "service",
            Self::File => "file",
            Self::Monitor => "monitor",
            Self::Firewall => "firewall",
            Self::Integration => "integration",
        }
    }

    /// Capitalized name, as used in references (`Service[nginx]`)
    pub fn title(self) -> &'static str {
        match self {
            Self::Package => "Package",
            Self::Service => "Service",
            Self::File => "File",
            Self::Monitor => "Monitor",
            Self::Firewall => "Firewall",
            Self::Integration => "Integration",
        }
    }

    /// Parse a kind name, accepting plurals
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let singular = name.strip_suffix('s').unwrap_or(&name);
        Self::ALL.into_iter().find(|kind| kind.as_str() == singular)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a declaration, e.g. `Service[nginx]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.title(), self.id)
    }
}

/// A declarative unit of desired state
///
/// # Example
///
/// ```ignore
/// use declarative::{Ensure, ResourceDecl, ResourceKind, ResourceRef};
///
/// let file = ResourceDecl::new(ResourceKind::File, "nginx.conf")
///     .with_attr("ensure", Ensure::Present)
///     .with_attr("path", "/etc/nginx/nginx.conf")
///     .notify(ResourceRef::new(ResourceKind::Service, "nginx"));
///
/// assert_eq!(file.ensure(), Some("present"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub kind: ResourceKind,
    pub id: String,
    /// Desired attributes; unset optional attributes are simply absent
    pub attributes: BTreeMap<String, AttrValue>,
    /// Declaration refreshed when this one changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifies: Option<ResourceRef>,
}

impl ResourceDecl {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            attributes: BTreeMap::new(),
            notifies: None,
        }
    }

    /// Set an attribute
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Set an attribute only when a value is present
    pub fn with_optional<V: Into<AttrValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.attributes.insert(key.to_string(), value.into());
        }
        self
    }

    /// Add a notify edge to another declaration
    pub fn notify(mut self, target: ResourceRef) -> Self {
        self.notifies = Some(target);
        self
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.id.clone())
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// The `ensure` attribute as text, if declared
    pub fn ensure(&self) -> Option<&str> {
        self.attr("ensure").and_then(AttrValue::as_text)
    }

    /// The `enable` attribute, if declared
    pub fn enable(&self) -> Option<bool> {
        self.attr("enable").and_then(AttrValue::as_bool)
    }

    /// Whether the declaration asks for the resource to exist
    pub fn is_present(&self) -> bool {
        self.ensure()
            .is_some_and(|e| e != Ensure::Absent.as_str() && e != Ensure::Stopped.as_str())
    }
}
