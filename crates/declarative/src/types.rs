//! Core types for layered resolution and resource declarations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw value as it arrives from an input layer
///
/// Inputs come from heterogeneous sources (TOML, JSON, fact providers), so
/// nothing about a raw value is trusted until it has been normalized
/// against the option it is meant for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    /// Whether this value counts as "not supplied" at its layer
    ///
    /// Only whitespace-only strings are blank; an explicit `false` is a value.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Str(s) if s.trim().is_empty())
    }

    /// Short name of the value's shape, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
        }
    }

    /// Render scalars as strings; lists and mappings have no scalar form
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Str(s) => Some(s.clone()),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::List(items) => write!(f, "[list of {}]", items.len()),
            Self::Map(entries) => write!(f, "{{mapping of {}}}", entries.len()),
            scalar => write!(f, "{}", scalar.as_scalar().unwrap_or_default()),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Canonical boolean with an explicit "not set" state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    #[default]
    Unset,
}

impl TriState {
    pub fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Explicitly false; `Unset` is not false
    pub fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    pub fn is_unset(self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Collapse to a plain boolean, using `default` for `Unset`
    pub fn unwrap_or(self, default: bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Unset => default,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

/// One ranked source of option values, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Explicitly passed parameter
    Passed,
    /// Module-scoped variable (`<module>_<option>`)
    ModuleScope,
    /// Top-scope variable (bare option name)
    TopScope,
    /// Built-in default
    Default,
}

impl Layer {
    /// All layers in resolution order
    pub const ALL: [Layer; 4] = [
        Layer::Passed,
        Layer::ModuleScope,
        Layer::TopScope,
        Layer::Default,
    ];

    /// Short label for tables and JSON-free output
    pub fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::ModuleScope => "module",
            Self::TopScope => "top",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed parameter"),
            Self::ModuleScope => write!(f, "module-scope variable"),
            Self::TopScope => write!(f, "top-scope variable"),
            Self::Default => write!(f, "built-in default"),
        }
    }
}

/// Desired `ensure` value of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ensure {
    Present,
    Absent,
    Running,
    Stopped,
    Directory,
    /// A specific package version or `latest`
    Version(String),
}

impl Ensure {
    /// Interpret the `version` option as a package ensure value
    pub fn from_version(version: &str) -> Self {
        match version.trim() {
            "" | "present" | "installed" => Self::Present,
            "absent" | "purged" => Self::Absent,
            other => Self::Version(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Directory => "directory",
            Self::Version(v) => v,
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value on a resource declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
    Map(BTreeMap<String, String>),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Map(entries) => {
                let pairs: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Ensure> for AttrValue {
    fn from(value: Ensure) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<BTreeMap<String, String>> for AttrValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}
