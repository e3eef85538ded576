//! Option table - every recognized option with its type and default

use crate::context::FactProvider;
use crate::types::RawValue;
use std::fmt;

/// Declared type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean-like, normalized to a tri-state
    Flag,
    /// Free-form scalar text
    Text,
    /// Text restricted to a fixed set of values
    Choice(&'static [&'static str]),
    /// Mapping of string keys to scalar values
    Mapping,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "boolean-like"),
            Self::Text => write!(f, "string"),
            Self::Choice(choices) => write!(f, "one of {}", choices.join("|")),
            Self::Mapping => write!(f, "mapping"),
        }
    }
}

/// Built-in default of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// No default; the option is unset unless a layer supplies it
    Unset,
    Flag(bool),
    /// Text default; `{module}` expands to the module name
    Text(&'static str),
    /// Copy of a node fact
    Fact(&'static str),
}

impl DefaultValue {
    /// Materialize the default for a module and node
    pub fn to_raw(self, module: &str, facts: &dyn FactProvider) -> Option<RawValue> {
        match self {
            Self::Unset => None,
            Self::Flag(b) => Some(RawValue::Bool(b)),
            Self::Text(text) => Some(RawValue::Str(text.replace("{module}", module))),
            Self::Fact(name) => facts.fact(name).cloned(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "-"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text("") => write!(f, "\"\""),
            Self::Text(text) => write!(f, "{text}"),
            Self::Fact(name) => write!(f, "fact:{name}"),
        }
    }
}

/// A named configurable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: DefaultValue,
    pub description: &'static str,
}

const fn flag(name: &'static str, default: bool, description: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind: OptionKind::Flag,
        default: DefaultValue::Flag(default),
        description,
    }
}

const fn text(name: &'static str, default: DefaultValue, description: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind: OptionKind::Text,
        default,
        description,
    }
}

pub const PROTOCOLS: &[&str] = &["tcp", "udp"];

/// Every option the resolver knows about
pub const OPTIONS: &[OptionSpec] = &[
    // Lifecycle
    flag("absent", false, "Remove package, config and service"),
    flag("disable", false, "Stop the service and disable it at boot"),
    flag("disableboot", false, "Disable the service at boot only"),
    // Package and service naming
    text("version", DefaultValue::Text("present"), "Package version to ensure"),
    text("package", DefaultValue::Text("{module}"), "Package name"),
    text("service", DefaultValue::Text("{module}"), "Service name"),
    text("process", DefaultValue::Text("{module}"), "Process name to monitor"),
    flag("service_autorestart", true, "Restart the service when its config changes"),
    // Configuration files
    text(
        "config_file",
        DefaultValue::Text("/etc/{module}/{module}.conf"),
        "Main configuration file path",
    ),
    text("config_dir", DefaultValue::Text("/etc/{module}"), "Configuration directory path"),
    text("config_file_mode", DefaultValue::Text("0644"), "Configuration file mode"),
    text("config_file_owner", DefaultValue::Text("root"), "Configuration file owner"),
    text("config_file_group", DefaultValue::Text("root"), "Configuration file group"),
    text("source", DefaultValue::Unset, "Source pointer for the configuration file"),
    text("source_dir", DefaultValue::Unset, "Source pointer for the configuration directory"),
    flag("source_dir_purge", false, "Purge unmanaged files from the configuration directory"),
    text("template", DefaultValue::Unset, "Template rendered into the configuration file"),
    text("content", DefaultValue::Unset, "Inline configuration file content"),
    OptionSpec {
        name: "options",
        kind: OptionKind::Mapping,
        default: DefaultValue::Unset,
        description: "Extra key/value pairs passed to the template renderer",
    },
    flag("audit_only", false, "Audit configuration files without replacing them"),
    text("my_class", DefaultValue::Unset, "Additional class to include"),
    // Monitoring
    flag("monitor", false, "Monitor the service process"),
    text("monitor_tool", DefaultValue::Text("process"), "Monitoring tool"),
    text("monitor_target", DefaultValue::Fact("ipaddress"), "Monitoring target address"),
    // Firewalling
    flag("firewall", false, "Open a firewall rule for the service"),
    text("firewall_tool", DefaultValue::Text("iptables"), "Firewall tool"),
    text("firewall_src", DefaultValue::Text("0.0.0.0/0"), "Firewall rule source"),
    text("firewall_dst", DefaultValue::Fact("ipaddress"), "Firewall rule destination"),
    OptionSpec {
        name: "protocol",
        kind: OptionKind::Choice(PROTOCOLS),
        default: DefaultValue::Text("tcp"),
        description: "Service protocol",
    },
    text("port", DefaultValue::Text("80"), "Service port"),
    // Helper integration
    flag("puppi", false, "Emit a helper integration descriptor"),
    text("puppi_helper", DefaultValue::Unset, "Helper used by the integration descriptor"),
];

/// Find an option by name
pub fn find(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}

/// Whether `name` is a recognized option
pub fn is_known(name: &str) -> bool {
    find(name).is_some()
}
