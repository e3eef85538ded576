//! Precedence resolver - picks one effective value per option
//!
//! Layers are consulted in strict rank order: passed parameter, module-scope
//! variable (`<module>_<option>`), top-scope variable (bare name), built-in
//! default. The first layer where the option is *present* wins; a blank
//! string counts as not present, so it never masks a lower layer.

use crate::context::FactProvider;
use crate::error::Result;
use crate::normalize::{normalize, normalize_choice, normalize_mapping, normalize_text};
use crate::options::{OPTIONS, OptionKind, OptionSpec};
use crate::types::{Layer, RawValue, TriState};
use serde::Serialize;
use std::collections::BTreeMap;

/// A typed, normalized option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting {
    Flag(TriState),
    Text(Option<String>),
    Mapping(BTreeMap<String, String>),
}

impl Setting {
    /// Scalar rendering for display and template variables
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            Self::Flag(TriState::Unset) | Self::Text(None) | Self::Mapping(_) => None,
            Self::Flag(state) => Some(state.to_string()),
            Self::Text(Some(text)) => Some(text.clone()),
        }
    }
}

/// The effective value of one option and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub name: &'static str,
    pub value: Setting,
    pub layer: Layer,
}

/// Raw lookup result before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub layer: Layer,
    pub raw: Option<RawValue>,
}

/// Resolves options from passed parameters and a fact provider
pub struct Resolver<'a> {
    module: &'a str,
    passed: &'a BTreeMap<String, RawValue>,
    facts: &'a dyn FactProvider,
}

impl<'a> Resolver<'a> {
    pub fn new(
        module: &'a str,
        passed: &'a BTreeMap<String, RawValue>,
        facts: &'a dyn FactProvider,
    ) -> Self {
        Self {
            module,
            passed,
            facts,
        }
    }

    /// Name of the module-scope variable for an option
    pub fn module_key(&self, option: &str) -> String {
        format!("{}_{option}", self.module)
    }

    /// Find the winning layer and raw value for an option
    ///
    /// Always terminates: the default layer is total, even when the default
    /// itself is unset.
    pub fn lookup(&self, spec: &OptionSpec) -> Lookup {
        let present = |value: Option<&RawValue>| value.filter(|v| !v.is_blank()).cloned();

        if let Some(raw) = present(self.passed.get(spec.name)) {
            return Lookup {
                layer: Layer::Passed,
                raw: Some(raw),
            };
        }
        if let Some(raw) = present(self.facts.fact(&self.module_key(spec.name))) {
            return Lookup {
                layer: Layer::ModuleScope,
                raw: Some(raw),
            };
        }
        if let Some(raw) = present(self.facts.fact(spec.name)) {
            return Lookup {
                layer: Layer::TopScope,
                raw: Some(raw),
            };
        }

        Lookup {
            layer: Layer::Default,
            raw: spec.default.to_raw(self.module, self.facts),
        }
    }

    /// Resolve and normalize a single option
    pub fn resolve_option(&self, spec: &'static OptionSpec) -> Result<ResolvedEntry> {
        let Lookup { layer, raw } = self.lookup(spec);
        let raw = raw.as_ref();

        let value = match spec.kind {
            OptionKind::Flag => normalize(raw).map(Setting::Flag),
            OptionKind::Text => normalize_text(raw).map(Setting::Text),
            OptionKind::Choice(allowed) => normalize_choice(raw, allowed).map(Setting::Text),
            OptionKind::Mapping => normalize_mapping(raw).map(Setting::Mapping),
        }
        .map_err(|rejected| rejected.at(spec.name, layer))?;

        log::debug!("{}: {} -> {:?}", spec.name, layer, value);

        Ok(ResolvedEntry {
            name: spec.name,
            value,
            layer,
        })
    }

    /// Resolve every known option
    ///
    /// The first invalid value aborts resolution; no partial config is returned.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let entries = OPTIONS
            .iter()
            .map(|spec| self.resolve_option(spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedConfig::from_entries(self.module, entries))
    }
}

/// The single effective configuration for one resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub module: String,

    pub absent: TriState,
    pub disable: TriState,
    pub disableboot: TriState,

    pub version: String,
    pub package: String,
    pub service: String,
    pub process: String,
    pub service_autorestart: TriState,

    pub config_file: String,
    pub config_dir: String,
    pub config_file_mode: String,
    pub config_file_owner: String,
    pub config_file_group: String,
    pub source: Option<String>,
    pub source_dir: Option<String>,
    pub source_dir_purge: TriState,
    pub template: Option<String>,
    pub content: Option<String>,
    pub options: BTreeMap<String, String>,
    pub audit_only: TriState,
    pub my_class: Option<String>,

    pub monitor: TriState,
    pub monitor_tool: Option<String>,
    pub monitor_target: Option<String>,

    pub firewall: TriState,
    pub firewall_tool: Option<String>,
    pub firewall_src: Option<String>,
    pub firewall_dst: Option<String>,
    pub protocol: String,
    pub port: String,

    pub puppi: TriState,
    pub puppi_helper: Option<String>,

    /// Every resolved option with its winning layer, in table order
    #[serde(skip)]
    entries: Vec<ResolvedEntry>,
}

impl ResolvedConfig {
    fn from_entries(module: &str, entries: Vec<ResolvedEntry>) -> Self {
        let by_name: BTreeMap<&str, &Setting> =
            entries.iter().map(|e| (e.name, &e.value)).collect();

        let flag = |name: &str| match by_name.get(name) {
            Some(Setting::Flag(state)) => *state,
            _ => TriState::Unset,
        };
        let text = |name: &str| match by_name.get(name) {
            Some(Setting::Text(value)) => value.clone(),
            _ => None,
        };
        // Options with a static text default always resolve to some value
        let required = |name: &str| text(name).unwrap_or_default();
        let options = match by_name.get("options") {
            Some(Setting::Mapping(mapping)) => mapping.clone(),
            _ => BTreeMap::new(),
        };

        Self {
            module: module.to_string(),
            absent: flag("absent"),
            disable: flag("disable"),
            disableboot: flag("disableboot"),
            version: required("version"),
            package: required("package"),
            service: required("service"),
            process: required("process"),
            service_autorestart: flag("service_autorestart"),
            config_file: required("config_file"),
            config_dir: required("config_dir"),
            config_file_mode: required("config_file_mode"),
            config_file_owner: required("config_file_owner"),
            config_file_group: required("config_file_group"),
            source: text("source"),
            source_dir: text("source_dir"),
            source_dir_purge: flag("source_dir_purge"),
            template: text("template"),
            content: text("content"),
            options,
            audit_only: flag("audit_only"),
            my_class: text("my_class"),
            monitor: flag("monitor"),
            monitor_tool: text("monitor_tool"),
            monitor_target: text("monitor_target"),
            firewall: flag("firewall"),
            firewall_tool: text("firewall_tool"),
            firewall_src: text("firewall_src"),
            firewall_dst: text("firewall_dst"),
            protocol: required("protocol"),
            port: required("port"),
            puppi: flag("puppi"),
            puppi_helper: text("puppi_helper"),
            entries,
        }
    }

    /// Resolved entries in option-table order
    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    /// Look up one resolved entry by option name
    pub fn entry(&self, name: &str) -> Option<&ResolvedEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Layer that supplied an option's effective value
    pub fn layer_of(&self, name: &str) -> Option<Layer> {
        self.entry(name).map(|e| e.layer)
    }

    /// Scalar settings, for template variables
    pub fn scalars(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|e| e.value.as_scalar().map(|v| (e.name.to_string(), v)))
            .collect()
    }
}

/// Resolve a full configuration in one call
pub fn resolve(
    module: &str,
    passed: &BTreeMap<String, RawValue>,
    facts: &dyn FactProvider,
) -> Result<ResolvedConfig> {
    Resolver::new(module, passed, facts).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoFacts;
    use crate::error::Error;

    fn map(pairs: &[(&str, RawValue)]) -> BTreeMap<String, RawValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults_only() {
        let config = resolve("nginx", &BTreeMap::new(), &NoFacts).unwrap();
        assert_eq!(config.absent, TriState::False);
        assert_eq!(config.monitor, TriState::False);
        assert_eq!(config.service_autorestart, TriState::True);
        assert_eq!(config.package, "nginx");
        assert_eq!(config.config_file, "/etc/nginx/nginx.conf");
        assert_eq!(config.protocol, "tcp");
        assert_eq!(config.port, "80");
        assert_eq!(config.source, None);
        assert_eq!(config.monitor_target, None);
        assert!(config.options.is_empty());
        assert!(config.entries().iter().all(|e| e.layer == Layer::Default));
    }

    #[test]
    fn test_passed_overrides_all_layers() {
        let passed = map(&[("monitor", RawValue::Bool(true))]);
        let facts = map(&[
            ("monitor", RawValue::Bool(false)),
            ("nginx_monitor", RawValue::Bool(false)),
        ]);
        let config = resolve("nginx", &passed, &facts).unwrap();
        assert_eq!(config.monitor, TriState::True);
        assert_eq!(config.layer_of("monitor"), Some(Layer::Passed));
    }

    #[test]
    fn test_passed_false_beats_lower_true() {
        let passed = map(&[("firewall", RawValue::Bool(false))]);
        let facts = map(&[
            ("firewall", RawValue::Bool(true)),
            ("nginx_firewall", RawValue::from("yes")),
        ]);
        let config = resolve("nginx", &passed, &facts).unwrap();
        assert_eq!(config.firewall, TriState::False);
        assert_eq!(config.layer_of("firewall"), Some(Layer::Passed));
    }

    #[test]
    fn test_module_scope_overrides_top_scope() {
        let facts = map(&[
            ("monitor", RawValue::Bool(false)),
            ("nginx_monitor", RawValue::Bool(true)),
        ]);
        let config = resolve("nginx", &BTreeMap::new(), &facts).unwrap();
        assert_eq!(config.monitor, TriState::True);
        assert_eq!(config.layer_of("monitor"), Some(Layer::ModuleScope));
    }

    #[test]
    fn test_top_scope_overrides_default() {
        let facts = map(&[("monitor", RawValue::Bool(true))]);
        let config = resolve("nginx", &BTreeMap::new(), &facts).unwrap();
        assert_eq!(config.monitor, TriState::True);
        assert_eq!(config.layer_of("monitor"), Some(Layer::TopScope));
    }

    #[test]
    fn test_blank_module_value_matches_absent_module_value() {
        let blank = map(&[
            ("monitor", RawValue::Bool(false)),
            ("nginx_monitor", RawValue::from("")),
        ]);
        let missing = map(&[("monitor", RawValue::Bool(false))]);
        let explicit = map(&[
            ("monitor", RawValue::Bool(false)),
            ("nginx_monitor", RawValue::Bool(false)),
        ]);

        let from_blank = resolve("nginx", &BTreeMap::new(), &blank).unwrap();
        let from_missing = resolve("nginx", &BTreeMap::new(), &missing).unwrap();
        let from_explicit = resolve("nginx", &BTreeMap::new(), &explicit).unwrap();

        assert_eq!(from_blank.monitor, TriState::False);
        assert_eq!(from_blank.monitor, from_missing.monitor);
        assert_eq!(from_missing.monitor, from_explicit.monitor);
        assert_eq!(from_blank.layer_of("monitor"), Some(Layer::TopScope));
    }

    #[test]
    fn test_module_key_uses_module_name() {
        let facts = map(&[("apache_monitor", RawValue::Bool(true))]);
        let nginx = resolve("nginx", &BTreeMap::new(), &facts).unwrap();
        let apache = resolve("apache", &BTreeMap::new(), &facts).unwrap();
        assert_eq!(nginx.monitor, TriState::False);
        assert_eq!(apache.monitor, TriState::True);
        assert_eq!(apache.service, "apache");
    }

    #[test]
    fn test_invalid_flag_reports_option_and_layer() {
        let facts = map(&[("nginx_firewall", RawValue::from("sometimes"))]);
        let err = resolve("nginx", &BTreeMap::new(), &facts).unwrap_err();
        match err {
            Error::InvalidValue { option, layer, .. } => {
                assert_eq!(option, "firewall");
                assert_eq!(layer, Layer::ModuleScope);
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_protocol_rejected() {
        let passed = map(&[("protocol", RawValue::from("icmp"))]);
        let err = resolve("nginx", &passed, &NoFacts).unwrap_err();
        assert_eq!(err.option(), Some("protocol"));
        assert_eq!(err.layer(), Some(Layer::Passed));
    }

    #[test]
    fn test_numeric_port_is_text() {
        let passed = map(&[("port", RawValue::Int(42))]);
        let config = resolve("nginx", &passed, &NoFacts).unwrap();
        assert_eq!(config.port, "42");
    }

    #[test]
    fn test_fact_defaults_follow_node() {
        let facts = map(&[("ipaddress", RawValue::from("10.42.42.42"))]);
        let config = resolve("nginx", &BTreeMap::new(), &facts).unwrap();
        assert_eq!(config.monitor_target.as_deref(), Some("10.42.42.42"));
        assert_eq!(config.firewall_dst.as_deref(), Some("10.42.42.42"));
        assert_eq!(config.layer_of("monitor_target"), Some(Layer::Default));
    }

    #[test]
    fn test_options_mapping() {
        let mut options = BTreeMap::new();
        options.insert("opt_a".to_string(), RawValue::from("value_a"));
        let passed = map(&[("options", RawValue::Map(options))]);
        let config = resolve("nginx", &passed, &NoFacts).unwrap();
        assert_eq!(config.options["opt_a"], "value_a");
        assert!(!config.scalars().contains_key("options"));
        assert_eq!(config.scalars()["port"], "80");
    }
}
