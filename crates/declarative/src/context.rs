//! Collaborator traits
//!
//! These traits allow the declarative crate to be used without
//! depending on where facts come from or how templates are rendered.

use crate::error::Result;
use crate::types::RawValue;
use std::collections::BTreeMap;

/// Read-only provider of node facts and scoped variables
///
/// Both the module-scope (`<module>_<option>`) and top-scope (bare name)
/// layers are looked up through this trait, so resolvers never touch
/// ambient global state.
pub trait FactProvider: Send + Sync {
    /// Look up a single fact by name
    fn fact(&self, name: &str) -> Option<&RawValue>;

    /// All facts, in a stable order
    fn entries(&self) -> Vec<(&str, &RawValue)>;

    /// Look up a fact and render it as a scalar string
    fn scalar(&self, name: &str) -> Option<String> {
        self.fact(name).and_then(RawValue::as_scalar)
    }
}

impl FactProvider for BTreeMap<String, RawValue> {
    fn fact(&self, name: &str) -> Option<&RawValue> {
        self.get(name)
    }

    fn entries(&self) -> Vec<(&str, &RawValue)> {
        self.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }
}

/// Provider with no facts at all
pub struct NoFacts;

impl FactProvider for NoFacts {
    fn fact(&self, _name: &str) -> Option<&RawValue> {
        None
    }

    fn entries(&self) -> Vec<(&str, &RawValue)> {
        Vec::new()
    }
}

/// Variables handed to a template renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    /// Fully-qualified domain name of the node
    pub fqdn: String,
    /// Custom class requested through `my_class`
    pub my_class: Option<String>,
    /// Scalar node facts
    pub facts: BTreeMap<String, String>,
    /// Resolved scalar options
    pub settings: BTreeMap<String, String>,
    /// Free-form `options` mapping
    pub options: BTreeMap<String, String>,
}

impl TemplateVars {
    /// Resolve a template variable name
    ///
    /// Lookup order: `fqdn`, `my_class`, `options.<key>`, `facts.<key>`,
    /// then resolved settings, then bare facts.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "fqdn" => return Some(&self.fqdn),
            "my_class" => return self.my_class.as_deref(),
            _ => {}
        }

        if let Some(key) = name.strip_prefix("options.") {
            return self.options.get(key).map(String::as_str);
        }
        if let Some(key) = name.strip_prefix("facts.") {
            return self.facts.get(key).map(String::as_str);
        }

        self.settings
            .get(name)
            .or_else(|| self.facts.get(name))
            .map(String::as_str)
    }
}

/// External renderer that turns a template reference into file content
///
/// Implementations must be pure with respect to their inputs: the same
/// template and variables always produce the same content.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with the given variables
    fn render(&self, template: &str, vars: &TemplateVars) -> Result<String>;
}

/// Renderer for callers that never use templates
///
/// Any attempt to render fails, which surfaces a `template` option that
/// nobody can honour instead of silently producing empty content.
pub struct NoRenderer;

impl TemplateRenderer for NoRenderer {
    fn render(&self, template: &str, _vars: &TemplateVars) -> Result<String> {
        Err(crate::error::Error::render(
            template,
            "no template renderer configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_fact_provider() {
        let mut facts = BTreeMap::new();
        facts.insert("ipaddress".to_string(), RawValue::from("10.42.42.42"));
        facts.insert("processorcount".to_string(), RawValue::Int(4));

        assert_eq!(facts.scalar("ipaddress").as_deref(), Some("10.42.42.42"));
        assert_eq!(facts.scalar("processorcount").as_deref(), Some("4"));
        assert!(facts.fact("missing").is_none());
        assert_eq!(facts.entries().len(), 2);
        assert!(NoFacts.entries().is_empty());
    }

    #[test]
    fn test_template_vars_lookup() {
        let mut vars = TemplateVars {
            fqdn: "rspec.example42.com".to_string(),
            ..Default::default()
        };
        vars.options
            .insert("opt_a".to_string(), "value_a".to_string());
        vars.facts
            .insert("port".to_string(), "fact-port".to_string());
        vars.settings.insert("port".to_string(), "42".to_string());

        assert_eq!(vars.lookup("fqdn"), Some("rspec.example42.com"));
        assert_eq!(vars.lookup("options.opt_a"), Some("value_a"));
        assert_eq!(vars.lookup("port"), Some("42"));
        assert_eq!(vars.lookup("facts.port"), Some("fact-port"));
        assert_eq!(vars.lookup("my_class"), None);
        assert_eq!(vars.lookup("nope"), None);
    }

    #[test]
    fn test_no_renderer_fails() {
        let err = NoRenderer
            .render("nginx/nginx.conf.erb", &TemplateVars::default())
            .unwrap_err();
        assert!(err.to_string().contains("nginx/nginx.conf.erb"));
    }
}
