//! File-backed template renderer
//!
//! Templates are plain text files with `{{ name }}` placeholders. Names are
//! looked up through [`TemplateVars::lookup`], so `{{ fqdn }}`,
//! `{{ options.opt_a }}`, `{{ facts.ipaddress }}` and bare option names all
//! work. An unknown name fails the render.

use declarative::{Error, TemplateRenderer, TemplateVars};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Renders templates found under an ordered list of roots
#[derive(Debug, Clone, Default)]
pub struct FileRenderer {
    roots: Vec<PathBuf>,
}

impl FileRenderer {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let mut unique = Vec::with_capacity(roots.len());
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self { roots: unique }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find a template file; the first root containing it wins
    pub fn locate(&self, template: &str) -> Option<PathBuf> {
        let path = Path::new(template);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_file())
    }
}

/// Substitute every `{{ name }}` placeholder
pub fn substitute(template: &str, source: &str, vars: &TemplateVars) -> declarative::Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = vars.lookup(name.as_str()).ok_or_else(|| {
            Error::render(template, format!("undefined variable '{}'", name.as_str()))
        })?;
        out.push_str(&source[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&source[last..]);
    Ok(out)
}

impl TemplateRenderer for FileRenderer {
    fn render(&self, template: &str, vars: &TemplateVars) -> declarative::Result<String> {
        let path = self.locate(template).ok_or_else(|| {
            let searched: Vec<String> = self.roots.iter().map(|r| r.display().to_string()).collect();
            Error::render(
                template,
                format!("template not found (searched: {})", searched.join(", ")),
            )
        })?;

        log::debug!("rendering {} from {}", template, path.display());
        let source = fs::read_to_string(&path)
            .map_err(|e| Error::render(template, format!("{}: {e}", path.display())))?;
        substitute(template, &source, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn vars() -> TemplateVars {
        let mut options = BTreeMap::new();
        options.insert("opt_a".to_string(), "value_a".to_string());
        let mut settings = BTreeMap::new();
        settings.insert("port".to_string(), "42".to_string());
        TemplateVars {
            fqdn: "rspec.example42.com".to_string(),
            options,
            settings,
            ..TemplateVars::default()
        }
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            "t",
            "server_name {{ fqdn }};\nlisten {{port}};\n# {{ options.opt_a }}\n",
            &vars(),
        )
        .unwrap();
        assert_eq!(
            out,
            "server_name rspec.example42.com;\nlisten 42;\n# value_a\n"
        );
    }

    #[test]
    fn test_substitute_leaves_plain_braces() {
        let out = substitute("t", "events { worker_connections 1024; }", &vars()).unwrap();
        assert_eq!(out, "events { worker_connections 1024; }");
    }

    #[test]
    fn test_undefined_variable_fails() {
        let err = substitute("nginx/spec.erb", "{{ missing }}", &vars()).unwrap_err();
        assert_eq!(err.category(), declarative::ErrorCategory::Render);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_render_searches_roots_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("nginx")).unwrap();
        fs::write(second.path().join("nginx/spec.erb"), "host {{ fqdn }}").unwrap();

        let renderer = FileRenderer::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
            first.path().to_path_buf(),
        ]);
        assert_eq!(renderer.roots().len(), 2);
        assert_eq!(
            renderer.render("nginx/spec.erb", &vars()).unwrap(),
            "host rspec.example42.com"
        );

        fs::create_dir_all(first.path().join("nginx")).unwrap();
        fs::write(first.path().join("nginx/spec.erb"), "first").unwrap();
        assert_eq!(renderer.render("nginx/spec.erb", &vars()).unwrap(), "first");
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        let renderer = FileRenderer::new(vec![dir.path().to_path_buf()]);
        assert!(renderer.render("nope.erb", &vars()).is_err());
    }
}
