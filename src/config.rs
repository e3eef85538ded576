//! Node input files - the facts and parameters for one compilation

use anyhow::{Context, Result, bail};
use declarative::options;
use declarative::{NodeRequest, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Toml,
    Json,
}

impl InputFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// One node's configuration layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInput {
    /// Managed module; also the prefix of module-scope variables
    #[serde(default = "default_module")]
    pub module: String,

    /// Node name, used as the `fqdn` fact when none is given
    #[serde(default)]
    pub node: Option<String>,

    /// Template root, relative to the input file
    #[serde(default)]
    pub templates: Option<String>,

    /// Top-scope and module-scope variables
    #[serde(default)]
    pub facts: BTreeMap<String, RawValue>,

    /// Explicitly passed parameters
    #[serde(default)]
    pub params: BTreeMap<String, RawValue>,
}

fn default_module() -> String {
    "nginx".to_string()
}

impl NodeInput {
    /// Load a node input from a TOML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;

        match InputFormat::from_path(path) {
            Some(InputFormat::Json) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON format in {}", path.display())),
            Some(InputFormat::Toml) | None => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML format in {}", path.display())),
        }
    }

    /// Passed parameters that no option recognizes
    pub fn unknown_params(&self) -> Vec<&str> {
        self.params
            .keys()
            .map(String::as_str)
            .filter(|name| !options::is_known(name))
            .collect()
    }

    /// Facts with the node name filled in as `fqdn` when missing
    pub fn facts(&self) -> BTreeMap<String, RawValue> {
        let mut facts = self.facts.clone();
        if let Some(node) = &self.node {
            facts
                .entry("fqdn".to_string())
                .or_insert_with(|| RawValue::from(node.as_str()));
        }
        facts
    }

    /// Template root, resolved against the directory holding the input
    pub fn template_root(&self, base: &Path) -> Option<PathBuf> {
        let root = self.templates.as_ref()?;
        let expanded = PathBuf::from(shellexpand::tilde(root).as_ref());
        if expanded.is_absolute() {
            Some(expanded)
        } else {
            Some(base.join(expanded))
        }
    }
}

/// A node input together with where it was loaded from
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub input: NodeInput,
}

impl LoadedInput {
    /// Load an input and warn about parameters that will be ignored
    pub fn load(path: &Path) -> Result<Self> {
        let input = NodeInput::load(path)?;
        for name in input.unknown_params() {
            log::warn!("{}: ignoring unknown parameter '{}'", path.display(), name);
        }
        Ok(Self {
            path: path.to_path_buf(),
            input,
        })
    }

    /// Short name for reports
    pub fn name(&self) -> String {
        self.input
            .node
            .clone()
            .or_else(|| {
                self.path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Directory containing the input file
    pub fn base_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Template root for this input; defaults to the input's directory
    pub fn template_root(&self) -> PathBuf {
        self.input
            .template_root(self.base_dir())
            .unwrap_or_else(|| self.base_dir().to_path_buf())
    }

    pub fn to_request(&self) -> NodeRequest {
        NodeRequest {
            name: self.name(),
            module: self.input.module.clone(),
            params: self.input.params.clone(),
            facts: self.input.facts(),
        }
    }
}

/// Expand files and directories into a list of input files
///
/// Directories are walked for `*.toml` and `*.json` files, sorted by path.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|p| InputFormat::from_path(p).is_some())
                .collect();
            found.sort();
            log::debug!("{}: found {} input(s)", path.display(), found.len());
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("Input not found: {}", path.display());
        }
    }

    Ok(files)
}

/// Load every input, failing on the first unreadable one
pub fn load_inputs(paths: &[PathBuf]) -> Result<Vec<LoadedInput>> {
    collect_inputs(paths)?
        .iter()
        .map(|path| LoadedInput::load(path))
        .collect()
}
