pub mod compile;
pub mod diff;
pub mod options;
pub mod resolve;

use crate::config::LoadedInput;
use crate::render::FileRenderer;
use colored::Colorize;
use declarative::{AttrValue, Error, Layer, ResourceDecl, ResourceGraph};
use serde::Serialize;
use std::path::Path;

/// Build the renderer for one input
///
/// The explicit template root is searched first, then the input's own root.
/// Roots of other inputs are never searched.
pub fn renderer_for(input: &LoadedInput, templates: Option<&Path>) -> FileRenderer {
    let roots = templates
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(input.template_root()))
        .collect();
    FileRenderer::new(roots)
}

/// Machine-readable form of a resolution error
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub category: &'static str,
    pub message: String,
    pub option: Option<String>,
    pub layer: Option<&'static str>,
    pub advice: &'static str,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        let category = err.category();
        Self {
            category: category.description(),
            message: err.to_string(),
            option: err.option().map(str::to_string),
            layer: err.layer().map(Layer::label),
            advice: category.advice(),
        }
    }
}

/// Print one declaration with its attributes
pub fn print_resource(resource: &ResourceDecl, quiet: bool) {
    let marker = if resource.is_present() {
        "●".green()
    } else {
        "○".red()
    };
    println!("  {} {}", marker, resource.reference().to_string().bold());

    if quiet {
        return;
    }
    for (key, value) in &resource.attributes {
        println!("      {}: {}", key.dimmed(), format_attr(value));
    }
    if let Some(target) = &resource.notifies {
        println!("      {} {}", "notify →".dimmed(), target.to_string().cyan());
    }
}

/// Print a whole graph under a section header
pub fn print_graph(title: &str, graph: &ResourceGraph, quiet: bool) {
    crate::ui::section(&format!("{title} ({})", graph.state));
    for resource in graph.resources() {
        print_resource(resource, quiet);
    }
    for class in graph.includes() {
        println!("  {} {}", "+".blue(), format!("include {class}").dimmed());
    }
}

fn format_attr(value: &AttrValue) -> String {
    match value {
        AttrValue::Text(text) => crate::ui::first_line(text),
        other => other.to_string(),
    }
}
