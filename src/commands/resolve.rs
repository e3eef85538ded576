//! Resolve command - effective option values and their provenance

use anyhow::{Result, bail};
use colored::{ColoredString, Colorize};
use declarative::{LifecycleState, Layer, ResolvedEntry, Setting};
use serde::Serialize;

use crate::Context;
use crate::cli::{OutputFormat, ResolveArgs};
use crate::config::LoadedInput;
use crate::ui;

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    node: String,
    module: &'a str,
    state: LifecycleState,
    options: &'a [ResolvedEntry],
}

pub fn run(ctx: &Context, args: ResolveArgs) -> Result<()> {
    let loaded = LoadedInput::load(&args.input)?;
    let request = loaded.to_request();

    let config = match declarative::resolve(&request.module, &request.params, &request.facts) {
        Ok(config) => config,
        Err(e) => {
            ui::resolution_error(&request.name, &e);
            bail!("Failed to resolve {}", args.input.display());
        }
    };
    let state = LifecycleState::from_config(&config);

    if args.format == OutputFormat::Json {
        let report = ResolveReport {
            node: request.name,
            module: &request.module,
            state,
            options: config.entries(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header(&format!("{} ({})", request.name, request.module));
    ui::kv("state", &state.to_string());

    ui::section("Options");
    for entry in config.entries() {
        if ctx.quiet && entry.layer == Layer::Default {
            continue;
        }
        println!(
            "  {:<22} {:<32} {}",
            entry.name,
            format_setting(&entry.value),
            layer_tag(entry.layer)
        );
    }

    let unknown = loaded.input.unknown_params();
    if !unknown.is_empty() {
        println!();
        ui::warn(&format!("Ignored unknown parameters: {}", unknown.join(", ")));
    }
    Ok(())
}

fn format_setting(setting: &Setting) -> String {
    match setting {
        Setting::Mapping(entries) if entries.is_empty() => "{}".to_string(),
        Setting::Mapping(entries) => {
            let pairs: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{{{}}}", pairs.join(", "))
        }
        other => other
            .as_scalar()
            .map(|s| ui::first_line(&s))
            .unwrap_or_else(|| "(unset)".to_string()),
    }
}

fn layer_tag(layer: Layer) -> ColoredString {
    match layer {
        Layer::Passed => layer.label().green(),
        Layer::ModuleScope => layer.label().cyan(),
        Layer::TopScope => layer.label().yellow(),
        Layer::Default => layer.label().dimmed(),
    }
}
