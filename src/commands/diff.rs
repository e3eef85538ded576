//! Diff command - preview how a configuration change alters the graph

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    AttrValue, ChangeKind, Compiled, DiffSummary, IncludeChanges, ResourceDiff, compute_diffs,
    group_by_kind,
};

use crate::Context;
use crate::cli::DiffArgs;
use crate::config::LoadedInput;
use crate::render::FileRenderer;
use crate::ui;

pub fn run(ctx: &Context, args: DiffArgs) -> Result<()> {
    let before = LoadedInput::load(&args.before)?;
    let after = LoadedInput::load(&args.after)?;
    let before_renderer = super::renderer_for(&before, args.templates.as_deref());
    let after_renderer = super::renderer_for(&after, args.templates.as_deref());

    let target = args.target.as_deref();
    let before_graph = compile(&before, &before_renderer)?
        .graph
        .filter_by_target(target);
    let after_graph = compile(&after, &after_renderer)?
        .graph
        .filter_by_target(target);

    ui::header(&format!("{} → {}", before.name(), after.name()));
    if before_graph.state != after_graph.state {
        ui::kv(
            "state",
            &format!("{} → {}", before_graph.state, after_graph.state),
        );
    }

    let diffs = compute_diffs(&before_graph, &after_graph);
    let includes = IncludeChanges::between(&before_graph, &after_graph);
    let summary = DiffSummary::from_diffs(&diffs).with_includes(&includes);

    if !summary.has_changes() {
        println!();
        ui::success("No changes");
        return Ok(());
    }

    for (kind, group) in group_by_kind(&diffs) {
        ui::section(kind.title());
        for diff in group {
            print_diff(diff, ctx.quiet);
        }
    }

    if !includes.is_empty() {
        ui::section("Includes");
        for class in &includes.added {
            println!("  {} {}", "+".green(), format!("include {class}").bold());
        }
        for class in &includes.removed {
            println!("  {} {}", "-".red(), format!("include {class}").bold());
        }
    }

    println!();
    println!(
        "{} {} to add, {} to change, {} to remove",
        "Plan:".bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    if !includes.is_empty() {
        ui::dim(&format!(
            "  includes: {} added, {} removed",
            summary.includes_added, summary.includes_removed
        ));
    }
    Ok(())
}

fn compile(input: &LoadedInput, renderer: &FileRenderer) -> Result<Compiled> {
    let request = input.to_request();
    match declarative::compile_request(&request, renderer) {
        Ok(compiled) => Ok(compiled),
        Err(e) => {
            ui::resolution_error(&request.name, &e);
            bail!("Failed to compile {}", input.path.display());
        }
    }
}

fn print_diff(diff: &ResourceDiff, quiet: bool) {
    let (symbol, label) = match diff.change {
        ChangeKind::Added => ("+".green(), "added".green()),
        ChangeKind::Removed => ("-".red(), "removed".red()),
        ChangeKind::Modified => ("~".yellow(), "modified".yellow()),
    };
    println!("  {} {} {}", symbol, diff.resource.to_string().bold(), label.dimmed());

    if quiet {
        return;
    }

    for change in &diff.attributes {
        match (&change.from, &change.to) {
            (Some(AttrValue::Text(from)), Some(AttrValue::Text(to)))
                if from.contains('\n') || to.contains('\n') =>
            {
                println!("      {}:", change.key.dimmed());
                print_text_diff(from, to);
            }
            (from, to) => println!(
                "      {}: {} → {}",
                change.key.dimmed(),
                format_value(from.as_ref()),
                format_value(to.as_ref())
            ),
        }
    }

    if let Some((from, to)) = &diff.notify {
        let show = |r: &Option<declarative::ResourceRef>| {
            r.as_ref()
                .map_or_else(|| "(none)".to_string(), ToString::to_string)
        };
        println!("      {}: {} → {}", "notify".dimmed(), show(from), show(to));
    }
}

fn format_value(value: Option<&AttrValue>) -> String {
    value.map_or_else(|| "(none)".to_string(), |v| ui::first_line(&v.to_string()))
}

/// Print a line diff of two multi-line values
fn print_text_diff(from: &str, to: &str) {
    let diff = similar::TextDiff::from_lines(from, to);

    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                print!("        {}", format!("- {change}").red());
            }
            similar::ChangeTag::Insert => {
                print!("        {}", format!("+ {change}").green());
            }
            similar::ChangeTag::Equal => {}
        }
        if change.missing_newline() {
            println!();
        }
    }
}
