//! Compile command - node inputs to resource graphs

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{Compiled, Edge, LifecycleState, NodeJob, NodeRequest, ResourceGraph};
use serde::Serialize;

use super::{ErrorReport, print_graph};
use crate::Context;
use crate::cli::{CompileArgs, OutputFormat};
use crate::config::{self, LoadedInput};
use crate::render::FileRenderer;
use crate::ui;

#[derive(Debug, Serialize)]
struct NodeReport<'a> {
    node: &'a str,
    module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<LifecycleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<ResourceGraph>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    edges: Vec<Edge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

pub fn run(ctx: &Context, args: CompileArgs) -> Result<()> {
    let inputs = config::load_inputs(&args.inputs)?;
    if inputs.is_empty() {
        bail!("No node inputs found");
    }

    let requests: Vec<NodeRequest> = inputs.iter().map(LoadedInput::to_request).collect();
    let renderers: Vec<FileRenderer> = inputs
        .iter()
        .map(|input| super::renderer_for(input, args.templates.as_deref()))
        .collect();
    for (request, renderer) in requests.iter().zip(&renderers) {
        log::debug!("{}: template search path {:?}", request.name, renderer.roots());
    }

    let threads = args.jobs.unwrap_or_else(rayon::current_num_threads).max(1);
    log::info!("Compiling {} node(s) with {} job(s)", requests.len(), threads);

    let jobs: Vec<NodeJob> = requests
        .iter()
        .zip(&renderers)
        .map(|(request, renderer)| NodeJob::new(request, renderer))
        .collect();
    let results = declarative::compile_jobs(&jobs, threads)?;
    let target = args.target.as_deref();

    let failed = match args.format {
        OutputFormat::Json => print_json(&requests, results, target)?,
        OutputFormat::Text => print_text(ctx, &requests, results, target),
    };

    if failed > 0 {
        bail!("{} of {} node(s) failed to compile", failed, requests.len());
    }
    Ok(())
}

fn print_json(
    requests: &[NodeRequest],
    results: Vec<declarative::Result<Compiled>>,
    target: Option<&str>,
) -> Result<usize> {
    let mut failed = 0;
    let reports: Vec<NodeReport> = requests
        .iter()
        .zip(results)
        .map(|(request, result)| {
            let mut report = NodeReport {
                node: &request.name,
                module: &request.module,
                state: None,
                graph: None,
                edges: Vec::new(),
                error: None,
            };
            match result {
                Ok(compiled) => {
                    let graph = compiled.graph.filter_by_target(target);
                    report.state = Some(compiled.state);
                    report.edges = graph.edges();
                    report.graph = Some(graph);
                }
                Err(e) => {
                    failed += 1;
                    report.error = Some(ErrorReport::from(&e));
                }
            }
            report
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(failed)
}

fn print_text(
    ctx: &Context,
    requests: &[NodeRequest],
    results: Vec<declarative::Result<Compiled>>,
    target: Option<&str>,
) -> usize {
    let mut failed = 0;
    let total = requests.len();

    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(compiled) => {
                let graph = compiled.graph.filter_by_target(target);
                print_graph(&request.name, &graph, ctx.quiet);
                if ctx.verbose > 0 {
                    for edge in graph.edges() {
                        ui::dim(&format!("  {} ~> {}", edge.from, edge.to));
                    }
                }
            }
            Err(e) => {
                failed += 1;
                ui::resolution_error(&request.name, &e);
            }
        }
    }

    println!();
    if failed == 0 {
        ui::success(&format!("Compiled {total} node(s)"));
    } else {
        println!(
            "{} {} compiled, {} failed",
            "Summary:".bold(),
            (total - failed).to_string().green(),
            failed.to_string().red()
        );
    }
    failed
}
