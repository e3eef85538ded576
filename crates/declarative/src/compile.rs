//! Compile pipeline - resolve, classify, build
//!
//! Each compilation is a pure function of its inputs, so independent nodes
//! can be compiled in parallel without coordination.

use crate::builder::GraphBuilder;
use crate::context::{FactProvider, TemplateRenderer};
use crate::error::Result;
use crate::graph::ResourceGraph;
use crate::lifecycle::LifecycleState;
use crate::resolver::{ResolvedConfig, Resolver};
use crate::types::RawValue;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Inputs for compiling one node
#[derive(Debug, Clone, Default)]
pub struct NodeRequest {
    /// Label used in reports (usually the input file name)
    pub name: String,
    pub module: String,
    /// Explicitly passed parameters
    pub params: BTreeMap<String, RawValue>,
    /// Node facts, also the source of module- and top-scope variables
    pub facts: BTreeMap<String, RawValue>,
}

/// Everything one resolution pass produced
#[derive(Debug, Clone)]
pub struct Compiled {
    pub config: ResolvedConfig,
    pub state: LifecycleState,
    pub graph: ResourceGraph,
}

/// Resolve options, derive the lifecycle state and build the graph
///
/// All-or-nothing: any error aborts before a graph exists.
pub fn compile(
    module: &str,
    params: &BTreeMap<String, RawValue>,
    facts: &dyn FactProvider,
    renderer: &dyn TemplateRenderer,
) -> Result<Compiled> {
    let config = Resolver::new(module, params, facts).resolve()?;
    let state = LifecycleState::from_config(&config);
    log::debug!("{module}: lifecycle state {state}");

    let graph = GraphBuilder::new(&config, facts, renderer).build(state)?;
    Ok(Compiled {
        config,
        state,
        graph,
    })
}

/// Compile one request
pub fn compile_request(request: &NodeRequest, renderer: &dyn TemplateRenderer) -> Result<Compiled> {
    compile(&request.module, &request.params, &request.facts, renderer)
}

/// A request paired with the renderer that serves it
///
/// Each node brings its own renderer, so template lookups never cross
/// from one node to another.
#[derive(Clone, Copy)]
pub struct NodeJob<'a> {
    pub request: &'a NodeRequest,
    pub renderer: &'a dyn TemplateRenderer,
}

impl<'a> NodeJob<'a> {
    pub fn new(request: &'a NodeRequest, renderer: &'a dyn TemplateRenderer) -> Self {
        Self { request, renderer }
    }

    fn run(&self) -> Result<Compiled> {
        compile_request(self.request, self.renderer)
    }
}

/// Compile many independent jobs in parallel
///
/// Results are returned in job order. Only pool creation can fail the
/// whole batch; per-node failures are reported per node.
pub fn compile_jobs(jobs: &[NodeJob<'_>], threads: usize) -> anyhow::Result<Vec<Result<Compiled>>> {
    if threads <= 1 || jobs.len() <= 1 {
        return Ok(jobs.iter().map(NodeJob::run).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    Ok(pool.install(|| jobs.par_iter().map(NodeJob::run).collect()))
}

/// Compile many requests that share one renderer
pub fn compile_many<R: TemplateRenderer>(
    requests: &[NodeRequest],
    renderer: &R,
    threads: usize,
) -> anyhow::Result<Vec<Result<Compiled>>> {
    let jobs: Vec<NodeJob<'_>> = requests
        .iter()
        .map(|request| NodeJob::new(request, renderer))
        .collect();
    compile_jobs(&jobs, threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NoFacts, TemplateVars};
    use crate::resource::ResourceKind;
    use crate::types::{AttrValue, TriState};

    struct FqdnRenderer;

    impl TemplateRenderer for FqdnRenderer {
        fn render(&self, _template: &str, vars: &TemplateVars) -> Result<String> {
            let mut out = format!("fqdn: {}\n", vars.fqdn);
            for (key, value) in &vars.options {
                out.push_str(&format!("{key} = {value}\n"));
            }
            Ok(out)
        }
    }

    fn map(pairs: &[(&str, RawValue)]) -> BTreeMap<String, RawValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn node_facts(extra: &[(&str, RawValue)]) -> BTreeMap<String, RawValue> {
        let mut facts = map(&[
            ("ipaddress", RawValue::from("10.42.42.42")),
            ("fqdn", RawValue::from("rspec.example42.com")),
        ]);
        facts.extend(map(extra));
        facts
    }

    fn compile_with(params: &[(&str, RawValue)], facts: &[(&str, RawValue)]) -> Compiled {
        compile("nginx", &map(params), &node_facts(facts), &FqdnRenderer).unwrap()
    }

    fn enable(graph: &ResourceGraph, kind: ResourceKind, id: &str) -> Option<bool> {
        graph.get(kind, id).and_then(|d| d.enable())
    }

    fn ensure<'a>(graph: &'a ResourceGraph, kind: ResourceKind, id: &str) -> Option<&'a str> {
        graph.get(kind, id).and_then(|d| d.ensure())
    }

    fn text<'a>(graph: &'a ResourceGraph, kind: ResourceKind, id: &str, key: &str) -> Option<&'a str> {
        graph
            .get(kind, id)
            .and_then(|d| d.attr(key))
            .and_then(AttrValue::as_text)
    }

    #[test]
    fn test_standard_installation() {
        let graph = compile_with(&[("port", RawValue::from("42"))], &[]).graph;
        assert_eq!(graph.state, LifecycleState::Installed);
        assert_eq!(ensure(&graph, ResourceKind::Package, "nginx"), Some("present"));
        assert_eq!(ensure(&graph, ResourceKind::Service, "nginx"), Some("running"));
        assert_eq!(enable(&graph, ResourceKind::Service, "nginx"), Some(true));
        assert_eq!(ensure(&graph, ResourceKind::File, "nginx.conf"), Some("present"));
        assert_eq!(graph.of_kind(ResourceKind::Monitor).count(), 0);
        assert_eq!(graph.of_kind(ResourceKind::Firewall).count(), 0);
        assert_eq!(graph.of_kind(ResourceKind::Integration).count(), 0);
    }

    #[test]
    fn test_installation_with_monitoring_and_firewalling() {
        let graph = compile_with(
            &[
                ("monitor", RawValue::Bool(true)),
                ("firewall", RawValue::Bool(true)),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(enable(&graph, ResourceKind::Monitor, "nginx_process"), Some(true));
        assert_eq!(enable(&graph, ResourceKind::Firewall, "nginx_tcp_42"), Some(true));
        assert_eq!(
            text(&graph, ResourceKind::Monitor, "nginx_process", "target"),
            Some("10.42.42.42")
        );
    }

    #[test]
    fn test_decommissioning_absent() {
        let graph = compile_with(
            &[
                ("absent", RawValue::Bool(true)),
                ("monitor", RawValue::Bool(true)),
                ("firewall", RawValue::Bool(true)),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(ensure(&graph, ResourceKind::Package, "nginx"), Some("absent"));
        assert_eq!(ensure(&graph, ResourceKind::Service, "nginx"), Some("stopped"));
        assert_eq!(enable(&graph, ResourceKind::Service, "nginx"), Some(false));
        assert_eq!(ensure(&graph, ResourceKind::File, "nginx.conf"), Some("absent"));
        assert_eq!(enable(&graph, ResourceKind::Monitor, "nginx_process"), Some(false));
        assert_eq!(enable(&graph, ResourceKind::Firewall, "nginx_tcp_42"), Some(false));
        assert!(
            graph
                .of_kind(ResourceKind::Package)
                .chain(graph.of_kind(ResourceKind::File))
                .all(|d| !d.is_present())
        );
    }

    #[test]
    fn test_decommissioning_disable() {
        let graph = compile_with(
            &[
                ("disable", RawValue::Bool(true)),
                ("monitor", RawValue::Bool(true)),
                ("firewall", RawValue::Bool(true)),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(ensure(&graph, ResourceKind::Package, "nginx"), Some("present"));
        assert_eq!(ensure(&graph, ResourceKind::Service, "nginx"), Some("stopped"));
        assert_eq!(enable(&graph, ResourceKind::Service, "nginx"), Some(false));
        assert_eq!(ensure(&graph, ResourceKind::File, "nginx.conf"), Some("present"));
        assert_eq!(enable(&graph, ResourceKind::Monitor, "nginx_process"), Some(false));
        assert_eq!(enable(&graph, ResourceKind::Firewall, "nginx_tcp_42"), Some(false));
    }

    #[test]
    fn test_decommissioning_disableboot() {
        let graph = compile_with(
            &[
                ("disableboot", RawValue::Bool(true)),
                ("monitor", RawValue::Bool(true)),
                ("firewall", RawValue::Bool(true)),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(ensure(&graph, ResourceKind::Package, "nginx"), Some("present"));
        assert_eq!(ensure(&graph, ResourceKind::Service, "nginx"), None);
        assert_eq!(enable(&graph, ResourceKind::Service, "nginx"), Some(false));
        assert_eq!(ensure(&graph, ResourceKind::File, "nginx.conf"), Some("present"));
        assert_eq!(enable(&graph, ResourceKind::Monitor, "nginx_process"), Some(false));
        assert_eq!(enable(&graph, ResourceKind::Firewall, "nginx_tcp_42"), Some(true));
    }

    #[test]
    fn test_installed_never_stops_service() {
        for params in [
            vec![],
            vec![("monitor", RawValue::Bool(true))],
            vec![("service_autorestart", RawValue::Bool(false))],
        ] {
            let graph = compile_with(&params, &[]).graph;
            assert_eq!(graph.state, LifecycleState::Installed);
            assert_ne!(ensure(&graph, ResourceKind::Service, "nginx"), Some("stopped"));
        }
    }

    #[test]
    fn test_template_customization() {
        let mut options = BTreeMap::new();
        options.insert("opt_a".to_string(), RawValue::from("value_a"));
        let graph = compile_with(
            &[
                ("template", RawValue::from("nginx/spec.erb")),
                ("options", RawValue::Map(options)),
            ],
            &[],
        )
        .graph;
        let content = text(&graph, ResourceKind::File, "nginx.conf", "content").unwrap();
        assert!(content.contains("fqdn: rspec.example42.com"));
        assert!(content.contains("value_a"));
    }

    #[test]
    fn test_autorestart_by_default() {
        let graph = compile_with(&[], &[]).graph;
        let file = graph.get(ResourceKind::File, "nginx.conf").unwrap();
        assert_eq!(
            file.notifies.as_ref().map(ToString::to_string).as_deref(),
            Some("Service[nginx]")
        );
    }

    #[test]
    fn test_no_autorestart() {
        let graph = compile_with(&[("service_autorestart", RawValue::from("no"))], &[]).graph;
        assert!(graph.get(ResourceKind::File, "nginx.conf").unwrap().notifies.is_none());
    }

    #[test]
    fn test_helper_integration() {
        let graph = compile_with(
            &[
                ("puppi", RawValue::Bool(true)),
                ("puppi_helper", RawValue::from("myhelper")),
            ],
            &[],
        )
        .graph;
        assert_eq!(
            text(&graph, ResourceKind::Integration, "nginx", "helper"),
            Some("myhelper")
        );
    }

    #[test]
    fn test_monitoring_and_firewall_tools() {
        let graph = compile_with(
            &[
                ("monitor", RawValue::Bool(true)),
                ("monitor_tool", RawValue::from("puppi")),
                ("firewall", RawValue::Bool(true)),
                ("firewall_tool", RawValue::from("iptables")),
                ("protocol", RawValue::from("tcp")),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(
            text(&graph, ResourceKind::Monitor, "nginx_process", "tool"),
            Some("puppi")
        );
        assert_eq!(
            text(&graph, ResourceKind::Firewall, "nginx_tcp_42", "tool"),
            Some("iptables")
        );
    }

    #[test]
    fn test_string_flag_values() {
        let graph = compile_with(
            &[
                ("monitor", RawValue::from("yes")),
                ("monitor_tool", RawValue::from("puppi")),
                ("firewall", RawValue::from("yes")),
                ("firewall_tool", RawValue::from("iptables")),
                ("puppi", RawValue::from("yes")),
                ("port", RawValue::from("42")),
            ],
            &[],
        )
        .graph;
        assert_eq!(
            text(&graph, ResourceKind::Monitor, "nginx_process", "tool"),
            Some("puppi")
        );
        assert_eq!(
            text(&graph, ResourceKind::Firewall, "nginx_tcp_42", "tool"),
            Some("iptables")
        );
        assert_eq!(ensure(&graph, ResourceKind::Integration, "nginx"), Some("present"));
    }

    #[test]
    fn test_top_scope_variable() {
        let compiled = compile_with(
            &[("port", RawValue::from("42"))],
            &[("monitor", RawValue::Bool(true))],
        );
        assert_eq!(
            enable(&compiled.graph, ResourceKind::Monitor, "nginx_process"),
            Some(true)
        );
    }

    #[test]
    fn test_module_scope_variable() {
        let compiled = compile_with(
            &[("port", RawValue::from("42"))],
            &[("nginx_monitor", RawValue::Bool(true))],
        );
        assert_eq!(
            enable(&compiled.graph, ResourceKind::Monitor, "nginx_process"),
            Some(true)
        );
    }

    #[test]
    fn test_module_scope_over_top_scope() {
        let compiled = compile_with(
            &[("port", RawValue::from("42"))],
            &[
                ("monitor", RawValue::Bool(false)),
                ("nginx_monitor", RawValue::Bool(true)),
            ],
        );
        assert_eq!(compiled.config.monitor, TriState::True);
        assert_eq!(
            enable(&compiled.graph, ResourceKind::Monitor, "nginx_process"),
            Some(true)
        );
    }

    #[test]
    fn test_passed_over_top_scope() {
        let compiled = compile_with(
            &[
                ("monitor", RawValue::Bool(true)),
                ("firewall", RawValue::Bool(true)),
                ("port", RawValue::from("42")),
            ],
            &[("monitor", RawValue::Bool(false))],
        );
        assert_eq!(
            enable(&compiled.graph, ResourceKind::Monitor, "nginx_process"),
            Some(true)
        );
    }

    #[test]
    fn test_compile_is_idempotent() {
        let params = [
            ("monitor", RawValue::Bool(true)),
            ("firewall", RawValue::Bool(true)),
            ("source_dir", RawValue::from("puppet://modules/nginx/dir")),
        ];
        let first = compile_with(&params, &[]).graph;
        let second = compile_with(&params, &[]).graph;
        assert_eq!(first, second);
        assert_eq!(first.edges(), second.edges());
    }

    #[test]
    fn test_invalid_value_emits_no_graph() {
        let result = compile(
            "nginx",
            &map(&[("absent", RawValue::from("perhaps"))]),
            &NoFacts,
            &FqdnRenderer,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_many_preserves_order() {
        let requests: Vec<NodeRequest> = (0..6)
            .map(|i| NodeRequest {
                name: format!("node{i}"),
                module: "nginx".to_string(),
                params: map(&[("port", RawValue::Int(8000 + i))]),
                facts: node_facts(&[]),
            })
            .chain(std::iter::once(NodeRequest {
                name: "broken".to_string(),
                module: "nginx".to_string(),
                params: map(&[("monitor", RawValue::from("sometimes"))]),
                facts: BTreeMap::new(),
            }))
            .collect();

        let results = compile_many(&requests, &FqdnRenderer, 4).unwrap();
        assert_eq!(results.len(), 7);
        for (i, result) in results.iter().take(6).enumerate() {
            let compiled = result.as_ref().unwrap();
            assert_eq!(compiled.config.port, format!("{}", 8000 + i));
        }
        assert!(results[6].is_err());

        let sequential = compile_many(&requests, &FqdnRenderer, 1).unwrap();
        assert_eq!(sequential.len(), 7);
    }

    struct FixedRenderer(&'static str);

    impl TemplateRenderer for FixedRenderer {
        fn render(&self, _template: &str, _vars: &TemplateVars) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_compile_jobs_use_their_own_renderer() {
        let request = NodeRequest {
            name: "node".to_string(),
            module: "nginx".to_string(),
            params: map(&[("template", RawValue::from("nginx/main.conf"))]),
            facts: node_facts(&[]),
        };
        let first = FixedRenderer("node A template");
        let second = FixedRenderer("node B template");
        let jobs = [NodeJob::new(&request, &first), NodeJob::new(&request, &second)];

        for threads in [1, 2] {
            let results = compile_jobs(&jobs, threads).unwrap();
            let contents: Vec<_> = results
                .iter()
                .map(|r| {
                    let graph = &r.as_ref().unwrap().graph;
                    text(graph, ResourceKind::File, "nginx.conf", "content").map(str::to_string)
                })
                .collect();
            assert_eq!(
                contents,
                vec![
                    Some("node A template".to_string()),
                    Some("node B template".to_string())
                ]
            );
        }
    }

    #[test]
    fn test_diff_reports_my_class_change() {
        let before = compile_with(&[], &[]).graph;
        let after = compile_with(&[("my_class", RawValue::from("nginx::site"))], &[]).graph;

        let diffs = crate::diff::compute_diffs(&before, &after);
        assert!(diffs.is_empty());

        let includes = crate::diff::IncludeChanges::between(&before, &after);
        let summary = crate::diff::DiffSummary::from_diffs(&diffs).with_includes(&includes);
        assert_eq!(includes.added, ["nginx::site".to_string()]);
        assert!(summary.has_changes());
    }
}
