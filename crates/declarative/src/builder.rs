//! Resource graph builder
//!
//! Turns a lifecycle state and a resolved configuration into the package,
//! service, config file and optional directory declarations, then hands
//! over to the integration emitters.

use crate::context::{FactProvider, TemplateRenderer, TemplateVars};
use crate::error::{Error, Result};
use crate::graph::ResourceGraph;
use crate::integrations;
use crate::lifecycle::LifecycleState;
use crate::resolver::ResolvedConfig;
use crate::resource::{ResourceDecl, ResourceKind, ResourceRef};
use crate::types::{Ensure, Layer};

/// Where the config file's content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Pointer handed to the enactment engine
    Source(String),
    /// Literal content (rendered or inline)
    Inline(String),
}

/// Builds a [`ResourceGraph`] from resolved options
pub struct GraphBuilder<'a> {
    config: &'a ResolvedConfig,
    facts: &'a dyn FactProvider,
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        config: &'a ResolvedConfig,
        facts: &'a dyn FactProvider,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            config,
            facts,
            renderer,
        }
    }

    /// Build the graph for a lifecycle state
    ///
    /// Conflicts and render failures abort before anything is emitted.
    pub fn build(&self, state: LifecycleState) -> Result<ResourceGraph> {
        self.check_version(state)?;
        let content = self.file_content()?;
        let config = self.config;

        let mut graph = ResourceGraph::new(config.module.clone(), state);
        let service = self.service(state);
        let service_ref = service.reference();

        graph.push(self.package(state));
        graph.push(service);
        graph.push(self.config_file(state, content, &service_ref));
        if let Some(dir) = self.config_dir(state, &service_ref) {
            graph.push(dir);
        }
        if let Some(class) = &config.my_class {
            graph.add_include(class.clone());
        }
        for resource in integrations::emit_all(config, state) {
            graph.push(resource);
        }

        log::debug!(
            "built {} declarations for {} ({})",
            graph.len(),
            config.module,
            state
        );
        Ok(graph)
    }

    /// A version that removes the package only fits the absent state
    fn check_version(&self, state: LifecycleState) -> Result<()> {
        let config = self.config;
        if state == LifecycleState::Absent
            || !matches!(Ensure::from_version(&config.version), Ensure::Absent)
        {
            return Ok(());
        }
        Err(Error::InconsistentState {
            option: "version".to_string(),
            conflicts_with: "absent".to_string(),
            layer: config.layer_of("version").unwrap_or(Layer::Default),
            reason: format!(
                "version '{}' removes the package while the service is {state}",
                config.version.trim()
            ),
        })
    }

    fn package(&self, state: LifecycleState) -> ResourceDecl {
        ResourceDecl::new(ResourceKind::Package, self.config.package.clone())
            .with_attr("ensure", state.package_ensure(&self.config.version))
    }

    fn service(&self, state: LifecycleState) -> ResourceDecl {
        ResourceDecl::new(ResourceKind::Service, self.config.service.clone())
            .with_optional("ensure", state.service_ensure())
            .with_attr("enable", state.service_enable())
    }

    fn config_file(
        &self,
        state: LifecycleState,
        content: Option<FileContent>,
        service: &ResourceRef,
    ) -> ResourceDecl {
        let config = self.config;
        let decl = ResourceDecl::new(ResourceKind::File, format!("{}.conf", config.module))
            .with_attr("ensure", state.file_ensure())
            .with_attr("path", &config.config_file)
            .with_attr("mode", &config.config_file_mode)
            .with_attr("owner", &config.config_file_owner)
            .with_attr("group", &config.config_file_group);

        let decl = match content {
            Some(FileContent::Source(source)) => decl.with_attr("source", source),
            Some(FileContent::Inline(text)) => decl.with_attr("content", text),
            None => decl,
        };

        self.finish_file(decl, service)
    }

    fn config_dir(&self, state: LifecycleState, service: &ResourceRef) -> Option<ResourceDecl> {
        let config = self.config;
        let source_dir = config.source_dir.as_ref()?;
        let purge = config.source_dir_purge.is_true();

        let decl = ResourceDecl::new(ResourceKind::File, format!("{}.dir", config.module))
            .with_attr("ensure", state.dir_ensure())
            .with_attr("path", &config.config_dir)
            .with_attr("source", source_dir)
            .with_attr("recurse", true)
            .with_attr("purge", purge)
            .with_attr("force", purge);

        Some(self.finish_file(decl, service))
    }

    /// Attributes shared by every managed file: audit mode and the notify edge
    fn finish_file(&self, decl: ResourceDecl, service: &ResourceRef) -> ResourceDecl {
        let decl = if self.config.audit_only.is_true() {
            decl.with_attr("replace", false).with_attr("audit", "all")
        } else {
            decl.with_attr("replace", true)
        };

        // Only an explicit false suppresses the edge
        if self.config.service_autorestart.is_false() {
            decl
        } else {
            decl.notify(service.clone())
        }
    }

    /// Decide the config file's content origin
    ///
    /// `source` wins over `template`. Inline `content` cannot be combined
    /// with either.
    pub fn file_content(&self) -> Result<Option<FileContent>> {
        let config = self.config;

        if config.content.is_some() {
            let others = [
                ("source", config.source.is_some()),
                ("template", config.template.is_some()),
            ];
            if let Some((other, _)) = others.into_iter().find(|(_, set)| *set) {
                return Err(Error::InconsistentState {
                    option: "content".to_string(),
                    conflicts_with: other.to_string(),
                    layer: config.layer_of("content").unwrap_or(Layer::Default),
                    reason: "file content has a single origin".to_string(),
                });
            }
        }

        if let Some(source) = &config.source {
            return Ok(Some(FileContent::Source(source.clone())));
        }
        if let Some(template) = &config.template {
            let rendered = self.renderer.render(template, &self.template_vars())?;
            return Ok(Some(FileContent::Inline(rendered)));
        }
        Ok(config.content.clone().map(FileContent::Inline))
    }

    /// Variables available to the template renderer
    pub fn template_vars(&self) -> TemplateVars {
        let facts = self
            .facts
            .entries()
            .into_iter()
            .filter_map(|(name, value)| value.as_scalar().map(|v| (name.to_string(), v)))
            .collect();

        TemplateVars {
            fqdn: self.facts.scalar("fqdn").unwrap_or_default(),
            my_class: self.config.my_class.clone(),
            facts,
            settings: self.config.scalars(),
            options: self.config.options.clone(),
        }
    }
}

/// Build a graph in one call
pub fn build(
    state: LifecycleState,
    config: &ResolvedConfig,
    facts: &dyn FactProvider,
    renderer: &dyn TemplateRenderer,
) -> Result<ResourceGraph> {
    GraphBuilder::new(config, facts, renderer).build(state)
}
