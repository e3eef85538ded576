//! Integration emitters - monitoring, firewall and helper integration
//!
//! Each emitter reads only the resolved configuration and the lifecycle
//! state, and emits nothing unless its enabling flag resolved true.

use crate::lifecycle::LifecycleState;
use crate::resolver::ResolvedConfig;
use crate::resource::{ResourceDecl, ResourceKind};

type Emitter = fn(&ResolvedConfig, LifecycleState) -> Option<ResourceDecl>;

/// Monitor declaration for the service process
pub fn monitor(config: &ResolvedConfig, state: LifecycleState) -> Option<ResourceDecl> {
    if !config.monitor.is_true() {
        return None;
    }

    Some(
        ResourceDecl::new(ResourceKind::Monitor, format!("{}_process", config.module))
            .with_attr("process", &config.process)
            .with_attr("service", &config.service)
            .with_optional("target", config.monitor_target.as_ref())
            .with_optional("tool", config.monitor_tool.as_ref())
            .with_attr("enable", state.monitor_enabled()),
    )
}

/// Firewall rule keyed by `{service}_{protocol}_{port}`
pub fn firewall(config: &ResolvedConfig, state: LifecycleState) -> Option<ResourceDecl> {
    if !config.firewall.is_true() {
        return None;
    }

    let id = format!("{}_{}_{}", config.service, config.protocol, config.port);
    Some(
        ResourceDecl::new(ResourceKind::Firewall, id)
            .with_optional("source", config.firewall_src.as_ref())
            .with_optional("destination", config.firewall_dst.as_ref())
            .with_attr("protocol", &config.protocol)
            .with_attr("port", &config.port)
            .with_attr("action", "allow")
            .with_attr("direction", "input")
            .with_optional("tool", config.firewall_tool.as_ref())
            .with_attr("enable", state.firewall_enabled()),
    )
}

/// Helper integration descriptor keyed by the service name
pub fn helper(config: &ResolvedConfig, state: LifecycleState) -> Option<ResourceDecl> {
    if !config.puppi.is_true() {
        return None;
    }

    Some(
        ResourceDecl::new(ResourceKind::Integration, config.service.clone())
            .with_attr("ensure", state.integration_ensure())
            .with_optional("helper", config.puppi_helper.as_ref()),
    )
}

/// Run every emitter, in a fixed order
pub fn emit_all(config: &ResolvedConfig, state: LifecycleState) -> Vec<ResourceDecl> {
    let emitters: [Emitter; 3] = [monitor, firewall, helper];
    emitters
        .iter()
        .filter_map(|emit| emit(config, state))
        .collect()
}
