//! # Declarative
//!
//! A layered configuration compiler for service modules.
//!
//! Given explicitly passed parameters and a set of node facts, this crate
//! resolves every option through a fixed precedence chain, classifies the
//! service into a lifecycle state, and emits a desired-state resource graph
//! for an external enactment engine.
//!
//! ## Core Concepts
//!
//! - **Layer**: Where a value came from (passed, module scope, top scope, default)
//! - **ResolvedConfig**: The single effective value of every option
//! - **LifecycleState**: Installed, Absent, Disabled or DisabledAtBoot
//! - **ResourceGraph**: Ordered declarations plus their notify edges
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{compile, NoRenderer, RawValue, ResourceKind};
//! use std::collections::BTreeMap;
//!
//! let mut params = BTreeMap::new();
//! params.insert("port".to_string(), RawValue::from("42"));
//! params.insert("firewall".to_string(), RawValue::from("yes"));
//!
//! let mut facts = BTreeMap::new();
//! facts.insert("ipaddress".to_string(), RawValue::from("10.42.42.42"));
//!
//! let compiled = compile("nginx", &params, &facts, &NoRenderer)?;
//! assert!(compiled.graph.get(ResourceKind::Firewall, "nginx_tcp_42").is_some());
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`FactProvider`]: Supplies node facts and scoped variables
//! - [`TemplateRenderer`]: Turns a template reference into file content
//!
//! This keeps resolution free of ambient global state and lets callers
//! plug in any template engine.

pub mod builder;
pub mod compile;
pub mod context;
pub mod diff;
pub mod error;
pub mod graph;
pub mod integrations;
pub mod lifecycle;
pub mod normalize;
pub mod options;
pub mod resolver;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use builder::{FileContent, GraphBuilder};
pub use compile::{
    Compiled, NodeJob, NodeRequest, compile, compile_jobs, compile_many, compile_request,
};
pub use context::{FactProvider, NoFacts, NoRenderer, TemplateRenderer, TemplateVars};
pub use diff::{
    ChangeKind, DiffSummary, IncludeChanges, ResourceDiff, compute_diffs, group_by_kind,
};
pub use error::{Error, ErrorCategory, Result};
pub use graph::{Edge, ResourceGraph};
pub use lifecycle::LifecycleState;
pub use options::{OPTIONS, OptionKind, OptionSpec};
pub use resolver::{ResolvedConfig, ResolvedEntry, Resolver, Setting, resolve};
pub use resource::{ResourceDecl, ResourceKind, ResourceRef};
pub use types::{AttrValue, Ensure, Layer, RawValue, TriState};
