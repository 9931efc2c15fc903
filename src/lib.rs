// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declarative cloud stacks for the Composable Information Machine
//!
//! Stacks are composed as in-memory graphs of resource descriptors, checked
//! for dangling references, and synthesized into CloudFormation templates
//! that an external provisioning engine deploys.
//!
//! ```rust
//! use cim_cloud_stacks::stacks::{WebsiteBucketStack, WebsiteStackProps};
//! use cim_cloud_stacks::domain::GroupName;
//!
//! let props = WebsiteStackProps::new(GroupName::new("team7").unwrap());
//! let graph = WebsiteBucketStack::compose(&props).unwrap();
//! let template = cim_cloud_stacks::synth::synthesize(&graph).unwrap();
//! assert!(template.outputs.contains_key("websiteBucketOutput"));
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod expr;
pub mod graph;
pub mod lookup;
pub mod resources;
pub mod stacks;
pub mod synth;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{SynthesisError, SynthesisResult};
pub use expr::Expr;
pub use graph::{Descriptor, OutputValue, ResourceGraph};
pub use lookup::{ContextLookup, LookupError, LookupProvider};
pub use stacks::{ApplicationStack, NetworkMode, StackEnvironment, WebsiteBucketStack};
