// Copyright (c) 2025 - Cowboy AI, Inc.

//! Synthesis - ResourceGraph → Template → Cloud Assembly
//!
//! Synthesis is split the same way as every other effectful path in this
//! crate: a pure transformation that produces data, and a writer that
//! performs the I/O.
//!
//! ```text
//! ResourceGraph ──synthesize()──> Template ──CloudAssembly::write()──> cdk.out/
//!   (pure)                         (pure)            (I/O)              ├── <Stack>.template.json
//!                                                                       └── manifest.json
//! ```
//!
//! # Determinism
//!
//! Templates are built from ordered maps only; identical graphs always
//! synthesize to byte-identical JSON. The only non-deterministic value, the
//! creation timestamp, lives in the assembly manifest.

pub mod assembly;
pub mod template;

pub use assembly::{AssemblyManifest, CloudAssembly, StackArtifact};
pub use template::{Template, TemplateExport, TemplateOutput, TemplateParameter, TemplateResource};

use tracing::info;

use crate::errors::SynthesisResult;
use crate::graph::ResourceGraph;

/// Synthesize a validated graph into a template
pub fn synthesize(graph: &ResourceGraph) -> SynthesisResult<Template> {
    graph.validate()?;
    let template = Template::from_graph(graph);

    info!(
        stack = %graph.stack_name(),
        resources = template.resources.len(),
        parameters = template.parameters.len(),
        outputs = template.outputs.len(),
        "Synthesized template"
    );

    Ok(template)
}

/// Synthesize straight to pretty-printed JSON
pub fn synthesize_json(graph: &ResourceGraph) -> SynthesisResult<String> {
    synthesize(graph)?.to_json_pretty()
}
