// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Assembly Writer
//!
//! The assembly is the handoff to the provisioning engine: one template file
//! per stack plus a manifest naming each stack's environment and template.
//! [`CloudAssembly::synthesize`] is pure; [`CloudAssembly::write_to`] is the
//! only place in the crate that touches the filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::ResourceGraph;
use crate::stacks::StackEnvironment;

use super::{synthesize, Template};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: &str = "1.0";
pub const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

/// Manifest entry of one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackArtifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// `aws://<account>/<region>`
    pub environment: String,
    pub template_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Assembly manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub artifacts: BTreeMap<String, StackArtifact>,
}

/// A synthesized stack ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub environment: StackEnvironment,
    pub template: Template,
}

impl SynthesizedStack {
    pub fn template_file(&self) -> String {
        template_file_name(&self.stack_name)
    }
}

/// Synthesized stacks of one application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudAssembly {
    stacks: Vec<SynthesizedStack>,
}

impl CloudAssembly {
    /// Synthesize every stack; stack names must be unique
    pub fn synthesize(stacks: &[ResourceGraph]) -> SynthesisResult<Self> {
        let mut assembly = Self::default();

        for graph in stacks {
            if assembly
                .stacks
                .iter()
                .any(|s| s.stack_name == graph.stack_name())
            {
                return Err(SynthesisError::InvalidConfiguration(format!(
                    "stack name '{}' used twice in one assembly",
                    graph.stack_name()
                )));
            }

            assembly.stacks.push(SynthesizedStack {
                stack_name: graph.stack_name().to_string(),
                environment: graph.environment().clone(),
                template: synthesize(graph)?,
            });
        }

        Ok(assembly)
    }

    pub fn stacks(&self) -> &[SynthesizedStack] {
        &self.stacks
    }

    /// Manifest describing the assembly as of `created_at`
    pub fn manifest(&self, created_at: DateTime<Utc>) -> AssemblyManifest {
        AssemblyManifest {
            version: MANIFEST_VERSION.to_string(),
            created_at,
            artifacts: self
                .stacks
                .iter()
                .map(|stack| {
                    (
                        stack.stack_name.clone(),
                        StackArtifact {
                            artifact_type: STACK_ARTIFACT_TYPE.to_string(),
                            environment: stack.environment.to_string(),
                            template_file: stack.template_file(),
                            description: stack.template.description.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Write templates and manifest into `out_dir`, creating it if needed
    pub fn write_to(&self, out_dir: &Path) -> SynthesisResult<AssemblyManifest> {
        fs::create_dir_all(out_dir)
            .map_err(|e| SynthesisError::Io(format!("{}: {}", out_dir.display(), e)))?;

        for stack in &self.stacks {
            let path = out_dir.join(stack.template_file());
            fs::write(&path, stack.template.to_json_pretty()?)
                .map_err(|e| SynthesisError::Io(format!("{}: {}", path.display(), e)))?;
            debug!(stack = %stack.stack_name, path = %path.display(), "Wrote template");
        }

        let manifest = self.manifest(Utc::now());
        let path = out_dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .map_err(|e| SynthesisError::Io(format!("{}: {}", path.display(), e)))?;

        info!(
            out_dir = %out_dir.display(),
            stacks = self.stacks.len(),
            "Wrote cloud assembly"
        );

        Ok(manifest)
    }

    /// Synthesize `stacks` and write them into `out_dir`
    pub fn write(out_dir: impl AsRef<Path>, stacks: &[ResourceGraph]) -> SynthesisResult<AssemblyManifest> {
        Self::synthesize(stacks)?.write_to(out_dir.as_ref())
    }
}

/// File name of a stack's template inside an assembly
pub fn template_file_name(stack_name: &str) -> String {
    format!("{}.template.json", stack_name)
}

/// Template path of a stack inside an assembly directory
pub fn template_path(out_dir: &Path, stack_name: &str) -> PathBuf {
    out_dir.join(template_file_name(stack_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;
    use crate::graph::Descriptor;

    fn graph(name: &str) -> ResourceGraph {
        let mut graph = ResourceGraph::new(name, StackEnvironment::new("111111111111", "eu-north-1"));
        graph
            .add(Descriptor::new("Bucket", ResourceKind::Bucket).unwrap())
            .unwrap();
        graph
    }

    #[test]
    fn test_manifest_is_pure() {
        let assembly = CloudAssembly::synthesize(&[graph("One"), graph("Two")]).unwrap();
        let created_at = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let manifest = assembly.manifest(created_at);

        assert_eq!(manifest.artifacts.len(), 2);
        let one = &manifest.artifacts["One"];
        assert_eq!(one.template_file, "One.template.json");
        assert_eq!(one.environment, "aws://111111111111/eu-north-1");
        assert_eq!(one.artifact_type, STACK_ARTIFACT_TYPE);
        assert_eq!(manifest, assembly.manifest(created_at));
    }

    #[test]
    fn test_duplicate_stack_names_rejected() {
        assert!(matches!(
            CloudAssembly::synthesize(&[graph("Same"), graph("Same")]),
            Err(SynthesisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        let manifest = CloudAssembly::write(&out, &[graph("Stack")]).unwrap();

        assert!(template_path(&out, "Stack").exists());
        assert_eq!(
            template_path(&out, "Stack"),
            out.join(&manifest.artifacts["Stack"].template_file)
        );
        let written: AssemblyManifest =
            serde_json::from_str(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(written, manifest);
    }
}
