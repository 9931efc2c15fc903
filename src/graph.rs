// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! An ordered, append-only collection of resource descriptors, template
//! parameters and outputs. Insertion order is construction order: a
//! descriptor may only reference ids that are already present, so the graph
//! is acyclic by construction and every placeholder can be resolved by the
//! provisioning engine.
//!
//! # Invariants
//! - Logical ids are unique across parameters and resources
//! - Every reference (properties, explicit dependencies, outputs) points at
//!   an earlier entry
//! - Output names are unique and export names follow provider rules

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::domain::invariants::validate_export_name;
use crate::domain::{NameError, ResourceCategory, ResourceKind};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::Expr;
use crate::stacks::StackEnvironment;

/// Namespace for the stable path hash appended to nested logical ids
const LOGICAL_ID_NAMESPACE: Uuid = Uuid::from_u128(0x4c2b_9d7e_51a3_4f0e_8b6c_0d2e_7a91_c3f5);

/// Path components that never appear in the readable part of a logical id
const HIDDEN_PATH_COMPONENTS: [&str; 2] = ["Resource", "Default"];

/// CloudFormation logical id
///
/// # Invariants
/// - 1 to 255 characters
/// - ASCII alphanumerics only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    pub const MAX_LENGTH: usize = 255;

    /// Length of the hash suffix on nested ids
    const HASH_LENGTH: usize = 8;

    pub fn new(id: impl Into<String>) -> Result<Self, NameError> {
        let id = id.into();

        if id.is_empty() {
            return Err(NameError::Empty);
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                name: id,
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(ch) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(NameError::InvalidCharacter { name: id, ch });
        }

        Ok(Self(id))
    }

    /// Derive a logical id from a construct path such as `MyVpc/PublicSubnet1/Subnet`
    ///
    /// Single-component paths map to the sanitized component as-is; nested
    /// paths get the sanitized readable part plus an 8 hex digit hash of the
    /// full path, so distinct paths never collide.
    pub fn from_path(path: &str) -> Result<Self, NameError> {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();

        if components.len() <= 1 {
            return Self::new(sanitize(path));
        }

        let readable: String = components
            .iter()
            .filter(|c| !HIDDEN_PATH_COMPONENTS.contains(c))
            .map(|c| sanitize(c))
            .collect();
        let readable: String = readable
            .chars()
            .take(Self::MAX_LENGTH - Self::HASH_LENGTH)
            .collect();

        let hash = Uuid::new_v5(&LOGICAL_ID_NAMESPACE, path.as_bytes())
            .simple()
            .to_string()
            .to_uppercase();

        Self::new(format!("{}{}", readable, &hash[..Self::HASH_LENGTH]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sanitize(component: &str) -> String {
    component.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happens to a resource when it leaves the stack or the stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Delete the physical resource
    Destroy,
    /// Keep the physical resource, orphaned from the stack
    Retain,
    /// Take a final snapshot, then delete (databases)
    Snapshot,
}

impl RemovalPolicy {
    /// Value of the `DeletionPolicy` and `UpdateReplacePolicy` attributes
    pub fn deletion_policy(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub logical_id: LogicalId,
    /// Construct path the logical id was derived from
    pub path: String,
    pub kind: ResourceKind,
    pub properties: BTreeMap<String, Expr>,
    /// Ordering dependencies not expressed through property references
    pub depends_on: Vec<LogicalId>,
    pub removal_policy: Option<RemovalPolicy>,
}

impl Descriptor {
    pub fn new(path: impl Into<String>, kind: ResourceKind) -> Result<Self, NameError> {
        let path = path.into();
        Ok(Self {
            logical_id: LogicalId::from_path(&path)?,
            path,
            kind,
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
            removal_policy: None,
        })
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the property only when a value is present
    pub fn optional_property(self, key: impl Into<String>, value: Option<Expr>) -> Self {
        match value {
            Some(value) => self.property(key, value),
            None => self,
        }
    }

    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        if !self.depends_on.contains(id) {
            self.depends_on.push(id.clone());
        }
        self
    }

    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.properties.get(key)
    }

    /// Every id this descriptor requires to exist before it
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut refs: Vec<&LogicalId> = Vec::new();
        for value in self.properties.values() {
            for id in value.references() {
                if !refs.contains(&id) {
                    refs.push(id);
                }
            }
        }
        for id in &self.depends_on {
            if !refs.contains(&id) {
                refs.push(id);
            }
        }
        refs
    }
}

/// A template parameter resolved by the provisioning engine at deploy time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub logical_id: LogicalId,
    pub parameter_type: String,
    pub default: String,
    pub description: Option<String>,
}

/// An exported stack value for downstream consumption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputValue {
    /// Name as declared, e.g. `database-endpoint`
    pub name: String,
    pub logical_id: LogicalId,
    pub value: Expr,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

impl OutputValue {
    pub fn new(name: impl Into<String>, value: Expr) -> Result<Self, NameError> {
        let name = name.into();
        Ok(Self {
            logical_id: LogicalId::new(sanitize(&name))?,
            name,
            value,
            description: None,
            export_name: None,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn export_name(mut self, export_name: impl Into<String>) -> Self {
        self.export_name = Some(export_name.into());
        self
    }
}

/// The declared contents of one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    stack_name: String,
    description: Option<String>,
    environment: StackEnvironment,
    parameters: Vec<Parameter>,
    resources: Vec<Descriptor>,
    outputs: Vec<OutputValue>,
    declared: BTreeSet<LogicalId>,
}

impl ResourceGraph {
    pub fn new(stack_name: impl Into<String>, environment: StackEnvironment) -> Self {
        Self {
            stack_name: stack_name.into(),
            description: None,
            environment,
            parameters: Vec::new(),
            resources: Vec::new(),
            outputs: Vec::new(),
            declared: BTreeSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a resource; every reference must already be declared
    pub fn add(&mut self, descriptor: Descriptor) -> SynthesisResult<LogicalId> {
        if self.declared.contains(&descriptor.logical_id) {
            return Err(SynthesisError::DuplicateLogicalId(
                descriptor.logical_id.to_string(),
            ));
        }

        for reference in descriptor.references() {
            if !self.declared.contains(reference) {
                return Err(SynthesisError::DanglingReference {
                    from: descriptor.logical_id.to_string(),
                    to: reference.to_string(),
                });
            }
        }

        debug!(
            stack = %self.stack_name,
            logical_id = %descriptor.logical_id,
            kind = %descriptor.kind,
            "Declared resource"
        );

        let id = descriptor.logical_id.clone();
        self.declared.insert(id.clone());
        self.resources.push(descriptor);
        Ok(id)
    }

    /// Declare a template parameter
    pub fn add_parameter(&mut self, parameter: Parameter) -> SynthesisResult<LogicalId> {
        if self.declared.contains(&parameter.logical_id) {
            return Err(SynthesisError::DuplicateLogicalId(
                parameter.logical_id.to_string(),
            ));
        }

        debug!(
            stack = %self.stack_name,
            logical_id = %parameter.logical_id,
            parameter_type = %parameter.parameter_type,
            "Declared parameter"
        );

        let id = parameter.logical_id.clone();
        self.declared.insert(id.clone());
        self.parameters.push(parameter);
        Ok(id)
    }

    /// Declare an output; its value may only reference declared ids
    pub fn add_output(&mut self, output: OutputValue) -> SynthesisResult<()> {
        if self
            .outputs
            .iter()
            .any(|o| o.logical_id == output.logical_id)
        {
            return Err(SynthesisError::DuplicateLogicalId(output.logical_id.to_string()));
        }

        if let Some(export) = &output.export_name {
            validate_export_name(export)?;
        }

        for reference in output.value.references() {
            if !self.declared.contains(reference) {
                return Err(SynthesisError::DanglingReference {
                    from: output.name.clone(),
                    to: reference.to_string(),
                });
            }
        }

        debug!(
            stack = %self.stack_name,
            output = %output.name,
            export = ?output.export_name,
            "Declared output"
        );

        self.outputs.push(output);
        Ok(())
    }

    /// Re-check the ordering invariant over the whole graph
    pub fn validate(&self) -> SynthesisResult<()> {
        let mut seen: BTreeSet<&LogicalId> = BTreeSet::new();

        for parameter in &self.parameters {
            if !seen.insert(&parameter.logical_id) {
                return Err(SynthesisError::DuplicateLogicalId(
                    parameter.logical_id.to_string(),
                ));
            }
        }

        for descriptor in &self.resources {
            for reference in descriptor.references() {
                if !seen.contains(reference) {
                    return Err(SynthesisError::DanglingReference {
                        from: descriptor.logical_id.to_string(),
                        to: reference.to_string(),
                    });
                }
            }
            if !seen.insert(&descriptor.logical_id) {
                return Err(SynthesisError::DuplicateLogicalId(
                    descriptor.logical_id.to_string(),
                ));
            }
        }

        for output in &self.outputs {
            for reference in output.value.references() {
                if !seen.contains(reference) {
                    return Err(SynthesisError::DanglingReference {
                        from: output.name.clone(),
                        to: reference.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn environment(&self) -> &StackEnvironment {
        &self.environment
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn resources(&self) -> &[Descriptor] {
        &self.resources
    }

    pub fn outputs(&self) -> &[OutputValue] {
        &self.outputs
    }

    pub fn get(&self, id: &LogicalId) -> Option<&Descriptor> {
        self.resources.iter().find(|d| &d.logical_id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Descriptor> {
        self.resources.iter().find(|d| d.path == path)
    }

    pub fn output(&self, name: &str) -> Option<&OutputValue> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.declared.contains(id)
    }

    /// Construction-order position of a declared resource
    pub fn position(&self, id: &LogicalId) -> Option<usize> {
        self.resources.iter().position(|d| &d.logical_id == id)
    }

    pub fn resources_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Descriptor> {
        self.resources.iter().filter(move |d| d.kind == kind)
    }

    pub fn count_of_kind(&self, kind: ResourceKind) -> usize {
        self.resources_of_kind(kind).count()
    }

    pub fn count_of_category(&self, category: ResourceCategory) -> usize {
        self.resources
            .iter()
            .filter(|d| d.kind.category() == category)
            .count()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
