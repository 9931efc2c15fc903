// Copyright (c) 2025 - Cowboy AI, Inc.
//! CloudFormation Template Model
//!
//! Pure data mirroring the template document. Built from a graph with
//! [`Template::from_graph`]; never touches the filesystem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::SynthesisResult;
use crate::graph::{Descriptor, OutputValue, Parameter, ResourceGraph};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Metadata key recording the construct path of a resource
pub const PATH_METADATA_KEY: &str = "cim:path";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Parameters", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, TemplateParameter>,

    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, TemplateResource>,

    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,

    #[serde(rename = "Default")]
    pub default: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,

    #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,

    #[serde(rename = "Metadata", default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOutput {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Value")]
    pub value: Value,

    #[serde(rename = "Export", default, skip_serializing_if = "Option::is_none")]
    pub export: Option<TemplateExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateExport {
    #[serde(rename = "Name")]
    pub name: String,
}

impl From<&Parameter> for TemplateParameter {
    fn from(parameter: &Parameter) -> Self {
        Self {
            parameter_type: parameter.parameter_type.clone(),
            default: parameter.default.clone(),
            description: parameter.description.clone(),
        }
    }
}

impl From<&Descriptor> for TemplateResource {
    fn from(descriptor: &Descriptor) -> Self {
        let policy = descriptor
            .removal_policy
            .map(|p| p.deletion_policy().to_string());

        let mut metadata = Map::new();
        metadata.insert(
            PATH_METADATA_KEY.to_string(),
            Value::String(descriptor.path.clone()),
        );

        Self {
            resource_type: descriptor.kind.cfn_type().to_string(),
            properties: descriptor
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), value.to_cfn()))
                .collect(),
            depends_on: descriptor
                .depends_on
                .iter()
                .map(|id| id.to_string())
                .collect(),
            deletion_policy: policy.clone(),
            update_replace_policy: policy,
            metadata,
        }
    }
}

impl From<&OutputValue> for TemplateOutput {
    fn from(output: &OutputValue) -> Self {
        Self {
            description: output.description.clone(),
            value: output.value.to_cfn(),
            export: output
                .export_name
                .as_ref()
                .map(|name| TemplateExport { name: name.clone() }),
        }
    }
}

impl Template {
    /// Template for a graph; the graph is assumed valid
    pub fn from_graph(graph: &ResourceGraph) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: graph.description().map(str::to_string),
            parameters: graph
                .parameters()
                .iter()
                .map(|p| (p.logical_id.to_string(), p.into()))
                .collect(),
            resources: graph
                .resources()
                .iter()
                .map(|d| (d.logical_id.to_string(), d.into()))
                .collect(),
            outputs: graph
                .outputs()
                .iter()
                .map(|o| (o.logical_id.to_string(), o.into()))
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> SynthesisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> SynthesisResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Logical ids of every resource of a CloudFormation type
    pub fn resources_of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
            .map(|(id, _)| id.as_str())
    }
}
