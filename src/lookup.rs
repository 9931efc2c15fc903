// Copyright (c) 2025 - Cowboy AI, Inc.
//! External Object Lookups
//!
//! Some stacks reference objects they do not own: the account's default VPC,
//! an existing hosted zone. Composition never calls the cloud provider;
//! answers come from a context document that the provisioning toolchain
//! keeps (and refreshes) next to the project. A lookup must match exactly
//! one object, otherwise composition fails before anything is synthesized.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::domain::{CidrBlock, SubnetType};
use crate::stacks::StackEnvironment;

/// Lookup failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("No {kind} matches {filter}")]
    NotFound { kind: String, filter: String },

    #[error("{count} {kind}s match {filter}, expected exactly one")]
    Ambiguous {
        kind: String,
        filter: String,
        count: usize,
    },

    #[error("Lookup context unavailable: {0}")]
    Context(String),
}

/// A subnet of a looked-up network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetInfo {
    pub subnet_id: String,
    pub availability_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
    pub subnet_type: SubnetType,
}

/// A looked-up network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcLookupResult {
    pub vpc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<CidrBlock>,
    #[serde(default)]
    pub subnets: Vec<SubnetInfo>,
}

impl VpcLookupResult {
    pub fn subnets_of_type(&self, subnet_type: SubnetType) -> impl Iterator<Item = &SubnetInfo> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }
}

/// A looked-up hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneInfo {
    pub zone_id: String,
    pub zone_name: String,
}

/// Source of answers for external object lookups
pub trait LookupProvider {
    /// The default VPC of the environment's account and region
    fn default_vpc(&self, environment: &StackEnvironment) -> Result<VpcLookupResult, LookupError>;

    /// The public hosted zone for `domain`
    fn hosted_zone(&self, domain: &str) -> Result<HostedZoneInfo, LookupError>;
}

/// VPC entry of a context document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcContextEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(flatten)]
    pub vpc: VpcLookupResult,
}

/// Hosted zone entry of a context document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneContextEntry {
    #[serde(default)]
    pub private_zone: bool,
    #[serde(flatten)]
    pub zone: HostedZoneInfo,
}

/// Cached lookup answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    #[serde(default)]
    pub vpcs: Vec<VpcContextEntry>,
    #[serde(default)]
    pub hosted_zones: Vec<HostedZoneContextEntry>,
}

/// Lookup provider backed by a [`ContextDocument`]
#[derive(Debug, Clone, Default)]
pub struct ContextLookup {
    document: ContextDocument,
}

impl ContextLookup {
    pub fn new(document: ContextDocument) -> Self {
        Self { document }
    }

    /// A provider with no cached answers; every lookup fails
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, LookupError> {
        let document = serde_json::from_str(json)
            .map_err(|e| LookupError::Context(format!("invalid context document: {}", e)))?;
        Ok(Self::new(document))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LookupError::Context(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded lookup context");
        Self::from_json(&json)
    }

    pub fn document(&self) -> &ContextDocument {
        &self.document
    }
}

fn exactly_one<T: Clone>(kind: &str, filter: String, matches: Vec<&T>) -> Result<T, LookupError> {
    match matches.as_slice() {
        [] => Err(LookupError::NotFound {
            kind: kind.to_string(),
            filter,
        }),
        [only] => Ok((*only).clone()),
        many => Err(LookupError::Ambiguous {
            kind: kind.to_string(),
            filter,
            count: many.len(),
        }),
    }
}

impl LookupProvider for ContextLookup {
    fn default_vpc(&self, environment: &StackEnvironment) -> Result<VpcLookupResult, LookupError> {
        let scoped = |entry: &Option<String>, wanted: &Option<String>| match (entry, wanted) {
            (Some(entry), Some(wanted)) => entry == wanted,
            _ => true,
        };

        let matches: Vec<&VpcLookupResult> = self
            .document
            .vpcs
            .iter()
            .filter(|e| e.is_default)
            .filter(|e| scoped(&e.account, &environment.account))
            .filter(|e| scoped(&e.region, &environment.region))
            .map(|e| &e.vpc)
            .collect();

        let result = exactly_one("default VPC", format!("isDefault=true in {}", environment), matches)?;
        debug!(vpc_id = %result.vpc_id, "Resolved default VPC");
        Ok(result)
    }

    fn hosted_zone(&self, domain: &str) -> Result<HostedZoneInfo, LookupError> {
        let wanted = domain.trim_end_matches('.');
        let matches: Vec<&HostedZoneInfo> = self
            .document
            .hosted_zones
            .iter()
            .filter(|e| !e.private_zone && e.zone.zone_name.trim_end_matches('.') == wanted)
            .map(|e| &e.zone)
            .collect();

        let result = exactly_one("hosted zone", format!("domainName={}", wanted), matches)?;
        debug!(zone_id = %result.zone_id, zone_name = %result.zone_name, "Resolved hosted zone");
        Ok(result)
    }
}
