// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Composers
//!
//! Each composer turns a small set of named inputs into a [`ResourceGraph`]
//! in a single pass. Composition has no side effects; lookups of external
//! objects go through a [`LookupProvider`](crate::lookup::LookupProvider).
//!
//! - [`ApplicationStack`] - network, compute, load balancer, DNS and, with
//!   [`NetworkMode::OwnedNetwork`], a database and its credentials
//! - [`WebsiteBucketStack`] - static website bucket and its URL export
//!
//! [`ResourceGraph`]: crate::graph::ResourceGraph

pub mod application;
pub mod website;

pub use application::{ApplicationStack, ApplicationStackProps, ContainerImage};
pub use website::{WebsiteBucketStack, WebsiteStackProps};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SynthesisError;

/// Target account and region, passed through to the provisioning engine
///
/// Either may be unset, in which case the template stays environment
/// agnostic and the engine decides at deploy time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl StackEnvironment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            region: Some(region.into()),
        }
    }

    pub fn is_agnostic(&self) -> bool {
        self.account.is_none() || self.region.is_none()
    }
}

impl fmt::Display for StackEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

/// How the application stack obtains its network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// Create a VPC with public and private subnets, a database and its secret
    #[default]
    OwnedNetwork,
    /// Look up the account's default VPC; no database, static bootstrap
    SharedNetwork,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnedNetwork => "owned",
            Self::SharedNetwork => "shared",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owned" | "owned_network" | "owned-network" => Ok(Self::OwnedNetwork),
            "shared" | "shared_network" | "shared-network" | "default" => Ok(Self::SharedNetwork),
            other => Err(SynthesisError::InvalidConfiguration(format!(
                "unknown network mode '{}' (expected 'owned' or 'shared')",
                other
            ))),
        }
    }
}
