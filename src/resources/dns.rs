// Copyright (c) 2025 - Cowboy AI, Inc.
//! DNS Alias Records

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{RecordName, ResourceKind};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, ResourceGraph};
use crate::lookup::LookupProvider;

use super::load_balancer::LoadBalancerHandle;

/// How a hosted zone is identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum HostedZoneSource {
    /// Known id and name; no lookup
    Attributes { zone_id: String, zone_name: String },
    /// Public zone resolved by domain name
    Lookup { domain_name: String },
}

impl HostedZoneSource {
    pub fn resolve(&self, lookups: &dyn LookupProvider) -> SynthesisResult<HostedZoneRef> {
        let zone = match self {
            Self::Attributes { zone_id, zone_name } => HostedZoneRef {
                zone_id: zone_id.clone(),
                zone_name: zone_name.trim_end_matches('.').to_string(),
            },
            Self::Lookup { domain_name } => {
                let found = lookups.hosted_zone(domain_name)?;
                HostedZoneRef {
                    zone_id: found.zone_id,
                    zone_name: found.zone_name.trim_end_matches('.').to_string(),
                }
            }
        };

        if zone.zone_id.is_empty() || zone.zone_name.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "hosted zone id and name must not be empty".to_string(),
            ));
        }
        Ok(zone)
    }
}

/// A resolved hosted zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZoneRef {
    pub zone_id: String,
    /// Without trailing dot
    pub zone_name: String,
}

/// What an alias record points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    LoadBalancer(LoadBalancerHandle),
}

impl AliasTarget {
    fn to_expr(&self) -> Expr {
        match self {
            Self::LoadBalancer(lb) => Expr::object([
                (
                    "DNSName",
                    Expr::concat([Expr::str("dualstack."), lb.dns_name()]),
                ),
                ("HostedZoneId", lb.canonical_hosted_zone_id()),
            ]),
        }
    }
}

/// A record configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecordConfig {
    pub zone: HostedZoneRef,
    pub record_name: RecordName,
    pub target: AliasTarget,
}

pub fn declare_a_record(
    graph: &mut ResourceGraph,
    path: &str,
    config: &AliasRecordConfig,
) -> SynthesisResult<LogicalId> {
    let fqdn = config.record_name.qualified(&config.zone.zone_name);

    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::RecordSet)?
            .property("AliasTarget", config.target.to_expr())
            .property("HostedZoneId", config.zone.zone_id.clone())
            .property("Name", fqdn.clone())
            .property("Type", "A"),
    )?;

    info!(record = %fqdn, zone_id = %config.zone.zone_id, "Declared alias record");
    Ok(logical_id)
}
