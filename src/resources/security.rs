// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Groups and Ingress Rules
//!
//! Ingress is always declared as a standalone rule resource. A group
//! declared early can then receive rules from resources declared after it
//! (the load balancer opening its listener port, the database admitting
//! the instance group) without reordering the graph.

use tracing::debug;

use crate::domain::{CidrBlock, Port, ResourceKind};
use crate::errors::SynthesisResult;
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, ResourceGraph};

use super::network::NetworkBoundary;

/// Security group configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupConfig {
    /// Group description (defaults to the construct path)
    pub description: Option<String>,
    /// Allow every outbound connection (default true)
    pub allow_all_outbound: bool,
}

impl Default for SecurityGroupConfig {
    fn default() -> Self {
        Self {
            description: None,
            allow_all_outbound: true,
        }
    }
}

/// Traffic source of an ingress rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    SecurityGroup(LogicalId),
    Cidr(CidrBlock),
}

impl Peer {
    pub fn any_ipv4() -> Self {
        Self::Cidr(CidrBlock::any_ipv4())
    }

    fn label(&self) -> String {
        match self {
            Self::SecurityGroup(id) => id.to_string(),
            Self::Cidr(cidr) => cidr.to_string(),
        }
    }
}

/// An ingress rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub peer: Peer,
    pub port: Port,
    pub description: Option<String>,
}

impl IngressRule {
    pub fn new(peer: Peer, port: Port) -> Self {
        Self {
            peer,
            port,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub fn declare_security_group(
    graph: &mut ResourceGraph,
    path: &str,
    network: &NetworkBoundary,
    config: &SecurityGroupConfig,
) -> SynthesisResult<LogicalId> {
    let egress = if config.allow_all_outbound {
        Expr::object([
            ("CidrIp", Expr::str(CidrBlock::any_ipv4().to_string())),
            ("Description", Expr::str("Allow all outbound traffic by default")),
            ("IpProtocol", Expr::str("-1")),
        ])
    } else {
        // Placeholder rule that matches no traffic; an empty list would mean "allow all"
        Expr::object([
            ("CidrIp", Expr::str("255.255.255.255/32")),
            ("Description", Expr::str("Disallow all traffic")),
            ("FromPort", Expr::Int(252)),
            ("IpProtocol", Expr::str("icmp")),
            ("ToPort", Expr::Int(86)),
        ])
    };

    let description = config
        .description
        .clone()
        .unwrap_or_else(|| path.to_string());

    graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::SecurityGroup)?
            .property("GroupDescription", description)
            .property("SecurityGroupEgress", Expr::list([egress]))
            .property("VpcId", network.vpc_id()),
    )
}

/// Declare an ingress rule on `group`
///
/// The rule path is derived from the group path, peer and port, so adding
/// the same rule twice is rejected as a duplicate.
pub fn declare_ingress(
    graph: &mut ResourceGraph,
    group_path: &str,
    group: &LogicalId,
    rule: &IngressRule,
) -> SynthesisResult<LogicalId> {
    let path = format!("{}/from {}:{}", group_path, rule.peer.label(), rule.port);
    let description = rule
        .description
        .clone()
        .unwrap_or_else(|| format!("from {}:{}", rule.peer.label(), rule.port));

    let mut descriptor = Descriptor::new(path, ResourceKind::SecurityGroupIngress)?
        .property("GroupId", Expr::get_att(group, "GroupId"))
        .property("IpProtocol", rule.port.protocol().as_str())
        .property("Description", description)
        .optional_property("FromPort", rule.port.from_port().map(Expr::from))
        .optional_property("ToPort", rule.port.to_port().map(Expr::from));

    descriptor = match &rule.peer {
        Peer::SecurityGroup(source) => {
            descriptor.property("SourceSecurityGroupId", Expr::get_att(source, "GroupId"))
        }
        Peer::Cidr(cidr) => descriptor.property("CidrIp", cidr.to_string()),
    };

    let id = graph.add(descriptor)?;
    debug!(group = %group, peer = %rule.peer.label(), port = %rule.port, "Declared ingress rule");
    Ok(id)
}
