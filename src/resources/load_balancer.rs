// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application Load Balancing
//!
//! ```text
//! LoadBalancer ── Listener (port, protocol) ── forward ──▶ TargetGroup ── instances
//! ```
//!
//! A listener and its default target group are declared together: the
//! target group first, then the listener whose default action forwards to
//! it. Opening the listener and registering targets also declares the
//! ingress rules that make the traffic flow.

use tracing::info;

use crate::domain::invariants::validate_non_empty;
use crate::domain::{Port, ResourceKind, SubnetType};
use crate::errors::SynthesisResult;
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, ResourceGraph};

use super::compute::InstanceHandle;
use super::network::NetworkBoundary;
use super::security::{declare_ingress, IngressRule, Peer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationProtocol {
    Http,
    Https,
}

impl ApplicationProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
        }
    }

    /// Protocol conventionally served on `port`
    pub fn for_port(port: u16) -> Self {
        match port {
            443 | 8443 => Self::Https,
            _ => Self::Http,
        }
    }
}

/// Load balancer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerConfig {
    /// Reachable from the internet (default false)
    pub internet_facing: bool,
    /// Placement (default public)
    pub subnet_type: SubnetType,
    pub security_group: LogicalId,
}

impl LoadBalancerConfig {
    pub fn new(security_group: LogicalId) -> Self {
        Self {
            internet_facing: false,
            subnet_type: SubnetType::Public,
            security_group,
        }
    }
}

/// Handle to a declared load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerHandle {
    pub logical_id: LogicalId,
    pub path: String,
    pub security_group: LogicalId,
    pub security_group_path: String,
}

impl LoadBalancerHandle {
    pub fn dns_name(&self) -> Expr {
        Expr::get_att(&self.logical_id, "DNSName")
    }

    pub fn canonical_hosted_zone_id(&self) -> Expr {
        Expr::get_att(&self.logical_id, "CanonicalHostedZoneID")
    }
}

/// A load balancing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Instance(InstanceHandle),
}

/// Default target group of a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupConfig {
    pub port: u16,
    /// Derived from the port when unset
    pub protocol: Option<ApplicationProtocol>,
    pub targets: Vec<Target>,
    pub health_check_path: Option<String>,
}

impl TargetGroupConfig {
    pub fn new(port: u16, targets: Vec<Target>) -> Self {
        Self {
            port,
            protocol: None,
            targets,
            health_check_path: None,
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub port: u16,
    /// Derived from the port when unset
    pub protocol: Option<ApplicationProtocol>,
    /// Admit the listener port from anywhere (default true)
    pub open: bool,
    pub default_targets: TargetGroupConfig,
}

impl ListenerConfig {
    pub fn new(port: u16, default_targets: TargetGroupConfig) -> Self {
        Self {
            port,
            protocol: None,
            open: true,
            default_targets,
        }
    }
}

/// Handle to a declared listener and its default target group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerHandle {
    pub logical_id: LogicalId,
    pub target_group: LogicalId,
    pub port: u16,
    pub protocol: ApplicationProtocol,
}

pub fn declare_load_balancer(
    graph: &mut ResourceGraph,
    path: &str,
    security_group_path: &str,
    network: &NetworkBoundary,
    config: &LoadBalancerConfig,
) -> SynthesisResult<LoadBalancerHandle> {
    let subnets = network.subnet_ids(config.subnet_type)?;
    let scheme = if config.internet_facing {
        "internet-facing"
    } else {
        "internal"
    };

    let mut descriptor = Descriptor::new(format!("{}/Resource", path), ResourceKind::LoadBalancer)?
        .property(
            "LoadBalancerAttributes",
            Expr::list([Expr::object([
                ("Key", Expr::str("deletion_protection.enabled")),
                ("Value", Expr::str("false")),
            ])]),
        )
        .property("Scheme", scheme)
        .property(
            "SecurityGroups",
            Expr::list([Expr::get_att(&config.security_group, "GroupId")]),
        )
        .property("Subnets", subnets)
        .property("Type", "application");

    // Internet-facing balancers wait for public routing to exist
    if config.internet_facing {
        for route in network.internet_routes() {
            descriptor = descriptor.depends_on(route);
        }
    }

    let logical_id = graph.add(descriptor)?;
    info!(load_balancer = %logical_id, scheme, "Declared load balancer");

    Ok(LoadBalancerHandle {
        logical_id,
        path: path.to_string(),
        security_group: config.security_group.clone(),
        security_group_path: security_group_path.to_string(),
    })
}

/// Declare a listener, its default target group and the ingress both need
pub fn declare_listener(
    graph: &mut ResourceGraph,
    load_balancer: &LoadBalancerHandle,
    name: &str,
    network: &NetworkBoundary,
    config: &ListenerConfig,
) -> SynthesisResult<ListenerHandle> {
    let targets = &config.default_targets;
    validate_non_empty("listener targets", &targets.targets)?;

    let protocol = config
        .protocol
        .unwrap_or_else(|| ApplicationProtocol::for_port(config.port));
    let target_protocol = targets
        .protocol
        .unwrap_or_else(|| ApplicationProtocol::for_port(targets.port));
    let listener_path = format!("{}/{}", load_balancer.path, name);

    if config.open {
        declare_ingress(
            graph,
            &load_balancer.security_group_path,
            &load_balancer.security_group,
            &IngressRule::new(Peer::any_ipv4(), Port::tcp(config.port)?)
                .with_description(format!("Allow from anyone on port {}", config.port)),
        )?;
    }

    let mut registered = Vec::with_capacity(targets.targets.len());
    for target in &targets.targets {
        match target {
            Target::Instance(instance) => {
                let rule = IngressRule::new(
                    Peer::SecurityGroup(load_balancer.security_group.clone()),
                    Port::tcp(targets.port)?,
                )
                .with_description("Load balancer to target");
                let ingress_path = format!("{}/{}", listener_path, instance.logical_id);
                declare_ingress(graph, &ingress_path, &instance.security_group, &rule)?;
                registered.push(Expr::object([("Id", Expr::reference(&instance.logical_id))]));
            }
        }
    }

    let health_check = targets.health_check_path.clone().map(Expr::from);
    let target_group = graph.add(
        Descriptor::new(
            format!("{}/TargetGroup/Resource", listener_path),
            ResourceKind::TargetGroup,
        )?
        .property("Port", targets.port)
        .property("Protocol", target_protocol.as_str())
        .property("TargetType", "instance")
        .property("Targets", Expr::list(registered))
        .property("VpcId", network.vpc_id())
        .optional_property("HealthCheckPath", health_check),
    )?;

    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", listener_path), ResourceKind::Listener)?
            .property(
                "DefaultActions",
                Expr::list([Expr::object([
                    ("TargetGroupArn", Expr::reference(&target_group)),
                    ("Type", Expr::str("forward")),
                ])]),
            )
            .property("LoadBalancerArn", &load_balancer.logical_id)
            .property("Port", config.port)
            .property("Protocol", protocol.as_str()),
    )?;

    info!(
        listener = %logical_id,
        port = config.port,
        protocol = protocol.as_str(),
        targets = targets.targets.len(),
        "Declared listener"
    );

    Ok(ListenerHandle {
        logical_id,
        target_group,
        port: config.port,
        protocol,
    })
}
