// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Boundary
//!
//! An owned network is a VPC spanning up to [`ZoneCount::MAX`] availability
//! zones with one subnet per (subnet group, zone) pair:
//!
//! ```text
//! VPC ── IGW ── VPCGW attachment
//!  ├─ PublicSubnet{n}   route 0.0.0.0/0 → IGW,  EIP + NAT gateway
//!  └─ PrivateSubnet{n}  route 0.0.0.0/0 → NAT gateway of zone n
//! ```
//!
//! A shared network is the account's default VPC, resolved through a
//! [`LookupProvider`]; nothing is declared for it.

use tracing::{debug, info};

use crate::domain::invariants::validate_non_empty;
use crate::domain::{CidrBlock, ResourceKind, SubnetType, ZoneCount};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, ResourceGraph};
use crate::lookup::LookupProvider;
use crate::stacks::StackEnvironment;

use super::tags;

/// One subnet group, repeated in every availability zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetConfig {
    pub name: String,
    pub subnet_type: SubnetType,
}

impl SubnetConfig {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType) -> Self {
        Self {
            name: name.into(),
            subnet_type,
        }
    }
}

/// Owned network configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcConfig {
    /// Address space, split evenly across every subnet (default `10.0.0.0/16`)
    pub cidr: CidrBlock,
    /// Availability zones to span (default 3)
    pub max_azs: ZoneCount,
    /// Subnet groups (default `Public` and `Private` with egress)
    pub subnets: Vec<SubnetConfig>,
    /// NAT gateways for egress subnets; `None` places one in every zone
    pub nat_gateways: Option<u8>,
}

impl Default for VpcConfig {
    fn default() -> Self {
        Self {
            cidr: CidrBlock::DEFAULT_VPC,
            max_azs: ZoneCount::default(),
            subnets: vec![
                SubnetConfig::new("Public", SubnetType::Public),
                SubnetConfig::new("Private", SubnetType::PrivateWithEgress),
            ],
            nat_gateways: None,
        }
    }
}

/// Where the network comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSource {
    Owned(LogicalId),
    Imported(String),
}

/// A subnet usable for placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetHandle {
    pub group: String,
    pub subnet_type: SubnetType,
    pub availability_zone: Expr,
    pub subnet_id: Expr,
    /// Default route of an owned subnet
    pub default_route: Option<LogicalId>,
}

/// Handle to a declared or imported network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBoundary {
    source: NetworkSource,
    cidr: Option<CidrBlock>,
    subnets: Vec<SubnetHandle>,
}

impl NetworkBoundary {
    pub fn source(&self) -> &NetworkSource {
        &self.source
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.source, NetworkSource::Owned(_))
    }

    pub fn vpc_id(&self) -> Expr {
        match &self.source {
            NetworkSource::Owned(id) => Expr::reference(id),
            NetworkSource::Imported(vpc_id) => Expr::str(vpc_id.clone()),
        }
    }

    pub fn cidr(&self) -> Option<CidrBlock> {
        self.cidr
    }

    pub fn subnets(&self) -> &[SubnetHandle] {
        &self.subnets
    }

    /// Subnets of one type; empty selections are a configuration error
    pub fn select(&self, subnet_type: SubnetType) -> SynthesisResult<Vec<&SubnetHandle>> {
        let selected: Vec<&SubnetHandle> = self
            .subnets
            .iter()
            .filter(|s| s.subnet_type == subnet_type)
            .collect();

        if selected.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(format!(
                "network has no {} subnets",
                subnet_type
            )));
        }
        Ok(selected)
    }

    /// Ids of the selected subnets as a list value
    pub fn subnet_ids(&self, subnet_type: SubnetType) -> SynthesisResult<Expr> {
        Ok(Expr::list(
            self.select(subnet_type)?
                .into_iter()
                .map(|s| s.subnet_id.clone()),
        ))
    }

    /// Default routes of owned public subnets
    ///
    /// Internet-facing resources wait for these before they are created.
    pub fn internet_routes(&self) -> Vec<&LogicalId> {
        self.subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Public)
            .filter_map(|s| s.default_route.as_ref())
            .collect()
    }
}

/// Declare an owned network
pub fn declare_vpc(
    graph: &mut ResourceGraph,
    path: &str,
    config: &VpcConfig,
) -> SynthesisResult<NetworkBoundary> {
    validate_non_empty("subnet configuration", &config.subnets)?;

    let azs = usize::from(config.max_azs.value());
    let needs_nat = config
        .subnets
        .iter()
        .any(|s| s.subnet_type == SubnetType::PrivateWithEgress);
    let has_public = config
        .subnets
        .iter()
        .any(|s| s.subnet_type == SubnetType::Public);

    if needs_nat && !has_public {
        return Err(SynthesisError::InvalidConfiguration(
            "subnets with egress need a public subnet group for their NAT gateways".to_string(),
        ));
    }

    let nat_count = match config.nat_gateways {
        Some(0) if needs_nat => {
            return Err(SynthesisError::InvalidConfiguration(
                "subnets with egress need at least one NAT gateway".to_string(),
            ))
        }
        Some(n) => usize::from(n).min(azs),
        None => azs,
    };
    let nat_count = if needs_nat { nat_count } else { 0 };

    let blocks = config.cidr.split(config.subnets.len() * azs)?;

    let vpc = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::Vpc)?
            .property("CidrBlock", config.cidr.to_string())
            .property("EnableDnsHostnames", true)
            .property("EnableDnsSupport", true)
            .property("InstanceTenancy", "default")
            .property("Tags", tags([("Name", Expr::str(path))])),
    )?;

    let gateway = graph.add(
        Descriptor::new(format!("{}/IGW", path), ResourceKind::InternetGateway)?
            .property("Tags", tags([("Name", Expr::str(path))])),
    )?;

    let attachment = graph.add(
        Descriptor::new(format!("{}/VPCGW", path), ResourceKind::VpcGatewayAttachment)?
            .property("VpcId", &vpc)
            .property("InternetGatewayId", &gateway),
    )?;

    // Public groups first, so egress routes can reference their NAT gateways
    let mut groups: Vec<(usize, &SubnetConfig)> = config.subnets.iter().enumerate().collect();
    groups.sort_by_key(|(_, group)| group.subnet_type);

    let mut subnets = Vec::with_capacity(blocks.len());
    let mut nat_gateways: Vec<LogicalId> = Vec::with_capacity(nat_count);

    for (group_index, group) in groups {
        for zone in 0..azs {
            let subnet_path = format!("{}/{}Subnet{}", path, group.name, zone + 1);
            let availability_zone = Expr::select(zone as u32, Expr::GetAzs);
            let block = blocks[group_index * azs + zone];

            let subnet = graph.add(
                Descriptor::new(format!("{}/Subnet", subnet_path), ResourceKind::Subnet)?
                    .property("VpcId", &vpc)
                    .property("AvailabilityZone", availability_zone.clone())
                    .property("CidrBlock", block.to_string())
                    .property(
                        "MapPublicIpOnLaunch",
                        group.subnet_type == SubnetType::Public,
                    )
                    .property(
                        "Tags",
                        tags([
                            ("aws-cdk:subnet-name", Expr::str(group.name.clone())),
                            ("aws-cdk:subnet-type", Expr::str(group.subnet_type.as_str())),
                            ("Name", Expr::str(subnet_path.clone())),
                        ]),
                    ),
            )?;

            let route_table = graph.add(
                Descriptor::new(format!("{}/RouteTable", subnet_path), ResourceKind::RouteTable)?
                    .property("VpcId", &vpc)
                    .property("Tags", tags([("Name", Expr::str(subnet_path.clone()))])),
            )?;

            let association = graph.add(
                Descriptor::new(
                    format!("{}/RouteTableAssociation", subnet_path),
                    ResourceKind::SubnetRouteTableAssociation,
                )?
                .property("RouteTableId", &route_table)
                .property("SubnetId", &subnet),
            )?;

            let default_route = match group.subnet_type {
                SubnetType::Public => {
                    let route = graph.add(
                        Descriptor::new(format!("{}/DefaultRoute", subnet_path), ResourceKind::Route)?
                            .property("RouteTableId", &route_table)
                            .property("DestinationCidrBlock", CidrBlock::any_ipv4().to_string())
                            .property("GatewayId", &gateway)
                            .depends_on(&attachment),
                    )?;

                    if nat_gateways.len() < nat_count {
                        let eip = graph.add(
                            Descriptor::new(format!("{}/EIP", subnet_path), ResourceKind::ElasticIp)?
                                .property("Domain", "vpc")
                                .property("Tags", tags([("Name", Expr::str(subnet_path.clone()))])),
                        )?;
                        let nat = graph.add(
                            Descriptor::new(format!("{}/NATGateway", subnet_path), ResourceKind::NatGateway)?
                                .property("AllocationId", Expr::get_att(&eip, "AllocationId"))
                                .property("SubnetId", &subnet)
                                .property("Tags", tags([("Name", Expr::str(subnet_path.clone()))]))
                                .depends_on(&route)
                                .depends_on(&association),
                        )?;
                        nat_gateways.push(nat);
                    }

                    Some(route)
                }
                SubnetType::PrivateWithEgress => {
                    let nat = &nat_gateways[zone % nat_gateways.len()];
                    Some(graph.add(
                        Descriptor::new(format!("{}/DefaultRoute", subnet_path), ResourceKind::Route)?
                            .property("RouteTableId", &route_table)
                            .property("DestinationCidrBlock", CidrBlock::any_ipv4().to_string())
                            .property("NatGatewayId", nat),
                    )?)
                }
                SubnetType::PrivateIsolated => None,
            };

            debug!(subnet = %subnet_path, cidr = %block, "Declared subnet");

            subnets.push(SubnetHandle {
                group: group.name.clone(),
                subnet_type: group.subnet_type,
                availability_zone,
                subnet_id: Expr::reference(&subnet),
                default_route,
            });
        }
    }

    info!(
        vpc = %vpc,
        cidr = %config.cidr,
        zones = azs,
        subnets = subnets.len(),
        nat_gateways = nat_gateways.len(),
        "Declared owned network"
    );

    Ok(NetworkBoundary {
        source: NetworkSource::Owned(vpc),
        cidr: Some(config.cidr),
        subnets,
    })
}

/// Resolve the account's default network through a lookup
pub fn import_default_vpc(
    lookups: &dyn LookupProvider,
    environment: &StackEnvironment,
) -> SynthesisResult<NetworkBoundary> {
    let vpc = lookups.default_vpc(environment)?;

    info!(
        vpc_id = %vpc.vpc_id,
        subnets = vpc.subnets.len(),
        "Using shared default network"
    );

    Ok(NetworkBoundary {
        source: NetworkSource::Imported(vpc.vpc_id.clone()),
        cidr: vpc.cidr,
        subnets: vpc
            .subnets
            .iter()
            .map(|s| SubnetHandle {
                group: s.subnet_type.as_str().to_string(),
                subnet_type: s.subnet_type,
                availability_zone: Expr::str(s.availability_zone.clone()),
                subnet_id: Expr::str(s.subnet_id.clone()),
                default_route: None,
            })
            .collect(),
    })
}
