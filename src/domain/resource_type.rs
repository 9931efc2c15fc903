// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Kind Domain Model
//!
//! Defines the taxonomy of resource declarations a stack can contain and maps
//! each kind to its CloudFormation type name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network boundary
    Vpc,
    Subnet,
    RouteTable,
    SubnetRouteTableAssociation,
    Route,
    InternetGateway,
    VpcGatewayAttachment,
    ElasticIp,
    NatGateway,

    // Access control
    SecurityGroup,
    SecurityGroupIngress,
    IamRole,
    InstanceProfile,

    // Secret material
    Secret,
    SecretTargetAttachment,

    // Data store
    DbSubnetGroup,
    DbInstance,

    // Compute
    Instance,

    // Load balancing
    LoadBalancer,
    Listener,
    TargetGroup,

    // DNS
    RecordSet,

    // Storage
    Bucket,
    BucketPolicy,
    AutoDeleteObjects,
}

impl ResourceKind {
    /// CloudFormation resource type name
    pub fn cfn_type(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::Route => "AWS::EC2::Route",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::ElasticIp => "AWS::EC2::EIP",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
            Self::IamRole => "AWS::IAM::Role",
            Self::InstanceProfile => "AWS::IAM::InstanceProfile",
            Self::Secret => "AWS::SecretsManager::Secret",
            Self::SecretTargetAttachment => "AWS::SecretsManager::SecretTargetAttachment",
            Self::DbSubnetGroup => "AWS::RDS::DBSubnetGroup",
            Self::DbInstance => "AWS::RDS::DBInstance",
            Self::Instance => "AWS::EC2::Instance",
            Self::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            Self::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            Self::RecordSet => "AWS::Route53::RecordSet",
            Self::Bucket => "AWS::S3::Bucket",
            Self::BucketPolicy => "AWS::S3::BucketPolicy",
            Self::AutoDeleteObjects => "Custom::S3AutoDeleteObjects",
        }
    }

    /// Parse from a CloudFormation type name
    pub fn from_cfn_type(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.cfn_type() == s)
    }

    /// Every kind, in declaration order
    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Vpc,
            Self::Subnet,
            Self::RouteTable,
            Self::SubnetRouteTableAssociation,
            Self::Route,
            Self::InternetGateway,
            Self::VpcGatewayAttachment,
            Self::ElasticIp,
            Self::NatGateway,
            Self::SecurityGroup,
            Self::SecurityGroupIngress,
            Self::IamRole,
            Self::InstanceProfile,
            Self::Secret,
            Self::SecretTargetAttachment,
            Self::DbSubnetGroup,
            Self::DbInstance,
            Self::Instance,
            Self::LoadBalancer,
            Self::Listener,
            Self::TargetGroup,
            Self::RecordSet,
            Self::Bucket,
            Self::BucketPolicy,
            Self::AutoDeleteObjects,
        ]
    }

    /// Get the primary category for this kind
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::RouteTable
            | Self::SubnetRouteTableAssociation
            | Self::Route
            | Self::InternetGateway
            | Self::VpcGatewayAttachment
            | Self::ElasticIp
            | Self::NatGateway => ResourceCategory::Network,

            Self::SecurityGroup
            | Self::SecurityGroupIngress
            | Self::IamRole
            | Self::InstanceProfile => ResourceCategory::AccessControl,

            Self::Secret | Self::SecretTargetAttachment => ResourceCategory::Secret,

            Self::DbSubnetGroup | Self::DbInstance => ResourceCategory::DataStore,

            Self::Instance => ResourceCategory::Compute,

            Self::LoadBalancer | Self::Listener | Self::TargetGroup => {
                ResourceCategory::LoadBalancing
            }

            Self::RecordSet => ResourceCategory::Dns,

            Self::Bucket | Self::BucketPolicy | Self::AutoDeleteObjects => {
                ResourceCategory::Storage
            }
        }
    }

    /// Whether the kind holds state that a removal policy should govern
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::DbInstance | Self::Bucket | Self::Secret)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cfn_type())
    }
}

/// Resource category (high-level grouping, one per entity of the data model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Virtual network, subnets and routing
    Network,
    /// Security groups and IAM identities
    AccessControl,
    /// Generated credentials
    Secret,
    /// Managed relational databases
    DataStore,
    /// Virtual machines
    Compute,
    /// Load balancers, listeners and targets
    LoadBalancing,
    /// DNS records
    Dns,
    /// Object storage
    Storage,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::AccessControl => write!(f, "Access Control"),
            Self::Secret => write!(f, "Secret"),
            Self::DataStore => write!(f, "Data Store"),
            Self::Compute => write!(f, "Compute"),
            Self::LoadBalancing => write!(f, "Load Balancing"),
            Self::Dns => write!(f, "DNS"),
            Self::Storage => write!(f, "Storage"),
        }
    }
}
