// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Relational Database
//!
//! A database instance is three resources in order: a subnet group over the
//! selected subnets, the instance itself with credentials resolved from a
//! generated secret, and the attachment linking the secret back to the
//! instance.

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::domain::invariants::{validate_allocated_storage, validate_non_empty, ValidationError};
use crate::domain::{ResourceKind, SubnetType};
use crate::errors::SynthesisResult;
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, RemovalPolicy, ResourceGraph};

use super::compute::InstanceType;
use super::network::NetworkBoundary;
use super::secret::{attach_to_database, SecretHandle};

/// Supported PostgreSQL engine versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostgresVersion {
    V12_5,
    V13_7,
    V14_10,
    V15_5,
    V16_1,
}

impl PostgresVersion {
    pub fn all() -> &'static [PostgresVersion] {
        &[
            Self::V12_5,
            Self::V13_7,
            Self::V14_10,
            Self::V15_5,
            Self::V16_1,
        ]
    }

    pub fn full_version(&self) -> &'static str {
        match self {
            Self::V12_5 => "12.5",
            Self::V13_7 => "13.7",
            Self::V14_10 => "14.10",
            Self::V15_5 => "15.5",
            Self::V16_1 => "16.1",
        }
    }

    pub fn major_version(&self) -> &'static str {
        match self {
            Self::V12_5 => "12",
            Self::V13_7 => "13",
            Self::V14_10 => "14",
            Self::V15_5 => "15",
            Self::V16_1 => "16",
        }
    }
}

impl fmt::Display for PostgresVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_version())
    }
}

impl FromStr for PostgresVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.full_version() == s)
            .ok_or_else(|| ValidationError::UnsupportedEngineVersion(format!("postgres {}", s)))
    }
}

/// Database engine and version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseEngine {
    Postgres(PostgresVersion),
}

impl DatabaseEngine {
    pub fn engine_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Self::Postgres(version) => version.full_version(),
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres(_) => 5432,
        }
    }

    /// JDBC URL scheme of the engine
    pub fn jdbc_scheme(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "jdbc:postgresql",
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.engine_name(), self.version())
    }
}

/// Database instance configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInstanceConfig {
    pub engine: DatabaseEngine,
    /// Default `t3.micro`
    pub instance_type: InstanceType,
    /// Default 20 GiB, the engine minimum
    pub allocated_storage_gib: u32,
    /// Default [`SubnetType::PrivateWithEgress`]
    pub subnet_type: SubnetType,
    pub security_groups: Vec<LogicalId>,
    /// Secret holding `username` and `password` fields
    pub credentials: SecretHandle,
    /// Default [`RemovalPolicy::Snapshot`]
    pub removal_policy: RemovalPolicy,
}

impl DatabaseInstanceConfig {
    pub fn new(engine: DatabaseEngine, credentials: SecretHandle, security_groups: Vec<LogicalId>) -> Self {
        Self {
            engine,
            instance_type: InstanceType::default(),
            allocated_storage_gib: 20,
            subnet_type: SubnetType::PrivateWithEgress,
            security_groups,
            credentials,
            removal_policy: RemovalPolicy::Snapshot,
        }
    }
}

/// Handle to a declared database instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHandle {
    pub logical_id: LogicalId,
    pub subnet_group: LogicalId,
    pub secret_attachment: LogicalId,
    pub engine: DatabaseEngine,
}

impl DatabaseHandle {
    /// Endpoint host name, known after provisioning
    pub fn endpoint_address(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Endpoint.Address")
    }

    pub fn endpoint_port(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Endpoint.Port")
    }

    pub fn port(&self) -> u16 {
        self.engine.default_port()
    }

    /// `jdbc:postgresql://<endpoint>:<port>`
    pub fn jdbc_url(&self) -> Expr {
        Expr::concat([
            Expr::str(format!("{}://", self.engine.jdbc_scheme())),
            self.endpoint_address(),
            Expr::str(format!(":{}", self.port())),
        ])
    }
}

pub fn declare_database_instance(
    graph: &mut ResourceGraph,
    path: &str,
    network: &NetworkBoundary,
    config: &DatabaseInstanceConfig,
) -> SynthesisResult<DatabaseHandle> {
    validate_allocated_storage(config.allocated_storage_gib)?;
    validate_non_empty("database security groups", &config.security_groups)?;
    let subnet_ids = network.subnet_ids(config.subnet_type)?;

    let subnet_group = graph.add(
        Descriptor::new(format!("{}/SubnetGroup/Default", path), ResourceKind::DbSubnetGroup)?
            .property("DBSubnetGroupDescription", format!("Subnet group for {} database", path))
            .property("SubnetIds", subnet_ids),
    )?;

    let credentials = &config.credentials;
    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::DbInstance)?
            .property("AllocatedStorage", config.allocated_storage_gib.to_string())
            .property("CopyTagsToSnapshot", true)
            .property("DBInstanceClass", config.instance_type.db_class())
            .property("DBSubnetGroupName", &subnet_group)
            .property("Engine", config.engine.engine_name())
            .property("EngineVersion", config.engine.version())
            .property("MasterUsername", credentials.field_reference("username"))
            .property("MasterUserPassword", credentials.field_reference("password"))
            .property("PubliclyAccessible", false)
            .property("StorageType", "gp2")
            .property(
                "VPCSecurityGroups",
                Expr::list(
                    config
                        .security_groups
                        .iter()
                        .map(|sg| Expr::get_att(sg, "GroupId")),
                ),
            )
            .removal_policy(config.removal_policy),
    )?;

    let secret_attachment = attach_to_database(graph, credentials, &logical_id)?;

    info!(
        database = %logical_id,
        engine = %config.engine,
        class = %config.instance_type.db_class(),
        storage_gib = config.allocated_storage_gib,
        "Declared database instance"
    );

    Ok(DatabaseHandle {
        logical_id,
        subnet_group,
        secret_attachment,
        engine: config.engine,
    })
}
