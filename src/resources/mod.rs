// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Declarations
//!
//! One module per resource family. Every family exposes an explicit
//! configuration struct with documented defaults and a `declare_*` function
//! that appends descriptors to a graph and returns a handle; handles carry
//! the logical ids and deferred attributes later declarations reference.

pub mod compute;
pub mod database;
pub mod dns;
pub mod iam;
pub mod load_balancer;
pub mod network;
pub mod secret;
pub mod security;
pub mod storage;

pub use compute::{declare_instance, InstanceConfig, InstanceHandle, InstanceType, MachineImage, UserData};
pub use database::{
    declare_database_instance, DatabaseEngine, DatabaseHandle, DatabaseInstanceConfig,
    PostgresVersion,
};
pub use dns::{declare_a_record, AliasRecordConfig, AliasTarget, HostedZoneRef, HostedZoneSource};
pub use iam::{
    declare_role, Effect, ManagedPolicy, PolicyDocument, PolicyStatement, Principal, RoleConfig,
};
pub use load_balancer::{
    declare_listener, declare_load_balancer, ApplicationProtocol, ListenerConfig, ListenerHandle,
    LoadBalancerConfig, LoadBalancerHandle, Target, TargetGroupConfig,
};
pub use network::{declare_vpc, import_default_vpc, NetworkBoundary, SubnetConfig, SubnetHandle, VpcConfig};
pub use secret::{declare_secret, SecretConfig, SecretHandle, SecretStringGenerator};
pub use security::{declare_ingress, declare_security_group, IngressRule, Peer, SecurityGroupConfig};
pub use storage::{
    declare_bucket, AutoDeleteProvider, BlockPublicAccess, BucketConfig, BucketHandle,
    WebsiteReadAccess,
};

/// Tag list in the provider's `[{Key, Value}]` shape
pub(crate) fn tags<'a>(pairs: impl IntoIterator<Item = (&'a str, crate::expr::Expr)>) -> crate::expr::Expr {
    crate::expr::Expr::list(pairs.into_iter().map(|(key, value)| {
        crate::expr::Expr::object([("Key", crate::expr::Expr::str(key)), ("Value", value)])
    }))
}
