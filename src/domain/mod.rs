// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Stack Domain Models
//!
//! Value objects with validation invariants shared by every resource
//! declaration.
//!
//! # Value Objects with Invariants
//!
//! - [`GroupName`] - owner group, source of every derived name
//! - [`BucketName`] - S3 bucket naming rules
//! - [`RecordName`] - single DNS label inside a hosted zone
//! - [`CidrBlock`] - IPv4 CIDR with host-bit and split checks
//! - [`Port`] - protocol and port range of a firewall rule
//! - [`ZoneCount`] - availability zones a network spans (1-6)
//! - [`ResourceKind`] - resource taxonomy mapped to CloudFormation types

pub mod invariants;
pub mod names;
pub mod network;
pub mod resource_type;

// Re-export value objects
pub use invariants::{ValidationError, ValidationResult};
pub use names::{BucketName, GroupName, NameError, RecordName};
pub use network::{CidrBlock, IpProtocol, NetworkError, Port, SubnetType, ZoneCount};
pub use resource_type::{ResourceCategory, ResourceKind};
