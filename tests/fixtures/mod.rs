// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-cloud-stacks
//!
//! Deterministic stack inputs and lookup context shared by the integration
//! tests. Fixtures are the only place that builds stack props.
//!
//! # Design Principles
//! - Fixed account, region and group; no values read from the environment
//! - Lookups come from an inline context document, never from the network
//! - Timestamps are fixed constants

#![allow(dead_code)]

use chrono::{DateTime, Utc};

use cim_cloud_stacks::domain::GroupName;
use cim_cloud_stacks::stacks::{ApplicationStackProps, WebsiteStackProps};
use cim_cloud_stacks::{
    ApplicationStack, ContextLookup, NetworkMode, ResourceGraph, StackEnvironment,
    WebsiteBucketStack,
};

pub const ACCOUNT: &str = "292370674225";
pub const REGION: &str = "eu-north-1";
pub const GROUP: &str = "team7";

pub const DEFAULT_VPC_ID: &str = "vpc-0a1b2c3d4e5f60718";
pub const ZONE_ID: &str = "Z0413857YT73A0A8FRFF";
pub const ZONE_NAME: &str = "cloud-ha.com";

// Fixed manifest timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Cached lookup answers for the fixture account
pub const CONTEXT_JSON: &str = r#"{
    "vpcs": [
        {
            "account": "292370674225",
            "region": "eu-north-1",
            "is_default": true,
            "vpc_id": "vpc-0a1b2c3d4e5f60718",
            "cidr": "172.31.0.0/16",
            "subnets": [
                {"subnet_id": "subnet-0aaa", "availability_zone": "eu-north-1a", "subnet_type": "public"},
                {"subnet_id": "subnet-0bbb", "availability_zone": "eu-north-1b", "subnet_type": "public"},
                {"subnet_id": "subnet-0ccc", "availability_zone": "eu-north-1c", "subnet_type": "public"}
            ]
        }
    ],
    "hosted_zones": [
        {"zone_id": "Z0413857YT73A0A8FRFF", "zone_name": "cloud-ha.com."}
    ]
}"#;

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn group() -> GroupName {
    GroupName::new(GROUP).expect("Invalid group in test fixture")
}

pub fn environment() -> StackEnvironment {
    StackEnvironment::new(ACCOUNT, REGION)
}

pub fn context() -> ContextLookup {
    ContextLookup::from_json(CONTEXT_JSON).expect("Invalid context in test fixture")
}

pub fn application_props(mode: NetworkMode) -> ApplicationStackProps {
    ApplicationStackProps {
        environment: environment(),
        mode,
        ..ApplicationStackProps::new(group())
    }
}

pub fn website_props() -> WebsiteStackProps {
    WebsiteStackProps {
        environment: environment(),
        ..WebsiteStackProps::new(group())
    }
}

pub fn application_graph(mode: NetworkMode) -> ResourceGraph {
    ApplicationStack::compose(&application_props(mode), &context())
        .expect("Fixture application stack must compose")
}

pub fn website_graph() -> ResourceGraph {
    WebsiteBucketStack::compose(&website_props()).expect("Fixture website stack must compose")
}
