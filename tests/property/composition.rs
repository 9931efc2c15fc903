// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Stack Composition
//!
//! Composition is a pure function of its props and lookup context. These
//! tests check that derived names, the owned/shared resource split and the
//! declare-before-reference order hold for every generated input.

use cim_cloud_stacks::domain::{GroupName, ResourceKind, ZoneCount};
use cim_cloud_stacks::stacks::{ApplicationStackProps, WebsiteStackProps};
use cim_cloud_stacks::synth;
use cim_cloud_stacks::{ApplicationStack, Expr, NetworkMode, ResourceGraph, WebsiteBucketStack};
use proptest::prelude::*;

use crate::fixtures::{context, environment};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate valid group names
fn group_name() -> impl Strategy<Value = GroupName> {
    "[a-z0-9]([a-z0-9-]{0,38}[a-z0-9])?"
        .prop_map(|name| GroupName::new(name).expect("strategy yields valid names"))
}

/// Generate names breaking at least one group name rule
fn invalid_group_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Z][a-z0-9]{0,10}",
        "-[a-z0-9]{1,10}",
        "[a-z0-9]{1,10}-",
        "[a-z0-9]{1,5}_[a-z0-9]{1,5}",
        "[a-z0-9]{41,60}",
    ]
}

fn network_mode() -> impl Strategy<Value = NetworkMode> {
    prop_oneof![Just(NetworkMode::OwnedNetwork), Just(NetworkMode::SharedNetwork)]
}

fn zone_count() -> impl Strategy<Value = ZoneCount> {
    (1u8..=3).prop_map(|count| ZoneCount::new(count).expect("strategy yields valid counts"))
}

fn compose_application(group: GroupName, mode: NetworkMode, azs: ZoneCount) -> ResourceGraph {
    let props = ApplicationStackProps {
        environment: environment(),
        mode,
        max_azs: azs,
        ..ApplicationStackProps::new(group)
    };
    ApplicationStack::compose(&props, &context()).expect("generated props compose")
}

fn compose_website(group: GroupName) -> ResourceGraph {
    let props = WebsiteStackProps {
        environment: environment(),
        ..WebsiteStackProps::new(group)
    };
    WebsiteBucketStack::compose(&props).expect("generated props compose")
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Group names outside the naming rules are rejected
    #[test]
    fn prop_invalid_group_names_rejected(name in invalid_group_name()) {
        prop_assert!(GroupName::new(name).is_err());
    }

    /// Property: Every group-derived name embeds the group
    #[test]
    fn prop_derived_names_follow_group(group in group_name()) {
        let website = compose_website(group.clone());
        let bucket = website
            .resources_of_kind(ResourceKind::Bucket)
            .next()
            .expect("bucket declared");
        prop_assert_eq!(
            bucket.get("BucketName"),
            Some(&Expr::str(format!("{}-website", group)))
        );
        prop_assert_eq!(
            website.output("websiteBucketOutput").and_then(|o| o.export_name.clone()),
            Some(format!("{}-s3-demo-url", group))
        );

        let application = compose_application(
            group.clone(),
            NetworkMode::SharedNetwork,
            ZoneCount::default(),
        );
        let record = application
            .resources_of_kind(ResourceKind::RecordSet)
            .next()
            .expect("record declared");
        prop_assert_eq!(
            record.get("Name"),
            Some(&Expr::str(format!("{}-api.cloud-ha.com.", group)))
        );

        let owned = compose_application(group.clone(), NetworkMode::OwnedNetwork, ZoneCount::default());
        let secret = owned
            .resources_of_kind(ResourceKind::Secret)
            .next()
            .expect("secret declared");
        let secret_name = format!("{}-postgres-credentials", group);
        prop_assert_eq!(secret.get("Name"), Some(&Expr::str(secret_name.clone())));

        let instance = owned
            .resources_of_kind(ResourceKind::Instance)
            .next()
            .expect("instance declared");
        let user_data = instance.get("UserData").expect("user data").to_string();
        let secret_id = format!("--secret-id {} ", secret_name);
        prop_assert!(user_data.contains(&secret_id));
    }

    /// Property: Only the owned variant carries network, database and secret
    #[test]
    fn prop_variant_shape(group in group_name(), mode in network_mode(), azs in zone_count()) {
        let graph = compose_application(group, mode, azs);
        let owned = usize::from(mode == NetworkMode::OwnedNetwork);

        prop_assert_eq!(graph.count_of_kind(ResourceKind::Vpc), owned);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::DbInstance), owned);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::Secret), owned);
        prop_assert_eq!(graph.outputs().len(), owned);

        prop_assert_eq!(graph.count_of_kind(ResourceKind::Instance), 1);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::LoadBalancer), 1);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::Listener), 1);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::RecordSet), 1);
    }

    /// Property: An owned network spans exactly the requested zones
    #[test]
    fn prop_owned_network_spans_zones(azs in zone_count()) {
        let graph = compose_application(
            GroupName::new("team7").expect("valid group"),
            NetworkMode::OwnedNetwork,
            azs,
        );
        let zones = usize::from(azs.value());

        prop_assert_eq!(graph.count_of_kind(ResourceKind::Subnet), zones * 2);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::NatGateway), zones);
        let lb = graph
            .resources_of_kind(ResourceKind::LoadBalancer)
            .next()
            .expect("load balancer declared");
        prop_assert_eq!(lb.depends_on.len(), zones);
    }

    /// Property: Every reference points at something declared earlier
    #[test]
    fn prop_references_precede_use(group in group_name(), mode in network_mode(), azs in zone_count()) {
        let graph = compose_application(group, mode, azs);

        for (position, descriptor) in graph.resources().iter().enumerate() {
            for reference in descriptor.references() {
                if graph.parameters().iter().any(|p| &p.logical_id == reference) {
                    continue;
                }
                let target = graph.position(reference);
                prop_assert!(target.is_some(), "{} references undeclared {}", descriptor.path, reference);
                prop_assert!(target < Some(position), "{} references {} declared later", descriptor.path, reference);
            }
        }
    }

    /// Property: Logical ids are unique and alphanumeric
    #[test]
    fn prop_logical_ids_well_formed(group in group_name(), mode in network_mode()) {
        let graph = compose_application(group, mode, ZoneCount::default());
        let template = synth::synthesize(&graph).expect("graph synthesizes");

        prop_assert_eq!(template.resources.len(), graph.len());
        for id in template.resources.keys() {
            prop_assert!(!id.is_empty() && id.len() <= 255);
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "bad logical id {}", id);
        }
    }

    /// Property: Synthesis is deterministic
    #[test]
    fn prop_synthesis_is_deterministic(group in group_name(), mode in network_mode(), azs in zone_count()) {
        let first = synth::synthesize_json(&compose_application(group.clone(), mode, azs))
            .expect("graph synthesizes");
        let second = synth::synthesize_json(&compose_application(group, mode, azs))
            .expect("graph synthesizes");

        prop_assert_eq!(first, second, "Same props must produce the same template");
    }
}
