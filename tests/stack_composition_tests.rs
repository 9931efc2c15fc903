// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Composition Tests
//!
//! Composes both stacks from fixtures and checks the declared resources,
//! derived names and declaration order of the resulting graphs.

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use cim_cloud_stacks::domain::{GroupName, ResourceCategory, ResourceKind};
use cim_cloud_stacks::resources::dns::HostedZoneSource;
use cim_cloud_stacks::resources::storage::WebsiteReadAccess;
use cim_cloud_stacks::stacks::{ApplicationStackProps, WebsiteStackProps};
use cim_cloud_stacks::{
    ApplicationStack, ContextLookup, Expr, NetworkMode, SynthesisError, WebsiteBucketStack,
};

use fixtures::*;

#[test_case(NetworkMode::OwnedNetwork, ResourceKind::Vpc, 1 ; "owned vpc")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::Subnet, 6 ; "owned subnets")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::NatGateway, 3 ; "owned nat gateways")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::SecurityGroup, 2 ; "owned security groups")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::SecurityGroupIngress, 3 ; "owned ingress rules")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::Secret, 1 ; "owned secret")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::SecretTargetAttachment, 1 ; "owned secret attachment")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::DbInstance, 1 ; "owned database")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::Instance, 1 ; "owned instance")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::LoadBalancer, 1 ; "owned load balancer")]
#[test_case(NetworkMode::OwnedNetwork, ResourceKind::RecordSet, 1 ; "owned record")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::Vpc, 0 ; "shared vpc")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::Subnet, 0 ; "shared subnets")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::SecurityGroup, 1 ; "shared security groups")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::SecurityGroupIngress, 2 ; "shared ingress rules")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::Secret, 0 ; "shared secret")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::DbInstance, 0 ; "shared database")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::Instance, 1 ; "shared instance")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::LoadBalancer, 1 ; "shared load balancer")]
#[test_case(NetworkMode::SharedNetwork, ResourceKind::RecordSet, 1 ; "shared record")]
fn test_application_resource_counts(mode: NetworkMode, kind: ResourceKind, expected: usize) {
    let graph = application_graph(mode);
    assert_eq!(graph.count_of_kind(kind), expected);
}

#[test_case(NetworkMode::OwnedNetwork, 2 ; "owned")]
#[test_case(NetworkMode::SharedNetwork, 0 ; "shared")]
fn test_database_and_secret_categories(mode: NetworkMode, expected: usize) {
    let graph = application_graph(mode);

    // Subnet group + instance, secret + attachment
    assert_eq!(graph.count_of_category(ResourceCategory::DataStore), expected);
    assert_eq!(graph.count_of_category(ResourceCategory::Secret), expected);
    assert_eq!(graph.count_of_category(ResourceCategory::Compute), 1);
    assert_eq!(graph.count_of_category(ResourceCategory::Dns), 1);

    let database = graph.find_by_path("Database/Resource");
    let secret = graph.find_by_path("DatabaseSecret/Resource");
    assert_eq!(database.map(|d| d.kind), (expected > 0).then_some(ResourceKind::DbInstance));
    assert_eq!(secret.map(|d| d.kind), (expected > 0).then_some(ResourceKind::Secret));
}

#[test_case(NetworkMode::OwnedNetwork ; "owned")]
#[test_case(NetworkMode::SharedNetwork ; "shared")]
fn test_application_references_point_backwards(mode: NetworkMode) {
    let graph = application_graph(mode);

    for (position, descriptor) in graph.resources().iter().enumerate() {
        for reference in descriptor.references() {
            if graph.parameters().iter().any(|p| &p.logical_id == reference) {
                continue;
            }
            let target = graph
                .position(reference)
                .unwrap_or_else(|| panic!("{} references undeclared {}", descriptor.path, reference));
            assert!(
                target < position,
                "{} references {} declared after it",
                descriptor.path,
                reference
            );
        }
    }
}

#[test]
fn test_database_after_secret_and_security_group() {
    let graph = application_graph(NetworkMode::OwnedNetwork);
    let position_of = |kind: ResourceKind| {
        graph
            .resources()
            .iter()
            .position(|d| d.kind == kind)
            .unwrap_or_else(|| panic!("no {:?} declared", kind))
    };

    assert!(position_of(ResourceKind::Secret) < position_of(ResourceKind::DbInstance));
    assert!(position_of(ResourceKind::DbSubnetGroup) < position_of(ResourceKind::DbInstance));
    assert!(position_of(ResourceKind::DbInstance) < position_of(ResourceKind::Instance));
    assert!(position_of(ResourceKind::TargetGroup) < position_of(ResourceKind::Listener));
    assert!(position_of(ResourceKind::LoadBalancer) < position_of(ResourceKind::RecordSet));
}

#[test]
fn test_database_endpoint_output_only_when_owned() {
    let owned = application_graph(NetworkMode::OwnedNetwork);
    let output = owned.output("database-endpoint").expect("owned stack exports the endpoint");
    let database = owned
        .resources_of_kind(ResourceKind::DbInstance)
        .next()
        .expect("owned stack declares a database");

    assert_eq!(output.description.as_deref(), Some("Database Endpoint: "));
    assert_eq!(output.value, Expr::get_att(&database.logical_id, "Endpoint.Address"));

    let shared = application_graph(NetworkMode::SharedNetwork);
    assert!(shared.outputs().is_empty());
}

#[test_case(NetworkMode::OwnedNetwork ; "owned")]
#[test_case(NetworkMode::SharedNetwork ; "shared")]
fn test_alias_record_name(mode: NetworkMode) {
    let graph = application_graph(mode);
    let record = graph
        .resources_of_kind(ResourceKind::RecordSet)
        .next()
        .expect("record declared");

    assert_eq!(record.get("Name"), Some(&Expr::str("team7-api.cloud-ha.com.")));
    assert_eq!(record.get("Type"), Some(&Expr::str("A")));
    assert_eq!(record.get("HostedZoneId"), Some(&Expr::str(ZONE_ID)));
}

#[test]
fn test_load_balancer_waits_for_public_routes() {
    let owned = application_graph(NetworkMode::OwnedNetwork);
    let lb = owned
        .resources_of_kind(ResourceKind::LoadBalancer)
        .next()
        .expect("load balancer declared");
    assert_eq!(lb.depends_on.len(), 3);
    for route in &lb.depends_on {
        assert_eq!(owned.get(route).map(|d| d.kind), Some(ResourceKind::Route));
    }

    let shared = application_graph(NetworkMode::SharedNetwork);
    let lb = shared
        .resources_of_kind(ResourceKind::LoadBalancer)
        .next()
        .expect("load balancer declared");
    assert!(lb.depends_on.is_empty());
    assert_eq!(lb.get("Scheme"), Some(&Expr::str("internet-facing")));
}

#[test]
fn test_shared_stack_uses_looked_up_network() {
    let graph = application_graph(NetworkMode::SharedNetwork);

    let sg = graph
        .resources_of_kind(ResourceKind::SecurityGroup)
        .next()
        .expect("security group declared");
    assert_eq!(sg.get("VpcId"), Some(&Expr::str(DEFAULT_VPC_ID)));

    let lb = graph
        .resources_of_kind(ResourceKind::LoadBalancer)
        .next()
        .expect("load balancer declared");
    assert_eq!(
        lb.get("Subnets").map(Expr::to_cfn),
        Some(json!(["subnet-0aaa", "subnet-0bbb", "subnet-0ccc"]))
    );
}

#[test]
fn test_hosted_zone_from_lookup() {
    let props = ApplicationStackProps {
        hosted_zone: HostedZoneSource::Lookup {
            domain_name: ZONE_NAME.to_string(),
        },
        ..application_props(NetworkMode::SharedNetwork)
    };
    let graph = ApplicationStack::compose(&props, &context()).expect("stack composes");
    let record = graph
        .resources_of_kind(ResourceKind::RecordSet)
        .next()
        .expect("record declared");

    assert_eq!(record.get("HostedZoneId"), Some(&Expr::str(ZONE_ID)));
    assert_eq!(record.get("Name"), Some(&Expr::str("team7-api.cloud-ha.com.")));
}

#[test]
fn test_shared_network_without_context_fails() {
    let result = ApplicationStack::compose(
        &application_props(NetworkMode::SharedNetwork),
        &ContextLookup::empty(),
    );
    assert!(matches!(result, Err(SynthesisError::Lookup(_))));
}

#[test]
fn test_shared_network_in_other_region_fails() {
    let props = ApplicationStackProps {
        environment: cim_cloud_stacks::StackEnvironment::new(ACCOUNT, "us-east-1"),
        ..application_props(NetworkMode::SharedNetwork)
    };
    assert!(ApplicationStack::compose(&props, &context()).is_err());
}

#[test]
fn test_website_stack_resources() {
    let graph = website_graph();

    assert_eq!(graph.len(), 3);
    let bucket = graph
        .resources_of_kind(ResourceKind::Bucket)
        .next()
        .expect("bucket declared");
    assert_eq!(bucket.get("BucketName"), Some(&Expr::str("team7-website")));
    assert_eq!(
        bucket.get("WebsiteConfiguration").map(Expr::to_cfn),
        Some(json!({"IndexDocument": "index.html"}))
    );

    let output = graph.output("websiteBucketOutput").expect("website output");
    assert_eq!(output.export_name.as_deref(), Some("team7-s3-demo-url"));
    assert_eq!(output.value, Expr::get_att(&bucket.logical_id, "WebsiteURL"));
}

#[test]
fn test_website_auto_delete_after_policy() {
    let graph = website_graph();
    let policy = graph
        .resources_of_kind(ResourceKind::BucketPolicy)
        .next()
        .expect("policy declared");
    let auto_delete = graph
        .resources_of_kind(ResourceKind::AutoDeleteObjects)
        .next()
        .expect("auto delete declared");

    assert!(auto_delete.depends_on.contains(&policy.logical_id));
    assert!(graph.position(&policy.logical_id) < graph.position(&auto_delete.logical_id));
}

#[test]
fn test_website_private_read_access_still_composes() {
    let props = WebsiteStackProps {
        read_access: WebsiteReadAccess::Private,
        ..website_props()
    };
    let graph = WebsiteBucketStack::compose(&props).expect("private website composes");
    assert_eq!(graph.count_of_kind(ResourceKind::Bucket), 1);
    assert!(graph.output("websiteBucketOutput").is_some());
}

#[test_case("a" ; "single character")]
#[test_case("group-7" ; "inner hyphen")]
#[test_case("0123456789012345678901234567890123456789" ; "longest")]
fn test_names_follow_group(name: &str) {
    let props = WebsiteStackProps {
        environment: environment(),
        ..WebsiteStackProps::new(GroupName::new(name).expect("valid group"))
    };
    let graph = WebsiteBucketStack::compose(&props).expect("website composes");
    let bucket = graph
        .resources_of_kind(ResourceKind::Bucket)
        .next()
        .expect("bucket declared");

    assert_eq!(
        bucket.get("BucketName"),
        Some(&Expr::str(format!("{}-website", name)))
    );
    assert_eq!(
        graph.output("websiteBucketOutput").and_then(|o| o.export_name.clone()),
        Some(format!("{}-s3-demo-url", name))
    );
}

#[test]
fn test_owned_secret_generation_policy() {
    let graph = application_graph(NetworkMode::OwnedNetwork);
    let secrets: Vec<_> = graph.resources_of_kind(ResourceKind::Secret).collect();
    assert_eq!(secrets.len(), 1);
    let secret = secrets[0];

    assert_eq!(secret.get("Name"), Some(&Expr::str("team7-postgres-credentials")));
    assert_eq!(secret.get("Description"), Some(&Expr::str("Postgres credentials")));
    assert_eq!(
        secret.get("GenerateSecretString").map(Expr::to_cfn),
        Some(json!({
            "SecretStringTemplate": "{\"username\":\"master\"}",
            "GenerateStringKey": "password",
            "PasswordLength": 16,
            "ExcludeCharacters": "/@\" "
        }))
    );

    let database = graph
        .resources_of_kind(ResourceKind::DbInstance)
        .next()
        .expect("database declared");
    let field = |key: &str| {
        Expr::concat([
            Expr::str("{{resolve:secretsmanager:"),
            Expr::reference(&secret.logical_id),
            Expr::str(format!(":SecretString:{}::}}}}", key)),
        ])
    };
    assert_eq!(database.get("MasterUsername"), Some(&field("username")));
    assert_eq!(database.get("MasterUserPassword"), Some(&field("password")));
}

#[test]
fn test_secret_names_differ_between_groups() {
    let secret_name = |group: &str| {
        let props = ApplicationStackProps {
            environment: environment(),
            ..ApplicationStackProps::new(GroupName::new(group).expect("valid group"))
        };
        let graph = ApplicationStack::compose(&props, &context()).expect("stack composes");
        let secret = graph
            .resources_of_kind(ResourceKind::Secret)
            .next()
            .expect("secret declared");
        let instance = graph
            .resources_of_kind(ResourceKind::Instance)
            .next()
            .expect("instance declared");
        let user_data = instance.get("UserData").expect("user data").to_string();
        let name = secret.get("Name").cloned();
        assert!(user_data.contains(&format!("--secret-id {}-postgres-credentials ", group)));
        name
    };

    let acme = secret_name("acme");
    let team7 = secret_name("team7");
    assert_eq!(acme, Some(Expr::str("acme-postgres-credentials")));
    assert_eq!(team7, Some(Expr::str("team7-postgres-credentials")));
    assert_ne!(acme, team7);
}
