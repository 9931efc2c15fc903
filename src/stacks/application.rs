// Copyright (c) 2025 - Cowboy AI, Inc.
//! Containerized Application Stack
//!
//! One instance running the application container behind an internet-facing
//! load balancer, reachable under `<group>-api.<zone>`. The network mode
//! decides where the instance lives and whether the stack owns a database:
//!
//! | | Owned network | Shared network |
//! |---|---|---|
//! | VPC | declared, public + private subnets | default VPC, looked up |
//! | Database + secret | PostgreSQL in private subnets | none |
//! | Bootstrap | fetches DB password, passes DB settings | runs the image as is |
//! | Outputs | `database-endpoint` | none |

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::domain::{GroupName, Port, SubnetType, ZoneCount};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::{Expr, PseudoParameter};
use crate::graph::{LogicalId, OutputValue, RemovalPolicy, ResourceGraph};
use crate::lookup::LookupProvider;
use crate::resources::compute::{declare_instance, InstanceConfig, InstanceType, UserData};
use crate::resources::database::{
    declare_database_instance, DatabaseEngine, DatabaseHandle, DatabaseInstanceConfig,
    PostgresVersion,
};
use crate::resources::dns::{declare_a_record, AliasRecordConfig, AliasTarget, HostedZoneSource};
use crate::resources::iam::{declare_role, ManagedPolicy, RoleConfig};
use crate::resources::load_balancer::{
    declare_listener, declare_load_balancer, ListenerConfig, LoadBalancerConfig, Target,
    TargetGroupConfig,
};
use crate::resources::network::{declare_vpc, import_default_vpc, NetworkBoundary, VpcConfig};
use crate::resources::secret::{declare_secret, SecretConfig, SecretStringGenerator};
use crate::resources::security::{
    declare_ingress, declare_security_group, IngressRule, Peer, SecurityGroupConfig,
};

use super::{NetworkMode, StackEnvironment};

pub const DEFAULT_STACK_NAME: &str = "EC2DockerApplicationStack";
pub const DEFAULT_HOSTED_ZONE_ID: &str = "Z0413857YT73A0A8FRFF";
pub const DEFAULT_ZONE_NAME: &str = "cloud-ha.com";
pub const DEFAULT_IMAGE: &str = "292370674225.dkr.ecr.eu-north-1.amazonaws.com/webshop-api:latest";

/// Database user baked into the credential template and the container env
pub const DATABASE_USERNAME: &str = "master";

const CONTAINER_NAME: &str = "my-application";
const SPRING_PROFILE: &str = "postgres";
const HTTP_PORT: u16 = 80;

const INSTANCE_SECURITY_GROUP: &str = "InstanceSecurityGroup";
const DATABASE_SECURITY_GROUP: &str = "DatabaseSecurityGroup";

/// Container image in a registry, `<registry>/<repository>:<tag>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerImage {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl ContainerImage {
    pub fn uri(&self) -> String {
        format!("{}/{}:{}", self.registry, self.repository, self.tag)
    }

    /// Region of a private registry host such as
    /// `292370674225.dkr.ecr.eu-north-1.amazonaws.com`
    pub fn registry_region(&self) -> Option<&str> {
        let labels: Vec<&str> = self.registry.split('.').collect();
        match labels.as_slice() {
            [_, "dkr", "ecr", region, "amazonaws", ..] => Some(*region),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

impl FromStr for ContainerImage {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            SynthesisError::InvalidConfiguration(format!(
                "container image '{}' must look like <registry>/<repository>[:<tag>]",
                s
            ))
        };

        let (registry, rest) = s.split_once('/').ok_or_else(invalid)?;
        let (repository, tag) = match rest.rsplit_once(':') {
            Some((repository, tag)) => (repository, tag),
            None => (rest, "latest"),
        };

        if registry.is_empty() || !registry.contains('.') || repository.is_empty() || tag.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl Default for ContainerImage {
    fn default() -> Self {
        Self {
            registry: "292370674225.dkr.ecr.eu-north-1.amazonaws.com".to_string(),
            repository: "webshop-api".to_string(),
            tag: "latest".to_string(),
        }
    }
}

/// Inputs of the application stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStackProps {
    pub stack_name: String,
    pub group: GroupName,
    pub environment: StackEnvironment,
    pub mode: NetworkMode,
    pub hosted_zone: HostedZoneSource,
    pub image: ContainerImage,
    /// Zones an owned network spans
    pub max_azs: ZoneCount,
    /// Physical name of the credential secret (owned network only),
    /// default `<group>-postgres-credentials`
    pub secret_name: String,
    pub instance_type: InstanceType,
    pub database_version: PostgresVersion,
    pub database_storage_gib: u32,
    /// Port the container listens on; published on port 80
    pub container_port: u16,
}

impl ApplicationStackProps {
    pub fn new(group: GroupName) -> Self {
        let secret_name = group.database_secret_name();
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            group,
            environment: StackEnvironment::default(),
            mode: NetworkMode::default(),
            hosted_zone: HostedZoneSource::Attributes {
                zone_id: DEFAULT_HOSTED_ZONE_ID.to_string(),
                zone_name: DEFAULT_ZONE_NAME.to_string(),
            },
            image: ContainerImage::default(),
            max_azs: ZoneCount::default(),
            secret_name,
            instance_type: InstanceType::default(),
            database_version: PostgresVersion::V12_5,
            database_storage_gib: 20,
            container_port: 8080,
        }
    }
}

/// Composer of the application stack
pub struct ApplicationStack;

impl ApplicationStack {
    pub fn compose(
        props: &ApplicationStackProps,
        lookups: &dyn LookupProvider,
    ) -> SynthesisResult<ResourceGraph> {
        info!(
            stack = %props.stack_name,
            group = %props.group,
            mode = %props.mode,
            environment = %props.environment,
            "Composing application stack"
        );

        let zone = props.hosted_zone.resolve(lookups)?;

        let mut graph = ResourceGraph::new(&props.stack_name, props.environment.clone())
            .with_description(format!(
                "Containerized application for group {} ({} network)",
                props.group, props.mode
            ));

        let network = match props.mode {
            NetworkMode::OwnedNetwork => declare_vpc(
                &mut graph,
                "Vpc",
                &VpcConfig {
                    max_azs: props.max_azs,
                    ..VpcConfig::default()
                },
            )?,
            NetworkMode::SharedNetwork => import_default_vpc(lookups, &props.environment)?,
        };

        let instance_sg = declare_security_group(
            &mut graph,
            INSTANCE_SECURITY_GROUP,
            &network,
            &SecurityGroupConfig::default(),
        )?;

        let role = declare_role(
            &mut graph,
            "InstanceRole",
            &RoleConfig {
                managed_policies: vec![
                    ManagedPolicy::aws_managed("AmazonSSMManagedInstanceCore")?,
                    ManagedPolicy::aws_managed("AmazonEC2ContainerRegistryReadOnly")?,
                ],
                ..RoleConfig::for_service("ec2.amazonaws.com")
            },
        )?;

        let database = match props.mode {
            NetworkMode::OwnedNetwork => Some(declare_database(
                &mut graph,
                props,
                &network,
                &instance_sg,
            )?),
            NetworkMode::SharedNetwork => None,
        };

        let user_data = bootstrap(props, database.as_ref())?;

        let instance = declare_instance(
            &mut graph,
            "Instance",
            &network,
            &InstanceConfig {
                instance_type: props.instance_type,
                subnet_type: SubnetType::Public,
                user_data,
                ..InstanceConfig::new(instance_sg.clone(), role)
            },
        )?;

        let load_balancer = declare_load_balancer(
            &mut graph,
            "LoadBalancer",
            INSTANCE_SECURITY_GROUP,
            &network,
            &LoadBalancerConfig {
                internet_facing: true,
                ..LoadBalancerConfig::new(instance_sg)
            },
        )?;

        declare_listener(
            &mut graph,
            &load_balancer,
            "Listener",
            &network,
            &ListenerConfig::new(
                HTTP_PORT,
                TargetGroupConfig::new(HTTP_PORT, vec![Target::Instance(instance)]),
            ),
        )?;

        declare_a_record(
            &mut graph,
            "ARecord",
            &AliasRecordConfig {
                zone,
                record_name: props.group.dns_record_name(),
                target: AliasTarget::LoadBalancer(load_balancer),
            },
        )?;

        if let Some(database) = &database {
            graph.add_output(
                OutputValue::new("database-endpoint", database.endpoint_address())?
                    .description("Database Endpoint: "),
            )?;
        }

        graph.validate()?;

        info!(
            stack = %props.stack_name,
            resources = graph.len(),
            parameters = graph.parameters().len(),
            outputs = graph.outputs().len(),
            "Composed application stack"
        );

        Ok(graph)
    }
}

/// Credential secret, database security group and the database itself
fn declare_database(
    graph: &mut ResourceGraph,
    props: &ApplicationStackProps,
    network: &NetworkBoundary,
    instance_sg: &LogicalId,
) -> SynthesisResult<DatabaseHandle> {
    let secret = declare_secret(
        graph,
        "DatabaseSecret",
        &SecretConfig {
            name: Some(props.secret_name.clone()),
            description: Some("Postgres credentials".to_string()),
            ..SecretConfig::new(SecretStringGenerator {
                password_length: 16,
                exclude_characters: "/@\" ".to_string(),
                ..SecretStringGenerator::credentials(DATABASE_USERNAME, "password")
            })
        },
    )?;

    let engine = DatabaseEngine::Postgres(props.database_version);
    let database_sg = declare_security_group(
        graph,
        DATABASE_SECURITY_GROUP,
        network,
        &SecurityGroupConfig::default(),
    )?;
    declare_ingress(
        graph,
        DATABASE_SECURITY_GROUP,
        &database_sg,
        &IngressRule::new(
            Peer::SecurityGroup(instance_sg.clone()),
            Port::tcp(engine.default_port())?,
        )
        .with_description("Allow postgres access from EC2"),
    )?;

    declare_database_instance(
        graph,
        "Database",
        network,
        &DatabaseInstanceConfig {
            instance_type: props.instance_type,
            allocated_storage_gib: props.database_storage_gib,
            subnet_type: SubnetType::PrivateWithEgress,
            removal_policy: RemovalPolicy::Destroy,
            ..DatabaseInstanceConfig::new(engine, secret, vec![database_sg])
        },
    )
}

/// First-boot script: install docker, log in to the registry, run the image
fn bootstrap(
    props: &ApplicationStackProps,
    database: Option<&DatabaseHandle>,
) -> SynthesisResult<UserData> {
    let registry_region = props
        .image
        .registry_region()
        .map(str::to_string)
        .or_else(|| props.environment.region.clone())
        .ok_or_else(|| {
            SynthesisError::InvalidConfiguration(format!(
                "cannot determine the region of registry {}",
                props.image.registry
            ))
        })?;

    let mut user_data = UserData::new();
    user_data
        .add_command("yum install docker -y")
        .add_command("sudo systemctl start docker")
        .add_command(format!(
            "aws ecr get-login-password --region {} | docker login --username AWS --password-stdin {}",
            registry_region, props.image.registry
        ));

    let publish = format!(
        "docker run -d --name {} -p {}:{}",
        CONTAINER_NAME, HTTP_PORT, props.container_port
    );

    match database {
        Some(database) => {
            // The secret lives in the stack's own region
            let stack_region = match &props.environment.region {
                Some(region) => Expr::str(region.clone()),
                None => Expr::pseudo(PseudoParameter::Region),
            };
            user_data.add_command(Expr::concat([
                Expr::str(format!(
                    "DB_PASSWORD=$(aws secretsmanager get-secret-value --secret-id {} --query SecretString --output text --region ",
                    props.secret_name
                )),
                stack_region,
                Expr::str(" | jq -r .password)"),
            ]));
            user_data.add_command(Expr::concat([
                Expr::str(format!("{} -e DB_URL=", publish)),
                database.jdbc_url(),
                Expr::str(format!(
                    " -e DB_USERNAME={} -e DB_PASSWORD=$DB_PASSWORD -e SPRING_PROFILES_ACTIVE={} {}",
                    DATABASE_USERNAME,
                    SPRING_PROFILE,
                    props.image.uri()
                )),
            ]));
        }
        None => {
            user_data.add_command(format!("{} {}", publish, props.image.uri()));
        }
    }

    Ok(user_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;
    use crate::lookup::ContextLookup;

    fn props(mode: NetworkMode) -> ApplicationStackProps {
        ApplicationStackProps {
            environment: StackEnvironment::new("292370674225", "eu-north-1"),
            mode,
            ..ApplicationStackProps::new(GroupName::new("acme").unwrap())
        }
    }

    fn shared_context() -> ContextLookup {
        ContextLookup::from_json(
            r#"{"vpcs": [{"account": "292370674225", "region": "eu-north-1", "is_default": true,
                "vpc_id": "vpc-0default", "subnets": [
                    {"subnet_id": "subnet-a", "availability_zone": "eu-north-1a", "subnet_type": "public"},
                    {"subnet_id": "subnet-b", "availability_zone": "eu-north-1b", "subnet_type": "public"}
                ]}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_container_image_parsing() {
        let image: ContainerImage = DEFAULT_IMAGE.parse().unwrap();
        assert_eq!(image, ContainerImage::default());
        assert_eq!(image.registry_region(), Some("eu-north-1"));
        assert_eq!(image.uri(), DEFAULT_IMAGE);

        let untagged: ContainerImage = "registry.example.com/team/app".parse().unwrap();
        assert_eq!(untagged.tag, "latest");
        assert_eq!(untagged.registry_region(), None);

        assert!("no-registry".parse::<ContainerImage>().is_err());
        assert!("registry.example.com/".parse::<ContainerImage>().is_err());
    }

    #[test]
    fn test_owned_bootstrap_lines() {
        let graph = ApplicationStack::compose(&props(NetworkMode::OwnedNetwork), &ContextLookup::empty())
            .unwrap();
        let database = graph
            .resources_of_kind(ResourceKind::DbInstance)
            .next()
            .unwrap()
            .logical_id
            .clone();
        let instance = graph.resources_of_kind(ResourceKind::Instance).next().unwrap();
        let script = instance.get("UserData").unwrap().to_string();

        let expected = [
            "#!/bin/bash".to_string(),
            "yum install docker -y".to_string(),
            "sudo systemctl start docker".to_string(),
            "aws ecr get-login-password --region eu-north-1 | docker login --username AWS --password-stdin 292370674225.dkr.ecr.eu-north-1.amazonaws.com".to_string(),
            "DB_PASSWORD=$(aws secretsmanager get-secret-value --secret-id acme-postgres-credentials --query SecretString --output text --region eu-north-1 | jq -r .password)".to_string(),
            format!(
                "docker run -d --name my-application -p 80:8080 -e DB_URL=jdbc:postgresql://${{{}.Endpoint.Address}}:5432 -e DB_USERNAME=master -e DB_PASSWORD=$DB_PASSWORD -e SPRING_PROFILES_ACTIVE=postgres 292370674225.dkr.ecr.eu-north-1.amazonaws.com/webshop-api:latest",
                database
            ),
        ]
        .join("\n");
        assert_eq!(script, expected);
    }

    #[test]
    fn test_shared_bootstrap_is_static() {
        let graph = ApplicationStack::compose(&props(NetworkMode::SharedNetwork), &shared_context())
            .unwrap();
        let instance = graph.resources_of_kind(ResourceKind::Instance).next().unwrap();
        let user_data = instance.get("UserData").unwrap();

        assert!(!user_data.is_deferred());
        assert!(user_data
            .to_string()
            .ends_with("docker run -d --name my-application -p 80:8080 292370674225.dkr.ecr.eu-north-1.amazonaws.com/webshop-api:latest"));
        assert!(!user_data.to_string().contains("DB_"));
    }

    #[test]
    fn test_agnostic_environment_uses_region_placeholder() {
        let props = ApplicationStackProps::new(GroupName::new("acme").unwrap());
        let graph = ApplicationStack::compose(&props, &ContextLookup::empty()).unwrap();
        let instance = graph.resources_of_kind(ResourceKind::Instance).next().unwrap();
        assert!(instance
            .get("UserData")
            .unwrap()
            .to_string()
            .contains("--output text --region ${AWS::Region} | jq -r .password)"));
    }

    #[test]
    fn test_shared_mode_requires_default_vpc() {
        let err = ApplicationStack::compose(&props(NetworkMode::SharedNetwork), &ContextLookup::empty())
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Lookup(_)));
    }

    #[test]
    fn test_hosted_zone_lookup_failure_aborts() {
        let props = ApplicationStackProps {
            hosted_zone: HostedZoneSource::Lookup {
                domain_name: "missing.example".to_string(),
            },
            ..props(NetworkMode::OwnedNetwork)
        };
        assert!(matches!(
            ApplicationStack::compose(&props, &ContextLookup::empty()),
            Err(SynthesisError::Lookup(_))
        ));
    }
}
