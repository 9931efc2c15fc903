// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Instances and Bootstrap Scripts

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::domain::invariants::ValidationError;
use crate::domain::{ResourceKind, SubnetType};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, Parameter, ResourceGraph};

use super::iam::declare_instance_profile;
use super::network::NetworkBoundary;
use super::tags;

/// Instance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceClass {
    Burstable3,
    Burstable3Amd,
    Burstable4Graviton,
    Standard5,
    MemoryOptimized5,
}

impl InstanceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burstable3 => "t3",
            Self::Burstable3Amd => "t3a",
            Self::Burstable4Graviton => "t4g",
            Self::Standard5 => "m5",
            Self::MemoryOptimized5 => "r5",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    XLarge,
}

impl InstanceSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::XLarge => "xlarge",
        }
    }
}

/// Instance class and size, e.g. `t3.micro`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceType {
    pub class: InstanceClass,
    pub size: InstanceSize,
}

impl InstanceType {
    pub fn new(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }

    /// Database instance class name, e.g. `db.t3.micro`
    pub fn db_class(&self) -> String {
        format!("db.{}", self)
    }
}

impl Default for InstanceType {
    fn default() -> Self {
        Self::new(InstanceClass::Burstable3, InstanceSize::Micro)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidName {
            kind: "instance type".to_string(),
            name: s.to_string(),
            reason: "expected <class>.<size>, e.g. t3.micro".to_string(),
        };

        let (class, size) = s.split_once('.').ok_or_else(invalid)?;
        let class = [
            InstanceClass::Burstable3,
            InstanceClass::Burstable3Amd,
            InstanceClass::Burstable4Graviton,
            InstanceClass::Standard5,
            InstanceClass::MemoryOptimized5,
        ]
        .into_iter()
        .find(|c| c.as_str() == class)
        .ok_or_else(invalid)?;
        let size = [
            InstanceSize::Nano,
            InstanceSize::Micro,
            InstanceSize::Small,
            InstanceSize::Medium,
            InstanceSize::Large,
            InstanceSize::XLarge,
        ]
        .into_iter()
        .find(|z| z.as_str() == size)
        .ok_or_else(invalid)?;

        Ok(Self::new(class, size))
    }
}

/// Machine image an instance boots from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineImage {
    /// Latest Amazon Linux 2, resolved at deploy time from a public parameter
    LatestAmazonLinux2,
    /// A fixed image id
    Ami(String),
}

impl MachineImage {
    pub const AMAZON_LINUX_2_PARAMETER: &'static str =
        "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2";

    const IMAGE_PARAMETER_TYPE: &'static str = "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>";

    /// Image id value; parameter-backed images declare their parameter once
    fn image_id(&self, graph: &mut ResourceGraph) -> SynthesisResult<Expr> {
        match self {
            Self::Ami(id) => Ok(Expr::str(id.clone())),
            Self::LatestAmazonLinux2 => {
                let logical_id = LogicalId::from_path(&format!(
                    "SsmParameterValue{}/Parameter",
                    Self::AMAZON_LINUX_2_PARAMETER
                ))?;
                if !graph.contains(&logical_id) {
                    graph.add_parameter(Parameter {
                        logical_id: logical_id.clone(),
                        parameter_type: Self::IMAGE_PARAMETER_TYPE.to_string(),
                        default: Self::AMAZON_LINUX_2_PARAMETER.to_string(),
                        description: None,
                    })?;
                }
                Ok(Expr::reference(&logical_id))
            }
        }
    }
}

/// Shell script run once at first boot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    lines: Vec<Expr>,
}

impl UserData {
    pub const SHEBANG: &'static str = "#!/bin/bash";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: impl Into<Expr>) -> &mut Self {
        self.lines.push(command.into());
        self
    }

    pub fn lines(&self) -> &[Expr] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Script text; deferred values stay as `${...}` placeholders
    pub fn script(&self) -> String {
        std::iter::once(Self::SHEBANG.to_string())
            .chain(self.lines.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Base64-encoded script value for the instance
    pub fn render(&self) -> Expr {
        let mut parts = vec![Expr::str(Self::SHEBANG)];
        for line in &self.lines {
            parts.push(Expr::str("\n"));
            parts.push(line.clone());
        }
        Expr::base64(Expr::concat(parts))
    }
}

/// Instance configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Default `t3.micro`
    pub instance_type: InstanceType,
    /// Default latest Amazon Linux 2
    pub machine_image: MachineImage,
    /// Placement; the first selected subnet is used (default public)
    pub subnet_type: SubnetType,
    pub security_group: LogicalId,
    pub role: LogicalId,
    pub user_data: UserData,
}

impl InstanceConfig {
    pub fn new(security_group: LogicalId, role: LogicalId) -> Self {
        Self {
            instance_type: InstanceType::default(),
            machine_image: MachineImage::LatestAmazonLinux2,
            subnet_type: SubnetType::Public,
            security_group,
            role,
            user_data: UserData::new(),
        }
    }
}

/// Handle to a declared instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    pub logical_id: LogicalId,
    pub instance_profile: LogicalId,
    pub security_group: LogicalId,
}

pub fn declare_instance(
    graph: &mut ResourceGraph,
    path: &str,
    network: &NetworkBoundary,
    config: &InstanceConfig,
) -> SynthesisResult<InstanceHandle> {
    let subnet = network
        .select(config.subnet_type)?
        .into_iter()
        .next()
        .cloned()
        .ok_or_else(|| {
            SynthesisError::InvalidConfiguration(format!("no subnet to place {}", path))
        })?;

    let image_id = config.machine_image.image_id(graph)?;
    let instance_profile =
        declare_instance_profile(graph, &format!("{}/InstanceProfile", path), &config.role)?;

    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::Instance)?
            .property("AvailabilityZone", subnet.availability_zone)
            .property("IamInstanceProfile", &instance_profile)
            .property("ImageId", image_id)
            .property("InstanceType", config.instance_type.to_string())
            .property(
                "SecurityGroupIds",
                Expr::list([Expr::get_att(&config.security_group, "GroupId")]),
            )
            .property("SubnetId", subnet.subnet_id)
            .property("Tags", tags([("Name", Expr::str(path))]))
            .property("UserData", config.user_data.render())
            .depends_on(&config.role),
    )?;

    info!(
        instance = %logical_id,
        instance_type = %config.instance_type,
        bootstrap_lines = config.user_data.lines().len(),
        "Declared instance"
    );

    Ok(InstanceHandle {
        logical_id,
        instance_profile,
        security_group: config.security_group.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::iam::{declare_role, RoleConfig};
    use crate::resources::network::{declare_vpc, VpcConfig};
    use crate::resources::security::{declare_security_group, SecurityGroupConfig};
    use crate::stacks::StackEnvironment;
    use test_case::test_case;

    fn setup() -> (ResourceGraph, NetworkBoundary, InstanceConfig) {
        let mut graph = ResourceGraph::new("ComputeTest", StackEnvironment::default());
        let network = declare_vpc(&mut graph, "Vpc", &VpcConfig::default()).unwrap();
        let sg = declare_security_group(&mut graph, "Sg", &network, &SecurityGroupConfig::default())
            .unwrap();
        let role = declare_role(&mut graph, "Role", &RoleConfig::for_service("ec2.amazonaws.com"))
            .unwrap();
        (graph, network, InstanceConfig::new(sg, role))
    }

    #[test_case("t3.micro", InstanceClass::Burstable3, InstanceSize::Micro ; "t3 micro")]
    #[test_case("t4g.large", InstanceClass::Burstable4Graviton, InstanceSize::Large ; "graviton large")]
    #[test_case("r5.xlarge", InstanceClass::MemoryOptimized5, InstanceSize::XLarge ; "memory xlarge")]
    fn test_instance_type_parsing(s: &str, class: InstanceClass, size: InstanceSize) {
        let parsed: InstanceType = s.parse().unwrap();
        assert_eq!(parsed, InstanceType::new(class, size));
        assert_eq!(parsed.to_string(), s);
    }

    #[test]
    fn test_instance_type_invalid() {
        assert!("t3".parse::<InstanceType>().is_err());
        assert!("x9.micro".parse::<InstanceType>().is_err());
        assert!("t3.huge".parse::<InstanceType>().is_err());
        assert_eq!(InstanceType::default().db_class(), "db.t3.micro");
    }

    #[test]
    fn test_user_data_render() {
        let mut user_data = UserData::new();
        user_data
            .add_command("yum install docker -y")
            .add_command("sudo systemctl start docker");

        assert_eq!(
            user_data.script(),
            "#!/bin/bash\nyum install docker -y\nsudo systemctl start docker"
        );
        assert_eq!(
            user_data.render(),
            Expr::base64(Expr::str(
                "#!/bin/bash\nyum install docker -y\nsudo systemctl start docker"
            ))
        );
    }

    #[test]
    fn test_declare_instance() {
        let (mut graph, network, mut config) = setup();
        config.user_data.add_command("echo hello");
        let instance = declare_instance(&mut graph, "Instance", &network, &config).unwrap();

        assert_eq!(graph.parameters().len(), 1);
        assert_eq!(
            graph.parameters()[0].default,
            MachineImage::AMAZON_LINUX_2_PARAMETER
        );

        let descriptor = graph.get(&instance.logical_id).unwrap();
        assert_eq!(descriptor.get("InstanceType"), Some(&Expr::str("t3.micro")));
        assert_eq!(
            descriptor.get("SubnetId"),
            Some(&network.select(SubnetType::Public).unwrap()[0].subnet_id)
        );
        assert!(descriptor.depends_on.contains(&config.role));
        assert!(graph.position(&instance.instance_profile) < graph.position(&instance.logical_id));
    }

    #[test]
    fn test_image_parameter_declared_once() {
        let (mut graph, network, config) = setup();
        declare_instance(&mut graph, "First", &network, &config).unwrap();
        declare_instance(&mut graph, "Second", &network, &config).unwrap();
        assert_eq!(graph.parameters().len(), 1);
        assert_eq!(graph.count_of_kind(ResourceKind::Instance), 2);
    }

    #[test]
    fn test_fixed_ami() {
        let (mut graph, network, config) = setup();
        let config = InstanceConfig {
            machine_image: MachineImage::Ami("ami-0123456789".to_string()),
            ..config
        };
        let instance = declare_instance(&mut graph, "Instance", &network, &config).unwrap();
        assert!(graph.parameters().is_empty());
        assert_eq!(
            graph.get(&instance.logical_id).unwrap().get("ImageId"),
            Some(&Expr::str("ami-0123456789"))
        );
    }
}
