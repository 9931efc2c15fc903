// Copyright (c) 2025 - Cowboy AI, Inc.
//! Roles, Managed Policies and Policy Documents

use std::collections::BTreeMap;

use crate::domain::invariants::{validate_managed_policy_name, ValidationResult};
use crate::domain::ResourceKind;
use crate::errors::SynthesisResult;
use crate::expr::{Expr, PseudoParameter};
use crate::graph::{Descriptor, LogicalId, ResourceGraph};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// Who a statement applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Anyone, authenticated or not
    Any,
    /// A service principal such as `ec2.amazonaws.com`
    Service(String),
}

impl Principal {
    fn to_expr(&self) -> Expr {
        match self {
            Self::Any => Expr::object([("AWS", Expr::str("*"))]),
            Self::Service(service) => Expr::object([("Service", Expr::str(service.clone()))]),
        }
    }
}

/// A single policy statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Expr>,
    pub principal: Option<Principal>,
    /// operator → (condition key → values)
    pub conditions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl PolicyStatement {
    pub fn allow(actions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: Vec::new(),
            principal: None,
            conditions: BTreeMap::new(),
        }
    }

    pub fn on(mut self, resource: Expr) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn for_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn to_expr(&self) -> Expr {
        let mut entries: BTreeMap<String, Expr> = BTreeMap::new();

        entries.insert("Effect".to_string(), Expr::str(self.effect.as_str()));
        entries.insert("Action".to_string(), single_or_list(
            self.actions.iter().map(|a| Expr::str(a.clone())).collect(),
        ));

        if !self.resources.is_empty() {
            entries.insert("Resource".to_string(), single_or_list(self.resources.clone()));
        }

        if let Some(principal) = &self.principal {
            entries.insert("Principal".to_string(), principal.to_expr());
        }

        if !self.conditions.is_empty() {
            entries.insert(
                "Condition".to_string(),
                Expr::object(self.conditions.iter().map(|(operator, keys)| {
                    (
                        operator.clone(),
                        Expr::object(keys.iter().map(|(key, values)| {
                            (
                                key.clone(),
                                single_or_list(values.iter().map(|v| Expr::str(v.clone())).collect()),
                            )
                        })),
                    )
                })),
            );
        }

        Expr::Object(entries)
    }
}

fn single_or_list(mut items: Vec<Expr>) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Expr::List(items)
    }
}

/// A policy document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn to_expr(&self) -> Expr {
        Expr::object([
            ("Statement", Expr::list(self.statements.iter().map(PolicyStatement::to_expr))),
            ("Version", Expr::str(POLICY_VERSION)),
        ])
    }
}

/// A provider managed policy, referenced by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPolicy(String);

impl ManagedPolicy {
    pub fn aws_managed(name: impl Into<String>) -> Result<Self, crate::domain::ValidationError> {
        let name = name.into();
        validate_managed_policy_name(&name)?;
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Partition-qualified policy ARN
    pub fn arn(&self) -> Expr {
        Expr::concat([
            Expr::str("arn:"),
            Expr::pseudo(PseudoParameter::Partition),
            Expr::str(format!(":iam::aws:policy/{}", self.0)),
        ])
    }
}

/// Role configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleConfig {
    /// Service allowed to assume the role
    pub assumed_by: String,
    pub managed_policies: Vec<ManagedPolicy>,
    pub description: Option<String>,
}

impl RoleConfig {
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            assumed_by: service.into(),
            managed_policies: Vec::new(),
            description: None,
        }
    }

    fn validate(&self) -> ValidationResult {
        if !self.assumed_by.ends_with(".amazonaws.com") {
            return Err(crate::domain::ValidationError::InvalidName {
                kind: "service principal".to_string(),
                name: self.assumed_by.clone(),
                reason: "expected a service domain such as ec2.amazonaws.com".to_string(),
            });
        }
        Ok(())
    }
}

pub fn declare_role(
    graph: &mut ResourceGraph,
    path: &str,
    config: &RoleConfig,
) -> SynthesisResult<LogicalId> {
    config.validate()?;

    let trust = PolicyDocument::new(vec![PolicyStatement::allow(["sts:AssumeRole"])
        .for_principal(Principal::Service(config.assumed_by.clone()))]);

    let managed = if config.managed_policies.is_empty() {
        None
    } else {
        Some(Expr::list(config.managed_policies.iter().map(ManagedPolicy::arn)))
    };

    graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::IamRole)?
            .property("AssumeRolePolicyDocument", trust.to_expr())
            .optional_property("ManagedPolicyArns", managed)
            .optional_property("Description", config.description.clone().map(Expr::from)),
    )
}

/// Instance profile wrapping a role, for attaching it to an instance
pub fn declare_instance_profile(
    graph: &mut ResourceGraph,
    path: &str,
    role: &LogicalId,
) -> SynthesisResult<LogicalId> {
    graph.add(
        Descriptor::new(path, ResourceKind::InstanceProfile)?
            .property("Roles", Expr::list([Expr::reference(role)])),
    )
}
