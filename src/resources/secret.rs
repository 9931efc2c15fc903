// Copyright (c) 2025 - Cowboy AI, Inc.
//! Generated Secrets
//!
//! Secret values are generated by the provider at provisioning time and
//! never appear in a template. Consumers reference fields through dynamic
//! references (`{{resolve:secretsmanager:...}}`) or, at runtime, by secret
//! name.

use crate::domain::invariants::{
    validate_excluded_characters, validate_password_length, validate_secret_template,
    ValidationResult,
};
use crate::domain::ResourceKind;
use crate::errors::SynthesisResult;
use crate::expr::Expr;
use crate::graph::{Descriptor, LogicalId, RemovalPolicy, ResourceGraph};

/// How the provider generates the secret string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretStringGenerator {
    /// JSON object the generated value is merged into
    pub template: String,
    /// Key the generated password is stored under
    pub generate_key: String,
    /// Password length (default 32)
    pub password_length: u32,
    /// Characters the password never contains
    pub exclude_characters: String,
}

impl SecretStringGenerator {
    pub const DEFAULT_LENGTH: u32 = 32;

    /// Generator for a `{"username": ..., "<key>": <generated>}` credential
    pub fn credentials(username: &str, generate_key: impl Into<String>) -> Self {
        Self {
            template: serde_json::json!({ "username": username }).to_string(),
            generate_key: generate_key.into(),
            password_length: Self::DEFAULT_LENGTH,
            exclude_characters: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_secret_template(&self.template, &self.generate_key)?;
        validate_password_length(self.password_length)?;
        validate_excluded_characters(&self.exclude_characters)
    }

    fn to_expr(&self) -> Expr {
        let mut entries = vec![
            ("GenerateStringKey", Expr::str(self.generate_key.clone())),
            ("PasswordLength", Expr::from(self.password_length)),
            ("SecretStringTemplate", Expr::str(self.template.clone())),
        ];
        if !self.exclude_characters.is_empty() {
            entries.push(("ExcludeCharacters", Expr::str(self.exclude_characters.clone())));
        }
        Expr::object(entries)
    }
}

/// Secret configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretConfig {
    /// Physical secret name; generated by the provider when unset
    pub name: Option<String>,
    pub description: Option<String>,
    pub generator: SecretStringGenerator,
    /// Default [`RemovalPolicy::Destroy`]
    pub removal_policy: RemovalPolicy,
}

impl SecretConfig {
    pub fn new(generator: SecretStringGenerator) -> Self {
        Self {
            name: None,
            description: None,
            generator,
            removal_policy: RemovalPolicy::Destroy,
        }
    }
}

/// Handle to a declared secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHandle {
    pub logical_id: LogicalId,
    pub path: String,
    pub name: Option<String>,
}

impl SecretHandle {
    /// Dynamic reference to one JSON field of the secret value
    pub fn field_reference(&self, key: &str) -> Expr {
        Expr::concat([
            Expr::str("{{resolve:secretsmanager:"),
            Expr::reference(&self.logical_id),
            Expr::str(format!(":SecretString:{}::}}}}", key)),
        ])
    }
}

pub fn declare_secret(
    graph: &mut ResourceGraph,
    path: &str,
    config: &SecretConfig,
) -> SynthesisResult<SecretHandle> {
    config.generator.validate()?;

    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::Secret)?
            .optional_property("Name", config.name.clone().map(Expr::from))
            .optional_property("Description", config.description.clone().map(Expr::from))
            .property("GenerateSecretString", config.generator.to_expr())
            .removal_policy(config.removal_policy),
    )?;

    Ok(SecretHandle {
        logical_id,
        path: path.to_string(),
        name: config.name.clone(),
    })
}

/// Link the secret to the database it holds credentials for
///
/// Lets the provider complete the secret with connection details.
pub fn attach_to_database(
    graph: &mut ResourceGraph,
    secret: &SecretHandle,
    database: &LogicalId,
) -> SynthesisResult<LogicalId> {
    graph.add(
        Descriptor::new(
            format!("{}/Attachment/Resource", secret.path),
            ResourceKind::SecretTargetAttachment,
        )?
        .property("SecretId", &secret.logical_id)
        .property("TargetId", database)
        .property("TargetType", "AWS::RDS::DBInstance"),
    )
}
