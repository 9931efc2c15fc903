// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Storage Buckets
//!
//! A bucket is declared with its policy (when any statement applies) and,
//! with auto-delete enabled, a custom resource that empties the bucket
//! before the provider deletes it. The custom resource is served by a
//! provider function deployed outside the stack and addressed by name.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::invariants::validate_index_document;
use crate::domain::{BucketName, CidrBlock, ResourceKind};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::expr::{Expr, PseudoParameter};
use crate::graph::{Descriptor, LogicalId, RemovalPolicy, ResourceGraph};

use super::iam::{PolicyDocument, PolicyStatement, Principal};
use super::tags;

/// Bucket-level public access block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPublicAccess {
    /// Block everything public
    BlockAll,
    /// Block public ACLs only; public bucket policies stay possible
    BlockAcls,
}

impl BlockPublicAccess {
    fn blocks_public_policy(&self) -> bool {
        matches!(self, Self::BlockAll)
    }

    fn to_expr(&self) -> Expr {
        let policy = self.blocks_public_policy();
        Expr::object([
            ("BlockPublicAcls", Expr::Bool(true)),
            ("BlockPublicPolicy", Expr::Bool(policy)),
            ("IgnorePublicAcls", Expr::Bool(true)),
            ("RestrictPublicBuckets", Expr::Bool(policy)),
        ])
    }
}

/// Who may read objects
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteReadAccess {
    /// No read statement
    #[default]
    Private,
    /// Anyone may read objects
    Public,
    /// Anyone connecting from one of the listed ranges may read objects
    SourceIp(Vec<CidrBlock>),
}

impl WebsiteReadAccess {
    fn statement(&self, objects: Expr) -> Option<PolicyStatement> {
        let read = || {
            PolicyStatement::allow(["s3:GetObject"])
                .on(objects.clone())
                .for_principal(Principal::Any)
        };
        match self {
            Self::Private => None,
            Self::Public => Some(read()),
            Self::SourceIp(ranges) => Some(read().condition(
                "IpAddress",
                "aws:SourceIp",
                ranges.iter().map(ToString::to_string),
            )),
        }
    }

    fn is_public(&self) -> bool {
        !matches!(self, Self::Private)
    }
}

/// Provider function serving the auto-delete custom resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDeleteProvider {
    pub function_name: String,
}

impl AutoDeleteProvider {
    pub const DEFAULT_FUNCTION_NAME: &'static str = "cim-s3-auto-delete-objects";

    /// Function ARN in the stack's own partition, region and account
    pub fn service_token(&self) -> Expr {
        Expr::concat([
            Expr::str("arn:"),
            Expr::pseudo(PseudoParameter::Partition),
            Expr::str(":lambda:"),
            Expr::pseudo(PseudoParameter::Region),
            Expr::str(":"),
            Expr::pseudo(PseudoParameter::AccountId),
            Expr::str(format!(":function:{}", self.function_name)),
        ])
    }
}

impl Default for AutoDeleteProvider {
    fn default() -> Self {
        Self {
            function_name: Self::DEFAULT_FUNCTION_NAME.to_string(),
        }
    }
}

/// Bucket configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    /// Physical name; generated by the provider when unset
    pub bucket_name: Option<BucketName>,
    /// Default private
    pub read_access: WebsiteReadAccess,
    /// Default none (provider defaults apply)
    pub block_public_access: Option<BlockPublicAccess>,
    /// Default [`RemovalPolicy::Retain`]
    pub removal_policy: RemovalPolicy,
    /// Empty the bucket before deletion; requires [`RemovalPolicy::Destroy`]
    pub auto_delete_objects: bool,
    pub auto_delete_provider: AutoDeleteProvider,
    /// Serve the bucket as a website with this index document
    pub website_index_document: Option<String>,
    pub website_error_document: Option<String>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            read_access: WebsiteReadAccess::Private,
            block_public_access: None,
            removal_policy: RemovalPolicy::Retain,
            auto_delete_objects: false,
            auto_delete_provider: AutoDeleteProvider::default(),
            website_index_document: None,
            website_error_document: None,
        }
    }
}

impl BucketConfig {
    fn validate(&self) -> SynthesisResult<()> {
        if self.read_access.is_public()
            && self
                .block_public_access
                .map_or(false, |b| b.blocks_public_policy())
        {
            return Err(SynthesisError::InvalidConfiguration(
                "public read access needs a public access block that allows bucket policies"
                    .to_string(),
            ));
        }

        if self.auto_delete_objects && self.removal_policy != RemovalPolicy::Destroy {
            return Err(SynthesisError::InvalidConfiguration(
                "auto-deleting objects requires the destroy removal policy".to_string(),
            ));
        }

        if let Some(index) = &self.website_index_document {
            validate_index_document(index)?;
        }
        if self.website_error_document.is_some() && self.website_index_document.is_none() {
            return Err(SynthesisError::InvalidConfiguration(
                "an error document requires an index document".to_string(),
            ));
        }
        Ok(())
    }

    fn website_configuration(&self) -> Option<Expr> {
        let index = self.website_index_document.as_ref()?;
        let mut entries = vec![("IndexDocument", Expr::str(index.clone()))];
        if let Some(error) = &self.website_error_document {
            entries.push(("ErrorDocument", Expr::str(error.clone())));
        }
        Some(Expr::object(entries))
    }
}

/// Handle to a declared bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    pub logical_id: LogicalId,
    pub policy: Option<LogicalId>,
    pub auto_delete: Option<LogicalId>,
}

impl BucketHandle {
    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    /// ARN pattern matching every object key
    pub fn objects_arn(&self) -> Expr {
        Expr::concat([self.arn(), Expr::str("/*")])
    }

    pub fn website_url(&self) -> Expr {
        Expr::get_att(&self.logical_id, "WebsiteURL")
    }
}

pub fn declare_bucket(
    graph: &mut ResourceGraph,
    path: &str,
    config: &BucketConfig,
) -> SynthesisResult<BucketHandle> {
    config.validate()?;

    let auto_delete_tag = if config.auto_delete_objects {
        Some(tags([("aws-cdk:auto-delete-objects", Expr::str("true"))]))
    } else {
        None
    };

    let logical_id = graph.add(
        Descriptor::new(format!("{}/Resource", path), ResourceKind::Bucket)?
            .optional_property(
                "BucketName",
                config.bucket_name.as_ref().map(|n| Expr::str(n.as_str())),
            )
            .optional_property(
                "PublicAccessBlockConfiguration",
                config.block_public_access.map(|b| b.to_expr()),
            )
            .optional_property("WebsiteConfiguration", config.website_configuration())
            .optional_property("Tags", auto_delete_tag)
            .removal_policy(config.removal_policy),
    )?;

    let mut handle = BucketHandle {
        logical_id,
        policy: None,
        auto_delete: None,
    };

    let document = PolicyDocument::new(
        config
            .read_access
            .statement(handle.objects_arn())
            .into_iter()
            .collect(),
    );

    if !document.is_empty() {
        if config.read_access == WebsiteReadAccess::Public {
            warn!(bucket = %handle.logical_id, "Bucket objects are readable by anyone");
        }
        handle.policy = Some(graph.add(
            Descriptor::new(format!("{}/Policy/Resource", path), ResourceKind::BucketPolicy)?
                .property("Bucket", &handle.logical_id)
                .property("PolicyDocument", document.to_expr()),
        )?);
    }

    if config.auto_delete_objects {
        let mut descriptor = Descriptor::new(
            format!("{}/AutoDeleteObjectsCustomResource/Default", path),
            ResourceKind::AutoDeleteObjects,
        )?
        .property("ServiceToken", config.auto_delete_provider.service_token())
        .property("BucketName", &handle.logical_id)
        .removal_policy(RemovalPolicy::Destroy);

        // Objects are emptied before the policy granting access goes away
        if let Some(policy) = &handle.policy {
            descriptor = descriptor.depends_on(policy);
        }
        handle.auto_delete = Some(graph.add(descriptor)?);
    }

    info!(
        bucket = %handle.logical_id,
        name = ?config.bucket_name.as_ref().map(|n| n.as_str()),
        website = config.website_index_document.is_some(),
        auto_delete = config.auto_delete_objects,
        "Declared bucket"
    );

    Ok(handle)
}
