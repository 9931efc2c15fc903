// Copyright (c) 2025 - Cowboy AI, Inc.
//! Static Website Bucket Stack

use tracing::info;

use crate::domain::invariants::validate_index_document;
use crate::domain::GroupName;
use crate::errors::SynthesisResult;
use crate::graph::{OutputValue, RemovalPolicy, ResourceGraph};
use crate::resources::storage::{
    declare_bucket, AutoDeleteProvider, BlockPublicAccess, BucketConfig, WebsiteReadAccess,
};

use super::StackEnvironment;

pub const DEFAULT_STACK_NAME: &str = "WebsiteBucketStack";
pub const WEBSITE_OUTPUT: &str = "websiteBucketOutput";

/// Inputs of the website stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteStackProps {
    pub stack_name: String,
    pub group: GroupName,
    pub environment: StackEnvironment,
    /// Default [`WebsiteReadAccess::Public`]
    pub read_access: WebsiteReadAccess,
    /// Default `index.html`
    pub index_document: String,
    pub auto_delete_provider: AutoDeleteProvider,
}

impl WebsiteStackProps {
    pub fn new(group: GroupName) -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            group,
            environment: StackEnvironment::default(),
            read_access: WebsiteReadAccess::Public,
            index_document: "index.html".to_string(),
            auto_delete_provider: AutoDeleteProvider::default(),
        }
    }
}

/// Composer of the website stack
pub struct WebsiteBucketStack;

impl WebsiteBucketStack {
    pub fn compose(props: &WebsiteStackProps) -> SynthesisResult<ResourceGraph> {
        validate_index_document(&props.index_document)?;

        let bucket_name = props.group.website_bucket_name();
        info!(
            stack = %props.stack_name,
            group = %props.group,
            bucket = %bucket_name,
            "Composing website stack"
        );

        let mut graph = ResourceGraph::new(&props.stack_name, props.environment.clone())
            .with_description(format!("Static website bucket for group {}", props.group));

        let bucket = declare_bucket(
            &mut graph,
            "WebsiteBucket",
            &BucketConfig {
                bucket_name: Some(bucket_name),
                read_access: props.read_access.clone(),
                block_public_access: Some(BlockPublicAccess::BlockAcls),
                removal_policy: RemovalPolicy::Destroy,
                auto_delete_objects: true,
                auto_delete_provider: props.auto_delete_provider.clone(),
                website_index_document: Some(props.index_document.clone()),
                website_error_document: None,
            },
        )?;

        graph.add_output(
            OutputValue::new(WEBSITE_OUTPUT, bucket.website_url())?
                .description("URL of your bucket.")
                .export_name(props.group.website_export_name()),
        )?;

        graph.validate()?;

        info!(
            stack = %props.stack_name,
            resources = graph.len(),
            "Composed website stack"
        );

        Ok(graph)
    }
}
