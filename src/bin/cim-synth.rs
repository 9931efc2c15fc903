// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Synthesizer
//!
//! Composes the application stack and the website bucket stack for one
//! group and writes them as a cloud assembly.
//!
//! Run with: cargo run --bin cim-synth -- --group team7
//!
//! Every flag falls back to its environment variable (see
//! `cim_cloud_stacks::config`). Shared-network synthesis needs cached
//! lookups: pass `--context cdk.context.json`.

use anyhow::{Context, Result};
use clap::Parser;
use cim_cloud_stacks::{
    domain::CidrBlock, synth::CloudAssembly, AppConfig, ApplicationStack, NetworkMode,
    WebsiteBucketStack,
};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "cim-synth")]
#[command(about = "Synthesize the application and website stacks", long_about = None)]
#[command(version)]
struct Cli {
    /// Group name used for bucket, record and export names
    #[arg(long, env = "CIM_GROUP")]
    group: Option<String>,

    /// Target account
    #[arg(long)]
    account: Option<String>,

    /// Target region
    #[arg(long)]
    region: Option<String>,

    /// Network variant: owned or shared
    #[arg(long)]
    network_mode: Option<NetworkMode>,

    /// Cached lookup answers
    #[arg(long)]
    context: Option<PathBuf>,

    /// Assembly output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Restrict website reads to this range (repeatable)
    #[arg(long = "website-source-ip")]
    website_source_ips: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Overlay flags on the environment configuration
    fn into_config(self) -> Result<AppConfig> {
        let mut config = AppConfig::from_env().context("Failed to load configuration")?;

        if let Some(group) = self.group {
            config.group = group;
        }
        if self.account.is_some() {
            config.account = self.account;
        }
        if self.region.is_some() {
            config.region = self.region;
        }
        if let Some(mode) = self.network_mode {
            config.network_mode = mode;
        }
        if self.context.is_some() {
            config.context_file = self.context;
        }
        if let Some(out) = self.out {
            config.out_dir = out;
        }
        for cidr in &self.website_source_ips {
            let parsed: CidrBlock = cidr
                .parse()
                .with_context(|| format!("Invalid --website-source-ip '{}'", cidr))?;
            config.website_source_ips.push(parsed);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = cli.into_config()?;
    config.validate().context("Invalid configuration")?;

    info!(
        group = %config.group,
        mode = %config.network_mode,
        environment = %config.environment(),
        out_dir = %config.out_dir.display(),
        "Starting synthesis"
    );

    let lookups = config.lookups().context("Failed to load lookup context")?;

    let application = ApplicationStack::compose(&config.application_props()?, &lookups)
        .context("Failed to compose application stack")?;
    debug!(resources = application.len(), "Application stack composed");

    let website = WebsiteBucketStack::compose(&config.website_props()?)
        .context("Failed to compose website stack")?;
    debug!(resources = website.len(), "Website stack composed");

    let manifest = CloudAssembly::write(&config.out_dir, &[application, website])
        .context("Failed to write cloud assembly")?;

    for (name, artifact) in &manifest.artifacts {
        info!(
            stack = %name,
            environment = %artifact.environment,
            template = %artifact.template_file,
            "Stack synthesized"
        );
    }

    Ok(())
}
