// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application Configuration
//!
//! Every input of a synthesis run in one place, with defaults, loaded from
//! the environment and overlaid by command line flags.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `CIM_GROUP` | `group` | required |
//! | `CDK_DEFAULT_ACCOUNT` | `account` | unset |
//! | `CDK_DEFAULT_REGION` | `region` | `eu-north-1` |
//! | `CIM_NETWORK_MODE` | `network_mode` | `owned` |
//! | `CIM_CONTEXT_FILE` | `context_file` | unset (no cached lookups) |
//! | `CIM_OUT_DIR` | `out_dir` | `cdk.out` |
//! | `CIM_IMAGE` | `image` | the webshop API image |
//! | `CIM_HOSTED_ZONE_DOMAIN` | `hosted_zone` | fixed zone attributes |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{CidrBlock, GroupName};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::lookup::ContextLookup;
use crate::resources::dns::HostedZoneSource;
use crate::resources::storage::WebsiteReadAccess;
use crate::stacks::application::{DEFAULT_HOSTED_ZONE_ID, DEFAULT_IMAGE, DEFAULT_ZONE_NAME};
use crate::stacks::{
    ApplicationStackProps, ContainerImage, NetworkMode, StackEnvironment, WebsiteStackProps,
};

pub const DEFAULT_REGION: &str = "eu-north-1";
pub const DEFAULT_OUT_DIR: &str = "cdk.out";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub group: String,
    pub account: Option<String>,
    pub region: Option<String>,
    pub network_mode: NetworkMode,
    pub context_file: Option<PathBuf>,
    pub out_dir: PathBuf,
    /// Restrict website reads to these ranges; empty means public
    pub website_source_ips: Vec<CidrBlock>,
    pub image: String,
    pub hosted_zone: HostedZoneSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            group: String::new(),
            account: None,
            region: Some(DEFAULT_REGION.to_string()),
            network_mode: NetworkMode::OwnedNetwork,
            context_file: None,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            website_source_ips: Vec::new(),
            image: DEFAULT_IMAGE.to_string(),
            hosted_zone: HostedZoneSource::Attributes {
                zone_id: DEFAULT_HOSTED_ZONE_ID.to_string(),
                zone_name: DEFAULT_ZONE_NAME.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SynthesisResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable source
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> SynthesisResult<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let network_mode = match var("CIM_NETWORK_MODE") {
            Some(mode) => mode.parse()?,
            None => defaults.network_mode,
        };

        let hosted_zone = match var("CIM_HOSTED_ZONE_DOMAIN") {
            Some(domain_name) => HostedZoneSource::Lookup { domain_name },
            None => defaults.hosted_zone,
        };

        let config = Self {
            group: var("CIM_GROUP").unwrap_or(defaults.group),
            account: var("CDK_DEFAULT_ACCOUNT").or(defaults.account),
            region: var("CDK_DEFAULT_REGION").or(defaults.region),
            network_mode,
            context_file: var("CIM_CONTEXT_FILE").map(PathBuf::from).or(defaults.context_file),
            out_dir: var("CIM_OUT_DIR").map(PathBuf::from).unwrap_or(defaults.out_dir),
            website_source_ips: defaults.website_source_ips,
            image: var("CIM_IMAGE").unwrap_or(defaults.image),
            hosted_zone,
        };

        debug!(
            group = %config.group,
            mode = %config.network_mode,
            out_dir = %config.out_dir.display(),
            "Loaded configuration from environment"
        );

        Ok(config)
    }

    /// Fail fast on unusable values
    pub fn validate(&self) -> SynthesisResult<()> {
        self.group_name()?;
        self.container_image()?;

        if let Some(account) = &self.account {
            if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(SynthesisError::InvalidConfiguration(format!(
                    "account '{}' must be 12 digits",
                    account
                )));
            }
        }

        if let Some(region) = &self.region {
            if region.is_empty()
                || !region
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(SynthesisError::InvalidConfiguration(format!(
                    "region '{}' is not a region name",
                    region
                )));
            }
        }

        if self.out_dir.as_os_str().is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "output directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn group_name(&self) -> SynthesisResult<GroupName> {
        if self.group.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "group is required (set CIM_GROUP or pass --group)".to_string(),
            ));
        }
        Ok(GroupName::new(self.group.clone())?)
    }

    pub fn container_image(&self) -> SynthesisResult<ContainerImage> {
        self.image.parse()
    }

    pub fn environment(&self) -> StackEnvironment {
        StackEnvironment {
            account: self.account.clone(),
            region: self.region.clone(),
        }
    }

    pub fn application_props(&self) -> SynthesisResult<ApplicationStackProps> {
        Ok(ApplicationStackProps {
            environment: self.environment(),
            mode: self.network_mode,
            hosted_zone: self.hosted_zone.clone(),
            image: self.container_image()?,
            ..ApplicationStackProps::new(self.group_name()?)
        })
    }

    pub fn website_props(&self) -> SynthesisResult<WebsiteStackProps> {
        let read_access = if self.website_source_ips.is_empty() {
            WebsiteReadAccess::Public
        } else {
            WebsiteReadAccess::SourceIp(self.website_source_ips.clone())
        };

        Ok(WebsiteStackProps {
            environment: self.environment(),
            read_access,
            ..WebsiteStackProps::new(self.group_name()?)
        })
    }

    /// Cached lookup answers; an empty provider without a context file
    pub fn lookups(&self) -> SynthesisResult<ContextLookup> {
        match &self.context_file {
            Some(path) => Ok(ContextLookup::from_file(path)?),
            None => Ok(ContextLookup::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-north-1"));
        assert_eq!(config.out_dir, PathBuf::from("cdk.out"));
        assert_eq!(config.network_mode, NetworkMode::OwnedNetwork);
        assert!(config.validate().is_err(), "group is required");
    }

    #[test]
    fn test_from_vars() {
        let config = AppConfig::from_vars(vars(&[
            ("CIM_GROUP", "team7"),
            ("CDK_DEFAULT_ACCOUNT", "292370674225"),
            ("CDK_DEFAULT_REGION", "eu-west-1"),
            ("CIM_NETWORK_MODE", "shared"),
            ("CIM_OUT_DIR", "out"),
            ("CIM_HOSTED_ZONE_DOMAIN", "cloud-ha.com"),
        ]))
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.network_mode, NetworkMode::SharedNetwork);
        assert_eq!(
            config.environment(),
            StackEnvironment::new("292370674225", "eu-west-1")
        );
        assert_eq!(
            config.hosted_zone,
            HostedZoneSource::Lookup {
                domain_name: "cloud-ha.com".to_string()
            }
        );

        let props = config.application_props().unwrap();
        assert_eq!(props.group.as_str(), "team7");
        assert_eq!(props.mode, NetworkMode::SharedNetwork);
    }

    #[test]
    fn test_invalid_network_mode() {
        assert!(AppConfig::from_vars(vars(&[("CIM_NETWORK_MODE", "hybrid")])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = AppConfig {
            group: "team7".to_string(),
            ..AppConfig::default()
        };
        assert!(base.validate().is_ok());

        let bad_group = AppConfig {
            group: "Team_7".to_string(),
            ..base.clone()
        };
        assert!(bad_group.validate().is_err());

        let bad_account = AppConfig {
            account: Some("12345".to_string()),
            ..base.clone()
        };
        assert!(bad_account.validate().is_err());

        let bad_image = AppConfig {
            image: "not-an-image".to_string(),
            ..base
        };
        assert!(bad_image.validate().is_err());
    }

    #[test]
    fn test_website_read_access_from_source_ips() {
        let config = AppConfig {
            group: "team7".to_string(),
            website_source_ips: vec![CidrBlock::new("194.132.145.78/32").unwrap()],
            ..AppConfig::default()
        };
        assert!(matches!(
            config.website_props().unwrap().read_access,
            WebsiteReadAccess::SourceIp(ref ips) if ips.len() == 1
        ));
    }
}
