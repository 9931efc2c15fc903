// Copyright (c) 2025 - Cowboy AI, Inc.
//! Name Value Objects with Validation Invariants
//!
//! Group names feed every derived name in a stack (DNS records, bucket names,
//! exports), so they are validated once, up front, against the strictest of
//! those consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Name is empty")]
    Empty,

    #[error("Name '{name}' exceeds maximum length of {max} characters")]
    TooLong { name: String, max: usize },

    #[error("Name '{name}' is shorter than {min} characters")]
    TooShort { name: String, min: usize },

    #[error("Invalid character {ch:?} in name '{name}'")]
    InvalidCharacter { name: String, ch: char },

    #[error("Name cannot start or end with a hyphen or dot: {0}")]
    InvalidBoundary(String),

    #[error("Bucket name cannot look like an IP address: {0}")]
    IpFormatted(String),
}

/// Logical group identifier
///
/// Every stack is owned by a group; the group name prefixes the DNS record
/// (`<group>-api`), the website bucket (`<group>-website`) and the website
/// export (`<group>-s3-demo-url`). These names must be unique in the target
/// account and region, which cannot be checked locally.
///
/// # Invariants
/// - Non-empty, at most 40 characters
/// - Lowercase ASCII letters, digits and hyphens only
/// - Does not start or end with a hyphen
///
/// ```rust
/// use cim_cloud_stacks::domain::GroupName;
///
/// let group = GroupName::new("team7").unwrap();
/// assert_eq!(group.dns_record_name().as_str(), "team7-api");
/// assert_eq!(group.website_bucket_name().as_str(), "team7-website");
///
/// assert!(GroupName::new("").is_err());
/// assert!(GroupName::new("Team7").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Leaves room for the longest derived suffix inside a 63 character label
    pub const MAX_LENGTH: usize = 40;

    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();

        // Invariant 1: Non-empty
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        // Invariant 2: Bounded length
        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                name,
                max: Self::MAX_LENGTH,
            });
        }

        // Invariant 3: Lowercase label characters
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(NameError::InvalidCharacter { name, ch });
        }

        // Invariant 4: Hyphens only inside
        if name.starts_with('-') || name.ends_with('-') {
            return Err(NameError::InvalidBoundary(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Record name of the application's DNS alias
    pub fn dns_record_name(&self) -> RecordName {
        RecordName(format!("{}-api", self.0))
    }

    /// Name of the static website bucket
    pub fn website_bucket_name(&self) -> BucketName {
        BucketName(format!("{}-website", self.0))
    }

    /// Export name of the website URL output
    pub fn website_export_name(&self) -> String {
        format!("{}-s3-demo-url", self.0)
    }

    /// Physical name of the database credential secret
    pub fn database_secret_name(&self) -> String {
        format!("{}-postgres-credentials", self.0)
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GroupName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for GroupName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

/// S3 bucket name
///
/// # Invariants
/// - 3 to 63 characters
/// - Lowercase letters, digits, dots and hyphens
/// - Starts and ends with a letter or digit
/// - Not formatted like an IPv4 address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketName(String);

impl BucketName {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 63;

    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();

        if name.is_empty() {
            return Err(NameError::Empty);
        }

        if name.len() < Self::MIN_LENGTH {
            return Err(NameError::TooShort {
                name,
                min: Self::MIN_LENGTH,
            });
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                name,
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(ch) = name.chars().find(|c| {
            !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.')
        }) {
            return Err(NameError::InvalidCharacter { name, ch });
        }

        let boundary_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
        if !boundary_ok(name.chars().next()) || !boundary_ok(name.chars().last()) {
            return Err(NameError::InvalidBoundary(name));
        }

        if name.parse::<std::net::Ipv4Addr>().is_ok() {
            return Err(NameError::IpFormatted(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relative DNS record name inside a hosted zone (a single label)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordName(String);

impl RecordName {
    /// Maximum length for a single DNS label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();

        if name.is_empty() {
            return Err(NameError::Empty);
        }

        if name.len() > Self::MAX_LABEL_LENGTH {
            return Err(NameError::TooLong {
                name,
                max: Self::MAX_LABEL_LENGTH,
            });
        }

        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(NameError::InvalidCharacter { name, ch });
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(NameError::InvalidBoundary(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified record name within `zone_name`, with trailing dot
    pub fn qualified(&self, zone_name: &str) -> String {
        format!("{}.{}.", self.0, zone_name.trim_end_matches('.'))
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
