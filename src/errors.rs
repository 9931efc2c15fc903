// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for stack composition and synthesis

use thiserror::Error;

use crate::domain::{NameError, NetworkError, ValidationError};
use crate::lookup::LookupError;

/// Errors that can occur while composing or synthesizing a stack
///
/// Every variant is fatal: a composition that fails never hands a partial
/// graph to the provisioning engine.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// An external object (default VPC, hosted zone) could not be resolved
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Out-of-range or otherwise unusable configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A descriptor references something not yet declared
    #[error("Dangling reference from {from} to {to}")]
    DanglingReference { from: String, to: String },

    /// Two descriptors share a logical id
    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    /// A domain invariant was violated
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while writing the cloud assembly
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for composition and synthesis
pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl From<serde_json::Error> for SynthesisError {
    fn from(err: serde_json::Error) -> Self {
        SynthesisError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SynthesisError {
    fn from(err: std::io::Error) -> Self {
        SynthesisError::Io(err.to_string())
    }
}

impl From<NameError> for SynthesisError {
    fn from(err: NameError) -> Self {
        SynthesisError::InvalidConfiguration(err.to_string())
    }
}

impl From<NetworkError> for SynthesisError {
    fn from(err: NetworkError) -> Self {
        SynthesisError::InvalidConfiguration(err.to_string())
    }
}
