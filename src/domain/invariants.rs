// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Declaration Invariants
//!
//! Property checks that resource configuration must pass before a descriptor
//! enters a graph. All functions are pure and deterministic; composition
//! calls them and aborts on the first failure so that no partial graph is
//! ever synthesized.

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value outside the range the provider accepts
    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: u64,
        max: u64,
        actual: u64,
    },

    /// Engine/version combination not supported
    #[error("Unsupported engine version: {0}")]
    UnsupportedEngineVersion(String),

    /// Secret generation template is unusable
    #[error("Invalid secret template: {0}")]
    InvalidSecretTemplate(String),

    /// Name does not follow provider naming rules
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: String,
        name: String,
        reason: String,
    },

    /// A required collection is empty
    #[error("{0} must not be empty")]
    Empty(String),
}

/// Allocated storage bounds for PostgreSQL instances, in GiB
pub const POSTGRES_STORAGE_GIB: (u32, u32) = (20, 65_536);

/// Generated password length bounds
pub const PASSWORD_LENGTH: (u32, u32) = (1, 4_096);

/// Maximum length of an output export name
pub const MAX_EXPORT_NAME_LENGTH: usize = 255;

fn check_range(field: &str, value: u64, min: u64, max: u64) -> ValidationResult {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}

/// Validate allocated storage of a PostgreSQL instance
pub fn validate_allocated_storage(gib: u32) -> ValidationResult {
    check_range(
        "allocated storage (GiB)",
        u64::from(gib),
        u64::from(POSTGRES_STORAGE_GIB.0),
        u64::from(POSTGRES_STORAGE_GIB.1),
    )
}

/// Validate generated password length
pub fn validate_password_length(length: u32) -> ValidationResult {
    check_range(
        "password length",
        u64::from(length),
        u64::from(PASSWORD_LENGTH.0),
        u64::from(PASSWORD_LENGTH.1),
    )
}

/// Validate a secret string template and the key to generate into it
///
/// # Rules
/// - Template must be a JSON object
/// - Generated key must be non-empty and absent from the template
pub fn validate_secret_template(template: &str, generate_key: &str) -> ValidationResult {
    let parsed: serde_json::Value = serde_json::from_str(template)
        .map_err(|e| ValidationError::InvalidSecretTemplate(e.to_string()))?;

    let object = parsed.as_object().ok_or_else(|| {
        ValidationError::InvalidSecretTemplate("template must be a JSON object".to_string())
    })?;

    if generate_key.is_empty() {
        return Err(ValidationError::InvalidSecretTemplate(
            "generated key cannot be empty".to_string(),
        ));
    }

    if object.contains_key(generate_key) {
        return Err(ValidationError::InvalidSecretTemplate(format!(
            "template already contains key '{}'",
            generate_key
        )));
    }

    Ok(())
}

/// Validate characters excluded from generated passwords
///
/// # Rules
/// - Printable ASCII only (space included)
pub fn validate_excluded_characters(exclude: &str) -> ValidationResult {
    if let Some(ch) = exclude.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        return Err(ValidationError::InvalidSecretTemplate(format!(
            "excluded character {:?} is not printable ASCII",
            ch
        )));
    }
    Ok(())
}

/// Validate an output export name
///
/// # Rules
/// - 1 to 255 characters
/// - Alphanumeric, colons and hyphens
pub fn validate_export_name(name: &str) -> ValidationResult {
    let invalid = |reason: &str| ValidationError::InvalidName {
        kind: "export".to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if name.len() > MAX_EXPORT_NAME_LENGTH {
        return Err(invalid("longer than 255 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '-')
    {
        return Err(invalid("only alphanumerics, ':' and '-' are allowed"));
    }
    Ok(())
}

/// Validate a website index document suffix
///
/// # Rules
/// - Non-empty
/// - No slash
pub fn validate_index_document(document: &str) -> ValidationResult {
    if document.is_empty() || document.contains('/') {
        return Err(ValidationError::InvalidName {
            kind: "index document".to_string(),
            name: document.to_string(),
            reason: "must be a non-empty suffix without '/'".to_string(),
        });
    }
    Ok(())
}

/// Validate a provider managed policy name (not an ARN)
pub fn validate_managed_policy_name(name: &str) -> ValidationResult {
    if name.is_empty() || name.starts_with("arn:") || name.contains(' ') {
        return Err(ValidationError::InvalidName {
            kind: "managed policy".to_string(),
            name: name.to_string(),
            reason: "expected a bare policy name".to_string(),
        });
    }
    Ok(())
}

/// Validate that a list of items destined for a property is non-empty
pub fn validate_non_empty<T>(field: &str, items: &[T]) -> ValidationResult {
    if items.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_allocated_storage() {
        assert!(validate_allocated_storage(20).is_ok());
        assert!(validate_allocated_storage(65_536).is_ok());
        assert!(matches!(
            validate_allocated_storage(19),
            Err(ValidationError::OutOfRange { actual: 19, .. })
        ));
        assert!(validate_allocated_storage(65_537).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password_length(16).is_ok());
        assert!(validate_password_length(0).is_err());
        assert!(validate_password_length(4_097).is_err());
    }

    #[test]
    fn test_validate_secret_template() {
        assert!(validate_secret_template(r#"{"username":"master"}"#, "password").is_ok());
        assert!(validate_secret_template(r#"{"username":"master"}"#, "username").is_err());
        assert!(validate_secret_template(r#"["master"]"#, "password").is_err());
        assert!(validate_secret_template("not json", "password").is_err());
        assert!(validate_secret_template("{}", "").is_err());
    }

    #[test]
    fn test_validate_excluded_characters() {
        assert!(validate_excluded_characters("/@\" ").is_ok());
        assert!(validate_excluded_characters("\t").is_err());
    }

    #[test]
    fn test_validate_export_name() {
        assert!(validate_export_name("team7-s3-demo-url").is_ok());
        assert!(validate_export_name("stack:value").is_ok());
        assert!(validate_export_name("").is_err());
        assert!(validate_export_name("has space").is_err());
        assert!(validate_export_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_index_document() {
        assert!(validate_index_document("index.html").is_ok());
        assert!(validate_index_document("").is_err());
        assert!(validate_index_document("docs/index.html").is_err());
    }

    #[test]
    fn test_validate_managed_policy_name() {
        assert!(validate_managed_policy_name("AmazonSSMManagedInstanceCore").is_ok());
        assert!(validate_managed_policy_name("arn:aws:iam::aws:policy/Foo").is_err());
        assert!(validate_managed_policy_name("").is_err());
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("targets", &[1]).is_ok());
        assert_eq!(
            validate_non_empty::<u8>("targets", &[]),
            Err(ValidationError::Empty("targets".to_string()))
        );
    }
}
