//! Validation utilities.

use crate::{FieldError, FleetError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `FleetError` on failure.
    fn validate_input(&self) -> Result<(), FleetError> {
        self.validate().map_err(validation_errors_to_fleet_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors, sorted by field name.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Converts `validator::ValidationErrors` to `FleetError::Validation`.
#[must_use]
pub fn validation_errors_to_fleet_error(errors: ValidationErrors) -> FleetError {
    let message = field_errors(&errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    FleetError::Validation(message)
}

/// Field rules shared by the entity inputs.
pub mod rules {
    use validator::ValidationError;

    const SSH_KEY_TYPES: &[&str] = &[
        "ssh-rsa",
        "ssh-ed25519",
        "ssh-dss",
        "ecdsa-sha2-nistp256",
        "ecdsa-sha2-nistp384",
        "ecdsa-sha2-nistp521",
        "sk-ssh-ed25519@openssh.com",
        "sk-ecdsa-sha2-nistp256@openssh.com",
    ];

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates an OpenSSH public key line: `<type> <base64> [comment]`.
    pub fn ssh_public_key(value: &str) -> Result<(), ValidationError> {
        let mut parts = value.split_whitespace();
        let (Some(key_type), Some(body)) = (parts.next(), parts.next()) else {
            return Err(ValidationError::new("ssh_key_malformed"));
        };
        if !SSH_KEY_TYPES.contains(&key_type) {
            return Err(ValidationError::new("ssh_key_unsupported_type"));
        }
        if !body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        {
            return Err(ValidationError::new("ssh_key_invalid_encoding"));
        }
        Ok(())
    }

    /// Validates an IPv4 address in dotted form.
    pub fn ipv4_address(value: &str) -> Result<(), ValidationError> {
        value
            .parse::<std::net::Ipv4Addr>()
            .map(|_| ())
            .map_err(|_| ValidationError::new("ipv4_address"))
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, max = 8), custom(function = "not_blank"))]
        name: String,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_ssh_public_key() {
        assert!(ssh_public_key("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIB0 user@host").is_ok());
        assert!(ssh_public_key("ssh-rsa AAAAB3NzaC1yc2E=").is_ok());
        assert!(ssh_public_key("ssh-ed25519").is_err());
        assert!(ssh_public_key("pgp AAAA").is_err());
        assert!(ssh_public_key("ssh-rsa not*base64").is_err());
    }

    #[test]
    fn test_ipv4_address() {
        assert!(ipv4_address("10.0.0.1").is_ok());
        assert!(ipv4_address("10.0.0.256").is_err());
        assert!(ipv4_address("fe80::1").is_err());
    }

    #[test]
    fn test_validate_input_maps_to_validation_error() {
        let ok = Named { name: "web".to_string() };
        assert!(ok.validate_input().is_ok());

        let blank = Named { name: "  ".to_string() };
        match blank.validate_input() {
            Err(FleetError::Validation(message)) => assert!(message.starts_with("name:")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_field_errors_carry_codes() {
        let long = Named { name: "far-too-long-name".to_string() };
        let errors = long.validate().unwrap_err();
        let fields = field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "name");
        assert_eq!(fields[0].code, "length");
    }
}
