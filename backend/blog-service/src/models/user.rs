use crate::validators::{validate_name, validate_password_pattern};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Also the username used in `/{username}` links
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Account row including credentials
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Registration form / `auth.register` input
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(email(message = "Seu email deve ser válido"))]
    pub email: String,
    #[validate(custom(function = "validate_password_pattern"))]
    pub password: String,
}

/// Account to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// `auth.login` input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::validators::{EMAIL_INVALID, NAME_TOO_LONG, NAME_TOO_SHORT, PASSWORD_RULE};

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn field_messages(req: &RegisterRequest) -> crate::error::FieldErrors {
        match req.validate().map_err(AppError::from) {
            Err(AppError::Validation(fields)) => fields,
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(()) => Default::default(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(request("ana", "ana@example.com", "Abcdefg1").validate().is_ok());
    }

    #[test]
    fn short_name_fails_min_length() {
        let fields = field_messages(&request("ab", "ana@example.com", "Abcdefg1"));
        assert_eq!(fields["name"], vec![NAME_TOO_SHORT.to_string()]);
    }

    #[test]
    fn long_name_fails_max_length() {
        let fields = field_messages(&request(&"a".repeat(101), "ana@example.com", "Abcdefg1"));
        assert_eq!(fields["name"], vec![NAME_TOO_LONG.to_string()]);
    }

    #[test]
    fn hundred_char_name_is_accepted() {
        assert!(request(&"a".repeat(100), "ana@example.com", "Abcdefg1")
            .validate()
            .is_ok());
    }

    #[test]
    fn malformed_email_fails_format() {
        let fields = field_messages(&request("ana", "not-an-email", "Abcdefg1"));
        assert_eq!(fields["email"], vec![EMAIL_INVALID.to_string()]);
    }

    #[test]
    fn weak_password_fails_pattern() {
        let fields = field_messages(&request("ana", "ana@example.com", "abcdefgh"));
        assert_eq!(fields["password"], vec![PASSWORD_RULE.to_string()]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let fields = field_messages(&request("ab", "nope", "short"));
        assert_eq!(fields.len(), 3);
    }
}
