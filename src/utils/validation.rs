use crate::error::{AppError, FieldError};

pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 128;
pub const NAME_MAX: usize = 128;

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Collects every field problem of a request body before failing.
#[derive(Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, message: String) {
        self.errors.push(FieldError::body(field, message));
    }

    pub fn email(mut self, field: &str, value: &str) -> Self {
        if !is_valid_email(value) {
            self.reject(field, format!("\"{field}\" must be a valid email"));
        }
        self
    }

    pub fn password(mut self, field: &str, value: &str) -> Self {
        let len = value.chars().count();
        if len < PASSWORD_MIN {
            self.reject(
                field,
                format!("\"{field}\" length must be at least {PASSWORD_MIN} characters long"),
            );
        } else if len > PASSWORD_MAX {
            self.reject(
                field,
                format!(
                    "\"{field}\" length must be less than or equal to {PASSWORD_MAX} characters long"
                ),
            );
        }
        self
    }

    pub fn name(mut self, field: &str, value: Option<&str>) -> Self {
        if value.is_some_and(|v| v.chars().count() > NAME_MAX) {
            self.reject(
                field,
                format!(
                    "\"{field}\" length must be less than or equal to {NAME_MAX} characters long"
                ),
            );
        }
        self
    }

    pub fn not_blank(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.reject(field, format!("\"{field}\" is not allowed to be empty"));
        }
        self
    }

    /// Records a failed check that has no dedicated rule.
    pub fn check(mut self, ok: bool, field: &str, message: &str) -> Self {
        if !ok {
            self.reject(field, message.to_string());
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("budi@company.com"));
        assert!(!is_valid_email("budi.company.com"));
        assert!(!is_valid_email("budi@company"));
        assert!(!is_valid_email("bu di@company.com"));
        assert!(!is_valid_email("@company.com"));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Budi@Company.COM "), "budi@company.com");
    }

    #[test]
    fn collects_all_field_errors() {
        let err = Validator::new()
            .email("email", "nope")
            .password("password", "123")
            .not_blank("reason", "  ")
            .finish()
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["email", "password", "reason"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn long_names_are_rejected() {
        let long = "x".repeat(NAME_MAX + 1);
        assert!(Validator::new().name("name", Some(&long)).finish().is_err());
        assert!(Validator::new().name("name", None).finish().is_ok());
    }
}
