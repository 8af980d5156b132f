use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use roster_types::{UserRecord, UNKNOWN_COMPANY};
use thiserror::Error;

use crate::store::UserPatch;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.0))]
pub struct FormErrors(pub Vec<ValidationError>);

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Field name to message, the shape shown next to each input.
    pub fn by_field(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|e| (e.field.as_str().to_string(), e.message.to_string()))
            .collect()
    }
}

/// Raw add/edit form input, exactly as typed. Nothing is checked until
/// [`UserForm::validate`] runs on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub company: String,
}

/// Trimmed, checked form values. `company` is already resolved to the
/// sentinel when left blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub name: String,
    pub email: String,
    pub company: String,
}

impl UserForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            company: company.into(),
        }
    }

    /// Edit form prefilled with the record's current values.
    pub fn from_record(record: &UserRecord) -> Self {
        Self::new(&record.name, &record.email, &record.company)
    }

    pub fn validate(&self) -> Result<ValidatedUser, FormErrors> {
        let name = self.name.trim();
        let email = self.email.trim();
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push(ValidationError {
                field: Field::Name,
                message: "Name is required",
            });
        }

        if email.is_empty() {
            errors.push(ValidationError {
                field: Field::Email,
                message: "Email is required",
            });
        } else if !EMAIL_RE.is_match(email) {
            errors.push(ValidationError {
                field: Field::Email,
                message: "Invalid email",
            });
        }

        if !errors.is_empty() {
            return Err(FormErrors(errors));
        }

        let company = match self.company.trim() {
            "" => UNKNOWN_COMPANY,
            company => company,
        };

        Ok(ValidatedUser {
            name: name.to_string(),
            email: email.to_string(),
            company: company.to_string(),
        })
    }
}

impl ValidatedUser {
    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            id: None,
            name: Some(self.name),
            email: Some(self.email),
            company: Some(self.company),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::UserId;

    #[test]
    fn test_valid_form_is_trimmed() {
        let valid = UserForm::new("  Carl ", " c@x.com ", " Acme ").validate().unwrap();
        assert_eq!(valid.name, "Carl");
        assert_eq!(valid.email, "c@x.com");
        assert_eq!(valid.company, "Acme");
    }

    #[test]
    fn test_blank_company_resolves_on_submit() {
        let form = UserForm::new("Carl", "c@x.com", "   ");
        assert_eq!(form.company, "   ");
        assert_eq!(form.validate().unwrap().company, UNKNOWN_COMPANY);
    }

    #[test]
    fn test_name_required() {
        let errors = UserForm::new(" \t", "a@b.co", "").validate().unwrap_err();
        assert!(errors.has(Field::Name));
        assert!(!errors.has(Field::Email));
        assert_eq!(errors.by_field()["name"], "Name is required");
    }

    #[test]
    fn test_email_rules() {
        let errors = UserForm::new("A", "bad", "").validate().unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError {
                field: Field::Email,
                message: "Invalid email"
            }]
        );

        let errors = UserForm::new("A", "  ", "").validate().unwrap_err();
        assert_eq!(errors.by_field()["email"], "Email is required");

        for invalid in ["a@b", "@b.co", "a@.", "a b@c"] {
            let result = UserForm::new("A", invalid, "").validate();
            assert!(result.is_err(), "{} should be rejected", invalid);
        }

        assert!(UserForm::new("A", "a@b.co", "").validate().is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let errors = UserForm::default().validate().unwrap_err();
        assert_eq!(errors.0.len(), 2);
        assert_eq!(errors.to_string(), "name: Name is required; email: Email is required");
    }

    #[test]
    fn test_prefill_from_record() {
        let mut record = UserRecord::new(UserId::from("4"), "Dana", "d@x.com");
        record.company = "Initech".to_string();
        let form = UserForm::from_record(&record);
        assert_eq!(form, UserForm::new("Dana", "d@x.com", "Initech"));
    }
}
