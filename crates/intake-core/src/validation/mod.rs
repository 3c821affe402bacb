//! Translation of `validator` reports into per-field messages.
//!
//! Field paths are reported the way clients send them: camelCase, dotted for nested
//! records and indexed for lists (`companyPlates[1].plateNumber`).

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::FieldViolation;

pub const REQUIRED: &str = "This field is required";
pub const INVALID_EMAIL: &str = "Invalid email format";
pub const TOO_SHORT: &str = "Too short";
pub const TOO_LONG: &str = "Too long";
pub const INVALID_OBJECT_KEY: &str = "Invalid object key";
pub const FOREIGN_OBJECT_KEY: &str = "Object key belongs to a different registration";

/// Flatten a validation report into one violation per offending field, sorted by path.
pub fn field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    collect(errors, None, &mut violations);
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, &to_camel_case(&field.to_string()));
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(first) = errs.first() {
                    out.push(FieldViolation::new(path, describe(first)));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, Some(&format!("{}[{}]", path, index)), out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let value = error.params.get("value");
    if matches!(value, Some(serde_json::Value::String(s)) if s.is_empty()) {
        return REQUIRED.to_string();
    }

    let message = match error.code.as_ref() {
        "required" => REQUIRED,
        "email" => INVALID_EMAIL,
        "length" => {
            let len = value
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);
            let min = error.params.get("min").and_then(|v| v.as_u64());
            match (len, min) {
                (Some(len), Some(min)) if len < min => TOO_SHORT,
                _ => TOO_LONG,
            }
        }
        _ => "Invalid value",
    };
    message.to_string()
}

fn join_path(prefix: Option<&str>, field: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, field),
        None => field.to_string(),
    }
}

/// `resident_address_line1` -> `residentAddressLine1`
pub fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SampleForm {
        #[validate(length(min = 3, max = 5))]
        short_name: String,
        #[validate(email)]
        contact_email: String,
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("resident_address_line1"), "residentAddressLine1");
        assert_eq!(to_camel_case("spa_path"), "spaPath");
        assert_eq!(to_camel_case("name"), "name");
    }

    #[test]
    fn test_empty_required_field_reports_required() {
        let form = SampleForm {
            short_name: String::new(),
            contact_email: String::new(),
        };
        let violations = field_violations(&form.validate().unwrap_err());
        assert_eq!(
            violations,
            vec![
                FieldViolation::new("contactEmail", REQUIRED),
                FieldViolation::new("shortName", REQUIRED),
            ]
        );
    }

    #[test]
    fn test_length_bounds_report_direction() {
        let too_short = SampleForm {
            short_name: "ab".to_string(),
            contact_email: "a@example.com".to_string(),
        };
        let violations = field_violations(&too_short.validate().unwrap_err());
        assert_eq!(violations, vec![FieldViolation::new("shortName", TOO_SHORT)]);

        let too_long = SampleForm {
            short_name: "abcdef".to_string(),
            contact_email: "not-an-email".to_string(),
        };
        let violations = field_violations(&too_long.validate().unwrap_err());
        assert_eq!(
            violations,
            vec![
                FieldViolation::new("contactEmail", INVALID_EMAIL),
                FieldViolation::new("shortName", TOO_LONG),
            ]
        );
    }
}
