//! Server-side gate for the public forms. Everything that reaches the store
//! has been through one of these normalizers.

use thiserror::Error;

use crate::api::{ContactRequest, WaitlistSignupRequest};
use crate::models::{
    ANONYMOUS, DEFAULT_SOURCE, NOT_SPECIFIED, NewContactEntry, NewWaitlistEntry, SPECIALTIES,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a known specialty")]
    UnknownSpecialty(String),
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
}

pub const MIN_PASSWORD_LEN: usize = 8;

/// Trim and lower-case an address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize and check an address. Only the shape `local@domain` is enforced.
pub fn validated_email(raw: &str) -> Result<String, ValidationError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(ValidationError::Missing("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidEmail(email)),
    }
}

fn or_not_specified(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_SPECIFIED.to_string(),
    }
}

impl WaitlistSignupRequest {
    pub fn normalize(&self) -> Result<NewWaitlistEntry, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Missing("name"));
        }
        let email = validated_email(&self.email)?;

        let specialty = or_not_specified(self.specialty.as_deref());
        if specialty != NOT_SPECIFIED && !SPECIALTIES.contains(&specialty.as_str()) {
            return Err(ValidationError::UnknownSpecialty(specialty));
        }

        let source = match self.source.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_SOURCE.to_string(),
        };

        Ok(NewWaitlistEntry {
            name: name.to_string(),
            email,
            specialty,
            location: or_not_specified(self.location.as_deref()),
            source,
        })
    }
}

impl ContactRequest {
    pub fn normalize(&self) -> Result<NewContactEntry, ValidationError> {
        let email = validated_email(&self.email)?;
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ValidationError::Missing("message"));
        }
        let name = match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => ANONYMOUS.to_string(),
        };

        Ok(NewContactEntry {
            name,
            email,
            message: message.to_string(),
        })
    }
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, specialty: &str, location: &str) -> WaitlistSignupRequest {
        WaitlistSignupRequest {
            name: name.into(),
            email: email.into(),
            specialty: Some(specialty.into()),
            location: Some(location.into()),
            source: None,
        }
    }

    #[test]
    fn waitlist_signup_is_trimmed_and_defaulted() {
        let entry = signup(" Ana ", "ANA@X.IE", "", "").normalize().unwrap();
        assert_eq!(entry.name, "Ana");
        assert_eq!(entry.email, "ana@x.ie");
        assert_eq!(entry.specialty, NOT_SPECIFIED);
        assert_eq!(entry.location, NOT_SPECIFIED);
        assert_eq!(entry.source, DEFAULT_SOURCE);
    }

    #[test]
    fn waitlist_keeps_known_specialty_and_trimmed_location() {
        let entry = signup("Bo", "bo@x.ie", "Cardiology", "  Cork ").normalize().unwrap();
        assert_eq!(entry.specialty, "Cardiology");
        assert_eq!(entry.location, "Cork");
    }

    #[test]
    fn waitlist_missing_fields_are_rejected() {
        assert_eq!(
            signup("   ", "a@b.ie", "", "").normalize(),
            Err(ValidationError::Missing("name"))
        );
        assert_eq!(
            signup("Ana", "  ", "", "").normalize(),
            Err(ValidationError::Missing("email"))
        );
    }

    #[test]
    fn waitlist_unknown_specialty_is_rejected() {
        let err = signup("Ana", "a@b.ie", "Astrology", "").normalize().unwrap_err();
        assert_eq!(err, ValidationError::UnknownSpecialty("Astrology".into()));
    }

    #[test]
    fn omitted_optional_fields_default() {
        let req = WaitlistSignupRequest {
            name: "Ana".into(),
            email: "a@b.ie".into(),
            specialty: None,
            location: None,
            source: Some("referral".into()),
        };
        let entry = req.normalize().unwrap();
        assert_eq!(entry.specialty, NOT_SPECIFIED);
        assert_eq!(entry.location, NOT_SPECIFIED);
        assert_eq!(entry.source, "referral");
    }

    #[test]
    fn contact_blank_name_becomes_anonymous() {
        let req = ContactRequest {
            name: Some("  ".into()),
            email: " Someone@Example.COM ".into(),
            message: " hello \n".into(),
        };
        let entry = req.normalize().unwrap();
        assert_eq!(entry.name, ANONYMOUS);
        assert_eq!(entry.email, "someone@example.com");
        assert_eq!(entry.message, "hello");
    }

    #[test]
    fn contact_requires_message() {
        let req = ContactRequest {
            name: None,
            email: "a@b.ie".into(),
            message: "   ".into(),
        };
        assert_eq!(req.normalize(), Err(ValidationError::Missing("message")));
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validated_email("nobody").is_err());
        assert!(validated_email("@x.ie").is_err());
        assert!(validated_email("a@").is_err());
        assert!(validated_email("a@b@c").is_err());
        assert_eq!(validated_email(" A@B.ie ").unwrap(), "a@b.ie");
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password("1234567").is_err());
        assert!(check_password("12345678").is_ok());
    }
}
