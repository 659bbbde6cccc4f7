//! Custom field rules used by the `Validate` derives on the input models.

use std::borrow::Cow;

use validator::ValidationError;

pub const GENDERS: [&str; 4] = ["Male", "Female", "Other", "Rather not say"];

fn rejected(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn known_gender(gender: &str) -> Result<(), ValidationError> {
    if GENDERS.contains(&gender) {
        Ok(())
    } else {
        Err(rejected("gender", "please select a valid gender option"))
    }
}

/// Digits plus space, `+`, `-` and parentheses. Length is checked separately.
pub fn phone_chars(value: &str) -> Result<(), ValidationError> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if allowed {
        Ok(())
    } else {
        Err(rejected(
            "phone",
            "only digits, spaces, +, - and parentheses are allowed",
        ))
    }
}

/// The domain part of an address must carry a dot: `ana@example` is refused.
pub fn dotted_domain(email: &str) -> Result<(), ValidationError> {
    let dotted = email
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if dotted {
        Ok(())
    } else {
        Err(rejected("email", "please enter a valid email address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genders() {
        assert!(known_gender("Rather not say").is_ok());
        assert!(known_gender("female").is_err());
    }

    #[test]
    fn phone_characters() {
        assert!(phone_chars("+1 (555) 123-4567").is_ok());
        assert!(phone_chars("555-CALL-NOW").is_err());
    }

    #[test]
    fn email_domains() {
        assert!(dotted_domain("ana@school.co.uk").is_ok());
        assert!(dotted_domain("ana@example").is_err());
        assert!(dotted_domain("ana@.com").is_err());
    }
}
