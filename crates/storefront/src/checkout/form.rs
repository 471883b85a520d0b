//! Checkout shipping form state.
//!
//! Pre-seeded from the identity's saved profile and validated as a whole:
//! `validate` reports every missing required field at once so the caller can
//! surface the full list without losing entered data.

use serde::{Deserialize, Serialize};

use crate::models::user::UserProfile;

/// Shipping and contact fields collected at checkout.
///
/// All fields are independently editable. `special_instructions` is the only
/// optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub special_instructions: String,
}

/// A required shipping field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    FirstName,
    LastName,
    Address,
    City,
    Zip,
    Phone,
}

impl RequiredField {
    /// Human-readable field name for validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Address => "address",
            Self::City => "city",
            Self::Zip => "zip code",
            Self::Phone => "phone number",
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl CheckoutForm {
    /// Seed the form from a saved profile.
    ///
    /// The profile's single `name` field is split into first and last name at
    /// the first whitespace boundary; all other fields are copied verbatim,
    /// defaulting to empty strings when absent.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        let (first_name, last_name) = split_name(&profile.name);
        Self {
            first_name,
            last_name,
            address: profile.address.clone(),
            city: profile.city.clone(),
            zip: profile.zip.clone(),
            phone: profile.phone.clone(),
            special_instructions: String::new(),
        }
    }

    /// Check all required fields, reporting every one that is empty or
    /// whitespace-only.
    ///
    /// # Errors
    ///
    /// Returns the full list of missing required fields.
    pub fn validate(&self) -> Result<(), Vec<RequiredField>> {
        let mut missing = Vec::new();

        let required = [
            (RequiredField::FirstName, self.first_name.as_str()),
            (RequiredField::LastName, self.last_name.as_str()),
            (RequiredField::Address, self.address.as_str()),
            (RequiredField::City, self.city.as_str()),
            (RequiredField::Zip, self.zip.as_str()),
            (RequiredField::Phone, self.phone.as_str()),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }

        if missing.is_empty() { Ok(()) } else { Err(missing) }
    }

    /// Full name for receipts and order summaries.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }
}

/// Split a full name at the first whitespace boundary.
fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_owned(), rest.trim_start().to_owned()),
        None => (trimmed.to_owned(), String::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            name: name.to_owned(),
            email: "maria@example.com".to_owned(),
            address: "123 Mango St".to_owned(),
            city: "Cebu".to_owned(),
            zip: "6000".to_owned(),
            phone: "09171234567".to_owned(),
        }
    }

    #[test]
    fn test_from_profile_splits_name_at_first_whitespace() {
        let form = CheckoutForm::from_profile(&profile("Maria Clara Santos"));
        assert_eq!(form.first_name, "Maria");
        assert_eq!(form.last_name, "Clara Santos");
        assert_eq!(form.address, "123 Mango St");
        assert_eq!(form.phone, "09171234567");
        assert!(form.special_instructions.is_empty());
    }

    #[test]
    fn test_from_profile_single_word_name() {
        let form = CheckoutForm::from_profile(&profile("Maria"));
        assert_eq!(form.first_name, "Maria");
        assert_eq!(form.last_name, "");
    }

    #[test]
    fn test_from_profile_empty_name() {
        let form = CheckoutForm::from_profile(&profile(""));
        assert_eq!(form.first_name, "");
        assert_eq!(form.last_name, "");
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let form = CheckoutForm {
            first_name: "Maria".to_owned(),
            last_name: "  ".to_owned(), // whitespace-only counts as missing
            ..CheckoutForm::default()
        };

        let missing = form.validate().unwrap_err();
        assert_eq!(
            missing,
            vec![
                RequiredField::LastName,
                RequiredField::Address,
                RequiredField::City,
                RequiredField::Zip,
                RequiredField::Phone,
            ]
        );
    }

    #[test]
    fn test_validate_passes_with_all_required_fields() {
        let mut form = CheckoutForm::from_profile(&profile("Maria Santos"));
        assert!(form.validate().is_ok());

        // Special instructions are optional.
        form.special_instructions = String::new();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_full_name() {
        let form = CheckoutForm::from_profile(&profile("Maria Santos"));
        assert_eq!(form.full_name(), "Maria Santos");
    }
}
