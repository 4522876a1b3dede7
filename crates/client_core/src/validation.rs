//! Per-step field validation for the registration wizard.
//!
//! Every validator collects all failures for its step instead of stopping at the first one.

use std::{collections::BTreeMap, fmt};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::wizard::{RegistrationDraft, WizardStep};

pub const MIN_AGE_YEARS: u32 = 18;
pub const MAX_AGE_YEARS: u32 = 100;
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    BirthDate,
    Province,
    City,
    Barangay,
    Street,
    Email,
    Password,
    ConfirmPassword,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::BirthDate => "birthDate",
            Field::Province => "province",
            Field::City => "city",
            Field::Barangay => "barangay",
            Field::Street => "street",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type FieldErrors = BTreeMap<Field, String>;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Completed years between `birth_date` and `today`; `None` for a date in the future.
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth_date > today {
        return None;
    }

    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

pub fn validate_personal(draft: &RegistrationDraft, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(&draft.first_name) {
        errors.insert(Field::FirstName, "First name is required".into());
    }
    if is_blank(&draft.last_name) {
        errors.insert(Field::LastName, "Last name is required".into());
    }
    match draft.birth_date {
        None => {
            errors.insert(Field::BirthDate, "Birth date is required".into());
        }
        Some(birth_date) => {
            let in_range = age_in_years(birth_date, today)
                .is_some_and(|age| (MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age));
            if !in_range {
                errors.insert(
                    Field::BirthDate,
                    format!("Age must be between {MIN_AGE_YEARS} and {MAX_AGE_YEARS} years"),
                );
            }
        }
    }

    errors
}

pub fn validate_address(draft: &RegistrationDraft) -> FieldErrors {
    let address = &draft.address;
    let mut errors = FieldErrors::new();

    if is_blank(&address.province_code) {
        errors.insert(Field::Province, "Province is required".into());
    }
    if is_blank(&address.city_or_municipality_code) {
        errors.insert(Field::City, "City or municipality is required".into());
    }
    if is_blank(&address.barangay_code) {
        errors.insert(Field::Barangay, "Barangay is required".into());
    }
    if is_blank(&address.street) {
        errors.insert(Field::Street, "Street address is required".into());
    }

    errors
}

pub fn validate_credentials(draft: &RegistrationDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(&draft.email) {
        errors.insert(Field::Email, "Email is required".into());
    }
    if draft.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.insert(
            Field::Password,
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters"),
        );
    }
    if draft.password != draft.confirm_password {
        errors.insert(Field::ConfirmPassword, "Passwords do not match".into());
    }

    errors
}

pub fn validate_step(step: WizardStep, draft: &RegistrationDraft, today: NaiveDate) -> FieldErrors {
    match step {
        WizardStep::Personal => validate_personal(draft, today),
        WizardStep::Address => validate_address(draft),
        WizardStep::Credentials => validate_credentials(draft),
        WizardStep::Attachments => FieldErrors::new(),
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
