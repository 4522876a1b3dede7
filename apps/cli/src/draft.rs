//! Registration drafts read from TOML for non-interactive sign-up.

use std::{fs, path::Path};

use anyhow::Context;
use chrono::NaiveDate;
use client_core::RegistrationEvent;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DraftFile {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub region: String,
    pub province: String,
    pub city_or_municipality: String,
    pub barangay: String,
    pub street: String,
    pub email: String,
    pub password: String,
    /// Defaults to `password` when omitted.
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl DraftFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read draft '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse draft '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn personal_events(&self) -> Vec<RegistrationEvent> {
        vec![
            RegistrationEvent::UpdateFirstName(self.first_name.clone()),
            RegistrationEvent::UpdateLastName(self.last_name.clone()),
            RegistrationEvent::UpdateBirthDate(self.birth_date),
        ]
    }

    pub fn credential_events(&self) -> Vec<RegistrationEvent> {
        let confirm_password = self
            .confirm_password
            .clone()
            .unwrap_or_else(|| self.password.clone());
        vec![
            RegistrationEvent::UpdateEmail(self.email.clone()),
            RegistrationEvent::UpdatePassword(self.password.clone()),
            RegistrationEvent::UpdateConfirmPassword(confirm_password),
        ]
    }
}
