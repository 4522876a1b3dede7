//! Registration wizard: step sequencing, per-step validation gating, and final submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    error::{SubmitError, GENERIC_REGISTRATION_FAILURE},
    protocol::{epoch_day, RegistrationRequest, RegistrationResponse},
};
use tracing::{debug, info, warn};

use crate::{
    address::{
        AddressCascadeController, AddressSelection, AddressUiState, FetchOutcome, FetchRequest,
        SelectionError,
    },
    validation::{validate_step, Field, FieldErrors},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Personal,
    Address,
    Credentials,
    Attachments,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Personal,
        WizardStep::Address,
        WizardStep::Credentials,
        WizardStep::Attachments,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::Personal => 0,
            WizardStep::Address => 1,
            WizardStep::Credentials => 2,
            WizardStep::Attachments => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(WizardStep::Attachments)
    }

    pub fn previous(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(WizardStep::Personal)
    }

    pub fn is_last(self) -> bool {
        self == WizardStep::Attachments
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal information",
            WizardStep::Address => "Address",
            WizardStep::Credentials => "Account credentials",
            WizardStep::Attachments => "Attachments",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub address: AddressSelection,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Opaque file references, in the order the user attached them.
    pub attachments: Vec<String>,
    pub errors: FieldErrors,
}

impl RegistrationDraft {
    /// `None` while the birth date is still missing.
    pub fn to_request(&self) -> Option<RegistrationRequest> {
        let birth_date = self.birth_date?;
        Some(RegistrationRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date_day_count: epoch_day(birth_date),
            province_code: self.address.province_code.clone(),
            city_or_municipality_code: self.address.city_or_municipality_code.clone(),
            barangay_code: self.address.barangay_code.clone(),
            street: self.address.street.clone(),
            username: self.email.clone(),
            password: self.password.clone(),
            attachment_refs: self.attachments.clone(),
        })
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub draft: RegistrationDraft,
    pub is_submitting: bool,
    pub submit_error: Option<String>,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    UpdateFirstName(String),
    UpdateLastName(String),
    UpdateBirthDate(Option<NaiveDate>),
    UpdateEmail(String),
    UpdatePassword(String),
    UpdateConfirmPassword(String),
    UpdateStreet(String),
    UpdateAttachments(Vec<String>),
    SelectRegion(String),
    SelectProvince(String),
    SelectCityOrMunicipality(String),
    SelectBarangay(String),
    NextStep,
    PreviousStep,
    Submit,
    ClearError,
}

impl RegistrationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistrationEvent::UpdateFirstName(_) => "update_first_name",
            RegistrationEvent::UpdateLastName(_) => "update_last_name",
            RegistrationEvent::UpdateBirthDate(_) => "update_birth_date",
            RegistrationEvent::UpdateEmail(_) => "update_email",
            RegistrationEvent::UpdatePassword(_) => "update_password",
            RegistrationEvent::UpdateConfirmPassword(_) => "update_confirm_password",
            RegistrationEvent::UpdateStreet(_) => "update_street",
            RegistrationEvent::UpdateAttachments(_) => "update_attachments",
            RegistrationEvent::SelectRegion(_) => "select_region",
            RegistrationEvent::SelectProvince(_) => "select_province",
            RegistrationEvent::SelectCityOrMunicipality(_) => "select_city_or_municipality",
            RegistrationEvent::SelectBarangay(_) => "select_barangay",
            RegistrationEvent::NextStep => "next_step",
            RegistrationEvent::PreviousStep => "previous_step",
            RegistrationEvent::Submit => "submit",
            RegistrationEvent::ClearError => "clear_error",
        }
    }
}

/// Work the owner has to perform on behalf of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch(FetchRequest),
    Submit(RegistrationRequest),
}

fn fetch_effect(selected: Result<Option<FetchRequest>, SelectionError>) -> Option<Effect> {
    match selected {
        Ok(request) => request.map(Effect::Fetch),
        Err(err) => {
            warn!(error = %err, "address selection refused");
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct WizardController {
    state: WizardState,
    address: AddressCascadeController,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn address_state(&self) -> &AddressUiState {
        self.address.state()
    }

    pub fn initialize(&mut self) -> FetchRequest {
        self.address.initialize()
    }

    /// Single mutation entry point. `today` anchors the age check.
    pub fn handle(&mut self, event: RegistrationEvent, today: NaiveDate) -> Option<Effect> {
        if self.state.is_complete {
            debug!(event = event.name(), "registration already complete; ignoring event");
            return None;
        }
        if self.state.is_submitting && event != RegistrationEvent::ClearError {
            debug!(event = event.name(), "submission in flight; ignoring event");
            return None;
        }

        let draft = &mut self.state.draft;
        match event {
            RegistrationEvent::UpdateFirstName(value) => draft.first_name = value,
            RegistrationEvent::UpdateLastName(value) => draft.last_name = value,
            RegistrationEvent::UpdateBirthDate(value) => draft.birth_date = value,
            RegistrationEvent::UpdateEmail(value) => draft.email = value,
            RegistrationEvent::UpdatePassword(value) => draft.password = value,
            RegistrationEvent::UpdateConfirmPassword(value) => draft.confirm_password = value,
            RegistrationEvent::UpdateStreet(value) => draft.address.street = value,
            RegistrationEvent::UpdateAttachments(value) => draft.attachments = value,
            RegistrationEvent::SelectRegion(code) => {
                return fetch_effect(self.address.select_region(&mut draft.address, &code));
            }
            RegistrationEvent::SelectProvince(code) => {
                return fetch_effect(self.address.select_province(&mut draft.address, &code));
            }
            RegistrationEvent::SelectCityOrMunicipality(code) => {
                return fetch_effect(
                    self.address.select_city_or_municipality(&mut draft.address, &code),
                );
            }
            RegistrationEvent::SelectBarangay(code) => {
                if let Err(err) = self.address.select_barangay(&mut draft.address, &code) {
                    warn!(error = %err, "barangay selection refused");
                }
            }
            RegistrationEvent::NextStep => self.move_to_next_step(today),
            RegistrationEvent::PreviousStep => {
                self.state.current_step = self.state.current_step.previous();
            }
            RegistrationEvent::Submit => return self.begin_submission(),
            RegistrationEvent::ClearError => {
                self.state.submit_error = None;
                self.address.clear_errors();
            }
        }
        None
    }

    pub fn apply_fetch(&mut self, outcome: FetchOutcome) -> bool {
        self.address.apply(outcome)
    }

    pub fn apply_submission(&mut self, result: Result<RegistrationResponse, SubmitError>) {
        self.state.is_submitting = false;
        match result {
            Ok(response) if response.success => {
                info!(user_id = ?response.user_id, "registration complete");
                self.state.is_complete = true;
                self.state.submit_error = None;
            }
            Ok(response) => {
                warn!(message = %response.message, "registration declined");
                self.state.submit_error = Some(if response.message.trim().is_empty() {
                    GENERIC_REGISTRATION_FAILURE.to_string()
                } else {
                    response.message
                });
            }
            Err(err) => {
                warn!(error = %err, rejected = err.is_rejection(), "registration failed");
                self.state.submit_error = Some(err.message());
            }
        }
    }

    fn move_to_next_step(&mut self, today: NaiveDate) {
        let step = self.state.current_step;
        let errors = validate_step(step, &self.state.draft, today);
        let passed = errors.is_empty();
        self.state.draft.errors = errors;

        if passed {
            self.state.current_step = step.next();
        } else {
            debug!(
                step = step.index(),
                errors = self.state.draft.errors.len(),
                "step validation failed"
            );
        }
    }

    fn begin_submission(&mut self) -> Option<Effect> {
        if !self.state.current_step.is_last() {
            warn!(
                step = self.state.current_step.index(),
                "submit ignored before the attachments step"
            );
            return None;
        }
        let Some(request) = self.state.draft.to_request() else {
            self.state.submit_error = Some("Birth date is required".to_string());
            return None;
        };

        self.state.is_submitting = true;
        self.state.submit_error = None;
        Some(Effect::Submit(request))
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
