use shared::domain::{GeoLevel, GeoNode, LocalityKind};

use super::*;
use crate::test_support::{accepted, date, today};

fn answer(controller: &mut WizardController, effect: Option<Effect>, items: Vec<GeoNode>) {
    let request = match effect {
        Some(Effect::Fetch(request)) => request,
        other => panic!("expected a fetch effect, got {other:?}"),
    };
    assert!(controller.apply_fetch(FetchOutcome {
        level: request.level,
        generation: request.generation,
        result: Ok(items),
    }));
}

fn fill_personal(controller: &mut WizardController) {
    controller.handle(RegistrationEvent::UpdateFirstName("Juan".into()), today());
    controller.handle(RegistrationEvent::UpdateLastName("Dela Cruz".into()), today());
    controller.handle(
        RegistrationEvent::UpdateBirthDate(Some(date(1995, 6, 12))),
        today(),
    );
}

fn fill_address(controller: &mut WizardController) {
    let effect = controller.handle(RegistrationEvent::SelectRegion("R1".into()), today());
    answer(
        controller,
        effect,
        vec![GeoNode::new("P1", "Ilocos Norte").with_parent("R1")],
    );
    let effect = controller.handle(RegistrationEvent::SelectProvince("P1".into()), today());
    answer(
        controller,
        effect,
        vec![GeoNode::new("C1", "City of Laoag").with_locality(LocalityKind::City)],
    );
    let effect = controller.handle(
        RegistrationEvent::SelectCityOrMunicipality("C1".into()),
        today(),
    );
    answer(controller, effect, vec![GeoNode::new("B1", "San Lorenzo")]);
    controller.handle(RegistrationEvent::SelectBarangay("B1".into()), today());
    controller.handle(RegistrationEvent::UpdateStreet("12 Rizal St".into()), today());
}

fn fill_credentials(controller: &mut WizardController) {
    controller.handle(
        RegistrationEvent::UpdateEmail("juan@example.com".into()),
        today(),
    );
    controller.handle(
        RegistrationEvent::UpdatePassword("abcdefgh".into()),
        today(),
    );
    controller.handle(
        RegistrationEvent::UpdateConfirmPassword("abcdefgh".into()),
        today(),
    );
}

fn at_attachments_step() -> WizardController {
    let mut controller = WizardController::new();
    fill_personal(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());
    fill_address(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());
    fill_credentials(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());
    assert_eq!(controller.state().current_step, WizardStep::Attachments);
    controller
}

#[test]
fn step_indices_are_linear() {
    assert_eq!(WizardStep::Personal.next(), WizardStep::Address);
    assert_eq!(WizardStep::Attachments.next(), WizardStep::Attachments);
    assert_eq!(WizardStep::Personal.previous(), WizardStep::Personal);
    assert_eq!(WizardStep::from_index(2), Some(WizardStep::Credentials));
    assert_eq!(WizardStep::from_index(4), None);
}

#[test]
fn next_step_with_errors_stays_and_attaches_errors() {
    let mut controller = WizardController::new();

    let effect = controller.handle(RegistrationEvent::NextStep, today());

    assert!(effect.is_none());
    let state = controller.state();
    assert_eq!(state.current_step, WizardStep::Personal);
    assert_eq!(state.draft.errors.len(), 3);
    assert_eq!(
        state.draft.error(Field::FirstName),
        Some("First name is required")
    );
}

#[test]
fn passing_validation_advances_and_clears_errors() {
    let mut controller = WizardController::new();
    controller.handle(RegistrationEvent::NextStep, today());
    fill_personal(&mut controller);

    controller.handle(RegistrationEvent::NextStep, today());

    assert_eq!(controller.state().current_step, WizardStep::Address);
    assert!(controller.state().draft.errors.is_empty());
}

#[test]
fn address_step_blocks_until_chain_and_street_are_set() {
    let mut controller = WizardController::new();
    fill_personal(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());

    controller.handle(RegistrationEvent::NextStep, today());
    assert_eq!(controller.state().current_step, WizardStep::Address);
    assert_eq!(controller.state().draft.errors.len(), 4);

    fill_address(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());
    assert_eq!(controller.state().current_step, WizardStep::Credentials);
}

#[test]
fn previous_step_floors_at_zero_without_validation() {
    let mut controller = WizardController::new();
    fill_personal(&mut controller);
    controller.handle(RegistrationEvent::NextStep, today());

    controller.handle(RegistrationEvent::PreviousStep, today());
    controller.handle(RegistrationEvent::PreviousStep, today());

    assert_eq!(controller.state().current_step, WizardStep::Personal);
    assert!(controller.state().draft.errors.is_empty());
}

#[test]
fn next_step_saturates_at_attachments() {
    let mut controller = at_attachments_step();
    controller.handle(RegistrationEvent::NextStep, today());
    assert_eq!(controller.state().current_step, WizardStep::Attachments);
}

#[test]
fn submit_before_last_step_is_ignored() {
    let mut controller = WizardController::new();
    fill_personal(&mut controller);

    assert!(controller
        .handle(RegistrationEvent::Submit, today())
        .is_none());
    assert!(!controller.state().is_submitting);
}

#[test]
fn submit_builds_request_from_draft() {
    let mut controller = at_attachments_step();
    controller.handle(
        RegistrationEvent::UpdateAttachments(vec!["id-front.jpg".into(), "nbi.pdf".into()]),
        today(),
    );

    let Some(Effect::Submit(request)) = controller.handle(RegistrationEvent::Submit, today())
    else {
        panic!("expected submit effect");
    };

    assert_eq!(request.username, "juan@example.com");
    assert_eq!(request.birth_date_day_count, epoch_day(date(1995, 6, 12)));
    assert_eq!(request.province_code, "P1");
    assert_eq!(request.city_or_municipality_code, "C1");
    assert_eq!(request.barangay_code, "B1");
    assert_eq!(request.street, "12 Rizal St");
    assert_eq!(request.attachment_refs, vec!["id-front.jpg", "nbi.pdf"]);
    assert!(controller.state().is_submitting);

    assert!(
        controller
            .handle(RegistrationEvent::Submit, today())
            .is_none(),
        "second submit while in flight"
    );
}

#[test]
fn empty_attachments_can_be_submitted() {
    let mut controller = at_attachments_step();
    assert!(matches!(
        controller.handle(RegistrationEvent::Submit, today()),
        Some(Effect::Submit(_))
    ));
}

#[test]
fn submit_failure_keeps_wizard_open_for_retry() {
    let mut controller = at_attachments_step();
    controller.handle(RegistrationEvent::Submit, today());

    controller.apply_submission(Err(SubmitError::Rejected {
        status: Some(409),
        message: "Email already registered".into(),
    }));

    let state = controller.state();
    assert!(!state.is_complete);
    assert!(!state.is_submitting);
    assert_eq!(state.submit_error.as_deref(), Some("Email already registered"));

    let retry = controller.handle(RegistrationEvent::Submit, today());
    assert!(matches!(retry, Some(Effect::Submit(_))));
    assert!(controller.state().submit_error.is_none());

    controller.apply_submission(Ok(accepted()));
    assert!(controller.state().is_complete);
    assert!(controller.state().submit_error.is_none());
}

#[test]
fn declined_response_is_a_failure() {
    let mut controller = at_attachments_step();
    controller.handle(RegistrationEvent::Submit, today());

    controller.apply_submission(Ok(RegistrationResponse {
        success: false,
        message: String::new(),
        user_id: None,
        token: None,
    }));

    assert!(!controller.state().is_complete);
    assert_eq!(
        controller.state().submit_error.as_deref(),
        Some(GENERIC_REGISTRATION_FAILURE)
    );
}

#[test]
fn completed_wizard_ignores_further_events() {
    let mut controller = at_attachments_step();
    controller.handle(RegistrationEvent::Submit, today());
    controller.apply_submission(Ok(accepted()));

    controller.handle(RegistrationEvent::PreviousStep, today());
    controller.handle(RegistrationEvent::UpdateFirstName("Pedro".into()), today());

    assert_eq!(controller.state().current_step, WizardStep::Attachments);
    assert_eq!(controller.state().draft.first_name, "Juan");
    assert!(controller
        .handle(RegistrationEvent::Submit, today())
        .is_none());
}

#[test]
fn edits_during_submission_are_ignored() {
    let mut controller = at_attachments_step();
    let Some(Effect::Submit(sent)) = controller.handle(RegistrationEvent::Submit, today()) else {
        panic!("expected submit effect");
    };

    assert!(controller
        .handle(RegistrationEvent::PreviousStep, today())
        .is_none());
    controller.handle(
        RegistrationEvent::UpdateEmail("other@example.com".into()),
        today(),
    );
    assert!(controller
        .handle(RegistrationEvent::SelectRegion("R2".into()), today())
        .is_none());
    controller.handle(RegistrationEvent::ClearError, today());
    assert!(controller.state().is_submitting);

    controller.apply_submission(Ok(accepted()));

    let state = controller.state();
    assert!(state.is_complete);
    assert_eq!(state.current_step, WizardStep::Attachments);
    assert_eq!(state.draft.email, sent.username);
    assert_eq!(state.draft.address.province_code, sent.province_code);
    assert_eq!(state.draft.to_request(), Some(sent));
}

#[test]
fn clear_error_resets_submit_and_lookup_errors() {
    let mut controller = at_attachments_step();
    controller.handle(RegistrationEvent::Submit, today());
    controller.apply_submission(Err(SubmitError::Transport("Registration failed".into())));

    let effect = controller.handle(RegistrationEvent::SelectRegion("R1".into()), today());
    let Some(Effect::Fetch(request)) = effect else {
        panic!("expected fetch");
    };
    controller.apply_fetch(FetchOutcome {
        level: request.level,
        generation: request.generation,
        result: Err(shared::error::LookupError::Transport("dns".into())),
    });
    assert!(controller.address_state().provinces.error.is_some());

    controller.handle(RegistrationEvent::ClearError, today());

    assert!(controller.state().submit_error.is_none());
    assert_eq!(controller.address_state().errors().count(), 0);
}

#[test]
fn refused_selection_leaves_draft_untouched() {
    let mut controller = WizardController::new();

    let effect = controller.handle(RegistrationEvent::SelectProvince("P1".into()), today());

    assert!(effect.is_none());
    assert!(controller.state().draft.address.province_code.is_empty());
    assert_eq!(
        controller
            .address_state()
            .level(GeoLevel::CityOrMunicipality)
            .items
            .len(),
        0
    );
}
