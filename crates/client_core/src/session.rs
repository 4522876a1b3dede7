//! Async owner of one registration wizard.
//!
//! Effects produced by the controller run on spawned tasks; each task posts a [`Completion`]
//! back to the session, which applies it on the owner's side and republishes snapshots.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use shared::{error::SubmitError, protocol::RegistrationResponse};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::{
    address::{execute_fetch, AddressUiState, FetchOutcome, FetchRequest},
    wizard::{Effect, RegistrationEvent, WizardController, WizardState},
    GeographyLookup, RegistrationSubmitter,
};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug)]
pub enum Completion {
    Fetched(FetchOutcome),
    Submitted(Result<RegistrationResponse, SubmitError>),
}

pub struct RegistrationSession {
    controller: WizardController,
    lookup: Arc<dyn GeographyLookup>,
    submitter: Arc<dyn RegistrationSubmitter>,
    today: Clock,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    wizard_tx: watch::Sender<WizardState>,
    address_tx: watch::Sender<AddressUiState>,
}

impl RegistrationSession {
    pub fn new(
        lookup: Arc<dyn GeographyLookup>,
        submitter: Arc<dyn RegistrationSubmitter>,
    ) -> Self {
        let controller = WizardController::new();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (wizard_tx, _) = watch::channel(controller.state().clone());
        let (address_tx, _) = watch::channel(controller.address_state().clone());
        Self {
            controller,
            lookup,
            submitter,
            today: Arc::new(|| Local::now().date_naive()),
            completions_tx,
            completions_rx,
            in_flight: 0,
            wizard_tx,
            address_tx,
        }
    }

    /// Replaces the wall clock used for the age check.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn wizard_state(&self) -> &WizardState {
        self.controller.state()
    }

    pub fn address_state(&self) -> &AddressUiState {
        self.controller.address_state()
    }

    pub fn subscribe_wizard(&self) -> watch::Receiver<WizardState> {
        self.wizard_tx.subscribe()
    }

    pub fn subscribe_address(&self) -> watch::Receiver<AddressUiState> {
        self.address_tx.subscribe()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Starts the region load. Must be called from within a tokio runtime.
    pub fn initialize(&mut self) {
        let request = self.controller.initialize();
        self.spawn_fetch(request);
        self.publish();
    }

    pub fn dispatch(&mut self, event: RegistrationEvent) {
        let today = (self.today)();
        match self.controller.handle(event, today) {
            Some(Effect::Fetch(request)) => self.spawn_fetch(request),
            Some(Effect::Submit(request)) => {
                let submitter = Arc::clone(&self.submitter);
                let tx = self.completions_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let result = submitter.submit(&request).await;
                    let _ = tx.send(Completion::Submitted(result));
                });
            }
            None => {}
        }
        self.publish();
    }

    /// Waits for and applies one completion. Returns `false` when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(completion) = self.completions_rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;

        match completion {
            Completion::Fetched(outcome) => {
                let level = outcome.level;
                if !self.controller.apply_fetch(outcome) {
                    debug!(%level, "stale lookup completion dropped");
                }
            }
            Completion::Submitted(result) => self.controller.apply_submission(result),
        }
        self.publish();
        true
    }

    /// Applies completions until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        let lookup = Arc::clone(&self.lookup);
        let tx = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = execute_fetch(lookup.as_ref(), request).await;
            let _ = tx.send(Completion::Fetched(outcome));
        });
    }

    fn publish(&self) {
        self.wizard_tx.send_replace(self.controller.state().clone());
        self.address_tx
            .send_replace(self.controller.address_state().clone());
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
