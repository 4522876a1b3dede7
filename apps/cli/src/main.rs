mod config;
mod draft;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    GeographyLookup, PsgcClient, RegistrationClient, RegistrationEvent, RegistrationSession,
    WizardStep,
};
use shared::{
    domain::{GeoNode, LocalityKind},
    error::GENERIC_REGISTRATION_FAILURE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::load_settings, draft::DraftFile};

#[derive(Parser, Debug)]
#[command(name = "grabjob", about = "GrabJob registration client")]
struct Cli {
    #[arg(long, default_value = "grabjob.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Regions,
    Provinces {
        #[arg(long)]
        region: Option<String>,
    },
    Localities {
        #[arg(long)]
        province: String,
    },
    Barangays {
        #[arg(long)]
        locality: String,
        /// Treat `--locality` as a city instead of a municipality.
        #[arg(long)]
        city: bool,
    },
    /// Walks the registration wizard with the values in a TOML draft and submits it.
    Register {
        #[arg(long)]
        draft: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let psgc = PsgcClient::new(settings.psgc_url()?)?;

    match cli.command {
        Command::Regions => print_nodes(&psgc.fetch_regions().await?),
        Command::Provinces { region } => {
            let provinces = psgc.fetch_provinces().await?;
            let provinces: Vec<GeoNode> = match region {
                Some(region) => provinces
                    .into_iter()
                    .filter(|node| node.parent_code.as_deref() == Some(region.as_str()))
                    .collect(),
                None => provinces,
            };
            print_nodes(&provinces);
        }
        Command::Localities { province } => {
            print_nodes(&psgc.fetch_cities_and_municipalities(&province).await?)
        }
        Command::Barangays { locality, city } => {
            let barangays = if city {
                psgc.fetch_barangays_by_city(&locality).await?
            } else {
                psgc.fetch_barangays_by_municipality(&locality).await?
            };
            print_nodes(&barangays);
        }
        Command::Register { draft } => {
            let draft = DraftFile::load(&draft)?;
            let submitter = RegistrationClient::new(settings.api_url()?)?;
            let session = RegistrationSession::new(Arc::new(psgc), Arc::new(submitter));
            register(session, &draft).await?;
        }
    }

    Ok(())
}

fn print_nodes(nodes: &[GeoNode]) {
    for node in nodes {
        match node.locality {
            Some(LocalityKind::City) => println!("{}\t{}\tcity", node.code, node.name),
            Some(LocalityKind::Municipality) => {
                println!("{}\t{}\tmunicipality", node.code, node.name)
            }
            None => println!("{}\t{}", node.code, node.name),
        }
    }
}

async fn register(mut session: RegistrationSession, draft: &DraftFile) -> Result<()> {
    session.initialize();
    session.settle().await;
    ensure_levels_loaded(&session)?;

    for event in draft.personal_events() {
        session.dispatch(event);
    }
    advance(&mut session)?;

    let selections = [
        RegistrationEvent::SelectRegion(draft.region.clone()),
        RegistrationEvent::SelectProvince(draft.province.clone()),
        RegistrationEvent::SelectCityOrMunicipality(draft.city_or_municipality.clone()),
        RegistrationEvent::SelectBarangay(draft.barangay.clone()),
    ];
    for event in selections {
        session.dispatch(event);
        session.settle().await;
        ensure_levels_loaded(&session)?;
    }
    session.dispatch(RegistrationEvent::UpdateStreet(draft.street.clone()));
    advance(&mut session)?;

    for event in draft.credential_events() {
        session.dispatch(event);
    }
    advance(&mut session)?;

    session.dispatch(RegistrationEvent::UpdateAttachments(draft.attachments.clone()));
    session.dispatch(RegistrationEvent::Submit);
    session.settle().await;

    let state = session.wizard_state();
    if !state.is_complete {
        let message = state.submit_error.as_deref().unwrap_or(GENERIC_REGISTRATION_FAILURE);
        bail!("{message}");
    }
    info!(email = %state.draft.email, "registration accepted");
    println!("registered {}", state.draft.email);
    Ok(())
}

fn ensure_levels_loaded(session: &RegistrationSession) -> Result<()> {
    if let Some((_, error)) = session.address_state().errors().next() {
        bail!("{error}");
    }
    Ok(())
}

fn advance(session: &mut RegistrationSession) -> Result<()> {
    let step: WizardStep = session.wizard_state().current_step;
    session.dispatch(RegistrationEvent::NextStep);

    let state = session.wizard_state();
    if state.current_step == step {
        let problems: Vec<String> = state
            .draft
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        bail!("{} step is incomplete: {}", step.title(), problems.join("; "));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
