//! reqwest-backed implementations of the lookup and registration collaborators.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::GeoNode,
    error::{ApiErrorBody, LookupError, SubmitError, GENERIC_REGISTRATION_FAILURE},
    protocol::{
        BarangayRecord, CityMunicipalityRecord, ProvinceRecord, RegionRecord, RegistrationRequest,
        RegistrationResponse,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{GeographyLookup, RegistrationSubmitter};

#[derive(Debug, Error)]
#[error("base url cannot carry path segments: {0}")]
pub struct InvalidBaseUrl(pub String);

fn checked_base(base_url: Url) -> Result<Url, InvalidBaseUrl> {
    if base_url.cannot_be_a_base() {
        return Err(InvalidBaseUrl(base_url.to_string()));
    }
    Ok(base_url)
}

/// Appends percent-encoded segments to `base`, keeping any prefix path it already has.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Client for the PSGC geography API.
#[derive(Clone)]
pub struct PsgcClient {
    http: Client,
    base_url: Url,
}

impl PsgcClient {
    pub fn new(base_url: Url) -> Result<Self, InvalidBaseUrl> {
        Ok(Self {
            http: Client::new(),
            base_url: checked_base(base_url)?,
        })
    }

    async fn get_list<T>(&self, segments: &[&str]) -> Result<Vec<T>, LookupError>
    where
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, segments);
        debug!(%url, "psgc lookup");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "psgc lookup rejected");
            return Err(LookupError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;
        serde_json::from_slice(&body).map_err(|err| LookupError::Decode(err.to_string()))
    }

    async fn get_nodes<T>(&self, segments: &[&str]) -> Result<Vec<GeoNode>, LookupError>
    where
        T: DeserializeOwned + Into<GeoNode>,
    {
        let records: Vec<T> = self.get_list(segments).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl GeographyLookup for PsgcClient {
    async fn fetch_regions(&self) -> Result<Vec<GeoNode>, LookupError> {
        self.get_nodes::<RegionRecord>(&["regions"]).await
    }

    async fn fetch_provinces(&self) -> Result<Vec<GeoNode>, LookupError> {
        self.get_nodes::<ProvinceRecord>(&["provinces"]).await
    }

    async fn fetch_cities_and_municipalities(
        &self,
        province_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError> {
        self.get_nodes::<CityMunicipalityRecord>(&[
            "provinces",
            province_code,
            "cities-municipalities",
        ])
        .await
    }

    async fn fetch_barangays_by_city(&self, city_code: &str) -> Result<Vec<GeoNode>, LookupError> {
        self.get_nodes::<BarangayRecord>(&["cities", city_code, "barangays"])
            .await
    }

    async fn fetch_barangays_by_municipality(
        &self,
        municipality_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError> {
        self.get_nodes::<BarangayRecord>(&["municipalities", municipality_code, "barangays"])
            .await
    }
}

/// Client for the GrabJob registration endpoint.
#[derive(Clone)]
pub struct RegistrationClient {
    http: Client,
    base_url: Url,
}

impl RegistrationClient {
    pub fn new(base_url: Url) -> Result<Self, InvalidBaseUrl> {
        Ok(Self {
            http: Client::new(),
            base_url: checked_base(base_url)?,
        })
    }
}

#[async_trait]
impl RegistrationSubmitter for RegistrationClient {
    async fn submit(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError> {
        let url = endpoint(&self.base_url, &["auth", "register"]);
        debug!(%url, username = %request.username, "submitting registration");

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "registration transport failure");
                SubmitError::Transport(format!("{GENERIC_REGISTRATION_FAILURE}: {err}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            SubmitError::Transport(format!("{GENERIC_REGISTRATION_FAILURE}: {err}"))
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "registration rejected");
            return Err(SubmitError::Rejected {
                status: Some(status.as_u16()),
                message: ApiErrorBody::message_from_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| SubmitError::Decode(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
