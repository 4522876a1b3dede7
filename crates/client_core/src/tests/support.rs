use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{GeoNode, LocalityKind},
    error::{LookupError, SubmitError},
    protocol::{RegistrationRequest, RegistrationResponse},
};
use tokio::sync::Mutex;

use crate::{GeographyLookup, RegistrationSubmitter};

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("date")
}

/// In-memory PSGC stand-in: two regions, three provinces, one city and one municipality.
pub(crate) struct FakeGeography {
    regions: Vec<GeoNode>,
    provinces: Vec<GeoNode>,
    localities: HashMap<String, Vec<GeoNode>>,
    city_barangays: HashMap<String, Vec<GeoNode>>,
    municipality_barangays: HashMap<String, Vec<GeoNode>>,
    failing: HashSet<&'static str>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeGeography {
    pub(crate) fn sample() -> Self {
        Self {
            regions: vec![
                GeoNode::new("R1", "Ilocos Region"),
                GeoNode::new("R2", "Cordillera Administrative Region"),
            ],
            provinces: vec![
                GeoNode::new("P1", "Ilocos Norte").with_parent("R1"),
                GeoNode::new("P2", "Ilocos Sur").with_parent("R1"),
                GeoNode::new("P3", "Benguet").with_parent("R2"),
            ],
            localities: HashMap::from([(
                "P1".to_string(),
                vec![
                    GeoNode::new("C1", "City of Laoag")
                        .with_parent("P1")
                        .with_locality(LocalityKind::City),
                    GeoNode::new("M1", "Bangui")
                        .with_parent("P1")
                        .with_locality(LocalityKind::Municipality),
                ],
            )]),
            city_barangays: HashMap::from([(
                "C1".to_string(),
                vec![
                    GeoNode::new("B1", "San Lorenzo").with_parent("C1"),
                    GeoNode::new("B2", "Santa Joaquina").with_parent("C1"),
                ],
            )]),
            municipality_barangays: HashMap::from([(
                "M1".to_string(),
                vec![GeoNode::new("B3", "Abaca").with_parent("M1")],
            )]),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes one endpoint fail: `regions`, `provinces`, `localities`, `city_barangays`,
    /// or `municipality_barangays`.
    pub(crate) fn failing(mut self, endpoint: &'static str) -> Self {
        self.failing.insert(endpoint);
        self
    }

    pub(crate) async fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String, endpoint: &'static str) -> Result<(), LookupError> {
        self.calls.lock().await.push(call);
        if self.failing.contains(endpoint) {
            return Err(LookupError::Status {
                status: 503,
                url: format!("http://psgc.test/{endpoint}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GeographyLookup for FakeGeography {
    async fn fetch_regions(&self) -> Result<Vec<GeoNode>, LookupError> {
        self.record("regions".into(), "regions").await?;
        Ok(self.regions.clone())
    }

    async fn fetch_provinces(&self) -> Result<Vec<GeoNode>, LookupError> {
        self.record("provinces".into(), "provinces").await?;
        Ok(self.provinces.clone())
    }

    async fn fetch_cities_and_municipalities(
        &self,
        province_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError> {
        self.record(format!("localities:{province_code}"), "localities")
            .await?;
        Ok(self
            .localities
            .get(province_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_barangays_by_city(&self, city_code: &str) -> Result<Vec<GeoNode>, LookupError> {
        self.record(format!("city_barangays:{city_code}"), "city_barangays")
            .await?;
        Ok(self
            .city_barangays
            .get(city_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_barangays_by_municipality(
        &self,
        municipality_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError> {
        self.record(
            format!("municipality_barangays:{municipality_code}"),
            "municipality_barangays",
        )
        .await?;
        Ok(self
            .municipality_barangays
            .get(municipality_code)
            .cloned()
            .unwrap_or_default())
    }
}

/// Replays queued results, then succeeds for every further submission.
pub(crate) struct FakeSubmitter {
    results: Mutex<VecDeque<Result<RegistrationResponse, SubmitError>>>,
    pub(crate) requests: Mutex<Vec<RegistrationRequest>>,
}

impl FakeSubmitter {
    pub(crate) fn accepting() -> Self {
        Self::with_results(Vec::new())
    }

    pub(crate) fn with_results(results: Vec<Result<RegistrationResponse, SubmitError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

pub(crate) fn accepted() -> RegistrationResponse {
    RegistrationResponse {
        success: true,
        message: "Registered".into(),
        user_id: Some("u-42".into()),
        token: Some("token-abc".into()),
    }
}

#[async_trait]
impl RegistrationSubmitter for FakeSubmitter {
    async fn submit(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError> {
        self.requests.lock().await.push(request.clone());
        self.results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(accepted()))
    }
}
