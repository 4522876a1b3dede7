//! Four-level dependent address selection: region → province → city/municipality → barangay.
//!
//! The controller is a synchronous reducer. Selections mutate the draft's [`AddressSelection`]
//! and the option lists immediately, and hand back a [`FetchRequest`] describing the lookup the
//! owner has to run. Results come back through [`AddressCascadeController::apply`], which drops
//! any outcome issued under a generation the level has since moved past.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{GeoLevel, GeoNode, LocalityKind},
    error::LookupError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::GeographyLookup;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeLevelState {
    pub items: Vec<GeoNode>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl CascadeLevelState {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    pub fn find(&self, code: &str) -> Option<&GeoNode> {
        self.items.iter().find(|node| node.code == code)
    }
}

/// Option lists for every cascade level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressUiState {
    pub regions: CascadeLevelState,
    pub provinces: CascadeLevelState,
    pub localities: CascadeLevelState,
    pub barangays: CascadeLevelState,
}

impl AddressUiState {
    pub fn level(&self, level: GeoLevel) -> &CascadeLevelState {
        match level {
            GeoLevel::Region => &self.regions,
            GeoLevel::Province => &self.provinces,
            GeoLevel::CityOrMunicipality => &self.localities,
            GeoLevel::Barangay => &self.barangays,
        }
    }

    fn level_mut(&mut self, level: GeoLevel) -> &mut CascadeLevelState {
        match level {
            GeoLevel::Region => &mut self.regions,
            GeoLevel::Province => &mut self.provinces,
            GeoLevel::CityOrMunicipality => &mut self.localities,
            GeoLevel::Barangay => &mut self.barangays,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = (GeoLevel, &str)> + '_ {
        GeoLevel::ALL.iter().filter_map(|level| {
            self.level(*level)
                .error
                .as_deref()
                .map(|error| (*level, error))
        })
    }
}

/// The address part of the registration draft.
///
/// Codes form a prefix chain: a non-empty code implies every ancestor code is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSelection {
    pub region_code: String,
    pub province_code: String,
    pub city_or_municipality_code: String,
    pub is_city_selected: bool,
    pub barangay_code: String,
    pub street: String,
}

impl AddressSelection {
    pub fn code(&self, level: GeoLevel) -> &str {
        match level {
            GeoLevel::Region => &self.region_code,
            GeoLevel::Province => &self.province_code,
            GeoLevel::CityOrMunicipality => &self.city_or_municipality_code,
            GeoLevel::Barangay => &self.barangay_code,
        }
    }

    fn set_code(&mut self, level: GeoLevel, code: &str) {
        let slot = match level {
            GeoLevel::Region => &mut self.region_code,
            GeoLevel::Province => &mut self.province_code,
            GeoLevel::CityOrMunicipality => &mut self.city_or_municipality_code,
            GeoLevel::Barangay => &mut self.barangay_code,
        };
        *slot = code.to_string();
    }

    fn clear_below(&mut self, level: GeoLevel) {
        for descendant in level.descendants() {
            self.set_code(*descendant, "");
            if *descendant == GeoLevel::CityOrMunicipality {
                self.is_city_selected = false;
            }
        }
    }

    pub fn locality_kind(&self) -> Option<LocalityKind> {
        if self.city_or_municipality_code.is_empty() {
            None
        } else if self.is_city_selected {
            Some(LocalityKind::City)
        } else {
            Some(LocalityKind::Municipality)
        }
    }

    pub fn is_prefix_chain(&self) -> bool {
        GeoLevel::ALL.windows(2).all(|pair| {
            self.code(pair[1]).is_empty() || !self.code(pair[0]).is_empty()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchQuery {
    Regions,
    ProvincesOfRegion { region_code: String },
    LocalitiesOfProvince { province_code: String },
    BarangaysOfCity { city_code: String },
    BarangaysOfMunicipality { municipality_code: String },
}

/// A lookup the owner must run; `generation` ties the answer to the selection that asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub level: GeoLevel,
    pub generation: u64,
    pub query: FetchQuery,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub level: GeoLevel,
    pub generation: u64,
    pub result: Result<Vec<GeoNode>, LookupError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("cannot select from {level} before its parent level is selected")]
    ParentNotSelected { level: GeoLevel },
    #[error("{code} is not among the loaded cities and municipalities")]
    UnknownLocality { code: String },
}

#[derive(Debug, Default)]
pub struct AddressCascadeController {
    state: AddressUiState,
    generations: [u64; 4],
}

impl AddressCascadeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AddressUiState {
        &self.state
    }

    pub fn generation(&self, level: GeoLevel) -> u64 {
        self.generations[level.index()]
    }

    /// Starts the region load. Called once by the session owner.
    pub fn initialize(&mut self) -> FetchRequest {
        self.request(GeoLevel::Region, FetchQuery::Regions)
    }

    pub fn select_region(
        &mut self,
        selection: &mut AddressSelection,
        code: &str,
    ) -> Result<Option<FetchRequest>, SelectionError> {
        self.select(selection, GeoLevel::Region, code)?;
        if code.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.request(
            GeoLevel::Province,
            FetchQuery::ProvincesOfRegion {
                region_code: code.to_string(),
            },
        )))
    }

    pub fn select_province(
        &mut self,
        selection: &mut AddressSelection,
        code: &str,
    ) -> Result<Option<FetchRequest>, SelectionError> {
        self.select(selection, GeoLevel::Province, code)?;
        if code.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.request(
            GeoLevel::CityOrMunicipality,
            FetchQuery::LocalitiesOfProvince {
                province_code: code.to_string(),
            },
        )))
    }

    /// The city/municipality distinction is resolved from the loaded option list.
    pub fn select_city_or_municipality(
        &mut self,
        selection: &mut AddressSelection,
        code: &str,
    ) -> Result<Option<FetchRequest>, SelectionError> {
        let kind = if code.is_empty() {
            None
        } else {
            let node = self
                .state
                .localities
                .find(code)
                .ok_or_else(|| SelectionError::UnknownLocality {
                    code: code.to_string(),
                })?;
            Some(node.locality.unwrap_or(LocalityKind::Municipality))
        };

        self.select(selection, GeoLevel::CityOrMunicipality, code)?;
        let Some(kind) = kind else {
            return Ok(None);
        };
        selection.is_city_selected = kind == LocalityKind::City;

        let query = match kind {
            LocalityKind::City => FetchQuery::BarangaysOfCity {
                city_code: code.to_string(),
            },
            LocalityKind::Municipality => FetchQuery::BarangaysOfMunicipality {
                municipality_code: code.to_string(),
            },
        };
        Ok(Some(self.request(GeoLevel::Barangay, query)))
    }

    pub fn select_barangay(
        &mut self,
        selection: &mut AddressSelection,
        code: &str,
    ) -> Result<(), SelectionError> {
        self.select(selection, GeoLevel::Barangay, code)
    }

    /// Applies a finished lookup. Returns `false` when the outcome was superseded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let level = outcome.level;
        let current = self.generation(level);
        if outcome.generation != current {
            debug!(
                %level,
                generation = outcome.generation,
                current,
                "discarding superseded lookup result"
            );
            return false;
        }

        let slot = self.state.level_mut(level);
        *slot = match outcome.result {
            Ok(items) => {
                info!(%level, count = items.len(), "lookup loaded");
                CascadeLevelState {
                    items,
                    is_loading: false,
                    error: None,
                }
            }
            Err(err) => {
                warn!(%level, error = %err, "lookup failed");
                CascadeLevelState {
                    items: Vec::new(),
                    is_loading: false,
                    error: Some(format!("Failed to load {level}: {err}")),
                }
            }
        };
        true
    }

    pub fn clear_errors(&mut self) {
        for level in GeoLevel::ALL {
            self.state.level_mut(level).error = None;
        }
    }

    /// Records `code` at `level`, then invalidates every descendant selection and option list.
    fn select(
        &mut self,
        selection: &mut AddressSelection,
        level: GeoLevel,
        code: &str,
    ) -> Result<(), SelectionError> {
        if !code.is_empty() {
            if let Some(parent) = level.parent() {
                if selection.code(parent).is_empty() {
                    return Err(SelectionError::ParentNotSelected { level });
                }
            }
        }

        selection.set_code(level, code);
        if level == GeoLevel::CityOrMunicipality {
            selection.is_city_selected = false;
        }
        selection.clear_below(level);

        for descendant in level.descendants() {
            self.generations[descendant.index()] += 1;
            *self.state.level_mut(*descendant) = CascadeLevelState::default();
        }
        Ok(())
    }

    fn request(&mut self, level: GeoLevel, query: FetchQuery) -> FetchRequest {
        let slot = &mut self.generations[level.index()];
        *slot += 1;
        let generation = *slot;
        *self.state.level_mut(level) = CascadeLevelState::loading();
        FetchRequest {
            level,
            generation,
            query,
        }
    }
}

/// Runs `request` against `lookup`. Province results are narrowed to the requested region here.
pub async fn execute_fetch(lookup: &dyn GeographyLookup, request: FetchRequest) -> FetchOutcome {
    let result = match &request.query {
        FetchQuery::Regions => lookup.fetch_regions().await,
        FetchQuery::ProvincesOfRegion { region_code } => {
            lookup.fetch_provinces().await.map(|provinces| {
                provinces
                    .into_iter()
                    .filter(|province| {
                        province.parent_code.as_deref() == Some(region_code.as_str())
                    })
                    .collect()
            })
        }
        FetchQuery::LocalitiesOfProvince { province_code } => {
            lookup.fetch_cities_and_municipalities(province_code).await
        }
        FetchQuery::BarangaysOfCity { city_code } => {
            lookup.fetch_barangays_by_city(city_code).await
        }
        FetchQuery::BarangaysOfMunicipality { municipality_code } => {
            lookup
                .fetch_barangays_by_municipality(municipality_code)
                .await
        }
    };

    FetchOutcome {
        level: request.level,
        generation: request.generation,
        result,
    }
}

#[cfg(test)]
#[path = "tests/address_tests.rs"]
mod tests;
