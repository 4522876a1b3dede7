use async_trait::async_trait;
use shared::{
    domain::GeoNode,
    error::{LookupError, SubmitError},
    protocol::{RegistrationRequest, RegistrationResponse},
};

pub mod address;
pub mod session;
pub mod transport;
pub mod validation;
pub mod wizard;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

pub use address::{AddressCascadeController, AddressUiState, CascadeLevelState, SelectionError};
pub use session::RegistrationSession;
pub use transport::{PsgcClient, RegistrationClient};
pub use wizard::{RegistrationDraft, RegistrationEvent, WizardController, WizardState, WizardStep};

/// Remote administrative-geography lookup backing the address cascade.
#[async_trait]
pub trait GeographyLookup: Send + Sync {
    async fn fetch_regions(&self) -> Result<Vec<GeoNode>, LookupError>;
    /// Unfiltered; callers narrow by `parent_code` themselves.
    async fn fetch_provinces(&self) -> Result<Vec<GeoNode>, LookupError>;
    async fn fetch_cities_and_municipalities(
        &self,
        province_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError>;
    async fn fetch_barangays_by_city(&self, city_code: &str) -> Result<Vec<GeoNode>, LookupError>;
    async fn fetch_barangays_by_municipality(
        &self,
        municipality_code: &str,
    ) -> Result<Vec<GeoNode>, LookupError>;
}

#[async_trait]
pub trait RegistrationSubmitter: Send + Sync {
    async fn submit(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError>;
}
