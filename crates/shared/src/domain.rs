use std::fmt;

use serde::{Deserialize, Serialize};

/// Depth of an entry in the PSGC administrative hierarchy, top-level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    Region,
    Province,
    CityOrMunicipality,
    Barangay,
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 4] = [
        GeoLevel::Region,
        GeoLevel::Province,
        GeoLevel::CityOrMunicipality,
        GeoLevel::Barangay,
    ];

    pub fn index(self) -> usize {
        match self {
            GeoLevel::Region => 0,
            GeoLevel::Province => 1,
            GeoLevel::CityOrMunicipality => 2,
            GeoLevel::Barangay => 3,
        }
    }

    pub fn parent(self) -> Option<GeoLevel> {
        match self {
            GeoLevel::Region => None,
            GeoLevel::Province => Some(GeoLevel::Region),
            GeoLevel::CityOrMunicipality => Some(GeoLevel::Province),
            GeoLevel::Barangay => Some(GeoLevel::CityOrMunicipality),
        }
    }

    /// Levels strictly below `self`, nearest first.
    pub fn descendants(self) -> &'static [GeoLevel] {
        &Self::ALL[self.index() + 1..]
    }

    pub fn label(self) -> &'static str {
        match self {
            GeoLevel::Region => "regions",
            GeoLevel::Province => "provinces",
            GeoLevel::CityOrMunicipality => "cities and municipalities",
            GeoLevel::Barangay => "barangays",
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalityKind {
    City,
    Municipality,
}

/// One entry of the geography hierarchy as consumed by the registration flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoNode {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    /// Only set on the city/municipality level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<LocalityKind>,
}

impl GeoNode {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            parent_code: None,
            locality: None,
        }
    }

    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    pub fn with_locality(mut self, locality: LocalityKind) -> Self {
        self.locality = Some(locality);
        self
    }

    pub fn is_city(&self) -> bool {
        self.locality == Some(LocalityKind::City)
    }
}
