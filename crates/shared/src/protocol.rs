use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{GeoNode, LocalityKind};

/// PSGC publishes `false` (and sometimes `null` or `""`) where a code does not apply.
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(code)) if !code.trim().is_empty() => Some(code),
        Some(Value::Number(code)) => Some(code.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default, deserialize_with = "lenient_code")]
    pub island_group_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub psgc10_digit_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceRecord {
    pub code: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_code")]
    pub region_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub island_group_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub psgc10_digit_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMunicipalityRecord {
    pub code: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_code")]
    pub province_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub psgc10_digit_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub city_class: Option<String>,
    #[serde(default)]
    pub is_city: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarangayRecord {
    pub code: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_code")]
    pub city_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub municipality_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub psgc10_digit_code: Option<String>,
}

impl From<RegionRecord> for GeoNode {
    fn from(value: RegionRecord) -> Self {
        GeoNode::new(value.code, value.name)
    }
}

impl From<ProvinceRecord> for GeoNode {
    fn from(value: ProvinceRecord) -> Self {
        GeoNode {
            code: value.code,
            name: value.name,
            parent_code: value.region_code,
            locality: None,
        }
    }
}

impl From<CityMunicipalityRecord> for GeoNode {
    fn from(value: CityMunicipalityRecord) -> Self {
        let locality = if value.is_city {
            LocalityKind::City
        } else {
            LocalityKind::Municipality
        };
        GeoNode {
            code: value.code,
            name: value.name,
            parent_code: value.province_code,
            locality: Some(locality),
        }
    }
}

impl From<BarangayRecord> for GeoNode {
    fn from(value: BarangayRecord) -> Self {
        GeoNode {
            code: value.code,
            name: value.name,
            parent_code: value.city_code.or(value.municipality_code),
            locality: None,
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    /// Days since 1970-01-01.
    #[serde(rename = "birthDate")]
    pub birth_date_day_count: i64,
    #[serde(rename = "province")]
    pub province_code: String,
    #[serde(rename = "city")]
    pub city_or_municipality_code: String,
    #[serde(rename = "barangay")]
    pub barangay_code: String,
    pub street: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "attachments")]
    pub attachment_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub fn epoch_day(date: NaiveDate) -> i64 {
    (date - NaiveDate::default()).num_days()
}
