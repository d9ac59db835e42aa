use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use ts_rs::TS;

/// Pipeline stage of a lead
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Lost => "Lost",
            LeadStatus::Won => "Won",
        }
    }
}

/// Channel a lead came in through
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadSource {
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    Other,
}

impl LeadSource {
    pub fn label(&self) -> &'static str {
        match self {
            LeadSource::Website => "Website",
            LeadSource::FacebookAds => "Facebook Ads",
            LeadSource::GoogleAds => "Google Ads",
            LeadSource::Referral => "Referral",
            LeadSource::Events => "Events",
            LeadSource::Other => "Other",
        }
    }
}

/// A lead record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Lead {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Kept as sent; see [`Lead::source_kind`]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub source: Option<String>,
    /// Kept as sent so values this client does not know still render;
    /// missing or null reads as `new`
    #[serde(default = "default_status", deserialize_with = "status_or_new")]
    pub status: String,
    /// 0-100 when present
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub lead_value: Option<f64>,
}

impl Lead {
    /// `None` for a status outside [`LeadStatus`]
    pub fn status_kind(&self) -> Option<LeadStatus> {
        self.status.parse().ok()
    }

    pub fn source_kind(&self) -> Option<LeadSource> {
        self.source.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<LeadSource>,
    pub status: LeadStatus,
    pub score: Option<i32>,
    pub lead_value: Option<f64>,
}

/// One page of the lead listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LeadsPage {
    #[serde(default)]
    pub data: Vec<Lead>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// Treats a missing, null or blank string as `None`
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_status() -> String {
    LeadStatus::default().to_string()
}

fn status_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(empty_as_none::<D, String>(deserializer)?.unwrap_or_else(default_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&LeadStatus::Contacted).unwrap();
        assert_eq!(json, "\"contacted\"");
        assert_eq!("won".parse::<LeadStatus>().unwrap(), LeadStatus::Won);
        assert_eq!(LeadStatus::Qualified.as_ref(), "qualified");
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&LeadSource::FacebookAds).unwrap();
        assert_eq!(json, "\"facebook_ads\"");
        assert_eq!(
            "google_ads".parse::<LeadSource>().unwrap(),
            LeadSource::GoogleAds
        );
        assert!("tv".parse::<LeadSource>().is_err());
    }

    #[test]
    fn test_lead_deserialization_with_sparse_fields() {
        let lead: Lead = serde_json::from_str(
            r#"{"id": 7, "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com",
                "source": "", "score": null, "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(lead.id, 7);
        assert_eq!(lead.source, None);
        assert_eq!(lead.status, "new");
        assert_eq!(lead.status_kind(), Some(LeadStatus::New));
        assert_eq!(lead.score, None);
        assert_eq!(lead.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_unknown_enum_values_are_kept() {
        let page: LeadsPage = serde_json::from_str(
            r#"{"data": [
                    {"id": 1, "status": "archived", "source": "tradeshow"},
                    {"id": 2, "status": null, "source": null},
                    {"id": 3, "status": "won", "source": "google_ads"}
                ], "total": 3, "totalPages": 1}"#,
        )
        .unwrap();

        assert_eq!(page.data.len(), 3);
        assert_eq!(page.data[0].status, "archived");
        assert_eq!(page.data[0].status_kind(), None);
        assert_eq!(page.data[0].source.as_deref(), Some("tradeshow"));
        assert_eq!(page.data[0].source_kind(), None);
        assert_eq!(page.data[1].status_kind(), Some(LeadStatus::New));
        assert_eq!(page.data[1].source, None);
        assert_eq!(page.data[2].status_kind(), Some(LeadStatus::Won));
        assert_eq!(page.data[2].source_kind(), Some(LeadSource::GoogleAds));
    }

    #[test]
    fn test_leads_page_defaults() {
        let page: LeadsPage = serde_json::from_str("{}").unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);

        let page: LeadsPage =
            serde_json::from_str(r#"{"data": [], "total": 41, "totalPages": 3}"#).unwrap();
        assert_eq!(page.total_pages, 3);
    }
}
