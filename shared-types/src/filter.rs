use crate::lead::{empty_as_none, LeadSource, LeadStatus};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters applied to the lead listing. Every field is optional and an
/// empty value leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Substring matched against the lead's email
    #[serde(default)]
    pub search: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub source: Option<LeadSource>,
    /// Range code such as "80-100" or "80+"
    #[serde(default)]
    pub score_range: String,
    /// Range code such as "1000-4999" or "10000+"
    #[serde(default)]
    pub value_range: String,
}

impl FilterState {
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    pub fn active_count(&self) -> usize {
        [
            !self.search.trim().is_empty(),
            self.status.is_some(),
            self.source.is_some(),
            !self.score_range.trim().is_empty(),
            !self.value_range.trim().is_empty(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }
}

/// Pagination metadata for the lead listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            total: 0,
            total_pages: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_state_camel_case() {
        let filters = FilterState {
            score_range: "80-100".to_string(),
            status: Some(LeadStatus::Won),
            ..FilterState::default()
        };

        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["scoreRange"], "80-100");
        assert_eq!(json["status"], "won");
        assert_eq!(json["valueRange"], "");
    }

    #[test]
    fn test_filter_state_blank_selects_are_unconstrained() {
        let filters: FilterState =
            serde_json::from_str(r#"{"search": "", "status": "", "source": ""}"#).unwrap();
        assert!(filters.is_empty());
        assert_eq!(filters, FilterState::cleared());
    }

    #[test]
    fn test_active_count() {
        let filters = FilterState {
            search: "acme".to_string(),
            source: Some(LeadSource::Referral),
            value_range: "10000+".to_string(),
            ..FilterState::default()
        };
        assert_eq!(filters.active_count(), 3);
    }

    #[test]
    fn test_pagination_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::with_limit(0).limit, 1);
    }
}
