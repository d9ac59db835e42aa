//! Translation of the listing filters into backend query parameters.
//!
//! The backend understands `filter[<field>][<op>]=<value>` pairs next to the
//! plain `page` and `limit` parameters, with `op` one of `contains`,
//! `equals`, `between` (value `"min,max"`) or `gt`.

use shared_types::FilterState;

/// Marker for open-ended range codes such as `"80+"`
pub const OPEN_RANGE_MARKER: char = '+';

/// Upper bound assumed for open-ended value ranges. Kept client-side only;
/// the backend receives just the `gt` filter.
pub const VALUE_RANGE_CEILING: u64 = 999_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    Equals,
    Between,
    Gt,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Contains => "contains",
            FilterOp::Equals => "equals",
            FilterOp::Between => "between",
            FilterOp::Gt => "gt",
        }
    }
}

/// A parsed range code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeFilter {
    Between { min: String, max: String },
    Above { min: String, ceiling: Option<u64> },
}

impl RangeFilter {
    /// Parses `"a-b"` into a between range and `"a+"` (or anything without
    /// a numeric upper bound) into an open range. Returns `None` when there
    /// is no usable lower bound.
    pub fn parse(code: &str, ceiling: Option<u64>) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }

        if code.contains(OPEN_RANGE_MARKER) {
            let min = code.replace(OPEN_RANGE_MARKER, "").trim().to_string();
            return Self::above(min, ceiling);
        }

        let mut parts = code.splitn(2, '-');
        let min = parts.next().unwrap_or_default().trim().to_string();
        let max = parts.next().map(str::trim).unwrap_or_default();

        if is_number(max) {
            if min.is_empty() {
                return None;
            }
            Some(RangeFilter::Between {
                min,
                max: max.to_string(),
            })
        } else {
            Self::above(min, ceiling)
        }
    }

    fn above(min: String, ceiling: Option<u64>) -> Option<Self> {
        if min.is_empty() {
            None
        } else {
            Some(RangeFilter::Above { min, ceiling })
        }
    }

    pub fn op(&self) -> FilterOp {
        match self {
            RangeFilter::Between { .. } => FilterOp::Between,
            RangeFilter::Above { .. } => FilterOp::Gt,
        }
    }

    /// Value sent to the backend for this range
    pub fn value(&self) -> String {
        match self {
            RangeFilter::Between { min, max } => format!("{},{}", min, max),
            RangeFilter::Above { min, .. } => min.clone(),
        }
    }

    /// Human readable bounds, e.g. `80..100` or `10000..999999999`
    pub fn describe(&self) -> String {
        match self {
            RangeFilter::Between { min, max } => format!("{}..{}", min, max),
            RangeFilter::Above {
                min,
                ceiling: Some(ceiling),
            } => format!("{}..{}", min, ceiling),
            RangeFilter::Above { min, ceiling: None } => format!("> {}", min),
        }
    }
}

fn is_number(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

/// Ordered query parameters for `GET /api/leads`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    params: Vec<(String, String)>,
}

impl LeadQuery {
    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    fn push_filter(&mut self, field: &str, op: FilterOp, value: impl Into<String>) {
        self.push(format!("filter[{}][{}]", field, op.as_str()), value);
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn page(&self) -> Option<u32> {
        self.get("page").and_then(|p| p.parse().ok())
    }

    /// `?page=1&limit=20&...`, form-urlencoded
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        format!("?{}", serializer.finish())
    }
}

pub fn build_query(filters: &FilterState, page: u32, limit: u32) -> LeadQuery {
    let mut query = LeadQuery::default();
    query.push("page", page.to_string());
    query.push("limit", limit.to_string());

    let search = filters.search.trim();
    if !search.is_empty() {
        query.push_filter("email", FilterOp::Contains, search);
    }
    if let Some(status) = filters.status {
        query.push_filter("status", FilterOp::Equals, status.as_ref());
    }
    if let Some(source) = filters.source {
        query.push_filter("source", FilterOp::Equals, source.as_ref());
    }

    if let Some(range) = RangeFilter::parse(&filters.score_range, None) {
        query.push_filter("score", range.op(), range.value());
    } else if !filters.score_range.trim().is_empty() {
        tracing::debug!("Ignoring unusable score range {:?}", filters.score_range);
    }

    if let Some(range) = RangeFilter::parse(&filters.value_range, Some(VALUE_RANGE_CEILING)) {
        query.push_filter("lead_value", range.op(), range.value());
    } else if !filters.value_range.trim().is_empty() {
        tracing::debug!("Ignoring unusable value range {:?}", filters.value_range);
    }

    query
}
