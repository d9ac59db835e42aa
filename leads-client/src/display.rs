//! Labels, badge colours and number formatting for the lead table.

use shared_types::{LeadSource, LeadStatus, Pagination};
use std::str::FromStr;
use strum::{Display, IntoEnumIterator};

/// How many page buttons the footer offers at most
pub const MAX_PAGE_BUTTONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BadgeColor {
    Blue,
    Yellow,
    Green,
    Orange,
    Red,
    Purple,
    Gray,
}

impl BadgeColor {
    /// Foreground colour escape for terminal output
    pub fn ansi(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "\x1b[34m",
            BadgeColor::Yellow => "\x1b[33m",
            BadgeColor::Green => "\x1b[32m",
            BadgeColor::Orange => "\x1b[38;5;208m",
            BadgeColor::Red => "\x1b[31m",
            BadgeColor::Purple => "\x1b[35m",
            BadgeColor::Gray => "\x1b[90m",
        }
    }
}

pub fn status_color(status: LeadStatus) -> BadgeColor {
    match status {
        LeadStatus::New => BadgeColor::Blue,
        LeadStatus::Contacted => BadgeColor::Yellow,
        LeadStatus::Qualified => BadgeColor::Green,
        LeadStatus::Lost => BadgeColor::Red,
        LeadStatus::Won => BadgeColor::Purple,
    }
}

/// Label and colour for a raw status value. Unknown values are shown
/// verbatim in gray.
pub fn status_badge(raw: &str) -> (String, BadgeColor) {
    match LeadStatus::from_str(raw) {
        Ok(status) => (status.label().to_string(), status_color(status)),
        Err(_) => (raw.to_string(), BadgeColor::Gray),
    }
}

pub fn source_label(raw: &str) -> String {
    LeadSource::from_str(raw)
        .map(|source| source.label().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn score_color(score: i32) -> BadgeColor {
    match score {
        s if s >= 80 => BadgeColor::Green,
        s if s >= 60 => BadgeColor::Yellow,
        s if s >= 40 => BadgeColor::Orange,
        _ => BadgeColor::Red,
    }
}

/// `None` when the lead has no score; the table shows `-` instead
pub fn score_badge(score: Option<i32>) -> Option<(String, BadgeColor)> {
    score.map(|s| (s.to_string(), score_color(s)))
}

/// `$12,345` style, at most two decimals
pub fn format_lead_value(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };

    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{}", sign, grouped, fraction)
    }
}

pub fn format_location(city: Option<&str>, state: Option<&str>) -> String {
    let city = city.map(str::trim).filter(|c| !c.is_empty());
    let state = state.map(str::trim).filter(|s| !s.is_empty());
    match (city, state) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => "-".to_string(),
    }
}

/// A selectable filter value and its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const SCORE_RANGE_OPTIONS: &[FilterOption] = &[
    FilterOption { value: "80-100", label: "High (80-100)" },
    FilterOption { value: "60-79", label: "Medium (60-79)" },
    FilterOption { value: "40-59", label: "Low (40-59)" },
    FilterOption { value: "0-39", label: "Very Low (0-39)" },
];

pub const VALUE_RANGE_OPTIONS: &[FilterOption] = &[
    FilterOption { value: "10000+", label: "$10,000+" },
    FilterOption { value: "5000-9999", label: "$5,000 - $9,999" },
    FilterOption { value: "1000-4999", label: "$1,000 - $4,999" },
    FilterOption { value: "0-999", label: "Under $1,000" },
];

pub fn status_options() -> Vec<(LeadStatus, &'static str)> {
    LeadStatus::iter().map(|s| (s, s.label())).collect()
}

pub fn source_options() -> Vec<(LeadSource, &'static str)> {
    LeadSource::iter().map(|s| (s, s.label())).collect()
}

/// The footer is hidden for single-page listings
pub fn show_pagination(pagination: &Pagination) -> bool {
    pagination.total_pages > 1
}

pub fn has_prev(pagination: &Pagination) -> bool {
    pagination.page > 1
}

pub fn has_next(pagination: &Pagination) -> bool {
    pagination.page < pagination.total_pages
}

/// Page numbers offered as direct links: always the first few pages
pub fn page_numbers(pagination: &Pagination) -> Vec<u32> {
    (1..=pagination.total_pages.min(MAX_PAGE_BUTTONS)).collect()
}

/// 1-based index of the first and last row on the current page. Wide
/// enough that any server-supplied page and limit fit.
pub fn showing_range(pagination: &Pagination) -> (u64, u64) {
    let page = u64::from(pagination.page);
    let limit = u64::from(pagination.limit);
    let first = page.saturating_sub(1) * limit + 1;
    let last = (page * limit).min(u64::from(pagination.total));
    (first, last)
}

pub fn results_summary(pagination: &Pagination) -> String {
    if pagination.total == 0 {
        return "No results".to_string();
    }
    let (first, last) = showing_range(pagination);
    format!(
        "Showing {} to {} of {} results",
        first, last, pagination.total
    )
}
