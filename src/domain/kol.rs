use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Column headers of the KOL table, in the order produced by [`KolProfile::cells`].
pub const KOL_COLUMNS: [&str; 6] = [
    "KOL Name",
    "Category",
    "Followers",
    "Avg Views",
    "Engagement",
    "CPM",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KolProfile {
    pub id: Uuid,
    pub name: String,
    pub account: String,
    pub platform: String,
    pub region: String,
    pub category: String,
    pub followers: i64,
    pub avg_views: i64,
    pub engagement_rate: f64, // fraction, 0.0345 == 3.45%
    pub cpm: f64,
    pub created_at: DateTime<Utc>,
}

impl KolProfile {
    pub fn new(name: String, account: String, platform: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            account,
            platform,
            region: String::new(),
            category: String::new(),
            followers: 0,
            avg_views: 0,
            engagement_rate: 0.0,
            cpm: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Formatted table cells, matching [`KOL_COLUMNS`].
    pub fn cells(&self) -> [String; 6] {
        [
            format!("{} ({})", self.name, self.platform),
            self.category.clone(),
            format_compact(self.followers),
            format_compact(self.avg_views),
            format_percent(self.engagement_rate),
            format_currency(self.cpm),
        ]
    }
}

/// Filters applied to KOL list queries. Empty filters match every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KolFilters {
    pub platform: Option<String>,
    pub region: Option<String>,
    /// Matched against name and account, case-insensitively.
    pub search: Option<String>,
}

impl KolFilters {
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.platform.is_none() && self.region.is_none() && self.search.is_none()
    }
}

const COMPACT_UNITS: [(f64, &str); 3] = [(1e3, "K"), (1e6, "M"), (1e9, "B")];

/// Compact notation with at most one fractional digit: 1234 -> "1.2K", 2_000_000 -> "2M".
pub fn format_compact(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs() as f64;

    let Some(mut unit) = COMPACT_UNITS.iter().rposition(|(scale, _)| abs >= *scale) else {
        return format!("{}{}", sign, value.unsigned_abs());
    };

    let mut scaled = round_one_decimal(abs / COMPACT_UNITS[unit].0);
    // 999_960 rounds to 1000.0K; promote it to 1M
    if scaled >= 1000.0 && unit + 1 < COMPACT_UNITS.len() {
        unit += 1;
        scaled = round_one_decimal(abs / COMPACT_UNITS[unit].0);
    }

    let suffix = COMPACT_UNITS[unit].1;
    if scaled.fract() == 0.0 {
        format!("{}{:.0}{}", sign, scaled, suffix)
    } else {
        format!("{}{:.1}{}", sign, scaled, suffix)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Renders a fractional rate as a percentage with two decimals.
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}
