use crate::error::Result;
use crate::utils::{in_range, parse_required_date};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date window selected by the user. `start <= end` is not
/// enforced; a reversed range simply matches no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_required_date(start)?,
            end: parse_required_date(end)?,
        })
    }

    /// False for records without a date.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| in_range(d, self))
    }
}

/// One row of the monthly revenue-share export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueEntry {
    pub date: Option<NaiveDate>,
    pub staff: Option<String>,

    /// Total production revenue for the month (`TotalRevShareMonth`).
    #[serde(default)]
    pub revenue_share_amount: f64,
    #[serde(default)]
    pub origination_fees: f64,
    /// Total revenue share paid out (`RevShareTotal`).
    #[serde(default)]
    pub revenue_share_total: f64,

    #[serde(default)]
    pub fone_hours: f64,
    #[serde(default)]
    pub fone_revenue: f64,
    #[serde(default)]
    pub fmon_hours: f64,
    #[serde(default)]
    pub fmon_revenue: f64,
    #[serde(default)]
    pub hourly_hours: f64,
    #[serde(default)]
    pub hourly_revenue: f64,

    #[serde(default)]
    pub tier1: f64,
    #[serde(default)]
    pub tier2: f64,
    #[serde(default)]
    pub tier3: f64,
    #[serde(default)]
    pub tier_total: f64,
}

impl RevenueEntry {
    /// Revenue credited to the staff member on the dashboard.
    pub fn dashboard_revenue(&self) -> f64 {
        self.revenue_share_amount + self.origination_fees
    }

    pub fn production_revenue_share(&self) -> f64 {
        self.tier1 + self.tier2 + self.tier3
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HoursEntry {
    pub date: Option<NaiveDate>,
    pub staff_abbreviation: Option<String>,
    /// Sign is not validated.
    #[serde(default)]
    pub hours_amount: f64,
}

/// A newly opened matter, credited to up to three originating staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatterEntry {
    pub creation_date: Option<NaiveDate>,
    #[serde(default)]
    pub originating_staff: [Option<String>; 3],
}

impl MatterEntry {
    /// Non-empty slots in order. Duplicates are kept.
    pub fn staff_slots(&self) -> impl Iterator<Item = &str> {
        self.originating_staff
            .iter()
            .filter_map(|s| s.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeEntry {
    pub date: Option<NaiveDate>,
    pub staff: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub time_entry_amount: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub gross: f64,
    #[serde(default)]
    pub billed_amount: f64,
    #[serde(default)]
    pub total_payout: f64,
}

/// Payout category a time-entry stream is reported under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum PayoutCategory {
    #[serde(rename = "FONE")]
    Fone,
    #[serde(rename = "FMON")]
    Fmon,
    Hourly,
}

impl PayoutCategory {
    pub const ALL: [PayoutCategory; 3] = [Self::Fone, Self::Fmon, Self::Hourly];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fone => "FONE",
            Self::Fmon => "FMON",
            Self::Hourly => "Hourly",
        }
    }
}

/// The three parallel time-entry exports (type 1, 2 and 3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeEntryStreams {
    #[serde(default)]
    pub type1: Vec<TimeEntry>,
    #[serde(default)]
    pub type2: Vec<TimeEntry>,
    #[serde(default)]
    pub type3: Vec<TimeEntry>,
}

impl TimeEntryStreams {
    pub fn stream(&self, category: PayoutCategory) -> &[TimeEntry] {
        match category {
            PayoutCategory::Fone => &self.type1,
            PayoutCategory::Fmon => &self.type2,
            PayoutCategory::Hourly => &self.type3,
        }
    }

    pub fn by_category(&self) -> impl Iterator<Item = (PayoutCategory, &[TimeEntry])> {
        PayoutCategory::ALL.into_iter().map(|c| (c, self.stream(c)))
    }
}
