use crate::engine::{
    cumulative_series, goal_line, last_and_prior, monthly_series, sum_by_bucket, Aggregator,
    DenseMatrix, GoalPoint, MonthlyValue, StaffValue, TrendPoint, RECENT_MATTER_WEEKS,
    WEEKLY_HOURS_WINDOW,
};
use crate::filter::{
    filter_by_range_and_single_staff, filter_by_range_and_staff, filter_matters_by_range,
    is_allowed,
};
use crate::schema::{
    DateRange, HoursEntry, MatterEntry, PayoutCategory, RevenueEntry, TimeEntry, TimeEntryStreams,
};
use crate::settings::Settings;
use crate::utils::{
    first_of_month, last_n_weeks, month_abbreviations, month_key, month_label, week_key,
};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the dashboard is computed from. A `None` stream means the data
/// has not been fetched yet.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInputs<'a> {
    pub revenue: Option<&'a [RevenueEntry]>,
    pub hours: Option<&'a [HoursEntry]>,
    pub matters: Option<&'a [MatterEntry]>,
    pub settings: Option<&'a Settings>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardView {
    pub date_range: DateRange,
    pub total_revenue: f64,
    pub current_month_hours: f64,
    pub prior_month_hours: f64,
    pub revenue_by_staff: Vec<StaffValue<f64>>,
    pub ytd_revenue_trend: Vec<TrendPoint>,
    /// Team revenue threshold spread linearly from January to December.
    pub revenue_goal_trend: Vec<GoalPoint>,
    pub monthly_hours: Vec<MonthlyValue>,
    pub weekly_individual_hours: DenseMatrix<f64>,
    pub weekly_team_hours: Vec<WeeklyTotal>,
    pub monthly_individual_hours: DenseMatrix<f64>,
    pub ytd_new_matters_by_staff: Vec<StaffValue<u64>>,
    pub recent_weekly_matters: DenseMatrix<u64>,
    pub revenue_goal_per_staff: f64,
    pub weekly_hours_goals: Vec<StaffValue<f64>>,
    pub hours_threshold: f64,
}

/// Team-wide total for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyTotal {
    pub week: String,
    pub value: f64,
}

impl DashboardView {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardView)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Builds the dashboard view, or `None` while revenue, hours or settings are
/// missing. A missing matters stream counts as no matters.
pub fn compute_dashboard_view(inputs: &DashboardInputs<'_>) -> Option<DashboardView> {
    let revenue = inputs.revenue?;
    let hours = inputs.hours?;
    let settings = inputs.settings?;
    let matters = inputs.matters.unwrap_or_default();
    let range = inputs.date_range;
    let staff_list = &settings.custom_staff_list;
    let agg = Aggregator::new(staff_list);

    let revenue = filter_by_range_and_staff(revenue, &range, staff_list);
    let hours = filter_by_range_and_staff(hours, &range, staff_list);
    let matters = filter_matters_by_range(matters, &range);

    let total_revenue: f64 = revenue.iter().map(|r| r.dashboard_revenue()).sum();

    let revenue_by_staff = agg.sum_by_staff(
        revenue
            .iter()
            .filter_map(|r| Some((r.staff.as_deref()?, r.dashboard_revenue()))),
    );

    let revenue_by_month = sum_by_bucket(
        revenue
            .iter()
            .filter_map(|r| Some((month_key(r.date?), r.dashboard_revenue()))),
    );
    let ytd_revenue_trend = cumulative_series(&monthly_series(&revenue_by_month));

    let hours_by_month = sum_by_bucket(
        hours
            .iter()
            .filter_map(|h| Some((month_key(h.date?), h.hours_amount))),
    );
    let (current_month_hours, prior_month_hours) = last_and_prior(&hours_by_month);
    let monthly_hours = monthly_series(&hours_by_month);

    let weekly_hours_cells: Vec<(String, &str, f64)> = hours
        .iter()
        .filter_map(|h| {
            Some((
                week_key(h.date?),
                h.staff_abbreviation.as_deref()?,
                h.hours_amount,
            ))
        })
        .collect();
    let window = last_n_weeks(WEEKLY_HOURS_WINDOW, range.end);
    let weekly_individual_hours = agg.dense_matrix(&window, weekly_hours_cells.iter().cloned());

    let weekly_team_hours: Vec<WeeklyTotal> = sum_by_bucket(
        weekly_hours_cells
            .iter()
            .map(|(week, _, amount)| (week.clone(), *amount)),
    )
    .into_iter()
    .map(|(week, value)| WeeklyTotal { week, value })
    .collect();

    let monthly_individual_hours = agg.observed_matrix(hours.iter().filter_map(|h| {
        Some((
            month_key(h.date?),
            h.staff_abbreviation.as_deref()?,
            h.hours_amount,
        ))
    }));

    let matter_credits: Vec<(String, &str, u64)> = matters
        .iter()
        .filter_map(|m| m.creation_date.map(|d| (week_key(d), *m)))
        .flat_map(|(week, m)| {
            m.staff_slots()
                .filter(move |s| is_allowed(Some(*s), staff_list))
                .map(move |s| (week.clone(), s, 1u64))
        })
        .collect();
    let ytd_new_matters_by_staff =
        agg.sum_by_staff(matter_credits.iter().map(|(_, staff, n)| (*staff, *n)));
    let recent_weekly_matters =
        agg.recent_observed_matrix(RECENT_MATTER_WEEKS, matter_credits.iter().cloned());

    let weekly_hours_goals: Vec<StaffValue<f64>> = staff_list
        .iter()
        .map(|s| StaffValue {
            staff: s.clone(),
            value: settings.weekly_goal(s),
        })
        .collect();

    Some(DashboardView {
        date_range: range,
        total_revenue,
        current_month_hours,
        prior_month_hours,
        revenue_by_staff,
        ytd_revenue_trend,
        revenue_goal_trend: goal_line(settings.revenue_threshold, &month_abbreviations()),
        monthly_hours,
        weekly_individual_hours,
        weekly_team_hours,
        monthly_individual_hours,
        ytd_new_matters_by_staff,
        recent_weekly_matters,
        revenue_goal_per_staff: settings.revenue_goal_per_staff(),
        weekly_hours_goals,
        hours_threshold: settings.hours_threshold(),
    })
}

/// Inputs of the revenue share review. The records are loaded once and only
/// re-filtered when the staff member or the date range changes.
#[derive(Debug, Clone, Copy)]
pub struct RevShareInputs<'a> {
    pub rev_share: Option<&'a [RevenueEntry]>,
    pub time_entries: Option<&'a TimeEntryStreams>,
    pub settings: Option<&'a Settings>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevShareRow {
    #[serde(flatten)]
    pub entry: RevenueEntry,
    pub production_revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryEntries {
    pub category: PayoutCategory,
    pub entries: Vec<TimeEntry>,
}

/// Payout totals of one month, split by time-entry category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PayoutMonth {
    pub month: String,
    pub label: String,
    #[serde(rename = "FONE")]
    pub fone: f64,
    #[serde(rename = "FMON")]
    pub fmon: f64,
    #[serde(rename = "Hourly")]
    pub hourly: f64,
}

impl PayoutMonth {
    fn slot(&mut self, category: PayoutCategory) -> &mut f64 {
        match category {
            PayoutCategory::Fone => &mut self.fone,
            PayoutCategory::Fmon => &mut self.fmon,
            PayoutCategory::Hourly => &mut self.hourly,
        }
    }

    pub fn get(&self, category: PayoutCategory) -> f64 {
        match category {
            PayoutCategory::Fone => self.fone,
            PayoutCategory::Fmon => self.fmon,
            PayoutCategory::Hourly => self.hourly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevShareView {
    pub selected_staff: String,
    pub date_range: DateRange,
    pub total_production_revenue: f64,
    pub total_revenue_share: f64,
    pub total_hours: f64,
    pub payout_by_month: Vec<PayoutMonth>,
    pub rev_share_rows: Vec<RevShareRow>,
    pub time_entries: Vec<CategoryEntries>,
}

impl RevShareView {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RevShareView)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Builds the revenue share review for one staff member, defaulting to the
/// first listed staff. `None` while the records are missing or when no staff
/// member can be selected.
pub fn compute_rev_share_view(
    inputs: &RevShareInputs<'_>,
    selected_staff: Option<&str>,
) -> Option<RevShareView> {
    let rev_share = inputs.rev_share?;
    let time_entries = inputs.time_entries?;
    let staff = match selected_staff {
        Some(s) if !s.is_empty() => s,
        _ => inputs.settings?.custom_staff_list.first()?.as_str(),
    };
    let range = inputs.date_range;

    let mut rows: Vec<&RevenueEntry> = filter_by_range_and_single_staff(rev_share, &range, staff);
    rows.sort_by_key(|r| r.date);

    let total_production_revenue: f64 = rows.iter().map(|r| r.revenue_share_amount).sum();
    let total_revenue_share: f64 = rows.iter().map(|r| r.revenue_share_total).sum();

    let filtered: Vec<(PayoutCategory, Vec<&TimeEntry>)> = time_entries
        .by_category()
        .map(|(category, stream)| {
            (
                category,
                filter_by_range_and_single_staff(stream, &range, staff),
            )
        })
        .collect();

    let total_hours: f64 = filtered
        .iter()
        .flat_map(|(_, entries)| entries.iter())
        .map(|e| e.time_entry_amount)
        .sum();

    // keyed by the first day of the month so display order is chronological
    let mut by_month: BTreeMap<NaiveDate, PayoutMonth> = BTreeMap::new();
    for (category, entries) in &filtered {
        for entry in entries {
            let Some(date) = entry.date else { continue };
            let month = by_month
                .entry(first_of_month(date))
                .or_insert_with(|| PayoutMonth {
                    month: month_key(date),
                    label: month_label(date),
                    ..Default::default()
                });
            *month.slot(*category) += entry.total_payout;
        }
    }

    Some(RevShareView {
        selected_staff: staff.to_string(),
        date_range: range,
        total_production_revenue,
        total_revenue_share,
        total_hours,
        payout_by_month: by_month.into_values().collect(),
        rev_share_rows: rows
            .into_iter()
            .map(|r| RevShareRow {
                entry: r.clone(),
                production_revenue_share: r.production_revenue_share(),
            })
            .collect(),
        time_entries: filtered
            .into_iter()
            .map(|(category, entries)| CategoryEntries {
                category,
                entries: entries.into_iter().cloned().collect(),
            })
            .collect(),
    })
}
