use crate::utils::month_abbreviations;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_WEEKLY_GOAL: f64 = 20.0;
pub const DEFAULT_REVENUE_THRESHOLD: f64 = 2_000_000.0;
pub const DEFAULT_STAFF: [&str; 9] = [
    "AEZ", "BPL", "CAJ", "JER", "JRJ", "RAW", "TGF", "KWD", "JMG",
];

/// Session-scoped dashboard configuration.
///
/// `custom_staff_list` is both the staff allow-list and the display order.
/// The weekly hours threshold is a projection of the per-staff goals of the
/// listed staff and is re-derived by every mutator; it has no independent
/// storage authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    #[serde(default)]
    pub custom_staff_list: Vec<String>,

    #[serde(default)]
    pub staff_weekly_goals: BTreeMap<String, f64>,

    #[serde(rename = "treshold_revenue", alias = "threshold_revenue", default)]
    pub revenue_threshold: f64,

    #[serde(rename = "treshold_hours", alias = "threshold_hours", default)]
    hours_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let staff: Vec<String> = DEFAULT_STAFF.iter().map(|s| s.to_string()).collect();
        let goals = staff
            .iter()
            .map(|s| (s.clone(), DEFAULT_WEEKLY_GOAL))
            .collect();
        Self::new(staff, goals, DEFAULT_REVENUE_THRESHOLD)
    }
}

impl Settings {
    pub fn new(
        custom_staff_list: Vec<String>,
        staff_weekly_goals: BTreeMap<String, f64>,
        revenue_threshold: f64,
    ) -> Self {
        let mut settings = Self {
            custom_staff_list,
            staff_weekly_goals,
            revenue_threshold,
            hours_threshold: 0.0,
        };
        settings.refresh_hours_threshold();
        settings
    }

    /// Stored weekly hours threshold, always in sync with the staff list.
    pub fn hours_threshold(&self) -> f64 {
        self.hours_threshold
    }

    /// Sum of the weekly goals of every listed staff member. Goals kept for
    /// staff outside the list do not count; listed staff without a stored
    /// goal count at the default.
    pub fn derive_hours_threshold(&self) -> f64 {
        self.custom_staff_list
            .iter()
            .map(|s| self.weekly_goal(s))
            .sum()
    }

    /// Assigns the default goal to listed staff that have none, then
    /// re-derives the stored threshold. Used after deserializing, since a
    /// stale stored value must never win.
    pub fn refresh_hours_threshold(&mut self) {
        for staff in &self.custom_staff_list {
            self.staff_weekly_goals
                .entry(staff.clone())
                .or_insert(DEFAULT_WEEKLY_GOAL);
        }
        self.hours_threshold = self.derive_hours_threshold();
    }

    pub fn contains_staff(&self, staff: &str) -> bool {
        self.custom_staff_list.iter().any(|s| s == staff)
    }

    /// Adds the staff member at the end of the list, assigning the default
    /// goal when none is stored. Returns false if already listed.
    pub fn add_staff(&mut self, staff: &str) -> bool {
        if self.contains_staff(staff) {
            return false;
        }
        self.custom_staff_list.push(staff.to_string());
        self.staff_weekly_goals
            .entry(staff.to_string())
            .or_insert(DEFAULT_WEEKLY_GOAL);
        self.refresh_hours_threshold();
        true
    }

    /// Removes the staff member from the list. The stored goal is kept for a
    /// later re-addition.
    pub fn remove_staff(&mut self, staff: &str) -> bool {
        let before = self.custom_staff_list.len();
        self.custom_staff_list.retain(|s| s != staff);
        let removed = self.custom_staff_list.len() != before;
        self.refresh_hours_threshold();
        removed
    }

    /// Returns whether the staff member is listed after the toggle.
    pub fn toggle_staff(&mut self, staff: &str) -> bool {
        if self.contains_staff(staff) {
            self.remove_staff(staff);
            false
        } else {
            self.add_staff(staff);
            true
        }
    }

    pub fn set_weekly_goal(&mut self, staff: &str, goal: f64) {
        self.staff_weekly_goals.insert(staff.to_string(), goal);
        self.refresh_hours_threshold();
    }

    pub fn weekly_goal(&self, staff: &str) -> f64 {
        self.staff_weekly_goals
            .get(staff)
            .copied()
            .unwrap_or(DEFAULT_WEEKLY_GOAL)
    }

    /// Team revenue goal split evenly across the listed staff.
    pub fn revenue_goal_per_staff(&self) -> f64 {
        if self.custom_staff_list.is_empty() {
            0.0
        } else {
            self.revenue_threshold / self.custom_staff_list.len() as f64
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Settings)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PrebillStatus {
    Yes,
    #[default]
    No,
}

/// Whether each staff member returned their prebills on time, per month label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Prebills(pub BTreeMap<String, BTreeMap<String, PrebillStatus>>);

impl Prebills {
    /// Fills every listed staff member with all twelve month labels,
    /// defaulting missing cells to `No`. Existing answers are kept.
    pub fn ensure_year(&mut self, staff_list: &[String]) {
        let months = month_abbreviations();
        for staff in staff_list {
            let row = self.0.entry(staff.clone()).or_default();
            for month in &months {
                row.entry(month.clone()).or_default();
            }
        }
    }

    pub fn status(&self, staff: &str, month: &str) -> PrebillStatus {
        self.0
            .get(staff)
            .and_then(|row| row.get(month))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_status(&mut self, staff: &str, month: &str, status: PrebillStatus) {
        self.0
            .entry(staff.to_string())
            .or_default()
            .insert(month.to_string(), status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_staff() -> Settings {
        let goals = BTreeMap::from([("AB".to_string(), 20.0), ("CD".to_string(), 15.0)]);
        Settings::new(vec!["AB".to_string(), "CD".to_string()], goals, 1_000_000.0)
    }

    #[test]
    fn test_hours_threshold_follows_staff_list() {
        let mut settings = two_staff();
        assert_eq!(settings.hours_threshold(), 35.0);

        assert!(settings.remove_staff("CD"));
        assert_eq!(settings.hours_threshold(), 20.0);
        assert_eq!(settings.staff_weekly_goals.get("CD"), Some(&15.0));

        // re-adding keeps the remembered goal instead of the default
        assert!(settings.toggle_staff("CD"));
        assert_eq!(settings.hours_threshold(), 35.0);
    }

    #[test]
    fn test_new_staff_gets_default_goal() {
        let mut settings = two_staff();
        settings.toggle_staff("EF");
        assert_eq!(settings.weekly_goal("EF"), DEFAULT_WEEKLY_GOAL);
        assert_eq!(settings.hours_threshold(), 55.0);
        assert_eq!(settings.custom_staff_list.last().unwrap(), "EF");

        settings.set_weekly_goal("EF", 10.0);
        assert_eq!(settings.hours_threshold(), 45.0);
    }

    #[test]
    fn test_stored_threshold_is_rederived() {
        let json = r#"{
            "custom_staff_list": ["AB"],
            "staff_weekly_goals": {"AB": 25, "ZZ": 40},
            "treshold_revenue": 500000,
            "treshold_hours": 910
        }"#;
        let mut settings: Settings = serde_json::from_str(json).unwrap();
        settings.refresh_hours_threshold();
        assert_eq!(settings.hours_threshold(), 25.0);
        assert_eq!(settings.revenue_goal_per_staff(), 500000.0);
    }

    #[test]
    fn test_listed_staff_without_goal_gets_default() {
        let goals = BTreeMap::from([("AB".to_string(), 20.0)]);
        let settings = Settings::new(vec!["AB".to_string(), "CD".to_string()], goals, 0.0);

        assert_eq!(settings.staff_weekly_goals.get("CD"), Some(&DEFAULT_WEEKLY_GOAL));
        let goal_sum: f64 = settings
            .custom_staff_list
            .iter()
            .map(|s| settings.weekly_goal(s))
            .sum();
        assert_eq!(settings.hours_threshold(), goal_sum);
        assert_eq!(settings.hours_threshold(), 40.0);

        let json = r#"{"custom_staff_list": ["AB", "CD"], "staff_weekly_goals": {"AB": 10}}"#;
        let mut loaded: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.derive_hours_threshold(), 30.0);
        loaded.refresh_hours_threshold();
        assert_eq!(loaded.staff_weekly_goals.get("CD"), Some(&DEFAULT_WEEKLY_GOAL));
        assert_eq!(loaded.hours_threshold(), 30.0);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.custom_staff_list.len(), 9);
        assert_eq!(settings.hours_threshold(), 180.0);
        assert!(Settings::schema_as_json().unwrap().contains("custom_staff_list"));
    }

    #[test]
    fn test_empty_staff_list_revenue_goal() {
        let settings = Settings::new(Vec::new(), BTreeMap::new(), 100.0);
        assert_eq!(settings.revenue_goal_per_staff(), 0.0);
        assert_eq!(settings.hours_threshold(), 0.0);
    }

    #[test]
    fn test_prebills_ensure_year() {
        let mut prebills = Prebills::default();
        prebills.set_status("AB", "Mar", PrebillStatus::Yes);
        prebills.ensure_year(&["AB".to_string(), "CD".to_string()]);

        assert_eq!(prebills.0["AB"].len(), 12);
        assert_eq!(prebills.0["CD"].len(), 12);
        assert_eq!(prebills.status("AB", "Mar"), PrebillStatus::Yes);
        assert_eq!(prebills.status("CD", "Mar"), PrebillStatus::No);

        let json = serde_json::to_string(&prebills).unwrap();
        assert!(json.contains(r#""Mar":"Yes""#));
    }
}
