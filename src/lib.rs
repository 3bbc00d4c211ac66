//! # Staff KPI Engine
//!
//! A library for turning raw practice-management exports (revenue-share rows,
//! billable hours, new matters and per-type time entries) into time-bucketed,
//! staff-filtered KPIs ready for a dashboard to render.
//!
//! ## Core Concepts
//!
//! - **Record Streams**: Four independently keyed inputs, loaded from CSV exports or built in code
//! - **Buckets**: Calendar months ("YYYY-MM") and Monday-anchored weeks ("YYYY-MM-DD")
//! - **Allow-list**: `Settings::custom_staff_list`, both the staff filter and the display order
//! - **Dense Matrices**: Bucket x staff grids, zero-filled where no record exists
//! - **Views**: The Dashboard and RevShare view models, recomputed from scratch on every call
//!
//! The aggregation is pure: the same inputs always give the same view, and a
//! view is only produced once every required stream is present.
//!
//! ## Example
//!
//! ```rust,ignore
//! use staff_kpi_engine::*;
//!
//! let streams = RecordStreams::load_dir("data")?;
//! let store = JsonFileStore::new("data");
//! let settings = store.load_settings()?;
//! let range = DateRange::parse("2024-01-01", "2024-12-31")?;
//!
//! if let Some(view) = compute_dashboard_view(&streams.dashboard_inputs(Some(&settings), range)) {
//!     println!("Total revenue: {:.0}", view.total_revenue);
//! }
//!
//! let inputs = streams.rev_share_inputs(Some(&settings), range);
//! let review = compute_rev_share_view(&inputs, Some("AB"));
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod schema;
pub mod settings;
pub mod store;
pub mod utils;
pub mod views;

pub use engine::{
    cumulative_series, goal_line, last_and_prior, monthly_series, sum_by_bucket, Aggregator,
    DenseMatrix, GoalPoint, MatrixRow, Measure, MonthlyValue, StaffValue, TrendPoint,
    RECENT_MATTER_WEEKS, WEEKLY_HOURS_WINDOW,
};
pub use error::{KpiError, Result};
pub use filter::{
    filter_by_range_and_single_staff, filter_by_range_and_staff, filter_matters_by_range,
    StaffRecord,
};
pub use ingestion::{
    read_hours, read_matters, read_revenue, read_time_entries, RecordStreams,
};
pub use schema::*;
pub use settings::{Prebills, PrebillStatus, Settings, DEFAULT_WEEKLY_GOAL};
pub use store::{JsonFileStore, SettingsStore};
pub use utils::{in_range, last_n_weeks, month_key, week_key};
pub use views::{
    compute_dashboard_view, compute_rev_share_view, CategoryEntries, DashboardInputs,
    DashboardView, PayoutMonth, RevShareInputs, RevShareRow, RevShareView, WeeklyTotal,
};
