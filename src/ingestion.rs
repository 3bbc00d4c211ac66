use crate::error::Result;
use crate::schema::{DateRange, HoursEntry, MatterEntry, RevenueEntry, TimeEntry, TimeEntryStreams};
use crate::settings::Settings;
use crate::utils::parse_date;
use crate::views::{DashboardInputs, RevShareInputs};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const REVENUE_FILE: &str = "RevShareNewLogic.csv";
pub const HOURS_FILE: &str = "vBillableHoursStaff.csv";
pub const MATTERS_FILE: &str = "vMatters.csv";
pub const TIME_ENTRY_FILES: [&str; 3] = [
    "vwTimeEntriesType1.csv",
    "vwTimeEntriesType2.csv",
    "vwTimeEntriesType3.csv",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevShareCsvRow {
    #[serde(rename = "RevShareDate")]
    pub date: Option<String>,
    #[serde(rename = "Staff")]
    pub staff: Option<String>,
    #[serde(rename = "TotalRevShareMonth")]
    pub total_rev_share_month: Option<String>,
    #[serde(rename = "OriginationFees")]
    pub origination_fees: Option<String>,
    #[serde(rename = "RevShareTotal")]
    pub rev_share_total: Option<String>,
    #[serde(rename = "FONEHours")]
    pub fone_hours: Option<String>,
    #[serde(rename = "FONERevenue")]
    pub fone_revenue: Option<String>,
    #[serde(rename = "FMONHours")]
    pub fmon_hours: Option<String>,
    #[serde(rename = "FMONRevenue")]
    pub fmon_revenue: Option<String>,
    #[serde(rename = "HourlyHours")]
    pub hourly_hours: Option<String>,
    #[serde(rename = "HourlyRevenue")]
    pub hourly_revenue: Option<String>,
    #[serde(rename = "RevTier1")]
    pub tier1: Option<String>,
    #[serde(rename = "RevTier2")]
    pub tier2: Option<String>,
    #[serde(rename = "RevTier3")]
    pub tier3: Option<String>,
    #[serde(rename = "RevTierTotal")]
    pub tier_total: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HoursCsvRow {
    #[serde(rename = "BillableHoursDate")]
    pub date: Option<String>,
    #[serde(rename = "StaffAbbreviation")]
    pub staff_abbreviation: Option<String>,
    #[serde(rename = "BillableHoursAmount")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatterCsvRow {
    #[serde(rename = "MatterCreationDate")]
    pub creation_date: Option<String>,
    pub orig_staff1: Option<String>,
    pub orig_staff2: Option<String>,
    pub orig_staff3: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeEntryCsvRow {
    #[serde(rename = "TimeEntryDate")]
    pub date: Option<String>,
    #[serde(rename = "Staff")]
    pub staff: Option<String>,
    #[serde(rename = "TimeEntryName")]
    pub name: Option<String>,
    #[serde(rename = "TimeEntryAmount")]
    pub amount: Option<String>,
    #[serde(rename = "TimeEntryRate")]
    pub rate: Option<String>,
    #[serde(rename = "TimeEntryGross")]
    pub gross: Option<String>,
    #[serde(rename = "TimeEntryBilledAmount")]
    pub billed_amount: Option<String>,
    #[serde(rename = "TotalPayout")]
    pub total_payout: Option<String>,
}

/// Blank or unparseable amounts count as zero. Currency symbols and
/// thousands separators are stripped.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

fn staff_field(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn date_field(raw: Option<&str>) -> Option<chrono::NaiveDate> {
    raw.and_then(parse_date)
}

impl From<RevShareCsvRow> for RevenueEntry {
    fn from(row: RevShareCsvRow) -> Self {
        let amount = |v: &Option<String>| parse_amount(v.as_deref());
        RevenueEntry {
            date: date_field(row.date.as_deref()),
            revenue_share_amount: amount(&row.total_rev_share_month),
            origination_fees: amount(&row.origination_fees),
            revenue_share_total: amount(&row.rev_share_total),
            fone_hours: amount(&row.fone_hours),
            fone_revenue: amount(&row.fone_revenue),
            fmon_hours: amount(&row.fmon_hours),
            fmon_revenue: amount(&row.fmon_revenue),
            hourly_hours: amount(&row.hourly_hours),
            hourly_revenue: amount(&row.hourly_revenue),
            tier1: amount(&row.tier1),
            tier2: amount(&row.tier2),
            tier3: amount(&row.tier3),
            tier_total: amount(&row.tier_total),
            staff: staff_field(row.staff),
        }
    }
}

impl From<HoursCsvRow> for HoursEntry {
    fn from(row: HoursCsvRow) -> Self {
        HoursEntry {
            date: date_field(row.date.as_deref()),
            staff_abbreviation: staff_field(row.staff_abbreviation),
            hours_amount: parse_amount(row.amount.as_deref()),
        }
    }
}

impl From<MatterCsvRow> for MatterEntry {
    fn from(row: MatterCsvRow) -> Self {
        MatterEntry {
            creation_date: date_field(row.creation_date.as_deref()),
            originating_staff: [
                staff_field(row.orig_staff1),
                staff_field(row.orig_staff2),
                staff_field(row.orig_staff3),
            ],
        }
    }
}

impl From<TimeEntryCsvRow> for TimeEntry {
    fn from(row: TimeEntryCsvRow) -> Self {
        TimeEntry {
            date: date_field(row.date.as_deref()),
            staff: staff_field(row.staff),
            name: row.name.filter(|n| !n.trim().is_empty()),
            time_entry_amount: parse_amount(row.amount.as_deref()),
            rate: parse_amount(row.rate.as_deref()),
            gross: parse_amount(row.gross.as_deref()),
            billed_amount: parse_amount(row.billed_amount.as_deref()),
            total_payout: parse_amount(row.total_payout.as_deref()),
        }
    }
}

/// Reads every row of a headed CSV export into `T`. Unknown columns are
/// ignored and short rows are accepted.
pub fn read_records<R, Row, T>(reader: R) -> Result<Vec<T>>
where
    R: Read,
    Row: DeserializeOwned,
    T: From<Row>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<Row>() {
        records.push(T::from(row?));
    }
    Ok(records)
}

pub fn read_revenue<R: Read>(reader: R) -> Result<Vec<RevenueEntry>> {
    read_records::<R, RevShareCsvRow, RevenueEntry>(reader)
}

pub fn read_hours<R: Read>(reader: R) -> Result<Vec<HoursEntry>> {
    read_records::<R, HoursCsvRow, HoursEntry>(reader)
}

pub fn read_matters<R: Read>(reader: R) -> Result<Vec<MatterEntry>> {
    read_records::<R, MatterCsvRow, MatterEntry>(reader)
}

pub fn read_time_entries<R: Read>(reader: R) -> Result<Vec<TimeEntry>> {
    read_records::<R, TimeEntryCsvRow, TimeEntry>(reader)
}

fn load_optional<T>(
    path: &Path,
    read: impl FnOnce(File) -> Result<Vec<T>>,
) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        warn!("Record file {} not found", path.display());
        return Ok(None);
    }
    let records = read(File::open(path)?)?;
    debug!("Loaded {} rows from {}", records.len(), path.display());
    Ok(Some(records))
}

/// All record streams fetched from one export directory. A stream whose file
/// is missing stays `None`, so the views report "not ready" instead of zeros.
#[derive(Debug, Clone, Default)]
pub struct RecordStreams {
    pub revenue: Option<Vec<RevenueEntry>>,
    pub hours: Option<Vec<HoursEntry>>,
    pub matters: Option<Vec<MatterEntry>>,
    pub time_entries: Option<TimeEntryStreams>,
}

impl RecordStreams {
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let revenue = load_optional(&dir.join(REVENUE_FILE), read_revenue::<File>)?;
        let hours = load_optional(&dir.join(HOURS_FILE), read_hours::<File>)?;
        let matters = load_optional(&dir.join(MATTERS_FILE), read_matters::<File>)?;

        let [type1, type2, type3] = TIME_ENTRY_FILES;
        let time_entries = match (
            load_optional(&dir.join(type1), read_time_entries::<File>)?,
            load_optional(&dir.join(type2), read_time_entries::<File>)?,
            load_optional(&dir.join(type3), read_time_entries::<File>)?,
        ) {
            (Some(type1), Some(type2), Some(type3)) => Some(TimeEntryStreams {
                type1,
                type2,
                type3,
            }),
            _ => None,
        };

        info!(
            "Loaded record streams from {}: {} revenue, {} hours, {} matters",
            dir.display(),
            revenue.as_ref().map_or(0, Vec::len),
            hours.as_ref().map_or(0, Vec::len),
            matters.as_ref().map_or(0, Vec::len),
        );

        Ok(Self {
            revenue,
            hours,
            matters,
            time_entries,
        })
    }

    pub fn dashboard_inputs<'a>(
        &'a self,
        settings: Option<&'a Settings>,
        date_range: DateRange,
    ) -> DashboardInputs<'a> {
        DashboardInputs {
            revenue: self.revenue.as_deref(),
            hours: self.hours.as_deref(),
            matters: self.matters.as_deref(),
            settings,
            date_range,
        }
    }

    pub fn rev_share_inputs<'a>(
        &'a self,
        settings: Option<&'a Settings>,
        date_range: DateRange,
    ) -> RevShareInputs<'a> {
        RevShareInputs {
            rev_share: self.revenue.as_deref(),
            time_entries: self.time_entries.as_ref(),
            settings,
            date_range,
        }
    }
}
