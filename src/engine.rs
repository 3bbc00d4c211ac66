use crate::utils::label_for_month_key;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::AddAssign;

/// Weeks shown in the per-staff weekly hours matrix.
pub const WEEKLY_HOURS_WINDOW: usize = 6;
/// Most recent observed weeks shown in the weekly matters matrix.
pub const RECENT_MATTER_WEEKS: usize = 4;

/// Numeric cell of an aggregate. Implemented for hour/revenue sums and counts.
pub trait Measure: Copy + Default + AddAssign {}

impl<T: Copy + Default + AddAssign> Measure for T {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StaffValue<V> {
    pub staff: String,
    pub value: V,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyValue {
    /// Sortable "YYYY-MM" key
    pub month: String,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendPoint {
    pub month: String,
    pub label: String,
    pub value: f64,
    /// Sum of every period value up to and including this month
    pub cumulative: f64,
}

/// Point of a year-to-date goal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalPoint {
    pub label: String,
    pub goal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatrixRow<V> {
    pub bucket: String,
    /// One cell per staff member, aligned with `DenseMatrix::staff`
    pub values: Vec<V>,
}

/// Bucket x staff grid, zero-filled where no record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DenseMatrix<V> {
    pub staff: Vec<String>,
    pub rows: Vec<MatrixRow<V>>,
}

impl<V: Measure> DenseMatrix<V> {
    pub fn buckets(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.bucket.as_str()).collect()
    }

    pub fn get(&self, bucket: &str, staff: &str) -> Option<V> {
        let col = self.staff.iter().position(|s| s == staff)?;
        self.rows
            .iter()
            .find(|r| r.bucket == bucket)
            .and_then(|r| r.values.get(col).copied())
    }
}

/// Groups filtered records by staff and by calendar bucket. Staff outside the
/// allow-list are dropped and per-staff output follows the allow-list order.
pub struct Aggregator<'a> {
    staff: &'a [String],
}

impl<'a> Aggregator<'a> {
    pub fn new(staff: &'a [String]) -> Self {
        Self { staff }
    }

    fn column(&self, staff: &str) -> Option<usize> {
        self.staff.iter().position(|s| s == staff)
    }

    /// Totals per listed staff member, one entry each, zero when absent.
    pub fn sum_by_staff<'r, V, I>(&self, items: I) -> Vec<StaffValue<V>>
    where
        V: Measure,
        I: IntoIterator<Item = (&'r str, V)>,
    {
        let mut totals = vec![V::default(); self.staff.len()];
        for (staff, value) in items {
            if let Some(col) = self.column(staff) {
                totals[col] += value;
            }
        }

        self.staff
            .iter()
            .zip(totals)
            .map(|(staff, value)| StaffValue {
                staff: staff.clone(),
                value,
            })
            .collect()
    }

    /// Dense matrix over `buckets x staff`. Items whose bucket or staff is not
    /// part of the grid are ignored.
    pub fn dense_matrix<'r, V, I>(&self, buckets: &[String], items: I) -> DenseMatrix<V>
    where
        V: Measure,
        I: IntoIterator<Item = (String, &'r str, V)>,
    {
        let row_index: HashMap<&str, usize> = buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.as_str(), i))
            .collect();

        let mut rows: Vec<MatrixRow<V>> = buckets
            .iter()
            .map(|b| MatrixRow {
                bucket: b.clone(),
                values: vec![V::default(); self.staff.len()],
            })
            .collect();

        for (bucket, staff, value) in items {
            let (Some(&row), Some(col)) = (row_index.get(bucket.as_str()), self.column(staff))
            else {
                continue;
            };
            rows[row].values[col] += value;
        }

        DenseMatrix {
            staff: self.staff.to_vec(),
            rows,
        }
    }

    /// Dense matrix over the last `n` buckets observed among the listed
    /// staff's items. Fewer observed buckets yield fewer rows, never padding.
    pub fn recent_observed_matrix<'r, V, I>(&self, n: usize, items: I) -> DenseMatrix<V>
    where
        V: Measure,
        I: IntoIterator<Item = (String, &'r str, V)>,
    {
        let items: Vec<(String, &'r str, V)> = items
            .into_iter()
            .filter(|(_, staff, _)| self.column(staff).is_some())
            .collect();

        let observed: BTreeSet<&str> = items.iter().map(|(b, _, _)| b.as_str()).collect();
        let skip = observed.len().saturating_sub(n);
        let recent: Vec<String> = observed.into_iter().skip(skip).map(str::to_string).collect();

        self.dense_matrix(&recent, items)
    }

    /// Dense matrix over every bucket observed among the listed staff's items,
    /// ascending.
    pub fn observed_matrix<'r, V, I>(&self, items: I) -> DenseMatrix<V>
    where
        V: Measure,
        I: IntoIterator<Item = (String, &'r str, V)>,
    {
        self.recent_observed_matrix(usize::MAX, items)
    }
}

/// Sums values per bucket key. Keys come back in ascending order.
pub fn sum_by_bucket<I>(items: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut buckets = BTreeMap::new();
    for (key, value) in items {
        *buckets.entry(key).or_insert(0.0) += value;
    }
    buckets
}

pub fn monthly_series(by_month: &BTreeMap<String, f64>) -> Vec<MonthlyValue> {
    by_month
        .iter()
        .map(|(month, value)| MonthlyValue {
            month: month.clone(),
            label: label_for_month_key(month),
            value: *value,
        })
        .collect()
}

/// Running total in chronological order.
pub fn cumulative_series(monthly: &[MonthlyValue]) -> Vec<TrendPoint> {
    let mut running = 0.0;
    monthly
        .iter()
        .map(|m| {
            running += m.value;
            TrendPoint {
                month: m.month.clone(),
                label: m.label.clone(),
                value: m.value,
                cumulative: running,
            }
        })
        .collect()
}

/// Evenly spaced line from zero on the first label to `target` on the last.
pub fn goal_line(target: f64, labels: &[String]) -> Vec<GoalPoint> {
    let steps = labels.len().saturating_sub(1);
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| GoalPoint {
            label: label.clone(),
            goal: if steps == 0 {
                target
            } else {
                target * i as f64 / steps as f64
            },
        })
        .collect()
}

/// Last and second-to-last observed buckets, zero when missing. The prior
/// value is whatever was observed before the last bucket, which is not
/// necessarily the adjacent calendar month.
pub fn last_and_prior(by_bucket: &BTreeMap<String, f64>) -> (f64, f64) {
    let mut values = by_bucket.values().rev();
    let last = values.next().copied().unwrap_or(0.0);
    let prior = values.next().copied().unwrap_or(0.0);
    (last, prior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::month_abbreviations;

    fn staff(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sum_by_staff_is_dense_and_ordered() {
        let list = staff(&["CD", "AB", "EF"]);
        let agg = Aggregator::new(&list);

        let totals = agg.sum_by_staff(vec![
            ("AB", 1200.0),
            ("AB", 500.0),
            ("CD", 10.0),
            ("ZZ", 99.0),
        ]);

        assert_eq!(
            totals,
            vec![
                StaffValue { staff: "CD".to_string(), value: 10.0 },
                StaffValue { staff: "AB".to_string(), value: 1700.0 },
                StaffValue { staff: "EF".to_string(), value: 0.0 },
            ]
        );
    }

    #[test]
    fn test_cumulative_series() {
        let by_month = sum_by_bucket(vec![
            ("2024-03".to_string(), 300.0),
            ("2024-01".to_string(), 100.0),
            ("2024-02".to_string(), 50.0),
            ("2024-01".to_string(), 25.0),
        ]);
        let trend = cumulative_series(&monthly_series(&by_month));

        let months: Vec<&str> = trend.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        let cumulative: Vec<f64> = trend.iter().map(|p| p.cumulative).collect();
        assert_eq!(cumulative, vec![125.0, 175.0, 475.0]);
        assert_eq!(trend[0].label, "Jan 2024");

        let total: f64 = trend.iter().map(|p| p.value).sum();
        assert_eq!(trend.last().unwrap().cumulative, total);
    }

    #[test]
    fn test_last_and_prior() {
        let mut by_month = BTreeMap::new();
        assert_eq!(last_and_prior(&by_month), (0.0, 0.0));

        by_month.insert("2024-01".to_string(), 10.0);
        assert_eq!(last_and_prior(&by_month), (10.0, 0.0));

        // gap in February: prior is the last observed month, January
        by_month.insert("2024-03".to_string(), 30.0);
        assert_eq!(last_and_prior(&by_month), (30.0, 10.0));
    }

    #[test]
    fn test_dense_matrix_zero_fills() {
        let list = staff(&["AB", "CD"]);
        let agg = Aggregator::new(&list);
        let weeks = staff(&["2024-03-04", "2024-03-11"]);

        let matrix = agg.dense_matrix(
            &weeks,
            vec![
                ("2024-03-11".to_string(), "AB", 8.0),
                ("2024-03-11".to_string(), "AB", 2.0),
                ("2024-02-26".to_string(), "CD", 5.0),
                ("2024-03-04".to_string(), "ZZ", 5.0),
            ],
        );

        assert_eq!(matrix.rows.len(), 2);
        assert!(matrix.rows.iter().all(|r| r.values.len() == 2));
        assert_eq!(matrix.get("2024-03-11", "AB"), Some(10.0));
        assert_eq!(matrix.get("2024-03-04", "AB"), Some(0.0));
        assert_eq!(matrix.get("2024-03-04", "CD"), Some(0.0));
        assert_eq!(matrix.get("2024-02-26", "CD"), None);
    }

    #[test]
    fn test_recent_observed_matrix_does_not_pad() {
        let list = staff(&["AB"]);
        let agg = Aggregator::new(&list);
        let items = vec![
            ("2024-01-01".to_string(), "AB", 1u64),
            ("2024-01-08".to_string(), "AB", 1),
            ("2024-01-15".to_string(), "AB", 1),
        ];

        let matrix = agg.recent_observed_matrix(RECENT_MATTER_WEEKS, items.clone());
        assert_eq!(matrix.rows.len(), 3);

        let matrix = agg.recent_observed_matrix(2, items);
        assert_eq!(matrix.buckets(), vec!["2024-01-08", "2024-01-15"]);
    }

    #[test]
    fn test_unlisted_staff_do_not_create_buckets() {
        let list = staff(&["AB"]);
        let agg = Aggregator::new(&list);
        let matrix = agg.recent_observed_matrix(
            4,
            vec![
                ("2024-01-01".to_string(), "AB", 1u64),
                ("2024-01-08".to_string(), "ZZ", 1),
            ],
        );
        assert_eq!(matrix.buckets(), vec!["2024-01-01"]);
    }

    #[test]
    fn test_empty_staff_list_gives_zero_columns() {
        let list: Vec<String> = Vec::new();
        let agg = Aggregator::new(&list);
        let weeks = staff(&["2024-03-04"]);
        let matrix = agg.dense_matrix(&weeks, vec![("2024-03-04".to_string(), "AB", 1.0)]);
        assert_eq!(matrix.rows.len(), 1);
        assert!(matrix.rows[0].values.is_empty());
        assert!(agg.sum_by_staff(vec![("AB", 1.0)]).is_empty());
    }

    #[test]
    fn test_goal_line_spans_the_year() {
        let months = month_abbreviations();
        let line = goal_line(1_100_000.0, &months);

        assert_eq!(line.len(), 12);
        assert_eq!(line[0].label, "Jan");
        assert_eq!(line[0].goal, 0.0);
        assert_eq!(line[1].goal, 100_000.0);
        assert_eq!(line[11].label, "Dec");
        assert_eq!(line[11].goal, 1_100_000.0);

        assert!(goal_line(5.0, &[]).is_empty());
        assert_eq!(goal_line(5.0, &["Jan".to_string()])[0].goal, 5.0);
    }
}
