use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amounted, Cents, Timestamped};

/// Chart window: how many buckets, and whether they are days or months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesWindow {
    Last7Days,
    Last30Days,
    Last12Months,
}

impl SeriesWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesWindow::Last7Days => "7d",
            SeriesWindow::Last30Days => "30d",
            SeriesWindow::Last12Months => "12m",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "7d" | "week" | "last7days" => Some(SeriesWindow::Last7Days),
            "30d" | "month" | "last30days" => Some(SeriesWindow::Last30Days),
            "12m" | "year" | "last12months" => Some(SeriesWindow::Last12Months),
            _ => None,
        }
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            SeriesWindow::Last7Days => 7,
            SeriesWindow::Last30Days => 30,
            SeriesWindow::Last12Months => 12,
        }
    }

    /// Consecutive `[start, end)` periods ending with the one that contains `now`,
    /// oldest first. Always exactly `bucket_count()` entries.
    pub fn periods(&self, now: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let count = self.bucket_count();
        match self {
            SeriesWindow::Last7Days | SeriesWindow::Last30Days => {
                let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
                (0..count)
                    .rev()
                    .map(|back| {
                        let start = today - Duration::days(back as i64);
                        (start, start + Duration::days(1))
                    })
                    .collect()
            }
            SeriesWindow::Last12Months => (0..count)
                .rev()
                .map(|back| {
                    let start = month_start(now.year(), now.month(), -(back as i32));
                    let end = month_start(now.year(), now.month(), 1 - back as i32);
                    (start, end)
                })
                .collect(),
        }
    }

    /// Overall `[start, end)` span covered by the window.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let periods = self.periods(now);
        let start = periods.first().map(|p| p.0).unwrap_or(now);
        let end = periods.last().map(|p| p.1).unwrap_or(now);
        (start, end)
    }

    fn label(&self, period_start: DateTime<Utc>) -> String {
        match self {
            SeriesWindow::Last7Days | SeriesWindow::Last30Days => {
                period_start.format("%d %b").to_string()
            }
            SeriesWindow::Last12Months => period_start.format("%b %Y").to_string(),
        }
    }
}

impl std::fmt::Display for SeriesWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Midnight UTC on the first day of the month `offset` months away from year/month.
fn month_start(year: i32, month: u32, offset: i32) -> DateTime<Utc> {
    let index = year * 12 + (month as i32 - 1) + offset;
    let (y, m) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
    NaiveDate::from_ymd_opt(y, m, 1)
        .expect("day 1 exists in every month")
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Read a stored timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare
/// `YYYY-MM-DD` (taken as midnight UTC). Anything else is unknown.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesBucket {
    pub label: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub sales_total: Cents,
    /// Second stream of the chart: payments received or purchases,
    /// depending on what the caller passes in
    pub payments_total: Cents,
}

/// Bucket two transaction streams into the periods of `window`.
/// Records outside the window or with an unknown timestamp are left out;
/// empty periods are reported with zero totals.
pub fn build_series<S, P>(
    window: SeriesWindow,
    now: DateTime<Utc>,
    sales: &[S],
    payments: &[P],
) -> Vec<SeriesBucket>
where
    S: Amounted + Timestamped,
    P: Amounted + Timestamped,
{
    let mut buckets: Vec<SeriesBucket> = window
        .periods(now)
        .into_iter()
        .map(|(period_start, period_end)| SeriesBucket {
            label: window.label(period_start),
            period_start,
            period_end,
            sales_total: 0,
            payments_total: 0,
        })
        .collect();

    for record in sales {
        if let Some(idx) = bucket_index(&buckets, record.timestamp()) {
            buckets[idx].sales_total += record.amount();
        }
    }
    for record in payments {
        if let Some(idx) = bucket_index(&buckets, record.timestamp()) {
            buckets[idx].payments_total += record.amount();
        }
    }

    buckets
}

fn bucket_index(buckets: &[SeriesBucket], timestamp: Option<DateTime<Utc>>) -> Option<usize> {
    let ts = timestamp?;
    let after = buckets.partition_point(|b| b.period_start <= ts);
    let idx = after.checked_sub(1)?;
    (ts < buckets[idx].period_end).then_some(idx)
}

/// Sum of amounts whose timestamp falls in `[start, end)`.
pub fn sum_in_range<T>(records: &[T], start: DateTime<Utc>, end: DateTime<Utc>) -> Cents
where
    T: Amounted + Timestamped,
{
    records
        .iter()
        .filter(|r| r.timestamp().is_some_and(|ts| start <= ts && ts < end))
        .map(Amounted::amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(Option<DateTime<Utc>>, Cents);

    impl Amounted for Entry {
        fn amount(&self) -> Cents {
            self.1
        }
    }

    impl Timestamped for Entry {
        fn timestamp(&self) -> Option<DateTime<Utc>> {
            self.0
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    const NONE: &[Entry] = &[];

    #[test]
    fn test_length_is_fixed_for_every_window() {
        let now = at("2024-03-15T10:30:00Z");
        for window in [
            SeriesWindow::Last7Days,
            SeriesWindow::Last30Days,
            SeriesWindow::Last12Months,
        ] {
            let series = build_series(window, now, NONE, NONE);
            assert_eq!(series.len(), window.bucket_count());
            assert!(series.iter().all(|b| b.sales_total == 0 && b.payments_total == 0));
        }
    }

    #[test]
    fn test_daily_buckets_end_today_oldest_first() {
        let now = at("2024-03-15T10:30:00Z");
        let series = build_series(SeriesWindow::Last7Days, now, NONE, NONE);

        assert_eq!(series[0].period_start, at("2024-03-09T00:00:00Z"));
        assert_eq!(series[6].period_start, at("2024-03-15T00:00:00Z"));
        assert_eq!(series[6].period_end, at("2024-03-16T00:00:00Z"));
        assert_eq!(series[6].label, "15 Mar");
        for pair in series.windows(2) {
            assert_eq!(pair[0].period_end, pair[1].period_start);
        }
    }

    #[test]
    fn test_monthly_buckets_cross_year_boundary() {
        let now = at("2024-02-10T08:00:00Z");
        let series = build_series(SeriesWindow::Last12Months, now, NONE, NONE);

        assert_eq!(series[0].period_start, at("2023-03-01T00:00:00Z"));
        assert_eq!(series[0].label, "Mar 2023");
        assert_eq!(series[10].period_start, at("2024-01-01T00:00:00Z"));
        assert_eq!(series[10].period_end, at("2024-02-01T00:00:00Z"));
        assert_eq!(series[11].label, "Feb 2024");
        assert_eq!(series[11].period_end, at("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn test_amounts_land_in_half_open_buckets() {
        let now = at("2024-03-15T10:30:00Z");
        let sales = vec![
            Entry(Some(at("2024-03-14T00:00:00Z")), 100),
            Entry(Some(at("2024-03-14T23:59:59Z")), 200),
            Entry(Some(at("2024-03-15T00:00:00Z")), 400),
        ];
        let payments = vec![Entry(Some(at("2024-03-09T12:00:00Z")), 50)];

        let series = build_series(SeriesWindow::Last7Days, now, &sales, &payments);
        assert_eq!(series[5].sales_total, 300);
        assert_eq!(series[6].sales_total, 400);
        assert_eq!(series[0].payments_total, 50);
    }

    #[test]
    fn test_sum_invariant_excludes_outside_and_unknown() {
        let now = at("2024-03-15T10:30:00Z");
        let sales = vec![
            Entry(Some(at("2024-03-01T09:00:00Z")), 1_000),
            Entry(Some(at("2024-02-14T09:00:00Z")), 2_000),
            Entry(Some(at("2024-02-15T00:00:00Z")), 4_000),
            Entry(Some(at("2024-02-14T23:59:59Z")), 8_000),
            Entry(Some(at("2024-03-16T00:00:00Z")), 16_000),
            Entry(None, 32_000),
        ];

        let window = SeriesWindow::Last30Days;
        let series = build_series(window, now, &sales, NONE);
        let bucketed: Cents = series.iter().map(|b| b.sales_total).sum();
        let (start, end) = window.bounds(now);

        assert_eq!(start, at("2024-02-15T00:00:00Z"));
        assert_eq!(bucketed, sum_in_range(&sales, start, end));
        assert_eq!(bucketed, 5_000);
    }

    #[test]
    fn test_monthly_sum_matches_window() {
        let now = at("2024-12-31T23:00:00Z");
        let sales = vec![
            Entry(Some(at("2024-01-01T00:00:00Z")), 10),
            Entry(Some(at("2023-12-31T23:59:59Z")), 20),
            Entry(Some(at("2024-12-31T22:00:00Z")), 40),
        ];
        let series = build_series(SeriesWindow::Last12Months, now, &sales, NONE);
        assert_eq!(series[0].sales_total, 10);
        assert_eq!(series[11].sales_total, 40);
        assert_eq!(series.iter().map(|b| b.sales_total).sum::<Cents>(), 50);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-03-15T10:30:00+05:30"),
            Some(at("2024-03-15T05:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-03-15 10:30:00"),
            Some(at("2024-03-15T10:30:00Z"))
        );
        assert_eq!(parse_timestamp("2024-03-15"), Some(at("2024-03-15T00:00:00Z")));
        assert_eq!(parse_timestamp("15/03/2024"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!(SeriesWindow::from_str("7d"), Some(SeriesWindow::Last7Days));
        assert_eq!(SeriesWindow::from_str("30D"), Some(SeriesWindow::Last30Days));
        assert_eq!(SeriesWindow::from_str("12m"), Some(SeriesWindow::Last12Months));
        assert_eq!(SeriesWindow::from_str("90d"), None);
    }
}
