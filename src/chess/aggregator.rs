use super::log;
use super::month::MonthLabel;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub month: MonthLabel,
    pub hours: f64,
    pub games: u64,
    pub gap_filler: bool,
}

impl MonthBucket {
    fn open(month: MonthLabel) -> Self {
        Self {
            month,
            hours: 0.0,
            games: 0,
            gap_filler: false,
        }
    }

    fn filler(month: MonthLabel) -> Self {
        Self {
            gap_filler: true,
            ..Self::open(month)
        }
    }
}

/// Final month series: buckets in arrival order plus the grand total.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyTotals {
    pub buckets: Vec<MonthBucket>,
    pub total_hours: f64,
}

impl MonthlyTotals {
    /// Running total after each bucket, in bucket order.
    pub fn cumulative_hours(&self) -> impl Iterator<Item = f64> + '_ {
        self.buckets.iter().scan(0.0, |acc, bucket| {
            *acc += bucket.hours;
            Some(*acc)
        })
    }

    pub fn games(&self) -> u64 {
        self.buckets.iter().map(|b| b.games).sum()
    }
}

/// Month buckets built from newest-first games.
///
/// Months are expected to arrive in reverse calendar order. When consecutive games skip
/// months, at most two zero-hour fillers are inserted: the month before the last bucket,
/// and the month after the new one if it is still not adjacent.
#[derive(Debug, Default)]
pub struct MonthSeries {
    buckets: Vec<MonthBucket>,
    total_hours: f64,
}

impl MonthSeries {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    pub fn ingest(&mut self, month: MonthLabel, hours: f64) {
        match self.buckets.last() {
            None => self.buckets.push(MonthBucket::open(month)),
            Some(last) if last.month == month => {}
            Some(last) => {
                let last_month = last.month;
                self.total_hours += last.hours;

                if month > last_month {
                    log::warn(format!(
                        "Month {} arrived after {}; input is not newest-first",
                        month, last_month
                    ));
                }

                let filler = last_month.prev();
                if filler != month {
                    self.buckets.push(MonthBucket::filler(filler));
                    if month.next() != filler {
                        self.buckets.push(MonthBucket::filler(month.next()));
                    }
                }

                self.buckets.push(MonthBucket::open(month));
            }
        }

        if let Some(current) = self.buckets.last_mut() {
            current.hours += hours;
            current.games += 1;
        }
    }

    /// Closes the open bucket and returns the series.
    pub fn finish(mut self) -> MonthlyTotals {
        if let Some(last) = self.buckets.last() {
            self.total_hours += last.hours;
        }

        MonthlyTotals {
            buckets: self.buckets,
            total_hours: self.total_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> MonthLabel {
        s.parse().unwrap()
    }

    fn labels(totals: &MonthlyTotals) -> Vec<String> {
        totals.buckets.iter().map(|b| b.month.to_string()).collect()
    }

    #[test]
    fn test_single_record_gives_one_bucket() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.03"), 1.5);

        let totals = series.finish();
        assert_eq!(labels(&totals), ["2021.03"]);
        assert_eq!(totals.buckets[0].hours, 1.5);
        assert_eq!(totals.buckets[0].games, 1);
        assert_eq!(totals.total_hours, 1.5);
    }

    #[test]
    fn test_empty_series() {
        let totals = MonthSeries::new().finish();
        assert!(totals.buckets.is_empty());
        assert_eq!(totals.total_hours, 0.0);
    }

    #[test]
    fn test_same_month_accumulates() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.03"), 0.5);
        series.ingest(label("2021.03"), 0.25);

        assert_eq!(series.buckets().len(), 1);
        assert_eq!(series.total_hours, 0.0);

        let totals = series.finish();
        assert_eq!(totals.buckets[0].hours, 0.75);
        assert_eq!(totals.buckets[0].games, 2);
        assert_eq!(totals.total_hours, 0.75);
    }

    #[test]
    fn test_single_month_gap_is_filled() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.03"), 1.0);
        series.ingest(label("2021.03"), 1.0);
        series.ingest(label("2021.01"), 0.5);

        let totals = series.finish();
        assert_eq!(labels(&totals), ["2021.03", "2021.02", "2021.01"]);
        assert!(totals.buckets[1].gap_filler);
        assert_eq!(totals.buckets[1].hours, 0.0);
        assert_eq!(totals.buckets[1].games, 0);
        assert_eq!(totals.total_hours, 2.5);
    }

    #[test]
    fn test_adjacent_months_across_year_boundary_need_no_filler() {
        let mut series = MonthSeries::new();
        series.ingest(label("2022.01"), 1.0);
        series.ingest(label("2021.12"), 1.0);

        let totals = series.finish();
        assert_eq!(labels(&totals), ["2022.01", "2021.12"]);
        assert!(totals.buckets.iter().all(|b| !b.gap_filler));
    }

    #[test]
    fn test_out_of_order_month_uses_same_directional_rule() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.03"), 1.0);
        series.ingest(label("2021.05"), 2.0);

        let totals = series.finish();
        assert_eq!(labels(&totals), ["2021.03", "2021.02", "2021.06", "2021.05"]);
        assert_eq!(totals.total_hours, 3.0);
    }

    #[test]
    fn test_gap_filler_across_year_boundary() {
        let mut series = MonthSeries::new();
        series.ingest(label("2022.01"), 1.0);
        series.ingest(label("2021.11"), 1.0);

        let totals = series.finish();
        assert_eq!(labels(&totals), ["2022.01", "2021.12", "2021.11"]);
    }

    #[test]
    fn test_two_month_gap_is_filled_from_both_ends() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.04"), 1.0);
        series.ingest(label("2021.01"), 1.0);

        let totals = series.finish();
        assert_eq!(
            labels(&totals),
            ["2021.04", "2021.03", "2021.02", "2021.01"]
        );
    }

    #[test]
    fn test_longer_gap_is_only_partially_filled() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.06"), 1.0);
        series.ingest(label("2021.01"), 1.0);

        let totals = series.finish();
        assert_eq!(
            labels(&totals),
            ["2021.06", "2021.05", "2021.02", "2021.01"]
        );
        assert_eq!(totals.total_hours, 2.0);
    }

    #[test]
    fn test_running_total_counts_every_closed_bucket_once() {
        let mut series = MonthSeries::new();
        series.ingest(label("2021.05"), 2.0);
        series.ingest(label("2021.04"), 3.0);
        assert_eq!(series.total_hours, 2.0);
        series.ingest(label("2021.02"), 4.0);
        assert_eq!(series.total_hours, 5.0);

        let totals = series.finish();
        assert_eq!(totals.total_hours, 9.0);
        let cumulative: Vec<f64> = totals.cumulative_hours().collect();
        assert_eq!(cumulative, [2.0, 5.0, 5.0, 9.0]);
        assert_eq!(totals.games(), 3);
    }
}
