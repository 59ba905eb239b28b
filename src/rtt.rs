//! Running RTT statistics: min/max/sum/count plus an ordered sample list
//! used at report time to compute the mean deviation.

#[derive(Debug, Clone, Default)]
pub struct RttStats {
    count: u64,
    sum_ms: f64,
    min_ms: f64,
    max_ms: f64,
    samples: Vec<f64>,
}

impl RttStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, rtt_ms: f64) {
        if self.count == 0 {
            self.min_ms = rtt_ms;
            self.max_ms = rtt_ms;
        } else {
            self.min_ms = self.min_ms.min(rtt_ms);
            self.max_ms = self.max_ms.max(rtt_ms);
        }
        self.sum_ms += rtt_ms;
        self.count += 1;

        let idx = self.samples.partition_point(|&x| x <= rtt_ms);
        self.samples.insert(idx, rtt_ms);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min_ms(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min_ms)
    }

    pub fn max_ms(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max_ms)
    }

    pub fn avg_ms(&self) -> Option<f64> {
        (self.count > 0).then_some(self.sum_ms / self.count as f64)
    }

    /// `Σ|xᵢ − avg| / count`, the straightforward mean deviation (see
    /// DESIGN.md open question on the source's inconsistent mdev variants).
    pub fn mdev_ms(&self) -> Option<f64> {
        let avg = self.avg_ms()?;
        let sum_dev: f64 = self.samples.iter().map(|x| (x - avg).abs()).sum();
        Some(sum_dev / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_report_nothing() {
        let stats = RttStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min_ms(), None);
        assert_eq!(stats.max_ms(), None);
        assert_eq!(stats.avg_ms(), None);
        assert_eq!(stats.mdev_ms(), None);
    }

    #[test]
    fn single_sample_min_eq_avg_eq_max() {
        let mut stats = RttStats::new();
        stats.record(12.5);
        assert_eq!(stats.min_ms(), Some(12.5));
        assert_eq!(stats.max_ms(), Some(12.5));
        assert_eq!(stats.avg_ms(), Some(12.5));
        assert_eq!(stats.mdev_ms(), Some(0.0));
    }

    #[test]
    fn min_is_always_at_most_avg_which_is_always_at_most_max() {
        let mut stats = RttStats::new();
        for rtt in [5.0, 20.0, 10.0, 1.0, 50.0] {
            stats.record(rtt);
        }
        let min = stats.min_ms().unwrap();
        let avg = stats.avg_ms().unwrap();
        let max = stats.max_ms().unwrap();
        assert!(min <= avg);
        assert!(avg <= max);
        assert_eq!(min, 1.0);
        assert_eq!(max, 50.0);
    }

    #[test]
    fn mean_deviation_matches_formula() {
        let mut stats = RttStats::new();
        for rtt in [10.0, 20.0, 30.0] {
            stats.record(rtt);
        }
        // avg = 20, deviations = 10, 0, 10, mean = 20/3
        let mdev = stats.mdev_ms().unwrap();
        assert!((mdev - 20.0 / 3.0).abs() < 1e-9);
    }
}
