use core_types::RegimeThresholds;
use core_types::stats::quantile_sorted;
use std::collections::VecDeque;

/// The fixed-capacity trailing window of spread values, with its observed
/// values kept sorted so each period's percentiles cost one insert and one
/// removal instead of a full sort.
#[derive(Debug, Clone)]
pub struct SortedWindow {
    capacity: usize,
    /// Every period in the window, gaps included, oldest first.
    recent: VecDeque<Option<f64>>,
    /// The observed values of `recent`, ascending.
    sorted: Vec<f64>,
}

impl SortedWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: VecDeque::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    /// Slides the window forward by one period.
    pub fn push(&mut self, value: Option<f64>) {
        if self.recent.len() == self.capacity {
            if let Some(Some(evicted)) = self.recent.pop_front() {
                let idx = self.sorted.partition_point(|v| v.total_cmp(&evicted).is_lt());
                self.sorted.remove(idx);
            }
        }
        if let Some(value) = value {
            let idx = self.sorted.partition_point(|v| v.total_cmp(&value).is_lt());
            self.sorted.insert(idx, value);
        }
        self.recent.push_back(value);
    }

    pub fn observed(&self) -> &[f64] {
        &self.sorted
    }
}

/// P25/P50/P75/P90 of an ascending window, or `None` below `min_history`
/// observations.
pub fn thresholds_from_sorted(sorted: &[f64], min_history: usize) -> Option<RegimeThresholds> {
    if sorted.len() < min_history {
        return None;
    }
    Some(RegimeThresholds {
        p25: quantile_sorted(sorted, 0.25)?,
        p50: quantile_sorted(sorted, 0.50)?,
        p75: quantile_sorted(sorted, 0.75)?,
        p90: quantile_sorted(sorted, 0.90)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_and_skips_gaps() {
        let mut window = SortedWindow::new(3);
        window.push(Some(5.0));
        window.push(None);
        window.push(Some(1.0));
        assert_eq!(window.observed(), &[1.0, 5.0]);

        window.push(Some(3.0));
        assert_eq!(window.observed(), &[1.0, 3.0]);

        // the gap leaves; nothing observed is evicted
        window.push(Some(3.0));
        assert_eq!(window.observed(), &[1.0, 3.0, 3.0]);

        window.push(Some(0.5));
        assert_eq!(window.observed(), &[0.5, 3.0, 3.0]);
    }

    #[test]
    fn thresholds_need_min_history() {
        assert_eq!(thresholds_from_sorted(&[1.0, 2.0], 3), None);

        let t = thresholds_from_sorted(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!((t.p25, t.p50, t.p75), (2.0, 3.0, 4.0));
        assert!((t.p90 - 4.6).abs() < 1e-12);
    }
}
