use serde::{Deserialize, Serialize};

/// Aggregate statistics tracked by the backend across the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_new::new)]
pub struct Statistics {
    #[new(default)]
    pub transported_count: u64,
    #[new(default)]
    pub move_count: u64,
    #[new(default)]
    pub elapsed_time: f64,
    #[new(default)]
    pub max_wait_time: f64,
    #[new(default)]
    pub avg_wait_time: f64,
    #[new(default)]
    pub transported_per_sec: f64,
}

impl Statistics {
    /// Folds one more completed wait time into the running mean and max,
    /// and bumps `transported_count`. The caller is responsible for
    /// calling this exactly once per passenger exit.
    pub fn record_transport(&mut self, wait_time: f64) {
        let total_wait = self.avg_wait_time * self.transported_count as f64;
        self.transported_count += 1;
        self.avg_wait_time = (total_wait + wait_time) / self.transported_count as f64;
        self.max_wait_time = self.max_wait_time.max(wait_time);
    }

    pub fn record_move(&mut self) {
        self.move_count += 1;
    }

    pub fn refresh_rate(&mut self) {
        self.transported_per_sec = if self.elapsed_time > 0.0 {
            self.transported_count as f64 / self.elapsed_time
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_law_holds_after_each_exit() {
        let mut stats = Statistics::new();
        let waits = [2.0, 4.0, 6.0];
        let mut total = 0.0;
        for (i, &w) in waits.iter().enumerate() {
            stats.record_transport(w);
            total += w;
            assert_eq!(stats.transported_count, i as u64 + 1);
            assert!((stats.avg_wait_time * stats.transported_count as f64 - total).abs() < 1e-9);
        }
        assert_eq!(stats.max_wait_time, 6.0);
    }

    #[test]
    fn refresh_rate_is_zero_before_any_elapsed_time() {
        let mut stats = Statistics::new();
        stats.record_transport(3.0);
        stats.refresh_rate();
        assert_eq!(stats.transported_per_sec, 0.0);
    }
}
