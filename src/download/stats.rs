//! Per-run success/failure counters shared by all workers

use std::sync::Mutex;

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

impl StatsSnapshot {
    pub fn completed(&self) -> usize {
        self.successful + self.failed
    }
}

#[derive(Debug, Default)]
struct Counts {
    successful: usize,
    failed: usize,
}

/// Counters for one run, only ever incremented
#[derive(Debug)]
pub struct RunStats {
    total: usize,
    counts: Mutex<Counts>,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            counts: Mutex::new(Counts::default()),
        }
    }

    /// Count one finished track and return the counters after the increment
    pub fn record(&self, success: bool) -> StatsSnapshot {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        if success {
            counts.successful += 1;
        } else {
            counts.failed += 1;
        }
        StatsSnapshot {
            successful: counts.successful,
            failed: counts.failed,
            total: self.total,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            successful: counts.successful,
            failed: counts.failed,
            total: self.total,
        }
    }
}
