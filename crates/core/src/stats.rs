use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::request::{Request, RequestStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: u32,
    pub halted: u32,
    pub in_flight: u32,
}

impl StatusCounts {
    fn record(&mut self, status: RequestStatus) {
        match status {
            RequestStatus::Completed => self.completed += 1,
            RequestStatus::Halted => self.halted += 1,
            _ => self.in_flight += 1,
        }
    }
}

/// Derived read-only statistics over a snapshot of requests. Each window
/// genuinely filters on `created_at` relative to the supplied `now`; there
/// is no separate time-partitioned storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub daily: StatusCounts,
    pub weekly: StatusCounts,
    pub monthly: StatusCounts,
}

pub fn snapshot(requests: &[Request], now: DateTime<Utc>) -> RequestStats {
    RequestStats {
        daily: window(requests, now, Duration::days(1)),
        weekly: window(requests, now, Duration::days(7)),
        monthly: window(requests, now, Duration::days(30)),
    }
}

fn window(requests: &[Request], now: DateTime<Utc>, span: Duration) -> StatusCounts {
    let cutoff = now - span;
    let mut counts = StatusCounts::default();
    for request in requests {
        if request.created_at > cutoff && request.created_at <= now {
            counts.record(request.status);
        }
    }
    counts
}
