//! Time source for confirmation stamps and sweep cutoffs.

use crate::domain::TimeMs;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> TimeMs;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeMs {
        TimeMs::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: TimeMs) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start.as_i64())),
        }
    }

    pub fn set(&self, at: TimeMs) {
        self.now_ms.store(at.as_i64(), Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) -> TimeMs {
        TimeMs::new(self.now_ms.fetch_add(ms, Ordering::SeqCst) + ms)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeMs {
        TimeMs::new(self.now_ms.load(Ordering::SeqCst))
    }
}
