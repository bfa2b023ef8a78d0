//! Cooperative interruption.
//!
//! Long-running evaluation counts units of work (transitions, chain
//! starts) and looks at the shared flag every poll interval. Once the flag
//! has been seen, the poller stays interrupted.

use std::sync::atomic::{AtomicBool, Ordering};

use super::error::QueryStatus;

pub(crate) struct Poller<'a> {
    flag: &'a AtomicBool,
    interval: u64,
    ticks: u64,
    interrupted: bool,
}

impl<'a> Poller<'a> {
    pub fn new(flag: &'a AtomicBool, interval: u32) -> Self {
        Self {
            flag,
            interval: u64::from(interval.max(1)),
            ticks: 0,
            interrupted: false,
        }
    }

    /// Count one unit of work; look at the flag every poll interval.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks % self.interval == 0 {
            return self.check();
        }
        self.interrupted
    }

    /// Look at the flag now.
    pub fn check(&mut self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            self.interrupted = true;
        }
        self.interrupted
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn status(&self) -> QueryStatus {
        if self.interrupted {
            QueryStatus::Interrupted
        } else {
            QueryStatus::Completed
        }
    }
}
