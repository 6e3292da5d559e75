#![forbid(unsafe_code)]

use rand::Rng;
use time::OffsetDateTime;

/// Random spread added on top of the clock, inclusive.
pub const MAX_JITTER: i64 = 999;

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Task ids are `base + position`, where `base = now_ms + jitter` is drawn
/// once on the first call. Ids within a run are strictly increasing in
/// position; separate runs can collide.
#[derive(Debug)]
pub struct IdGenerator<C, R> {
    clock: C,
    rng: R,
    base: Option<i64>,
}

impl<C: Clock, R: Rng> IdGenerator<C, R> {
    pub fn new(clock: C, rng: R) -> Self {
        Self {
            clock,
            rng,
            base: None,
        }
    }

    fn base(&mut self) -> i64 {
        match self.base {
            Some(base) => base,
            None => {
                let base = self
                    .clock
                    .now_millis()
                    .saturating_add(self.rng.gen_range(0..=MAX_JITTER));
                self.base = Some(base);
                base
            }
        }
    }

    pub fn next_id(&mut self, position: usize) -> i64 {
        self.base()
            .saturating_add(i64::try_from(position).unwrap_or(i64::MAX))
    }
}

impl IdGenerator<SystemClock, rand::rngs::ThreadRng> {
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock, rand::thread_rng())
    }
}
