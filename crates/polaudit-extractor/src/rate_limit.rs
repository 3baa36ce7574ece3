//! Dual sliding-window rate limiter shared by every audit worker

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);

/// Added to every computed wait so the freed slot is really free on recheck
const SLACK: Duration = Duration::from_millis(10);

/// Source of time for the limiter
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock: sleeping advances virtual time instead of blocking
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// A clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move virtual time forward
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|p| p.into_inner());
        *elapsed += by;
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[derive(Debug, Default)]
struct Windows {
    second: VecDeque<Instant>,
    minute: VecDeque<Instant>,
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        while self
            .second
            .front()
            .is_some_and(|t| now.duration_since(*t) >= SECOND)
        {
            self.second.pop_front();
        }
        while self
            .minute
            .front()
            .is_some_and(|t| now.duration_since(*t) >= MINUTE)
        {
            self.minute.pop_front();
        }
    }
}

/// Admission control bounding calls per trailing second and per trailing minute
///
/// Both windows are checked and updated under one mutex, so concurrent
/// callers can never jointly exceed either ceiling. Waiting happens outside
/// the lock.
pub struct RateLimiter {
    per_sec: usize,
    per_min: usize,
    clock: Box<dyn Clock>,
    windows: Mutex<Windows>,
}

impl RateLimiter {
    /// Create a limiter on the wall clock (ceilings below 1 are raised to 1)
    pub fn new(per_min: u32, per_sec: u32) -> Self {
        Self::with_clock(per_min, per_sec, SystemClock)
    }

    /// Create a limiter on a custom clock
    pub fn with_clock(per_min: u32, per_sec: u32, clock: impl Clock + 'static) -> Self {
        Self {
            per_sec: per_sec.max(1) as usize,
            per_min: per_min.max(1) as usize,
            clock: Box::new(clock),
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Admission ceiling per minute
    pub fn per_minute(&self) -> u32 {
        self.per_min as u32
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Admit one call if both windows have room
    ///
    /// Returns the admission instant, or `Err(wait)` with the minimal wait
    /// until a slot frees.
    pub fn try_acquire(&self) -> Result<Instant, Duration> {
        let mut windows = self.lock();
        let now = self.clock.now();
        windows.prune(now);

        if windows.second.len() < self.per_sec && windows.minute.len() < self.per_min {
            windows.second.push_back(now);
            windows.minute.push_back(now);
            return Ok(now);
        }

        let mut wait = Duration::ZERO;
        if windows.second.len() >= self.per_sec {
            if let Some(oldest) = windows.second.front() {
                wait = wait.max(SECOND.saturating_sub(now.duration_since(*oldest)));
            }
        }
        if windows.minute.len() >= self.per_min {
            if let Some(oldest) = windows.minute.front() {
                wait = wait.max(MINUTE.saturating_sub(now.duration_since(*oldest)));
            }
        }
        Err(wait + SLACK)
    }

    /// Block until one call is admitted, returning the admission instant
    pub fn acquire(&self) -> Instant {
        loop {
            match self.try_acquire() {
                Ok(admitted) => return admitted,
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                    self.clock.sleep(wait);
                }
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_sec", &self.per_sec)
            .field("per_min", &self.per_min)
            .finish()
    }
}
