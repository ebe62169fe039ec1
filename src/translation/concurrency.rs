/*!
 * Concurrency control for provider requests.
 *
 * Two limiters share one `run(task)` interface. The fixed limiter is a
 * plain ceiling for providers without request quotas. The ramp-up limiter
 * starts conservative and raises its ceiling on a timer so a cold-start
 * burst never trips a provider's per-minute quota; it reaches the
 * tier-specific maximum after a warm-up period. Queued tasks wake in FIFO
 * order, a failing task releases its slot like any other, and the ceiling
 * is never exceeded.
 */

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// Time source for the ramp check, injectable for deterministic tests
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Rate-limit profile for one OpenAI usage tier.
///
/// `max_parallel` targets roughly 80% of the tier's requests-per-minute
/// quota at typical request latency, leaving headroom for retries.
#[derive(Debug, Clone, Copy)]
pub struct TierProfile {
    /// Requests per minute allowed by the tier
    pub rpm: u32,
    /// Tokens per minute allowed by the tier
    pub tpm: u64,
    /// Ceiling once fully ramped
    pub max_parallel: usize,
    /// Ceiling at job start
    pub ramp_initial: usize,
    /// Interval between ramp steps in milliseconds
    pub ramp_delay_ms: u64,
    /// Ceiling increase per step
    pub ramp_step: usize,
}

impl TierProfile {
    /// Profile for a usage tier; unknown tiers fall back to tier 1
    pub fn for_tier(tier: u8) -> Self {
        match tier {
            2 => Self { rpm: 500, tpm: 2_000_000, max_parallel: 10, ramp_initial: 4, ramp_delay_ms: 4000, ramp_step: 3 },
            3 => Self { rpm: 5000, tpm: 4_000_000, max_parallel: 80, ramp_initial: 20, ramp_delay_ms: 2000, ramp_step: 20 },
            4 => Self { rpm: 10_000, tpm: 10_000_000, max_parallel: 150, ramp_initial: 40, ramp_delay_ms: 1500, ramp_step: 40 },
            5 => Self { rpm: 30_000, tpm: 150_000_000, max_parallel: 400, ramp_initial: 80, ramp_delay_ms: 1000, ramp_step: 80 },
            _ => Self { rpm: 500, tpm: 200_000, max_parallel: 8, ramp_initial: 3, ramp_delay_ms: 5000, ramp_step: 2 },
        }
    }
}

/// Static ceiling on concurrent tasks
pub struct FixedController {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl FixedController {
    /// Create a controller with a static ceiling
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            limit: limit.max(1),
        }
    }

    /// Run a task under the ceiling, queueing FIFO when saturated
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _permit = self.semaphore.acquire().await.unwrap();
        task.await
    }
}

struct RampState {
    granted: usize,
    last_ramp: Instant,
}

/// Ceiling that ramps from an initial value to a maximum over time.
///
/// The ramp is checked lazily on each `run` call against the injected
/// clock; there is no background timer.
pub struct RampUpController {
    semaphore: Arc<Semaphore>,
    state: Mutex<RampState>,
    max_parallel: usize,
    step: usize,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RampUpController {
    /// Create a controller from a tier profile
    pub fn new(profile: TierProfile, clock: Arc<dyn Clock>) -> Self {
        let initial = profile.ramp_initial.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(initial)),
            state: Mutex::new(RampState {
                granted: initial,
                last_ramp: clock.now(),
            }),
            max_parallel: profile.max_parallel.max(initial),
            step: profile.ramp_step.max(1),
            interval: Duration::from_millis(profile.ramp_delay_ms),
            clock,
        }
    }

    /// Run a task under the current ceiling, queueing FIFO when saturated
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.check_ramp();
        let _permit = self.semaphore.acquire().await.unwrap();
        task.await
    }

    /// Current ceiling
    pub fn current_limit(&self) -> usize {
        self.state.lock().granted
    }

    fn check_ramp(&self) {
        let mut state = self.state.lock();
        if state.granted >= self.max_parallel {
            return;
        }

        let now = self.clock.now();
        if now.duration_since(state.last_ramp) < self.interval {
            return;
        }

        let add = self.step.min(self.max_parallel - state.granted);
        let old = state.granted;
        state.granted += add;
        state.last_ramp = now;
        self.semaphore.add_permits(add);
        debug!("Ramp-up: concurrency {} -> {}/{}", old, state.granted, self.max_parallel);
    }
}

/// Concurrency controller for a translation run
pub enum ConcurrencyController {
    /// Static ceiling
    Fixed(FixedController),
    /// Time-based ramp toward a tier maximum
    RampUp(RampUpController),
}

impl ConcurrencyController {
    /// Fixed ceiling controller
    pub fn fixed(limit: usize) -> Self {
        Self::Fixed(FixedController::new(limit))
    }

    /// Ramping controller using wall-clock time
    pub fn ramping(profile: TierProfile) -> Self {
        Self::RampUp(RampUpController::new(profile, Arc::new(SystemClock)))
    }

    /// Ramping controller with an injected clock
    pub fn ramping_with_clock(profile: TierProfile, clock: Arc<dyn Clock>) -> Self {
        Self::RampUp(RampUpController::new(profile, clock))
    }

    /// Run a task under the controller's ceiling
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        match self {
            Self::Fixed(controller) => controller.run(task).await,
            Self::RampUp(controller) => controller.run(task).await,
        }
    }

    /// Current ceiling
    pub fn current_limit(&self) -> usize {
        match self {
            Self::Fixed(controller) => controller.limit,
            Self::RampUp(controller) => controller.current_limit(),
        }
    }
}
