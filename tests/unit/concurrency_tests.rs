/*!
 * Tests for the concurrency controllers
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;

use feedtrans::translation::concurrency::{ConcurrencyController, TierProfile};

/// Tracks the maximum number of tasks observed running at once
struct ConcurrencyProbe {
    running: AtomicUsize,
    max_seen: AtomicUsize,
}

impl ConcurrencyProbe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        })
    }

    async fn observe(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_fixed_controller_should_never_exceed_ceiling() {
    let controller = ConcurrencyController::fixed(4);
    let probe = ConcurrencyProbe::new();

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let probe = Arc::clone(&probe);
            controller.run(async move { probe.observe().await })
        })
        .collect();
    join_all(tasks).await;

    assert!(probe.max_seen() <= 4, "observed {} concurrent tasks", probe.max_seen());
    assert!(probe.max_seen() >= 2, "burst never reached the ceiling");
}

#[tokio::test]
async fn test_fixed_controller_with_failing_tasks_should_not_block_queue() {
    let controller = ConcurrencyController::fixed(2);
    let completed = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let completed = Arc::clone(&completed);
            controller.run(async move {
                completed.fetch_add(1, Ordering::SeqCst);
                if i % 3 == 0 {
                    Err::<(), &str>("task failure")
                } else {
                    Ok(())
                }
            })
        })
        .collect();
    let results = join_all(tasks).await;

    // Every task settled exactly once, failures included
    assert_eq!(results.len(), 20);
    assert_eq!(completed.load(Ordering::SeqCst), 20);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 7);
}

#[tokio::test]
async fn test_ramping_controller_should_respect_initial_ceiling() {
    // Wall-clock ramp interval far beyond the test duration: the ceiling
    // stays at the initial value throughout
    let profile = TierProfile {
        rpm: 500,
        tpm: 200_000,
        max_parallel: 50,
        ramp_initial: 3,
        ramp_delay_ms: 60_000,
        ramp_step: 10,
    };
    let controller = ConcurrencyController::ramping(profile);
    let probe = ConcurrencyProbe::new();

    let tasks: Vec<_> = (0..30)
        .map(|_| {
            let probe = Arc::clone(&probe);
            controller.run(async move { probe.observe().await })
        })
        .collect();
    join_all(tasks).await;

    assert!(probe.max_seen() <= 3, "observed {} concurrent tasks", probe.max_seen());
    assert_eq!(controller.current_limit(), 3);
}

#[test]
fn test_tier_profiles_should_scale_with_tier() {
    let tier1 = TierProfile::for_tier(1);
    let tier5 = TierProfile::for_tier(5);
    assert!(tier5.max_parallel > tier1.max_parallel);
    assert!(tier5.ramp_initial > tier1.ramp_initial);
    assert!(tier5.ramp_delay_ms < tier1.ramp_delay_ms);
}
