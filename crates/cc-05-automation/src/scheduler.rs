//! Per-pair tick tasks.

use crate::driver::{AutomationDriver, AutomationKey};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Tick interval for a rate, `1000 / rate` ms (at least 1 ms).
///
/// Returns `None` for a zero rate.
pub fn interval_for(units_per_second: u32) -> Option<Duration> {
    if units_per_second == 0 {
        return None;
    }
    let millis = (1_000 / u64::from(units_per_second)).max(1);
    Some(Duration::from_millis(millis))
}

/// Deadline after `previous`, measured from the previous deadline rather
/// than from `now`. Falls back to `now + interval` when more than one
/// interval behind.
pub fn next_deadline(previous: Instant, now: Instant, interval: Duration) -> Instant {
    let next = previous + interval;
    if now.saturating_duration_since(next) > interval {
        now + interval
    } else {
        next
    }
}

struct Shared {
    driver: Arc<dyn AutomationDriver>,
    paused: Mutex<HashSet<AutomationKey>>,
    enabled: AtomicBool,
    ticks: AtomicU64,
}

impl Shared {
    fn active(&self, key: AutomationKey) -> bool {
        self.enabled.load(Ordering::SeqCst) && !self.paused.lock().contains(&key)
    }
}

struct ScheduledTask {
    rate: u32,
    handle: JoinHandle<()>,
}

/// Owner of every automation task.
pub struct AutomationScheduler {
    shared: Arc<Shared>,
    tasks: Mutex<HashMap<AutomationKey, ScheduledTask>>,
}

impl AutomationScheduler {
    /// Scheduler driving `driver`, globally enabled, with no tasks yet.
    pub fn new(driver: Arc<dyn AutomationDriver>) -> Self {
        Self {
            shared: Arc::new(Shared {
                driver,
                paused: Mutex::new(HashSet::new()),
                enabled: AtomicBool::new(true),
                ticks: AtomicU64::new(0),
            }),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Re-read the rate of a pair and (re)start or stop its task.
    ///
    /// A running task whose rate is unchanged is left alone.
    pub fn refresh(&self, key: AutomationKey) {
        let rate = self.shared.driver.units_per_second(key);
        let mut tasks = self.tasks.lock();

        if let Some(task) = tasks.get(&key) {
            if task.rate == rate && !task.handle.is_finished() {
                return;
            }
        }
        if let Some(old) = tasks.remove(&key) {
            old.handle.abort();
        }

        let Some(interval) = interval_for(rate) else {
            debug!(key = %key, "[cc-05] Automation off");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "[cc-05] No async runtime; automation not started");
            return;
        };

        let handle = runtime.spawn(run(Arc::clone(&self.shared), key, interval));
        tasks.insert(key, ScheduledTask { rate, handle });
        info!(key = %key, rate, interval_ms = interval.as_millis() as u64, "[cc-05] Automation scheduled");
    }

    /// Refresh several pairs.
    pub fn refresh_all(&self, keys: impl IntoIterator<Item = AutomationKey>) {
        for key in keys {
            self.refresh(key);
        }
    }

    /// Stop ticking one pair; its task keeps its schedule.
    pub fn pause(&self, key: AutomationKey) {
        self.shared.paused.lock().insert(key);
    }

    /// Resume a paused pair.
    pub fn resume(&self, key: AutomationKey) {
        self.shared.paused.lock().remove(&key);
    }

    /// True when the pair is paused.
    pub fn is_paused(&self, key: AutomationKey) -> bool {
        self.shared.paused.lock().contains(&key)
    }

    /// Global switch for every pair.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Global switch state.
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// True when a task for the pair is alive.
    pub fn is_scheduled(&self, key: AutomationKey) -> bool {
        self.tasks
            .lock()
            .get(&key)
            .map_or(false, |task| !task.handle.is_finished())
    }

    /// Pairs with a live task, sorted.
    pub fn scheduled(&self) -> Vec<AutomationKey> {
        let mut keys: Vec<_> = self
            .tasks
            .lock()
            .iter()
            .filter(|(_, task)| !task.handle.is_finished())
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }

    /// Ticks performed by all tasks.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Abort every task. Pause state is kept.
    pub fn stop_all(&self) {
        let mut tasks = self.tasks.lock();
        for (_, task) in tasks.drain() {
            task.handle.abort();
        }
    }
}

impl Drop for AutomationScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run(shared: Arc<Shared>, key: AutomationKey, mut interval: Duration) {
    let mut deadline = Instant::now() + interval;
    loop {
        sleep_until(deadline).await;

        let Some(current) = interval_for(shared.driver.units_per_second(key)) else {
            debug!(key = %key, "[cc-05] Rate dropped to zero, task exiting");
            return;
        };
        interval = current;

        if shared.active(key) && shared.driver.ready(key) {
            shared.driver.tick(key);
            shared.ticks.fetch_add(1, Ordering::Relaxed);
        }

        deadline = next_deadline(deadline, Instant::now(), interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{StageKind, TierId};
    use std::sync::atomic::AtomicU32;

    #[derive(Default)]
    struct MockDriver {
        rate: AtomicU32,
        blocked: AtomicBool,
        ticks: Mutex<HashMap<AutomationKey, u32>>,
    }

    impl MockDriver {
        fn with_rate(rate: u32) -> Arc<Self> {
            let driver = Self::default();
            driver.rate.store(rate, Ordering::SeqCst);
            Arc::new(driver)
        }

        fn ticks(&self, key: AutomationKey) -> u32 {
            self.ticks.lock().get(&key).copied().unwrap_or(0)
        }
    }

    impl AutomationDriver for MockDriver {
        fn units_per_second(&self, _key: AutomationKey) -> u32 {
            self.rate.load(Ordering::SeqCst)
        }

        fn ready(&self, _key: AutomationKey) -> bool {
            !self.blocked.load(Ordering::SeqCst)
        }

        fn tick(&self, key: AutomationKey) {
            *self.ticks.lock().entry(key).or_insert(0) += 1;
        }
    }

    fn miner() -> AutomationKey {
        AutomationKey::new(TierId(0), StageKind::Mining)
    }

    fn sequencer() -> AutomationKey {
        AutomationKey::new(TierId(0), StageKind::Sequencing)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_interval_for() {
        assert_eq!(interval_for(0), None);
        assert_eq!(interval_for(1), Some(ms(1_000)));
        assert_eq!(interval_for(4), Some(ms(250)));
        assert_eq!(interval_for(3), Some(ms(333)));
        assert_eq!(interval_for(5_000), Some(ms(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_drift_and_resync() {
        let start = Instant::now();
        let interval = ms(250);

        // slightly late: stay on the original grid
        assert_eq!(next_deadline(start, start + ms(260), interval), start + ms(250));
        // one interval behind: still catch up on the grid
        assert_eq!(next_deadline(start, start + ms(500), interval), start + ms(250));
        // more than one interval behind: resync from now
        assert_eq!(next_deadline(start, start + ms(600), interval), start + ms(850));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_four_ticks_four_times_per_second() {
        let driver = MockDriver::with_rate(4);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.refresh(miner());

        tokio::time::sleep(ms(1_010)).await;
        assert_eq!(driver.ticks(miner()), 4);

        tokio::time::sleep(ms(1_000)).await;
        assert_eq!(driver.ticks(miner()), 8);
        assert_eq!(scheduler.ticks(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_pair_never_ticks() {
        let driver = MockDriver::with_rate(4);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.pause(miner());
        scheduler.refresh_all([miner(), sequencer()]);

        tokio::time::sleep(ms(1_010)).await;
        assert_eq!(driver.ticks(miner()), 0);
        assert_eq!(driver.ticks(sequencer()), 4);
        assert!(scheduler.is_paused(miner()));

        scheduler.resume(miner());
        tokio::time::sleep(ms(1_000)).await;
        assert_eq!(driver.ticks(miner()), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_rate_schedules_nothing() {
        let driver = MockDriver::with_rate(0);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.refresh(miner());

        assert!(!scheduler.is_scheduled(miner()));
        tokio::time::sleep(ms(5_000)).await;
        assert_eq!(driver.ticks(miner()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_picks_up_new_rate() {
        let driver = MockDriver::with_rate(1);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.refresh(miner());

        tokio::time::sleep(ms(1_010)).await;
        assert_eq!(driver.ticks(miner()), 1);

        driver.rate.store(4, Ordering::SeqCst);
        scheduler.refresh(miner());
        tokio::time::sleep(ms(1_020)).await;
        assert_eq!(driver.ticks(miner()), 5);

        driver.rate.store(0, Ordering::SeqCst);
        scheduler.refresh(miner());
        assert!(scheduler.scheduled().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_skips_ticks() {
        let driver = MockDriver::with_rate(4);
        driver.blocked.store(true, Ordering::SeqCst);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.refresh(miner());

        tokio::time::sleep(ms(1_010)).await;
        assert_eq!(driver.ticks(miner()), 0);
        assert!(scheduler.is_scheduled(miner()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_disable_and_stop() {
        let driver = MockDriver::with_rate(4);
        let scheduler = AutomationScheduler::new(driver.clone());
        scheduler.refresh(miner());
        scheduler.set_enabled(false);

        tokio::time::sleep(ms(1_010)).await;
        assert_eq!(driver.ticks(miner()), 0);
        assert!(!scheduler.is_enabled());

        scheduler.set_enabled(true);
        scheduler.stop_all();
        tokio::time::sleep(ms(1_000)).await;
        assert_eq!(driver.ticks(miner()), 0);
        assert!(scheduler.scheduled().is_empty());
    }

    #[test]
    fn test_refresh_without_runtime_is_noop() {
        let scheduler = AutomationScheduler::new(MockDriver::with_rate(4));
        scheduler.refresh(miner());
        assert!(!scheduler.is_scheduled(miner()));
    }
}
