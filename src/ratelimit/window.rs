//! Keyed sliding-window counter.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::policy::WindowPolicy;

/// Result of sweeping one counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Keys that still have live instants after the sweep
    pub retained: usize,
    /// Keys removed because every instant had expired
    pub evicted: usize,
}

/// A sliding-window request counter keyed by an arbitrary string.
///
/// Each key owns the instants of its admitted requests. Admission prunes the
/// record to the trailing window, compares the live count with the limit and
/// records the new instant while holding a single lock, so concurrent callers
/// can never admit past the limit.
pub struct SlidingWindowCounter {
    policy: WindowPolicy,
    records: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowCounter {
    /// Create an empty counter for the given policy.
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            policy,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// The policy this counter enforces.
    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Decide admission for `key` at the current instant.
    pub fn try_admit(&self, key: &str) -> bool {
        self.try_admit_at(key, Instant::now())
    }

    /// Decide admission for `key` at `now`, recording the request if admitted.
    ///
    /// Rejected requests are not recorded; the pruned record is kept either way.
    pub fn try_admit_at(&self, key: &str, now: Instant) -> bool {
        let window = self.policy.window();
        let limit = self.policy.limit();
        let mut records = self.records.lock();

        match records.get_mut(key) {
            Some(record) => {
                prune(record, now, window);
                if record.len() >= limit {
                    if record.is_empty() {
                        records.remove(key);
                    }
                    return false;
                }
                record.push_back(now);
                true
            }
            None => {
                if limit == 0 {
                    return false;
                }
                records.insert(key.to_owned(), VecDeque::from([now]));
                true
            }
        }
    }

    /// Number of admissions still available to `key` at `now`.
    pub fn remaining_at(&self, key: &str, now: Instant) -> usize {
        let window = self.policy.window();
        let records = self.records.lock();
        let live = records
            .get(key)
            .map(|record| record.iter().filter(|t| is_live(**t, now, window)).count())
            .unwrap_or(0);
        self.policy.limit().saturating_sub(live)
    }

    /// Prune every record to the live window as of `now` and drop empty keys.
    pub fn sweep_at(&self, now: Instant) -> SweepStats {
        let window = self.policy.window();
        let mut records = self.records.lock();
        let before = records.len();

        records.retain(|_, record| {
            prune(record, now, window);
            !record.is_empty()
        });

        SweepStats {
            retained: records.len(),
            evicted: before - records.len(),
        }
    }

    /// Sweep at the current instant.
    pub fn sweep(&self) -> SweepStats {
        self.sweep_at(Instant::now())
    }

    /// Raw length of the stored record for `key`, without pruning.
    ///
    /// Returns `None` when the key has no entry at all.
    pub fn recorded(&self, key: &str) -> Option<usize> {
        self.records.lock().get(key).map(VecDeque::len)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.records.lock().len()
    }

    /// Drop all tracking state.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

// Instants later than `now` (a caller that read the clock before a racing
// caller appended) count as live.
fn is_live(instant: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(instant) < window
}

fn prune(record: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    record.retain(|t| is_live(*t, now, window));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::policy::TimeUnit;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    fn counter(limit: usize, unit: TimeUnit) -> SlidingWindowCounter {
        SlidingWindowCounter::new(WindowPolicy::new(limit, unit))
    }

    #[test]
    fn test_admits_up_to_limit() {
        let counter = counter(5, TimeUnit::Minute);
        let now = Instant::now();

        for i in 0..5 {
            assert!(counter.try_admit_at("a", now), "request {} should be admitted", i + 1);
        }
        assert_eq!(counter.recorded("a"), Some(5));
        assert_eq!(counter.remaining_at("a", now), 0);
    }

    #[test]
    fn test_rejects_past_limit_without_recording() {
        let counter = counter(3, TimeUnit::Minute);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(counter.try_admit_at("a", now));
        }
        assert!(!counter.try_admit_at("a", now));
        assert!(!counter.try_admit_at("a", now));
        assert_eq!(counter.recorded("a"), Some(3));
    }

    #[test]
    fn test_window_rolls_over() {
        let counter = counter(2, TimeUnit::Minute);
        let start = Instant::now();

        assert!(counter.try_admit_at("a", start));
        assert!(counter.try_admit_at("a", start));
        assert!(!counter.try_admit_at("a", start + Duration::from_secs(59)));

        // Exactly one window later the old instants are expired.
        assert!(counter.try_admit_at("a", start + Duration::from_secs(60)));
        assert_eq!(counter.recorded("a"), Some(1));
    }

    #[test]
    fn test_partial_expiry_frees_slots() {
        let counter = counter(2, TimeUnit::Minute);
        let start = Instant::now();

        assert!(counter.try_admit_at("a", start));
        assert!(counter.try_admit_at("a", start + Duration::from_secs(30)));
        assert!(!counter.try_admit_at("a", start + Duration::from_secs(45)));

        // Only the first instant has left the window.
        let later = start + Duration::from_secs(61);
        assert_eq!(counter.remaining_at("a", later), 1);
        assert!(counter.try_admit_at("a", later));
        assert!(!counter.try_admit_at("a", later));
    }

    #[test]
    fn test_rejection_persists_pruned_record() {
        let counter = counter(1, TimeUnit::Second);
        let start = Instant::now();

        assert!(counter.try_admit_at("a", start));
        assert!(!counter.try_admit_at("a", start));
        assert!(counter.try_admit_at("a", start + Duration::from_secs(2)));
        assert_eq!(counter.recorded("a"), Some(1));
    }

    #[test]
    fn test_zero_limit_never_admits_or_tracks() {
        let counter = counter(0, TimeUnit::Minute);

        assert!(!counter.try_admit("a"));
        assert_eq!(counter.recorded("a"), None);
        assert_eq!(counter.tracked_keys(), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let counter = counter(2, TimeUnit::Minute);
        let now = Instant::now();

        assert!(counter.try_admit_at("1.2.3.4", now));
        assert!(counter.try_admit_at("1.2.3.4", now));
        assert!(!counter.try_admit_at("1.2.3.4", now));

        assert!(counter.try_admit_at("5.6.7.8", now));
        assert!(counter.try_admit_at("5.6.7.8", now));
        assert_eq!(counter.tracked_keys(), 2);
    }

    #[test]
    fn test_sweep_evicts_expired_keys() {
        let counter = counter(5, TimeUnit::Minute);
        let start = Instant::now();

        counter.try_admit_at("stale", start);
        counter.try_admit_at("fresh", start + Duration::from_secs(50));

        let stats = counter.sweep_at(start + Duration::from_secs(70));
        assert_eq!(stats, SweepStats { retained: 1, evicted: 1 });
        assert_eq!(counter.recorded("stale"), None);
        assert_eq!(counter.recorded("fresh"), Some(1));
    }

    #[test]
    fn test_sweep_prunes_live_keys() {
        let counter = counter(5, TimeUnit::Minute);
        let start = Instant::now();

        counter.try_admit_at("a", start);
        counter.try_admit_at("a", start + Duration::from_secs(30));
        counter.try_admit_at("a", start + Duration::from_secs(40));

        counter.sweep_at(start + Duration::from_secs(65));
        assert_eq!(counter.recorded("a"), Some(2));
    }

    #[test]
    fn test_sweep_does_not_change_next_decision() {
        let swept = counter(3, TimeUnit::Minute);
        let unswept = counter(3, TimeUnit::Minute);
        let start = Instant::now();

        for offset in [0, 10, 20] {
            let at = start + Duration::from_secs(offset);
            assert_eq!(swept.try_admit_at("a", at), unswept.try_admit_at("a", at));
            swept.sweep_at(at);
        }

        for offset in [25, 59, 61, 75] {
            let at = start + Duration::from_secs(offset);
            swept.sweep_at(at);
            assert_eq!(swept.try_admit_at("a", at), unswept.try_admit_at("a", at));
        }
    }

    #[test]
    fn test_clear() {
        let counter = counter(5, TimeUnit::Minute);
        counter.try_admit("a");
        counter.try_admit("b");
        assert_eq!(counter.tracked_keys(), 2);

        counter.clear();
        assert_eq!(counter.tracked_keys(), 0);
    }

    #[test]
    fn test_concurrent_admissions_respect_limit() {
        const LIMIT: usize = 50;

        for extra in [0, 1, 7, 50] {
            let counter = counter(LIMIT, TimeUnit::Hour);
            let callers = LIMIT + extra;
            let barrier = Barrier::new(callers);
            let admitted = AtomicUsize::new(0);
            let now = Instant::now();

            std::thread::scope(|scope| {
                for _ in 0..callers {
                    scope.spawn(|| {
                        barrier.wait();
                        if counter.try_admit_at("hot", now) {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            });

            assert_eq!(admitted.load(Ordering::SeqCst), LIMIT, "extra = {}", extra);
            assert_eq!(counter.recorded("hot"), Some(LIMIT));
        }
    }

    #[test]
    fn test_concurrent_admissions_with_sweeps() {
        const LIMIT: usize = 20;
        let counter = Arc::new(counter(LIMIT, TimeUnit::Hour));
        let callers = 64;
        let barrier = Arc::new(Barrier::new(callers + 1));
        let now = Instant::now();

        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let counter = counter.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    counter.try_admit_at("hot", now)
                })
            })
            .collect();

        let sweeper = {
            let counter = counter.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                for _ in 0..100 {
                    counter.sweep_at(now);
                }
            })
        };

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        sweeper.join().unwrap();

        assert_eq!(admitted, LIMIT);
    }

    #[test]
    fn test_randomized_against_reference_model() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let policy = WindowPolicy::new(4, TimeUnit::Second);
        let window = policy.window();
        let counter = SlidingWindowCounter::new(policy);
        let keys = ["a", "b", "c"];
        let start = Instant::now();
        let mut model: HashMap<&str, Vec<Instant>> = HashMap::new();
        let mut elapsed = Duration::ZERO;

        for _ in 0..2_000 {
            elapsed += Duration::from_millis(rng.gen_range(0..300));
            let now = start + elapsed;

            if rng.gen_bool(0.05) {
                counter.sweep_at(now);
                continue;
            }

            let key = keys[rng.gen_range(0..keys.len())];
            let history = model.entry(key).or_default();
            history.retain(|t| now.duration_since(*t) < window);
            let expected = history.len() < 4;
            if expected {
                history.push(now);
            }

            assert_eq!(counter.try_admit_at(key, now), expected);
        }
    }
}
