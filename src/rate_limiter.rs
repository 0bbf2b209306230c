use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

const LIMITER_SHARDS: usize = 64;

/// Monotonic time source consulted on every limiter call.
pub trait MonotonicClock {
    /// Returns the current monotonic timestamp in nanoseconds.
    fn now_ns(&mut self) -> u128;
}

/// System clock implementation backed by `Instant`.
#[derive(Clone)]
pub struct SystemMonotonicClock {
    start: Instant,
}

impl Default for SystemMonotonicClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl SystemMonotonicClock {
    /// Creates the system clock wrapper.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn now_ns(&mut self) -> u128 {
        self.start.elapsed().as_nanos()
    }
}

pub type DynClock = Box<dyn MonotonicClock + Send>;

/// Counter snapshot describing cumulative limiter activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimiterStats {
    /// Keys currently holding an open or expired-but-unswept window.
    pub tracked_keys: usize,
    /// Calls that opened a window and passed.
    pub passed_total: u64,
    /// Calls denied inside an open window.
    pub denied_total: u64,
    /// Entries removed by sweeps or capacity eviction.
    pub evicted_total: u64,
}

/// Process-wide fixed-window rate limiter keyed by (bucket, discriminator).
///
/// Each key's window is anchored at that key's first passing occurrence, not
/// wall-clock aligned. Within an open window the first call passes and every
/// later call for the same key denies; a call arriving after expiry opens a
/// fresh window and passes again. Distinct keys never interact.
///
/// Keys grow without bound by default. Callers that need bounded state either
/// run [`RateLimiter::sweep_expired`] periodically or set a capacity with
/// [`RateLimiter::with_max_keys`], which evicts the oldest windows first.
pub struct RateLimiter {
    shards: Vec<Mutex<LimiterShard>>,
    clock: Mutex<DynClock>,
    passed_total: AtomicU64,
    denied_total: AtomicU64,
    evicted_total: AtomicU64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Creates an unbounded limiter driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemMonotonicClock::new()))
    }

    /// Creates an unbounded limiter driven by the provided clock (tests, tooling).
    pub fn with_clock(clock: DynClock) -> Self {
        Self {
            shards: (0..LIMITER_SHARDS)
                .map(|_| Mutex::new(LimiterShard::default()))
                .collect(),
            clock: Mutex::new(clock),
            passed_total: AtomicU64::new(0),
            denied_total: AtomicU64::new(0),
            evicted_total: AtomicU64::new(0),
        }
    }

    /// Bounds tracked keys to at most `max_keys`, evicting the oldest windows
    /// once the bound is exceeded.
    ///
    /// Bounds below the shard count shrink the shard set so the limit holds
    /// exactly. Any windows tracked before this call are discarded; a zero
    /// bound is treated as one.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        let max_keys = max_keys.max(1);
        let shard_count = max_keys.min(LIMITER_SHARDS);
        let base = max_keys / shard_count;
        let extra = max_keys % shard_count;
        self.shards = (0..shard_count)
            .map(|index| Mutex::new(LimiterShard::bounded(base + usize::from(index < extra))))
            .collect();
        self
    }

    /// Marks one occurrence of (bucket, discriminator) and reports the verdict.
    ///
    /// Returns `true` when this occurrence opens a window (first in window),
    /// `false` while the key's current window is still open.
    pub fn mark_and_test(
        &self,
        bucket_key: &str,
        discriminator_key: &str,
        window_seconds: u64,
    ) -> bool {
        let now_ms = self.now_ms();
        let key = combined_key(bucket_key, discriminator_key);
        let window_ms = window_seconds.saturating_mul(1_000);
        let shard = &self.shards[shard_index(&key, self.shards.len())];
        let mut guard = shard.lock().unwrap();
        let passed = guard.mark_and_test(key, window_ms, now_ms);
        if passed {
            let evicted = guard.enforce_capacity();
            drop(guard);
            self.passed_total.fetch_add(1, Ordering::Relaxed);
            self.evicted_total
                .fetch_add(evicted as u64, Ordering::Relaxed);
        } else {
            drop(guard);
            self.denied_total.fetch_add(1, Ordering::Relaxed);
        }
        passed
    }

    /// Removes every key whose window has expired; returns the removal count.
    pub fn sweep_expired(&self) -> usize {
        let now_ms = self.now_ms();
        let mut removed = 0;
        for shard in &self.shards {
            let mut guard = shard.lock().unwrap();
            removed += guard.sweep_expired(now_ms);
        }
        self.evicted_total
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of keys currently tracked across all shards.
    pub fn tracked_keys(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap().windows.len())
            .sum()
    }

    /// Returns cumulative limiter counters.
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tracked_keys: self.tracked_keys(),
            passed_total: self.passed_total.load(Ordering::Relaxed),
            denied_total: self.denied_total.load(Ordering::Relaxed),
            evicted_total: self.evicted_total.load(Ordering::Relaxed),
        }
    }

    fn now_ms(&self) -> u64 {
        let mut clock = self.clock.lock().unwrap();
        (clock.now_ns() / 1_000_000) as u64
    }
}

struct LimiterShard {
    windows: HashMap<String, WindowEntry>,
    capacity: usize,
}

impl Default for LimiterShard {
    fn default() -> Self {
        Self::bounded(usize::MAX)
    }
}

impl LimiterShard {
    fn bounded(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity,
        }
    }

    fn mark_and_test(&mut self, key: String, window_ms: u64, now_ms: u64) -> bool {
        if let Some(entry) = self.windows.get_mut(&key) {
            if now_ms.saturating_sub(entry.opened_tick_ms) > window_ms {
                entry.opened_tick_ms = now_ms;
                entry.window_ms = window_ms;
                return true;
            }
            entry.window_ms = window_ms;
            return false;
        }
        self.windows.insert(
            key,
            WindowEntry {
                opened_tick_ms: now_ms,
                window_ms,
            },
        );
        true
    }

    fn sweep_expired(&mut self, now_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, entry| now_ms.saturating_sub(entry.opened_tick_ms) <= entry.window_ms);
        before - self.windows.len()
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut removed = 0;
        while self.windows.len() > self.capacity {
            let oldest = self
                .windows
                .iter()
                .min_by_key(|(_, entry)| entry.opened_tick_ms)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.windows.remove(&key);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    opened_tick_ms: u64,
    window_ms: u64,
}

fn combined_key(bucket_key: &str, discriminator_key: &str) -> String {
    format!("{bucket_key}|{discriminator_key}")
}

fn shard_index(key: &str, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % shard_count
}
