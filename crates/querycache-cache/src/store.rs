//! The cache store: concurrent get/store/invalidate plus triggered eviction (§3, §4.1).

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, CacheEvent, EntrySnapshot, EvictionStage};
use crate::error::CacheError;
use crate::eviction::{emergency_evict, expiry_sweep, intelligent_evict};
use crate::fingerprint::{Fingerprint, TokenEstimator};
use crate::metrics::{cost_savings, CacheCounters, CacheMetricsSnapshot};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A concurrent, TTL-and-size-bounded content cache.
///
/// Reads (`get`) never block on eviction. Writes that push the store over
/// `pressure_threshold` trigger eviction inline, serialized by
/// `eviction_lock` so concurrent stores don't each run a redundant sweep.
pub struct CacheStore {
    entries: DashMap<Fingerprint, CacheEntry>,
    total_size_bytes: AtomicUsize,
    config: CacheConfig,
    counters: CacheCounters,
    eviction_lock: Mutex<()>,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            total_size_bytes: AtomicUsize::new(0),
            config,
            counters: CacheCounters::default(),
            eviction_lock: Mutex::new(()),
        }
    }

    fn emit(&self, event: CacheEvent) {
        self.config.event_listeners.emit(&event);
    }

    fn namespaced(&self, fingerprint: &Fingerprint) -> Fingerprint {
        Fingerprint::from_raw(format!("{}:{}", self.config.version, fingerprint.as_str()))
    }

    /// Looks up `fingerprint`, touching access tracking on a hit.
    ///
    /// Lazily enforces TTL (§3, §4.1): an entry older than `config.ttl` is
    /// removed and reported as a miss rather than returned as a hit.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<EntrySnapshot> {
        let key = self.namespaced(fingerprint);
        let now = Instant::now();
        let start = Instant::now();

        let expired = self
            .entries
            .get(&key)
            .map(|entry| entry.age(now) > self.config.ttl)
            .unwrap_or(false);

        if expired {
            if let Some((_, entry)) = self.entries.remove(&key) {
                self.record_removed(EvictionStage::ExpirySweep, &[(key.clone(), entry.size_bytes)], now);
            }
            self.counters.record_miss(start.elapsed());
            self.emit(CacheEvent::Miss {
                name: self.config.name.clone(),
                timestamp: now,
                fingerprint: key,
            });
            return None;
        }

        let found = self.entries.get(&key).map(|entry| {
            entry.touch(now);
            entry.snapshot()
        });

        match &found {
            Some(_) => {
                self.counters.record_hit(start.elapsed());
                self.emit(CacheEvent::Hit {
                    name: self.config.name.clone(),
                    timestamp: now,
                    fingerprint: key,
                });
            }
            None => {
                self.counters.record_miss(start.elapsed());
                self.emit(CacheEvent::Miss {
                    name: self.config.name.clone(),
                    timestamp: now,
                    fingerprint: key,
                });
            }
        }
        found
    }

    /// Stores `content` under `fingerprint`, running eviction first if needed.
    ///
    /// `token_count` is computed from `content` itself via the
    /// [`TokenEstimator`], not trusted from the caller. Rejects content
    /// below `min_tokens`. `version` must match the store's configured
    /// version or the call fails with `VersionMismatch` — this is a
    /// caller-visible guard against mixing incompatible cache generations,
    /// distinct from the internal namespacing `get`/`store` already apply.
    pub fn store(
        &self,
        fingerprint: Fingerprint,
        content: Arc<[u8]>,
        version: &str,
    ) -> Result<EntrySnapshot, CacheError> {
        let token_count = TokenEstimator::new().estimate(&content);
        if token_count < self.config.min_tokens {
            return Err(CacheError::ContentTooSmall {
                token_count,
                min_tokens: self.config.min_tokens,
            });
        }
        if version != self.config.version {
            return Err(CacheError::VersionMismatch {
                expected: self.config.version.clone(),
                actual: version.to_string(),
            });
        }

        let key = self.namespaced(&fingerprint);
        let now = Instant::now();
        let size_bytes = content.len();

        self.ensure_capacity(size_bytes, now)?;

        let entry = CacheEntry::new(key.clone(), content, token_count, version.to_string(), now);
        let snapshot = entry.snapshot();

        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.total_size_bytes.fetch_sub(previous.size_bytes, Ordering::AcqRel);
        }
        self.total_size_bytes.fetch_add(size_bytes, Ordering::AcqRel);
        self.counters.record_store();

        self.emit(CacheEvent::Store {
            name: self.config.name.clone(),
            timestamp: now,
            fingerprint: key,
            size_bytes,
        });

        Ok(snapshot)
    }

    /// Runs eviction stages, in order, until there is room for `incoming_bytes`
    /// under `pressure_threshold`, or until no stage can free further space.
    fn ensure_capacity(&self, incoming_bytes: usize, now: Instant) -> Result<(), CacheError> {
        let pressure_limit = (self.config.max_size_bytes as f64 * self.config.pressure_threshold) as usize;
        let projected = self.total_size_bytes.load(Ordering::Acquire) + incoming_bytes;
        if projected <= pressure_limit {
            return Ok(());
        }

        let _guard = self.eviction_lock.lock();

        let expired = expiry_sweep(&self.entries, self.config.ttl, now);
        self.record_removed(EvictionStage::ExpirySweep, &expired, now);

        let mut current = self.total_size_bytes.load(Ordering::Acquire);
        if current + incoming_bytes <= pressure_limit {
            return Ok(());
        }

        let bytes_to_free = (current + incoming_bytes).saturating_sub(pressure_limit);
        let evicted = intelligent_evict(&self.entries, self.config.eviction_weights, self.config.ttl, now, bytes_to_free);
        self.record_removed(EvictionStage::Intelligent, &evicted, now);

        current = self.total_size_bytes.load(Ordering::Acquire);
        if current + incoming_bytes <= pressure_limit {
            return Ok(());
        }

        let emergency_target = (self.config.max_size_bytes as f64 * self.config.emergency_target) as usize;
        let removed = emergency_evict(&self.entries, now, current + incoming_bytes, emergency_target);
        self.record_removed(EvictionStage::Emergency, &removed, now);

        current = self.total_size_bytes.load(Ordering::Acquire);
        if current + incoming_bytes > self.config.max_size_bytes {
            return Err(CacheError::Full { required_bytes: incoming_bytes });
        }
        Ok(())
    }

    fn record_removed(&self, stage: EvictionStage, removed: &[(Fingerprint, usize)], now: Instant) {
        if removed.is_empty() {
            return;
        }
        let freed: usize = removed.iter().map(|(_, size)| size).sum();
        self.total_size_bytes.fetch_sub(freed, Ordering::AcqRel);

        if stage == EvictionStage::ExpirySweep {
            self.counters.record_expiration(removed.len() as u64);
        } else {
            self.counters.record_eviction(stage, removed.len() as u64);
        }

        for (fingerprint, _) in removed {
            let event = if stage == EvictionStage::ExpirySweep {
                CacheEvent::Expiration {
                    name: self.config.name.clone(),
                    timestamp: now,
                    fingerprint: fingerprint.clone(),
                }
            } else {
                CacheEvent::Eviction {
                    name: self.config.name.clone(),
                    timestamp: now,
                    fingerprint: fingerprint.clone(),
                    stage,
                }
            };
            self.emit(event);
        }
    }

    /// Removes entries whose fingerprint starts with `prefix`, or everything
    /// if `prefix` is `None`. Returns the number of entries removed.
    pub fn invalidate(&self, prefix: Option<&str>) -> usize {
        let now = Instant::now();
        let matching: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|entry| match prefix {
                Some(p) => entry.key().as_str().starts_with(p),
                None => true,
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = Vec::with_capacity(matching.len());
        for fingerprint in matching {
            if let Some((_, entry)) = self.entries.remove(&fingerprint) {
                removed.push((fingerprint, entry.size_bytes));
            }
        }
        self.record_removed(EvictionStage::Explicit, &removed, now);
        removed.len()
    }

    /// A point-in-time metrics snapshot, including the informational
    /// cost-savings estimate from §4.1.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let miss_tokens_total = self.counters.miss_tokens_total.load(Ordering::Relaxed);
        let avg_tokens_miss = if misses == 0 {
            0.0
        } else {
            miss_tokens_total as f64 / misses as f64
        };

        CacheMetricsSnapshot {
            hits,
            misses,
            stores: self.counters.stores.load(Ordering::Relaxed),
            evictions_expiry: self.counters.evictions_expiry.load(Ordering::Relaxed),
            evictions_intelligent: self.counters.evictions_intelligent.load(Ordering::Relaxed),
            evictions_emergency: self.counters.evictions_emergency.load(Ordering::Relaxed),
            evictions_explicit: self.counters.evictions_explicit.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            current_entries: self.entries.len(),
            total_size_bytes: self.total_size_bytes.load(Ordering::Acquire),
            max_size_bytes: self.config.max_size_bytes,
            avg_hit_latency: avg_duration(self.counters.hit_latency_nanos_total.load(Ordering::Relaxed), hits),
            avg_miss_latency: avg_duration(self.counters.miss_latency_nanos_total.load(Ordering::Relaxed), misses),
            estimated_cost_savings: cost_savings(
                hits,
                misses,
                self.config.baseline_tokens,
                self.config.token_cost,
                avg_tokens_miss,
            ),
        }
    }

    /// Records the token cost of a miss, feeding the cost-savings estimate.
    /// Called by callers that compute a value after a miss, before storing it.
    pub fn record_miss_tokens(&self, tokens: usize) {
        self.counters.record_miss_tokens(tokens as u64);
    }

    /// The minimum token count a new entry must carry to be cached, used by
    /// callers (e.g. the warmer) that pad content before `store`-ing it.
    pub fn min_tokens(&self) -> usize {
        self.config.min_tokens
    }

    /// The namespace prefix `store`/`get` require a matching `version` for.
    pub fn version(&self) -> &str {
        &self.config.version
    }
}

fn avg_duration(nanos_total: u64, count: u64) -> std::time::Duration {
    if count == 0 {
        std::time::Duration::ZERO
    } else {
        std::time::Duration::from_nanos(nanos_total / count)
    }
}
