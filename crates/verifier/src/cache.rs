use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use citeguard_common::config::CacheConfig;
use citeguard_common::types::{AuthorityRecord, VerificationResult};

/// In-memory TTL cache shared by concurrent citation verifications.
///
/// Two logical namespaces: per-citation verification results (keyed by
/// citation fingerprint) and per-domain authority records (keyed by
/// domain). Each namespace is bounded by `max_size`; when full, the oldest
/// inserted entry is evicted. Expired entries behave as misses and are
/// removed on read.
///
/// Uses std::sync::Mutex because the lock is never held across await
/// points.
pub struct VerificationCache {
    enabled: bool,
    ttl: Duration,
    max_size: usize,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    results: HashMap<String, CacheEntry<VerificationResult>>,
    domains: HashMap<String, CacheEntry<AuthorityRecord>>,
    /// Monotonic insertion counter driving oldest-first eviction.
    insert_seq: u64,
}

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    seq: u64,
    hits: u64,
}

/// Point-in-time cache statistics.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub enabled: bool,
    pub total_entries: usize,
    pub max_size: usize,
    pub ttl_minutes: u64,
    pub expired_entries: usize,
    pub hit_counts: HitCounts,
    pub by_type: EntryCounts,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitCounts {
    pub total: u64,
    pub average: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCounts {
    pub results: usize,
    pub domains: usize,
}

impl VerificationCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            ttl: Duration::from_secs(config.ttl_minutes * 60),
            max_size: config.max_size,
            inner: Mutex::new(CacheInner {
                results: HashMap::new(),
                domains: HashMap::new(),
                insert_seq: 0,
            }),
        }
    }

    /// Get a cached verification result. Disabled cache always misses.
    pub fn get_result(&self, fingerprint: &str) -> Option<VerificationResult> {
        if !self.enabled {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        Self::get_entry(&mut inner.results, fingerprint, self.ttl, "result")
    }

    pub fn set_result(&self, fingerprint: String, result: VerificationResult) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.insert_seq += 1;
        let seq = inner.insert_seq;
        Self::insert_entry(&mut inner.results, fingerprint, result, seq, self.max_size);
    }

    /// Get a cached domain authority record.
    pub fn get_domain(&self, domain: &str) -> Option<AuthorityRecord> {
        if !self.enabled {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        Self::get_entry(&mut inner.domains, domain, self.ttl, "domain")
    }

    pub fn set_domain(&self, domain: String, record: AuthorityRecord) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.insert_seq += 1;
        let seq = inner.insert_seq;
        Self::insert_entry(&mut inner.domains, domain, record, seq, self.max_size);
    }

    /// Snapshot current statistics. Expired entries are counted, not
    /// removed; they are evicted lazily on read.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();

        let mut expired = 0usize;
        let mut hit_total = 0u64;
        for entry in inner.results.values() {
            if entry.inserted_at.elapsed() >= self.ttl {
                expired += 1;
            }
            hit_total += entry.hits;
        }
        for entry in inner.domains.values() {
            if entry.inserted_at.elapsed() >= self.ttl {
                expired += 1;
            }
            hit_total += entry.hits;
        }

        let total = inner.results.len() + inner.domains.len();
        CacheStats {
            enabled: self.enabled,
            total_entries: total,
            max_size: self.max_size,
            ttl_minutes: self.ttl.as_secs() / 60,
            expired_entries: expired,
            hit_counts: HitCounts {
                total: hit_total,
                average: if total == 0 {
                    0.0
                } else {
                    hit_total as f64 / total as f64
                },
            },
            by_type: EntryCounts {
                results: inner.results.len(),
                domains: inner.domains.len(),
            },
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.results.clear();
        inner.domains.clear();
        tracing::debug!("Verification cache cleared");
    }

    fn get_entry<T: Clone>(
        map: &mut HashMap<String, CacheEntry<T>>,
        key: &str,
        ttl: Duration,
        kind: &'static str,
    ) -> Option<T> {
        if let Some(entry) = map.get_mut(key) {
            if entry.inserted_at.elapsed() < ttl {
                entry.hits += 1;
                metrics::counter!("verify.cache.hit", "kind" => kind).increment(1);
                return Some(entry.value.clone());
            }
            map.remove(key);
        }
        metrics::counter!("verify.cache.miss", "kind" => kind).increment(1);
        None
    }

    fn insert_entry<T>(
        map: &mut HashMap<String, CacheEntry<T>>,
        key: String,
        value: T,
        seq: u64,
        max_size: usize,
    ) {
        if max_size == 0 {
            return;
        }
        // Evict the oldest insertion when full (unless overwriting).
        if map.len() >= max_size && !map.contains_key(&key) {
            if let Some(oldest) = map
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
                metrics::counter!("verify.cache.evictions").increment(1);
            }
        }

        map.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                seq,
                hits: 0,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use citeguard_common::types::{AuthorityMetadata, AuthorityRecord};

    fn record(domain: &str) -> AuthorityRecord {
        AuthorityRecord {
            domain: domain.to_string(),
            authority_score: 50.0,
            trust_score: 50.0,
            spam_score: 5.0,
            backlinks: 100,
            referring_domains: 10,
            is_government: false,
            is_educational: false,
            is_non_profit: false,
            is_news: false,
            metadata: AuthorityMetadata {
                source: "test".to_string(),
                checked_at: Utc::now(),
            },
        }
    }

    fn cache_config(enabled: bool, ttl_minutes: u64, max_size: usize) -> CacheConfig {
        CacheConfig {
            enabled,
            ttl_minutes,
            max_size,
        }
    }

    #[test]
    fn test_cache_hit_miss() {
        let cache = VerificationCache::new(&cache_config(true, 60, 10));
        assert!(cache.get_domain("example.com").is_none());

        cache.set_domain("example.com".into(), record("example.com"));
        let hit = cache.get_domain("example.com");
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().domain, "example.com");
    }

    #[test]
    fn test_cache_expiry() {
        let cache = VerificationCache::new(&cache_config(true, 0, 10));
        cache.set_domain("example.com".into(), record("example.com"));
        // ttl_minutes = 0 means entries are born expired.
        assert!(cache.get_domain("example.com").is_none());
        // The expired entry was removed on read.
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_disabled_cache_always_misses() {
        let cache = VerificationCache::new(&cache_config(false, 60, 10));
        cache.set_domain("example.com".into(), record("example.com"));
        assert!(cache.get_domain("example.com").is_none());
        assert!(!cache.stats().enabled);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_oldest_entry_evicted_when_full() {
        let cache = VerificationCache::new(&cache_config(true, 60, 2));
        cache.set_domain("first.com".into(), record("first.com"));
        cache.set_domain("second.com".into(), record("second.com"));
        cache.set_domain("third.com".into(), record("third.com"));

        assert!(cache.get_domain("first.com").is_none());
        assert!(cache.get_domain("second.com").is_some());
        assert!(cache.get_domain("third.com").is_some());
    }

    #[test]
    fn test_stats_track_hits_and_namespaces() {
        let cache = VerificationCache::new(&cache_config(true, 60, 10));
        cache.set_domain("example.com".into(), record("example.com"));
        cache.get_domain("example.com");
        cache.get_domain("example.com");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.by_type.domains, 1);
        assert_eq!(stats.by_type.results, 0);
        assert_eq!(stats.hit_counts.total, 2);
        assert!((stats.hit_counts.average - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_empties_both_namespaces() {
        let cache = VerificationCache::new(&cache_config(true, 60, 10));
        cache.set_domain("example.com".into(), record("example.com"));
        cache.clear();
        assert_eq!(cache.stats().total_entries, 0);
    }
}
