//! Result cache (§6 "Result cache (consumed)"): an advisory, TTL-bounded
//! cache keyed by the MD5 of normalized query text. A miss or a
//! deserialization failure always falls through to execution — the cache
//! never turns into a source of truth.

use std::time::Duration;

use moka::sync::Cache;

/// Trim, lowercase, and collapse internal whitespace runs — matching
/// `original_source/cache/results_cache.py`'s `normalize_query` exactly, so
/// that two queries differing only in casing or spacing share a cache key.
pub fn normalize_query(sql_text: &str) -> String {
    sql_text.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// MD5 hex digest of the normalized query text.
pub fn cache_key(sql_text: &str) -> String {
    format!("{:x}", md5::compute(normalize_query(sql_text)))
}

/// In-process advisory cache of serialized query results.
///
/// Backed by `moka::sync::Cache`, since the engine is explicitly
/// single-process and single-query-at-a-time (§5) — there is no case for a
/// networked cache like the teacher's Redis-backed original.
pub struct ResultCache {
    inner: Cache<String, Vec<u8>>,
}

impl ResultCache {
    /// `expiry_secs` is the process-wide `CACHE_EXPIRY_TIME`; every entry
    /// shares this time-to-live, mirroring the single global
    /// `CACHE_EXPIRY_TIME` setting the source reads from `session.py`.
    pub fn new(expiry_secs: u64) -> Self {
        Self {
            inner: Cache::builder().time_to_live(Duration::from_secs(expiry_secs)).build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    /// `ttl_seconds` is accepted for interface fidelity with §6's
    /// `put(key, bytes, ttl_seconds)`; this cache's entries all share the
    /// time-to-live fixed at construction, so a `ttl_seconds` that disagrees
    /// with it is not separately honored.
    pub fn put(&self, key: String, bytes: Vec<u8>, _ttl_seconds: u64) {
        self.inner.insert(key, bytes);
    }

    pub fn flush_all(&self) {
        self.inner.invalidate_all();
    }

    pub fn delete(&self, key: &str) {
        self.inner.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_query("  SELECT   name FROM   emp  "),
            "select name from emp"
        );
    }

    #[test]
    fn cache_key_is_stable_under_whitespace_and_case_changes() {
        let a = cache_key("SELECT name FROM emp");
        let b = cache_key("  select   NAME  from  EMP ");
        assert_eq!(a, b);
    }

    #[test]
    fn get_put_delete_round_trip() {
        let cache = ResultCache::new(3600);
        let key = cache_key("SELECT * FROM emp");
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), b"payload".to_vec(), 3600);
        assert_eq!(cache.get(&key), Some(b"payload".to_vec()));

        cache.delete(&key);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn flush_all_clears_every_entry() {
        let cache = ResultCache::new(3600);
        cache.put("a".into(), b"1".to_vec(), 3600);
        cache.put("b".into(), b"2".to_vec(), 3600);
        cache.flush_all();
        cache.inner.run_pending_tasks();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }

    proptest::proptest! {
        #[test]
        fn normalization_is_idempotent(s in ".*") {
            let once = normalize_query(&s);
            let twice = normalize_query(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
