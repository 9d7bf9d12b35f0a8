//! Content-addressed, cost-weighted polyhedron cache.
//!
//! Keys are a canonicalized form of [`AbstractNode::dump`]: the whitespace
//! is already absent from `dump()`'s output, and the `<label>_<id>` index
//! suffixes `dump()` includes for debuggability are stripped here, since two
//! structurally identical subtrees evaluated at different node indices
//! should still share one cache entry.

use indexmap::IndexMap;

/// Strips `_<digits>` runs that immediately follow a label, so
/// `"cube_3(sphere_7())"` and `"cube_91(sphere_4())"` canonicalize to the
/// same key.
#[must_use]
pub fn canonicalize_key(dump: &str) -> String {
    let mut out = String::with_capacity(dump.len());
    let mut chars = dump.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' && chars.peek().is_some_and(char::is_ascii_digit) {
            while chars.peek().is_some_and(char::is_ascii_digit) {
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Upper bound, in total vertex count across all cached entries, past which
/// the cache starts evicting least-recently-used entries.
pub const DEFAULT_VERTEX_BUDGET: usize = 100_000;

struct Entry<P> {
    value: P,
    cost: usize,
}

/// An LRU, cost-weighted cache from canonicalized node dump to a rendered
/// polyhedron. `P` is expected to be cheap to clone (an `Rc`-backed handle),
/// since [`PolyhedronCache::get`] hands back an independent copy rather than
/// a reference, so a caller can't observe another caller's later mutation.
pub struct PolyhedronCache<P> {
    entries: IndexMap<String, Entry<P>>,
    budget: usize,
    used: usize,
}

impl<P: Clone> Default for PolyhedronCache<P> {
    fn default() -> Self {
        Self::new(DEFAULT_VERTEX_BUDGET)
    }
}

impl<P: Clone> PolyhedronCache<P> {
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            budget,
            used: 0,
        }
    }

    /// Looks up `dump` (a raw, not-yet-canonicalized node dump), marking it
    /// most-recently-used on a hit.
    #[must_use]
    pub fn get(&mut self, dump: &str) -> Option<P> {
        let key = canonicalize_key(dump);
        let (_, entry) = self.entries.shift_remove_entry(&key)?;
        let value = entry.value.clone();
        self.entries.insert(key, entry);
        Some(value)
    }

    /// Inserts `value` under `dump`'s canonical key with the given vertex
    /// cost. Entries larger than the entire budget are silently skipped —
    /// they would immediately evict everything else for no net benefit.
    pub fn insert(&mut self, dump: &str, value: P, cost: usize) {
        if cost > self.budget {
            return;
        }
        let key = canonicalize_key(dump);
        if let Some(old) = self.entries.shift_remove(&key) {
            self.used -= old.cost;
        }
        while self.used + cost > self.budget {
            let Some((_, evicted)) = self.entries.shift_remove_index(0) else {
                break;
            };
            self.used -= evicted.cost;
        }
        self.used += cost;
        self.entries.insert(key, Entry { value, cost });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_away_index_suffixes() {
        assert_eq!(canonicalize_key("cube_3(sphere_7())"), canonicalize_key("cube_91(sphere_4())"));
    }

    #[test]
    fn oversize_insert_is_silently_skipped() {
        let mut cache: PolyhedronCache<u32> = PolyhedronCache::new(10);
        cache.insert("big_0()", 42, 100);
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let mut cache: PolyhedronCache<u32> = PolyhedronCache::new(10);
        cache.insert("a_0()", 1, 6);
        cache.insert("b_0()", 2, 6);
        // inserting b evicts a, since 6+6 > 10
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a_0()").is_none());
        assert!(cache.get("b_0()").is_some());
    }
}
