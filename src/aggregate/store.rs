//! Content-addressed storage of per-scope results.

use ahash::AHashMap;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use super::tables::ScopeResult;

/// An in-memory content-addressed store of immutable per-scope results.
/// Each result is keyed by the sha256 of its canonical JSON, so re-inserting
/// an identical result (a re-run country) deduplicates instead of
/// duplicating, and a reducer can merge stored results without a filesystem
/// as the coordination mechanism.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: AHashMap<String, ScopeResult>,
    order: Vec<String>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline] pub fn len(&self) -> usize { self.entries.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Digest of a result's canonical JSON encoding.
    pub fn digest(result: &ScopeResult) -> Result<String> {
        let bytes = serde_json::to_vec(result)
            .map_err(|e| Error::Format(format!("result serialization failed: {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Insert a result, returning its digest. Identical content is a no-op.
    pub fn insert(&mut self, result: ScopeResult) -> Result<String> {
        let digest = Self::digest(&result)?;
        if !self.entries.contains_key(&digest) {
            self.order.push(digest.clone());
            self.entries.insert(digest.clone(), result);
        }
        Ok(digest)
    }

    pub fn get(&self, digest: &str) -> Option<&ScopeResult> {
        self.entries.get(digest)
    }

    /// Stored results in insertion order.
    pub fn results(&self) -> Vec<&ScopeResult> {
        self.order.iter().filter_map(|d| self.entries.get(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tables::{ScopeResult, ScopeTotals};
    use super::*;

    fn result(scope: &str, population: f64) -> ScopeResult {
        ScopeResult {
            scope: scope.to_string(),
            totals: ScopeTotals { population, urban: population, rural: 0.0, cells: 1 },
            bands: Vec::new(),
            cumulative: Vec::new(),
            gap: None,
        }
    }

    #[test]
    fn identical_content_deduplicates() {
        let mut store = ResultStore::new();
        let d1 = store.insert(result("Alandia", 10.0)).unwrap();
        let d2 = store.insert(result("Alandia", 10.0)).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_gets_different_digests() {
        let mut store = ResultStore::new();
        let d1 = store.insert(result("Alandia", 10.0)).unwrap();
        let d2 = store.insert(result("Alandia", 11.0)).unwrap();
        assert_ne!(d1, d2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&d1).unwrap().totals.population, 10.0);
    }

    #[test]
    fn results_come_back_in_insertion_order() {
        let mut store = ResultStore::new();
        store.insert(result("B", 1.0)).unwrap();
        store.insert(result("A", 2.0)).unwrap();
        let scopes: Vec<&str> = store.results().iter().map(|r| r.scope.as_str()).collect();
        assert_eq!(scopes, vec!["B", "A"]);
    }
}
