use std::collections::HashMap;

/// Bidirectional optimistic-id ↔ real-id map.
///
/// Both directions are kept as their own HashMap so lookups are O(1)
/// either way and a duplicate id can never leave a dangling reverse
/// entry: inserting a pair first evicts any existing pair sharing either
/// id.
#[derive(Debug, Default)]
pub struct OptimisticIdMap {
    real_to_optimistic: HashMap<String, String>,
    optimistic_to_real: HashMap<String, String>,
}

impl OptimisticIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, real: impl Into<String>, optimistic: impl Into<String>) {
        let real = real.into();
        let optimistic = optimistic.into();

        if let Some(stale) = self.real_to_optimistic.remove(&real) {
            self.optimistic_to_real.remove(&stale);
        }
        if let Some(stale) = self.optimistic_to_real.remove(&optimistic) {
            self.real_to_optimistic.remove(&stale);
        }

        self.real_to_optimistic
            .insert(real.clone(), optimistic.clone());
        self.optimistic_to_real.insert(optimistic, real);
    }

    pub fn real_for(&self, optimistic: &str) -> Option<&str> {
        self.optimistic_to_real.get(optimistic).map(String::as_str)
    }

    pub fn optimistic_for(&self, real: &str) -> Option<&str> {
        self.real_to_optimistic.get(real).map(String::as_str)
    }

    /// Resolve an id of either kind to the real id; unknown ids pass
    /// through unchanged so callers can use them transparently.
    pub fn resolve(&self, id: &str) -> String {
        if let Some(real) = self.real_for(id) {
            return real.to_string();
        }
        id.to_string()
    }

    pub fn remove_by_real(&mut self, real: &str) {
        if let Some(optimistic) = self.real_to_optimistic.remove(real) {
            self.optimistic_to_real.remove(&optimistic);
        }
    }

    pub fn remove_by_optimistic(&mut self, optimistic: &str) {
        if let Some(real) = self.optimistic_to_real.remove(optimistic) {
            self.real_to_optimistic.remove(&real);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.optimistic_to_real.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_directions() {
        let mut map = OptimisticIdMap::new();
        map.insert("real-1", "tmp-1");

        assert_eq!(map.real_for("tmp-1"), Some("real-1"));
        assert_eq!(map.optimistic_for("real-1"), Some("tmp-1"));
        assert_eq!(map.resolve("tmp-1"), "real-1");
        assert_eq!(map.resolve("real-1"), "real-1");
        assert_eq!(map.resolve("unknown"), "unknown");
    }

    #[test]
    fn insert_evicts_stale_pairs_on_either_side() {
        let mut map = OptimisticIdMap::new();
        map.insert("real-1", "tmp-1");
        map.insert("real-1", "tmp-2");

        assert_eq!(map.real_for("tmp-1"), None);
        assert_eq!(map.real_for("tmp-2"), Some("real-1"));

        map.insert("real-2", "tmp-2");
        assert_eq!(map.optimistic_for("real-1"), None);
        assert_eq!(map.real_for("tmp-2"), Some("real-2"));
    }

    #[test]
    fn removal_clears_both_directions() {
        let mut map = OptimisticIdMap::new();
        map.insert("real-1", "tmp-1");
        map.remove_by_real("real-1");
        assert!(map.is_empty());

        map.insert("real-2", "tmp-2");
        map.remove_by_optimistic("tmp-2");
        assert!(map.is_empty());
    }
}
