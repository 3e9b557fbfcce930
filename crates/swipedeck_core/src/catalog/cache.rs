//! Populate-once catalog cache.

use super::Catalog;
use crate::model::card::CardItem;
use log::info;

/// Session-scoped catalog cache, injected into whoever needs the catalog.
///
/// Populated once; later reads return the same `Catalog` identity until
/// `invalidate` is called by the owner (for example on an explicit reload).
#[derive(Debug, Default)]
pub struct CatalogCache {
    current: Option<Catalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Catalog> {
        self.current.clone()
    }

    pub fn is_populated(&self) -> bool {
        self.current.is_some()
    }

    /// Stores a new fetch, replacing any cached one, and returns it.
    pub fn populate(&mut self, items: Vec<CardItem>) -> Catalog {
        let catalog = Catalog::new(items);
        info!(
            "event=catalog_populate module=catalog status=ok size={}",
            catalog.len()
        );
        self.current = Some(catalog.clone());
        catalog
    }

    /// Returns the cached catalog, fetching through `load` only when empty.
    /// A failed load leaves the cache empty.
    pub fn get_or_load<E>(
        &mut self,
        load: impl FnOnce() -> Result<Vec<CardItem>, E>,
    ) -> Result<Catalog, E> {
        if let Some(catalog) = &self.current {
            return Ok(catalog.clone());
        }
        let items = load()?;
        Ok(self.populate(items))
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogCache;
    use crate::model::card::CardItem;
    use serde_json::json;

    #[test]
    fn loads_once_until_invalidated() {
        let mut cache = CatalogCache::new();
        let mut loads = 0;

        let first = cache
            .get_or_load(|| -> Result<_, String> {
                loads += 1;
                Ok(vec![CardItem::new("a", json!({}))])
            })
            .unwrap();
        let second = cache
            .get_or_load(|| -> Result<_, String> {
                loads += 1;
                Ok(Vec::new())
            })
            .unwrap();
        assert_eq!(loads, 1);
        assert!(first.same_as(&second));

        cache.invalidate();
        assert!(!cache.is_populated());
        let third = cache
            .get_or_load(|| -> Result<_, String> { Ok(vec![CardItem::new("a", json!({}))]) })
            .unwrap();
        assert!(!first.same_as(&third));
    }

    #[test]
    fn failed_load_leaves_cache_empty() {
        let mut cache = CatalogCache::new();
        let err = cache
            .get_or_load(|| Err::<Vec<CardItem>, _>("offline".to_string()))
            .unwrap_err();
        assert_eq!(err, "offline");
        assert!(cache.get().is_none());
    }
}
