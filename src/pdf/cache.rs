//! LRU page cache for rendered PDF pages

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::PageData;

/// Cache key for rendered pages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number (1-indexed)
    pub page_number: usize,
    /// Scale factor (stored as millionths for stable hashing)
    pub scale_millionths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(page_number: usize, scale: f32) -> Self {
        Self {
            page_number,
            scale_millionths: (scale * 1_000_000.0) as u32,
        }
    }
}

/// LRU cache for rendered page data.
///
/// One cache lives per loaded document; it is dropped with the document.
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<PageData>>,
}

impl PageCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<PageData>> {
        self.cache.get(key).cloned()
    }

    /// Check if a key is in the cache without promoting it
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a page into the cache, returning an Arc to the data
    pub fn insert(&mut self, key: CacheKey, data: PageData) -> Arc<PageData> {
        let arc = Arc::new(data);
        self.cache.put(key, arc.clone());
        arc
    }

    /// Number of cached pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{PageHandle, RasterSurface};
    use super::*;

    fn test_page_data(page_number: usize) -> PageData {
        let handle = PageHandle {
            page_number,
            width_pt: 10.0,
            height_pt: 10.0,
        };
        let viewport = handle.viewport_at(1.0);
        PageData {
            viewport,
            handle,
            surface: RasterSurface::filled(viewport.width_px, viewport.height_px, [255; 3]),
        }
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = PageCache::new(10);
        let key = CacheKey::new(1, 1.5);

        cache.insert(key.clone(), test_page_data(1));

        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).map(|p| p.page_number()), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_lru_eviction() {
        let mut cache = PageCache::new(2);

        for page in 1..=3 {
            cache.insert(CacheKey::new(page, 1.5), test_page_data(page));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&CacheKey::new(1, 1.5)));
        assert!(cache.contains(&CacheKey::new(2, 1.5)));
        assert!(cache.contains(&CacheKey::new(3, 1.5)));
    }

    #[test]
    fn scale_is_part_of_the_key() {
        let mut cache = PageCache::new(4);
        cache.insert(CacheKey::new(1, 1.5), test_page_data(1));

        assert!(!cache.contains(&CacheKey::new(1, 2.0)));
    }

    #[test]
    fn zero_capacity_still_holds_one_page() {
        let mut cache = PageCache::new(0);
        cache.insert(CacheKey::new(1, 1.0), test_page_data(1));
        assert!(!cache.is_empty());
    }
}
