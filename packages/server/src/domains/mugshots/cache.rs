//! Short-lived cache for the public mugshot listing.
//!
//! The listing is read far more often than it changes, so the public
//! endpoint serves from this cache within a bounded TTL. The cache is an
//! explicit dependency injected into the app state; tests construct it
//! with a zero TTL to bypass it.

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::models::Mugshot;

struct CachedListing {
    fetched_at: Instant,
    rows: Vec<Mugshot>,
}

pub struct MugshotListingCache {
    ttl: Duration,
    inner: RwLock<Option<CachedListing>>,
}

impl MugshotListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Get the cached listing if it is still within TTL.
    pub async fn get(&self) -> Option<Vec<Mugshot>> {
        let guard = self.inner.read().await;
        let cached = guard.as_ref()?;
        if cached.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.rows.clone())
    }

    /// Replace the cached listing.
    pub async fn put(&self, rows: Vec<Mugshot>) {
        let mut guard = self.inner.write().await;
        *guard = Some(CachedListing {
            fetched_at: Instant::now(),
            rows,
        });
    }

    /// Drop the cached listing (after a write that changes it).
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
    }
}
