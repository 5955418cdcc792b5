//! Time-bounded memoization of resolved boundaries.
//!
//! Both outcomes are cached, so a locality without a confident boundary is
//! not searched again until its entry expires. Expiry is checked on read;
//! nothing runs in the background.

use chrono::{DateTime, Duration, Utc};
use hashbrown::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{ResolveBoundary, ResolvedBoundary};
use crate::models::LocalityName;

/// Source of the current time, replaceable in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: Option<Arc<ResolvedBoundary>>,
    stored_at: DateTime<Utc>,
}

/// Shared by every validation in a run.
///
/// The entry map sits behind a single mutex that is never held across a
/// resolution, so concurrent callers may resolve the same locality twice;
/// the last writer wins.
pub struct BoundaryCache<R, C = SystemClock> {
    resolver: R,
    clock: C,
    ttl: Duration,
    entries: Mutex<HashMap<LocalityName, CacheEntry>>,
}

impl<R: ResolveBoundary> BoundaryCache<R, SystemClock> {
    pub fn new(resolver: R, ttl: Duration) -> Self {
        Self::with_clock(resolver, ttl, SystemClock)
    }
}

impl<R: ResolveBoundary, C: Clock> BoundaryCache<R, C> {
    pub fn with_clock(resolver: R, ttl: Duration, clock: C) -> Self {
        Self {
            resolver,
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<LocalityName, CacheEntry>> {
        // A panic elsewhere cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached outcome if present and not expired
    pub fn get(&self, locality: &LocalityName) -> Option<Option<Arc<ResolvedBoundary>>> {
        let now = self.clock.now();
        let entries = self.entries();
        let entry = entries.get(locality)?;
        (now - entry.stored_at < self.ttl).then(|| entry.outcome.clone())
    }

    /// Return the cached outcome or resolve and store a fresh one.
    pub async fn get_or_resolve(&self, locality: &LocalityName) -> Option<Arc<ResolvedBoundary>> {
        if let Some(outcome) = self.get(locality) {
            debug!("Boundary cache hit for '{}'", locality);
            return outcome;
        }

        debug!("Boundary cache miss for '{}'", locality);
        let outcome = self.resolver.resolve(locality).await.map(Arc::new);

        self.entries().insert(
            locality.clone(),
            CacheEntry {
                outcome: outcome.clone(),
                stored_at: self.clock.now(),
            },
        );
        outcome
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}
