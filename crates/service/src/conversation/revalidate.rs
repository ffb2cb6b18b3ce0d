//! Stale-while-revalidate cache in front of [`SnapshotBuilder`].
//!
//! Each route keeps its last good snapshot. Within the revalidation window
//! the snapshot is served as is. After the window, the previous snapshot is
//! still served and one background rebuild is started; a second stale request
//! does not start another rebuild while the first is running. A failed
//! rebuild leaves the previous snapshot in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use common::metrics::{SNAPSHOT_REBUILDS_TOTAL, SNAPSHOT_REBUILD_FAILURES_TOTAL, SNAPSHOT_STALE_SERVED_TOTAL};

use crate::conversation::page::Page;
use crate::conversation::repository::ConversationStore;
use crate::conversation::snapshot::{Route, SnapshotBuilder};
use crate::errors::ServiceError;

/// Time source for the revalidation window.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant { Instant::now() }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { origin: Instant::now(), elapsed: Mutex::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self { Self::new() }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = *self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + elapsed
    }
}

/// A built snapshot and when it was built.
#[derive(Debug)]
pub struct Snapshot {
    page: Arc<Page>,
    built_at: Instant,
}

impl Snapshot {
    pub fn page(&self) -> &Arc<Page> { &self.page }

    pub fn built_at(&self) -> Instant { self.built_at }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Built within the window.
    Fresh,
    /// Past the window; a background rebuild has been requested.
    Stale,
    /// No previous snapshot existed, built inline for this request.
    Cold,
}

#[derive(Clone, Debug)]
pub struct Served {
    pub page: Arc<Page>,
    pub freshness: Freshness,
    pub age: Duration,
}

struct Slot {
    current: ArcSwapOption<Snapshot>,
    rebuilding: AtomicBool,
}

/// Clears a slot's `rebuilding` flag when dropped, including on panic.
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Slot {
    fn new() -> Self {
        Self { current: ArcSwapOption::empty(), rebuilding: AtomicBool::new(false) }
    }
}

pub struct SnapshotCache<S: ?Sized> {
    builder: SnapshotBuilder<S>,
    clock: Arc<dyn Clock>,
    window: Duration,
    top: Slot,
    new: Slot,
}

impl<S: ConversationStore + ?Sized + 'static> SnapshotCache<S> {
    pub fn new(builder: SnapshotBuilder<S>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self { builder, clock, window, top: Slot::new(), new: Slot::new() }
    }

    pub fn window(&self) -> Duration { self.window }

    pub fn page_size(&self) -> u64 { self.builder.page_size() }

    fn slot(&self, route: Route) -> &Slot {
        match route {
            Route::Top => &self.top,
            Route::New => &self.new,
        }
    }

    /// Current snapshot for `route`, without triggering anything.
    pub fn peek(&self, route: Route) -> Option<Arc<Snapshot>> {
        self.slot(route).current.load_full()
    }

    /// Build now and publish on success. On failure the previous snapshot,
    /// if any, stays authoritative.
    pub async fn rebuild(&self, route: Route) -> Result<Arc<Page>, ServiceError> {
        match self.builder.build(route).await {
            Ok(page) => {
                let page = Arc::new(page);
                let snapshot = Snapshot { page: Arc::clone(&page), built_at: self.clock.now() };
                self.slot(route).current.store(Some(Arc::new(snapshot)));
                SNAPSHOT_REBUILDS_TOTAL.inc();
                Ok(page)
            }
            Err(e) => {
                SNAPSHOT_REBUILD_FAILURES_TOTAL.inc();
                let kept = self.peek(route).is_some();
                warn!(route = %route, error = %e, kept_previous = kept, "snapshot rebuild failed");
                Err(e)
            }
        }
    }

    /// Build every route. All routes are attempted; the first error is returned.
    pub async fn warm(&self) -> Result<(), ServiceError> {
        let mut first_err = None;
        for route in Route::ALL {
            if let Err(e) = self.rebuild(route).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                info!(window_secs = self.window.as_secs(), "snapshots warmed");
                Ok(())
            }
        }
    }

    /// Serve the snapshot for `route`, scheduling a rebuild when it is past
    /// the window. Errors only when there is no snapshot at all and the
    /// inline build fails.
    pub async fn get(self: &Arc<Self>, route: Route) -> Result<Served, ServiceError> {
        let now = self.clock.now();
        match self.peek(route) {
            Some(snapshot) => {
                let age = now.saturating_duration_since(snapshot.built_at);
                if age < self.window {
                    return Ok(Served { page: Arc::clone(&snapshot.page), freshness: Freshness::Fresh, age });
                }
                SNAPSHOT_STALE_SERVED_TOTAL.inc();
                self.spawn_revalidation(route);
                Ok(Served { page: Arc::clone(&snapshot.page), freshness: Freshness::Stale, age })
            }
            None => {
                let page = self.rebuild(route).await?;
                Ok(Served { page, freshness: Freshness::Cold, age: Duration::ZERO })
            }
        }
    }

    /// Start one out-of-band rebuild for `route`. Returns false when a
    /// rebuild is already running.
    fn spawn_revalidation(self: &Arc<Self>, route: Route) -> bool {
        if self.slot(route).rebuilding.swap(true, Ordering::AcqRel) {
            debug!(route = %route, "revalidation already in flight");
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = RebuildGuard(&this.slot(route).rebuilding);
            debug!(route = %route, "revalidating snapshot");
            let _ = this.rebuild(route).await;
        });
        true
    }
}
