use std::sync::{Arc, Mutex, MutexGuard};

use super::registry::SectionRegistry;
use super::settings::MonitorSettings;
use super::tracker::NotificationTracker;

/// Registry, tracker, and settings mutated together under one lock.
#[derive(Debug)]
pub struct TrackingState {
    pub registry: SectionRegistry,
    pub tracker: NotificationTracker,
    pub settings: MonitorSettings,
}

impl TrackingState {
    /// Drop every tracked section along with its notification history.
    pub fn clear_tracking(&mut self) {
        self.registry.clear();
        self.tracker.clear();
    }
}

/// Shared handle to [`TrackingState`].
///
/// The guard must never be held across an `.await`: callers copy what they need out, release
/// the lock for external calls, then re-acquire it to apply results.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    inner: Arc<Mutex<TrackingState>>,
}

impl TrackingStore {
    pub fn new(settings: MonitorSettings, tracker: NotificationTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackingState {
                registry: SectionRegistry::new(),
                tracker,
                settings,
            })),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, TrackingState> {
        self.inner.lock().expect("tracking state mutex poisoned")
    }
}
