// src/pipeline/session.rs
//
// Session registry: one debouncer, one previous-frame slot and one hand
// tracker per client id.
//
// Locking: the map lock is held only to look up, insert or evict entries.
// Each session sits behind its own lock, so frames for different ids never
// wait on each other and at most one update per id runs at a time.
// Evicted and replaced sessions are released after the map lock is dropped.

use super::clock::Clock;
use super::metrics::EngineMetrics;
use crate::analysis::TemporalDebouncer;
use crate::error::EngineError;
use crate::types::{DebounceConfig, HandObservation, LandmarkFrame};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ============================================================================
// HAND TRACKER
// ============================================================================

/// External pose detector owned by one session. Keeps temporal tracking
/// state between that session's frames, so it is never shared.
pub trait HandTracker: Send {
    fn detect(&mut self, image: &[u8]) -> Result<Option<HandObservation>, EngineError>;

    /// Free the underlying resources. Called exactly once per tracker.
    fn release(&mut self);
}

pub type TrackerFactory = Arc<dyn Fn() -> Box<dyn HandTracker> + Send + Sync>;

/// Stand-in for deployments that only submit landmark frames
#[derive(Debug, Default)]
pub struct NullTracker;

impl HandTracker for NullTracker {
    fn detect(&mut self, _image: &[u8]) -> Result<Option<HandObservation>, EngineError> {
        Err(EngineError::Tracker("no pose detector configured".into()))
    }

    fn release(&mut self) {}
}

pub fn null_tracker_factory() -> TrackerFactory {
    Arc::new(|| Box::new(NullTracker) as Box<dyn HandTracker>)
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    id: String,
    pub(crate) debouncer: TemporalDebouncer,
    pub(crate) previous: Option<LandmarkFrame>,
    tracker: Option<Box<dyn HandTracker>>,
}

impl Session {
    fn new(id: &str, config: &DebounceConfig, tracker: Box<dyn HandTracker>) -> Self {
        Self {
            id: id.to_string(),
            debouncer: TemporalDebouncer::new(config.clone()),
            previous: None,
            tracker: Some(tracker),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn debouncer(&self) -> &TemporalDebouncer {
        &self.debouncer
    }

    pub fn previous(&self) -> Option<&LandmarkFrame> {
        self.previous.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.tracker.is_none()
    }

    pub fn detect(&mut self, image: &[u8]) -> Result<Option<HandObservation>, EngineError> {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.detect(image),
            None => Err(EngineError::Tracker(format!(
                "session {} already released",
                self.id
            ))),
        }
    }

    /// Release the tracker. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.release();
            debug!("Session {}: tracker released", self.id);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

struct SessionEntry {
    session: SessionHandle,
    last_access: Instant,
}

// ============================================================================
// REGISTRY
// ============================================================================

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    debounce: DebounceConfig,
    idle_timeout: Duration,
    clock: Arc<dyn Clock>,
    tracker_factory: TrackerFactory,
    metrics: EngineMetrics,
}

impl SessionRegistry {
    pub fn new(
        debounce: DebounceConfig,
        idle_timeout: Duration,
        clock: Arc<dyn Clock>,
        tracker_factory: TrackerFactory,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            debounce,
            idle_timeout,
            clock,
            tracker_factory,
            metrics,
        }
    }

    fn create(&self, id: &str, now: Instant) -> SessionEntry {
        self.metrics.inc(&self.metrics.sessions_created);
        info!("🆕 Session {} created", id);
        SessionEntry {
            session: Arc::new(Mutex::new(Session::new(
                id,
                &self.debounce,
                (self.tracker_factory)(),
            ))),
            last_access: now,
        }
    }

    /// Existing session with a refreshed last-access time, or a new one.
    /// Idle sessions are evicted first, including this id's own.
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        let now = self.clock.now();
        let (handle, evicted) = {
            let mut sessions = self.sessions.lock();
            let evicted = self.take_idle(&mut sessions, now);
            let entry = sessions
                .entry(id.to_string())
                .or_insert_with(|| self.create(id, now));
            entry.last_access = now;
            (entry.session.clone(), evicted)
        };
        release(evicted);
        handle
    }

    /// Remove and release every session idle for longer than the timeout
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let evicted = {
            let mut sessions = self.sessions.lock();
            self.take_idle(&mut sessions, now)
        };
        let n = evicted.len();
        release(evicted);
        n
    }

    /// Replace this id's session with a fresh one, whatever its idle time
    pub fn reset(&self, id: &str) -> SessionHandle {
        let now = self.clock.now();
        let (handle, stale) = {
            let mut sessions = self.sessions.lock();
            let mut stale = self.take_idle(&mut sessions, now);
            let entry = self.create(id, now);
            let handle = entry.session.clone();
            if let Some(old) = sessions.insert(id.to_string(), entry) {
                stale.push(old.session);
            }
            (handle, stale)
        };
        self.metrics.inc(&self.metrics.sessions_reset);
        info!("🔄 Session {} reset", id);
        release(stale);
        handle
    }

    fn take_idle(
        &self,
        sessions: &mut HashMap<String, SessionEntry>,
        now: Instant,
    ) -> Vec<SessionHandle> {
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_access) > self.idle_timeout)
            .map(|(id, _)| id.clone())
            .collect();

        let mut evicted = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(entry) = sessions.remove(&id) {
                info!("🧹 Session {} evicted after idle timeout", id);
                evicted.push(entry.session);
            }
        }
        if !evicted.is_empty() {
            self.metrics.add(&self.metrics.sessions_evicted, evicted.len() as u64);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Waits for any in-flight update on each session before closing it
fn release(sessions: Vec<SessionHandle>) {
    for session in sessions {
        session.lock().close();
    }
}
