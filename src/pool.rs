//! Bounded session pool with retry policy.
//!
//! Each [`Session`] wraps its own transport handle so the engine sees
//! independent connection state per slot. Sessions move Idle -> InUse on
//! acquire and back on release; a session marked dead is discarded and its
//! capacity slot freed, never returned to the idle set. Capacity is gated
//! by a semaphore, so `acquire` suspends until a slot is free or the
//! acquire timeout expires, and no two callers ever hold the same session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// Pool sizing and session lifecycle limits.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of live sessions.
    pub max_size: usize,
    /// How long `acquire` may wait for a free slot.
    pub acquire_timeout: Duration,
    /// Per-attempt HTTP timeout applied to every session.
    pub request_timeout: Duration,
    /// Idle sessions older than this are discarded on acquire.
    pub idle_timeout: Option<Duration>,
    /// Sessions past this age are discarded on acquire regardless of use.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            acquire_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(300)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Bounded-attempt exponential backoff with jitter.
///
/// `max_attempts` counts total attempts, so a policy of 3 performs the
/// initial attempt plus up to 2 retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    ///
    /// Equal-jitter: the delay is drawn from `[exp/2, exp)` where
    /// `exp = base * 2^attempt` capped at `max_delay`. Below the cap the
    /// sampling windows of successive attempts never overlap, so delays
    /// are strictly increasing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt.min(20)).unwrap_or(u32::MAX))
            .min(self.max_delay);
        let half = exp / 2;
        let jitter_nanos = rand::thread_rng().gen_range(0..half.as_nanos().max(1) as u64);
        half + Duration::from_nanos(jitter_nanos)
    }
}

/// One reusable transport session.
#[derive(Debug)]
pub struct Session {
    id: u64,
    http: reqwest::Client,
    created_at: Instant,
    last_used: Instant,
    alive: bool,
}

impl Session {
    fn connect(id: u64, request_timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP session: {e}")))?;
        let now = Instant::now();
        Ok(Self {
            id,
            http,
            created_at: now,
            last_used: now,
            alive: true,
        })
    }

    fn expired(&self, config: &PoolConfig) -> bool {
        if let Some(idle) = config.idle_timeout {
            if self.last_used.elapsed() > idle {
                return true;
            }
        }
        if let Some(lifetime) = config.max_lifetime {
            if self.created_at.elapsed() > lifetime {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Default)]
struct PoolState {
    idle: Vec<Session>,
    created: usize,
    closed: bool,
}

#[derive(Debug)]
struct PoolInner {
    config: PoolConfig,
    state: Mutex<PoolState>,
    permits: Arc<Semaphore>,
    next_id: AtomicU64,
}

/// Snapshot of the pool's idle/in-use partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub in_use: usize,
}

/// Bounded collection of reusable sessions, shared between callers.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_size));
        Self {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(PoolState::default()),
                permits,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Take exclusive ownership of a session, creating one lazily if the
    /// pool is under capacity. Waits up to the configured acquire timeout
    /// for a slot, then fails with `PoolTimeout`.
    pub async fn acquire(&self) -> ClientResult<PooledSession> {
        let timeout = self.inner.config.acquire_timeout;
        let permit = tokio::time::timeout(timeout, self.inner.permits.clone().acquire_owned())
            .await
            .map_err(|_| ClientError::PoolTimeout(timeout))?
            .map_err(|_| ClientError::Closed)?;

        let session = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(ClientError::Closed);
            }
            loop {
                match state.idle.pop() {
                    Some(session) if session.expired(&self.inner.config) => {
                        debug!(session_id = session.id, "discarding expired idle session");
                        state.created -= 1;
                    }
                    Some(session) => break Some(session),
                    None => break None,
                }
            }
        };

        let session = match session {
            Some(session) => session,
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                let session = Session::connect(id, self.inner.config.request_timeout)?;
                let mut state = self.inner.state.lock();
                state.created += 1;
                debug!(session_id = id, live = state.created, "created session");
                session
            }
        };

        Ok(PooledSession {
            session: Some(session),
            permit: Some(permit),
            pool: Arc::clone(&self.inner),
        })
    }

    /// Drop all idle sessions and reject further acquires.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.created -= state.idle.len();
        state.idle.clear();
        self.inner.permits.close();
        info!("session pool closed");
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            idle: state.idle.len(),
            in_use: state.created - state.idle.len(),
        }
    }
}

/// Exclusive handle on a session between acquire and release.
///
/// Holds a back-reference to the owning pool; dropping the guard returns a
/// live session to the idle set and discards a dead one. Callers that
/// abandon a request mid-flight must still let the guard drop, marking the
/// session dead if the transport cannot be left cleanly idle.
#[derive(Debug)]
pub struct PooledSession {
    session: Option<Session>,
    permit: Option<OwnedSemaphorePermit>,
    pool: Arc<PoolInner>,
}

impl PooledSession {
    pub fn id(&self) -> u64 {
        self.session.as_ref().map(|s| s.id).unwrap_or(0)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        // The session is only vacated in Drop.
        &self
            .session
            .as_ref()
            .expect("session vacated before drop")
            .http
    }

    /// Exclude this session from reuse; it is destroyed on release.
    pub fn mark_dead(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.alive {
                warn!(session_id = session.id, "session marked dead");
                session.alive = false;
            }
        }
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            let mut state = self.pool.state.lock();
            if state.closed || !session.alive {
                state.created -= 1;
                debug!(session_id = session.id, "session discarded on release");
            } else {
                session.last_used = Instant::now();
                state.idle.push(session);
            }
        }
        // Free the capacity slot after the state transition.
        self.permit.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_windows_do_not_overlap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        };
        for attempt in 0..4 {
            let delay = policy.delay_for(attempt);
            let exp = Duration::from_millis(100 * (1 << attempt));
            assert!(delay >= exp / 2, "attempt {attempt}: {delay:?} below window");
            assert!(delay < exp, "attempt {attempt}: {delay:?} above window");
        }
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
        };
        for _ in 0..20 {
            assert!(policy.delay_for(9) <= Duration::from_millis(400));
        }
    }
}
