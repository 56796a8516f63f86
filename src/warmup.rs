//! Interruptible teleport warmups.
//!
//! Each player has at most one [`WarmupSession`]. A session owns two timer
//! tasks: a periodic movement check and a one-shot completion. Whichever of
//! completion and cancellation claims the session first wins; the other
//! finds the session gone (or replaced) and does nothing.
//!
//! ```text
//! Idle ──start──▶ Warming ──deadline──▶ Completed ─┐
//!                    │                               ├─▶ Idle
//!                    └──moved / cancel / restart──▶ Cancelled ─┘
//! ```

use crate::messages::{CommandSender, MessageSink};
use crate::types::{PlayerId, Vec3};
use crate::world::WorldHandle;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Invoked once when a warmup runs to its deadline uncancelled.
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

struct WarmupSession {
    /// Distinguishes this session from an earlier or later one for the
    /// same player.
    id: u64,
    start: Vec3,
    movement_threshold: f64,
    deadline: Instant,
    check_task: JoinHandle<()>,
    completion_task: JoinHandle<()>,
}

impl WarmupSession {
    fn stop_timers(&self) {
        self.check_task.abort();
        self.completion_task.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupStart {
    /// Zero warmup: the completion already ran on the caller's thread.
    Immediate,
    /// Countdown running.
    Scheduled,
    /// The scheduler has been shut down; the completion was dropped.
    Rejected,
}

struct Inner {
    sessions: Mutex<HashMap<PlayerId, WarmupSession>>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
    world: WorldHandle,
    messages: Arc<dyn MessageSink>,
    cancel_message: String,
    check_interval: Duration,
    runtime: Handle,
}

#[derive(Clone)]
pub struct WarmupScheduler {
    inner: Arc<Inner>,
}

impl WarmupScheduler {
    /// Must be called from within a tokio runtime; timers run on it.
    pub fn new(
        world: WorldHandle,
        messages: Arc<dyn MessageSink>,
        cancel_message: impl Into<String>,
        check_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                shut_down: AtomicBool::new(false),
                world,
                messages,
                cancel_message: cancel_message.into(),
                check_interval,
                runtime: Handle::current(),
            }),
        }
    }

    /// Start (or restart) the warmup for `player`.
    ///
    /// Any earlier session for the player is cancelled first and its
    /// completion is never invoked. With `warmup_seconds == 0` the completion
    /// runs synchronously and no session is created.
    pub fn start_warmup<F>(
        &self,
        player: PlayerId,
        start: Vec3,
        warmup_seconds: u64,
        movement_threshold: f64,
        on_complete: F,
    ) -> WarmupStart
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = &self.inner;
        let mut sessions = inner.sessions.lock();

        if let Some(old) = sessions.remove(&player) {
            debug!("Restarting warmup for {}", player);
            old.stop_timers();
        }

        if warmup_seconds == 0 {
            drop(sessions);
            on_complete();
            return WarmupStart::Immediate;
        }

        if inner.shut_down.load(Ordering::Acquire) {
            warn!("Warmup for {} rejected: scheduler is shut down", player);
            return WarmupStart::Rejected;
        }

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + Duration::from_secs(warmup_seconds);
        let on_complete: OnComplete = Box::new(on_complete);

        // The session is inserted before this lock is released, so neither
        // task can observe the map without it.
        let check_task = {
            let inner = self.inner.clone();
            let player = player.clone();
            inner.runtime.clone().spawn(async move {
                let period = inner.check_interval;
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    Inner::post_movement_check(&inner, &player, id);
                }
            })
        };

        let completion_task = {
            let inner = self.inner.clone();
            let player = player.clone();
            inner.runtime.clone().spawn(async move {
                tokio::time::sleep_until(deadline).await;
                inner.complete(&player, id, on_complete);
            })
        };

        sessions.insert(
            player.clone(),
            WarmupSession {
                id,
                start,
                movement_threshold,
                deadline,
                check_task,
                completion_task,
            },
        );
        info!("Warmup {} started for {} ({}s)", id, player, warmup_seconds);
        WarmupStart::Scheduled
    }

    /// Stop and discard the player's session, if any. Returns whether one
    /// existed.
    pub fn cancel_warmup(&self, player: &PlayerId) -> bool {
        match self.inner.sessions.lock().remove(player) {
            Some(session) => {
                session.stop_timers();
                debug!("Warmup {} for {} cancelled", session.id, player);
                true
            }
            None => false,
        }
    }

    pub fn is_warming(&self, player: &PlayerId) -> bool {
        self.inner.sessions.lock().contains_key(player)
    }

    /// Time left before the player's warmup completes.
    pub fn remaining(&self, player: &PlayerId) -> Option<Duration> {
        self.inner
            .sessions
            .lock()
            .get(player)
            .map(|s| s.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn active_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Cancel every session and refuse new ones.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::Release);
        let drained: Vec<_> = self.inner.sessions.lock().drain().collect();
        for (_, session) in &drained {
            session.stop_timers();
        }
        info!("Warmup scheduler shut down ({} sessions cancelled)", drained.len());
    }
}

impl Inner {
    /// Remove the session only if it is still `id`.
    fn take_session(&self, player: &PlayerId, id: u64) -> Option<WarmupSession> {
        let mut sessions = self.sessions.lock();
        match sessions.get(player) {
            Some(s) if s.id == id => sessions.remove(player),
            _ => None,
        }
    }

    fn complete(&self, player: &PlayerId, id: u64, on_complete: OnComplete) {
        let Some(session) = self.take_session(player, id) else {
            debug!("Warmup {} for {} already cancelled", id, player);
            return;
        };
        session.check_task.abort();
        debug!("Warmup {} for {} completed", id, player);
        on_complete();
    }

    /// Timer side of the movement check: hand the position read to the
    /// world context and return.
    fn post_movement_check(inner: &Arc<Inner>, player: &PlayerId, id: u64) {
        let baseline = {
            let sessions = inner.sessions.lock();
            match sessions.get(player) {
                Some(s) if s.id == id => (s.start, s.movement_threshold),
                _ => return,
            }
        };

        let task_inner = inner.clone();
        let target = player.clone();
        let posted = inner.world.execute(move |state| {
            let player = target;
            let (start, threshold) = baseline;
            let Ok(entity) = state.player(&player) else {
                debug!("Movement check for {}: player gone", player);
                return;
            };
            let moved = entity.position.distance(&start);
            if moved > threshold {
                if let Some(session) = task_inner.take_session(&player, id) {
                    session.stop_timers();
                    info!("Warmup {} for {} cancelled: moved {:.2}", id, player, moved);
                    task_inner
                        .messages
                        .send(&CommandSender::Player(player.clone()), &task_inner.cancel_message);
                }
            }
        });
        if posted.is_err() {
            debug!("Movement check for {} skipped: world closed", player);
        }
    }
}
