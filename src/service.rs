//! RtpService – drives a teleport request end to end.
//!
//! ```text
//! request ─▶ resolve policy ─▶ cooldown ─▶ warmup ─▶ search ─▶ apply ─▶ record
//!               (world ctx)                 (timers)  (chunks +    (world ctx)
//!                                                      world ctx)
//! ```
//!
//! Every outcome, success or failure, is reported to the sender through the
//! [`MessageSink`].

use crate::config::RtpConfig;
use crate::cooldown::{Clock, CooldownStatus, CooldownTracker};
use crate::error::RtpError;
use crate::finder::SafeLocationFinder;
use crate::messages::{format_remaining, CommandSender, MessageKind, MessageSink};
use crate::tier::{EffectivePolicy, PermissionSource, TierPolicyResolver};
use crate::types::{PlayerId, Vec3};
use crate::warmup::{WarmupScheduler, WarmupStart};
use crate::world::{PlayerEntity, WorldHandle};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TeleportReport {
    pub target: PlayerId,
    pub position: Vec3,
    /// Sampled distance from the search origin.
    pub distance: f64,
    pub attempts: u32,
}

/// What happened to an accepted request by the time the handler returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The teleport was applied before returning.
    Teleported(TeleportReport),
    /// A warmup is counting down; the teleport runs when it completes.
    WarmingUp { seconds: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RtpStats {
    pub active_warmups: usize,
    pub tracked_cooldowns: usize,
    pub online_players: usize,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

struct ServiceInner {
    config: RtpConfig,
    world: WorldHandle,
    cooldowns: CooldownTracker,
    warmups: WarmupScheduler,
    finder: SafeLocationFinder,
    messages: Arc<dyn MessageSink>,
    clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct RtpService {
    inner: Arc<ServiceInner>,
}

impl RtpService {
    /// Must be called from within a tokio runtime. `seed` fixes candidate
    /// sampling; `None` seeds from the OS.
    pub fn new(
        config: RtpConfig,
        world: WorldHandle,
        messages: Arc<dyn MessageSink>,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
    ) -> Self {
        let warmups = WarmupScheduler::new(
            world.clone(),
            messages.clone(),
            config.messages.warmup_cancelled.clone(),
            Duration::from_millis(config.warmup.check_interval_ms),
        );

        let settle = Duration::from_millis(config.search.settle_delay_ms);
        let finder = match seed {
            Some(seed) => SafeLocationFinder::with_seed(world.clone(), settle, config.search.rule, seed),
            None => SafeLocationFinder::new(world.clone(), settle, config.search.rule),
        };

        Self {
            inner: Arc::new(ServiceInner {
                config,
                world,
                cooldowns: CooldownTracker::new(),
                warmups,
                finder,
                messages,
                clock,
            }),
        }
    }

    pub fn config(&self) -> &RtpConfig {
        &self.inner.config
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.inner.cooldowns
    }

    pub fn warmups(&self) -> &WarmupScheduler {
        &self.inner.warmups
    }

    // -----------------------------------------------------------------------
    // Command entry point
    // -----------------------------------------------------------------------

    /// `rtp` (no target) or `rtp <player>`.
    ///
    /// Failures are reported to `sender` before being returned.
    #[tracing::instrument(skip(self))]
    pub async fn handle_command(
        &self,
        sender: CommandSender,
        target: Option<&str>,
    ) -> Result<Dispatch, RtpError> {
        let result = match (target, &sender) {
            (Some(name), _) => self.request_other(&sender, name).await,
            (None, CommandSender::Player(player)) => self.request_self(player).await,
            (None, CommandSender::Console) => Err(RtpError::NoActiveWorld),
        };
        if let Err(e) = &result {
            info!("rtp by {} refused: {}", sender, e);
            self.report_error(&sender, e);
        }
        result
    }

    async fn request_self(&self, player: &PlayerId) -> Result<Dispatch, RtpError> {
        let (position, policy) = {
            let inner = self.inner.clone();
            let player = player.clone();
            self.inner
                .world
                .call(move |state| -> Result<(Vec3, EffectivePolicy), RtpError> {
                    let entity = state.player(&player).map_err(|_| RtpError::NoActiveWorld)?;
                    let use_node = &inner.config.permissions.use_node;
                    if !use_node.is_empty() && !entity.has_permission(use_node) {
                        return Err(RtpError::NoPermission);
                    }
                    let policy = TierPolicyResolver::from_config(&inner.config).resolve(entity);
                    Ok((entity.position, policy))
                })
                .await
                .map_err(|_| RtpError::NoActiveWorld)??
        };

        if policy.cooldown_seconds > 0 {
            let now = self.inner.clock.now_millis();
            if let CooldownStatus::Blocked { remaining_ms } =
                self.inner.cooldowns.check(player, now, policy.cooldown_seconds)
            {
                return Err(RtpError::CooldownActive { remaining_ms });
            }
        }

        let sender = CommandSender::Player(player.clone());

        if policy.warmup_seconds == 0 {
            self.inner.warmups.cancel_warmup(player);
            let report = self.teleport(&sender, player, None, policy).await?;
            return Ok(Dispatch::Teleported(report));
        }

        let svc = self.clone();
        let target = player.clone();
        let notice = sender.clone();
        let started = self.inner.warmups.start_warmup(
            player.clone(),
            position,
            policy.warmup_seconds,
            self.inner.config.warmup.movement_threshold,
            move || {
                tokio::spawn(async move {
                    svc.teleport_and_report(sender, target, None, policy).await;
                });
            },
        );

        if started == WarmupStart::Rejected {
            return Err(RtpError::WorldClosed);
        }
        self.notify(
            &notice,
            MessageKind::WarmupStarted,
            &[("time", policy.warmup_seconds.to_string())],
        );
        Ok(Dispatch::WarmingUp {
            seconds: policy.warmup_seconds,
        })
    }

    /// Admin path: no cooldown or warmup for the target, default bands.
    async fn request_other(&self, sender: &CommandSender, name: &str) -> Result<Dispatch, RtpError> {
        let (target, target_name) = {
            let node = self.inner.config.permissions.teleport_other.clone();
            let requester = sender.player().cloned();
            let name = name.to_string();
            self.inner
                .world
                .call(move |state| -> Result<(PlayerId, String), RtpError> {
                    if let Some(requester) = requester {
                        let entity = state
                            .player(&requester)
                            .map_err(|_| RtpError::NoActiveWorld)?;
                        if !entity.has_permission(&node) {
                            return Err(RtpError::NoPermissionOther);
                        }
                    }
                    state
                        .find_player_by_name(&name)
                        .map(|p| (p.id.clone(), p.name.clone()))
                        .ok_or(RtpError::TargetNotFound(name))
                })
                .await
                .map_err(|_| RtpError::NoActiveWorld)??
        };

        // A pending self-teleport would otherwise land the target a second time.
        self.inner.warmups.cancel_warmup(&target);

        let policy = EffectivePolicy::admin(&self.inner.config.policy);
        let report = self
            .teleport(sender, &target, Some(&target_name), policy)
            .await?;
        Ok(Dispatch::Teleported(report))
    }

    // -----------------------------------------------------------------------
    // Search + apply
    // -----------------------------------------------------------------------

    async fn teleport_and_report(
        &self,
        sender: CommandSender,
        target: PlayerId,
        target_name: Option<String>,
        policy: EffectivePolicy,
    ) {
        if let Err(e) = self
            .teleport(&sender, &target, target_name.as_deref(), policy)
            .await
        {
            warn!("Teleport of {} failed after warmup: {}", target, e);
            self.report_error(&sender, &e);
        }
    }

    /// Find a spot, apply it, record the cooldown. Nothing is recorded
    /// unless the position was applied, and nothing is applied if the
    /// target's cooldown started while the search ran.
    async fn teleport(
        &self,
        sender: &CommandSender,
        target: &PlayerId,
        target_name: Option<&str>,
        policy: EffectivePolicy,
    ) -> Result<TeleportReport, RtpError> {
        let search = &self.inner.config.search;
        let spot = self
            .inner
            .finder
            .find_safe_spot(
                (search.origin_x, search.origin_z),
                policy.distance,
                policy.height,
                search.max_attempts,
                |attempt, max| {
                    self.notify(
                        sender,
                        MessageKind::Searching,
                        &[("attempt", attempt.to_string()), ("max", max.to_string())],
                    )
                },
            )
            .await?;

        // Cooldown re-check, apply and record run as one world task, so a
        // concurrent search for the same player cannot apply a second time.
        {
            let inner = self.inner.clone();
            let target = target.clone();
            let position = spot.position;
            let cooldown_seconds = policy.cooldown_seconds;
            self.inner
                .world
                .call(move |state| -> Result<(), RtpError> {
                    let now = inner.clock.now_millis();
                    if cooldown_seconds > 0 {
                        if let CooldownStatus::Blocked { remaining_ms } =
                            inner.cooldowns.check(&target, now, cooldown_seconds)
                        {
                            return Err(RtpError::CooldownActive { remaining_ms });
                        }
                    }
                    state.teleport(&target, position)?;
                    inner.cooldowns.record(&target, now);
                    Ok(())
                })
                .await??;
        }

        info!("Teleported {} to {} after {} attempts", target, spot.position, spot.attempts);

        let mut values = vec![
            ("x", format!("{:.0}", spot.position.x)),
            ("y", format!("{:.0}", spot.position.y)),
            ("z", format!("{:.0}", spot.position.z)),
            ("distance", format!("{:.0}", spot.distance)),
        ];
        match target_name {
            Some(name) => {
                values.push(("player", name.to_string()));
                self.notify(sender, MessageKind::TeleportedOther, &values);
            }
            None => self.notify(sender, MessageKind::Teleported, &values),
        }

        Ok(TeleportReport {
            target: target.clone(),
            position: spot.position,
            distance: spot.distance,
            attempts: spot.attempts,
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub async fn player_joined(&self, entity: PlayerEntity) -> Result<(), RtpError> {
        self.inner
            .world
            .call(move |state| state.add_player(entity))
            .await
    }

    /// Remove the player and drop any pending warmup. The cooldown stays.
    #[tracing::instrument(skip(self))]
    pub async fn player_left(&self, player: &PlayerId) -> Result<bool, RtpError> {
        self.inner.warmups.cancel_warmup(player);
        let player = player.clone();
        self.inner
            .world
            .call(move |state| state.remove_player(&player).is_some())
            .await
    }

    pub async fn stats(&self) -> Result<RtpStats, RtpError> {
        let online_players = self.inner.world.call(|state| state.player_count()).await?;
        Ok(RtpStats {
            active_warmups: self.inner.warmups.active_count(),
            tracked_cooldowns: self.inner.cooldowns.len(),
            online_players,
        })
    }

    /// Cancel all warmups. Searches already running finish on their own.
    pub fn shutdown(&self) {
        self.inner.warmups.shutdown();
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    fn notify(&self, to: &CommandSender, kind: MessageKind, values: &[(&str, String)]) {
        let text = self.inner.config.messages.render(kind, values);
        self.inner.messages.send(to, &text);
    }

    fn report_error(&self, to: &CommandSender, error: &RtpError) {
        let values = match error {
            RtpError::CooldownActive { remaining_ms } => vec![("time", format_remaining(*remaining_ms))],
            RtpError::TargetNotFound(name) => vec![("player", name.clone())],
            _ => Vec::new(),
        };
        self.notify(to, error.message_kind(), &values);
    }
}
