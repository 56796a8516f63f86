//! Operator console – drives [`RtpService`] from line commands and prints
//! outbound events.
//!
//! ## Command contract
//!
//! | Command                       | Effect                                   |
//! |-------------------------------|------------------------------------------|
//! | `join <name> [node,node,...]` | spawn a player at the origin             |
//! | `leave <name>`                | `player_left`                            |
//! | `move <name> <x> <y> <z>`     | ordinary movement (can cancel a warmup)  |
//! | `rtp <name> [target]`         | `rtp` / `rtp <target>` issued by `name`  |
//! | `rtp console <target>`        | `rtp <target>` issued by the console     |
//! | `where <name>`                | print the player's position              |
//! | `stats`                       | print `RtpStats` JSON                    |
//!
//! ## Output
//!
//! | Prefix                      | Payload                                 |
//! |-----------------------------|-----------------------------------------|
//! | `world.entity.teleported`   | `WorldEvent<EntityTeleported>` JSON     |
//! | `world.player.message`      | `PlayerMessage` JSON                    |

use crate::messages::{CommandSender, MessageSink};
use crate::protocol::{subjects, PlayerMessage};
use crate::service::RtpService;
use crate::types::{PlayerId, Vec3};
use crate::world::{PlayerEntity, WorldHandle};
use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Prints every message as a `world.player.message` JSON line.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&self, to: &CommandSender, text: &str) {
        let msg = PlayerMessage {
            recipient: to.clone(),
            text: text.to_string(),
        };
        match serde_json::to_string(&msg) {
            Ok(json) => println!("{} {}", subjects::PLAYER_MESSAGE, json),
            Err(e) => warn!("Failed to serialise message for {}: {}", to, e),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join { name: String, permissions: Vec<String> },
    Leave { name: String },
    Move { name: String, position: Vec3 },
    Rtp { sender: CommandSender, target: Option<String> },
    Where { name: String },
    Stats,
}

/// Console names map to player ids by lower-casing.
fn player_id(name: &str) -> PlayerId {
    PlayerId::new(name.to_ascii_lowercase())
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        ["join", name] => ConsoleCommand::Join {
            name: name.to_string(),
            permissions: Vec::new(),
        },
        ["join", name, nodes] => ConsoleCommand::Join {
            name: name.to_string(),
            permissions: nodes
                .split(',')
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
        },
        ["leave", name] => ConsoleCommand::Leave {
            name: name.to_string(),
        },
        ["move", name, x, y, z] => ConsoleCommand::Move {
            name: name.to_string(),
            position: Vec3::new(
                x.parse().context("x")?,
                y.parse().context("y")?,
                z.parse().context("z")?,
            ),
        },
        ["rtp" | "randomtp" | "randomteleport", "console", target] => ConsoleCommand::Rtp {
            sender: CommandSender::Console,
            target: Some(target.to_string()),
        },
        ["rtp" | "randomtp" | "randomteleport", name] => ConsoleCommand::Rtp {
            sender: CommandSender::Player(player_id(name)),
            target: None,
        },
        ["rtp" | "randomtp" | "randomteleport", name, target] => ConsoleCommand::Rtp {
            sender: CommandSender::Player(player_id(name)),
            target: Some(target.to_string()),
        },
        ["where", name] => ConsoleCommand::Where {
            name: name.to_string(),
        },
        ["stats"] => ConsoleCommand::Stats,
        _ => bail!("unrecognised command: {}", line.trim()),
    };
    Ok(cmd)
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct ConsoleAgent {
    service: RtpService,
    world: WorldHandle,
    spawn_point: Vec3,
}

impl ConsoleAgent {
    pub fn new(service: RtpService, world: WorldHandle, spawn_point: Vec3) -> Self {
        Self {
            service,
            world,
            spawn_point,
        }
    }

    /// Read commands from `input` until EOF or ctrl-c, then cancel every
    /// pending warmup.
    pub async fn run<R>(self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut events = self.world.subscribe();
        let publisher = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(json) => println!("{} {}", subjects::ENTITY_TELEPORTED, json),
                        Err(e) => warn!("Failed to serialise teleport event: {}", e),
                    },
                    Err(RecvError::Lagged(n)) => warn!("Teleport event stream lagged by {}", n),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        info!("Console ready on world '{}'", self.world.name());
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read console input")? else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Ok(cmd) => {
                            if let Err(e) = self.execute(cmd).await {
                                println!("error: {:#}", e);
                            }
                        }
                        Err(e) => println!("error: {:#}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Console shutting down (SIGINT)");
                    break;
                }
            }
        }

        self.service.shutdown();
        publisher.abort();
        Ok(())
    }

    pub async fn execute(&self, cmd: ConsoleCommand) -> Result<()> {
        match cmd {
            ConsoleCommand::Join { name, permissions } => {
                let entity = PlayerEntity::new(player_id(&name), name, self.spawn_point)
                    .with_permissions(permissions);
                self.service
                    .player_joined(entity)
                    .await
                    .context("join failed")?;
            }
            ConsoleCommand::Leave { name } => {
                if !self.service.player_left(&player_id(&name)).await? {
                    bail!("{} is not online", name);
                }
            }
            ConsoleCommand::Move { name, position } => {
                let id = player_id(&name);
                self.world
                    .call(move |state| state.move_player(&id, position))
                    .await??;
            }
            ConsoleCommand::Rtp { sender, target } => {
                // Searches can take several settle delays; keep reading input.
                let service = self.service.clone();
                tokio::spawn(async move {
                    // Failures were already reported to the sender.
                    let _ = service.handle_command(sender, target.as_deref()).await;
                });
            }
            ConsoleCommand::Where { name } => {
                let id = player_id(&name);
                let pos = self
                    .world
                    .call(move |state| state.player(&id).map(|p| p.position))
                    .await??;
                println!("{} is at {}", name, pos);
            }
            ConsoleCommand::Stats => {
                let stats = self.service.stats().await?;
                println!("{}", serde_json::to_string(&stats)?);
            }
        }
        Ok(())
    }
}
