//! Arena engine: the single task that owns all world state.
//!
//! Connection events, respawn timers and read queries arrive on one ordered
//! command queue and are interleaved with the fixed simulation tick. Each
//! command or tick runs to completion before the next one starts.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use crate::notify::Notifier;
use crate::util::time::{tick_duration, EngineClock};
use crate::ws::protocol::{ArenaInfo, ClientMsg, Outbound, ServerMsg};

use super::arena::Arena;
use super::scoreboard::{RankedEntry, ScoreBoard, ScoreEntry};
use super::simulation::{self, Defeat};

/// Time a defeated player waits before re-entering
pub const RESPAWN_DELAY: Duration = Duration::from_millis(3_000);

const COMMAND_QUEUE_CAPACITY: usize = 1024;
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Work items for the engine task
#[derive(Debug)]
pub enum EngineCommand {
    Join {
        session_id: Uuid,
        external_id: String,
        display_name: String,
    },
    Move {
        session_id: Uuid,
        x: f32,
        y: f32,
    },
    Slap {
        session_id: Uuid,
        target_x: f32,
        target_y: f32,
        direction: f32,
    },
    Ping {
        session_id: Uuid,
        t: u64,
    },
    Disconnect {
        session_id: Uuid,
    },
    /// Fired by a respawn timer
    Respawn {
        session_id: Uuid,
    },
    Status {
        reply: oneshot::Sender<ArenaStatus>,
    },
    Leaderboard {
        limit: usize,
        reply: oneshot::Sender<Vec<RankedEntry>>,
    },
    Stats {
        external_id: String,
        reply: oneshot::Sender<Option<ScoreEntry>>,
    },
}

impl EngineCommand {
    /// Translate a decoded client message from a session
    pub fn from_client(session_id: Uuid, msg: ClientMsg) -> Self {
        match msg {
            ClientMsg::Join {
                external_id,
                display_name,
            } => EngineCommand::Join {
                session_id,
                external_id,
                display_name,
            },
            ClientMsg::Move { x, y } => EngineCommand::Move { session_id, x, y },
            ClientMsg::Slap {
                target_x,
                target_y,
                direction,
            } => EngineCommand::Slap {
                session_id,
                target_x,
                target_y,
                direction,
            },
            ClientMsg::Ping { t } => EngineCommand::Ping { session_id, t },
        }
    }
}

/// Read-only summary of the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaStatus {
    pub player_count: usize,
    pub projectile_count: usize,
    pub arena: ArenaInfo,
}

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub width: f32,
    pub height: f32,
    pub seed: Option<u64>,
}

/// Errors surfaced to callers outside the engine task
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Arena engine is not running")]
    Unavailable,
}

/// Handle to the running engine
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    events_tx: broadcast::Sender<Outbound>,
}

impl EngineHandle {
    /// Receive every outbound message; the caller filters by audience
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.events_tx.subscribe()
    }

    /// Queue a command behind everything already queued
    pub async fn send(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx.send(cmd).await.map_err(|_| EngineError::Unavailable)
    }

    pub async fn status(&self) -> Result<ArenaStatus, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Status { reply }).await?;
        rx.await.map_err(|_| EngineError::Unavailable)
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<RankedEntry>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Leaderboard { limit, reply }).await?;
        rx.await.map_err(|_| EngineError::Unavailable)
    }

    pub async fn stats(&self, external_id: String) -> Result<Option<ScoreEntry>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stats { external_id, reply }).await?;
        rx.await.map_err(|_| EngineError::Unavailable)
    }
}

/// The authoritative arena engine
pub struct ArenaEngine {
    arena: Arena,
    scores: ScoreBoard,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    /// Weak so the engine stops once every external handle is dropped
    timer_tx: mpsc::WeakSender<EngineCommand>,
    events_tx: broadcast::Sender<Outbound>,
    notifier: Notifier,
    clock: EngineClock,
}

impl ArenaEngine {
    pub fn new(settings: EngineSettings, notifier: Notifier) -> (Self, EngineHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = EngineHandle {
            cmd_tx: cmd_tx.clone(),
            events_tx: events_tx.clone(),
        };

        let engine = Self {
            arena: Arena::new(settings.width, settings.height, settings.seed),
            scores: ScoreBoard::new(),
            cmd_rx,
            timer_tx: cmd_tx.downgrade(),
            events_tx,
            notifier,
            clock: EngineClock::new(),
        };

        (engine, handle)
    }

    /// Create the engine and run it on its own task
    pub fn spawn(settings: EngineSettings, notifier: Notifier) -> EngineHandle {
        let (engine, handle) = Self::new(settings, notifier);
        tokio::spawn(engine.run());
        handle
    }

    /// Run the tick loop until every handle is dropped
    pub async fn run(mut self) {
        let info = self.arena.info();
        info!(width = info.width, height = info.height, "Arena engine started");

        let mut tick_interval = interval(tick_duration());
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => self.run_tick(),
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }

        info!("Arena engine stopped");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Join {
                session_id,
                external_id,
                display_name,
            } => self.handle_join(session_id, external_id, display_name),
            EngineCommand::Move { session_id, x, y } => {
                if let Some((x, y)) = self.arena.move_player(session_id, x, y) {
                    self.emit(Outbound::all_except(
                        session_id,
                        ServerMsg::PlayerMoved { session_id, x, y },
                    ));
                }
            }
            EngineCommand::Slap {
                session_id,
                target_x,
                target_y,
                direction,
            } => self.handle_slap(session_id, target_x, target_y, direction),
            EngineCommand::Ping { session_id, t } => {
                self.emit(Outbound::only(session_id, ServerMsg::Pong { t }));
            }
            EngineCommand::Disconnect { session_id } => self.handle_leave(session_id),
            EngineCommand::Respawn { session_id } => self.handle_respawn(session_id),
            EngineCommand::Status { reply } => {
                let _ = reply.send(ArenaStatus {
                    player_count: self.arena.player_count(),
                    projectile_count: self.arena.projectiles().len(),
                    arena: self.arena.info(),
                });
            }
            EngineCommand::Leaderboard { limit, reply } => {
                let _ = reply.send(self.scores.top_n(limit));
            }
            EngineCommand::Stats { external_id, reply } => {
                let _ = reply.send(self.scores.get(&external_id).cloned());
            }
        }
    }

    fn handle_join(&mut self, session_id: Uuid, external_id: String, display_name: String) {
        let player = self
            .arena
            .join(session_id, external_id, display_name, &mut self.scores);

        info!(
            session_id = %session_id,
            external_id = %player.external_id,
            display_name = %player.display_name,
            player_count = self.arena.player_count(),
            known_identities = self.scores.identity_count(),
            "Player joined arena"
        );

        self.emit(Outbound::only(
            session_id,
            ServerMsg::StateSnapshot {
                players: self.arena.players().cloned().collect(),
                arena: self.arena.info(),
                your_session_id: session_id,
            },
        ));
        self.emit(Outbound::all_except(
            session_id,
            ServerMsg::PlayerJoined(player),
        ));
    }

    fn handle_slap(&mut self, session_id: Uuid, target_x: f32, target_y: f32, direction: f32) {
        let now = self.clock.now_millis();
        match self.arena.spawn_projectile(
            session_id,
            target_x,
            target_y,
            direction,
            now,
            &mut self.scores,
        ) {
            Some(projectile) => {
                debug!(
                    session_id = %session_id,
                    target_x,
                    target_y,
                    "Slap thrown"
                );
                self.emit(Outbound::all(ServerMsg::ProjectileCreated(projectile)));
            }
            None => debug!(session_id = %session_id, "Slap ignored"),
        }
    }

    fn handle_leave(&mut self, session_id: Uuid) {
        if let Some(player) = self.arena.leave(session_id) {
            info!(
                session_id = %session_id,
                display_name = %player.display_name,
                "Player left arena"
            );
            self.emit(Outbound::all_except(
                session_id,
                ServerMsg::PlayerLeft { session_id },
            ));
        }
    }

    fn handle_respawn(&mut self, session_id: Uuid) {
        match self.arena.respawn(session_id) {
            Some(player) => {
                debug!(session_id = %session_id, "Player respawned");
                self.emit(Outbound::all(ServerMsg::PlayerRespawned {
                    session_id,
                    x: player.x,
                    y: player.y,
                    health: player.health,
                }));
            }
            None => debug!(session_id = %session_id, "Respawn skipped, player left"),
        }
    }

    /// Run a single simulation tick
    fn run_tick(&mut self) {
        let report = simulation::step(&mut self.arena, &mut self.scores);

        for event in report.events {
            self.emit(Outbound::all(event));
        }
        for defeat in report.defeats {
            self.on_defeat(defeat);
        }
    }

    fn on_defeat(&self, defeat: Defeat) {
        let attacker_name = match &defeat.attacker {
            Some(attacker) => {
                self.notifier
                    .notify_victory(&attacker.external_id, &defeat.display_name);
                attacker.display_name.as_str()
            }
            None => "Unknown",
        };
        self.notifier
            .notify_defeat(&defeat.external_id, attacker_name);

        info!(
            session_id = %defeat.session_id,
            attacker_session_id = ?defeat.attacker.as_ref().map(|a| a.session_id),
            attacker = %attacker_name,
            "Player defeated"
        );

        self.schedule_respawn(defeat.session_id);
    }

    /// Fire-once timer; not cancellable
    fn schedule_respawn(&self, session_id: Uuid) {
        let timer_tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESPAWN_DELAY).await;
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(EngineCommand::Respawn { session_id }).await;
            }
        });
    }

    fn emit(&self, outbound: Outbound) {
        // No subscribers is fine
        let _ = self.events_tx.send(outbound);
    }
}
