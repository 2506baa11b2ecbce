use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::constants::tick_period_micros;
use crate::engine::GameEngine;
use crate::types::{Direction, ServerMessage, TickOutcome};

/// Intents produced by connection tasks. They are queued and only applied at
/// the start of a tick, so a tick never observes a half-applied join or leave.
#[derive(Debug)]
pub enum GameCommand {
    Join {
        player_id: String,
        outbound: mpsc::Sender<String>,
    },
    Move {
        player_id: String,
        dir: Direction,
    },
    Leave {
        player_id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// Sole owner of the simulation and of every connection's outbound queue.
pub struct SessionHub {
    engine: GameEngine,
    clients: BTreeMap<String, mpsc::Sender<String>>,
    announce_eliminations: bool,
}

impl SessionHub {
    pub fn new(engine: GameEngine, announce_eliminations: bool) -> Self {
        Self {
            engine,
            clients: BTreeMap::new(),
            announce_eliminations,
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Applies everything queued so far and returns how many commands ran.
    pub fn drain_commands(&mut self, commands: &mut mpsc::Receiver<GameCommand>) -> usize {
        let mut applied = 0;
        while let Ok(command) = commands.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, command: GameCommand) {
        match command {
            GameCommand::Join {
                player_id,
                outbound,
            } => self.handle_join(player_id, outbound),
            GameCommand::Move { player_id, dir } => {
                self.engine.receive_move(&player_id, dir);
            }
            GameCommand::Leave { player_id } => self.handle_leave(&player_id),
        }
    }

    /// Runs one simulation step and fans the resulting snapshot out.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.engine.step();

        for capture in &outcome.captures {
            debug!(
                "[tick {}] {} captured {:.1} units over {} points",
                outcome.tick, capture.player_id, capture.area, capture.points
            );
        }
        for elimination in &outcome.eliminations {
            info!(
                "[tick {}] {} eliminated ({:?}), final score {:.2}",
                outcome.tick, elimination.player_id, elimination.cause, elimination.score
            );
            if self.announce_eliminations {
                self.broadcast(
                    &ServerMessage::PlayerEliminated {
                        id: elimination.player_id.clone(),
                        score: elimination.score,
                        cause: elimination.cause.clone(),
                    },
                    None,
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }

        let snapshot = ServerMessage::from(self.engine.build_snapshot());
        self.broadcast(&snapshot, None, QueuePolicy::DropOnFull);
        outcome
    }

    fn handle_join(&mut self, player_id: String, outbound: mpsc::Sender<String>) {
        let Some(player) = self.engine.add_player(&player_id) else {
            warn!("[session] duplicate join for {player_id}, ignoring");
            return;
        };
        info!(
            "[session] {} joined at ({:.1}, {:.1})",
            player_id, player.position.x, player.position.y
        );
        self.clients.insert(player_id.clone(), outbound);

        let init = ServerMessage::Init {
            id: player_id.clone(),
            players: self.engine.players_by_id(),
            powerups: self.engine.powerups().to_vec(),
            map_size: self.engine.map_size(),
        };
        self.send_to(&player_id, &init, QueuePolicy::DisconnectOnFull);
        self.broadcast(
            &ServerMessage::PlayerJoined { player },
            Some(&player_id),
            QueuePolicy::DisconnectOnFull,
        );
    }

    fn handle_leave(&mut self, player_id: &str) {
        let had_client = self.clients.remove(player_id).is_some();
        let had_player = self.engine.remove_player(player_id).is_some();
        if !had_client && !had_player {
            return;
        }
        info!("[session] {player_id} left");
        self.broadcast(
            &ServerMessage::PlayerLeft {
                id: player_id.to_string(),
            },
            None,
            QueuePolicy::DropOnFull,
        );
    }

    fn send_to(&mut self, player_id: &str, message: &ServerMessage, policy: QueuePolicy) {
        let Some(payload) = encode(message) else {
            return;
        };
        let send_failed = self
            .clients
            .get(player_id)
            .map(|tx| tx.try_send(payload).is_err())
            .unwrap_or(false);
        if send_failed && policy == QueuePolicy::DisconnectOnFull {
            warn!("[session] outbound queue for {player_id} is full, disconnecting");
            self.handle_leave(player_id);
        }
    }

    fn broadcast(&mut self, message: &ServerMessage, exclude: Option<&str>, policy: QueuePolicy) {
        let Some(payload) = encode(message) else {
            return;
        };
        let mut failed_clients = Vec::new();
        for (player_id, tx) in &self.clients {
            if exclude == Some(player_id.as_str()) {
                continue;
            }
            if tx.try_send(payload.clone()).is_err() && policy == QueuePolicy::DisconnectOnFull {
                failed_clients.push(player_id.clone());
            }
        }
        for player_id in failed_clients {
            warn!("[session] outbound queue for {player_id} is full, disconnecting");
            self.handle_leave(&player_id);
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            error!("[session] failed to encode outbound message: {err}");
            None
        }
    }
}

/// Fixed-rate simulation loop. Commands are drained at each tick boundary;
/// late ticks are skipped rather than bunched up.
pub async fn run_tick_loop(mut hub: SessionHub, mut commands: mpsc::Receiver<GameCommand>) {
    let mut interval = tokio::time::interval(Duration::from_micros(tick_period_micros()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        "[session] simulation running at {}us per tick (seed {})",
        tick_period_micros(),
        hub.engine().seed()
    );
    loop {
        interval.tick().await;
        hub.drain_commands(&mut commands);
        hub.tick();
    }
}
