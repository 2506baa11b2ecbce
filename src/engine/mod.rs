use std::collections::{BTreeMap, VecDeque};

use crate::constants::{
    loop_proximity_threshold, LOOP_MIN_POINTS, MAP_AREA, MAP_SIZE, MIN_POLYGON_POINTS,
    PROX_COLLIDE, RECENT_TRAIL_WINDOW, SELF_COLLISION_MIN_POINTS, TRAIL_MAX,
};
use crate::registry::PlayerRegistry;
use crate::rng::Rng;
use crate::types::{
    Capture, Direction, Elimination, EliminationCause, Player, Polygon, Powerup, Snapshot,
    TickOutcome, Vec2,
};

mod capture;
mod collision;
mod movement;
mod scoring;
mod trail;
mod utils;

pub use self::capture::find_loop_start;
pub use self::collision::{hits_own_trail, touches_trail};
pub use self::movement::advance;
pub use self::scoring::{claimed_area, polygon_area, score_for};
pub use self::trail::push_trail_point;

use self::capture::capture_territory;
use self::collision::resolve_collisions;
use self::trail::settled_indices;
use self::utils::{distance_sq, round2};

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    /// Static payload echoed in every snapshot; nothing collects or spawns them.
    pub powerups: Vec<Powerup>,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    rng: Rng,
    seed: u32,
    registry: PlayerRegistry,
    powerups: Vec<Powerup>,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(seed: u32, options: GameEngineOptions) -> Self {
        Self {
            rng: Rng::new(seed),
            seed,
            registry: PlayerRegistry::new(),
            powerups: options.powerups,
            tick_counter: 0,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn map_size(&self) -> f64 {
        MAP_SIZE
    }

    pub fn powerups(&self) -> &[Powerup] {
        &self.powerups
    }

    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.registry.contains(player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.registry.get(player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.registry.iter()
    }

    /// Registers a new player at a uniformly random position. Returns `None`
    /// if the id is already in use.
    pub fn add_player(&mut self, player_id: &str) -> Option<Player> {
        if self.registry.contains(player_id) {
            return None;
        }
        let position = Vec2 {
            x: self.rng.range(MAP_SIZE),
            y: self.rng.range(MAP_SIZE),
        };
        let player = Player::new(player_id.to_string(), position);
        self.registry.add(player.clone());
        Some(player)
    }

    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        self.registry.remove(player_id)
    }

    /// Updates the heading only; it is read by the next `step`. Unknown ids
    /// are ignored.
    pub fn receive_move(&mut self, player_id: &str, direction: Direction) {
        if let Some(player) = self.registry.get_mut(player_id) {
            player.direction = direction;
        }
    }

    /// Teleports a player, clamped into the map.
    #[cfg(test)]
    pub(crate) fn set_position(&mut self, player_id: &str, position: Vec2) {
        if let Some(player) = self.registry.get_mut(player_id) {
            player.position = Vec2 {
                x: position.x.clamp(0.0, MAP_SIZE),
                y: position.y.clamp(0.0, MAP_SIZE),
            };
        }
    }

    /// One simulation tick: movement, trail, capture, collisions, scoring,
    /// then removal of everyone flagged dead.
    pub fn step(&mut self) -> TickOutcome {
        self.tick_counter += 1;

        let mut captures = Vec::new();
        self.update_players(&mut captures);
        let collisions = resolve_collisions(self.registry.as_mut_slice());
        self.update_scores();

        let removed = self.registry.remove_dead();
        let eliminations = collisions
            .into_iter()
            .map(|(player_id, cause)| {
                let score = removed
                    .iter()
                    .find(|player| player.id == player_id)
                    .map(|player| player.score)
                    .unwrap_or(0.0);
                Elimination {
                    player_id,
                    score,
                    cause,
                }
            })
            .collect();

        TickOutcome {
            tick: self.tick_counter,
            captures,
            eliminations,
        }
    }

    pub fn players_by_id(&self) -> BTreeMap<String, Player> {
        self.registry
            .iter()
            .map(|player| (player.id.clone(), player.clone()))
            .collect()
    }

    pub fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            players: self.players_by_id(),
            powerups: self.powerups.clone(),
        }
    }
}
