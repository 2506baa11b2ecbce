use std::collections::{BTreeMap, VecDeque};

use serde::{Serialize, Serializer};

use crate::constants::DEFAULT_SPEED;

/// `None` goes on the wire as `null`; the others as their lowercase name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Wire values a client may send. `none` is a server-side state only.
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_wire(self) -> Option<&'static str> {
        match self {
            Self::Up => Some("up"),
            Self::Down => Some("down"),
            Self::Left => Some("left"),
            Self::Right => Some("right"),
            Self::None => None,
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_wire() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub type Polygon = Vec<Vec2>;

#[derive(Clone, Debug, Serialize)]
pub struct Player {
    pub id: String,
    pub position: Vec2,
    pub direction: Direction,
    pub trail: VecDeque<Vec2>,
    pub territories: Vec<Polygon>,
    pub speed: f64,
    pub alive: bool,
    pub score: f64,
}

impl Player {
    pub fn new(id: String, position: Vec2) -> Self {
        Self {
            id,
            position,
            direction: Direction::None,
            trail: VecDeque::new(),
            territories: Vec::new(),
            speed: DEFAULT_SPEED,
            alive: true,
            score: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupType {
    Speed,
    Shield,
}

#[derive(Clone, Debug, Serialize)]
pub struct Powerup {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub powerup_type: PowerupType,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub players: BTreeMap<String, Player>,
    pub powerups: Vec<Powerup>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EliminationCause {
    TrailCollision {
        #[serde(rename = "trailOwner")]
        trail_owner: String,
    },
    SelfCollision,
}

#[derive(Clone, Debug, Serialize)]
pub struct Elimination {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub score: f64,
    pub cause: EliminationCause,
}

#[derive(Clone, Debug, Serialize)]
pub struct Capture {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub points: usize,
    pub area: f64,
}

#[derive(Clone, Debug, Default)]
pub struct TickOutcome {
    pub tick: u64,
    pub captures: Vec<Capture>,
    pub eliminations: Vec<Elimination>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Init {
        id: String,
        players: BTreeMap<String, Player>,
        powerups: Vec<Powerup>,
        #[serde(rename = "mapSize")]
        map_size: f64,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerLeft {
        id: String,
    },
    State {
        tick: u64,
        players: BTreeMap<String, Player>,
        powerups: Vec<Powerup>,
    },
    PlayerEliminated {
        id: String,
        score: f64,
        cause: EliminationCause,
    },
}

impl From<Snapshot> for ServerMessage {
    fn from(snapshot: Snapshot) -> Self {
        Self::State {
            tick: snapshot.tick,
            players: snapshot.players,
            powerups: snapshot.powerups,
        }
    }
}
