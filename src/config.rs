use std::path::PathBuf;

use log::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub command_queue_capacity: usize,
    pub client_queue_capacity: usize,
    /// Send `playerEliminated` when a collision removes a player. Off by
    /// default: clients then only notice via the next snapshot.
    pub announce_eliminations: bool,
    pub seed: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: None,
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            announce_eliminations: false,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            static_dir: resolve_static_dir(lookup("STATIC_DIR")),
            command_queue_capacity: parse_or(
                "COMMAND_QUEUE_CAPACITY",
                lookup("COMMAND_QUEUE_CAPACITY"),
                defaults.command_queue_capacity,
            )
            .max(1),
            client_queue_capacity: parse_or(
                "CLIENT_QUEUE_CAPACITY",
                lookup("CLIENT_QUEUE_CAPACITY"),
                defaults.client_queue_capacity,
            )
            .max(1),
            announce_eliminations: lookup("ANNOUNCE_ELIMINATIONS")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(defaults.announce_eliminations),
            seed: lookup("GAME_SEED").and_then(|raw| match raw.trim().parse::<u32>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("[config] ignoring invalid GAME_SEED={raw:?}");
                    None
                }
            }),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("[config] ignoring invalid {key}={raw:?}");
            default
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn resolve_static_dir(raw: Option<String>) -> Option<PathBuf> {
    if let Some(raw) = raw {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("public"), PathBuf::from("../public")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}
