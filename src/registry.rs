use crate::types::Player;

/// Active players in join order. Join order is the iteration order of every
/// tick, which keeps collision resolution deterministic.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and leaves the registry untouched if the id is taken.
    pub fn add(&mut self, player: Player) -> bool {
        if self.contains(&player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let idx = self.index_of(id)?;
        Some(self.players.remove(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Player] {
        &mut self.players
    }

    /// Drops every player flagged dead and returns them in join order.
    pub fn remove_dead(&mut self) -> Vec<Player> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.players.len());
        for player in self.players.drain(..) {
            if player.alive {
                kept.push(player);
            } else {
                removed.push(player);
            }
        }
        self.players = kept;
        removed
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|player| player.id == id)
    }
}
