use super::*;

/// Next position after one tick, clamped into `[0, map_size]` on both axes.
/// `Direction::None` leaves the position where it is.
pub fn advance(position: Vec2, direction: Direction, speed: f64, map_size: f64) -> Vec2 {
    let (x, y) = match direction {
        Direction::Up => (position.x, position.y - speed),
        Direction::Down => (position.x, position.y + speed),
        Direction::Left => (position.x - speed, position.y),
        Direction::Right => (position.x + speed, position.y),
        Direction::None => (position.x, position.y),
    };
    Vec2 {
        x: x.clamp(0.0, map_size),
        y: y.clamp(0.0, map_size),
    }
}

impl GameEngine {
    /// Movement, trail append and loop capture run per player in join order.
    /// A player without a direction skips all three.
    pub(super) fn update_players(&mut self, captures: &mut Vec<Capture>) {
        for player in self.registry.iter_mut() {
            if player.direction == Direction::None {
                continue;
            }
            player.position = advance(player.position, player.direction, player.speed, MAP_SIZE);
            push_trail_point(&mut player.trail, player.position);
            if let Some(capture) = capture_territory(player) {
                captures.push(capture);
            }
        }
    }
}
