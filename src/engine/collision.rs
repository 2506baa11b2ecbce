use super::*;

/// True when `position` lies within collision range of any point of `trail`.
pub fn touches_trail<'a>(trail: impl IntoIterator<Item = &'a Vec2>, position: Vec2) -> bool {
    trail
        .into_iter()
        .any(|point| distance_sq(position, *point) < PROX_COLLIDE)
}

/// True when the live point has run back into its own settled trail.
pub fn hits_own_trail(trail: &VecDeque<Vec2>, position: Vec2) -> bool {
    if trail.len() <= SELF_COLLISION_MIN_POINTS {
        return false;
    }
    settled_indices(trail).any(|idx| distance_sq(position, trail[idx]) < PROX_COLLIDE)
}

/// Flags players as dead without removing them. Players are visited in join
/// order and a flag takes effect immediately, so a player eliminated earlier in
/// the pass neither collides nor endangers anyone later in the same pass.
pub(super) fn resolve_collisions(players: &mut [Player]) -> Vec<(String, EliminationCause)> {
    let mut eliminated = Vec::new();
    for idx in 0..players.len() {
        if !players[idx].alive {
            continue;
        }

        for other_idx in 0..players.len() {
            if other_idx == idx || !players[other_idx].alive {
                continue;
            }
            if touches_trail(&players[idx].trail, players[other_idx].position) {
                players[other_idx].alive = false;
                eliminated.push((
                    players[other_idx].id.clone(),
                    EliminationCause::TrailCollision {
                        trail_owner: players[idx].id.clone(),
                    },
                ));
            }
        }

        if hits_own_trail(&players[idx].trail, players[idx].position) {
            players[idx].alive = false;
            eliminated.push((players[idx].id.clone(), EliminationCause::SelfCollision));
        }
    }
    eliminated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(id: &str, x: f64, y: f64) -> Player {
        Player::new(id.to_string(), Vec2::new(x, y))
    }

    fn horizontal_trail(from_x: f64, y: f64, count: usize) -> VecDeque<Vec2> {
        (0..count)
            .map(|i| Vec2::new(from_x + i as f64 * 2.0, y))
            .collect()
    }

    #[test]
    fn runner_into_rival_trail_is_eliminated_not_owner() {
        let mut owner = player_at("owner", 200.0, 100.0);
        owner.trail = horizontal_trail(100.0, 100.0, 51);
        let runner = player_at("runner", 150.0, 101.5);

        let mut players = vec![owner, runner];
        let eliminated = resolve_collisions(&mut players);

        assert!(players[0].alive);
        assert!(!players[1].alive);
        assert_eq!(
            eliminated,
            vec![(
                "runner".to_string(),
                EliminationCause::TrailCollision {
                    trail_owner: "owner".to_string()
                }
            )]
        );
    }

    #[test]
    fn distance_two_is_outside_collision_range() {
        let mut owner = player_at("owner", 200.0, 100.0);
        owner.trail = horizontal_trail(100.0, 100.0, 51);
        let runner = player_at("runner", 150.0, 102.0);

        let mut players = vec![owner, runner];
        assert!(resolve_collisions(&mut players).is_empty());
        assert!(players.iter().all(|p| p.alive));
    }

    #[test]
    fn eliminated_player_does_not_endanger_later_players() {
        // a's trail kills b; b's trail would reach c but b is already out.
        let mut a = player_at("a", 900.0, 900.0);
        a.trail = horizontal_trail(100.0, 100.0, 20);
        let mut b = player_at("b", 110.0, 101.0);
        b.trail = horizontal_trail(300.0, 300.0, 20);
        let c = player_at("c", 310.0, 300.5);

        let mut players = vec![a, b, c];
        let eliminated = resolve_collisions(&mut players);

        assert!(players[0].alive);
        assert!(!players[1].alive);
        assert!(players[2].alive);
        assert_eq!(eliminated.len(), 1);
    }

    #[test]
    fn self_collision_ignores_recent_window() {
        let mut trail = horizontal_trail(100.0, 100.0, 25);
        let live = Vec2::new(500.0, 500.0);
        trail[15] = Vec2::new(500.0, 501.0);
        trail[24] = live;
        let mut runner = player_at("runner", live.x, live.y);
        runner.trail = trail.clone();

        let mut players = vec![runner];
        assert!(resolve_collisions(&mut players).is_empty());
        assert!(players[0].alive);

        players[0].trail[14] = Vec2::new(500.0, 501.0);
        let eliminated = resolve_collisions(&mut players);
        assert!(!players[0].alive);
        assert_eq!(
            eliminated,
            vec![("runner".to_string(), EliminationCause::SelfCollision)]
        );
    }

    #[test]
    fn self_collision_needs_more_than_twenty_points() {
        let mut trail = horizontal_trail(100.0, 100.0, SELF_COLLISION_MIN_POINTS);
        let live = trail[0];
        let last = trail.len() - 1;
        trail[last] = live;
        assert!(!hits_own_trail(&trail, live));

        trail.push_back(live);
        assert!(hits_own_trail(&trail, live));
    }

    #[test]
    fn own_trail_never_counts_as_rival_trail() {
        let mut lone = player_at("lone", 100.0, 100.0);
        lone.trail = horizontal_trail(100.0, 100.0, 5);
        let mut players = vec![lone];
        assert!(resolve_collisions(&mut players).is_empty());
    }
}
