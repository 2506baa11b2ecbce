use super::*;

/// Earliest settled trail index close enough to the live point to close a loop.
pub fn find_loop_start(trail: &VecDeque<Vec2>, position: Vec2, speed: f64) -> Option<usize> {
    if trail.len() <= LOOP_MIN_POINTS {
        return None;
    }
    let threshold = loop_proximity_threshold(speed);
    let threshold_sq = threshold * threshold;
    settled_indices(trail).find(|&idx| distance_sq(position, trail[idx]) < threshold_sq)
}

/// Closes the loop if the player has come back near an earlier trail point.
/// The trail always restarts on closure; the polygon is only kept when it has
/// enough points.
pub(super) fn capture_territory(player: &mut Player) -> Option<Capture> {
    let start = find_loop_start(&player.trail, player.position, player.speed)?;
    let polygon: Polygon = player.trail.drain(start..).collect();
    player.trail.clear();
    if polygon.len() < MIN_POLYGON_POINTS {
        return None;
    }
    let capture = Capture {
        player_id: player.id.clone(),
        points: polygon.len(),
        area: polygon_area(&polygon),
    };
    player.territories.push(polygon);
    Some(capture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_SPEED;

    fn far_trail(len: usize) -> VecDeque<Vec2> {
        (0..len)
            .map(|i| Vec2::new(100.0 + i as f64 * 10.0, 100.0))
            .collect()
    }

    #[test]
    fn loop_closes_at_earliest_qualifying_index() {
        let mut trail = far_trail(25);
        let live = Vec2::new(600.0, 600.0);
        trail[5] = Vec2::new(601.0, 601.0);
        trail[8] = Vec2::new(600.0, 600.5);
        trail[24] = live;

        let mut player = Player::new("p".to_string(), live);
        player.trail = trail.clone();

        assert_eq!(find_loop_start(&trail, live, player.speed), Some(5));
        let capture = capture_territory(&mut player).expect("loop should close");
        assert_eq!(capture.points, 20);
        assert!(player.trail.is_empty());
        assert_eq!(player.territories.len(), 1);
        let expected: Polygon = trail.iter().skip(5).copied().collect();
        assert_eq!(player.territories[0], expected);
    }

    #[test]
    fn short_trail_never_closes() {
        let mut trail = far_trail(LOOP_MIN_POINTS);
        let live = trail[0];
        trail[LOOP_MIN_POINTS - 1] = live;
        assert_eq!(find_loop_start(&trail, live, DEFAULT_SPEED), None);
    }

    #[test]
    fn recent_window_is_ignored() {
        let mut trail = far_trail(30);
        let live = Vec2::new(700.0, 700.0);
        trail[20] = Vec2::new(700.0, 701.0);
        trail[29] = live;
        assert_eq!(find_loop_start(&trail, live, DEFAULT_SPEED), None);

        trail[19] = Vec2::new(700.0, 701.0);
        assert_eq!(find_loop_start(&trail, live, DEFAULT_SPEED), Some(19));
    }

    #[test]
    fn threshold_is_strict_and_speed_dependent() {
        let mut trail = far_trail(25);
        let live = Vec2::new(500.0, 500.0);
        trail[3] = Vec2::new(505.0, 500.0);
        trail[24] = live;
        assert_eq!(find_loop_start(&trail, live, 2.0), None);
        assert_eq!(find_loop_start(&trail, live, 3.0), Some(3));
    }

    #[test]
    fn no_closure_leaves_state_untouched() {
        let trail = far_trail(40);
        let live = Vec2::new(900.0, 900.0);
        let mut player = Player::new("p".to_string(), live);
        player.trail = trail.clone();

        assert!(capture_territory(&mut player).is_none());
        assert_eq!(player.trail, trail);
        assert!(player.territories.is_empty());
    }
}
