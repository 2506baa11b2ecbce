use super::*;

/// Shoelace formula. Polygons with fewer than three points have no area.
pub fn polygon_area(polygon: &[Vec2]) -> f64 {
    let len = polygon.len();
    if len < MIN_POLYGON_POINTS {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..len {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % len];
        twice_area += p1.x * p2.y - p2.x * p1.y;
    }
    twice_area.abs() / 2.0
}

pub fn claimed_area(territories: &[Polygon]) -> f64 {
    territories
        .iter()
        .fold(0.0, |area, polygon| area + polygon_area(polygon))
}

/// Percentage of the map claimed, rounded to two decimals.
pub fn score_for(territories: &[Polygon]) -> f64 {
    round2(claimed_area(territories) / MAP_AREA * 100.0)
}

impl GameEngine {
    /// Recomputed from scratch for every player, including those flagged dead
    /// this tick, so their final score is still reported.
    pub(super) fn update_scores(&mut self) {
        for player in self.registry.iter_mut() {
            player.score = score_for(&player.territories);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn square(x: f64, y: f64, side: f64) -> Polygon {
        vec![
            Vec2::new(x, y),
            Vec2::new(x + side, y),
            Vec2::new(x + side, y + side),
            Vec2::new(x, y + side),
        ]
    }

    #[test]
    fn square_area_is_side_squared() {
        for side in [1.0, 2.5, 100.0, 733.3] {
            assert!(approx_eq(polygon_area(&square(12.0, 34.0, side)), side * side, 1e-6));
        }
    }

    #[test]
    fn no_territory_scores_positive_zero() {
        assert!(claimed_area(&[]).is_sign_positive());
        assert!(score_for(&[]).is_sign_positive());
    }

    #[test]
    fn area_ignores_winding_direction() {
        let mut reversed = square(0.0, 0.0, 10.0);
        reversed.reverse();
        assert_eq!(polygon_area(&reversed), 100.0);
    }

    #[test]
    fn collinear_points_do_not_change_area() {
        let dense: Polygon = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert_eq!(polygon_area(&dense), 100.0);
    }

    #[test]
    fn degenerate_polygons_have_no_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0)]), 0.0);
    }

    #[test]
    fn score_is_rounded_percentage_of_map() {
        assert_eq!(score_for(&[]), 0.0);
        assert_eq!(score_for(&[square(0.0, 0.0, 100.0)]), 1.0);
        assert_eq!(
            score_for(&[square(0.0, 0.0, 100.0), square(500.0, 500.0, 50.0)]),
            1.25
        );
        // 70x70 = 4900 -> 0.49%
        assert_eq!(score_for(&[square(0.0, 0.0, 70.0)]), 0.49);
    }
}
