pub const MAP_SIZE: f64 = 1000.0;
pub const MAP_AREA: f64 = MAP_SIZE * MAP_SIZE;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const DEFAULT_SPEED: f64 = 2.0;

pub const TRAIL_MAX: usize = 150;
pub const LOOP_MIN_POINTS: usize = 20;
pub const SELF_COLLISION_MIN_POINTS: usize = 20;
/// Most recent trail points skipped by loop and self-collision scans; the live
/// point always sits next to them.
pub const RECENT_TRAIL_WINDOW: usize = 10;

/// Squared distance (about 2 units).
pub const PROX_COLLIDE: f64 = 4.0;

pub const MIN_POLYGON_POINTS: usize = 3;

pub fn tick_period_micros() -> u64 {
    1_000_000 / TICK_RATE as u64
}

pub fn loop_proximity_threshold(speed: f64) -> f64 {
    speed * 2.0 + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_threshold_scales_with_speed() {
        assert_eq!(loop_proximity_threshold(DEFAULT_SPEED), 5.0);
        assert_eq!(loop_proximity_threshold(0.0), 1.0);
    }

    #[test]
    fn tick_period_matches_sixty_hertz() {
        assert_eq!(tick_period_micros(), 16_666);
        assert_eq!(TICK_MS, 16);
    }
}
