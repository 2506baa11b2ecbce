use crate::types::Vec2;

pub(super) fn distance_sq(a: Vec2, b: Vec2) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

pub(super) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_sq_is_symmetric() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert_eq!(distance_sq(a, b), 25.0);
        assert_eq!(distance_sq(b, a), 25.0);
        assert_eq!(distance_sq(a, a), 0.0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(0.4896), 0.49);
        assert_eq!(round2(1.0), 1.0);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(12.345_6), 12.35);
    }
}
