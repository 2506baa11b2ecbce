#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        out as f64 / 4_294_967_296.0
    }

    /// Uniform in `[0, max]`.
    pub fn range(&mut self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        (self.next_f64() * max).min(max)
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        min + (self.next_f64() * span).floor() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_repeats_sequence() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn range_stays_inside_bounds() {
        let mut rng = Rng::new(99);
        for _ in 0..1_000 {
            let value = rng.range(1000.0);
            assert!((0.0..=1000.0).contains(&value));
        }
        assert_eq!(rng.range(0.0), 0.0);
    }

    #[test]
    fn int_is_inclusive() {
        let mut rng = Rng::new(3);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2_000 {
            let value = rng.int(2, 4);
            assert!((2..=4).contains(&value));
            seen_min |= value == 2;
            seen_max |= value == 4;
        }
        assert!(seen_min && seen_max);
        assert_eq!(rng.int(5, 5), 5);
    }
}
