use rand::Rng;

/// Draws node heights with a geometric distribution.
///
/// Each extra level is granted with probability `probability`, up to
/// `max_level`. The random source is owned, so a seeded generator gives a
/// reproducible skiplist shape.
pub(crate) struct LevelGenerator<R> {
    rng: R,
    probability: f64,
    max_level: usize,
}

impl<R: Rng> LevelGenerator<R> {
    pub(crate) fn new(rng: R, probability: f64, max_level: usize) -> Self {
        debug_assert!(max_level >= 1);
        Self {
            rng,
            probability,
            max_level,
        }
    }

    #[inline]
    pub(crate) fn max_level(&self) -> usize {
        self.max_level
    }

    /// Returns a level in `1..=max_level`.
    pub(crate) fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen::<f64>() < self.probability {
            level += 1;
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use super::LevelGenerator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn levels_stay_in_bounds() {
        let mut gen = LevelGenerator::new(StdRng::seed_from_u64(1), 0.9, 4);
        for _ in 0..1000 {
            let level = gen.random_level();
            assert!((1..=4).contains(&level));
        }
    }

    #[test]
    fn zero_probability_is_flat() {
        let mut gen = LevelGenerator::new(StdRng::seed_from_u64(2), 0.0, 32);
        assert!((0..100).all(|_| gen.random_level() == 1));
    }

    #[test]
    fn same_seed_same_levels() {
        let mut a = LevelGenerator::new(StdRng::seed_from_u64(42), 0.25, 32);
        let mut b = LevelGenerator::new(StdRng::seed_from_u64(42), 0.25, 32);
        let xs: Vec<_> = (0..64).map(|_| a.random_level()).collect();
        let ys: Vec<_> = (0..64).map(|_| b.random_level()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn roughly_geometric() {
        let mut gen = LevelGenerator::new(StdRng::seed_from_u64(3), 0.25, 32);
        let samples = 20_000;
        let promoted = (0..samples).filter(|_| gen.random_level() > 1).count();
        // Expect ~25% of nodes above level 1.
        let ratio = promoted as f64 / samples as f64;
        assert!(ratio > 0.2 && ratio < 0.3, "ratio was {}", ratio);
    }
}
