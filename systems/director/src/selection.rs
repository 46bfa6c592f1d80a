use rand::{seq::SliceRandom, Rng};
use wave_director_core::SpawnPointId;

/// Draws how many spawn points take part in a wave.
///
/// The count is uniform over `[1, pool_size)`; a pool of one always yields one.
/// An empty pool yields zero, which configuration validation rules out.
pub fn spawn_point_count<R: Rng + ?Sized>(rng: &mut R, pool_size: usize) -> usize {
    match pool_size {
        0 => 0,
        1 | 2 => 1,
        _ => rng.gen_range(1..pool_size),
    }
}

/// Picks a random subset of distinct spawn points for a single wave.
pub fn select_spawn_points<R: Rng + ?Sized>(rng: &mut R, pool: &[SpawnPointId]) -> Vec<SpawnPointId> {
    let count = spawn_point_count(rng, pool.len());
    pool.choose_multiple(rng, count).copied().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn pool(size: u32) -> Vec<SpawnPointId> {
        (0..size).map(SpawnPointId::new).collect()
    }

    #[test]
    fn single_point_pool_always_selects_it() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let pool = pool(1);
        for _ in 0..64 {
            assert_eq!(select_spawn_points(&mut rng, &pool), pool);
        }
    }

    #[test]
    fn count_stays_below_pool_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pool = pool(5);
        let mut seen_counts = HashSet::new();
        for _ in 0..256 {
            let selected = select_spawn_points(&mut rng, &pool);
            assert!((1..5).contains(&selected.len()));
            let distinct: HashSet<_> = selected.iter().copied().collect();
            assert_eq!(distinct.len(), selected.len(), "points must not repeat");
            let _ = seen_counts.insert(selected.len());
        }
        assert_eq!(seen_counts.len(), 4, "every count in [1, 5) should appear");
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(select_spawn_points(&mut rng, &[]).is_empty());
    }

    #[test]
    fn selection_is_reproducible_from_seed() {
        let pool = pool(8);
        let mut first = ChaCha8Rng::seed_from_u64(0x5eed);
        let mut second = ChaCha8Rng::seed_from_u64(0x5eed);
        for _ in 0..16 {
            assert_eq!(
                select_spawn_points(&mut first, &pool),
                select_spawn_points(&mut second, &pool)
            );
        }
    }
}
